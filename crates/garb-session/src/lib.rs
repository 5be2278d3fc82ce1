//! Session-side voting state for garb clients.
//!
//! Everything in this crate is single-owner, event-driven state layered on a
//! [`garb_core::store::WardrobeStore`]: an optimistic vote coordinator, the
//! un-voted-entry carousel, an optimistic favorite set, and the connectivity
//! and retry plumbing they share. Components are mutated only by their
//! owning task and suspend only at store calls.

pub mod carousel;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod favorites;
pub mod profiles;
pub mod retry;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
