//! Core types and trait definitions for the garb wardrobe-challenge store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! one runtime type it exposes is the `tokio::sync::broadcast` receiver
//! handed out by the store change feed.

pub mod challenge;
pub mod error;
pub mod favorite;
pub mod outfit;
pub mod participation;
pub mod profile;
pub mod ranking;
pub mod store;
pub mod vote;

pub use error::{Error, Result};
