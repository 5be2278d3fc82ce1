//! SQLite backend for the garb wardrobe store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That single thread also serialises
//! every check-then-write sequence, so uniqueness pre-checks cannot race each
//! other; the schema's UNIQUE constraints back them up regardless.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
