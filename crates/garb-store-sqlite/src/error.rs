//! Error type for `garb-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] garb_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column did not decode to its domain type. Rows never get
  /// shape-probed at call sites; a bad representation fails the read here.
  #[error("malformed {what} in stored row: {value:?}")]
  Malformed { what: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
