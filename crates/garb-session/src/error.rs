//! Error type for session-side operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No authenticated viewer; writes fail closed.
  #[error("authentication required")]
  AuthRequired,

  /// The connectivity signal says offline. Writes are refused immediately,
  /// never queued for later delivery.
  #[error("offline; refusing to attempt the request")]
  Offline,

  /// A submission for this target is already in flight; the new attempt is
  /// rejected rather than queued.
  #[error("a submission for this target is already in progress")]
  SubmissionInProgress,

  /// The underlying store call failed. Optimistic state has already been
  /// rolled back by the time this surfaces.
  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Whether simply retrying the same operation later can succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Offline | Self::Storage(_))
  }

  pub(crate) fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
