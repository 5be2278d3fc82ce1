//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store failure onto the API surface.
  ///
  /// Backends wrap domain errors in their own error types, so the source
  /// chain is walked for a [`garb_core::Error`] first: conflicts become 409,
  /// missing rows 404. Anything else stays a 500.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);

    let classified = {
      let mut cursor: Option<&(dyn std::error::Error + 'static)> =
        Some(&*boxed);
      let mut found = None;
      while let Some(e) = cursor {
        if let Some(core) = e.downcast_ref::<garb_core::Error>() {
          found = Some(match core {
            garb_core::Error::EmailTaken(_)
            | garb_core::Error::AlreadyParticipating { .. } => {
              ApiError::Conflict(core.to_string())
            }
            garb_core::Error::ProfileNotFound(_)
            | garb_core::Error::GarmentNotFound(_)
            | garb_core::Error::OutfitNotFound(_)
            | garb_core::Error::ChallengeNotFound(_) => {
              ApiError::NotFound(core.to_string())
            }
          });
          break;
        }
        cursor = e.source();
      }
      found
    };

    match classified {
      Some(e) => e,
      None => ApiError::Store(boxed),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"garb\""),
        );
        return res;
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed on the store");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
