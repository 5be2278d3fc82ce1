//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/profiles` | Open registration; hashes the password |
//! | `GET`  | `/profiles/{id}` | Public profile, 404 if not found |

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use garb_core::{
  profile::{NewProfile, Profile},
  store::WardrobeStore,
};
use rand_core::OsRng;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:        String,
  pub display_name: String,
  pub password:     String,
}

/// `POST /profiles` — body: [`RegisterBody`]; returns 201 + the profile.
/// The password never reaches the store in the clear.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WardrobeStore,
{
  if body.email.trim().is_empty() || !body.email.contains('@') {
    return Err(ApiError::BadRequest("invalid email".to_string()));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".to_string()));
  }
  let display_name = if body.display_name.trim().is_empty() {
    body.email.split('@').next().unwrap_or(&body.email).to_owned()
  } else {
    body.display_name.trim().to_owned()
  };

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(body.password.as_bytes(), &salt)
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))?
    .to_string();

  let profile = state
    .store
    .add_profile(NewProfile {
      email: body.email.trim().to_owned(),
      display_name,
      password_hash: Some(hash),
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /profiles/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: WardrobeStore,
{
  let profile = state
    .store
    .get_profile(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}
