//! HTTP Basic-auth extractors backed by stored credentials.
//!
//! Credentials are `email:password`, verified against the argon2 PHC
//! string held by the store for that email. There is no server-wide
//! account: every request authenticates as a registered profile.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{extract::FromRequestParts, http::{HeaderMap, request::Parts}};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use garb_core::{profile::CurrentUser, store::WardrobeStore};

use crate::{AppState, error::ApiError};

/// The authenticated viewer. Rejects with 401 when the request carries no
/// valid credentials.
pub struct Identity(pub CurrentUser);

/// An optional viewer: `None` when the request is anonymous. Credentials
/// that are present but wrong still reject with 401 rather than silently
/// downgrading to anonymous.
pub struct MaybeIdentity(pub Option<CurrentUser>);

/// Pull `email:password` out of an `Authorization: Basic …` header.
/// `None` when the header is absent or not Basic at all.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?;
  let encoded = header_val.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (email, password) = creds.split_once(':')?;
  Some((email.to_owned(), password.to_owned()))
}

/// Verify a password against the stored hash for `email`.
///
/// Unknown emails, passwordless accounts, and wrong passwords are all the
/// same `Unauthorized`; only a store failure surfaces differently.
async fn verify<S>(
  store: &S,
  email: &str,
  password: &str,
) -> Result<CurrentUser, ApiError>
where
  S: WardrobeStore,
{
  let creds = store
    .credentials(email)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&creds.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(CurrentUser { user_id: creds.user_id, email: email.to_owned() })
}

impl<S> FromRequestParts<AppState<S>> for Identity
where
  S: WardrobeStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) =
      basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let user = verify(&*state.store, &email, &password).await?;
    Ok(Identity(user))
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeIdentity
where
  S: WardrobeStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match basic_credentials(&parts.headers) {
      None => Ok(MaybeIdentity(None)),
      Some((email, password)) => {
        let user = verify(&*state.store, &email, &password).await?;
        Ok(MaybeIdentity(Some(user)))
      }
    }
  }
}
