//! Handlers for `/favorites` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/favorites` | The viewer's favorites, newest first |
//! | `GET`    | `/favorites/resolved` | Each favorite with its live element |
//! | `POST`   | `/favorites` | Body: `{ "target": … }`; idempotent |
//! | `DELETE` | `/favorites` | Body: `{ "target": … }`; idempotent |
//!
//! Favorites are weak references: deleting the element leaves the favorite
//! in place, and `/favorites/resolved` reports it as dangling.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use garb_core::{
  favorite::{Favorite, FavoriteTarget, ResolvedFavorite},
  store::WardrobeStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Identity, error::ApiError};

/// `GET /favorites`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
) -> Result<Json<Vec<Favorite>>, ApiError>
where
  S: WardrobeStore,
{
  let favorites = state
    .store
    .list_favorites(viewer.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(favorites))
}

/// One favorite paired with what it currently points at.
#[derive(Debug, Serialize)]
pub struct ResolvedEntry {
  pub favorite:   Favorite,
  pub resolution: ResolvedFavorite,
}

/// `GET /favorites/resolved` — favorites joined with their live elements.
/// Deleted elements show up as `dangling` instead of disappearing.
pub async fn list_resolved<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
) -> Result<Json<Vec<ResolvedEntry>>, ApiError>
where
  S: WardrobeStore,
{
  let favorites = state
    .store
    .list_favorites(viewer.user_id)
    .await
    .map_err(ApiError::from_store)?;

  let mut resolved = Vec::with_capacity(favorites.len());
  for favorite in favorites {
    let resolution = state
      .store
      .resolve_favorite(favorite.target)
      .await
      .map_err(ApiError::from_store)?;
    resolved.push(ResolvedEntry { favorite, resolution });
  }
  Ok(Json(resolved))
}

#[derive(Debug, Deserialize)]
pub struct TargetBody {
  pub target: FavoriteTarget,
}

/// `POST /favorites` — returns 201 + the favorite record. Re-favoriting
/// returns the existing record unchanged.
pub async fn add<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Json(body): Json<TargetBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WardrobeStore,
{
  let favorite = state
    .store
    .add_favorite(viewer.user_id, body.target)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(favorite)))
}

/// `DELETE /favorites` — 204 whether or not the favorite existed.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Json(body): Json<TargetBody>,
) -> Result<StatusCode, ApiError>
where
  S: WardrobeStore,
{
  state
    .store
    .remove_favorite(viewer.user_id, body.target)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
