//! Handlers for `/garments` and `/outfits` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/garments` | Owner is the authenticated viewer |
//! | `GET`    | `/garments/{id}` | 404 if not found |
//! | `DELETE` | `/garments/{id}` | Owner only; favorites keep the reference |
//! | `POST`   | `/outfits` | Body: [`CreateOutfitBody`] |
//! | `GET`    | `/outfits/{id}` | Garments ordered by position |
//! | `DELETE` | `/outfits/{id}` | Owner only; entries skip it afterwards |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use garb_core::{
  outfit::{BodySlot, Garment, NewGarment, NewOutfit, Outfit},
  store::WardrobeStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError};

// ─── Garments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateGarmentBody {
  pub name:  String,
  pub color: Option<String>,
}

/// `POST /garments` — returns 201 + the stored garment.
pub async fn create_garment<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Json(body): Json<CreateGarmentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WardrobeStore,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("garment name is required".to_string()));
  }
  let garment = state
    .store
    .add_garment(NewGarment {
      owner_id: viewer.user_id,
      name:     body.name.trim().to_owned(),
      color:    body.color,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(garment)))
}

/// `GET /garments/{id}`
pub async fn get_garment<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Garment>, ApiError>
where
  S: WardrobeStore,
{
  let garment = state
    .store
    .get_garment(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("garment {id} not found")))?;
  Ok(Json(garment))
}

/// `DELETE /garments/{id}` — 204 on success. Favorites pointing at the
/// garment stay put and resolve as dangling from then on.
pub async fn delete_garment<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: WardrobeStore,
{
  let garment = state
    .store
    .get_garment(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("garment {id} not found")))?;
  if garment.owner_id != viewer.user_id {
    return Err(ApiError::Forbidden(
      "only the owner can delete a garment".to_string(),
    ));
  }
  state
    .store
    .remove_garment(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Outfits ─────────────────────────────────────────────────────────────────

/// One garment reference in a [`CreateOutfitBody`]. Position comes from the
/// order of the list.
#[derive(Debug, Deserialize)]
pub struct GarmentSpec {
  pub garment_id: Uuid,
  pub slot:       BodySlot,
}

#[derive(Debug, Deserialize)]
pub struct CreateOutfitBody {
  pub name:        String,
  pub description: Option<String>,
  #[serde(default)]
  pub garments:    Vec<GarmentSpec>,
}

/// `POST /outfits` — returns 201 + the stored outfit.
pub async fn create_outfit<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Json(body): Json<CreateOutfitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WardrobeStore,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("outfit name is required".to_string()));
  }
  let outfit = state
    .store
    .add_outfit(NewOutfit {
      owner_id:    viewer.user_id,
      name:        body.name.trim().to_owned(),
      description: body.description,
      garments:    body
        .garments
        .into_iter()
        .map(|g| (g.garment_id, g.slot))
        .collect(),
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(outfit)))
}

/// `GET /outfits/{id}`
pub async fn get_outfit<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Outfit>, ApiError>
where
  S: WardrobeStore,
{
  let outfit = state
    .store
    .get_outfit(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("outfit {id} not found")))?;
  Ok(Json(outfit))
}

/// `DELETE /outfits/{id}` — 204 on success. Participations and favorites
/// that reference the outfit stay in place; entry reads skip it.
pub async fn delete_outfit<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: WardrobeStore,
{
  let outfit = state
    .store
    .get_outfit(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("outfit {id} not found")))?;
  if outfit.owner_id != viewer.user_id {
    return Err(ApiError::Forbidden(
      "only the owner can delete an outfit".to_string(),
    ));
  }
  state
    .store
    .remove_outfit(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
