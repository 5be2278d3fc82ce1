//! Handlers for `/challenges` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/challenges` | Creator is the authenticated viewer |
//! | `GET`  | `/challenges` | Optional `?phase=upcoming\|current\|past` |
//! | `GET`  | `/challenges/{id}` | 404 if not found |
//! | `GET`  | `/challenges/{id}/entries` | Ranked; viewer-aware |
//! | `POST` | `/challenges/{id}/entries` | Participate; 409 on a second entry |
//! | `GET`  | `/challenges/{id}/participation` | `?user_id=` or the viewer |
//! | `GET`  | `/challenges/{id}/winner` | JSON `null` when no entries |
//!
//! Phase is never stored: the list filter recomputes it from the start/end
//! window at request time.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use garb_core::{
  challenge::{Challenge, ChallengePhase, NewChallenge},
  participation::{EntryView, Participation},
  ranking,
  store::WardrobeStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Identity, MaybeIdentity},
  error::ApiError,
};

// ─── Create / list / get ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateChallengeBody {
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub starts_at:   DateTime<Utc>,
  pub ends_at:     DateTime<Utc>,
}

/// `POST /challenges` — returns 201 + the stored challenge.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Json(body): Json<CreateChallengeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WardrobeStore,
{
  if body.title.trim().is_empty() {
    return Err(ApiError::BadRequest("challenge title is required".to_string()));
  }
  if body.ends_at < body.starts_at {
    return Err(ApiError::BadRequest(
      "challenge must end after it starts".to_string(),
    ));
  }
  let challenge = state
    .store
    .add_challenge(NewChallenge {
      title:       body.title.trim().to_owned(),
      description: body.description,
      starts_at:   body.starts_at,
      ends_at:     body.ends_at,
      created_by:  Some(viewer.user_id),
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(challenge)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub phase: Option<ChallengePhase>,
}

/// `GET /challenges[?phase=<phase>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Challenge>>, ApiError>
where
  S: WardrobeStore,
{
  let mut challenges = state
    .store
    .list_challenges()
    .await
    .map_err(ApiError::from_store)?;
  if let Some(phase) = params.phase {
    let now = Utc::now();
    challenges.retain(|c| c.phase_at(now) == phase);
  }
  Ok(Json(challenges))
}

/// `GET /challenges/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Challenge>, ApiError>
where
  S: WardrobeStore,
{
  let challenge = state
    .store
    .get_challenge(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("challenge {id} not found")))?;
  Ok(Json(challenge))
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// `GET /challenges/{id}/entries` — every entry with tallies, best ranked
/// first. With credentials, each entry also carries the viewer's own vote.
pub async fn entries<S>(
  State(state): State<AppState<S>>,
  MaybeIdentity(viewer): MaybeIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<EntryView>>, ApiError>
where
  S: WardrobeStore,
{
  // 404 for unknown challenges rather than an empty list.
  state
    .store
    .get_challenge(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("challenge {id} not found")))?;

  let mut entries = state
    .store
    .challenge_entries(id, viewer.map(|v| v.user_id))
    .await
    .map_err(ApiError::from_store)?;
  ranking::rank_entries(&mut entries);
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct ParticipateBody {
  pub outfit_id: Uuid,
}

/// `POST /challenges/{id}/entries` — enter an outfit. Returns 201 + the
/// fresh entry view; a second entry by the same user is a 409.
pub async fn participate<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<ParticipateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WardrobeStore,
{
  let entry = state
    .store
    .add_participation(id, viewer.user_id, body.outfit_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
pub struct ParticipationParams {
  pub user_id: Option<Uuid>,
}

/// `GET /challenges/{id}/participation[?user_id=<id>]` — whether a user has
/// entered. Defaults to the authenticated viewer; anonymous requests must
/// name a user. JSON `null` when there is no participation.
pub async fn participation<S>(
  State(state): State<AppState<S>>,
  MaybeIdentity(viewer): MaybeIdentity,
  Path(id): Path<Uuid>,
  Query(params): Query<ParticipationParams>,
) -> Result<Json<Option<Participation>>, ApiError>
where
  S: WardrobeStore,
{
  let user_id = params
    .user_id
    .or(viewer.map(|v| v.user_id))
    .ok_or_else(|| {
      ApiError::BadRequest("user_id is required without credentials".to_string())
    })?;
  let participation = state
    .store
    .participation_for_user(id, user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(participation))
}

// ─── Winner ──────────────────────────────────────────────────────────────────

/// `GET /challenges/{id}/winner` — the current leader under live tallies,
/// or JSON `null` for a challenge with no entries.
pub async fn winner<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Option<EntryView>>, ApiError>
where
  S: WardrobeStore,
{
  state
    .store
    .get_challenge(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("challenge {id} not found")))?;

  let winner = state
    .store
    .winning_entry(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(winner))
}
