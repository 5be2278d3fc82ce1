//! Handlers for `/votes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/votes?outfit_id=<id>[&challenge_id=<id>]` | Combined status |
//! | `POST` | `/votes` | Body: `{ "target": …, "direction": "up"\|"down"\|null }` |
//!
//! A challenge-scoped vote and a standalone vote on the same outfit are
//! distinct targets; the optional `challenge_id` picks between them.

use axum::{
  Json,
  extract::{Query, State},
};
use garb_core::{
  store::WardrobeStore,
  vote::{VoteDirection, VoteTarget},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Identity, MaybeIdentity},
  error::ApiError,
};

/// Everything a client needs to render a vote control in one response.
#[derive(Debug, Serialize)]
pub struct VoteStatus {
  pub viewer_vote: Option<VoteDirection>,
  pub up:          u32,
  pub down:        u32,
  pub score:       i64,
}

async fn status_for<S>(
  state: &AppState<S>,
  viewer: Option<Uuid>,
  target: VoteTarget,
) -> Result<VoteStatus, ApiError>
where
  S: WardrobeStore,
{
  let tally = state
    .store
    .vote_tally(target)
    .await
    .map_err(ApiError::from_store)?;
  let viewer_vote = match viewer {
    Some(user_id) => state
      .store
      .user_vote(user_id, target)
      .await
      .map_err(ApiError::from_store)?,
    None => None,
  };
  Ok(VoteStatus {
    viewer_vote,
    up: tally.up,
    down: tally.down,
    score: tally.score(),
  })
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub outfit_id:    Uuid,
  pub challenge_id: Option<Uuid>,
}

/// `GET /votes?outfit_id=<id>[&challenge_id=<id>]` — the tally plus, with
/// credentials, the viewer's own vote.
pub async fn status<S>(
  State(state): State<AppState<S>>,
  MaybeIdentity(viewer): MaybeIdentity,
  Query(params): Query<StatusParams>,
) -> Result<Json<VoteStatus>, ApiError>
where
  S: WardrobeStore,
{
  let target = VoteTarget {
    outfit_id:    params.outfit_id,
    challenge_id: params.challenge_id,
  };
  let status = status_for(&state, viewer.map(|v| v.user_id), target).await?;
  Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct CastBody {
  pub target:    VoteTarget,
  /// `null` (or absent) retracts the viewer's vote.
  #[serde(default)]
  pub direction: Option<VoteDirection>,
}

/// `POST /votes` — cast, switch, or retract the viewer's vote, then return
/// the fresh [`VoteStatus`]. Re-sending the held direction changes nothing.
pub async fn cast<S>(
  State(state): State<AppState<S>>,
  Identity(viewer): Identity,
  Json(body): Json<CastBody>,
) -> Result<Json<VoteStatus>, ApiError>
where
  S: WardrobeStore,
{
  state
    .store
    .submit_vote(viewer.user_id, body.target, body.direction)
    .await
    .map_err(ApiError::from_store)?;
  let status = status_for(&state, Some(viewer.user_id), body.target).await?;
  Ok(Json(status))
}
