//! Error types for `garb-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("garment not found: {0}")]
  GarmentNotFound(Uuid),

  #[error("outfit not found: {0}")]
  OutfitNotFound(Uuid),

  #[error("challenge not found: {0}")]
  ChallengeNotFound(Uuid),

  #[error("user {user_id} already participates in challenge {challenge_id}")]
  AlreadyParticipating { challenge_id: Uuid, user_id: Uuid },

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
