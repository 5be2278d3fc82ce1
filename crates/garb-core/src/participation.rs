//! Challenge participations and the joined entry read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  outfit::Outfit,
  vote::{VoteDirection, VoteTally, VoteTarget},
};

/// One user's entry of one outfit into one challenge.
/// At most one participation exists per `(challenge_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
  pub participation_id: Uuid,
  pub challenge_id:     Uuid,
  pub user_id:          Uuid,
  pub outfit_id:        Uuid,
  pub created_at:       DateTime<Utc>,
}

/// The computed read model for a challenge entry: a participation joined
/// with its outfit, the owner's display name, the current tally, and the
/// viewing user's own vote. Never stored, always derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
  pub participation: Participation,
  pub outfit:        Outfit,
  /// Display name of the user who entered the outfit.
  pub owner:         String,
  pub tally:         VoteTally,
  /// The viewer's vote on this entry, when a viewer was supplied.
  pub viewer_vote:   Option<VoteDirection>,
}

impl EntryView {
  /// The vote target for this entry.
  pub fn target(&self) -> VoteTarget {
    VoteTarget::entry(
      self.participation.challenge_id,
      self.participation.outfit_id,
    )
  }
}
