//! Style challenges and their derived phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a challenge sits relative to a point in time.
///
/// Always derived from the start/end window at the moment of the read;
/// nothing ever stores a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengePhase {
  Upcoming,
  Current,
  Past,
}

/// A time-boxed outfit challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
  pub challenge_id: Uuid,
  pub title:        String,
  pub description:  String,
  pub starts_at:    DateTime<Utc>,
  pub ends_at:      DateTime<Utc>,
  /// `None` for system-created challenges.
  pub created_by:   Option<Uuid>,
  pub created_at:   DateTime<Utc>,
}

impl Challenge {
  /// The phase of this challenge at `now`. Both boundaries count as
  /// current: the challenge runs from `starts_at` through `ends_at`
  /// inclusive.
  pub fn phase_at(&self, now: DateTime<Utc>) -> ChallengePhase {
    if now < self.starts_at {
      ChallengePhase::Upcoming
    } else if now > self.ends_at {
      ChallengePhase::Past
    } else {
      ChallengePhase::Current
    }
  }
}

/// Input to [`crate::store::WardrobeStore::add_challenge`].
#[derive(Debug, Clone)]
pub struct NewChallenge {
  pub title:       String,
  pub description: String,
  pub starts_at:   DateTime<Utc>,
  pub ends_at:     DateTime<Utc>,
  pub created_by:  Option<Uuid>,
}
