//! Votes — one row per voter and target, aggregated on read.
//!
//! No full vote record travels through the public surface: operations take
//! a direction in and hand directions and tallies back. The persisted row
//! (voter, target, direction, timestamp) is a storage-layer concern.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two directions a vote can take. Absence of a vote is expressed as
/// `Option<VoteDirection>`, not a third variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
  Up,
  Down,
}

/// What a vote applies to: an outfit, optionally scoped to one challenge.
///
/// A challenge-scoped vote and an unscoped vote on the same outfit are
/// distinct targets. Each voter holds at most one vote per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteTarget {
  pub outfit_id:    Uuid,
  pub challenge_id: Option<Uuid>,
}

impl VoteTarget {
  /// A standalone vote on an outfit outside any challenge.
  pub fn outfit(outfit_id: Uuid) -> Self {
    Self { outfit_id, challenge_id: None }
  }

  /// A vote on an outfit as an entry in a challenge.
  pub fn entry(challenge_id: Uuid, outfit_id: Uuid) -> Self {
    Self { outfit_id, challenge_id: Some(challenge_id) }
  }
}

/// Aggregated counts for one target. Always recomputed from vote rows;
/// nothing persists a counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
  pub up:   u32,
  pub down: u32,
}

impl VoteTally {
  /// Net score: up-votes minus down-votes.
  pub fn score(&self) -> i64 {
    i64::from(self.up) - i64::from(self.down)
  }

  /// Apply one voter's transition from `prev` to `next` to the counts.
  /// Decrements saturate; a transition replayed against a stale tally must
  /// not underflow.
  pub fn apply_transition(
    &mut self,
    prev: Option<VoteDirection>,
    next: Option<VoteDirection>,
  ) {
    match prev {
      Some(VoteDirection::Up) => self.up = self.up.saturating_sub(1),
      Some(VoteDirection::Down) => self.down = self.down.saturating_sub(1),
      None => {}
    }
    match next {
      Some(VoteDirection::Up) => self.up += 1,
      Some(VoteDirection::Down) => self.down += 1,
      None => {}
    }
  }
}
