//! Optimistic application of votes ahead of store confirmation.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use garb_core::{
  profile::CurrentUser,
  store::WardrobeStore,
  vote::{VoteDirection, VoteTally, VoteTarget},
};

use crate::{Error, Result, connectivity::ConnectivityMonitor};

/// Applies a vote's effect to local aggregates immediately and reconciles
/// with the store afterwards.
///
/// Local state is only ever touched by the owning task; the store call is
/// the single suspension point in [`cast`](Self::cast), and the in-flight
/// set spans it so an abandoned submission cannot be stacked on by a second
/// one whose outcome would then apply out of order.
pub struct VoteCoordinator<S> {
  store:        Arc<S>,
  connectivity: ConnectivityMonitor,
  viewer:       Option<CurrentUser>,
  /// Local tallies, seeded from entry loads and mutated optimistically.
  tallies:      HashMap<VoteTarget, VoteTally>,
  /// The viewer's vote per target, as this client believes it to be.
  votes:        HashMap<VoteTarget, VoteDirection>,
  /// Targets with a submission currently in flight.
  in_flight:    HashSet<VoteTarget>,
}

impl<S: WardrobeStore> VoteCoordinator<S> {
  pub fn new(
    store: Arc<S>,
    connectivity: ConnectivityMonitor,
    viewer: Option<CurrentUser>,
  ) -> Self {
    Self {
      store,
      connectivity,
      viewer,
      tallies: HashMap::new(),
      votes: HashMap::new(),
      in_flight: HashSet::new(),
    }
  }

  /// Seed local state for a target from a fresh store read. Server truth
  /// supersedes any abandoned in-flight submission for the target.
  pub fn prime(
    &mut self,
    target: VoteTarget,
    tally: VoteTally,
    viewer_vote: Option<VoteDirection>,
  ) {
    self.tallies.insert(target, tally);
    match viewer_vote {
      Some(direction) => {
        self.votes.insert(target, direction);
      }
      None => {
        self.votes.remove(&target);
      }
    }
    self.in_flight.remove(&target);
  }

  /// The tally for `target` as this client currently believes it to be.
  /// Unknown targets tally as zero.
  pub fn tally(&self, target: VoteTarget) -> VoteTally {
    self.tallies.get(&target).copied().unwrap_or_default()
  }

  /// The viewer's vote on `target`, as this client believes it to be.
  pub fn vote(&self, target: VoteTarget) -> Option<VoteDirection> {
    self.votes.get(&target).copied()
  }

  pub fn viewer(&self) -> Option<&CurrentUser> { self.viewer.as_ref() }

  /// Cast, switch, or retract (`None`) the viewer's vote on `target`.
  ///
  /// The local tally and vote map are updated before the store call and
  /// restored exactly if it fails. Offline and in-flight refusals happen
  /// before any local mutation, so a refused cast leaves no trace.
  pub async fn cast(
    &mut self,
    target: VoteTarget,
    direction: Option<VoteDirection>,
  ) -> Result<()> {
    let Some(viewer) = self.viewer.as_ref() else {
      return Err(Error::AuthRequired);
    };
    let voter_id = viewer.user_id;

    if !self.connectivity.is_online() {
      return Err(Error::Offline);
    }
    if self.in_flight.contains(&target) {
      return Err(Error::SubmissionInProgress);
    }

    // Snapshot, then apply the optimistic transition.
    let prev_vote = self.votes.get(&target).copied();
    let prev_tally = self.tally(target);

    let mut next_tally = prev_tally;
    next_tally.apply_transition(prev_vote, direction);
    self.tallies.insert(target, next_tally);
    match direction {
      Some(d) => {
        self.votes.insert(target, d);
      }
      None => {
        self.votes.remove(&target);
      }
    }

    self.in_flight.insert(target);
    let outcome = self.store.submit_vote(voter_id, target, direction).await;
    self.in_flight.remove(&target);

    match outcome {
      Ok(()) => Ok(()),
      Err(e) => {
        // Roll local state back to the snapshot before surfacing.
        self.tallies.insert(target, prev_tally);
        match prev_vote {
          Some(d) => {
            self.votes.insert(target, d);
          }
          None => {
            self.votes.remove(&target);
          }
        }
        Err(Error::storage(e))
      }
    }
  }
}
