//! The un-voted-entry carousel for one challenge.
//!
//! Presents the challenge's entries the viewer has not voted on yet, best
//! ranked first, and walks them with a clamped cursor. Votes go through the
//! crate's [`VoteCoordinator`], so a failed cast never leaves the deck and
//! the local aggregates disagreeing.

use std::sync::Arc;

use garb_core::{
  participation::EntryView, profile::CurrentUser, ranking,
  store::WardrobeStore, vote::VoteDirection,
};
use uuid::Uuid;

use crate::{
  Result,
  connectivity::ConnectivityMonitor,
  coordinator::VoteCoordinator,
  retry::{RetryPolicy, with_retry},
};

/// Where the carousel is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselPhase {
  /// Initial state; also re-entered by retry and reload.
  Loading,
  /// Entries remain to vote on; the cursor points at the current one.
  Ready,
  /// The viewer has voted on every entry in the challenge.
  AllVoted,
  /// A load failed or connectivity dropped. [`VoteCarousel::retry`]
  /// re-enters `Loading`.
  Error(String),
}

pub struct VoteCarousel<S> {
  store:        Arc<S>,
  coordinator:  VoteCoordinator<S>,
  challenge_id: Uuid,
  retry:        RetryPolicy,
  phase:        CarouselPhase,
  /// Entries still awaiting the viewer's vote, ranked best first.
  entries:      Vec<EntryView>,
  /// Position within `entries`. Meaningful only in `Ready`.
  cursor:       usize,
}

impl<S: WardrobeStore> VoteCarousel<S> {
  /// A carousel for `challenge_id`, in `Loading` until the first
  /// [`load`](Self::load).
  pub fn new(
    store: Arc<S>,
    connectivity: ConnectivityMonitor,
    viewer: Option<CurrentUser>,
    challenge_id: Uuid,
    retry: RetryPolicy,
  ) -> Self {
    let coordinator =
      VoteCoordinator::new(Arc::clone(&store), connectivity, viewer);
    Self {
      store,
      coordinator,
      challenge_id,
      retry,
      phase: CarouselPhase::Loading,
      entries: Vec::new(),
      cursor: 0,
    }
  }

  pub fn phase(&self) -> &CarouselPhase { &self.phase }

  /// Entries still awaiting a vote, best ranked first.
  pub fn entries(&self) -> &[EntryView] { &self.entries }

  pub fn cursor(&self) -> usize { self.cursor }

  /// The entry under the cursor, when the deck is interactive.
  pub fn current_entry(&self) -> Option<&EntryView> {
    (self.phase == CarouselPhase::Ready)
      .then(|| self.entries.get(self.cursor))
      .flatten()
  }

  pub fn coordinator(&self) -> &VoteCoordinator<S> { &self.coordinator }

  /// Fetch the challenge's entries and (re)build the deck.
  ///
  /// Seeds the coordinator with server truth for every entry, drops the
  /// ones the viewer already voted on, ranks the rest, and resets the
  /// cursor. An empty deck means `AllVoted`; a failed fetch (after the
  /// retry policy is exhausted) means `Error`.
  pub async fn load(&mut self) {
    self.phase = CarouselPhase::Loading;
    let challenge_id = self.challenge_id;
    let viewer_id = self.coordinator.viewer().map(|v| v.user_id);

    let store = &self.store;
    let fetched = with_retry(&self.retry, || {
      let store = Arc::clone(store);
      async move { store.challenge_entries(challenge_id, viewer_id).await }
    })
    .await;

    let all = match fetched {
      Ok(entries) => entries,
      Err(e) => {
        self.phase = CarouselPhase::Error(e.to_string());
        return;
      }
    };

    for entry in &all {
      self
        .coordinator
        .prime(entry.target(), entry.tally, entry.viewer_vote);
    }
    self.entries =
      all.into_iter().filter(|e| e.viewer_vote.is_none()).collect();
    ranking::rank_entries(&mut self.entries);
    self.cursor = 0;
    self.phase = if self.entries.is_empty() {
      CarouselPhase::AllVoted
    } else {
      CarouselPhase::Ready
    };
  }

  /// Vote on the entry under the cursor.
  ///
  /// The entry leaves the deck only when the submission succeeds; a failed
  /// cast leaves the deck and cursor untouched (the coordinator has already
  /// rolled its own state back). Outside `Ready` there is nothing under the
  /// cursor and the call is a no-op.
  pub async fn cast_vote(&mut self, direction: VoteDirection) -> Result<()> {
    if self.phase != CarouselPhase::Ready {
      return Ok(());
    }
    let target = self.entries[self.cursor].target();
    self.coordinator.cast(target, Some(direction)).await?;

    // Committed: drop the entry and re-rank what is left under the
    // coordinator's current tallies.
    self.entries.remove(self.cursor);
    for entry in &mut self.entries {
      entry.tally = self.coordinator.tally(entry.target());
    }
    ranking::rank_entries(&mut self.entries);
    if self.entries.is_empty() {
      self.phase = CarouselPhase::AllVoted;
    } else {
      self.cursor = self.cursor.min(self.entries.len() - 1);
    }
    Ok(())
  }

  /// Move the cursor forward. A no-op at the end of the deck.
  pub fn navigate_next(&mut self) {
    if self.phase == CarouselPhase::Ready
      && self.cursor + 1 < self.entries.len()
    {
      self.cursor += 1;
    }
  }

  /// Move the cursor back. A no-op at the start of the deck.
  pub fn navigate_previous(&mut self) {
    if self.phase == CarouselPhase::Ready && self.cursor > 0 {
      self.cursor -= 1;
    }
  }

  /// React to a connectivity transition: loss while interactive degrades to
  /// the error phase, restoration from it reloads automatically.
  pub async fn handle_connectivity(&mut self, online: bool) {
    if !online {
      if matches!(self.phase, CarouselPhase::Ready | CarouselPhase::Error(_))
      {
        self.phase = CarouselPhase::Error("connection lost".into());
      }
      return;
    }
    if matches!(self.phase, CarouselPhase::Error(_)) {
      self.load().await;
    }
  }

  /// The user-facing retry action. Only meaningful from the error phase.
  pub async fn retry(&mut self) {
    if matches!(self.phase, CarouselPhase::Error(_)) {
      self.load().await;
    }
  }

  /// Reload from the store, keeping the cursor on the same entry when it
  /// survives the reload. Used by change-feed consumers to converge on
  /// committed state.
  pub async fn refresh(&mut self) {
    let anchor = (self.phase == CarouselPhase::Ready)
      .then(|| {
        self
          .entries
          .get(self.cursor)
          .map(|e| e.participation.participation_id)
      })
      .flatten();

    self.load().await;

    if let (CarouselPhase::Ready, Some(anchor)) = (&self.phase, anchor) {
      if let Some(pos) = self
        .entries
        .iter()
        .position(|e| e.participation.participation_id == anchor)
      {
        self.cursor = pos;
      }
    }
  }
}
