//! Cross-module tests against the real SQLite store, with a fault-injecting
//! wrapper for the failure paths.

use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, Ordering},
  },
  task::{Context, Poll, Waker},
  time::Duration,
};

use garb_core::{
  challenge::{Challenge, NewChallenge},
  favorite::{Favorite, FavoriteDetails, FavoriteTarget, ResolvedFavorite},
  outfit::{BodySlot, Garment, NewGarment, NewOutfit, Outfit},
  participation::{EntryView, Participation},
  profile::{CurrentUser, NewProfile, Profile, StoredCredentials},
  store::{StoreEvent, WardrobeStore},
  vote::{VoteDirection, VoteTally, VoteTarget},
};
use garb_store_sqlite::SqliteStore;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error,
  carousel::{CarouselPhase, VoteCarousel},
  connectivity::{self, ConnectivityHandle},
  coordinator::VoteCoordinator,
  favorites::FavoriteSet,
  profiles::ProfileCache,
  retry::RetryPolicy,
};

// ─── Fault-injecting store wrapper ───────────────────────────────────────────

/// Wraps a real store and injects failures or stalls on demand.
struct FlakyStore<S> {
  inner:           S,
  /// Fail this many upcoming entry reads, then recover.
  fail_next_reads: AtomicU32,
  /// Fail every write until cleared.
  fail_writes:     AtomicBool,
  /// Park vote writes forever, for abandoned-submission tests.
  stall_votes:     AtomicBool,
  write_attempts:  AtomicU32,
  profile_reads:   AtomicU32,
}

impl<S> FlakyStore<S> {
  fn new(inner: S) -> Self {
    Self {
      inner,
      fail_next_reads: AtomicU32::new(0),
      fail_writes: AtomicBool::new(false),
      stall_votes: AtomicBool::new(false),
      write_attempts: AtomicU32::new(0),
      profile_reads: AtomicU32::new(0),
    }
  }

  fn fail_next_reads(&self, n: u32) {
    self.fail_next_reads.store(n, Ordering::SeqCst);
  }

  fn fail_writes(&self, on: bool) {
    self.fail_writes.store(on, Ordering::SeqCst);
  }

  fn stall_votes(&self, on: bool) {
    self.stall_votes.store(on, Ordering::SeqCst);
  }

  fn write_attempts(&self) -> u32 {
    self.write_attempts.load(Ordering::SeqCst)
  }

  fn profile_reads(&self) -> u32 { self.profile_reads.load(Ordering::SeqCst) }
}

#[derive(Debug, thiserror::Error)]
enum FlakyError<E>
where
  E: std::error::Error + 'static,
{
  #[error(transparent)]
  Inner(#[from] E),
  #[error("injected storage failure")]
  Injected,
}

impl<S: WardrobeStore> WardrobeStore for FlakyStore<S> {
  type Error = FlakyError<S::Error>;

  async fn add_profile(
    &self,
    input: NewProfile,
  ) -> Result<Profile, Self::Error> {
    Ok(self.inner.add_profile(input).await?)
  }

  async fn get_profile(
    &self,
    user_id: Uuid,
  ) -> Result<Option<Profile>, Self::Error> {
    self.profile_reads.fetch_add(1, Ordering::SeqCst);
    Ok(self.inner.get_profile(user_id).await?)
  }

  async fn get_profile_by_email(
    &self,
    email: &str,
  ) -> Result<Option<Profile>, Self::Error> {
    Ok(self.inner.get_profile_by_email(email).await?)
  }

  async fn credentials(
    &self,
    email: &str,
  ) -> Result<Option<StoredCredentials>, Self::Error> {
    Ok(self.inner.credentials(email).await?)
  }

  async fn add_garment(
    &self,
    input: NewGarment,
  ) -> Result<Garment, Self::Error> {
    Ok(self.inner.add_garment(input).await?)
  }

  async fn get_garment(
    &self,
    garment_id: Uuid,
  ) -> Result<Option<Garment>, Self::Error> {
    Ok(self.inner.get_garment(garment_id).await?)
  }

  async fn remove_garment(&self, garment_id: Uuid) -> Result<(), Self::Error> {
    Ok(self.inner.remove_garment(garment_id).await?)
  }

  async fn add_outfit(&self, input: NewOutfit) -> Result<Outfit, Self::Error> {
    Ok(self.inner.add_outfit(input).await?)
  }

  async fn get_outfit(
    &self,
    outfit_id: Uuid,
  ) -> Result<Option<Outfit>, Self::Error> {
    Ok(self.inner.get_outfit(outfit_id).await?)
  }

  async fn remove_outfit(&self, outfit_id: Uuid) -> Result<(), Self::Error> {
    Ok(self.inner.remove_outfit(outfit_id).await?)
  }

  async fn add_challenge(
    &self,
    input: NewChallenge,
  ) -> Result<Challenge, Self::Error> {
    Ok(self.inner.add_challenge(input).await?)
  }

  async fn get_challenge(
    &self,
    challenge_id: Uuid,
  ) -> Result<Option<Challenge>, Self::Error> {
    Ok(self.inner.get_challenge(challenge_id).await?)
  }

  async fn list_challenges(&self) -> Result<Vec<Challenge>, Self::Error> {
    Ok(self.inner.list_challenges().await?)
  }

  async fn participation_for_user(
    &self,
    challenge_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Participation>, Self::Error> {
    Ok(self.inner.participation_for_user(challenge_id, user_id).await?)
  }

  async fn add_participation(
    &self,
    challenge_id: Uuid,
    user_id: Uuid,
    outfit_id: Uuid,
  ) -> Result<EntryView, Self::Error> {
    Ok(
      self
        .inner
        .add_participation(challenge_id, user_id, outfit_id)
        .await?,
    )
  }

  async fn challenge_entries(
    &self,
    challenge_id: Uuid,
    viewer: Option<Uuid>,
  ) -> Result<Vec<EntryView>, Self::Error> {
    let remaining = self.fail_next_reads.load(Ordering::SeqCst);
    if remaining > 0 {
      self.fail_next_reads.store(remaining - 1, Ordering::SeqCst);
      return Err(FlakyError::Injected);
    }
    Ok(self.inner.challenge_entries(challenge_id, viewer).await?)
  }

  async fn winning_entry(
    &self,
    challenge_id: Uuid,
  ) -> Result<Option<EntryView>, Self::Error> {
    Ok(self.inner.winning_entry(challenge_id).await?)
  }

  async fn submit_vote(
    &self,
    voter_id: Uuid,
    target: VoteTarget,
    direction: Option<VoteDirection>,
  ) -> Result<(), Self::Error> {
    self.write_attempts.fetch_add(1, Ordering::SeqCst);
    if self.stall_votes.load(Ordering::SeqCst) {
      std::future::pending::<()>().await;
    }
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected);
    }
    Ok(self.inner.submit_vote(voter_id, target, direction).await?)
  }

  async fn user_vote(
    &self,
    voter_id: Uuid,
    target: VoteTarget,
  ) -> Result<Option<VoteDirection>, Self::Error> {
    Ok(self.inner.user_vote(voter_id, target).await?)
  }

  async fn vote_tally(
    &self,
    target: VoteTarget,
  ) -> Result<VoteTally, Self::Error> {
    Ok(self.inner.vote_tally(target).await?)
  }

  async fn add_favorite(
    &self,
    user_id: Uuid,
    target: FavoriteTarget,
  ) -> Result<Favorite, Self::Error> {
    self.write_attempts.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected);
    }
    Ok(self.inner.add_favorite(user_id, target).await?)
  }

  async fn remove_favorite(
    &self,
    user_id: Uuid,
    target: FavoriteTarget,
  ) -> Result<(), Self::Error> {
    self.write_attempts.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected);
    }
    Ok(self.inner.remove_favorite(user_id, target).await?)
  }

  async fn list_favorites(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<Favorite>, Self::Error> {
    Ok(self.inner.list_favorites(user_id).await?)
  }

  async fn resolve_favorite(
    &self,
    target: FavoriteTarget,
  ) -> Result<ResolvedFavorite, Self::Error> {
    Ok(self.inner.resolve_favorite(target).await?)
  }

  fn changes(&self) -> broadcast::Receiver<StoreEvent> {
    self.inner.changes()
  }
}

// ─── Setup ───────────────────────────────────────────────────────────────────

type TestStore = FlakyStore<SqliteStore>;

/// One challenge, an authenticated viewer, and a flaky store over a shared
/// in-memory database. `raw` seeds fixtures without touching the counters.
struct Setup {
  store:     Arc<TestStore>,
  raw:       SqliteStore,
  challenge: Challenge,
  viewer:    CurrentUser,
}

async fn setup() -> Setup {
  let raw = SqliteStore::open_in_memory().await.expect("in-memory store");
  let store = Arc::new(FlakyStore::new(raw.clone()));
  let challenge = open_challenge(&raw).await;
  let profile = seed_user(&raw, "viewer@example.com").await;
  let viewer = CurrentUser {
    user_id: profile.user_id,
    email:   profile.email,
  };
  Setup { store, raw, challenge, viewer }
}

async fn seed_user(s: &SqliteStore, email: &str) -> Profile {
  s.add_profile(NewProfile {
    email:         email.to_owned(),
    display_name:  email.split('@').next().unwrap_or(email).to_owned(),
    password_hash: None,
  })
  .await
  .unwrap()
}

async fn open_challenge(s: &SqliteStore) -> Challenge {
  let now = chrono::Utc::now();
  s.add_challenge(NewChallenge {
    title:       "capsule wardrobe week".into(),
    description: String::new(),
    starts_at:   now - chrono::Duration::hours(1),
    ends_at:     now + chrono::Duration::hours(1),
    created_by:  None,
  })
  .await
  .unwrap()
}

/// Register a user, build them a one-garment outfit, and enter it.
async fn seed_entry(
  s: &SqliteStore,
  challenge: &Challenge,
  email: &str,
) -> EntryView {
  let who = seed_user(s, email).await;
  let garment = s
    .add_garment(NewGarment {
      owner_id: who.user_id,
      name:     "shirt".into(),
      color:    None,
    })
    .await
    .unwrap();
  let outfit = s
    .add_outfit(NewOutfit {
      owner_id:    who.user_id,
      name:        format!("{} look", who.display_name),
      description: None,
      garments:    vec![(garment.garment_id, BodySlot::Top)],
    })
    .await
    .unwrap();
  s.add_participation(challenge.challenge_id, who.user_id, outfit.outfit_id)
    .await
    .unwrap()
}

/// Cast an upvote on `target` from a freshly registered user.
async fn seed_upvote(s: &SqliteStore, email: &str, target: VoteTarget) {
  let voter = seed_user(s, email).await;
  s.submit_vote(voter.user_id, target, Some(VoteDirection::Up))
    .await
    .unwrap();
}

fn carousel_for(
  setup: &Setup,
  retry: RetryPolicy,
) -> (ConnectivityHandle, VoteCarousel<TestStore>) {
  let (handle, monitor) = connectivity::channel(true);
  let carousel = VoteCarousel::new(
    Arc::clone(&setup.store),
    monitor,
    Some(setup.viewer.clone()),
    setup.challenge.challenge_id,
    retry,
  );
  (handle, carousel)
}

fn deck_ids(carousel: &VoteCarousel<TestStore>) -> Vec<Uuid> {
  carousel
    .entries()
    .iter()
    .map(|e| e.participation.participation_id)
    .collect()
}

async fn pause() {
  // Keeps participation timestamps strictly ordered.
  tokio::time::sleep(Duration::from_millis(10)).await;
}

// ─── Carousel: loading and ranking ───────────────────────────────────────────

#[tokio::test]
async fn deck_is_ranked_by_score_then_age() {
  let setup = setup().await;
  let a = seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  pause().await;
  let b = seed_entry(&setup.raw, &setup.challenge, "bob@example.com").await;
  pause().await;
  let c = seed_entry(&setup.raw, &setup.challenge, "carol@example.com").await;

  // a and b tie on score; a is older and must rank first.
  seed_upvote(&setup.raw, "v1@example.com", a.target()).await;
  seed_upvote(&setup.raw, "v2@example.com", a.target()).await;
  seed_upvote(&setup.raw, "v3@example.com", b.target()).await;
  seed_upvote(&setup.raw, "v4@example.com", b.target()).await;
  seed_upvote(&setup.raw, "v5@example.com", c.target()).await;

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;

  assert_eq!(*carousel.phase(), CarouselPhase::Ready);
  assert_eq!(deck_ids(&carousel), vec![
    a.participation.participation_id,
    b.participation.participation_id,
    c.participation.participation_id,
  ]);
  assert_eq!(carousel.cursor(), 0);
  assert_eq!(carousel.entries()[0].tally.up, 2);
}

#[tokio::test]
async fn already_voted_entries_never_enter_the_deck() {
  let setup = setup().await;
  let a = seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  pause().await;
  let b = seed_entry(&setup.raw, &setup.challenge, "bob@example.com").await;

  setup
    .raw
    .submit_vote(setup.viewer.user_id, a.target(), Some(VoteDirection::Down))
    .await
    .unwrap();

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;

  assert_eq!(*carousel.phase(), CarouselPhase::Ready);
  assert_eq!(deck_ids(&carousel), vec![b.participation.participation_id]);
  // The coordinator still knows about the voted entry.
  assert_eq!(
    carousel.coordinator().vote(a.target()),
    Some(VoteDirection::Down)
  );
}

#[tokio::test]
async fn fully_voted_or_empty_challenges_load_as_all_voted() {
  let setup = setup().await;

  // No participations at all.
  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  assert_eq!(*carousel.phase(), CarouselPhase::AllVoted);

  // Every entry already voted on.
  let a = seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  setup
    .raw
    .submit_vote(setup.viewer.user_id, a.target(), Some(VoteDirection::Up))
    .await
    .unwrap();
  carousel.load().await;
  assert_eq!(*carousel.phase(), CarouselPhase::AllVoted);
}

// ─── Carousel: voting through the deck ───────────────────────────────────────

#[tokio::test]
async fn voting_walks_the_deck_to_exhaustion() {
  let setup = setup().await;
  let a = seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  pause().await;
  let b = seed_entry(&setup.raw, &setup.challenge, "bob@example.com").await;
  pause().await;
  let c = seed_entry(&setup.raw, &setup.challenge, "carol@example.com").await;

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  assert_eq!(deck_ids(&carousel).len(), 3);

  carousel.cast_vote(VoteDirection::Up).await.unwrap();
  assert_eq!(deck_ids(&carousel), vec![
    b.participation.participation_id,
    c.participation.participation_id,
  ]);
  assert_eq!(carousel.cursor(), 0);

  carousel.cast_vote(VoteDirection::Down).await.unwrap();
  carousel.cast_vote(VoteDirection::Up).await.unwrap();
  assert_eq!(*carousel.phase(), CarouselPhase::AllVoted);
  assert!(carousel.current_entry().is_none());

  // All three votes are committed.
  for (entry, expected) in [
    (&a, Some(VoteDirection::Up)),
    (&b, Some(VoteDirection::Down)),
    (&c, Some(VoteDirection::Up)),
  ] {
    assert_eq!(
      setup
        .raw
        .user_vote(setup.viewer.user_id, entry.target())
        .await
        .unwrap(),
      expected
    );
  }

  // Voting with nothing under the cursor is a quiet no-op.
  let before = setup.store.write_attempts();
  carousel.cast_vote(VoteDirection::Up).await.unwrap();
  assert_eq!(setup.store.write_attempts(), before);
}

#[tokio::test]
async fn cursor_clamps_when_the_last_entry_is_voted() {
  let setup = setup().await;
  seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  pause().await;
  seed_entry(&setup.raw, &setup.challenge, "bob@example.com").await;
  pause().await;
  seed_entry(&setup.raw, &setup.challenge, "carol@example.com").await;

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;

  carousel.navigate_next();
  carousel.navigate_next();
  assert_eq!(carousel.cursor(), 2);

  carousel.cast_vote(VoteDirection::Up).await.unwrap();
  assert_eq!(carousel.entries().len(), 2);
  assert_eq!(carousel.cursor(), 1);
}

#[tokio::test]
async fn navigation_is_clamped_at_the_bounds() {
  let setup = setup().await;
  seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  pause().await;
  seed_entry(&setup.raw, &setup.challenge, "bob@example.com").await;

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;

  carousel.navigate_previous();
  assert_eq!(carousel.cursor(), 0);

  carousel.navigate_next();
  carousel.navigate_next();
  carousel.navigate_next();
  assert_eq!(carousel.cursor(), 1);
}

// ─── Carousel: failure and connectivity ──────────────────────────────────────

#[tokio::test]
async fn load_failure_enters_error_and_retry_recovers() {
  let setup = setup().await;
  seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;

  setup.store.fail_next_reads(1);
  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  assert!(matches!(carousel.phase(), CarouselPhase::Error(_)));

  carousel.retry().await;
  assert_eq!(*carousel.phase(), CarouselPhase::Ready);
}

#[tokio::test]
async fn read_retry_rides_through_transient_failures() {
  let setup = setup().await;
  seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;

  setup.store.fail_next_reads(2);
  let policy = RetryPolicy {
    max_attempts:  3,
    initial_delay: Duration::from_millis(1),
    max_delay:     Duration::from_millis(2),
    multiplier:    2.0,
  };
  let (_handle, mut carousel) = carousel_for(&setup, policy);
  carousel.load().await;

  assert_eq!(*carousel.phase(), CarouselPhase::Ready);
}

#[tokio::test]
async fn connectivity_loss_degrades_and_restoration_reloads() {
  let setup = setup().await;
  seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;

  let (handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  assert_eq!(*carousel.phase(), CarouselPhase::Ready);

  handle.set_online(false);
  carousel.handle_connectivity(false).await;
  assert!(matches!(carousel.phase(), CarouselPhase::Error(_)));

  handle.set_online(true);
  carousel.handle_connectivity(true).await;
  assert_eq!(*carousel.phase(), CarouselPhase::Ready);
}

#[tokio::test]
async fn all_voted_survives_a_connectivity_drop() {
  let setup = setup().await;

  let (handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  assert_eq!(*carousel.phase(), CarouselPhase::AllVoted);

  handle.set_online(false);
  carousel.handle_connectivity(false).await;
  assert_eq!(*carousel.phase(), CarouselPhase::AllVoted);
}

#[tokio::test]
async fn refresh_keeps_the_cursor_anchored() {
  let setup = setup().await;
  let a = seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  pause().await;
  let b = seed_entry(&setup.raw, &setup.challenge, "bob@example.com").await;
  pause().await;
  let c = seed_entry(&setup.raw, &setup.challenge, "carol@example.com").await;

  seed_upvote(&setup.raw, "v1@example.com", a.target()).await;
  seed_upvote(&setup.raw, "v2@example.com", a.target()).await;
  seed_upvote(&setup.raw, "v3@example.com", c.target()).await;

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  // Ranked [a(2), c(1), b(0)]; move onto c.
  assert_eq!(deck_ids(&carousel)[1], c.participation.participation_id);
  carousel.navigate_next();

  // Other users push c to the top while we look at it.
  seed_upvote(&setup.raw, "v4@example.com", c.target()).await;
  seed_upvote(&setup.raw, "v5@example.com", c.target()).await;
  carousel.refresh().await;

  assert_eq!(*carousel.phase(), CarouselPhase::Ready);
  assert_eq!(deck_ids(&carousel)[0], c.participation.participation_id);
  assert_eq!(carousel.cursor(), 0);
  assert_eq!(
    carousel.current_entry().unwrap().participation.participation_id,
    c.participation.participation_id
  );
  let _ = b;
}

// ─── Coordinator: optimistic discipline ──────────────────────────────────────

#[tokio::test]
async fn offline_cast_is_refused_before_the_store() {
  let setup = setup().await;
  let entry =
    seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;

  let (handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  let target = entry.target();
  let tally_before = carousel.coordinator().tally(target);

  handle.set_online(false);
  let err = carousel.cast_vote(VoteDirection::Up).await.unwrap_err();
  assert!(matches!(err, Error::Offline));
  assert!(err.is_retryable());

  // No store call, no optimistic residue, deck untouched.
  assert_eq!(setup.store.write_attempts(), 0);
  assert_eq!(carousel.coordinator().tally(target), tally_before);
  assert_eq!(carousel.coordinator().vote(target), None);
  assert_eq!(carousel.entries().len(), 1);
}

#[tokio::test]
async fn failed_cast_rolls_back_optimistic_state() {
  let setup = setup().await;
  let entry =
    seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  seed_upvote(&setup.raw, "v1@example.com", entry.target()).await;

  let (_handle, mut carousel) = carousel_for(&setup, RetryPolicy::none());
  carousel.load().await;
  let target = entry.target();
  let tally_before = carousel.coordinator().tally(target);
  assert_eq!(tally_before.up, 1);

  setup.store.fail_writes(true);
  let err = carousel.cast_vote(VoteDirection::Down).await.unwrap_err();
  assert!(matches!(err, Error::Storage(_)));
  assert!(err.is_retryable());

  assert_eq!(setup.store.write_attempts(), 1);
  assert_eq!(carousel.coordinator().tally(target), tally_before);
  assert_eq!(carousel.coordinator().vote(target), None);
  assert_eq!(carousel.entries().len(), 1);
  assert_eq!(carousel.cursor(), 0);

  // Nothing reached committed state either.
  assert_eq!(
    setup.raw.user_vote(setup.viewer.user_id, target).await.unwrap(),
    None
  );

  // Clearing the fault makes the same cast succeed.
  setup.store.fail_writes(false);
  carousel.cast_vote(VoteDirection::Down).await.unwrap();
  assert_eq!(*carousel.phase(), CarouselPhase::AllVoted);
  let tally = setup.raw.vote_tally(target).await.unwrap();
  assert_eq!((tally.up, tally.down), (1, 1));
}

#[tokio::test]
async fn abandoned_submission_guards_the_target() {
  let setup = setup().await;
  let entry =
    seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  let target = entry.target();

  let (_handle, monitor) = connectivity::channel(true);
  let mut coordinator = VoteCoordinator::new(
    Arc::clone(&setup.store),
    monitor,
    Some(setup.viewer.clone()),
  );
  coordinator.prime(target, VoteTally::default(), None);

  setup.store.stall_votes(true);
  {
    let mut cast = std::pin::pin!(coordinator.cast(target, Some(VoteDirection::Up)));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(matches!(cast.as_mut().poll(&mut cx), Poll::Pending));
    // Dropping here abandons the submission mid-flight.
  }
  setup.store.stall_votes(false);

  let err = coordinator
    .cast(target, Some(VoteDirection::Down))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SubmissionInProgress));

  // A fresh read of server truth releases the guard.
  coordinator.prime(target, VoteTally::default(), None);
  coordinator.cast(target, Some(VoteDirection::Down)).await.unwrap();
  assert_eq!(
    setup.raw.user_vote(setup.viewer.user_id, target).await.unwrap(),
    Some(VoteDirection::Down)
  );
}

#[tokio::test]
async fn casts_require_a_viewer() {
  let setup = setup().await;
  let (_handle, monitor) = connectivity::channel(true);
  let mut coordinator =
    VoteCoordinator::new(Arc::clone(&setup.store), monitor, None);

  let err = coordinator
    .cast(VoteTarget::outfit(Uuid::new_v4()), Some(VoteDirection::Up))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AuthRequired));
  assert!(!err.is_retryable());
  assert_eq!(setup.store.write_attempts(), 0);
}

#[tokio::test]
async fn retraction_through_the_coordinator_is_optimistic_too() {
  let setup = setup().await;
  let entry =
    seed_entry(&setup.raw, &setup.challenge, "alice@example.com").await;
  let target = entry.target();
  setup
    .raw
    .submit_vote(setup.viewer.user_id, target, Some(VoteDirection::Up))
    .await
    .unwrap();

  let (_handle, monitor) = connectivity::channel(true);
  let mut coordinator = VoteCoordinator::new(
    Arc::clone(&setup.store),
    monitor,
    Some(setup.viewer.clone()),
  );
  coordinator.prime(target, VoteTally { up: 1, down: 0 }, Some(VoteDirection::Up));

  coordinator.cast(target, None).await.unwrap();
  assert_eq!(coordinator.vote(target), None);
  assert_eq!(coordinator.tally(target), VoteTally::default());
  assert_eq!(
    setup.raw.user_vote(setup.viewer.user_id, target).await.unwrap(),
    None
  );
}

// ─── Favorites ───────────────────────────────────────────────────────────────

fn favorite_set(setup: &Setup, online: bool) -> (ConnectivityHandle, FavoriteSet<TestStore>) {
  let (handle, monitor) = connectivity::channel(online);
  let set = FavoriteSet::new(
    Arc::clone(&setup.store),
    monitor,
    Some(setup.viewer.clone()),
    ProfileCache::new(64),
  );
  (handle, set)
}

#[tokio::test]
async fn toggling_a_favorite_round_trips() {
  let setup = setup().await;
  let garment = setup
    .raw
    .add_garment(NewGarment {
      owner_id: setup.viewer.user_id,
      name:     "beret".into(),
      color:    Some("red".into()),
    })
    .await
    .unwrap();
  let target = FavoriteTarget::garment(garment.garment_id);

  let (_handle, mut set) = favorite_set(&setup, true);
  set.load().await.unwrap();
  assert!(set.is_empty());

  assert!(set.toggle(target).await.unwrap());
  assert!(set.contains(target));
  assert_eq!(setup.raw.list_favorites(setup.viewer.user_id).await.unwrap().len(), 1);

  assert!(!set.toggle(target).await.unwrap());
  assert!(!set.contains(target));
  assert!(setup.raw.list_favorites(setup.viewer.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn offline_toggle_is_refused_without_mutation() {
  let setup = setup().await;
  let target = FavoriteTarget::outfit(Uuid::new_v4());

  let (_handle, mut set) = favorite_set(&setup, false);
  let err = set.toggle(target).await.unwrap_err();
  assert!(matches!(err, Error::Offline));
  assert!(!set.contains(target));
  assert_eq!(setup.store.write_attempts(), 0);
}

#[tokio::test]
async fn failed_toggle_restores_membership() {
  let setup = setup().await;
  let target = FavoriteTarget::user(Uuid::new_v4());

  let (_handle, mut set) = favorite_set(&setup, true);
  set.toggle(target).await.unwrap();
  assert!(set.contains(target));

  setup.store.fail_writes(true);
  let err = set.toggle(target).await.unwrap_err();
  assert!(matches!(err, Error::Storage(_)));
  // The failed removal leaves the favorite in place.
  assert!(set.contains(target));
}

#[tokio::test]
async fn favorites_require_a_viewer() {
  let setup = setup().await;
  let (_handle, monitor) = connectivity::channel(true);
  let mut set = FavoriteSet::new(
    Arc::clone(&setup.store),
    monitor,
    None,
    ProfileCache::new(64),
  );

  assert!(matches!(set.load().await, Err(Error::AuthRequired)));
  assert!(matches!(
    set.toggle(FavoriteTarget::outfit(Uuid::new_v4())).await,
    Err(Error::AuthRequired)
  ));
}

#[tokio::test]
async fn user_favorites_resolve_through_the_cache() {
  let setup = setup().await;
  let friend = seed_user(&setup.raw, "friend@example.com").await;
  let target = FavoriteTarget::user(friend.user_id);

  let (_handle, set) = favorite_set(&setup, true);

  let first = set.resolve(target).await.unwrap();
  assert!(matches!(
    first,
    ResolvedFavorite::Resolved(FavoriteDetails::User(ref p))
      if p.user_id == friend.user_id
  ));
  assert_eq!(setup.store.profile_reads(), 1);

  // Second resolution is served from the cache.
  let second = set.resolve(target).await.unwrap();
  assert!(!second.is_dangling());
  assert_eq!(setup.store.profile_reads(), 1);

  // Unknown users dangle and are never cached.
  let missing = set.resolve(FavoriteTarget::user(Uuid::new_v4())).await.unwrap();
  assert!(missing.is_dangling());
}
