//! The `WardrobeStore` trait, its change feed, and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `garb-store-sqlite`).
//! Higher layers (`garb-session`, `garb-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  challenge::{Challenge, NewChallenge},
  favorite::{Favorite, FavoriteTarget, ResolvedFavorite},
  outfit::{Garment, NewGarment, NewOutfit, Outfit},
  participation::{EntryView, Participation},
  profile::{NewProfile, Profile, StoredCredentials},
  vote::{VoteDirection, VoteTally, VoteTarget},
};

// ─── Change feed ─────────────────────────────────────────────────────────────

/// Broadcast when a write changes committed state. Writes that change
/// nothing (re-sending a held vote, re-adding an existing favorite) emit no
/// event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
  VoteChanged { target: VoteTarget },
  ParticipationAdded { challenge_id: Uuid },
  FavoriteChanged { user_id: Uuid },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a garb storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait WardrobeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn get_profile_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Credential lookup for the authentication layer. `None` when the email
  /// is unknown or the account has no password set.
  fn credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<StoredCredentials>, Self::Error>>
  + Send
  + 'a;

  // ── Garments ──────────────────────────────────────────────────────────

  fn add_garment(
    &self,
    input: NewGarment,
  ) -> impl Future<Output = Result<Garment, Self::Error>> + Send + '_;

  fn get_garment(
    &self,
    garment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Garment>, Self::Error>> + Send + '_;

  /// Delete a garment. Favorites pointing at it stay in place and resolve
  /// as dangling from then on.
  fn remove_garment(
    &self,
    garment_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Outfits ───────────────────────────────────────────────────────────

  fn add_outfit(
    &self,
    input: NewOutfit,
  ) -> impl Future<Output = Result<Outfit, Self::Error>> + Send + '_;

  /// Retrieve an outfit with its garment references ordered by position.
  fn get_outfit(
    &self,
    outfit_id: Uuid,
  ) -> impl Future<Output = Result<Option<Outfit>, Self::Error>> + Send + '_;

  /// Delete an outfit. Participations and favorites that reference it stay
  /// in place; entry reads skip it and favorites resolve as dangling.
  fn remove_outfit(
    &self,
    outfit_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Challenges ────────────────────────────────────────────────────────

  fn add_challenge(
    &self,
    input: NewChallenge,
  ) -> impl Future<Output = Result<Challenge, Self::Error>> + Send + '_;

  fn get_challenge(
    &self,
    challenge_id: Uuid,
  ) -> impl Future<Output = Result<Option<Challenge>, Self::Error>> + Send + '_;

  /// All challenges, newest start first. Phase is derived by callers from
  /// the start/end window; the store never filters by it.
  fn list_challenges(
    &self,
  ) -> impl Future<Output = Result<Vec<Challenge>, Self::Error>> + Send + '_;

  // ── Participations ────────────────────────────────────────────────────

  /// The given user's participation in a challenge, if any.
  fn participation_for_user(
    &self,
    challenge_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Participation>, Self::Error>>
  + Send
  + '_;

  /// Enter an outfit into a challenge.
  ///
  /// At most one participation may exist per `(challenge, user)`; a second
  /// attempt fails with `AlreadyParticipating`. On success the joined entry
  /// view is returned with a zero tally.
  fn add_participation(
    &self,
    challenge_id: Uuid,
    user_id: Uuid,
    outfit_id: Uuid,
  ) -> impl Future<Output = Result<EntryView, Self::Error>> + Send + '_;

  /// All entries for a challenge: each participation joined with its outfit
  /// (garments ordered), the owner's display name, the vote tally, and the
  /// viewer's own vote when `viewer` is given.
  ///
  /// Participations whose outfit or owner row no longer exists are skipped
  /// with a logged warning; they never fail the read.
  fn challenge_entries(
    &self,
    challenge_id: Uuid,
    viewer: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<EntryView>, Self::Error>> + Send + '_;

  /// The current winning entry of a challenge, or `None` when it has no
  /// participations. Computed on demand from live tallies; nothing is
  /// persisted.
  fn winning_entry(
    &self,
    challenge_id: Uuid,
  ) -> impl Future<Output = Result<Option<EntryView>, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Record, replace, or retract a vote.
  ///
  /// Each voter holds at most one vote per target. Submitting the held
  /// direction again is a no-op; a different direction updates the row in
  /// place; `None` deletes it (and is a no-op when no row exists).
  fn submit_vote(
    &self,
    voter_id: Uuid,
    target: VoteTarget,
    direction: Option<VoteDirection>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The voter's current vote on a target, read from committed state.
  fn user_vote(
    &self,
    voter_id: Uuid,
    target: VoteTarget,
  ) -> impl Future<Output = Result<Option<VoteDirection>, Self::Error>>
  + Send
  + '_;

  /// Recount the votes for a target. A target nobody voted on tallies as
  /// zero up, zero down.
  fn vote_tally(
    &self,
    target: VoteTarget,
  ) -> impl Future<Output = Result<VoteTally, Self::Error>> + Send + '_;

  // ── Favorites ─────────────────────────────────────────────────────────

  /// Add a favorite. Idempotent: re-adding returns the existing record.
  fn add_favorite(
    &self,
    user_id: Uuid,
    target: FavoriteTarget,
  ) -> impl Future<Output = Result<Favorite, Self::Error>> + Send + '_;

  /// Remove a favorite. Idempotent: removing a missing favorite succeeds.
  fn remove_favorite(
    &self,
    user_id: Uuid,
    target: FavoriteTarget,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_favorites(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Favorite>, Self::Error>> + Send + '_;

  /// Resolve a favorite target to its current element, or `Dangling` when
  /// the element has been deleted.
  fn resolve_favorite(
    &self,
    target: FavoriteTarget,
  ) -> impl Future<Output = Result<ResolvedFavorite, Self::Error>> + Send + '_;

  // ── Change feed ───────────────────────────────────────────────────────

  /// Subscribe to committed-write notifications. A receiver that falls
  /// behind observes [`broadcast::error::RecvError::Lagged`] and should
  /// fall back to a full refresh.
  fn changes(&self) -> broadcast::Receiver<StoreEvent>;
}
