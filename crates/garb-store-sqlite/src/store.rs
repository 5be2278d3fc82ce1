//! [`SqliteStore`] — the SQLite implementation of [`WardrobeStore`].

use std::path::Path;

use chrono::Utc;
use garb_core::{
  challenge::{Challenge, NewChallenge},
  favorite::{
    Favorite, FavoriteDetails, FavoriteKind, FavoriteTarget, ResolvedFavorite,
  },
  outfit::{Garment, GarmentRef, NewGarment, NewOutfit, Outfit},
  participation::{EntryView, Participation},
  profile::{NewProfile, Profile, StoredCredentials},
  ranking,
  store::{StoreEvent, WardrobeStore},
  vote::{VoteDirection, VoteTally, VoteTarget},
};
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawChallenge, RawEntryRow, RawFavorite, RawGarment, RawGarmentRef,
    RawOutfit, RawParticipation, RawProfile, decode_count, decode_direction,
    decode_uuid, encode_direction, encode_dt, encode_favorite_kind,
    encode_slot, encode_uuid,
  },
  schema::SCHEMA,
};

/// Broadcast capacity for the change feed. A receiver that falls more than
/// this many events behind observes `Lagged` and must refresh.
const EVENT_CAPACITY: usize = 1024;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A garb store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and clones
/// share one change feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  events: broadcast::Sender<StoreEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_conn(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_conn(conn).await
  }

  async fn with_conn(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let store = Self { conn, events };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Emit a change-feed event. A send error only means there are currently
  /// no subscribers.
  fn publish(&self, event: StoreEvent) { let _ = self.events.send(event); }
}

/// Whether `err` is a constraint violation. Pre-checks produce the typed
/// duplicate errors on the common path; this maps the raced insert.
fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

/// Garment refs for an outfit, in position order.
fn garment_refs(
  conn: &rusqlite::Connection,
  outfit_id: &str,
) -> rusqlite::Result<Vec<RawGarmentRef>> {
  let mut stmt = conn.prepare(
    "SELECT garment_id, slot, position FROM outfit_garments
     WHERE outfit_id = ?1 ORDER BY position",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![outfit_id], |row| {
      Ok(RawGarmentRef {
        garment_id: row.get(0)?,
        slot:       row.get(1)?,
        position:   row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── WardrobeStore impl ──────────────────────────────────────────────────────

impl WardrobeStore for SqliteStore {
  type Error = crate::Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn add_profile(&self, input: NewProfile) -> Result<Profile> {
    if self.get_profile_by_email(&input.email).await?.is_some() {
      return Err(garb_core::Error::EmailTaken(input.email).into());
    }

    let profile = Profile {
      user_id:      Uuid::new_v4(),
      email:        input.email,
      display_name: input.display_name,
      created_at:   Utc::now(),
    };

    let id_str  = encode_uuid(profile.user_id);
    let email   = profile.email.clone();
    let display = profile.display_name.clone();
    let hash    = input.password_hash;
    let at_str  = encode_dt(profile.created_at);

    let insert = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles
             (user_id, email, display_name, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, display, hash, at_str],
        )?;
        Ok(())
      })
      .await;

    match insert {
      Ok(()) => Ok(profile),
      Err(e) if is_unique_violation(&e) => {
        Err(garb_core::Error::EmailTaken(profile.email).into())
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, display_name, created_at
               FROM profiles WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawProfile {
                  user_id:      row.get(0)?,
                  email:        row.get(1)?,
                  display_name: row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    let email = email.to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, display_name, created_at
               FROM profiles WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawProfile {
                  user_id:      row.get(0)?,
                  email:        row.get(1)?,
                  display_name: row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn credentials(
    &self,
    email: &str,
  ) -> Result<Option<StoredCredentials>> {
    let email = email.to_owned();

    let row: Option<(String, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, password_hash FROM profiles WHERE email = ?1",
              rusqlite::params![email],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    match row {
      Some((id_str, Some(hash))) => Ok(Some(StoredCredentials {
        user_id:       decode_uuid(&id_str)?,
        password_hash: hash,
      })),
      _ => Ok(None),
    }
  }

  // ── Garments ──────────────────────────────────────────────────────────────

  async fn add_garment(&self, input: NewGarment) -> Result<Garment> {
    let garment = Garment {
      garment_id: Uuid::new_v4(),
      owner_id:   input.owner_id,
      name:       input.name,
      color:      input.color,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(garment.garment_id);
    let owner_str = encode_uuid(garment.owner_id);
    let name      = garment.name.clone();
    let color     = garment.color.clone();
    let at_str    = encode_dt(garment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO garments (garment_id, owner_id, name, color, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, owner_str, name, color, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(garment)
  }

  async fn get_garment(&self, garment_id: Uuid) -> Result<Option<Garment>> {
    let id_str = encode_uuid(garment_id);

    let raw: Option<RawGarment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT garment_id, owner_id, name, color, created_at
               FROM garments WHERE garment_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawGarment {
                  garment_id: row.get(0)?,
                  owner_id:   row.get(1)?,
                  name:       row.get(2)?,
                  color:      row.get(3)?,
                  created_at: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGarment::into_garment).transpose()
  }

  async fn remove_garment(&self, garment_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(garment_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM garments WHERE garment_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Outfits ───────────────────────────────────────────────────────────────

  async fn add_outfit(&self, input: NewOutfit) -> Result<Outfit> {
    let outfit = Outfit {
      outfit_id:   Uuid::new_v4(),
      owner_id:    input.owner_id,
      name:        input.name,
      description: input.description,
      garments:    input
        .garments
        .iter()
        .enumerate()
        .map(|(i, (garment_id, slot))| GarmentRef {
          garment_id: *garment_id,
          slot:       *slot,
          position:   i as u32,
        })
        .collect(),
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(outfit.outfit_id);
    let owner_str   = encode_uuid(outfit.owner_id);
    let name        = outfit.name.clone();
    let description = outfit.description.clone();
    let at_str      = encode_dt(outfit.created_at);
    let refs: Vec<(String, String, i64)> = outfit
      .garments
      .iter()
      .map(|r| {
        (
          encode_uuid(r.garment_id),
          encode_slot(r.slot).to_owned(),
          i64::from(r.position),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO outfits (outfit_id, owner_id, name, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, owner_str, name, description, at_str],
        )?;
        for (garment_str, slot_str, position) in &refs {
          conn.execute(
            "INSERT INTO outfit_garments (outfit_id, garment_id, slot, position)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, garment_str, slot_str, position],
          )?;
        }
        Ok(())
      })
      .await?;

    Ok(outfit)
  }

  async fn get_outfit(&self, outfit_id: Uuid) -> Result<Option<Outfit>> {
    let id_str = encode_uuid(outfit_id);

    let raw: Option<(RawOutfit, Vec<RawGarmentRef>)> = self
      .conn
      .call(move |conn| {
        let outfit = conn
          .query_row(
            "SELECT outfit_id, owner_id, name, description, created_at
             FROM outfits WHERE outfit_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawOutfit {
                outfit_id:   row.get(0)?,
                owner_id:    row.get(1)?,
                name:        row.get(2)?,
                description: row.get(3)?,
                created_at:  row.get(4)?,
              })
            },
          )
          .optional()?;

        let Some(outfit) = outfit else { return Ok(None) };

        let refs = garment_refs(conn, &id_str)?;
        Ok(Some((outfit, refs)))
      })
      .await?;

    raw.map(|(outfit, refs)| outfit.into_outfit(refs)).transpose()
  }

  async fn remove_outfit(&self, outfit_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(outfit_id);

    self
      .conn
      .call(move |conn| {
        // outfit_garments rows go with it via ON DELETE CASCADE.
        conn.execute(
          "DELETE FROM outfits WHERE outfit_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Challenges ────────────────────────────────────────────────────────────

  async fn add_challenge(&self, input: NewChallenge) -> Result<Challenge> {
    let challenge = Challenge {
      challenge_id: Uuid::new_v4(),
      title:        input.title,
      description:  input.description,
      starts_at:    input.starts_at,
      ends_at:      input.ends_at,
      created_by:   input.created_by,
      created_at:   Utc::now(),
    };

    let id_str     = encode_uuid(challenge.challenge_id);
    let title      = challenge.title.clone();
    let desc       = challenge.description.clone();
    let starts_str = encode_dt(challenge.starts_at);
    let ends_str   = encode_dt(challenge.ends_at);
    let by_str     = challenge.created_by.map(encode_uuid);
    let at_str     = encode_dt(challenge.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO challenges
             (challenge_id, title, description, starts_at, ends_at, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, title, desc, starts_str, ends_str, by_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(challenge)
  }

  async fn get_challenge(
    &self,
    challenge_id: Uuid,
  ) -> Result<Option<Challenge>> {
    let id_str = encode_uuid(challenge_id);

    let raw: Option<RawChallenge> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT challenge_id, title, description, starts_at, ends_at,
                      created_by, created_at
               FROM challenges WHERE challenge_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawChallenge {
                  challenge_id: row.get(0)?,
                  title:        row.get(1)?,
                  description:  row.get(2)?,
                  starts_at:    row.get(3)?,
                  ends_at:      row.get(4)?,
                  created_by:   row.get(5)?,
                  created_at:   row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawChallenge::into_challenge).transpose()
  }

  async fn list_challenges(&self) -> Result<Vec<Challenge>> {
    let raws: Vec<RawChallenge> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT challenge_id, title, description, starts_at, ends_at,
                  created_by, created_at
           FROM challenges ORDER BY starts_at DESC, challenge_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawChallenge {
              challenge_id: row.get(0)?,
              title:        row.get(1)?,
              description:  row.get(2)?,
              starts_at:    row.get(3)?,
              ends_at:      row.get(4)?,
              created_by:   row.get(5)?,
              created_at:   row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChallenge::into_challenge).collect()
  }

  // ── Participations ────────────────────────────────────────────────────────

  async fn participation_for_user(
    &self,
    challenge_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Participation>> {
    let challenge_str = encode_uuid(challenge_id);
    let user_str      = encode_uuid(user_id);

    let raw: Option<RawParticipation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT participation_id, challenge_id, user_id, outfit_id,
                      created_at
               FROM participations
               WHERE challenge_id = ?1 AND user_id = ?2",
              rusqlite::params![challenge_str, user_str],
              |row| {
                Ok(RawParticipation {
                  participation_id: row.get(0)?,
                  challenge_id:     row.get(1)?,
                  user_id:          row.get(2)?,
                  outfit_id:        row.get(3)?,
                  created_at:       row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipation::into_participation).transpose()
  }

  async fn add_participation(
    &self,
    challenge_id: Uuid,
    user_id: Uuid,
    outfit_id: Uuid,
  ) -> Result<EntryView> {
    if self.get_challenge(challenge_id).await?.is_none() {
      return Err(garb_core::Error::ChallengeNotFound(challenge_id).into());
    }
    let outfit = self
      .get_outfit(outfit_id)
      .await?
      .ok_or(garb_core::Error::OutfitNotFound(outfit_id))?;
    let owner = self
      .get_profile(user_id)
      .await?
      .ok_or(garb_core::Error::ProfileNotFound(user_id))?;
    if self
      .participation_for_user(challenge_id, user_id)
      .await?
      .is_some()
    {
      return Err(
        garb_core::Error::AlreadyParticipating { challenge_id, user_id }
          .into(),
      );
    }

    let participation = Participation {
      participation_id: Uuid::new_v4(),
      challenge_id,
      user_id,
      outfit_id,
      created_at: Utc::now(),
    };

    let id_str        = encode_uuid(participation.participation_id);
    let challenge_str = encode_uuid(challenge_id);
    let user_str      = encode_uuid(user_id);
    let outfit_str    = encode_uuid(outfit_id);
    let at_str        = encode_dt(participation.created_at);

    let insert = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO participations
             (participation_id, challenge_id, user_id, outfit_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            id_str, challenge_str, user_str, outfit_str, at_str
          ],
        )?;
        Ok(())
      })
      .await;

    match insert {
      Ok(()) => {}
      Err(e) if is_unique_violation(&e) => {
        return Err(
          garb_core::Error::AlreadyParticipating { challenge_id, user_id }
            .into(),
        );
      }
      Err(e) => return Err(e.into()),
    }

    self.publish(StoreEvent::ParticipationAdded { challenge_id });

    Ok(EntryView {
      participation,
      outfit,
      owner: owner.display_name,
      tally: VoteTally::default(),
      viewer_vote: None,
    })
  }

  async fn challenge_entries(
    &self,
    challenge_id: Uuid,
    viewer: Option<Uuid>,
  ) -> Result<Vec<EntryView>> {
    let challenge_str = encode_uuid(challenge_id);
    let viewer_str    = viewer.map(encode_uuid);

    let raws: Vec<(RawEntryRow, Vec<RawGarmentRef>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             p.participation_id, p.challenge_id, p.user_id, p.outfit_id,
             p.created_at,
             o.owner_id, o.name, o.description, o.created_at,
             pr.display_name,
             (SELECT COUNT(*) FROM votes v
               WHERE v.outfit_id = p.outfit_id
                 AND v.challenge_id = p.challenge_id
                 AND v.direction = 'up'),
             (SELECT COUNT(*) FROM votes v
               WHERE v.outfit_id = p.outfit_id
                 AND v.challenge_id = p.challenge_id
                 AND v.direction = 'down'),
             (SELECT v.direction FROM votes v
               WHERE v.outfit_id = p.outfit_id
                 AND v.challenge_id = p.challenge_id
                 AND v.voter_id = ?2)
           FROM participations p
           LEFT JOIN outfits  o  ON o.outfit_id = p.outfit_id
           LEFT JOIN profiles pr ON pr.user_id  = p.user_id
           WHERE p.challenge_id = ?1
           ORDER BY p.created_at, p.participation_id",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![challenge_str, viewer_str], |row| {
            Ok(RawEntryRow {
              participation_id:   row.get(0)?,
              challenge_id:       row.get(1)?,
              user_id:            row.get(2)?,
              outfit_id:          row.get(3)?,
              created_at:         row.get(4)?,
              outfit_owner_id:    row.get(5)?,
              outfit_name:        row.get(6)?,
              outfit_description: row.get(7)?,
              outfit_created_at:  row.get(8)?,
              owner_display:      row.get(9)?,
              up_count:           row.get(10)?,
              down_count:         row.get(11)?,
              viewer_vote:        row.get(12)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
          let refs = if row.outfit_name.is_some() {
            garment_refs(conn, &row.outfit_id)?
          } else {
            Vec::new()
          };
          out.push((row, refs));
        }
        Ok(out)
      })
      .await?;

    let mut entries = Vec::with_capacity(raws.len());
    for (raw, refs) in raws {
      let participation_id = raw.participation_id.clone();
      let outfit_id        = raw.outfit_id.clone();
      match raw.into_entry(refs)? {
        Some(entry) => entries.push(entry),
        None => {
          tracing::warn!(
            %participation_id,
            %outfit_id,
            "skipping entry whose outfit or owner no longer exists"
          );
        }
      }
    }

    Ok(entries)
  }

  async fn winning_entry(
    &self,
    challenge_id: Uuid,
  ) -> Result<Option<EntryView>> {
    let entries = self.challenge_entries(challenge_id, None).await?;
    Ok(ranking::winner(&entries).cloned())
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn submit_vote(
    &self,
    voter_id: Uuid,
    target: VoteTarget,
    direction: Option<VoteDirection>,
  ) -> Result<()> {
    let voter_str     = encode_uuid(voter_id);
    let outfit_str    = encode_uuid(target.outfit_id);
    let challenge_str = target.challenge_id.map(encode_uuid);
    let new_dir       = direction.map(|d| encode_direction(d).to_owned());
    let vote_id_str   = encode_uuid(Uuid::new_v4());
    let now_str       = encode_dt(Utc::now());

    // Decide and write inside one connection call; calls are serialised on
    // the connection thread, so the read and the write cannot interleave
    // with another submission for the same target.
    let changed: bool = self
      .conn
      .call(move |conn| {
        let existing: Option<(String, String)> = conn
          .query_row(
            "SELECT vote_id, direction FROM votes
             WHERE voter_id = ?1 AND outfit_id = ?2 AND challenge_id IS ?3",
            rusqlite::params![voter_str, outfit_str, challenge_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        let changed = match (existing, new_dir) {
          (None, None) => false,
          (None, Some(dir)) => {
            conn.execute(
              "INSERT INTO votes
                 (vote_id, voter_id, outfit_id, challenge_id, direction, cast_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
              rusqlite::params![
                vote_id_str,
                voter_str,
                outfit_str,
                challenge_str,
                dir,
                now_str
              ],
            )?;
            true
          }
          (Some((vote_id, _)), None) => {
            conn.execute(
              "DELETE FROM votes WHERE vote_id = ?1",
              rusqlite::params![vote_id],
            )?;
            true
          }
          (Some((_, held)), Some(dir)) if held == dir => false,
          (Some((vote_id, _)), Some(dir)) => {
            conn.execute(
              "UPDATE votes SET direction = ?2, cast_at = ?3
               WHERE vote_id = ?1",
              rusqlite::params![vote_id, dir, now_str],
            )?;
            true
          }
        };

        Ok(changed)
      })
      .await?;

    if changed {
      self.publish(StoreEvent::VoteChanged { target });
    }
    Ok(())
  }

  async fn user_vote(
    &self,
    voter_id: Uuid,
    target: VoteTarget,
  ) -> Result<Option<VoteDirection>> {
    let voter_str     = encode_uuid(voter_id);
    let outfit_str    = encode_uuid(target.outfit_id);
    let challenge_str = target.challenge_id.map(encode_uuid);

    let dir: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT direction FROM votes
               WHERE voter_id = ?1 AND outfit_id = ?2 AND challenge_id IS ?3",
              rusqlite::params![voter_str, outfit_str, challenge_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    dir.as_deref().map(decode_direction).transpose()
  }

  async fn vote_tally(&self, target: VoteTarget) -> Result<VoteTally> {
    let outfit_str    = encode_uuid(target.outfit_id);
    let challenge_str = target.challenge_id.map(encode_uuid);

    let (up, down): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             COUNT(*) FILTER (WHERE direction = 'up'),
             COUNT(*) FILTER (WHERE direction = 'down')
           FROM votes WHERE outfit_id = ?1 AND challenge_id IS ?2",
          rusqlite::params![outfit_str, challenge_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(VoteTally { up: decode_count(up)?, down: decode_count(down)? })
  }

  // ── Favorites ─────────────────────────────────────────────────────────────

  async fn add_favorite(
    &self,
    user_id: Uuid,
    target: FavoriteTarget,
  ) -> Result<Favorite> {
    let user_str    = encode_uuid(user_id);
    let kind_str    = encode_favorite_kind(target.kind).to_owned();
    let element_str = encode_uuid(target.id);
    let new_id_str  = encode_uuid(Uuid::new_v4());
    let now_str     = encode_dt(Utc::now());

    let (raw, created): (RawFavorite, bool) = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT favorite_id, user_id, kind, element_id, created_at
             FROM favorites
             WHERE user_id = ?1 AND kind = ?2 AND element_id = ?3",
            rusqlite::params![user_str, kind_str, element_str],
            |row| {
              Ok(RawFavorite {
                favorite_id: row.get(0)?,
                user_id:     row.get(1)?,
                kind:        row.get(2)?,
                element_id:  row.get(3)?,
                created_at:  row.get(4)?,
              })
            },
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok((raw, false));
        }

        conn.execute(
          "INSERT INTO favorites
             (favorite_id, user_id, kind, element_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            new_id_str, user_str, kind_str, element_str, now_str
          ],
        )?;

        Ok((
          RawFavorite {
            favorite_id: new_id_str,
            user_id:     user_str,
            kind:        kind_str,
            element_id:  element_str,
            created_at:  now_str,
          },
          true,
        ))
      })
      .await?;

    if created {
      self.publish(StoreEvent::FavoriteChanged { user_id });
    }
    raw.into_favorite()
  }

  async fn remove_favorite(
    &self,
    user_id: Uuid,
    target: FavoriteTarget,
  ) -> Result<()> {
    let user_str    = encode_uuid(user_id);
    let kind_str    = encode_favorite_kind(target.kind).to_owned();
    let element_str = encode_uuid(target.id);

    let removed: bool = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM favorites
           WHERE user_id = ?1 AND kind = ?2 AND element_id = ?3",
          rusqlite::params![user_str, kind_str, element_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    if removed {
      self.publish(StoreEvent::FavoriteChanged { user_id });
    }
    Ok(())
  }

  async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawFavorite> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT favorite_id, user_id, kind, element_id, created_at
           FROM favorites WHERE user_id = ?1
           ORDER BY created_at DESC, favorite_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawFavorite {
              favorite_id: row.get(0)?,
              user_id:     row.get(1)?,
              kind:        row.get(2)?,
              element_id:  row.get(3)?,
              created_at:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFavorite::into_favorite).collect()
  }

  async fn resolve_favorite(
    &self,
    target: FavoriteTarget,
  ) -> Result<ResolvedFavorite> {
    let details = match target.kind {
      FavoriteKind::Garment => {
        self.get_garment(target.id).await?.map(FavoriteDetails::Garment)
      }
      FavoriteKind::Outfit => {
        self.get_outfit(target.id).await?.map(FavoriteDetails::Outfit)
      }
      FavoriteKind::User => {
        self.get_profile(target.id).await?.map(FavoriteDetails::User)
      }
    };

    Ok(match details {
      Some(d) => ResolvedFavorite::Resolved(d),
      None => ResolvedFavorite::Dangling,
    })
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  fn changes(&self) -> broadcast::Receiver<StoreEvent> {
    self.events.subscribe()
  }
}
