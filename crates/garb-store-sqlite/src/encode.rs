//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, and enums as their lowercase tags. Decoding is the one
//! place raw rows become domain values; anything unexpected fails here with
//! [`Error::Malformed`] instead of leaking half-decoded rows upward.

use chrono::{DateTime, Utc};
use garb_core::{
  challenge::Challenge,
  favorite::{Favorite, FavoriteKind, FavoriteTarget},
  outfit::{BodySlot, Garment, GarmentRef, Outfit},
  participation::{EntryView, Participation},
  profile::Profile,
  vote::{VoteDirection, VoteTally},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalar codecs ───────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|_| Error::Malformed { what: "timestamp", value: s.to_owned() })
}

pub fn encode_slot(slot: BodySlot) -> &'static str {
  match slot {
    BodySlot::Top => "top",
    BodySlot::Bottom => "bottom",
    BodySlot::Footwear => "footwear",
    BodySlot::Other => "other",
  }
}

pub fn decode_slot(s: &str) -> Result<BodySlot> {
  match s {
    "top" => Ok(BodySlot::Top),
    "bottom" => Ok(BodySlot::Bottom),
    "footwear" => Ok(BodySlot::Footwear),
    "other" => Ok(BodySlot::Other),
    other => {
      Err(Error::Malformed { what: "body slot", value: other.to_owned() })
    }
  }
}

pub fn encode_direction(d: VoteDirection) -> &'static str {
  match d {
    VoteDirection::Up => "up",
    VoteDirection::Down => "down",
  }
}

pub fn decode_direction(s: &str) -> Result<VoteDirection> {
  match s {
    "up" => Ok(VoteDirection::Up),
    "down" => Ok(VoteDirection::Down),
    other => {
      Err(Error::Malformed { what: "vote direction", value: other.to_owned() })
    }
  }
}

pub fn encode_favorite_kind(k: FavoriteKind) -> &'static str {
  match k {
    FavoriteKind::Garment => "garment",
    FavoriteKind::Outfit => "outfit",
    FavoriteKind::User => "user",
  }
}

pub fn decode_favorite_kind(s: &str) -> Result<FavoriteKind> {
  match s {
    "garment" => Ok(FavoriteKind::Garment),
    "outfit" => Ok(FavoriteKind::Outfit),
    "user" => Ok(FavoriteKind::User),
    other => {
      Err(Error::Malformed { what: "favorite kind", value: other.to_owned() })
    }
  }
}

pub fn decode_count(n: i64) -> Result<u32> {
  u32::try_from(n)
    .map_err(|_| Error::Malformed { what: "vote count", value: n.to_string() })
}

pub fn decode_position(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Malformed {
    what:  "garment position",
    value: n.to_string(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub user_id:      String,
  pub email:        String,
  pub display_name: String,
  pub created_at:   String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id:      decode_uuid(&self.user_id)?,
      email:        self.email,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `garments` row.
pub struct RawGarment {
  pub garment_id: String,
  pub owner_id:   String,
  pub name:       String,
  pub color:      Option<String>,
  pub created_at: String,
}

impl RawGarment {
  pub fn into_garment(self) -> Result<Garment> {
    Ok(Garment {
      garment_id: decode_uuid(&self.garment_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      name:       self.name,
      color:      self.color,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from an `outfit_garments` row, kept in query order.
pub struct RawGarmentRef {
  pub garment_id: String,
  pub slot:       String,
  pub position:   i64,
}

impl RawGarmentRef {
  pub fn into_garment_ref(self) -> Result<GarmentRef> {
    Ok(GarmentRef {
      garment_id: decode_uuid(&self.garment_id)?,
      slot:       decode_slot(&self.slot)?,
      position:   decode_position(self.position)?,
    })
  }
}

/// Raw strings read from an `outfits` row; garment refs are queried
/// separately and attached at decode time.
pub struct RawOutfit {
  pub outfit_id:   String,
  pub owner_id:    String,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawOutfit {
  pub fn into_outfit(self, garments: Vec<RawGarmentRef>) -> Result<Outfit> {
    Ok(Outfit {
      outfit_id:   decode_uuid(&self.outfit_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      name:        self.name,
      description: self.description,
      garments:    garments
        .into_iter()
        .map(RawGarmentRef::into_garment_ref)
        .collect::<Result<_>>()?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `challenges` row.
pub struct RawChallenge {
  pub challenge_id: String,
  pub title:        String,
  pub description:  String,
  pub starts_at:    String,
  pub ends_at:      String,
  pub created_by:   Option<String>,
  pub created_at:   String,
}

impl RawChallenge {
  pub fn into_challenge(self) -> Result<Challenge> {
    Ok(Challenge {
      challenge_id: decode_uuid(&self.challenge_id)?,
      title:        self.title,
      description:  self.description,
      starts_at:    decode_dt(&self.starts_at)?,
      ends_at:      decode_dt(&self.ends_at)?,
      created_by:   self.created_by.as_deref().map(decode_uuid).transpose()?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `participations` row.
pub struct RawParticipation {
  pub participation_id: String,
  pub challenge_id:     String,
  pub user_id:          String,
  pub outfit_id:        String,
  pub created_at:       String,
}

impl RawParticipation {
  pub fn into_participation(self) -> Result<Participation> {
    Ok(Participation {
      participation_id: decode_uuid(&self.participation_id)?,
      challenge_id:     decode_uuid(&self.challenge_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      outfit_id:        decode_uuid(&self.outfit_id)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `favorites` row.
pub struct RawFavorite {
  pub favorite_id: String,
  pub user_id:     String,
  pub kind:        String,
  pub element_id:  String,
  pub created_at:  String,
}

impl RawFavorite {
  pub fn into_favorite(self) -> Result<Favorite> {
    Ok(Favorite {
      favorite_id: decode_uuid(&self.favorite_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      target:      FavoriteTarget {
        kind: decode_favorite_kind(&self.kind)?,
        id:   decode_uuid(&self.element_id)?,
      },
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// One row of the participation join: participation columns, the outfit and
/// owner-profile joins (absent when those rows are gone), and the vote
/// aggregates.
pub struct RawEntryRow {
  pub participation_id:   String,
  pub challenge_id:       String,
  pub user_id:            String,
  pub outfit_id:          String,
  pub created_at:         String,
  // outfits join
  pub outfit_owner_id:    Option<String>,
  pub outfit_name:        Option<String>,
  pub outfit_description: Option<String>,
  pub outfit_created_at:  Option<String>,
  // profiles join
  pub owner_display:      Option<String>,
  // vote aggregates
  pub up_count:           i64,
  pub down_count:         i64,
  pub viewer_vote:        Option<String>,
}

impl RawEntryRow {
  /// Decode into an [`EntryView`], or `None` when the outfit or owner row
  /// behind this participation no longer exists. The caller decides how to
  /// report the gap; this layer only detects it.
  pub fn into_entry(
    self,
    garments: Vec<RawGarmentRef>,
  ) -> Result<Option<EntryView>> {
    let participation = RawParticipation {
      participation_id: self.participation_id,
      challenge_id:     self.challenge_id,
      user_id:          self.user_id,
      outfit_id:        self.outfit_id.clone(),
      created_at:       self.created_at,
    }
    .into_participation()?;

    let (Some(owner_id), Some(name), Some(outfit_created), Some(owner)) = (
      self.outfit_owner_id,
      self.outfit_name,
      self.outfit_created_at,
      self.owner_display,
    ) else {
      return Ok(None);
    };

    let outfit = RawOutfit {
      outfit_id: self.outfit_id,
      owner_id,
      name,
      description: self.outfit_description,
      created_at: outfit_created,
    }
    .into_outfit(garments)?;

    let tally = VoteTally {
      up:   decode_count(self.up_count)?,
      down: decode_count(self.down_count)?,
    };

    let viewer_vote =
      self.viewer_vote.as_deref().map(decode_direction).transpose()?;

    Ok(Some(EntryView { participation, outfit, owner, tally, viewer_vote }))
  }
}
