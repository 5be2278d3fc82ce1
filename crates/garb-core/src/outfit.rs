//! Garments and the outfits assembled from them.
//!
//! An outfit does not own garment data; it holds slot-tagged references in a
//! stable order. Garment rows can be deleted out from under an outfit, and
//! reads must stay usable when that happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Garments ────────────────────────────────────────────────────────────────

/// The body slot a garment occupies when worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySlot {
  Top,
  Bottom,
  Footwear,
  Other,
}

/// A single garment owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Garment {
  pub garment_id: Uuid,
  pub owner_id:   Uuid,
  pub name:       String,
  pub color:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::WardrobeStore::add_garment`].
#[derive(Debug, Clone)]
pub struct NewGarment {
  pub owner_id: Uuid,
  pub name:     String,
  pub color:    Option<String>,
}

// ─── Outfits ─────────────────────────────────────────────────────────────────

/// A slot-tagged reference to a garment within an outfit.
///
/// `position` is assigned by the store from the order the garments were
/// given and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarmentRef {
  pub garment_id: Uuid,
  pub slot:       BodySlot,
  pub position:   u32,
}

/// An outfit: an ordered list of garment references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outfit {
  pub outfit_id:   Uuid,
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: Option<String>,
  /// Always sorted by [`GarmentRef::position`] on read.
  pub garments:    Vec<GarmentRef>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::WardrobeStore::add_outfit`]. Positions are
/// assigned from the order of `garments`.
#[derive(Debug, Clone)]
pub struct NewOutfit {
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub garments:    Vec<(Uuid, BodySlot)>,
}
