//! Favorites — weak references a user pins to garments, outfits, or other
//! users.
//!
//! Deleting the element a favorite points at never deletes the favorite.
//! Reads resolve the target explicitly, so consumers handle the dangling
//! case as a value rather than inferring it from a payload shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  outfit::{Garment, Outfit},
  profile::Profile,
};

/// The kind of element a favorite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
  Garment,
  Outfit,
  User,
}

/// What a favorite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteTarget {
  pub kind: FavoriteKind,
  pub id:   Uuid,
}

impl FavoriteTarget {
  pub fn garment(id: Uuid) -> Self {
    Self { kind: FavoriteKind::Garment, id }
  }

  pub fn outfit(id: Uuid) -> Self {
    Self { kind: FavoriteKind::Outfit, id }
  }

  pub fn user(id: Uuid) -> Self {
    Self { kind: FavoriteKind::User, id }
  }
}

/// A persisted favorite. At most one exists per `(user_id, target)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
  pub favorite_id: Uuid,
  pub user_id:     Uuid,
  pub target:      FavoriteTarget,
  pub created_at:  DateTime<Utc>,
}

/// The element a resolved favorite points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum FavoriteDetails {
  Garment(Garment),
  Outfit(Outfit),
  User(Profile),
}

/// Outcome of resolving a favorite's target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum ResolvedFavorite {
  Resolved(FavoriteDetails),
  Dangling,
}

impl ResolvedFavorite {
  pub fn is_dangling(&self) -> bool { matches!(self, Self::Dangling) }
}
