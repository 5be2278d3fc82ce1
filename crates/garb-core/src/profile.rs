//! Profiles — the people who submit outfits and vote on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:      Uuid,
  pub email:        String,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::WardrobeStore::add_profile`].
/// `user_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub email:         String,
  pub display_name:  String,
  /// Argon2 PHC string. `None` for accounts that cannot sign in
  /// (system accounts, fixtures).
  pub password_hash: Option<String>,
}

/// A credential row as read by the authentication layer. The hash never
/// travels on [`Profile`].
#[derive(Debug, Clone)]
pub struct StoredCredentials {
  pub user_id:       Uuid,
  pub password_hash: String,
}

/// The authenticated identity a session or request acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
  pub user_id: Uuid,
  pub email:   String,
}
