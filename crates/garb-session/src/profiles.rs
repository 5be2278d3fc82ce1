//! Bounded cache of resolved profiles.
//!
//! Favorites and entry rendering look up the same handful of users over and
//! over. The cache is constructed with an explicit capacity and passed to
//! the components that need it; there is no module-level state.

use garb_core::{profile::Profile, store::WardrobeStore};
use uuid::Uuid;

use crate::{Error, Result};

/// A bounded profile cache keyed by user id.
#[derive(Clone)]
pub struct ProfileCache {
  inner: moka::sync::Cache<Uuid, Profile>,
}

impl ProfileCache {
  /// Create a cache holding at most `capacity` profiles.
  pub fn new(capacity: u64) -> Self {
    Self { inner: moka::sync::Cache::new(capacity) }
  }

  /// Look up a profile, hitting the store only on a cache miss.
  ///
  /// `None` means the user genuinely does not exist; misses are not cached,
  /// so a user created later becomes visible on the next call.
  pub async fn get<S: WardrobeStore>(
    &self,
    store: &S,
    user_id: Uuid,
  ) -> Result<Option<Profile>> {
    if let Some(hit) = self.inner.get(&user_id) {
      return Ok(Some(hit));
    }
    match store.get_profile(user_id).await.map_err(Error::storage)? {
      Some(profile) => {
        self.inner.insert(user_id, profile.clone());
        Ok(Some(profile))
      }
      None => Ok(None),
    }
  }

  /// Drop a cached profile, e.g. after it was edited.
  pub fn invalidate(&self, user_id: Uuid) { self.inner.invalidate(&user_id); }
}
