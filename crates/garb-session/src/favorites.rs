//! The viewer's favorites with the same optimistic discipline as votes.

use std::{collections::HashSet, sync::Arc};

use garb_core::{
  favorite::{FavoriteDetails, FavoriteKind, FavoriteTarget, ResolvedFavorite},
  profile::CurrentUser,
  store::WardrobeStore,
};

use crate::{
  Error, Result, connectivity::ConnectivityMonitor, profiles::ProfileCache,
};

/// Membership view of the viewer's favorites.
///
/// Toggles flip local membership before the store call and restore it if
/// the call fails. Offline and in-flight refusals happen before any local
/// mutation, exactly as in the vote coordinator.
pub struct FavoriteSet<S> {
  store:        Arc<S>,
  connectivity: ConnectivityMonitor,
  viewer:       Option<CurrentUser>,
  profiles:     ProfileCache,
  members:      HashSet<FavoriteTarget>,
  in_flight:    HashSet<FavoriteTarget>,
}

impl<S: WardrobeStore> FavoriteSet<S> {
  pub fn new(
    store: Arc<S>,
    connectivity: ConnectivityMonitor,
    viewer: Option<CurrentUser>,
    profiles: ProfileCache,
  ) -> Self {
    Self {
      store,
      connectivity,
      viewer,
      profiles,
      members: HashSet::new(),
      in_flight: HashSet::new(),
    }
  }

  /// Replace local membership with the store's committed favorites.
  pub async fn load(&mut self) -> Result<()> {
    let Some(viewer) = self.viewer.as_ref() else {
      return Err(Error::AuthRequired);
    };
    let favorites = self
      .store
      .list_favorites(viewer.user_id)
      .await
      .map_err(Error::storage)?;
    self.members = favorites.into_iter().map(|f| f.target).collect();
    self.in_flight.clear();
    Ok(())
  }

  /// Whether `target` is favorited, as this client believes it to be.
  pub fn contains(&self, target: FavoriteTarget) -> bool {
    self.members.contains(&target)
  }

  pub fn len(&self) -> usize { self.members.len() }

  pub fn is_empty(&self) -> bool { self.members.is_empty() }

  /// Flip `target` in or out of the set. Returns the new membership.
  pub async fn toggle(&mut self, target: FavoriteTarget) -> Result<bool> {
    let Some(viewer) = self.viewer.as_ref() else {
      return Err(Error::AuthRequired);
    };
    let user_id = viewer.user_id;

    if !self.connectivity.is_online() {
      return Err(Error::Offline);
    }
    if self.in_flight.contains(&target) {
      return Err(Error::SubmissionInProgress);
    }

    // Optimistic flip first; the store call settles it.
    let adding = !self.members.contains(&target);
    if adding {
      self.members.insert(target);
    } else {
      self.members.remove(&target);
    }

    self.in_flight.insert(target);
    let outcome = if adding {
      self.store.add_favorite(user_id, target).await.map(|_| ())
    } else {
      self.store.remove_favorite(user_id, target).await
    };
    self.in_flight.remove(&target);

    match outcome {
      Ok(()) => Ok(adding),
      Err(e) => {
        // Restore the previous membership.
        if adding {
          self.members.remove(&target);
        } else {
          self.members.insert(target);
        }
        Err(Error::storage(e))
      }
    }
  }

  /// Resolve what a favorite points at, going through the profile cache
  /// for user targets. Deleted elements come back as `Dangling`.
  pub async fn resolve(
    &self,
    target: FavoriteTarget,
  ) -> Result<ResolvedFavorite> {
    if target.kind == FavoriteKind::User {
      let resolved =
        match self.profiles.get(self.store.as_ref(), target.id).await? {
          Some(profile) => {
            ResolvedFavorite::Resolved(FavoriteDetails::User(profile))
          }
          None => ResolvedFavorite::Dangling,
        };
      return Ok(resolved);
    }
    self
      .store
      .resolve_favorite(target)
      .await
      .map_err(Error::storage)
  }
}
