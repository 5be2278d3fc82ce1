//! JSON REST API for garb.
//!
//! Exposes an axum [`Router`] backed by any
//! [`WardrobeStore`](garb_core::store::WardrobeStore), with per-user HTTP
//! Basic auth checked against the argon2 hashes the store holds. The
//! `garb-server` binary in this crate serves it over SQLite.

pub mod auth;
pub mod challenges;
pub mod error;
pub mod favorites;
pub mod profiles;
pub mod votes;
pub mod wardrobe;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use garb_core::store::WardrobeStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `GARB_*` environment. Every field has a default so a bare invocation
/// serves a local database.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 4000 }
fn default_store_path() -> PathBuf { PathBuf::from("garb.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: WardrobeStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the `/api` router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: WardrobeStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Profiles
    .route("/api/profiles", post(profiles::register::<S>))
    .route("/api/profiles/{id}", get(profiles::get_one::<S>))
    // Wardrobe
    .route("/api/garments", post(wardrobe::create_garment::<S>))
    .route(
      "/api/garments/{id}",
      get(wardrobe::get_garment::<S>).delete(wardrobe::delete_garment::<S>),
    )
    .route("/api/outfits", post(wardrobe::create_outfit::<S>))
    .route(
      "/api/outfits/{id}",
      get(wardrobe::get_outfit::<S>).delete(wardrobe::delete_outfit::<S>),
    )
    // Challenges
    .route(
      "/api/challenges",
      get(challenges::list::<S>).post(challenges::create::<S>),
    )
    .route("/api/challenges/{id}", get(challenges::get_one::<S>))
    .route(
      "/api/challenges/{id}/entries",
      get(challenges::entries::<S>).post(challenges::participate::<S>),
    )
    .route(
      "/api/challenges/{id}/participation",
      get(challenges::participation::<S>),
    )
    .route("/api/challenges/{id}/winner", get(challenges::winner::<S>))
    // Votes
    .route("/api/votes", get(votes::status::<S>).post(votes::cast::<S>))
    // Favorites
    .route(
      "/api/favorites",
      get(favorites::list::<S>)
        .post(favorites::add::<S>)
        .delete(favorites::remove::<S>),
    )
    .route("/api/favorites/resolved", get(favorites::list_resolved::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
