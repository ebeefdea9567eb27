//! HTTP server assembly for FreeBible.
//!
//! Wires the JSON API from `freebible-api` under `/api/v1`, guards it with
//! HTTP Basic authentication against the user table, and carries the
//! bootstrap tasks the binary exposes: seeding default data and creating a
//! superuser.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod seed;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use freebible_core::store::BibleStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FREEBIBLE_*` environment variables. Every key is optional.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub store_path:    PathBuf,
  /// Create the default bible data on startup.
  pub seed_defaults: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          8000,
      store_path:    PathBuf::from("freebible.sqlite3"),
      seed_defaults: true,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the middleware.
#[derive(Clone)]
pub struct AppState<S: BibleStore> {
  pub store: Arc<S>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete axum [`Router`]: authenticated API plus request
/// tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BibleStore + Clone + 'static,
{
  let api = freebible_api::api_router(state.store.clone()).layer(
    middleware::from_fn_with_state(state, auth::require_caller::<S>),
  );

  Router::new()
    .nest("/api/v1", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
