//! HTTP server for Taller: bearer-token auth, role guards, the privileged
//! user-management functions and the super-admin console.
//!
//! The per-workshop console API lives in `taller-api`; this crate mounts it
//! under `/api` behind the studio guard.

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod error;
pub mod functions;
pub mod guard;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use serde::Deserialize;
use taller_core::store::{DirectoryStore, Tenancy};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TALLER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// Lifetime of issued bearer tokens.
  pub token_ttl_hours: i64,
  /// Value of `Access-Control-Allow-Origin` on function responses.
  pub cors_origin:     String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "127.0.0.1".to_string(),
      port:            8080,
      store_path:      PathBuf::from("taller.db"),
      token_ttl_hours: 24,
      cors_origin:     "*".to_string(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Storage the server needs: the directory tables plus per-workshop studio
/// stores.
pub trait Backend: DirectoryStore + Tenancy + Clone {}

impl<T: DirectoryStore + Tenancy + Clone> Backend for T {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete server router.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  let api = taller_api::api_router(state.store.clone()).layer(
    middleware::from_fn_with_state(state.clone(), guard::require_studio::<S>),
  );
  let admin = admin::router(state.clone()).layer(middleware::from_fn_with_state(
    state.clone(),
    guard::require_super_admin::<S>,
  ));

  Router::new()
    .nest("/auth/v1", auth::router(state.clone()))
    .nest("/functions/v1", functions::router(state))
    .nest("/api", api)
    .nest("/admin", admin)
    .layer(TraceLayer::new_for_http())
}
