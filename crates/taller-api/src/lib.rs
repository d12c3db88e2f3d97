//! Per-workshop JSON REST API for Taller.
//!
//! Exposes an axum [`Router`] backed by any [`taller_core::store::Tenancy`].
//! Every handler works on the workshop named by the [`SedeScope`] request
//! extension; authenticating the caller and inserting that extension is the
//! embedding server's job.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", taller_api::api_router(store.clone()).layer(scope_layer))
//! ```

pub mod error;
pub mod gift_cards;
pub mod inventory;
pub mod pieces;
pub mod reports;
pub mod sessions;
pub mod students;
pub mod teachers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use taller_core::{store::Tenancy, studio::Studio};
use uuid::Uuid;

pub use error::ApiError;

/// The workshop a request operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SedeScope(pub Uuid);

/// The console service for the scoped workshop.
pub(crate) fn studio<T: Tenancy>(tenancy: &T, scope: SedeScope) -> Studio<T::Studio> {
  Studio::new(tenancy.studio(scope.0))
}

/// Build the console API router for `tenancy`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<T: Tenancy>(tenancy: Arc<T>) -> Router<()> {
  Router::new()
    // Reports
    .route("/snapshot", get(reports::snapshot::<T>))
    .route("/dashboard", get(reports::dashboard::<T>))
    // Students
    .route("/students", get(students::list::<T>).post(students::create::<T>))
    .route(
      "/students/{id}",
      get(students::get_one::<T>)
        .patch(students::update::<T>)
        .delete(students::delete::<T>),
    )
    .route("/students/{id}/renew", post(students::renew::<T>))
    // Sessions
    .route("/sessions", get(sessions::list::<T>).post(sessions::create::<T>))
    .route(
      "/sessions/{id}",
      get(sessions::get_one::<T>)
        .patch(sessions::update::<T>)
        .delete(sessions::delete::<T>),
    )
    .route("/sessions/{id}/attendance", put(sessions::attendance::<T>))
    // Teachers
    .route("/teachers", get(teachers::list::<T>).post(teachers::create::<T>))
    .route(
      "/teachers/{id}",
      patch(teachers::update::<T>).delete(teachers::delete::<T>),
    )
    // Pieces
    .route("/pieces", get(pieces::list::<T>).post(pieces::create::<T>))
    .route(
      "/pieces/{id}",
      patch(pieces::update::<T>).delete(pieces::delete::<T>),
    )
    .route("/pieces/{id}/advance", post(pieces::advance::<T>))
    // Gift cards
    .route("/gift-cards", get(gift_cards::list::<T>).post(gift_cards::create::<T>))
    .route(
      "/gift-cards/{id}",
      patch(gift_cards::update::<T>).delete(gift_cards::delete::<T>),
    )
    // Inventory
    .route(
      "/inventory/items",
      get(inventory::list_items::<T>).post(inventory::create_item::<T>),
    )
    .route("/inventory/items/{id}", patch(inventory::update_item::<T>))
    .route("/inventory/items/{id}/archive", post(inventory::archive_item::<T>))
    .route(
      "/inventory/movements",
      get(inventory::list_movements::<T>).post(inventory::record_movement::<T>),
    )
    .route("/inventory/summary", get(inventory::summary::<T>))
    .with_state(tenancy)
}

#[cfg(test)]
mod tests;
