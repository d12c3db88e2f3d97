//! Handlers for `/inventory` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/inventory/items` | Archived items included |
//! | `POST` | `/inventory/items` | Body: [`NewItem`]; 409 on a duplicate code |
//! | `PATCH`| `/inventory/items/:id` | Body: [`ItemPatch`] |
//! | `POST` | `/inventory/items/:id/archive` | Sets status `archived` |
//! | `GET`  | `/inventory/movements` | Ledger, newest first |
//! | `POST` | `/inventory/movements` | Body: [`NewMovement`]; only `new_quantity` changes stock |
//! | `GET`  | `/inventory/summary` | Health counts of active items |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use taller_core::{
  inventory::{InventoryItem, InventoryMovement, ItemPatch, NewItem, NewMovement},
  report::InventorySummary,
  store::Tenancy,
};
use uuid::Uuid;

use crate::{SedeScope, error::ApiError, studio};

// ─── Items ────────────────────────────────────────────────────────────────────

/// `GET /inventory/items`
pub async fn list_items<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_items().await?))
}

/// `POST /inventory/items`
pub async fn create_item<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError> {
  let item = studio(&*tenancy, scope).add_item(body).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `PATCH /inventory/items/:id`
pub async fn update_item<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(patch): Json<ItemPatch>,
) -> Result<Json<InventoryItem>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).update_item(id, patch).await?))
}

/// `POST /inventory/items/:id/archive`
pub async fn archive_item<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).archive_item(id).await?))
}

// ─── Movements ────────────────────────────────────────────────────────────────

/// `GET /inventory/movements`
pub async fn list_movements<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<InventoryMovement>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_movements().await?))
}

/// `POST /inventory/movements`
pub async fn record_movement<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewMovement>,
) -> Result<impl IntoResponse, ApiError> {
  let movement = studio(&*tenancy, scope).record_movement(body).await?;
  Ok((StatusCode::CREATED, Json(movement)))
}

/// `GET /inventory/summary`
pub async fn summary<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<InventorySummary>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).inventory_summary().await?))
}
