//! Handlers for `/pieces` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/pieces` | Newest first |
//! | `POST`   | `/pieces` | Body: [`NewPiece`]; the owner is linked to a student by full name |
//! | `PATCH`  | `/pieces/:id` | Body: [`PiecePatch`]; any status may be set |
//! | `DELETE` | `/pieces/:id` | 204 |
//! | `POST`   | `/pieces/:id/advance` | One step forward; 400 once delivered |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use taller_core::{
  piece::{CeramicPiece, NewPiece, PiecePatch},
  store::Tenancy,
};
use uuid::Uuid;

use crate::{SedeScope, error::ApiError, studio};

/// `GET /pieces`
pub async fn list<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<CeramicPiece>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_pieces().await?))
}

/// `POST /pieces`
pub async fn create<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewPiece>,
) -> Result<impl IntoResponse, ApiError> {
  let piece = studio(&*tenancy, scope).add_piece(body).await?;
  Ok((StatusCode::CREATED, Json(piece)))
}

/// `PATCH /pieces/:id`
pub async fn update<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(patch): Json<PiecePatch>,
) -> Result<Json<CeramicPiece>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).update_piece(id, patch).await?))
}

/// `DELETE /pieces/:id`
pub async fn delete<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  studio(&*tenancy, scope).delete_piece(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /pieces/:id/advance`
pub async fn advance<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<Json<CeramicPiece>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).advance_piece(id).await?))
}
