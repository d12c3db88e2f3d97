//! Handlers for `/sessions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sessions` | Each session with its roster names and marks |
//! | `POST`   | `/sessions` | Body: [`NewSession`]; 409 on a duplicate slot and type |
//! | `GET`    | `/sessions/:id` | 404 if not found |
//! | `PATCH`  | `/sessions/:id` | Body: [`SessionPatch`] |
//! | `DELETE` | `/sessions/:id` | 204 |
//! | `PUT`    | `/sessions/:id/attendance` | Body: `{"<NAME>": "present" \| "absent" \| "pending"}` |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use taller_core::{
  session::{AttendanceMap, ClassSession, NewSession, SessionPatch},
  store::Tenancy,
};
use uuid::Uuid;

use crate::{SedeScope, error::ApiError, studio};

/// `GET /sessions`
pub async fn list<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<ClassSession>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_sessions().await?))
}

/// `POST /sessions`
pub async fn create<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewSession>,
) -> Result<impl IntoResponse, ApiError> {
  let session = studio(&*tenancy, scope).add_session(body).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /sessions/:id`
pub async fn get_one<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<Json<ClassSession>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).get_session(id).await?))
}

/// `PATCH /sessions/:id`
pub async fn update<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(patch): Json<SessionPatch>,
) -> Result<Json<ClassSession>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).update_session(id, patch).await?))
}

/// `DELETE /sessions/:id`
pub async fn delete<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  studio(&*tenancy, scope).delete_session(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /sessions/:id/attendance`
pub async fn attendance<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(marks): Json<AttendanceMap>,
) -> Result<Json<ClassSession>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).set_attendance(id, marks).await?))
}
