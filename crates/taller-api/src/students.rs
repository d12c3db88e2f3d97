//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | Each student with its assigned classes |
//! | `POST`   | `/students` | Body: [`NewStudent`]; returns 201. Assigned classes are mirrored onto session rosters |
//! | `GET`    | `/students/:id` | 404 if not found |
//! | `PATCH`  | `/students/:id` | Body: [`StudentPatch`]; `assigned_classes` replaces the list and reconciles rosters |
//! | `DELETE` | `/students/:id` | 204 |
//! | `POST`   | `/students/:id/renew` | Optional `?classes=<n>`, default 4 |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use taller_core::{
  store::Tenancy,
  student::{NewStudent, Student, StudentPatch},
};
use uuid::Uuid;

use crate::{SedeScope, error::ApiError, studio};

/// `GET /students`
pub async fn list<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<Student>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_students().await?))
}

/// `POST /students`
pub async fn create<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  let student = studio(&*tenancy, scope).add_student(body).await?;
  Ok((StatusCode::CREATED, Json(student)))
}

/// `GET /students/:id`
pub async fn get_one<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).get_student(id).await?))
}

/// `PATCH /students/:id`
pub async fn update<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).update_student(id, patch).await?))
}

/// `DELETE /students/:id`
pub async fn delete<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  studio(&*tenancy, scope).delete_student(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RenewParams {
  /// Credits to add. Defaults to [`taller_core::studio::DEFAULT_RENEWAL`].
  pub classes: Option<i32>,
}

/// `POST /students/:id/renew[?classes=<n>]`
pub async fn renew<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Query(params): Query<RenewParams>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(
    studio(&*tenancy, scope)
      .renew_student(id, params.classes)
      .await?,
  ))
}
