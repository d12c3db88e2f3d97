//! Handlers for `/teachers` endpoints.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use taller_core::{
  store::Tenancy,
  teacher::{NewTeacher, Teacher, TeacherPatch},
};
use uuid::Uuid;

use crate::{SedeScope, error::ApiError, studio};

/// `GET /teachers`
pub async fn list<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<Teacher>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_teachers().await?))
}

/// `POST /teachers`
pub async fn create<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewTeacher>,
) -> Result<impl IntoResponse, ApiError> {
  let teacher = studio(&*tenancy, scope).add_teacher(body).await?;
  Ok((StatusCode::CREATED, Json(teacher)))
}

/// `PATCH /teachers/:id`
pub async fn update<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(patch): Json<TeacherPatch>,
) -> Result<Json<Teacher>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).update_teacher(id, patch).await?))
}

/// `DELETE /teachers/:id`
pub async fn delete<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  studio(&*tenancy, scope).delete_teacher(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
