//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<taller_core::Error> for ApiError {
  fn from(e: taller_core::Error) -> Self {
    use taller_core::Error as E;
    match e {
      E::StudentNotFound(_)
      | E::SessionNotFound(_)
      | E::TeacherNotFound(_)
      | E::PieceNotFound(_)
      | E::GiftCardNotFound(_)
      | E::ItemNotFound(_) => Self::NotFound(e.to_string()),
      E::DuplicateSession(_) | E::DuplicateCode(_) => Self::Conflict(e.to_string()),
      E::Store(inner) => Self::Store(inner),
      e if e.is_validation() => Self::BadRequest(e.to_string()),
      e => Self::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
