//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Missing Authorization header")]
  MissingAuthorization,
  #[error("Unauthorized")]
  Unauthorized,
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  BadRequest(String),
  #[error("El correo electrónico ya está registrado.")]
  EmailTaken,
  #[error("Error al eliminar usuario de Auth: {0}")]
  IdentityDeletion(String),
  #[error("password hashing failed: {0}")]
  Hash(String),
  #[error(transparent)]
  Core(#[from] taller_core::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// The message reported in an in-band `{"error": ...}` function body.
  pub fn in_band_message(&self) -> String {
    match self {
      Error::Core(taller_core::Error::MissingField(fields)) => {
        format!("Faltan campos obligatorios: {fields}")
      }
      Error::Core(taller_core::Error::PasswordTooShort(min)) => {
        format!("La contraseña debe tener al menos {min} caracteres")
      }
      other => other.to_string(),
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Error::MissingAuthorization | Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::EmailTaken => StatusCode::CONFLICT,
      Error::Core(e) if e.is_validation() => StatusCode::BAD_REQUEST,
      Error::Core(
        taller_core::Error::DuplicateCode(_) | taller_core::Error::DuplicateSession(_),
      ) => StatusCode::CONFLICT,
      Error::IdentityDeletion(_) | Error::Hash(_) | Error::Core(_) | Error::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.in_band_message() }))).into_response()
  }
}
