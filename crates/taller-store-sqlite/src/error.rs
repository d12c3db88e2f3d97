//! Error type for `taller-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A text column held a value outside its enum.
  #[error("unknown {what}: {value:?}")]
  UnknownVariant { what: &'static str, value: String },

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl Error {
  /// `true` when the failure was a UNIQUE constraint violation.
  pub fn is_unique_violation(&self) -> bool {
    match self {
      Self::EmailTaken(_) => true,
      Self::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
        e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
      }
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
