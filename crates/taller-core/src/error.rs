//! Error types for `taller-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("student not found: {0}")]
  StudentNotFound(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("teacher not found: {0}")]
  TeacherNotFound(Uuid),

  #[error("piece not found: {0}")]
  PieceNotFound(Uuid),

  #[error("gift card not found: {0}")]
  GiftCardNotFound(Uuid),

  #[error("inventory item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("start time {start} must be before end time {end}")]
  InvalidTimeRange { start: String, end: String },

  #[error("a session with the same schedule and type already exists: {0}")]
  DuplicateSession(Uuid),

  #[error("an inventory item with code {0:?} already exists")]
  DuplicateCode(String),

  #[error("invalid quantity: {0}")]
  InvalidQuantity(String),

  #[error("piece {0} has already been delivered")]
  PieceAlreadyDelivered(Uuid),

  #[error("password must be at least {0} characters")]
  PasswordTooShort(usize),

  #[error("storage error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// `true` for errors caused by caller input rather than storage.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingField(_)
        | Self::InvalidTimeRange { .. }
        | Self::InvalidQuantity(_)
        | Self::PieceAlreadyDelivered(_)
        | Self::PasswordTooShort(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
