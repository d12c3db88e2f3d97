//! Ceramic pieces waiting to be fired, glazed or collected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Linear progression of a piece through the studio.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
pub enum PieceStatus {
  #[default]
  #[serde(rename = "1era_quema")]
  #[strum(serialize = "1era_quema")]
  FirstFiring,
  #[serde(rename = "esmaltado")]
  #[strum(serialize = "esmaltado")]
  Glazed,
  #[serde(rename = "a_recogida")]
  #[strum(serialize = "a_recogida")]
  ReadyForPickup,
  #[serde(rename = "entregado")]
  #[strum(serialize = "entregado")]
  Delivered,
}

impl PieceStatus {
  /// The single forward step, or `None` once delivered.
  pub fn next(self) -> Option<Self> {
    match self {
      Self::FirstFiring => Some(Self::Glazed),
      Self::Glazed => Some(Self::ReadyForPickup),
      Self::ReadyForPickup => Some(Self::Delivered),
      Self::Delivered => None,
    }
  }

  /// Completion percentage shown on the piece card.
  pub fn progress(self) -> u8 {
    match self {
      Self::FirstFiring => 25,
      Self::Glazed => 50,
      Self::ReadyForPickup => 75,
      Self::Delivered => 100,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeramicPiece {
  pub id:               Uuid,
  /// Student the owner name resolved to when the piece was registered.
  pub student_id:       Option<Uuid>,
  pub owner:            String,
  pub description:      String,
  pub status:           PieceStatus,
  pub glaze_type:       Option<String>,
  pub delivery_date:    Option<NaiveDate>,
  pub notes:            Option<String>,
  pub extra_commentary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPiece {
  pub owner:            String,
  pub description:      String,
  #[serde(default)]
  pub status:           PieceStatus,
  pub glaze_type:       Option<String>,
  pub delivery_date:    Option<NaiveDate>,
  pub notes:            Option<String>,
  pub extra_commentary: Option<String>,
}

/// Partial update. Any status may be set here, in any order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PiecePatch {
  pub owner:            Option<String>,
  pub description:      Option<String>,
  pub status:           Option<PieceStatus>,
  pub glaze_type:       Option<String>,
  pub delivery_date:    Option<NaiveDate>,
  pub notes:            Option<String>,
  pub extra_commentary: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn progression_is_linear() {
    let mut status = PieceStatus::FirstFiring;
    let mut seen = vec![status.progress()];
    while let Some(next) = status.next() {
      assert!(next > status);
      status = next;
      seen.push(status.progress());
    }
    assert_eq!(status, PieceStatus::Delivered);
    assert_eq!(seen, vec![25, 50, 75, 100]);
  }

  #[test]
  fn wire_names() {
    assert_eq!(
      serde_json::to_string(&PieceStatus::FirstFiring).unwrap(),
      "\"1era_quema\""
    );
    assert_eq!(
      "a_recogida".parse::<PieceStatus>().unwrap(),
      PieceStatus::ReadyForPickup
    );
    assert_eq!(PieceStatus::Delivered.as_ref(), "entregado");
  }
}
