//! Prepaid gift cards for a number of classes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GiftCardType {
  #[default]
  Modelado,
  Torno,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCard {
  pub id:               Uuid,
  pub buyer:            String,
  pub recipient:        String,
  pub num_classes:      i32,
  #[serde(rename = "type")]
  pub card_type:        GiftCardType,
  pub scheduled_date:   Option<NaiveDate>,
  pub created_at:       DateTime<Utc>,
  pub extra_commentary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGiftCard {
  pub buyer:            String,
  pub recipient:        String,
  pub num_classes:      i32,
  #[serde(rename = "type", default)]
  pub card_type:        GiftCardType,
  pub scheduled_date:   Option<NaiveDate>,
  pub extra_commentary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GiftCardPatch {
  pub buyer:            Option<String>,
  pub recipient:        Option<String>,
  pub num_classes:      Option<i32>,
  #[serde(rename = "type")]
  pub card_type:        Option<GiftCardType>,
  pub scheduled_date:   Option<NaiveDate>,
  pub extra_commentary: Option<String>,
}
