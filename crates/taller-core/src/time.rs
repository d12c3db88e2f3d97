//! Wall-clock helpers.
//!
//! Session and assigned-class times are carried as [`NaiveTime`] but travel
//! over the wire as `HH:MM`, which is what the calendar grid works in.

use chrono::{NaiveTime, Timelike};

/// Render a time as `HH:MM`.
pub fn format_hhmm(t: NaiveTime) -> String { t.format("%H:%M").to_string() }

/// Parse `HH:MM`, also accepting `HH:MM:SS`. Seconds are dropped, since
/// slots are stored and matched at minute precision.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
  let s = s.trim();
  NaiveTime::parse_from_str(s, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    .ok()
    .and_then(|t| t.with_second(0))
}

/// `#[serde(with = "crate::time::hhmm")]` for `NaiveTime` fields.
pub mod hhmm {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::format_hhmm(*t))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(d)?;
    super::parse_hhmm(&raw)
      .ok_or_else(|| D::Error::custom(format!("invalid time {raw:?}, expected HH:MM")))
  }
}

/// Same as [`hhmm`] for `Option<NaiveTime>`.
pub mod hhmm_opt {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
    match t {
      Some(t) => s.serialize_some(&super::format_hhmm(*t)),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<NaiveTime>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    raw
      .map(|r| {
        super::parse_hhmm(&r)
          .ok_or_else(|| D::Error::custom(format!("invalid time {r:?}, expected HH:MM")))
      })
      .transpose()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_both_precisions() {
    let t = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
    assert_eq!(parse_hhmm("10:30"), Some(t));
    assert_eq!(parse_hhmm("10:30:00"), Some(t));
    assert_eq!(parse_hhmm(" 10:30 "), Some(t));
    assert_eq!(parse_hhmm("25:00"), None);
    assert_eq!(format_hhmm(t), "10:30");
  }

  #[test]
  fn seconds_are_truncated() {
    let t = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    assert_eq!(parse_hhmm("10:00:30"), Some(t));
    assert_eq!(parse_hhmm("10:00:59"), Some(t));
    assert_eq!(format_hhmm(parse_hhmm("10:00:30").unwrap()), "10:00");
  }
}
