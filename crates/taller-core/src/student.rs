//! Students and the calendar slots they are expected to attend.
//!
//! A student is linked to session rosters by two things: the student id on the
//! roster row, and the upper-cased full name ([`roster_name`]) that the
//! calendar shows. Name matching is the only link available when a roster is
//! edited from the calendar side, so it has to be reproduced exactly.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status enums ────────────────────────────────────────────────────────────

/// Billing state of a student's class pass.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StudentStatus {
  Regular,
  NeedsRenewal,
  #[default]
  New,
}

impl StudentStatus {
  /// The status the student form computes before saving.
  ///
  /// A pass needs renewal when it has no credits left, when its expiry date is
  /// already behind `today`, or when a payment is still pending.
  pub fn derive(
    classes_remaining: i32,
    expiry_date: Option<NaiveDate>,
    payment_pending: bool,
    today: NaiveDate,
  ) -> Self {
    let expired = expiry_date.is_some_and(|d| d < today);
    if classes_remaining <= 0 || expired || payment_pending {
      Self::NeedsRenewal
    } else {
      Self::Regular
    }
  }
}

/// Attendance marker shared by assigned classes and session roster rows.
///
/// Transitions are plain overwrites (`pending ⇄ present`, `pending ⇄ absent`);
/// no history is kept.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  #[default]
  Pending,
  Present,
  Absent,
}

impl AttendanceStatus {
  /// `true` for the two marks that are shown on the calendar.
  pub fn is_marked(self) -> bool { !matches!(self, Self::Pending) }
}

// ─── Assigned classes ────────────────────────────────────────────────────────

/// A calendar slot a student is expected to attend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedClass {
  pub date:       NaiveDate,
  #[serde(with = "crate::time::hhmm")]
  pub start_time: NaiveTime,
  #[serde(with = "crate::time::hhmm")]
  pub end_time:   NaiveTime,
  #[serde(default)]
  pub status:     AttendanceStatus,
}

impl AssignedClass {
  pub fn key(&self) -> SlotKey {
    SlotKey {
      date:  self.date,
      start: self.start_time,
      end:   self.end_time,
    }
  }
}

/// `date|startTime|endTime`, the identity of an assigned class.
///
/// The class type is not part of the key, so two slots with identical times
/// but different types collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
  pub date:  NaiveDate,
  pub start: NaiveTime,
  pub end:   NaiveTime,
}

impl fmt::Display for SlotKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}|{}|{}",
      self.date.format("%Y-%m-%d"),
      crate::time::format_hhmm(self.start),
      crate::time::format_hhmm(self.end),
    )
  }
}

/// Slots dropped from and newly added to an assigned-class list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignedDiff {
  pub removed: Vec<AssignedClass>,
  pub added:   Vec<AssignedClass>,
}

/// Symmetric difference of two assigned-class lists keyed by [`SlotKey`].
///
/// A status change alone is not a difference; the slot is kept and its new
/// status is written through the roster upsert.
pub fn diff_assigned(prev: &[AssignedClass], next: &[AssignedClass]) -> AssignedDiff {
  let prev_keys: HashSet<SlotKey> = prev.iter().map(AssignedClass::key).collect();
  let next_keys: HashSet<SlotKey> = next.iter().map(AssignedClass::key).collect();

  AssignedDiff {
    removed: prev
      .iter()
      .filter(|c| !next_keys.contains(&c.key()))
      .cloned()
      .collect(),
    added:   next
      .iter()
      .filter(|c| !prev_keys.contains(&c.key()))
      .cloned()
      .collect(),
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// Upper-cased `"name surname"`, the name stored on session rosters.
pub fn roster_name(name: &str, surname: Option<&str>) -> String {
  format!("{} {}", name, surname.unwrap_or(""))
    .trim()
    .to_uppercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
  pub id:                Uuid,
  pub name:              String,
  pub surname:           Option<String>,
  pub email:             Option<String>,
  pub phone:             String,
  pub phone_country:     Option<String>,
  pub birth_day:         Option<u8>,
  pub birth_month:       Option<u8>,
  pub birth_year:        Option<u16>,
  /// Remaining class credits on the current pass.
  pub classes_remaining: i32,
  pub status:            StudentStatus,
  pub payment_method:    Option<String>,
  pub notes:             Option<String>,
  pub observations:      Option<String>,
  pub price:             Option<f64>,
  /// Free-text class type the student signed up for ("Torno", "Modelado").
  pub class_type:        Option<String>,
  pub expiry_date:       Option<NaiveDate>,
  #[serde(default)]
  pub assigned_classes:  Vec<AssignedClass>,
  pub created_at:        DateTime<Utc>,
}

impl Student {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.name, self.surname.as_deref().unwrap_or(""))
      .trim()
      .to_string()
  }

  pub fn roster_name(&self) -> String {
    roster_name(&self.name, self.surname.as_deref())
  }

  /// The form reads a pass as unpaid when it needs renewal with credits
  /// still on it.
  pub fn payment_pending(&self) -> bool {
    self.status == StudentStatus::NeedsRenewal && self.classes_remaining > 0
  }

  /// Whether `name` (any case) refers to this student.
  pub fn matches_roster_name(&self, name: &str) -> bool {
    self.roster_name() == name.trim().to_uppercase()
  }
}

/// Input to [`crate::studio::Studio::add_student`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStudent {
  pub name:              String,
  pub surname:           Option<String>,
  pub email:             Option<String>,
  #[serde(default)]
  pub phone:             String,
  pub phone_country:     Option<String>,
  pub birth_day:         Option<u8>,
  pub birth_month:       Option<u8>,
  pub birth_year:        Option<u16>,
  #[serde(default)]
  pub classes_remaining: i32,
  /// Ignored on create; the status is derived from the fields below.
  #[serde(default)]
  pub status:            StudentStatus,
  /// Whether the pass is still unpaid. Only feeds the status.
  #[serde(default)]
  pub payment_pending:   bool,
  pub payment_method:    Option<String>,
  pub notes:             Option<String>,
  pub observations:      Option<String>,
  pub price:             Option<f64>,
  pub class_type:        Option<String>,
  pub expiry_date:       Option<NaiveDate>,
  #[serde(default)]
  pub assigned_classes:  Vec<AssignedClass>,
}

impl NewStudent {
  pub fn new(name: impl Into<String>, surname: Option<&str>) -> Self {
    Self {
      name: name.into(),
      surname: surname.map(str::to_owned),
      ..Self::default()
    }
  }
}

/// Partial update. `None` leaves a field unchanged; there is no way to clear
/// an optional field back to null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentPatch {
  pub name:              Option<String>,
  pub surname:           Option<String>,
  pub email:             Option<String>,
  pub phone:             Option<String>,
  pub phone_country:     Option<String>,
  pub birth_day:         Option<u8>,
  pub birth_month:       Option<u8>,
  pub birth_year:        Option<u16>,
  pub classes_remaining: Option<i32>,
  /// An explicit status wins over the derived one.
  pub status:            Option<StudentStatus>,
  pub payment_pending:   Option<bool>,
  pub payment_method:    Option<String>,
  pub notes:             Option<String>,
  pub observations:      Option<String>,
  pub price:             Option<f64>,
  pub class_type:        Option<String>,
  pub expiry_date:       Option<NaiveDate>,
  /// When present, replaces the whole list and triggers roster reconciliation.
  pub assigned_classes:  Option<Vec<AssignedClass>>,
}

impl StudentPatch {
  /// The patch a renewal applies: `n` more credits and a regular status.
  pub fn renewal(current: i32, n: i32) -> Result<Self> {
    let total = current
      .checked_add(n)
      .ok_or_else(|| Error::InvalidQuantity(format!("renewal of {n} classes on top of {current}")))?;
    Ok(Self {
      classes_remaining: Some(total),
      status: Some(StudentStatus::Regular),
      payment_pending: Some(false),
      ..Self::default()
    })
  }

  /// Whether the patch touches a field the status is derived from.
  pub fn touches_status_inputs(&self) -> bool {
    self.classes_remaining.is_some() || self.expiry_date.is_some() || self.payment_pending.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn slot(date: &str, start: &str, end: &str, status: AttendanceStatus) -> AssignedClass {
    AssignedClass {
      date: date.parse().unwrap(),
      start_time: crate::time::parse_hhmm(start).unwrap(),
      end_time: crate::time::parse_hhmm(end).unwrap(),
      status,
    }
  }

  #[test]
  fn roster_name_is_trimmed_upper_case() {
    assert_eq!(roster_name("Ana", Some("Martínez")), "ANA MARTÍNEZ");
    assert_eq!(roster_name("Ana", None), "ANA");
    assert_eq!(roster_name("Ana", Some("")), "ANA");
  }

  #[test]
  fn diff_ignores_status_changes() {
    let prev = vec![slot("2026-01-07", "10:00", "12:00", AttendanceStatus::Pending)];
    let next = vec![slot("2026-01-07", "10:00", "12:00", AttendanceStatus::Present)];
    let diff = diff_assigned(&prev, &next);
    assert!(diff.removed.is_empty());
    assert!(diff.added.is_empty());
  }

  #[test]
  fn diff_reports_removed_and_added() {
    let prev = vec![
      slot("2026-01-07", "10:00", "12:00", AttendanceStatus::Pending),
      slot("2026-01-09", "11:00", "13:00", AttendanceStatus::Pending),
    ];
    let next = vec![
      slot("2026-01-09", "11:00", "13:00", AttendanceStatus::Pending),
      slot("2026-01-14", "10:30", "12:30", AttendanceStatus::Pending),
    ];
    let diff = diff_assigned(&prev, &next);
    assert_eq!(diff.removed.len(), 1);
    assert_eq!(diff.removed[0].key().to_string(), "2026-01-07|10:00|12:00");
    assert_eq!(diff.added.len(), 1);
    assert_eq!(diff.added[0].key().to_string(), "2026-01-14|10:30|12:30");
  }

  #[test]
  fn status_derivation() {
    let today: NaiveDate = "2026-01-20".parse().unwrap();
    let later = Some("2026-02-01".parse().unwrap());
    let earlier = Some("2026-01-01".parse().unwrap());
    assert_eq!(StudentStatus::derive(4, later, false, today), StudentStatus::Regular);
    assert_eq!(StudentStatus::derive(0, later, false, today), StudentStatus::NeedsRenewal);
    assert_eq!(StudentStatus::derive(4, earlier, false, today), StudentStatus::NeedsRenewal);
    assert_eq!(StudentStatus::derive(4, None, true, today), StudentStatus::NeedsRenewal);
  }

  #[test]
  fn renewal_patch_adds_credits() {
    let patch = StudentPatch::renewal(1, 4).unwrap();
    assert_eq!(patch.classes_remaining, Some(5));
    assert_eq!(patch.status, Some(StudentStatus::Regular));
  }

  #[test]
  fn renewal_past_the_credit_ceiling_is_rejected() {
    let err = StudentPatch::renewal(i32::MAX, 4).unwrap_err();
    assert!(matches!(err, Error::InvalidQuantity(_)));
    assert!(err.is_validation());
    assert!(StudentPatch::renewal(i32::MAX - 4, 4).is_ok());
  }

  #[test]
  fn pending_payment_is_read_back_from_status() {
    let mut student = Student {
      id:                Uuid::nil(),
      name:              "Ana".into(),
      surname:           None,
      email:             None,
      phone:             String::new(),
      phone_country:     None,
      birth_day:         None,
      birth_month:       None,
      birth_year:        None,
      classes_remaining: 3,
      status:            StudentStatus::NeedsRenewal,
      payment_method:    None,
      notes:             None,
      observations:      None,
      price:             None,
      class_type:        None,
      expiry_date:       None,
      assigned_classes:  Vec::new(),
      created_at:        Utc::now(),
    };
    assert!(student.payment_pending());
    student.classes_remaining = 0;
    assert!(!student.payment_pending());
    student.classes_remaining = 3;
    student.status = StudentStatus::Regular;
    assert!(!student.payment_pending());
  }

  #[test]
  fn attendance_wire_names() {
    assert_eq!(AttendanceStatus::Present.to_string(), "present");
    assert_eq!("absent".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);
    assert_eq!(serde_json::to_string(&AttendanceStatus::Pending).unwrap(), "\"pending\"");
  }
}
