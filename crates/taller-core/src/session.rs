//! Calendar sessions and their rosters.
//!
//! A session's roster lives in its own table: one row per `(session, student)`
//! carrying the upper-cased student name and an attendance value. The
//! [`ClassSession`] read model flattens those rows into the `students` name
//! list and the `attendance` map the calendar works with.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  student::{AttendanceStatus, SlotKey},
  time::format_hhmm,
};

// ─── Class type ──────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClassType {
  Mesa,
  Torno,
  Coworking,
  Workshop,
  Privada,
  /// A holiday block; never carries students.
  Feriado,
}

impl ClassType {
  pub fn requires_teacher(self) -> bool { matches!(self, Self::Mesa) }

  pub fn requires_workshop_name(self) -> bool { matches!(self, Self::Workshop) }

  pub fn requires_private_reason(self) -> bool { matches!(self, Self::Privada) }

  /// Type used when a session has to be created for a student's slot.
  /// Only an explicit "torno" sign-up maps to the wheel; everything else is
  /// hand-building at the table.
  pub fn infer_from_declared(declared: Option<&str>) -> Self {
    match declared {
      Some(t) if t.trim().eq_ignore_ascii_case("torno") => Self::Torno,
      _ => Self::Mesa,
    }
  }

  /// Default seat count used by the dashboard occupancy figures.
  pub fn default_capacity(self) -> u32 {
    match self {
      Self::Torno => 5,
      _ => 8,
    }
  }
}

// ─── Roster ──────────────────────────────────────────────────────────────────

/// One row of a session roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
  pub session_id:   Uuid,
  pub student_id:   Uuid,
  /// Upper-cased full name at the time the row was written.
  pub student_name: String,
  pub attendance:   AttendanceStatus,
}

/// Attendance marks keyed by roster name.
pub type AttendanceMap = BTreeMap<String, AttendanceStatus>;

/// Look up `name` in `map`, ignoring case. Anything not marked present or
/// absent reads as pending.
pub fn mark_for(map: &AttendanceMap, name: &str) -> AttendanceStatus {
  map
    .get(name)
    .or_else(|| {
      let upper = name.to_uppercase();
      map.iter().find(|(k, _)| k.to_uppercase() == upper).map(|(_, v)| v)
    })
    .copied()
    .unwrap_or_default()
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSession {
  pub id:                    Uuid,
  pub date:                  NaiveDate,
  #[serde(with = "crate::time::hhmm")]
  pub start_time:            NaiveTime,
  #[serde(with = "crate::time::hhmm")]
  pub end_time:              NaiveTime,
  pub class_type:            ClassType,
  /// Roster names, in roster order.
  #[serde(default)]
  pub students:              Vec<String>,
  /// Only `present`/`absent` marks; pending rows are omitted.
  #[serde(default)]
  pub attendance:            AttendanceMap,
  pub teacher_id:            Option<Uuid>,
  pub teacher_substitute_id: Option<Uuid>,
  pub completed_at:          Option<DateTime<Utc>>,
  pub workshop_name:         Option<String>,
  pub private_reason:        Option<String>,
}

impl ClassSession {
  pub fn slot(&self) -> SlotKey {
    SlotKey {
      date:  self.date,
      start: self.start_time,
      end:   self.end_time,
    }
  }

  /// Fill `students` and `attendance` from roster rows.
  pub fn with_roster(mut self, rows: &[RosterEntry]) -> Self {
    self.students = rows.iter().map(|r| r.student_name.clone()).collect();
    self.attendance = rows
      .iter()
      .filter(|r| r.attendance.is_marked())
      .map(|r| (r.student_name.clone(), r.attendance))
      .collect();
    self
  }
}

/// The session at `(date, start, end)` in `sessions`, if any.
pub fn find_by_slot(sessions: &[ClassSession], key: SlotKey) -> Option<&ClassSession> {
  sessions.iter().find(|s| s.slot() == key)
}

/// The first session on `date` starting at `start`, whatever its end time.
pub fn find_by_start(
  sessions: &[ClassSession],
  date: NaiveDate,
  start: NaiveTime,
) -> Option<&ClassSession> {
  sessions.iter().find(|s| s.date == date && s.start_time == start)
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Input to [`crate::studio::Studio::add_session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
  pub date:                  NaiveDate,
  #[serde(with = "crate::time::hhmm")]
  pub start_time:            NaiveTime,
  #[serde(with = "crate::time::hhmm")]
  pub end_time:              NaiveTime,
  pub class_type:            ClassType,
  #[serde(default)]
  pub students:              Vec<String>,
  pub attendance:            Option<AttendanceMap>,
  pub teacher_id:            Option<Uuid>,
  pub teacher_substitute_id: Option<Uuid>,
  pub workshop_name:         Option<String>,
  pub private_reason:        Option<String>,
}

impl NewSession {
  /// A bare session record, as created for an assigned class with no match.
  pub fn bare(key: SlotKey, class_type: ClassType) -> Self {
    Self {
      date: key.date,
      start_time: key.start,
      end_time: key.end,
      class_type,
      students: Vec::new(),
      attendance: None,
      teacher_id: None,
      teacher_substitute_id: None,
      workshop_name: None,
      private_reason: None,
    }
  }

  pub fn slot(&self) -> SlotKey {
    SlotKey {
      date:  self.date,
      start: self.start_time,
      end:   self.end_time,
    }
  }

  /// Calendar form rules.
  ///
  /// `existing` is the current session list; `editing` excludes the session
  /// being edited from the duplicate check. Duplicates are detected on
  /// `(date, start, end, class type)`, so two sessions of different types
  /// may share a slot.
  pub fn validate(&self, existing: &[ClassSession], editing: Option<Uuid>) -> Result<()> {
    if self.class_type.requires_teacher() && self.teacher_id.is_none() {
      return Err(Error::MissingField("teacher_id"));
    }
    if self.class_type.requires_workshop_name() && blank(&self.workshop_name) {
      return Err(Error::MissingField("workshop_name"));
    }
    if self.class_type.requires_private_reason() && blank(&self.private_reason) {
      return Err(Error::MissingField("private_reason"));
    }
    validate_range(self.start_time, self.end_time)?;

    let key = self.slot();
    if let Some(dup) = existing
      .iter()
      .filter(|s| Some(s.id) != editing)
      .find(|s| s.slot() == key && s.class_type == self.class_type)
    {
      return Err(Error::DuplicateSession(dup.id));
    }
    Ok(())
  }

  /// Trim free-text fields and drop the roster of a holiday.
  pub fn normalized(mut self) -> Self {
    self.workshop_name = trimmed(self.workshop_name);
    self.private_reason = trimmed(self.private_reason);
    if self.class_type == ClassType::Feriado {
      self.students.clear();
      self.attendance = None;
    }
    self
  }
}

/// Partial update for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
  pub date:                  Option<NaiveDate>,
  #[serde(default, with = "crate::time::hhmm_opt")]
  pub start_time:            Option<NaiveTime>,
  #[serde(default, with = "crate::time::hhmm_opt")]
  pub end_time:              Option<NaiveTime>,
  pub class_type:            Option<ClassType>,
  /// Desired roster names; triggers a roster sync when present.
  pub students:              Option<Vec<String>>,
  /// Attendance marks; rewrites every existing roster row when present.
  pub attendance:            Option<AttendanceMap>,
  pub teacher_id:            Option<Uuid>,
  pub teacher_substitute_id: Option<Uuid>,
  pub completed_at:          Option<DateTime<Utc>>,
  pub workshop_name:         Option<String>,
  pub private_reason:        Option<String>,
}

impl SessionPatch {
  /// `true` when the patch moves the session in the calendar or retypes it.
  pub fn touches_schedule(&self) -> bool {
    self.date.is_some()
      || self.start_time.is_some()
      || self.end_time.is_some()
      || self.class_type.is_some()
  }

  /// `true` when the patch changes a column of the session row itself.
  pub fn touches_row(&self) -> bool {
    self.touches_schedule()
      || self.teacher_id.is_some()
      || self.teacher_substitute_id.is_some()
      || self.completed_at.is_some()
      || self.workshop_name.is_some()
      || self.private_reason.is_some()
  }

  /// The session as it would look after this patch, for validation.
  pub fn merged(&self, current: &ClassSession) -> NewSession {
    NewSession {
      date:                  self.date.unwrap_or(current.date),
      start_time:            self.start_time.unwrap_or(current.start_time),
      end_time:              self.end_time.unwrap_or(current.end_time),
      class_type:            self.class_type.unwrap_or(current.class_type),
      students:              self.students.clone().unwrap_or_else(|| current.students.clone()),
      attendance:            self.attendance.clone(),
      teacher_id:            self.teacher_id.or(current.teacher_id),
      teacher_substitute_id: self.teacher_substitute_id.or(current.teacher_substitute_id),
      workshop_name:         self.workshop_name.clone().or_else(|| current.workshop_name.clone()),
      private_reason:        self.private_reason.clone().or_else(|| current.private_reason.clone()),
    }
  }
}

fn validate_range(start: NaiveTime, end: NaiveTime) -> Result<()> {
  if start >= end {
    return Err(Error::InvalidTimeRange {
      start: format_hhmm(start),
      end:   format_hhmm(end),
    });
  }
  Ok(())
}

fn blank(s: &Option<String>) -> bool { s.as_deref().is_none_or(|s| s.trim().is_empty()) }

fn trimmed(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::time::parse_hhmm;

  fn session(date: &str, start: &str, end: &str, class_type: ClassType) -> ClassSession {
    ClassSession {
      id: Uuid::new_v4(),
      date: date.parse().unwrap(),
      start_time: parse_hhmm(start).unwrap(),
      end_time: parse_hhmm(end).unwrap(),
      class_type,
      students: vec![],
      attendance: AttendanceMap::new(),
      teacher_id: None,
      teacher_substitute_id: None,
      completed_at: None,
      workshop_name: None,
      private_reason: None,
    }
  }

  fn input(date: &str, start: &str, end: &str, class_type: ClassType) -> NewSession {
    let mut s = NewSession::bare(
      SlotKey {
        date:  date.parse().unwrap(),
        start: parse_hhmm(start).unwrap(),
        end:   parse_hhmm(end).unwrap(),
      },
      class_type,
    );
    s.teacher_id = Some(Uuid::new_v4());
    s
  }

  #[test]
  fn same_slot_different_type_is_accepted() {
    let existing = vec![session("2026-01-07", "10:00", "12:00", ClassType::Mesa)];
    let torno = input("2026-01-07", "10:00", "12:00", ClassType::Torno);
    assert!(torno.validate(&existing, None).is_ok());
  }

  #[test]
  fn same_slot_same_type_is_rejected() {
    let existing = vec![session("2026-01-07", "10:00", "12:00", ClassType::Mesa)];
    let mesa = input("2026-01-07", "10:00", "12:00", ClassType::Mesa);
    let err = mesa.validate(&existing, None).unwrap_err();
    assert!(matches!(err, Error::DuplicateSession(id) if id == existing[0].id));
    assert!(mesa.validate(&existing, Some(existing[0].id)).is_ok());
  }

  #[test]
  fn start_must_precede_end() {
    let s = input("2026-01-07", "12:00", "12:00", ClassType::Torno);
    assert!(matches!(s.validate(&[], None), Err(Error::InvalidTimeRange { .. })));
  }

  #[test]
  fn required_fields_per_type() {
    let mut mesa = input("2026-01-07", "10:00", "12:00", ClassType::Mesa);
    mesa.teacher_id = None;
    assert!(matches!(mesa.validate(&[], None), Err(Error::MissingField("teacher_id"))));

    let mut workshop = input("2026-01-07", "10:00", "12:00", ClassType::Workshop);
    workshop.workshop_name = Some("   ".into());
    assert!(matches!(
      workshop.validate(&[], None),
      Err(Error::MissingField("workshop_name"))
    ));

    let privada = input("2026-01-07", "10:00", "12:00", ClassType::Privada);
    assert!(matches!(
      privada.validate(&[], None),
      Err(Error::MissingField("private_reason"))
    ));
  }

  #[test]
  fn holiday_drops_roster() {
    let mut s = input("2026-01-07", "10:00", "12:00", ClassType::Feriado);
    s.students = vec!["ANA MARTÍNEZ".into()];
    assert!(s.normalized().students.is_empty());
  }

  #[test]
  fn inferred_type() {
    assert_eq!(ClassType::infer_from_declared(Some("Torno")), ClassType::Torno);
    assert_eq!(ClassType::infer_from_declared(Some("Modelado")), ClassType::Mesa);
    assert_eq!(ClassType::infer_from_declared(None), ClassType::Mesa);
  }

  #[test]
  fn roster_flattening_omits_pending() {
    let s = session("2026-01-07", "10:00", "12:00", ClassType::Mesa);
    let rows = vec![
      RosterEntry {
        session_id:   s.id,
        student_id:   Uuid::new_v4(),
        student_name: "ANA MARTÍNEZ".into(),
        attendance:   AttendanceStatus::Present,
      },
      RosterEntry {
        session_id:   s.id,
        student_id:   Uuid::new_v4(),
        student_name: "SOFIA GÓMEZ".into(),
        attendance:   AttendanceStatus::Pending,
      },
    ];
    let s = s.with_roster(&rows);
    assert_eq!(s.students, vec!["ANA MARTÍNEZ", "SOFIA GÓMEZ"]);
    assert_eq!(s.attendance.len(), 1);
    assert_eq!(mark_for(&s.attendance, "ana martínez"), AttendanceStatus::Present);
    assert_eq!(mark_for(&s.attendance, "SOFIA GÓMEZ"), AttendanceStatus::Pending);
  }
}
