//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! and wall-clock times as `HH:MM`. Enums use their snake_case wire names.
//! UUIDs are stored as hyphenated lowercase strings. Inventory item details
//! are stored as compact JSON.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Row;
use taller_core::{
  directory::{Profile, Role, StaffMember, Workshop},
  gift_card::GiftCard,
  inventory::{InventoryItem, InventoryMovement, ItemDetails},
  piece::CeramicPiece,
  session::{AttendanceMap, ClassSession, RosterEntry},
  student::{AssignedClass, Student},
  teacher::Teacher,
  time::{format_hhmm, parse_hhmm},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

pub fn encode_time(t: NaiveTime) -> String { format_hhmm(t) }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  parse_hhmm(s).ok_or_else(|| Error::DateParse(format!("invalid time {s:?}")))
}

/// Parse an enum stored under its wire name.
pub fn decode_enum<T: FromStr>(what: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownVariant {
    what,
    value: s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` type holds the columns of one row exactly as SQLite returned
// them, in the order of its `COLUMNS` constant.

pub struct RawStudent {
  pub id:                String,
  pub name:              String,
  pub surname:           Option<String>,
  pub email:             Option<String>,
  pub phone:             String,
  pub phone_country:     Option<String>,
  pub birth_day:         Option<u8>,
  pub birth_month:       Option<u8>,
  pub birth_year:        Option<u16>,
  pub classes_remaining: i32,
  pub status:            String,
  pub payment_method:    Option<String>,
  pub notes:             Option<String>,
  pub observations:      Option<String>,
  pub price:             Option<f64>,
  pub class_type:        Option<String>,
  pub expiry_date:       Option<String>,
  pub created_at:        String,
}

impl RawStudent {
  pub const COLUMNS: &'static str = "id, name, surname, email, phone, phone_country,
    birth_day, birth_month, birth_year, classes_remaining, status, payment_method,
    notes, observations, price, class_type, expiry_date, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      name:              row.get(1)?,
      surname:           row.get(2)?,
      email:             row.get(3)?,
      phone:             row.get(4)?,
      phone_country:     row.get(5)?,
      birth_day:         row.get(6)?,
      birth_month:       row.get(7)?,
      birth_year:        row.get(8)?,
      classes_remaining: row.get(9)?,
      status:            row.get(10)?,
      payment_method:    row.get(11)?,
      notes:             row.get(12)?,
      observations:      row.get(13)?,
      price:             row.get(14)?,
      class_type:        row.get(15)?,
      expiry_date:       row.get(16)?,
      created_at:        row.get(17)?,
    })
  }

  /// Build the student; `assigned_classes` are attached by the caller.
  pub fn into_student(self, assigned_classes: Vec<AssignedClass>) -> Result<Student> {
    Ok(Student {
      id: decode_uuid(&self.id)?,
      name: self.name,
      surname: self.surname,
      email: self.email,
      phone: self.phone,
      phone_country: self.phone_country,
      birth_day: self.birth_day,
      birth_month: self.birth_month,
      birth_year: self.birth_year,
      classes_remaining: self.classes_remaining,
      status: decode_enum("student status", &self.status)?,
      payment_method: self.payment_method,
      notes: self.notes,
      observations: self.observations,
      price: self.price,
      class_type: self.class_type,
      expiry_date: decode_opt_date(self.expiry_date)?,
      assigned_classes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAssigned {
  pub student_id: String,
  pub date:       String,
  pub start_time: String,
  pub end_time:   String,
  pub status:     String,
}

impl RawAssigned {
  pub const COLUMNS: &'static str = "student_id, date, start_time, end_time, status";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id: row.get(0)?,
      date:       row.get(1)?,
      start_time: row.get(2)?,
      end_time:   row.get(3)?,
      status:     row.get(4)?,
    })
  }

  pub fn into_assigned(self) -> Result<(Uuid, AssignedClass)> {
    Ok((decode_uuid(&self.student_id)?, AssignedClass {
      date:       decode_date(&self.date)?,
      start_time: decode_time(&self.start_time)?,
      end_time:   decode_time(&self.end_time)?,
      status:     decode_enum("attendance", &self.status)?,
    }))
  }
}

pub struct RawSession {
  pub id:                    String,
  pub date:                  String,
  pub start_time:            String,
  pub end_time:              String,
  pub class_type:            String,
  pub teacher_id:            Option<String>,
  pub teacher_substitute_id: Option<String>,
  pub completed_at:          Option<String>,
  pub workshop_name:         Option<String>,
  pub private_reason:        Option<String>,
}

impl RawSession {
  pub const COLUMNS: &'static str = "id, date, start_time, end_time, class_type,
    teacher_id, teacher_substitute_id, completed_at, workshop_name, private_reason";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      date:                  row.get(1)?,
      start_time:            row.get(2)?,
      end_time:              row.get(3)?,
      class_type:            row.get(4)?,
      teacher_id:            row.get(5)?,
      teacher_substitute_id: row.get(6)?,
      completed_at:          row.get(7)?,
      workshop_name:         row.get(8)?,
      private_reason:        row.get(9)?,
    })
  }

  /// Build the session with an empty roster.
  pub fn into_session(self) -> Result<ClassSession> {
    Ok(ClassSession {
      id:                    decode_uuid(&self.id)?,
      date:                  decode_date(&self.date)?,
      start_time:            decode_time(&self.start_time)?,
      end_time:              decode_time(&self.end_time)?,
      class_type:            decode_enum("class type", &self.class_type)?,
      students:              Vec::new(),
      attendance:            AttendanceMap::new(),
      teacher_id:            decode_opt_uuid(self.teacher_id)?,
      teacher_substitute_id: decode_opt_uuid(self.teacher_substitute_id)?,
      completed_at:          self.completed_at.as_deref().map(decode_dt).transpose()?,
      workshop_name:         self.workshop_name,
      private_reason:        self.private_reason,
    })
  }
}

pub struct RawRoster {
  pub session_id:   String,
  pub student_id:   String,
  pub student_name: String,
  pub attendance:   String,
}

impl RawRoster {
  pub const COLUMNS: &'static str = "session_id, student_id, student_name, attendance";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:   row.get(0)?,
      student_id:   row.get(1)?,
      student_name: row.get(2)?,
      attendance:   row.get(3)?,
    })
  }

  pub fn into_entry(self) -> Result<RosterEntry> {
    Ok(RosterEntry {
      session_id:   decode_uuid(&self.session_id)?,
      student_id:   decode_uuid(&self.student_id)?,
      student_name: self.student_name,
      attendance:   decode_enum("attendance", &self.attendance)?,
    })
  }
}

pub struct RawTeacher {
  pub id:        String,
  pub name:      String,
  pub surname:   Option<String>,
  pub email:     Option<String>,
  pub phone:     Option<String>,
  pub specialty: Option<String>,
  pub notes:     Option<String>,
}

impl RawTeacher {
  pub const COLUMNS: &'static str = "id, name, surname, email, phone, specialty, notes";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      name:      row.get(1)?,
      surname:   row.get(2)?,
      email:     row.get(3)?,
      phone:     row.get(4)?,
      specialty: row.get(5)?,
      notes:     row.get(6)?,
    })
  }

  pub fn into_teacher(self) -> Result<Teacher> {
    Ok(Teacher {
      id:        decode_uuid(&self.id)?,
      name:      self.name,
      surname:   self.surname,
      email:     self.email,
      phone:     self.phone,
      specialty: self.specialty,
      notes:     self.notes,
    })
  }
}

pub struct RawPiece {
  pub id:               String,
  pub student_id:       Option<String>,
  pub owner_name:       String,
  pub description:      String,
  pub status:           String,
  pub glaze_type:       Option<String>,
  pub delivery_date:    Option<String>,
  pub notes:            Option<String>,
  pub extra_commentary: Option<String>,
}

impl RawPiece {
  pub const COLUMNS: &'static str = "id, student_id, owner_name, description, status,
    glaze_type, delivery_date, notes, extra_commentary";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      student_id:       row.get(1)?,
      owner_name:       row.get(2)?,
      description:      row.get(3)?,
      status:           row.get(4)?,
      glaze_type:       row.get(5)?,
      delivery_date:    row.get(6)?,
      notes:            row.get(7)?,
      extra_commentary: row.get(8)?,
    })
  }

  pub fn into_piece(self) -> Result<CeramicPiece> {
    Ok(CeramicPiece {
      id:               decode_uuid(&self.id)?,
      student_id:       decode_opt_uuid(self.student_id)?,
      owner:            self.owner_name,
      description:      self.description,
      status:           decode_enum("piece status", &self.status)?,
      glaze_type:       self.glaze_type,
      delivery_date:    decode_opt_date(self.delivery_date)?,
      notes:            self.notes,
      extra_commentary: self.extra_commentary,
    })
  }
}

pub struct RawGiftCard {
  pub id:               String,
  pub buyer:            String,
  pub recipient:        String,
  pub num_classes:      i32,
  pub card_type:        String,
  pub scheduled_date:   Option<String>,
  pub created_at:       String,
  pub extra_commentary: Option<String>,
}

impl RawGiftCard {
  pub const COLUMNS: &'static str = "id, buyer, recipient, num_classes, type,
    scheduled_date, created_at, extra_commentary";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      buyer:            row.get(1)?,
      recipient:        row.get(2)?,
      num_classes:      row.get(3)?,
      card_type:        row.get(4)?,
      scheduled_date:   row.get(5)?,
      created_at:       row.get(6)?,
      extra_commentary: row.get(7)?,
    })
  }

  pub fn into_gift_card(self) -> Result<GiftCard> {
    Ok(GiftCard {
      id:               decode_uuid(&self.id)?,
      buyer:            self.buyer,
      recipient:        self.recipient,
      num_classes:      self.num_classes,
      card_type:        decode_enum("gift card type", &self.card_type)?,
      scheduled_date:   decode_opt_date(self.scheduled_date)?,
      created_at:       decode_dt(&self.created_at)?,
      extra_commentary: self.extra_commentary,
    })
  }
}

pub struct RawItem {
  pub id:               String,
  pub category:         String,
  pub name:             String,
  pub code:             String,
  pub unit:             String,
  pub current_quantity: f64,
  pub min_quantity:     Option<f64>,
  pub location:         Option<String>,
  pub supplier:         Option<String>,
  pub supplier_code:    Option<String>,
  pub cost_per_unit:    Option<f64>,
  pub notes:            Option<String>,
  pub status:           String,
  pub details:          String,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawItem {
  pub const COLUMNS: &'static str = "id, category, name, code, unit, current_quantity,
    min_quantity, location, supplier, supplier_code, cost_per_unit, notes, status,
    details, created_at, updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      category:         row.get(1)?,
      name:             row.get(2)?,
      code:             row.get(3)?,
      unit:             row.get(4)?,
      current_quantity: row.get(5)?,
      min_quantity:     row.get(6)?,
      location:         row.get(7)?,
      supplier:         row.get(8)?,
      supplier_code:    row.get(9)?,
      cost_per_unit:    row.get(10)?,
      notes:            row.get(11)?,
      status:           row.get(12)?,
      details:          row.get(13)?,
      created_at:       row.get(14)?,
      updated_at:       row.get(15)?,
    })
  }

  pub fn into_item(self) -> Result<InventoryItem> {
    let details: ItemDetails = serde_json::from_str(&self.details)?;
    Ok(InventoryItem {
      id: decode_uuid(&self.id)?,
      category: decode_enum("inventory category", &self.category)?,
      name: self.name,
      code: self.code,
      unit: self.unit,
      current_quantity: self.current_quantity,
      min_quantity: self.min_quantity,
      location: self.location,
      supplier: self.supplier,
      supplier_code: self.supplier_code,
      cost_per_unit: self.cost_per_unit,
      notes: self.notes,
      status: decode_enum("item status", &self.status)?,
      details,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub fn encode_details(details: &ItemDetails) -> Result<String> {
  Ok(serde_json::to_string(details)?)
}

pub struct RawMovement {
  pub id:            String,
  pub item_id:       String,
  pub movement_type: String,
  pub quantity:      Option<f64>,
  pub reason:        String,
  pub created_at:    String,
}

impl RawMovement {
  pub const COLUMNS: &'static str =
    "id, inventory_item_id, type, quantity, reason, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      item_id:       row.get(1)?,
      movement_type: row.get(2)?,
      quantity:      row.get(3)?,
      reason:        row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_movement(self) -> Result<InventoryMovement> {
    Ok(InventoryMovement {
      id:            decode_uuid(&self.id)?,
      item_id:       decode_uuid(&self.item_id)?,
      movement_type: decode_enum("movement type", &self.movement_type)?,
      quantity:      self.quantity,
      reason:        self.reason,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

// ─── Directory rows ──────────────────────────────────────────────────────────

pub struct RawProfile {
  pub id:         String,
  pub email:      String,
  pub full_name:  Option<String>,
  pub phone:      Option<String>,
  pub role:       Option<String>,
  pub created_at: String,
}

impl RawProfile {
  pub const COLUMNS: &'static str = "id, email, full_name, phone, role, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      email:      row.get(1)?,
      full_name:  row.get(2)?,
      phone:      row.get(3)?,
      role:       row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:         decode_uuid(&self.id)?,
      email:      self.email,
      full_name:  self.full_name,
      phone:      self.phone,
      role:       self
        .role
        .as_deref()
        .map(|r| decode_enum::<Role>("role", r))
        .transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawWorkshop {
  pub id:            String,
  pub name:          String,
  pub slug:          String,
  pub address:       Option<String>,
  pub city:          Option<String>,
  pub country:       Option<String>,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
  pub owner_id:      Option<String>,
  pub is_active:     bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawWorkshop {
  pub const COLUMNS: &'static str = "id, name, slug, address, city, country,
    contact_email, contact_phone, owner_id, is_active, created_at, updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      name:          row.get(1)?,
      slug:          row.get(2)?,
      address:       row.get(3)?,
      city:          row.get(4)?,
      country:       row.get(5)?,
      contact_email: row.get(6)?,
      contact_phone: row.get(7)?,
      owner_id:      row.get(8)?,
      is_active:     row.get(9)?,
      created_at:    row.get(10)?,
      updated_at:    row.get(11)?,
    })
  }

  pub fn into_workshop(self) -> Result<Workshop> {
    Ok(Workshop {
      id:            decode_uuid(&self.id)?,
      name:          self.name,
      slug:          self.slug,
      address:       self.address,
      city:          self.city,
      country:       self.country,
      contact_email: self.contact_email,
      contact_phone: self.contact_phone,
      owner_id:      decode_opt_uuid(self.owner_id)?,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// A `sede_members` row joined with the member's profile.
pub struct RawStaff {
  pub user_id:    String,
  pub member_id:  String,
  pub email:      String,
  pub full_name:  Option<String>,
  pub role:       String,
  pub joined_at:  String,
  pub created_at: String,
}

impl RawStaff {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      member_id:  row.get(1)?,
      email:      row.get(2)?,
      full_name:  row.get(3)?,
      role:       row.get(4)?,
      joined_at:  row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_staff(self) -> Result<StaffMember> {
    Ok(StaffMember {
      id:         decode_uuid(&self.user_id)?,
      member_id:  decode_uuid(&self.member_id)?,
      name:       self.full_name.unwrap_or_else(|| self.email.clone()),
      email:      self.email,
      role:       decode_enum("role", &self.role)?,
      joined_at:  decode_dt(&self.joined_at)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
