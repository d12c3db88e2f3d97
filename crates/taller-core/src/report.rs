//! Read-only aggregates: the studio dashboard, the inventory health summary
//! and the franchise-wide workshop report.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  directory::Workshop,
  inventory::{Category, InventoryItem, StockHealth},
  session::{ClassSession, ClassType},
  student::Student,
};

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
  Critical,
  Warning,
}

/// Something about a student attending today that needs attention.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAlert {
  pub student_id: Uuid,
  pub name:       String,
  pub reason:     String,
  pub level:      AlertLevel,
}

/// Seat usage across today's sessions, using default capacities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Occupancy {
  pub total_spots:      u32,
  pub occupied_spots:   u32,
  pub wheel_spots:      u32,
  pub wheel_occupied:   u32,
  pub table_spots:      u32,
  pub table_occupied:   u32,
  /// Rounded percentage of wheel seats taken.
  pub wheel_percent:    u32,
  /// Table seats still free; negative when overbooked.
  pub free_table_spots: i64,
  pub global_percent:   u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
  pub date:            NaiveDate,
  /// Today's sessions ordered by start time.
  pub sessions:        Vec<ClassSession>,
  /// Distinct roster names across today's sessions.
  pub unique_students: usize,
  pub occupancy:       Occupancy,
  pub alerts:          Vec<StudentAlert>,
}

impl Dashboard {
  pub fn build(sessions: &[ClassSession], students: &[Student], today: NaiveDate) -> Self {
    let mut todays: Vec<ClassSession> =
      sessions.iter().filter(|s| s.date == today).cloned().collect();
    todays.sort_by_key(|s| s.start_time);

    // Insertion-ordered so alerts come out in roster order.
    let mut seen = HashSet::new();
    let names: Vec<String> = todays
      .iter()
      .flat_map(|s| s.students.iter().map(|n| n.to_uppercase()))
      .filter(|n| seen.insert(n.clone()))
      .collect();

    let mut occ = Occupancy::default();
    for s in &todays {
      let cap = s.class_type.default_capacity();
      let taken = s.students.len() as u32;
      occ.total_spots += cap;
      occ.occupied_spots += taken;
      if s.class_type == ClassType::Torno {
        occ.wheel_spots += cap;
        occ.wheel_occupied += taken;
      } else {
        occ.table_spots += cap;
        occ.table_occupied += taken;
      }
    }
    occ.wheel_percent = percent(occ.wheel_occupied, occ.wheel_spots);
    occ.global_percent = percent(occ.occupied_spots, occ.total_spots);
    occ.free_table_spots = i64::from(occ.table_spots) - i64::from(occ.table_occupied);

    let mut alerts = Vec::new();
    for name in &names {
      let Some(student) = students.iter().find(|s| s.roster_name() == *name) else {
        continue;
      };
      if student.classes_remaining <= 1 {
        alerts.push(StudentAlert {
          student_id: student.id,
          name:       student.full_name(),
          reason:     format!("Bono agotándose ({} rest.)", student.classes_remaining),
          level:      AlertLevel::Critical,
        });
      }
      if student.expiry_date.is_some_and(|d| d < today) {
        alerts.push(StudentAlert {
          student_id: student.id,
          name:       student.full_name(),
          reason:     "Fecha de bono expirada".to_string(),
          level:      AlertLevel::Warning,
        });
      }
    }

    Self {
      date: today,
      unique_students: names.len(),
      sessions: todays,
      occupancy: occ,
      alerts,
    }
  }
}

fn percent(part: u32, whole: u32) -> u32 {
  if whole == 0 {
    0
  } else {
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
  }
}

// ─── Inventory ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthCounts {
  pub ok:       usize,
  pub low:      usize,
  pub critical: usize,
}

impl HealthCounts {
  fn add(&mut self, health: StockHealth) {
    match health {
      StockHealth::Ok => self.ok += 1,
      StockHealth::Low => self.low += 1,
      StockHealth::Critical => self.critical += 1,
    }
  }

  pub fn total(&self) -> usize { self.ok + self.low + self.critical }
}

/// Health of active items, overall and per category. Archived items are not
/// counted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InventorySummary {
  pub overall:     HealthCounts,
  pub by_category: BTreeMap<Category, HealthCounts>,
  /// Active items below their minimum, critical first.
  pub attention:   Vec<Uuid>,
}

impl InventorySummary {
  pub fn build(items: &[InventoryItem]) -> Self {
    let mut summary = Self::default();
    let mut attention: Vec<(StockHealth, Uuid)> = Vec::new();

    for item in items.iter().filter(|i| i.is_active()) {
      let health = item.health();
      summary.overall.add(health);
      summary.by_category.entry(item.category).or_default().add(health);
      if health != StockHealth::Ok {
        attention.push((health, item.id));
      }
    }

    attention.sort_by(|a, b| b.0.cmp(&a.0));
    summary.attention = attention.into_iter().map(|(_, id)| id).collect();
    summary
  }
}

// ─── Workshops ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCount {
  pub country: String,
  pub city:    String,
  pub count:   usize,
}

/// Franchise-wide figures for the admin console.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkshopReport {
  pub total:          usize,
  pub active:         usize,
  /// Rounded percentage of active workshops.
  pub active_percent: u32,
  /// Workshops with no owner assigned.
  pub unassigned:     usize,
  pub users:          usize,
  pub by_country:     BTreeMap<String, usize>,
  pub by_city:        Vec<CityCount>,
}

impl WorkshopReport {
  pub fn build(workshops: &[Workshop], users: usize) -> Self {
    let mut report = Self {
      total: workshops.len(),
      users,
      ..Self::default()
    };

    for w in workshops {
      if w.is_active {
        report.active += 1;
      }
      if w.owner_id.is_none() {
        report.unassigned += 1;
      }
      let country = w.country.clone().unwrap_or_default();
      let city = w.city.clone().unwrap_or_default();
      *report.by_country.entry(country.clone()).or_default() += 1;
      match report
        .by_city
        .iter_mut()
        .find(|c| c.country == country && c.city == city)
      {
        Some(c) => c.count += 1,
        None => report.by_city.push(CityCount {
          country,
          city,
          count: 1,
        }),
      }
    }

    report.active_percent = percent(report.active as u32, report.total as u32);
    report
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    session::AttendanceMap,
    student::StudentStatus,
    time::parse_hhmm,
  };

  fn session(start: &str, class_type: ClassType, students: &[&str]) -> ClassSession {
    ClassSession {
      id: Uuid::new_v4(),
      date: "2026-01-07".parse().unwrap(),
      start_time: parse_hhmm(start).unwrap(),
      end_time: parse_hhmm("23:00").unwrap(),
      class_type,
      students: students.iter().map(|s| s.to_string()).collect(),
      attendance: AttendanceMap::new(),
      teacher_id: None,
      teacher_substitute_id: None,
      completed_at: None,
      workshop_name: None,
      private_reason: None,
    }
  }

  fn student(name: &str, surname: &str, remaining: i32, expiry: &str) -> Student {
    Student {
      id: Uuid::new_v4(),
      name: name.into(),
      surname: Some(surname.into()),
      email: None,
      phone: String::new(),
      phone_country: None,
      birth_day: None,
      birth_month: None,
      birth_year: None,
      classes_remaining: remaining,
      status: StudentStatus::Regular,
      payment_method: None,
      notes: None,
      observations: None,
      price: None,
      class_type: None,
      expiry_date: Some(expiry.parse().unwrap()),
      assigned_classes: vec![],
      created_at: Utc::now(),
    }
  }

  #[test]
  fn dashboard_for_a_day() {
    let today: NaiveDate = "2026-01-07".parse().unwrap();
    let sessions = vec![
      session("18:00", ClassType::Torno, &["MIGUEL ÁNGEL", "DAVID PÉREZ"]),
      session("10:00", ClassType::Mesa, &["ANA MARTÍNEZ", "SOFIA GÓMEZ"]),
      session("12:00", ClassType::Mesa, &["ANA MARTÍNEZ"]),
    ];
    let students = vec![
      student("Ana", "Martínez", 1, "2026-02-05"),
      student("Sofia", "Gómez", 2, "2026-01-01"),
      student("David", "Pérez", 5, "2026-03-10"),
    ];

    let d = Dashboard::build(&sessions, &students, today);
    assert_eq!(
      d.sessions.iter().map(|s| s.start_time).collect::<Vec<_>>(),
      vec![
        parse_hhmm("10:00").unwrap(),
        parse_hhmm("12:00").unwrap(),
        parse_hhmm("18:00").unwrap()
      ]
    );
    assert_eq!(d.unique_students, 4);
    assert_eq!(d.occupancy.total_spots, 21);
    assert_eq!(d.occupancy.occupied_spots, 5);
    assert_eq!(d.occupancy.wheel_percent, 40);
    assert_eq!(d.occupancy.free_table_spots, 13);
    assert_eq!(d.occupancy.global_percent, 24);

    assert_eq!(d.alerts.len(), 2);
    assert_eq!(d.alerts[0].name, "Ana Martínez");
    assert_eq!(d.alerts[0].level, AlertLevel::Critical);
    assert_eq!(d.alerts[0].reason, "Bono agotándose (1 rest.)");
    assert_eq!(d.alerts[1].name, "Sofia Gómez");
    assert_eq!(d.alerts[1].level, AlertLevel::Warning);
  }

  #[test]
  fn workshop_report_counts() {
    let now = Utc::now();
    let w = |country: &str, city: &str, active: bool, owner: bool| Workshop {
      id:            Uuid::new_v4(),
      name:          "Taller".into(),
      slug:          "taller".into(),
      address:       None,
      city:          Some(city.into()),
      country:       Some(country.into()),
      contact_email: None,
      contact_phone: None,
      owner_id:      owner.then(Uuid::new_v4),
      is_active:     active,
      created_at:    now,
      updated_at:    now,
    };
    let report = WorkshopReport::build(
      &[
        w("España", "Valencia", true, true),
        w("España", "Madrid", true, false),
        w("México", "Puebla", false, true),
      ],
      7,
    );
    assert_eq!(report.total, 3);
    assert_eq!(report.active, 2);
    assert_eq!(report.active_percent, 67);
    assert_eq!(report.unassigned, 1);
    assert_eq!(report.by_country.get("España"), Some(&2));
    assert_eq!(report.by_city.len(), 3);
    assert_eq!(report.users, 7);
  }
}
