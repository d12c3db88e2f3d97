//! Integration tests for `SqliteStore` and `SedeStore` against an in-memory
//! database.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use taller_core::{
  directory::{NewWorkshop, ProfileMeta, ProfilePatch, Role, WorkshopPatch},
  inventory::{Category, MovementType, NewItem, NewMovement},
  piece::{NewPiece, PieceStatus},
  session::{AttendanceMap, ClassType, NewSession, SessionPatch},
  store::{DirectoryStore, StudioStore, Tenancy},
  student::{AssignedClass, AttendanceStatus, NewStudent, StudentPatch},
  studio::Studio,
  teacher::NewTeacher,
  time::parse_hhmm,
};
use uuid::Uuid;

use crate::{Error, SedeStore, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn workshop(s: &SqliteStore, name: &str) -> Uuid {
  let input = NewWorkshop {
    name: name.to_string(),
    ..NewWorkshop::default()
  }
  .validated()
  .unwrap();
  s.insert_workshop(&input).await.unwrap().id
}

async fn studio(s: &SqliteStore) -> Studio<SedeStore> {
  let sede = workshop(s, "Taller Central").await;
  Studio::new(s.studio(sede))
}

fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

fn time(s: &str) -> NaiveTime { NaiveTime::parse_from_str(s, "%H:%M").unwrap() }

fn class(d: &str, start: &str, end: &str) -> AssignedClass {
  AssignedClass {
    date:       date(d),
    start_time: time(start),
    end_time:   time(end),
    status:     AttendanceStatus::Pending,
  }
}

fn session(d: &str, start: &str, end: &str, class_type: ClassType) -> NewSession {
  NewSession {
    date:                  date(d),
    start_time:            time(start),
    end_time:              time(end),
    class_type,
    students:              Vec::new(),
    attendance:            None,
    teacher_id:            None,
    teacher_substitute_id: None,
    workshop_name:         None,
    private_reason:        None,
  }
}

fn student(name: &str, surname: &str, classes: Vec<AssignedClass>) -> NewStudent {
  NewStudent {
    assigned_classes: classes,
    ..NewStudent::new(name, Some(surname))
  }
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_identity() {
  let s = store().await;
  let meta = ProfileMeta {
    full_name: Some("Lucía Pérez".into()),
    ..ProfileMeta::default()
  };

  let profile = s
    .create_identity("Lucia@Example.com", "$argon2id$hash", Some(Role::Tallerista), &meta)
    .await
    .unwrap();
  assert_eq!(profile.email, "lucia@example.com");
  assert_eq!(profile.role, Some(Role::Tallerista));

  let identity = s.find_identity("LUCIA@example.com").await.unwrap().unwrap();
  assert_eq!(identity.id, profile.id);
  assert_eq!(identity.password_hash, "$argon2id$hash");

  let fetched = s.get_profile(profile.id).await.unwrap().unwrap();
  assert_eq!(fetched.full_name.as_deref(), Some("Lucía Pérez"));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  let meta = ProfileMeta::default();
  s.create_identity("a@b.com", "h", None, &meta).await.unwrap();

  let err = s
    .create_identity("A@B.com", "h", None, &meta)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmailTaken(_)));
  assert!(err.is_unique_violation());
  assert_eq!(s.list_profiles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn tokens_resolve_until_expiry_or_revocation() {
  let s = store().await;
  let profile = s
    .create_identity("t@t.com", "h", None, &ProfileMeta::default())
    .await
    .unwrap();
  let now = Utc::now();

  s.insert_token(profile.id, "live", now + Duration::hours(1))
    .await
    .unwrap();
  s.insert_token(profile.id, "stale", now - Duration::minutes(1))
    .await
    .unwrap();

  assert_eq!(s.resolve_token("live", now).await.unwrap(), Some(profile.id));
  assert_eq!(s.resolve_token("stale", now).await.unwrap(), None);
  assert_eq!(s.resolve_token("unknown", now).await.unwrap(), None);

  assert!(s.revoke_token("live").await.unwrap());
  assert_eq!(s.resolve_token("live", now).await.unwrap(), None);
}

#[tokio::test]
async fn deleting_identity_drops_its_tokens() {
  let s = store().await;
  let profile = s
    .create_identity("d@d.com", "h", None, &ProfileMeta::default())
    .await
    .unwrap();
  let now = Utc::now();
  s.insert_token(profile.id, "tok", now + Duration::hours(1))
    .await
    .unwrap();

  assert!(s.delete_identity(profile.id).await.unwrap());
  assert_eq!(s.resolve_token("tok", now).await.unwrap(), None);
  assert!(s.find_identity("d@d.com").await.unwrap().is_none());
}

#[tokio::test]
async fn update_profile_keeps_absent_fields() {
  let s = store().await;
  let meta = ProfileMeta {
    full_name: Some("Ana".into()),
    phone: Some("600".into()),
    ..ProfileMeta::default()
  };
  let profile = s.create_identity("p@p.com", "h", None, &meta).await.unwrap();

  let updated = s
    .update_profile(profile.id, &ProfilePatch {
      full_name: Some("Ana María".into()),
      phone:     None,
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.full_name.as_deref(), Some("Ana María"));
  assert_eq!(updated.phone.as_deref(), Some("600"));

  assert!(s.update_profile(Uuid::new_v4(), &ProfilePatch::default()).await.unwrap().is_none());
}

// ─── Workshops ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn workshop_owner_lookup_and_rename() {
  let s = store().await;
  let owner = s
    .create_identity("o@o.com", "h", Some(Role::Tallerista), &ProfileMeta::default())
    .await
    .unwrap();
  let input = NewWorkshop::for_owner(owner.id, "Marta", &ProfileMeta {
    city: Some("Valencia".into()),
    country: Some("España".into()),
    ..ProfileMeta::default()
  });
  let created = s.insert_workshop(&input).await.unwrap();
  assert_eq!(created.name, "Taller de Marta");
  assert_eq!(created.slug, "marta");
  assert!(created.is_active);

  let owned = s.owned_workshop(owner.id).await.unwrap().unwrap();
  assert_eq!(owned.id, created.id);

  let patch = WorkshopPatch {
    name: Some("Cerámica Turia".into()),
    is_active: Some(false),
    ..WorkshopPatch::default()
  }
  .with_derived_slug();
  let renamed = s.update_workshop(created.id, &patch).await.unwrap().unwrap();
  assert_eq!(renamed.slug, "ceramica-turia");
  assert!(!renamed.is_active);
  assert_eq!(renamed.city.as_deref(), Some("Valencia"));
}

#[tokio::test]
async fn purge_removes_every_studio_row() {
  let s = store().await;
  let studio = studio(&s).await;
  let sede = studio.sede_id();

  studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();
  studio
    .add_teacher(NewTeacher {
      name: "Rosa".into(),
      ..NewTeacher::default()
    })
    .await
    .unwrap();
  let item = studio
    .add_item(NewItem::new(Category::Clay, "Gres", "gr-1"))
    .await
    .unwrap();
  studio
    .record_movement(NewMovement {
      item_id:       item.id,
      movement_type: MovementType::In,
      quantity:      Some(5.0),
      new_quantity:  None,
      reason:        "Compra".into(),
      notes:         None,
    })
    .await
    .unwrap();
  let user = s
    .create_identity("staff@t.com", "h", Some(Role::Staff), &ProfileMeta::default())
    .await
    .unwrap();
  s.add_member(sede, user.id).await.unwrap();

  assert!(s.purge_workshop(sede).await.unwrap());
  assert!(s.get_workshop(sede).await.unwrap().is_none());

  let orphan = s.studio(sede);
  assert!(orphan.list_students().await.unwrap().is_empty());
  assert!(orphan.list_sessions().await.unwrap().is_empty());
  assert!(orphan.list_items().await.unwrap().is_empty());
  assert!(orphan.list_movements().await.unwrap().is_empty());
  assert!(s.membership(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn staff_membership() {
  let s = store().await;
  let sede = workshop(&s, "Taller Norte").await;
  let user = s
    .create_identity("m@m.com", "h", Some(Role::Staff), &ProfileMeta {
      full_name: Some("Marcos".into()),
      ..ProfileMeta::default()
    })
    .await
    .unwrap();

  let member_id = s.add_member(sede, user.id).await.unwrap();
  assert_eq!(s.membership(user.id).await.unwrap(), Some(sede));

  let staff = s.list_staff(sede).await.unwrap();
  assert_eq!(staff.len(), 1);
  assert_eq!(staff[0].id, user.id);
  assert_eq!(staff[0].member_id, member_id);
  assert_eq!(staff[0].name, "Marcos");
  assert_eq!(staff[0].role, Role::Staff);

  assert!(s.remove_member(sede, user.id).await.unwrap());
  assert!(s.list_staff(sede).await.unwrap().is_empty());
}

// ─── Tenancy ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn workshops_do_not_see_each_other() {
  let s = store().await;
  let north = Studio::new(s.studio(workshop(&s, "Norte").await));
  let south = Studio::new(s.studio(workshop(&s, "Sur").await));

  let ana = north.add_student(NewStudent::new("Ana", None)).await.unwrap();
  assert_eq!(north.list_students().await.unwrap().len(), 1);
  assert!(south.list_students().await.unwrap().is_empty());
  assert!(south.store().get_student(ana.id).await.unwrap().is_none());
  assert!(!south.store().delete_student(ana.id).await.unwrap());
}

// ─── Assigned classes and rosters ────────────────────────────────────────────

#[tokio::test]
async fn assigned_class_creates_session_and_roster_row() {
  let s = store().await;
  let studio = studio(&s).await;

  let ana = studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();
  assert_eq!(ana.assigned_classes.len(), 1);

  let sessions = studio.list_sessions().await.unwrap();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].class_type, ClassType::Mesa);
  assert_eq!(sessions[0].students, vec!["ANA MARTÍNEZ".to_string()]);
}

#[tokio::test]
async fn two_slots_on_same_new_date_reuse_created_session() {
  let s = store().await;
  let studio = studio(&s).await;

  studio
    .add_student(NewStudent {
      class_type: Some("Torno".into()),
      ..student("Ana", "Martínez", vec![
        class("2025-03-10", "10:00", "12:00"),
        class("2025-03-10", "10:00", "13:00"),
      ])
    })
    .await
    .unwrap();

  let sessions = studio.list_sessions().await.unwrap();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].class_type, ClassType::Torno);
}

#[tokio::test]
async fn slot_with_seconds_is_resaved_onto_the_same_session() {
  let s = store().await;
  let studio = studio(&s).await;
  let slot = AssignedClass {
    start_time: parse_hhmm("10:00:30").unwrap(),
    ..class("2025-03-10", "10:00", "12:00")
  };

  let ana = studio
    .add_student(student("Ana", "Martínez", vec![slot.clone()]))
    .await
    .unwrap();
  assert_eq!(ana.assigned_classes[0].start_time, time("10:00"));

  studio
    .update_student(ana.id, StudentPatch {
      assigned_classes: Some(vec![slot]),
      ..StudentPatch::default()
    })
    .await
    .unwrap();

  let sessions = studio.list_sessions().await.unwrap();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].students, vec!["ANA MARTÍNEZ".to_string()]);
  let ana = studio.get_student(ana.id).await.unwrap();
  assert_eq!(ana.assigned_classes.len(), 1);
}

#[tokio::test]
async fn slot_on_a_holiday_joins_the_holiday_session() {
  let s = store().await;
  let studio = studio(&s).await;
  let holiday = studio
    .add_session(session("2025-03-10", "10:00", "12:00", ClassType::Feriado))
    .await
    .unwrap();

  studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();

  let sessions = studio.list_sessions().await.unwrap();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].id, holiday.id);
  assert_eq!(sessions[0].class_type, ClassType::Feriado);
  assert_eq!(sessions[0].students, vec!["ANA MARTÍNEZ".to_string()]);
}

#[tokio::test]
async fn removing_a_slot_leaves_other_students_on_the_roster() {
  let s = store().await;
  let studio = studio(&s).await;

  let ana = studio
    .add_student(student("Ana", "Martínez", vec![
      class("2025-03-10", "10:00", "12:00"),
      class("2025-03-12", "10:00", "12:00"),
    ]))
    .await
    .unwrap();
  studio
    .add_student(student("Sofía", "Gómez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();

  studio
    .update_student(ana.id, StudentPatch {
      assigned_classes: Some(vec![class("2025-03-12", "10:00", "12:00")]),
      ..StudentPatch::default()
    })
    .await
    .unwrap();

  let sessions = studio.list_sessions().await.unwrap();
  let monday = sessions.iter().find(|s| s.date == date("2025-03-10")).unwrap();
  assert_eq!(monday.students, vec!["SOFÍA GÓMEZ".to_string()]);
  let wednesday = sessions.iter().find(|s| s.date == date("2025-03-12")).unwrap();
  assert_eq!(wednesday.students, vec!["ANA MARTÍNEZ".to_string()]);

  let ana = studio.get_student(ana.id).await.unwrap();
  assert_eq!(ana.assigned_classes, vec![class("2025-03-12", "10:00", "12:00")]);
}

#[tokio::test]
async fn removing_a_slot_without_session_is_not_an_error() {
  let s = store().await;
  let studio = studio(&s).await;

  let ana = studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();
  let created = studio.list_sessions().await.unwrap();
  studio.delete_session(created[0].id).await.unwrap();

  let updated = studio
    .update_student(ana.id, StudentPatch {
      assigned_classes: Some(Vec::new()),
      ..StudentPatch::default()
    })
    .await
    .unwrap();
  assert!(updated.assigned_classes.is_empty());
  assert!(studio.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn renewal_adds_credits_and_regularises() {
  let s = store().await;
  let studio = studio(&s).await;
  let ana = studio
    .add_student(NewStudent {
      classes_remaining: 1,
      ..NewStudent::new("Ana", None)
    })
    .await
    .unwrap();

  let renewed = studio.renew_student(ana.id, None).await.unwrap();
  assert_eq!(renewed.classes_remaining, 5);
  assert_eq!(renewed.status.as_ref(), "regular");
}

#[tokio::test]
async fn renewal_past_the_credit_ceiling_leaves_student_untouched() {
  let s = store().await;
  let studio = studio(&s).await;
  let ana = studio
    .add_student(NewStudent {
      classes_remaining: i32::MAX,
      ..NewStudent::new("Ana", None)
    })
    .await
    .unwrap();

  let err = studio.renew_student(ana.id, Some(4)).await.unwrap_err();
  assert!(matches!(err, taller_core::Error::InvalidQuantity(_)));
  assert_eq!(studio.get_student(ana.id).await.unwrap().classes_remaining, i32::MAX);
}

#[tokio::test]
async fn status_is_derived_on_create() {
  let s = store().await;
  let studio = studio(&s).await;

  let paid = studio
    .add_student(NewStudent {
      classes_remaining: 4,
      ..NewStudent::new("Ana", None)
    })
    .await
    .unwrap();
  assert_eq!(paid.status.as_ref(), "regular");

  let empty = studio.add_student(NewStudent::new("Luis", None)).await.unwrap();
  assert_eq!(empty.status.as_ref(), "needs_renewal");

  let expired = studio
    .add_student(NewStudent {
      classes_remaining: 4,
      expiry_date: Some(date("2000-01-01")),
      ..NewStudent::new("Eva", None)
    })
    .await
    .unwrap();
  assert_eq!(expired.status.as_ref(), "needs_renewal");

  let unpaid = studio
    .add_student(NewStudent {
      classes_remaining: 4,
      payment_pending: true,
      ..NewStudent::new("Sol", None)
    })
    .await
    .unwrap();
  assert_eq!(unpaid.status.as_ref(), "needs_renewal");
}

#[tokio::test]
async fn status_follows_credit_and_payment_edits() {
  let s = store().await;
  let studio = studio(&s).await;
  let ana = studio
    .add_student(NewStudent {
      classes_remaining: 4,
      payment_pending: true,
      ..NewStudent::new("Ana", None)
    })
    .await
    .unwrap();

  // Unrelated edits keep the stored status.
  let noted = studio
    .update_student(ana.id, StudentPatch {
      notes: Some("prefiere torno".into()),
      ..StudentPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(noted.status.as_ref(), "needs_renewal");

  // Still unpaid after adding credits.
  let topped = studio
    .update_student(ana.id, StudentPatch {
      classes_remaining: Some(6),
      ..StudentPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(topped.status.as_ref(), "needs_renewal");

  let paid = studio
    .update_student(ana.id, StudentPatch {
      payment_pending: Some(false),
      ..StudentPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(paid.status.as_ref(), "regular");

  let used_up = studio
    .update_student(ana.id, StudentPatch {
      classes_remaining: Some(0),
      ..StudentPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(used_up.status.as_ref(), "needs_renewal");
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn same_slot_different_type_is_allowed() {
  let s = store().await;
  let studio = studio(&s).await;

  studio
    .add_session(session("2025-03-10", "10:00", "12:00", ClassType::Torno))
    .await
    .unwrap();
  studio
    .add_session(session("2025-03-10", "10:00", "12:00", ClassType::Coworking))
    .await
    .unwrap();
  let dup = studio
    .add_session(session("2025-03-10", "10:00", "12:00", ClassType::Torno))
    .await;
  assert!(matches!(dup, Err(taller_core::Error::DuplicateSession(_))));
  assert_eq!(studio.list_sessions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn mesa_session_needs_a_teacher() {
  let s = store().await;
  let studio = studio(&s).await;

  let err = studio
    .add_session(session("2025-03-10", "10:00", "12:00", ClassType::Mesa))
    .await
    .unwrap_err();
  assert!(err.is_validation());

  let rosa = studio
    .add_teacher(NewTeacher {
      name: "Rosa".into(),
      ..NewTeacher::default()
    })
    .await
    .unwrap();
  let created = studio
    .add_session(NewSession {
      teacher_id: Some(rosa.id),
      ..session("2025-03-10", "10:00", "12:00", ClassType::Mesa)
    })
    .await
    .unwrap();
  assert_eq!(created.teacher_id, Some(rosa.id));
}

#[tokio::test]
async fn roster_sync_by_name_and_attendance_mirroring() {
  let s = store().await;
  let studio = studio(&s).await;

  let ana = studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();
  studio.add_student(NewStudent::new("Sofía", Some("Gómez"))).await.unwrap();
  let session_id = studio.list_sessions().await.unwrap()[0].id;

  let synced = studio
    .update_session(session_id, SessionPatch {
      students: Some(vec!["sofía gómez".into(), "Nadie Conocido".into()]),
      ..SessionPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(synced.students, vec!["SOFÍA GÓMEZ".to_string()]);

  studio
    .update_session(session_id, SessionPatch {
      students: Some(vec!["SOFÍA GÓMEZ".into(), "ANA MARTÍNEZ".into()]),
      ..SessionPatch::default()
    })
    .await
    .unwrap();

  let mut marks = AttendanceMap::new();
  marks.insert("ANA MARTÍNEZ".into(), AttendanceStatus::Present);
  marks.insert("SOMEONE ELSE".into(), AttendanceStatus::Absent);
  let marked = studio.set_attendance(session_id, marks).await.unwrap();
  assert_eq!(marked.attendance.len(), 1);
  assert_eq!(marked.attendance.get("ANA MARTÍNEZ"), Some(&AttendanceStatus::Present));

  let ana = studio.get_student(ana.id).await.unwrap();
  assert_eq!(ana.assigned_classes[0].status, AttendanceStatus::Present);
}

#[tokio::test]
async fn empty_student_list_clears_roster() {
  let s = store().await;
  let studio = studio(&s).await;
  studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();
  let session_id = studio.list_sessions().await.unwrap()[0].id;

  let cleared = studio
    .update_session(session_id, SessionPatch {
      students: Some(Vec::new()),
      ..SessionPatch::default()
    })
    .await
    .unwrap();
  assert!(cleared.students.is_empty());
}

#[tokio::test]
async fn holiday_drops_roster() {
  let s = store().await;
  let studio = studio(&s).await;
  studio
    .add_student(student("Ana", "Martínez", vec![class("2025-03-10", "10:00", "12:00")]))
    .await
    .unwrap();
  let session_id = studio.list_sessions().await.unwrap()[0].id;

  let holiday = studio
    .update_session(session_id, SessionPatch {
      class_type: Some(ClassType::Feriado),
      students: Some(vec!["ANA MARTÍNEZ".into()]),
      ..SessionPatch::default()
    })
    .await
    .unwrap();
  assert_eq!(holiday.class_type, ClassType::Feriado);
  assert!(holiday.students.is_empty());
}

// ─── Pieces ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn piece_links_owner_and_advances_to_delivery() {
  let s = store().await;
  let studio = studio(&s).await;
  let ana = studio.add_student(NewStudent::new("Ana", Some("Martínez"))).await.unwrap();

  let piece = studio
    .add_piece(NewPiece {
      owner: "ana martínez".into(),
      description: "Cuenco".into(),
      ..NewPiece::default()
    })
    .await
    .unwrap();
  assert_eq!(piece.student_id, Some(ana.id));
  assert_eq!(piece.status, PieceStatus::FirstFiring);

  let mut current = piece;
  for _ in 0..3 {
    current = studio.advance_piece(current.id).await.unwrap();
  }
  assert_eq!(current.status, PieceStatus::Delivered);

  let err = studio.advance_piece(current.id).await.unwrap_err();
  assert!(matches!(err, taller_core::Error::PieceAlreadyDelivered(_)));
}

// ─── Inventory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn movements_append_and_only_new_quantity_sets_stock() {
  let s = store().await;
  let studio = studio(&s).await;
  let item = studio
    .add_item(NewItem {
      current_quantity: 10.0,
      min_quantity: Some(4.0),
      ..NewItem::new(Category::Glaze, "Celadón", " es-01 ")
    })
    .await
    .unwrap();
  assert_eq!(item.code, "ES-01");

  studio
    .record_movement(NewMovement {
      item_id:       item.id,
      movement_type: MovementType::Out,
      quantity:      Some(3.0),
      new_quantity:  None,
      reason:        "Clase".into(),
      notes:         None,
    })
    .await
    .unwrap();
  let unchanged = studio.store().get_item(item.id).await.unwrap().unwrap();
  assert_eq!(unchanged.current_quantity, 10.0);

  let adjusted = studio
    .record_movement(NewMovement {
      item_id:       item.id,
      movement_type: MovementType::Adjust,
      quantity:      None,
      new_quantity:  Some(2.5),
      reason:        "Recuento".into(),
      notes:         Some("estante B".into()),
    })
    .await
    .unwrap();
  assert_eq!(adjusted.reason, "Recuento (Nota: estante B) [Stock: 2.5]");

  let item = studio.store().get_item(item.id).await.unwrap().unwrap();
  assert_eq!(item.current_quantity, 2.5);

  let ledger = studio.list_movements().await.unwrap();
  assert_eq!(ledger.len(), 2);
  assert_eq!(ledger[0].id, adjusted.id);

  let summary = studio.inventory_summary().await.unwrap();
  assert_eq!(summary.attention, vec![item.id]);
}

#[tokio::test]
async fn duplicate_item_code_is_rejected() {
  let s = store().await;
  let studio = studio(&s).await;
  studio
    .add_item(NewItem::new(Category::Oxide, "Cobalto", "OX-1"))
    .await
    .unwrap();
  let err = studio
    .add_item(NewItem::new(Category::Oxide, "Cobalto fino", "ox-1"))
    .await
    .unwrap_err();
  assert!(matches!(err, taller_core::Error::DuplicateCode(_)));
}

#[tokio::test]
async fn archiving_keeps_item_listed() {
  let s = store().await;
  let studio = studio(&s).await;
  let item = studio
    .add_item(NewItem::new(Category::Engobe, "Blanco", "EN-1"))
    .await
    .unwrap();

  let archived = studio.archive_item(item.id).await.unwrap();
  assert!(!archived.is_active());
  assert_eq!(studio.list_items().await.unwrap().len(), 1);
}
