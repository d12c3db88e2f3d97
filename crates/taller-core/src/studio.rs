//! The per-workshop console operations.
//!
//! [`Studio`] composes single-table store writes into the sequences the
//! console performs: persisting a student's assigned classes and mirroring
//! them onto session rosters, syncing a session roster by name, and applying
//! inventory movements.
//!
//! None of these sequences is atomic. The first write of an operation
//! propagates its error; the follow-up reconciliation writes are attempted one
//! slot or row at a time, and a failure there is logged and skipped without
//! undoing what was already written.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  gift_card::{GiftCard, GiftCardPatch, NewGiftCard},
  inventory::{InventoryItem, InventoryMovement, ItemPatch, NewItem, NewMovement},
  piece::{CeramicPiece, NewPiece, PiecePatch},
  report::{Dashboard, InventorySummary},
  session::{
    AttendanceMap, ClassSession, ClassType, NewSession, RosterEntry, SessionPatch, find_by_slot,
    find_by_start, mark_for,
  },
  store::StudioStore,
  student::{
    AssignedClass, AttendanceStatus, NewStudent, SlotKey, Student, StudentPatch, StudentStatus,
    diff_assigned,
  },
  teacher::{NewTeacher, Teacher, TeacherPatch},
};

/// Credits added by a renewal when the caller does not say otherwise.
pub const DEFAULT_RENEWAL: i32 = 4;

/// Everything the console shows, loaded in one go.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
  pub students:   Vec<Student>,
  pub sessions:   Vec<ClassSession>,
  pub teachers:   Vec<Teacher>,
  pub pieces:     Vec<CeramicPiece>,
  pub gift_cards: Vec<GiftCard>,
  pub items:      Vec<InventoryItem>,
  pub movements:  Vec<InventoryMovement>,
}

/// Console operations over one workshop's store.
#[derive(Debug, Clone)]
pub struct Studio<S> {
  store: S,
}

impl<S: StudioStore> Studio<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  pub fn sede_id(&self) -> Uuid { self.store.sede_id() }

  /// Reload every table.
  pub async fn snapshot(&self) -> Result<Snapshot> {
    Ok(Snapshot {
      students:   self.store.list_students().await.map_err(Error::store)?,
      sessions:   self.store.list_sessions().await.map_err(Error::store)?,
      teachers:   self.store.list_teachers().await.map_err(Error::store)?,
      pieces:     self.store.list_pieces().await.map_err(Error::store)?,
      gift_cards: self.store.list_gift_cards().await.map_err(Error::store)?,
      items:      self.store.list_items().await.map_err(Error::store)?,
      movements:  self.store.list_movements().await.map_err(Error::store)?,
    })
  }

  // ─── Students ─────────────────────────────────────────────────────────────

  pub async fn list_students(&self) -> Result<Vec<Student>> {
    self.store.list_students().await.map_err(Error::store)
  }

  pub async fn get_student(&self, id: Uuid) -> Result<Student> {
    self
      .store
      .get_student(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::StudentNotFound(id))
  }

  /// Insert a student, then persist its assigned classes and put it on the
  /// roster of each slot. The stored status is derived from the credits,
  /// expiry date and payment flag.
  pub async fn add_student(&self, mut input: NewStudent) -> Result<Student> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
      return Err(Error::MissingField("name"));
    }
    input.status = StudentStatus::derive(
      input.classes_remaining,
      input.expiry_date,
      input.payment_pending,
      today(),
    );

    let student = self.store.insert_student(&input).await.map_err(Error::store)?;
    tracing::info!(student = %student.id, sede = %self.sede_id(), "student created");

    if !input.assigned_classes.is_empty() {
      let mut sessions = self.store.list_sessions().await.map_err(Error::store)?;
      self
        .store
        .replace_assigned_classes(student.id, &input.assigned_classes)
        .await
        .map_err(Error::store)?;
      self
        .add_to_rosters(&student, &input.assigned_classes, &mut sessions)
        .await;
    }

    self.get_student(student.id).await
  }

  /// Update a student. When the patch carries `assigned_classes`, the full
  /// list is persisted first, the student is taken off the rosters of slots
  /// that were dropped, and every listed slot is upserted onto its session
  /// roster.
  ///
  /// A patch that changes credits, expiry or payment without naming a status
  /// gets the status re-derived against the merged values.
  pub async fn update_student(&self, id: Uuid, mut patch: StudentPatch) -> Result<Student> {
    let previous = self.get_student(id).await?;

    if patch.status.is_none() && patch.touches_status_inputs() {
      patch.status = Some(StudentStatus::derive(
        patch.classes_remaining.unwrap_or(previous.classes_remaining),
        patch.expiry_date.or(previous.expiry_date),
        patch
          .payment_pending
          .unwrap_or_else(|| previous.payment_pending()),
        today(),
      ));
    }

    let updated = self
      .store
      .update_student(id, &patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::StudentNotFound(id))?;

    if let Some(next) = &patch.assigned_classes {
      let diff = diff_assigned(&previous.assigned_classes, next);
      let mut sessions = self.store.list_sessions().await.map_err(Error::store)?;

      self
        .store
        .replace_assigned_classes(id, next)
        .await
        .map_err(Error::store)?;
      self
        .remove_from_rosters(&updated, &diff.removed, &sessions)
        .await;
      self.add_to_rosters(&updated, next, &mut sessions).await;

      tracing::debug!(
        student = %id,
        removed = diff.removed.len(),
        added = diff.added.len(),
        "assigned classes reconciled"
      );
    }

    self.get_student(id).await
  }

  /// Add `n` credits and mark the student regular.
  pub async fn renew_student(&self, id: Uuid, n: Option<i32>) -> Result<Student> {
    let student = self.get_student(id).await?;
    let n = n.unwrap_or(DEFAULT_RENEWAL);
    if n <= 0 {
      return Err(Error::InvalidQuantity(format!("renewal of {n} classes")));
    }
    let patch = StudentPatch::renewal(student.classes_remaining, n)?;
    self.update_student(id, patch).await
  }

  pub async fn delete_student(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_student(id).await.map_err(Error::store)? {
      return Err(Error::StudentNotFound(id));
    }
    tracing::info!(student = %id, "student deleted");
    Ok(())
  }

  /// Take `student` off the roster of each removed slot. A slot whose session
  /// cannot be found is skipped.
  async fn remove_from_rosters(
    &self,
    student: &Student,
    removed: &[AssignedClass],
    sessions: &[ClassSession],
  ) {
    for class in removed {
      let key = class.key();
      let session_id = match find_by_slot(sessions, key) {
        Some(s) => s.id,
        None => match self.store.find_session_by_slot(key).await {
          Ok(Some(s)) => s.id,
          Ok(None) => {
            tracing::debug!(student = %student.id, slot = %key, "no session for removed slot");
            continue;
          }
          Err(e) => {
            tracing::warn!(student = %student.id, slot = %key, error = %e, "session lookup failed");
            continue;
          }
        },
      };

      if let Err(e) = self
        .store
        .delete_roster_students(session_id, &[student.id])
        .await
      {
        tracing::warn!(
          student = %student.id,
          session = %session_id,
          error = %e,
          "failed to remove student from roster"
        );
      }
    }
  }

  /// Upsert `student` onto the roster of every slot in `classes`, creating a
  /// bare session when no session starts at that date and time.
  async fn add_to_rosters(
    &self,
    student: &Student,
    classes: &[AssignedClass],
    sessions: &mut Vec<ClassSession>,
  ) {
    let name = student.roster_name();
    let inferred = ClassType::infer_from_declared(student.class_type.as_deref());

    for class in classes {
      let key = class.key();
      let session_id = match find_by_start(sessions, key.date, key.start) {
        Some(s) => s.id,
        None => {
          match self
            .store
            .insert_session(&NewSession::bare(key, inferred))
            .await
          {
            Ok(created) => {
              tracing::info!(session = %created.id, slot = %key, "session created for assigned class");
              let id = created.id;
              sessions.push(created);
              id
            }
            Err(e) => {
              tracing::warn!(slot = %key, error = %e, "failed to create session for assigned class");
              continue;
            }
          }
        }
      };

      let entry = RosterEntry {
        session_id,
        student_id: student.id,
        student_name: name.clone(),
        attendance: class.status,
      };
      if let Err(e) = self.store.upsert_roster(&entry).await {
        tracing::warn!(
          student = %student.id,
          session = %session_id,
          error = %e,
          "failed to upsert roster row"
        );
      }
    }
  }

  // ─── Sessions ─────────────────────────────────────────────────────────────

  pub async fn list_sessions(&self) -> Result<Vec<ClassSession>> {
    self.store.list_sessions().await.map_err(Error::store)
  }

  pub async fn get_session(&self, id: Uuid) -> Result<ClassSession> {
    self
      .store
      .get_session(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SessionNotFound(id))
  }

  /// Validate and insert a session, then sync its roster by name.
  pub async fn add_session(&self, input: NewSession) -> Result<ClassSession> {
    let input = input.normalized();
    let existing = self.store.list_sessions().await.map_err(Error::store)?;
    input.validate(&existing, None)?;

    let session = self.store.insert_session(&input).await.map_err(Error::store)?;
    tracing::info!(session = %session.id, slot = %session.slot(), "session created");

    if !input.students.is_empty() {
      self
        .sync_roster(&session, &input.students, input.attendance.as_ref())
        .await;
    }

    self.get_session(session.id).await
  }

  /// Update a session row and, depending on the patch, its roster.
  ///
  /// A schedule change is validated against the merged session. Turning a
  /// session into a holiday clears its roster. A `students` list syncs the
  /// roster by name; otherwise an `attendance` map rewrites the marks of the
  /// existing rows.
  pub async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<ClassSession> {
    let current = self.get_session(id).await?;

    if patch.touches_schedule() {
      let existing = self.store.list_sessions().await.map_err(Error::store)?;
      patch.merged(&current).validate(&existing, Some(id))?;
    }

    let session = if patch.touches_row() {
      self
        .store
        .update_session(id, &patch)
        .await
        .map_err(Error::store)?
        .ok_or(Error::SessionNotFound(id))?
    } else {
      current
    };

    if session.class_type == ClassType::Feriado {
      if patch.class_type == Some(ClassType::Feriado) {
        if let Err(e) = self.store.clear_roster(id).await {
          tracing::warn!(session = %id, error = %e, "failed to clear holiday roster");
        }
      }
    } else if let Some(students) = &patch.students {
      self
        .sync_roster(&session, students, patch.attendance.as_ref())
        .await;
    } else if let Some(attendance) = &patch.attendance {
      self.rewrite_attendance(&session, attendance).await;
    }

    self.get_session(id).await
  }

  /// Overwrite the attendance of every roster row from `attendance`. Rows
  /// missing from the map go back to pending; names not on the roster are
  /// ignored.
  pub async fn set_attendance(&self, id: Uuid, attendance: AttendanceMap) -> Result<ClassSession> {
    let session = self.get_session(id).await?;
    self.rewrite_attendance(&session, &attendance).await;
    self.get_session(id).await
  }

  pub async fn delete_session(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_session(id).await.map_err(Error::store)? {
      return Err(Error::SessionNotFound(id));
    }
    tracing::info!(session = %id, "session deleted");
    Ok(())
  }

  /// Make the roster of `session` hold exactly `names`.
  ///
  /// Rows whose name is not wanted are deleted. Wanted names without a row are
  /// resolved to a student by full name and inserted; names that match no
  /// student are dropped. When `attendance` is given, the marks of the rows
  /// that were kept are rewritten as well.
  async fn sync_roster(
    &self,
    session: &ClassSession,
    names: &[String],
    attendance: Option<&AttendanceMap>,
  ) {
    let wanted: Vec<String> = names.iter().map(|n| n.trim().to_uppercase()).collect();

    if wanted.is_empty() {
      if let Err(e) = self.store.clear_roster(session.id).await {
        tracing::warn!(session = %session.id, error = %e, "failed to clear roster");
      }
      return;
    }

    let existing = match self.store.roster(session.id).await {
      Ok(rows) => rows,
      Err(e) => {
        tracing::warn!(session = %session.id, error = %e, "failed to load roster");
        return;
      }
    };

    let wanted_set: HashSet<&str> = wanted.iter().map(String::as_str).collect();
    let (kept, dropped): (Vec<RosterEntry>, Vec<RosterEntry>) = existing
      .into_iter()
      .partition(|r| wanted_set.contains(r.student_name.to_uppercase().as_str()));

    if !dropped.is_empty() {
      let ids: Vec<Uuid> = dropped.iter().map(|r| r.student_id).collect();
      if let Err(e) = self.store.delete_roster_students(session.id, &ids).await {
        tracing::warn!(session = %session.id, error = %e, "failed to drop roster rows");
      }
    }

    let present: HashSet<String> = kept.iter().map(|r| r.student_name.to_uppercase()).collect();
    let missing: Vec<&String> = wanted.iter().filter(|n| !present.contains(*n)).collect();

    if !missing.is_empty() {
      match self.store.list_students().await {
        Ok(students) => {
          for name in missing {
            let Some(student) = students.iter().find(|s| s.matches_roster_name(name)) else {
              tracing::debug!(session = %session.id, name = %name, "no student matches roster name");
              continue;
            };
            let mark = attendance
              .map(|a| mark_for(a, name))
              .unwrap_or_default();
            self
              .write_roster_row(session, RosterEntry {
                session_id:   session.id,
                student_id:   student.id,
                student_name: name.clone(),
                attendance:   mark,
              })
              .await;
          }
        }
        Err(e) => {
          tracing::warn!(session = %session.id, error = %e, "failed to load students for roster");
        }
      }
    }

    if let Some(attendance) = attendance {
      for mut row in kept {
        row.attendance = mark_for(attendance, &row.student_name);
        self.write_roster_row(session, row).await;
      }
    }
  }

  async fn rewrite_attendance(&self, session: &ClassSession, attendance: &AttendanceMap) {
    let rows = match self.store.roster(session.id).await {
      Ok(rows) => rows,
      Err(e) => {
        tracing::warn!(session = %session.id, error = %e, "failed to load roster");
        return;
      }
    };
    for mut row in rows {
      row.attendance = mark_for(attendance, &row.student_name);
      self.write_roster_row(session, row).await;
    }
  }

  /// Upsert one roster row and mirror its mark onto the student's assigned
  /// class for the same slot.
  async fn write_roster_row(&self, session: &ClassSession, row: RosterEntry) {
    if let Err(e) = self.store.upsert_roster(&row).await {
      tracing::warn!(
        session = %session.id,
        student = %row.student_id,
        error = %e,
        "failed to upsert roster row"
      );
      return;
    }
    self
      .mirror_attendance(row.student_id, session.slot(), row.attendance)
      .await;
  }

  async fn mirror_attendance(&self, student_id: Uuid, slot: SlotKey, status: AttendanceStatus) {
    match self.store.set_assigned_status(student_id, slot, status).await {
      Ok(true) => {}
      Ok(false) => {
        tracing::trace!(student = %student_id, slot = %slot, "no assigned class to mirror onto");
      }
      Err(e) => {
        tracing::warn!(student = %student_id, slot = %slot, error = %e, "failed to mirror attendance");
      }
    }
  }

  // ─── Teachers ─────────────────────────────────────────────────────────────

  pub async fn list_teachers(&self) -> Result<Vec<Teacher>> {
    self.store.list_teachers().await.map_err(Error::store)
  }

  pub async fn add_teacher(&self, mut input: NewTeacher) -> Result<Teacher> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
      return Err(Error::MissingField("name"));
    }
    self.store.insert_teacher(&input).await.map_err(Error::store)
  }

  pub async fn update_teacher(&self, id: Uuid, patch: TeacherPatch) -> Result<Teacher> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::MissingField("name"));
    }
    self
      .store
      .update_teacher(id, &patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TeacherNotFound(id))
  }

  pub async fn delete_teacher(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_teacher(id).await.map_err(Error::store)? {
      return Err(Error::TeacherNotFound(id));
    }
    Ok(())
  }

  // ─── Gift cards ───────────────────────────────────────────────────────────

  pub async fn list_gift_cards(&self) -> Result<Vec<GiftCard>> {
    self.store.list_gift_cards().await.map_err(Error::store)
  }

  pub async fn add_gift_card(&self, input: NewGiftCard) -> Result<GiftCard> {
    self.store.insert_gift_card(&input).await.map_err(Error::store)
  }

  pub async fn update_gift_card(&self, id: Uuid, patch: GiftCardPatch) -> Result<GiftCard> {
    self
      .store
      .update_gift_card(id, &patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::GiftCardNotFound(id))
  }

  pub async fn delete_gift_card(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_gift_card(id).await.map_err(Error::store)? {
      return Err(Error::GiftCardNotFound(id));
    }
    Ok(())
  }

  // ─── Pieces ───────────────────────────────────────────────────────────────

  pub async fn list_pieces(&self) -> Result<Vec<CeramicPiece>> {
    self.store.list_pieces().await.map_err(Error::store)
  }

  /// Register a piece. The owner is linked to the student whose full name
  /// matches it case-insensitively; otherwise the piece stays unlinked.
  pub async fn add_piece(&self, mut input: NewPiece) -> Result<CeramicPiece> {
    input.owner = input.owner.trim().to_string();
    if input.owner.is_empty() {
      return Err(Error::MissingField("owner"));
    }
    let students = self.store.list_students().await.map_err(Error::store)?;
    let student_id = students
      .iter()
      .find(|s| s.matches_roster_name(&input.owner))
      .map(|s| s.id);

    self
      .store
      .insert_piece(&input, student_id)
      .await
      .map_err(Error::store)
  }

  pub async fn update_piece(&self, id: Uuid, patch: PiecePatch) -> Result<CeramicPiece> {
    self
      .store
      .update_piece(id, &patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PieceNotFound(id))
  }

  /// Move a piece one stage forward.
  pub async fn advance_piece(&self, id: Uuid) -> Result<CeramicPiece> {
    let piece = self
      .store
      .get_piece(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PieceNotFound(id))?;
    let next = piece.status.next().ok_or(Error::PieceAlreadyDelivered(id))?;
    self
      .update_piece(id, PiecePatch {
        status: Some(next),
        ..PiecePatch::default()
      })
      .await
  }

  pub async fn delete_piece(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_piece(id).await.map_err(Error::store)? {
      return Err(Error::PieceNotFound(id));
    }
    Ok(())
  }

  // ─── Inventory ────────────────────────────────────────────────────────────

  pub async fn list_items(&self) -> Result<Vec<InventoryItem>> {
    self.store.list_items().await.map_err(Error::store)
  }

  pub async fn list_movements(&self) -> Result<Vec<InventoryMovement>> {
    self.store.list_movements().await.map_err(Error::store)
  }

  pub async fn add_item(&self, input: NewItem) -> Result<InventoryItem> {
    let existing = self.store.list_items().await.map_err(Error::store)?;
    let input = input.validated(&existing)?;
    self.store.insert_item(&input).await.map_err(Error::store)
  }

  pub async fn update_item(&self, id: Uuid, patch: ItemPatch) -> Result<InventoryItem> {
    let existing = self.store.list_items().await.map_err(Error::store)?;
    if !existing.iter().any(|i| i.id == id) {
      return Err(Error::ItemNotFound(id));
    }
    let patch = patch.validated(&existing, id)?;
    self
      .store
      .update_item(id, &patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ItemNotFound(id))
  }

  pub async fn archive_item(&self, id: Uuid) -> Result<InventoryItem> {
    self.update_item(id, ItemPatch::archive()).await
  }

  /// Append a movement to the ledger, then, when it carries a
  /// `new_quantity`, set the item's current quantity in a second write.
  pub async fn record_movement(&self, input: NewMovement) -> Result<InventoryMovement> {
    input.validate()?;
    if self
      .store
      .get_item(input.item_id)
      .await
      .map_err(Error::store)?
      .is_none()
    {
      return Err(Error::ItemNotFound(input.item_id));
    }

    let movement = self
      .store
      .append_movement(&input.ledger_entry())
      .await
      .map_err(Error::store)?;

    if let Some(quantity) = input.new_quantity {
      if let Err(e) = self.store.set_item_quantity(input.item_id, quantity).await {
        tracing::warn!(
          item = %input.item_id,
          movement = %movement.id,
          error = %e,
          "movement recorded but stock level not updated"
        );
      }
    }

    Ok(movement)
  }

  // ─── Reports ──────────────────────────────────────────────────────────────

  /// The dashboard for `today`.
  pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
    let sessions = self.store.list_sessions().await.map_err(Error::store)?;
    let students = self.store.list_students().await.map_err(Error::store)?;
    Ok(Dashboard::build(&sessions, &students, today))
  }

  pub async fn inventory_summary(&self) -> Result<InventorySummary> {
    let items = self.store.list_items().await.map_err(Error::store)?;
    Ok(InventorySummary::build(&items))
  }
}

fn today() -> NaiveDate { Local::now().date_naive() }
