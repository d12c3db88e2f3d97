//! [`SedeStore`]: the studio tables of one workshop.
//!
//! Every statement binds the workshop id and filters on `sede_id`, so a store
//! handed out for one workshop can never read or touch another's rows.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row};
use uuid::Uuid;

use taller_core::{
  gift_card::{GiftCard, GiftCardPatch, NewGiftCard},
  inventory::{InventoryItem, InventoryMovement, ItemPatch, LedgerEntry, NewItem},
  piece::{CeramicPiece, NewPiece, PiecePatch},
  session::{ClassSession, NewSession, RosterEntry, SessionPatch},
  store::StudioStore,
  student::{AssignedClass, AttendanceStatus, NewStudent, SlotKey, Student, StudentPatch},
  teacher::{NewTeacher, Teacher, TeacherPatch},
};

use crate::{
  Error, Result,
  encode::{
    RawAssigned, RawGiftCard, RawItem, RawMovement, RawPiece, RawRoster, RawSession,
    RawStudent, RawTeacher, decode_uuid, encode_date, encode_details, encode_dt, encode_time, encode_uuid,
  },
};

type RowFn<T> = fn(&Row<'_>) -> rusqlite::Result<T>;

/// Studio tables scoped to a single workshop. Obtained through
/// [`Tenancy::studio`](taller_core::store::Tenancy::studio).
#[derive(Clone)]
pub struct SedeStore {
  conn:    tokio_rusqlite::Connection,
  sede_id: Uuid,
}

impl SedeStore {
  pub(crate) fn new(conn: tokio_rusqlite::Connection, sede_id: Uuid) -> Self {
    Self { conn, sede_id }
  }

  fn sede(&self) -> String { encode_uuid(self.sede_id) }

  /// Every row of `sql`, which binds the workshop as `?1` and `key`, when
  /// given, as `?2`.
  async fn select_all<T: Send + 'static>(
    &self,
    sql: String,
    key: Option<Uuid>,
    map: RowFn<T>,
  ) -> Result<Vec<T>> {
    let mut args = vec![self.sede()];
    args.extend(key.map(encode_uuid));
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  /// The row of `sql` keyed by `id`. Binds the workshop as `?1` and the id
  /// as `?2`.
  async fn select_one<T: Send + 'static>(
    &self,
    sql: String,
    id: Uuid,
    map: RowFn<T>,
  ) -> Result<Option<T>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(&sql, rusqlite::params![sede, id_str], map)
              .optional()?,
          )
        })
        .await?,
    )
  }

  /// Delete the row keyed by `id` from `table`.
  async fn delete_row(&self, table: &'static str, id: Uuid) -> Result<bool> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE sede_id = ?1 AND id = ?2"),
          rusqlite::params![sede, id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn assigned_for(&self, student_id: Uuid) -> Result<Vec<AssignedClass>> {
    let raws = self
      .select_all(
        format!(
          "SELECT {} FROM student_assigned_classes
            WHERE sede_id = ?1 AND student_id = ?2
            ORDER BY rowid",
          RawAssigned::COLUMNS,
        ),
        Some(student_id),
        RawAssigned::from_row,
      )
      .await?;
    raws
      .into_iter()
      .map(|r| r.into_assigned().map(|(_, class)| class))
      .collect()
  }

  async fn hydrate_session(&self, raw: RawSession) -> Result<ClassSession> {
    let session = raw.into_session()?;
    let rows = self.roster(session.id).await?;
    Ok(session.with_roster(&rows))
  }
}

impl StudioStore for SedeStore {
  type Error = Error;

  fn sede_id(&self) -> Uuid { self.sede_id }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn list_students(&self) -> Result<Vec<Student>> {
    let raws = self
      .select_all(
        format!(
          "SELECT {} FROM students WHERE sede_id = ?1 ORDER BY name, surname",
          RawStudent::COLUMNS
        ),
        None,
        RawStudent::from_row,
      )
      .await?;
    let assigned = self
      .select_all(
        format!(
          "SELECT {} FROM student_assigned_classes WHERE sede_id = ?1 ORDER BY rowid",
          RawAssigned::COLUMNS
        ),
        None,
        RawAssigned::from_row,
      )
      .await?;

    let mut by_student: HashMap<Uuid, Vec<AssignedClass>> = HashMap::new();
    for raw in assigned {
      let (student_id, class) = raw.into_assigned()?;
      by_student.entry(student_id).or_default().push(class);
    }

    raws
      .into_iter()
      .map(|raw| {
        let id = decode_uuid(&raw.id)?;
        raw.into_student(by_student.remove(&id).unwrap_or_default())
      })
      .collect()
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    let raw = self
      .select_one(
        format!(
          "SELECT {} FROM students WHERE sede_id = ?1 AND id = ?2",
          RawStudent::COLUMNS
        ),
        id,
        RawStudent::from_row,
      )
      .await?;
    let Some(raw) = raw else {
      return Ok(None);
    };
    let assigned = self.assigned_for(id).await?;
    Ok(Some(raw.into_student(assigned)?))
  }

  async fn insert_student(&self, input: &NewStudent) -> Result<Student> {
    let student = Student {
      id:                Uuid::new_v4(),
      name:              input.name.clone(),
      surname:           input.surname.clone(),
      email:             input.email.clone(),
      phone:             input.phone.clone(),
      phone_country:     input.phone_country.clone(),
      birth_day:         input.birth_day,
      birth_month:       input.birth_month,
      birth_year:        input.birth_year,
      classes_remaining: input.classes_remaining,
      status:            input.status,
      payment_method:    input.payment_method.clone(),
      notes:             input.notes.clone(),
      observations:      input.observations.clone(),
      price:             input.price,
      class_type:        input.class_type.clone(),
      expiry_date:       input.expiry_date,
      assigned_classes:  Vec::new(),
      created_at:        Utc::now(),
    };

    let s = student.clone();
    let sede = self.sede();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (
             id, sede_id, name, surname, email, phone, phone_country, birth_day,
             birth_month, birth_year, classes_remaining, status, payment_method,
             notes, observations, price, class_type, expiry_date, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19)",
          rusqlite::params![
            encode_uuid(s.id),
            sede,
            s.name,
            s.surname,
            s.email,
            s.phone,
            s.phone_country,
            s.birth_day,
            s.birth_month,
            s.birth_year,
            s.classes_remaining,
            s.status.as_ref(),
            s.payment_method,
            s.notes,
            s.observations,
            s.price,
            s.class_type,
            s.expiry_date.map(encode_date),
            encode_dt(s.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(student)
  }

  async fn update_student(&self, id: Uuid, patch: &StudentPatch) -> Result<Option<Student>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let p = patch.clone();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE students
              SET name              = COALESCE(?3, name),
                  surname           = COALESCE(?4, surname),
                  email             = COALESCE(?5, email),
                  phone             = COALESCE(?6, phone),
                  phone_country     = COALESCE(?7, phone_country),
                  birth_day         = COALESCE(?8, birth_day),
                  birth_month       = COALESCE(?9, birth_month),
                  birth_year        = COALESCE(?10, birth_year),
                  classes_remaining = COALESCE(?11, classes_remaining),
                  status            = COALESCE(?12, status),
                  payment_method    = COALESCE(?13, payment_method),
                  notes             = COALESCE(?14, notes),
                  observations      = COALESCE(?15, observations),
                  price             = COALESCE(?16, price),
                  class_type        = COALESCE(?17, class_type),
                  expiry_date       = COALESCE(?18, expiry_date)
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![
            sede,
            id_str,
            p.name,
            p.surname,
            p.email,
            p.phone,
            p.phone_country,
            p.birth_day,
            p.birth_month,
            p.birth_year,
            p.classes_remaining,
            p.status.map(|s| s.as_ref().to_owned()),
            p.payment_method,
            p.notes,
            p.observations,
            p.price,
            p.class_type,
            p.expiry_date.map(encode_date),
          ],
        )?)
      })
      .await?;

    if n == 0 {
      return Ok(None);
    }
    self.get_student(id).await
  }

  async fn delete_student(&self, id: Uuid) -> Result<bool> {
    // Assigned classes and roster rows go with it via ON DELETE CASCADE.
    self.delete_row("students", id).await
  }

  async fn replace_assigned_classes(
    &self,
    student_id: Uuid,
    classes: &[AssignedClass],
  ) -> Result<()> {
    let sede = self.sede();
    let student_str = encode_uuid(student_id);
    let rows: Vec<(String, String, String, String)> = classes
      .iter()
      .map(|c| {
        (
          encode_date(c.date),
          encode_time(c.start_time),
          encode_time(c.end_time),
          c.status.as_ref().to_owned(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM student_assigned_classes WHERE sede_id = ?1 AND student_id = ?2",
          rusqlite::params![sede, student_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO student_assigned_classes
               (id, sede_id, student_id, date, start_time, end_time, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for (date, start, end, status) in &rows {
            stmt.execute(rusqlite::params![
              encode_uuid(Uuid::new_v4()),
              sede,
              student_str,
              date,
              start,
              end,
              status
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::trace!(student = %student_id, count = classes.len(), "assigned classes replaced");
    Ok(())
  }

  async fn set_assigned_status(
    &self,
    student_id: Uuid,
    slot: SlotKey,
    status: AttendanceStatus,
  ) -> Result<bool> {
    let sede = self.sede();
    let student_str = encode_uuid(student_id);
    let date = encode_date(slot.date);
    let start = encode_time(slot.start);
    let end = encode_time(slot.end);
    let status = status.as_ref().to_owned();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE student_assigned_classes
              SET status = ?6
            WHERE sede_id = ?1 AND student_id = ?2
              AND date = ?3 AND start_time = ?4 AND end_time = ?5",
          rusqlite::params![sede, student_str, date, start, end, status],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn list_sessions(&self) -> Result<Vec<ClassSession>> {
    let raws = self
      .select_all(
        format!(
          "SELECT {} FROM sessions WHERE sede_id = ?1 ORDER BY date, start_time, rowid",
          RawSession::COLUMNS
        ),
        None,
        RawSession::from_row,
      )
      .await?;
    let roster = self
      .select_all(
        format!(
          "SELECT {} FROM session_students WHERE sede_id = ?1 ORDER BY rowid",
          RawRoster::COLUMNS
        ),
        None,
        RawRoster::from_row,
      )
      .await?;

    let mut by_session: HashMap<Uuid, Vec<RosterEntry>> = HashMap::new();
    for raw in roster {
      let entry = raw.into_entry()?;
      by_session.entry(entry.session_id).or_default().push(entry);
    }

    raws
      .into_iter()
      .map(|raw| {
        let session = raw.into_session()?;
        let rows = by_session.remove(&session.id).unwrap_or_default();
        Ok(session.with_roster(&rows))
      })
      .collect()
  }

  async fn get_session(&self, id: Uuid) -> Result<Option<ClassSession>> {
    let raw = self
      .select_one(
        format!(
          "SELECT {} FROM sessions WHERE sede_id = ?1 AND id = ?2",
          RawSession::COLUMNS
        ),
        id,
        RawSession::from_row,
      )
      .await?;
    match raw {
      Some(raw) => Ok(Some(self.hydrate_session(raw).await?)),
      None => Ok(None),
    }
  }

  async fn find_session_by_slot(&self, slot: SlotKey) -> Result<Option<ClassSession>> {
    let sede = self.sede();
    let date = encode_date(slot.date);
    let start = encode_time(slot.start);
    let end = encode_time(slot.end);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM sessions
                  WHERE sede_id = ?1 AND date = ?2 AND start_time = ?3 AND end_time = ?4
                  ORDER BY rowid LIMIT 1",
                RawSession::COLUMNS
              ),
              rusqlite::params![sede, date, start, end],
              RawSession::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => Ok(Some(self.hydrate_session(raw).await?)),
      None => Ok(None),
    }
  }

  async fn insert_session(&self, input: &NewSession) -> Result<ClassSession> {
    let session = ClassSession {
      id:                    Uuid::new_v4(),
      date:                  input.date,
      start_time:            input.start_time,
      end_time:              input.end_time,
      class_type:            input.class_type,
      students:              Vec::new(),
      attendance:            Default::default(),
      teacher_id:            input.teacher_id,
      teacher_substitute_id: input.teacher_substitute_id,
      completed_at:          None,
      workshop_name:         input.workshop_name.clone(),
      private_reason:        input.private_reason.clone(),
    };

    let s = session.clone();
    let sede = self.sede();
    let created_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (
             id, sede_id, date, start_time, end_time, class_type, teacher_id,
             teacher_substitute_id, workshop_name, private_reason, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            encode_uuid(s.id),
            sede,
            encode_date(s.date),
            encode_time(s.start_time),
            encode_time(s.end_time),
            s.class_type.as_ref(),
            s.teacher_id.map(encode_uuid),
            s.teacher_substitute_id.map(encode_uuid),
            s.workshop_name,
            s.private_reason,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(session = %session.id, slot = %session.slot(), "session inserted");
    Ok(session)
  }

  async fn update_session(&self, id: Uuid, patch: &SessionPatch) -> Result<Option<ClassSession>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let p = patch.clone();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions
              SET date                  = COALESCE(?3, date),
                  start_time            = COALESCE(?4, start_time),
                  end_time              = COALESCE(?5, end_time),
                  class_type            = COALESCE(?6, class_type),
                  teacher_id            = COALESCE(?7, teacher_id),
                  teacher_substitute_id = COALESCE(?8, teacher_substitute_id),
                  completed_at          = COALESCE(?9, completed_at),
                  workshop_name         = COALESCE(?10, workshop_name),
                  private_reason        = COALESCE(?11, private_reason)
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![
            sede,
            id_str,
            p.date.map(encode_date),
            p.start_time.map(encode_time),
            p.end_time.map(encode_time),
            p.class_type.map(|c| c.as_ref().to_owned()),
            p.teacher_id.map(encode_uuid),
            p.teacher_substitute_id.map(encode_uuid),
            p.completed_at.map(encode_dt),
            p.workshop_name,
            p.private_reason,
          ],
        )?)
      })
      .await?;

    if n == 0 {
      return Ok(None);
    }
    self.get_session(id).await
  }

  async fn delete_session(&self, id: Uuid) -> Result<bool> {
    self.delete_row("sessions", id).await
  }

  // ── Rosters ───────────────────────────────────────────────────────────────

  async fn roster(&self, session_id: Uuid) -> Result<Vec<RosterEntry>> {
    let raws = self
      .select_all(
        format!(
          "SELECT {} FROM session_students
            WHERE sede_id = ?1 AND session_id = ?2
            ORDER BY rowid",
          RawRoster::COLUMNS,
        ),
        Some(session_id),
        RawRoster::from_row,
      )
      .await?;
    raws.into_iter().map(RawRoster::into_entry).collect()
  }

  async fn upsert_roster(&self, entry: &RosterEntry) -> Result<()> {
    let sede = self.sede();
    let session_str = encode_uuid(entry.session_id);
    let student_str = encode_uuid(entry.student_id);
    let name = entry.student_name.clone();
    let attendance = entry.attendance.as_ref().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO session_students
             (id, sede_id, session_id, student_id, student_name, attendance)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (session_id, student_id) DO UPDATE
             SET student_name = excluded.student_name,
                 attendance   = excluded.attendance",
          rusqlite::params![
            encode_uuid(Uuid::new_v4()),
            sede,
            session_str,
            student_str,
            name,
            attendance
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_roster_students(&self, session_id: Uuid, student_ids: &[Uuid]) -> Result<usize> {
    let sede = self.sede();
    let session_str = encode_uuid(session_id);
    let ids: Vec<String> = student_ids.iter().copied().map(encode_uuid).collect();

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let mut deleted = 0;
          for id in &ids {
            deleted += tx.execute(
              "DELETE FROM session_students
                WHERE sede_id = ?1 AND session_id = ?2 AND student_id = ?3",
              rusqlite::params![sede, session_str, id],
            )?;
          }
          tx.commit()?;
          Ok(deleted)
        })
        .await?,
    )
  }

  async fn clear_roster(&self, session_id: Uuid) -> Result<()> {
    let sede = self.sede();
    let session_str = encode_uuid(session_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM session_students WHERE sede_id = ?1 AND session_id = ?2",
          rusqlite::params![sede, session_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Teachers ──────────────────────────────────────────────────────────────

  async fn list_teachers(&self) -> Result<Vec<Teacher>> {
    self
      .select_all(
        format!(
          "SELECT {} FROM teachers WHERE sede_id = ?1 ORDER BY name, surname",
          RawTeacher::COLUMNS
        ),
        None,
        RawTeacher::from_row,
      )
      .await?
      .into_iter()
      .map(RawTeacher::into_teacher)
      .collect()
  }

  async fn insert_teacher(&self, input: &NewTeacher) -> Result<Teacher> {
    let teacher = Teacher {
      id:        Uuid::new_v4(),
      name:      input.name.clone(),
      surname:   input.surname.clone(),
      email:     input.email.clone(),
      phone:     input.phone.clone(),
      specialty: input.specialty.clone(),
      notes:     input.notes.clone(),
    };

    let t = teacher.clone();
    let sede = self.sede();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO teachers (id, sede_id, name, surname, email, phone, specialty, notes)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(t.id),
            sede,
            t.name,
            t.surname,
            t.email,
            t.phone,
            t.specialty,
            t.notes
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(teacher)
  }

  async fn update_teacher(&self, id: Uuid, patch: &TeacherPatch) -> Result<Option<Teacher>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let p = patch.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE teachers
              SET name      = COALESCE(?3, name),
                  surname   = COALESCE(?4, surname),
                  email     = COALESCE(?5, email),
                  phone     = COALESCE(?6, phone),
                  specialty = COALESCE(?7, specialty),
                  notes     = COALESCE(?8, notes)
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![sede, id_str, p.name, p.surname, p.email, p.phone, p.specialty, p.notes],
        )?;
        Ok(())
      })
      .await?;

    self
      .select_one(
        format!(
          "SELECT {} FROM teachers WHERE sede_id = ?1 AND id = ?2",
          RawTeacher::COLUMNS
        ),
        id,
        RawTeacher::from_row,
      )
      .await?
      .map(RawTeacher::into_teacher)
      .transpose()
  }

  async fn delete_teacher(&self, id: Uuid) -> Result<bool> {
    self.delete_row("teachers", id).await
  }

  // ── Pieces ────────────────────────────────────────────────────────────────

  async fn list_pieces(&self) -> Result<Vec<CeramicPiece>> {
    self
      .select_all(
        format!(
          "SELECT {} FROM pieces WHERE sede_id = ?1 ORDER BY rowid DESC",
          RawPiece::COLUMNS
        ),
        None,
        RawPiece::from_row,
      )
      .await?
      .into_iter()
      .map(RawPiece::into_piece)
      .collect()
  }

  async fn get_piece(&self, id: Uuid) -> Result<Option<CeramicPiece>> {
    self
      .select_one(
        format!(
          "SELECT {} FROM pieces WHERE sede_id = ?1 AND id = ?2",
          RawPiece::COLUMNS
        ),
        id,
        RawPiece::from_row,
      )
      .await?
      .map(RawPiece::into_piece)
      .transpose()
  }

  async fn insert_piece(&self, input: &NewPiece, student_id: Option<Uuid>) -> Result<CeramicPiece> {
    let piece = CeramicPiece {
      id: Uuid::new_v4(),
      student_id,
      owner: input.owner.clone(),
      description: input.description.clone(),
      status: input.status,
      glaze_type: input.glaze_type.clone(),
      delivery_date: input.delivery_date,
      notes: input.notes.clone(),
      extra_commentary: input.extra_commentary.clone(),
    };

    let p = piece.clone();
    let sede = self.sede();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pieces (
             id, sede_id, student_id, owner_name, description, status, glaze_type,
             delivery_date, notes, extra_commentary
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            encode_uuid(p.id),
            sede,
            p.student_id.map(encode_uuid),
            p.owner,
            p.description,
            p.status.as_ref(),
            p.glaze_type,
            p.delivery_date.map(encode_date),
            p.notes,
            p.extra_commentary,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(piece)
  }

  async fn update_piece(&self, id: Uuid, patch: &PiecePatch) -> Result<Option<CeramicPiece>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let p = patch.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE pieces
              SET owner_name       = COALESCE(?3, owner_name),
                  description      = COALESCE(?4, description),
                  status           = COALESCE(?5, status),
                  glaze_type       = COALESCE(?6, glaze_type),
                  delivery_date    = COALESCE(?7, delivery_date),
                  notes            = COALESCE(?8, notes),
                  extra_commentary = COALESCE(?9, extra_commentary)
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![
            sede,
            id_str,
            p.owner,
            p.description,
            p.status.map(|s| s.as_ref().to_owned()),
            p.glaze_type,
            p.delivery_date.map(encode_date),
            p.notes,
            p.extra_commentary,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.get_piece(id).await
  }

  async fn delete_piece(&self, id: Uuid) -> Result<bool> {
    self.delete_row("pieces", id).await
  }

  // ── Gift cards ────────────────────────────────────────────────────────────

  async fn list_gift_cards(&self) -> Result<Vec<GiftCard>> {
    self
      .select_all(
        format!(
          "SELECT {} FROM gift_cards WHERE sede_id = ?1 ORDER BY rowid DESC",
          RawGiftCard::COLUMNS
        ),
        None,
        RawGiftCard::from_row,
      )
      .await?
      .into_iter()
      .map(RawGiftCard::into_gift_card)
      .collect()
  }

  async fn insert_gift_card(&self, input: &NewGiftCard) -> Result<GiftCard> {
    let card = GiftCard {
      id:               Uuid::new_v4(),
      buyer:            input.buyer.clone(),
      recipient:        input.recipient.clone(),
      num_classes:      input.num_classes,
      card_type:        input.card_type,
      scheduled_date:   input.scheduled_date,
      created_at:       Utc::now(),
      extra_commentary: input.extra_commentary.clone(),
    };

    let c = card.clone();
    let sede = self.sede();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO gift_cards (
             id, sede_id, buyer, recipient, num_classes, type, scheduled_date,
             created_at, extra_commentary
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            encode_uuid(c.id),
            sede,
            c.buyer,
            c.recipient,
            c.num_classes,
            c.card_type.as_ref(),
            c.scheduled_date.map(encode_date),
            encode_dt(c.created_at),
            c.extra_commentary,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(card)
  }

  async fn update_gift_card(&self, id: Uuid, patch: &GiftCardPatch) -> Result<Option<GiftCard>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let p = patch.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE gift_cards
              SET buyer            = COALESCE(?3, buyer),
                  recipient        = COALESCE(?4, recipient),
                  num_classes      = COALESCE(?5, num_classes),
                  type             = COALESCE(?6, type),
                  scheduled_date   = COALESCE(?7, scheduled_date),
                  extra_commentary = COALESCE(?8, extra_commentary)
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![
            sede,
            id_str,
            p.buyer,
            p.recipient,
            p.num_classes,
            p.card_type.map(|t| t.as_ref().to_owned()),
            p.scheduled_date.map(encode_date),
            p.extra_commentary,
          ],
        )?;
        Ok(())
      })
      .await?;

    self
      .select_one(
        format!(
          "SELECT {} FROM gift_cards WHERE sede_id = ?1 AND id = ?2",
          RawGiftCard::COLUMNS
        ),
        id,
        RawGiftCard::from_row,
      )
      .await?
      .map(RawGiftCard::into_gift_card)
      .transpose()
  }

  async fn delete_gift_card(&self, id: Uuid) -> Result<bool> {
    self.delete_row("gift_cards", id).await
  }

  // ── Inventory ─────────────────────────────────────────────────────────────

  async fn list_items(&self) -> Result<Vec<InventoryItem>> {
    self
      .select_all(
        format!(
          "SELECT {} FROM inventory_items WHERE sede_id = ?1 ORDER BY category, name",
          RawItem::COLUMNS
        ),
        None,
        RawItem::from_row,
      )
      .await?
      .into_iter()
      .map(RawItem::into_item)
      .collect()
  }

  async fn get_item(&self, id: Uuid) -> Result<Option<InventoryItem>> {
    self
      .select_one(
        format!(
          "SELECT {} FROM inventory_items WHERE sede_id = ?1 AND id = ?2",
          RawItem::COLUMNS
        ),
        id,
        RawItem::from_row,
      )
      .await?
      .map(RawItem::into_item)
      .transpose()
  }

  async fn insert_item(&self, input: &NewItem) -> Result<InventoryItem> {
    let now = Utc::now();
    let item = InventoryItem {
      id:               Uuid::new_v4(),
      category:         input.category,
      name:             input.name.clone(),
      code:             input.code.clone(),
      unit:             input.unit.clone(),
      current_quantity: input.current_quantity,
      min_quantity:     input.min_quantity,
      location:         input.location.clone(),
      supplier:         input.supplier.clone(),
      supplier_code:    input.supplier_code.clone(),
      cost_per_unit:    input.cost_per_unit,
      notes:            input.notes.clone(),
      status:           input.status,
      details:          input.details.clone(),
      created_at:       now,
      updated_at:       now,
    };

    let details = encode_details(&item.details)?;
    let i = item.clone();
    let sede = self.sede();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO inventory_items (
             id, sede_id, category, name, code, unit, current_quantity, min_quantity,
             location, supplier, supplier_code, cost_per_unit, notes, status, details,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17)",
          rusqlite::params![
            encode_uuid(i.id),
            sede,
            i.category.as_ref(),
            i.name,
            i.code,
            i.unit,
            i.current_quantity,
            i.min_quantity,
            i.location,
            i.supplier,
            i.supplier_code,
            i.cost_per_unit,
            i.notes,
            i.status.as_ref(),
            details,
            encode_dt(i.created_at),
            encode_dt(i.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(item = %item.id, code = %item.code, "inventory item inserted");
    Ok(item)
  }

  async fn update_item(&self, id: Uuid, patch: &ItemPatch) -> Result<Option<InventoryItem>> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let details = patch.details.as_ref().map(encode_details).transpose()?;
    let now_str = encode_dt(Utc::now());
    let p = patch.clone();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE inventory_items
              SET category         = COALESCE(?3, category),
                  name             = COALESCE(?4, name),
                  code             = COALESCE(?5, code),
                  unit             = COALESCE(?6, unit),
                  current_quantity = COALESCE(?7, current_quantity),
                  min_quantity     = COALESCE(?8, min_quantity),
                  location         = COALESCE(?9, location),
                  supplier         = COALESCE(?10, supplier),
                  supplier_code    = COALESCE(?11, supplier_code),
                  cost_per_unit    = COALESCE(?12, cost_per_unit),
                  notes            = COALESCE(?13, notes),
                  status           = COALESCE(?14, status),
                  details          = COALESCE(?15, details),
                  updated_at       = ?16
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![
            sede,
            id_str,
            p.category.map(|c| c.as_ref().to_owned()),
            p.name,
            p.code,
            p.unit,
            p.current_quantity,
            p.min_quantity,
            p.location,
            p.supplier,
            p.supplier_code,
            p.cost_per_unit,
            p.notes,
            p.status.map(|s| s.as_ref().to_owned()),
            details,
            now_str,
          ],
        )?)
      })
      .await?;

    if n == 0 {
      return Ok(None);
    }
    self.get_item(id).await
  }

  async fn list_movements(&self) -> Result<Vec<InventoryMovement>> {
    self
      .select_all(
        format!(
          "SELECT {} FROM inventory_movements WHERE sede_id = ?1 ORDER BY rowid DESC",
          RawMovement::COLUMNS
        ),
        None,
        RawMovement::from_row,
      )
      .await?
      .into_iter()
      .map(RawMovement::into_movement)
      .collect()
  }

  async fn append_movement(&self, entry: &LedgerEntry) -> Result<InventoryMovement> {
    let movement = InventoryMovement {
      id:            Uuid::new_v4(),
      item_id:       entry.item_id,
      movement_type: entry.movement_type,
      quantity:      entry.quantity,
      reason:        entry.reason.clone(),
      created_at:    Utc::now(),
    };

    let m = movement.clone();
    let sede = self.sede();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO inventory_movements
             (id, sede_id, inventory_item_id, type, quantity, reason, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(m.id),
            sede,
            encode_uuid(m.item_id),
            m.movement_type.as_ref(),
            m.quantity,
            m.reason,
            encode_dt(m.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(movement)
  }

  async fn set_item_quantity(&self, id: Uuid, quantity: f64) -> Result<bool> {
    let sede = self.sede();
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE inventory_items
              SET current_quantity = ?3, updated_at = ?4
            WHERE sede_id = ?1 AND id = ?2",
          rusqlite::params![sede, id_str, quantity, now_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }
}
