//! Storage traits.
//!
//! Implemented by storage backends (e.g. `taller-store-sqlite`). The studio
//! service, the JSON API and the server depend on these abstractions, never on
//! a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used from
//! multi-threaded async runtimes (tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  directory::{
    NewWorkshop, Profile, ProfileMeta, ProfilePatch, Role, StaffMember, Workshop,
    WorkshopPatch,
  },
  gift_card::{GiftCard, GiftCardPatch, NewGiftCard},
  inventory::{InventoryItem, InventoryMovement, ItemPatch, LedgerEntry, NewItem},
  piece::{CeramicPiece, NewPiece, PiecePatch},
  session::{ClassSession, NewSession, RosterEntry, SessionPatch},
  student::{AssignedClass, AttendanceStatus, NewStudent, SlotKey, Student, StudentPatch},
  teacher::{NewTeacher, Teacher, TeacherPatch},
};

// ─── Studio data ─────────────────────────────────────────────────────────────

/// The tables of one workshop.
///
/// Every method is a single write or read. Multi-step sequences (roster
/// reconciliation, stock updates) are composed by
/// [`Studio`](crate::studio::Studio), not by the store.
pub trait StudioStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The workshop these tables belong to.
  fn sede_id(&self) -> Uuid;

  // ── Students ──────────────────────────────────────────────────────────

  /// All students, each with its assigned classes.
  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Insert the student row. Assigned classes are not written here; see
  /// [`StudioStore::replace_assigned_classes`].
  fn insert_student<'a>(
    &'a self,
    input: &'a NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + 'a;

  /// Update the student row. Returns `None` if the student does not exist.
  fn update_student<'a>(
    &'a self,
    id: Uuid,
    patch: &'a StudentPatch,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  /// Delete a student together with its assigned classes and roster rows.
  fn delete_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every assigned class of `student_id`, then insert `classes`.
  fn replace_assigned_classes<'a>(
    &'a self,
    student_id: Uuid,
    classes: &'a [AssignedClass],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Overwrite the status of the assigned class at `slot`. Returns `false`
  /// when the student has no such slot.
  fn set_assigned_status(
    &self,
    student_id: Uuid,
    slot: SlotKey,
    status: AttendanceStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// All sessions, each with its roster flattened in.
  fn list_sessions(
    &self,
  ) -> impl Future<Output = Result<Vec<ClassSession>, Self::Error>> + Send + '_;

  fn get_session(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ClassSession>, Self::Error>> + Send + '_;

  /// First session stored at exactly `slot`, whatever its type.
  fn find_session_by_slot(
    &self,
    slot: SlotKey,
  ) -> impl Future<Output = Result<Option<ClassSession>, Self::Error>> + Send + '_;

  /// Insert the session row. The roster in `input` is ignored.
  fn insert_session<'a>(
    &'a self,
    input: &'a NewSession,
  ) -> impl Future<Output = Result<ClassSession, Self::Error>> + Send + 'a;

  /// Update the session row. Roster fields in `patch` are ignored.
  fn update_session<'a>(
    &'a self,
    id: Uuid,
    patch: &'a SessionPatch,
  ) -> impl Future<Output = Result<Option<ClassSession>, Self::Error>> + Send + 'a;

  /// Delete a session and its roster.
  fn delete_session(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Rosters ───────────────────────────────────────────────────────────

  fn roster(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RosterEntry>, Self::Error>> + Send + '_;

  /// Insert a roster row, or overwrite the name and attendance of the row
  /// already keyed by `(session_id, student_id)`.
  fn upsert_roster<'a>(
    &'a self,
    entry: &'a RosterEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove the given students from a session roster. Returns the number of
  /// rows deleted.
  fn delete_roster_students<'a>(
    &'a self,
    session_id: Uuid,
    student_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn clear_roster(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Teachers ──────────────────────────────────────────────────────────

  fn list_teachers(
    &self,
  ) -> impl Future<Output = Result<Vec<Teacher>, Self::Error>> + Send + '_;

  fn insert_teacher<'a>(
    &'a self,
    input: &'a NewTeacher,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + 'a;

  fn update_teacher<'a>(
    &'a self,
    id: Uuid,
    patch: &'a TeacherPatch,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + 'a;

  fn delete_teacher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Pieces ────────────────────────────────────────────────────────────

  fn list_pieces(
    &self,
  ) -> impl Future<Output = Result<Vec<CeramicPiece>, Self::Error>> + Send + '_;

  fn get_piece(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CeramicPiece>, Self::Error>> + Send + '_;

  fn insert_piece<'a>(
    &'a self,
    input: &'a NewPiece,
    student_id: Option<Uuid>,
  ) -> impl Future<Output = Result<CeramicPiece, Self::Error>> + Send + 'a;

  fn update_piece<'a>(
    &'a self,
    id: Uuid,
    patch: &'a PiecePatch,
  ) -> impl Future<Output = Result<Option<CeramicPiece>, Self::Error>> + Send + 'a;

  fn delete_piece(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Gift cards ────────────────────────────────────────────────────────

  fn list_gift_cards(
    &self,
  ) -> impl Future<Output = Result<Vec<GiftCard>, Self::Error>> + Send + '_;

  fn insert_gift_card<'a>(
    &'a self,
    input: &'a NewGiftCard,
  ) -> impl Future<Output = Result<GiftCard, Self::Error>> + Send + 'a;

  fn update_gift_card<'a>(
    &'a self,
    id: Uuid,
    patch: &'a GiftCardPatch,
  ) -> impl Future<Output = Result<Option<GiftCard>, Self::Error>> + Send + 'a;

  fn delete_gift_card(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Inventory ─────────────────────────────────────────────────────────

  /// All items, archived ones included.
  fn list_items(
    &self,
  ) -> impl Future<Output = Result<Vec<InventoryItem>, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<InventoryItem>, Self::Error>> + Send + '_;

  fn insert_item<'a>(
    &'a self,
    input: &'a NewItem,
  ) -> impl Future<Output = Result<InventoryItem, Self::Error>> + Send + 'a;

  fn update_item<'a>(
    &'a self,
    id: Uuid,
    patch: &'a ItemPatch,
  ) -> impl Future<Output = Result<Option<InventoryItem>, Self::Error>> + Send + 'a;

  /// Newest first.
  fn list_movements(
    &self,
  ) -> impl Future<Output = Result<Vec<InventoryMovement>, Self::Error>> + Send + '_;

  /// Append one ledger row. The item quantity is left untouched.
  fn append_movement<'a>(
    &'a self,
    entry: &'a LedgerEntry,
  ) -> impl Future<Output = Result<InventoryMovement, Self::Error>> + Send + 'a;

  /// Set an item's current quantity. Returns `false` if the item is missing.
  fn set_item_quantity(
    &self,
    id: Uuid,
    quantity: f64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Hands out stores scoped to one workshop.
pub trait Tenancy: Send + Sync + 'static {
  type Studio: StudioStore;

  fn studio(&self, sede_id: Uuid) -> Self::Studio;
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// A sign-in identity. The password is only ever held as a PHC hash string.
#[derive(Debug, Clone)]
pub struct Identity {
  pub id:            Uuid,
  pub email:         String,
  pub password_hash: String,
}

/// Cross-workshop tables: identities, bearer sessions, profiles, workshops and
/// workshop membership.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Create an identity and its profile. Fails if the email is taken.
  fn create_identity<'a>(
    &'a self,
    email: &'a str,
    password_hash: &'a str,
    role: Option<Role>,
    meta: &'a ProfileMeta,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + 'a;

  /// Case-insensitive lookup by email.
  fn find_identity<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Delete an identity and every bearer session issued to it.
  fn delete_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Bearer sessions ───────────────────────────────────────────────────

  /// Store the digest of a freshly issued token.
  fn insert_token<'a>(
    &'a self,
    user_id: Uuid,
    digest: &'a str,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The user a token digest belongs to, if it exists and has not expired
  /// at `now`.
  fn resolve_token<'a>(
    &'a self,
    digest: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  fn revoke_token<'a>(
    &'a self,
    digest: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn list_profiles(
    &self,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  fn update_profile<'a>(
    &'a self,
    id: Uuid,
    patch: &'a ProfilePatch,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  fn delete_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Workshops ─────────────────────────────────────────────────────────

  fn insert_workshop<'a>(
    &'a self,
    input: &'a NewWorkshop,
  ) -> impl Future<Output = Result<Workshop, Self::Error>> + Send + 'a;

  fn get_workshop(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Workshop>, Self::Error>> + Send + '_;

  fn list_workshops(
    &self,
  ) -> impl Future<Output = Result<Vec<Workshop>, Self::Error>> + Send + '_;

  fn update_workshop<'a>(
    &'a self,
    id: Uuid,
    patch: &'a WorkshopPatch,
  ) -> impl Future<Output = Result<Option<Workshop>, Self::Error>> + Send + 'a;

  /// The workshop owned by `user_id`, if any.
  fn owned_workshop(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Workshop>, Self::Error>> + Send + '_;

  /// Delete every row that belongs to the workshop, in dependency order
  /// (rosters, sessions, assigned classes, students, teachers, pieces, gift
  /// cards, movements, items, payments, members), then the workshop itself.
  fn purge_workshop(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Membership ────────────────────────────────────────────────────────

  /// Add `user_id` to a workshop's staff and return the membership id.
  fn add_member(
    &self,
    sede_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// The workshop `user_id` is a staff member of, if any.
  fn membership(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  fn list_staff(
    &self,
    sede_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StaffMember>, Self::Error>> + Send + '_;

  fn remove_member(
    &self,
    sede_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
