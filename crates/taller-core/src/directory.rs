//! Cross-site records: users, their profiles and roles, workshops (sedes) and
//! workshop staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Minimum password length accepted when creating users.
pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Roles ───────────────────────────────────────────────────────────────────

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  /// Runs the franchise; the only role admitted to the admin console.
  SuperAdmin,
  /// Owns one workshop.
  Tallerista,
  /// Works at a workshop owned by someone else.
  Staff,
}

impl Role {
  /// Map the role label sent to `create-user`. Anything other than a super
  /// admin label provisions a workshop owner.
  pub fn from_request_label(label: Option<&str>) -> Self {
    match label {
      Some("Super Admin" | "super_admin") => Self::SuperAdmin,
      _ => Self::Tallerista,
    }
  }

  /// Whether this role may use a workshop console.
  pub fn is_studio_role(self) -> bool { matches!(self, Self::Tallerista | Self::Staff) }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id:         Uuid,
  pub email:      String,
  pub full_name:  Option<String>,
  pub phone:      Option<String>,
  /// `None` for accounts that signed up on their own and were never granted
  /// a role.
  pub role:       Option<Role>,
  pub created_at: DateTime<Utc>,
}

/// Optional profile metadata captured at user creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileMeta {
  pub full_name: Option<String>,
  pub phone:     Option<String>,
  pub country:   Option<String>,
  pub city:      Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
  pub full_name: Option<String>,
  pub phone:     Option<String>,
}

/// Body of the `create-user` function. Field names follow the wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
  pub email:    Option<String>,
  pub password: Option<String>,
  pub nombre:   Option<String>,
  pub role:     Option<String>,
  pub telefono: Option<String>,
  pub pais:     Option<String>,
  pub ciudad:   Option<String>,
}

/// A [`NewUser`] that passed validation.
#[derive(Debug, Clone)]
pub struct ValidUser {
  pub email:    String,
  pub password: String,
  pub nombre:   String,
  pub role:     Role,
  pub meta:     ProfileMeta,
}

impl NewUser {
  pub fn validate(self) -> Result<ValidUser> {
    let present = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some(email), Some(password), Some(nombre)) =
      (present(self.email), present(self.password), present(self.nombre))
    else {
      return Err(Error::MissingField("email, password, nombre"));
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(ValidUser {
      role: Role::from_request_label(self.role.as_deref()),
      meta: ProfileMeta {
        full_name: Some(nombre.clone()),
        phone:     self.telefono,
        country:   self.pais,
        city:      self.ciudad,
      },
      email,
      password,
      nombre,
    })
  }
}

// ─── Workshops ───────────────────────────────────────────────────────────────

/// A studio location, the tenancy boundary for studio data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workshop {
  pub id:            Uuid,
  pub name:          String,
  pub slug:          String,
  pub address:       Option<String>,
  pub city:          Option<String>,
  pub country:       Option<String>,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
  pub owner_id:      Option<Uuid>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWorkshop {
  pub name:          String,
  /// Derived from `name` when absent.
  pub slug:          Option<String>,
  pub address:       Option<String>,
  pub city:          Option<String>,
  pub country:       Option<String>,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
  pub owner_id:      Option<Uuid>,
  #[serde(default = "active")]
  pub is_active:     bool,
}

fn active() -> bool { true }

impl NewWorkshop {
  /// The workshop provisioned for a freshly created owner.
  pub fn for_owner(owner_id: Uuid, nombre: &str, meta: &ProfileMeta) -> Self {
    Self {
      name: format!("Taller de {nombre}"),
      slug: Some(slug_or_fallback(nombre, owner_id)),
      city: meta.city.clone(),
      country: meta.country.clone(),
      owner_id: Some(owner_id),
      is_active: true,
      ..Self::default()
    }
  }

  pub fn validated(mut self) -> Result<Self> {
    self.name = self.name.trim().to_string();
    if self.name.is_empty() {
      return Err(Error::MissingField("name"));
    }
    if self.slug.as_deref().is_none_or(|s| s.trim().is_empty()) {
      self.slug = Some(slugify(&self.name));
    }
    Ok(self)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkshopPatch {
  pub name:          Option<String>,
  /// Set from `name` on rename; not accepted from callers.
  #[serde(skip_deserializing)]
  pub slug:          Option<String>,
  pub address:       Option<String>,
  pub city:          Option<String>,
  pub country:       Option<String>,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
  pub owner_id:      Option<Uuid>,
  pub is_active:     Option<bool>,
}

impl WorkshopPatch {
  /// Renaming a workshop regenerates its slug.
  pub fn with_derived_slug(mut self) -> Self {
    self.slug = self.name.as_deref().map(slugify);
    self
  }
}

// ─── Staff ───────────────────────────────────────────────────────────────────

/// A staff member of a workshop, as listed by `manage-staff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
  /// The user id.
  pub id:         Uuid,
  /// The membership row id.
  pub member_id:  Uuid,
  pub email:      String,
  pub name:       String,
  pub role:       Role,
  pub joined_at:  DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

// ─── Slugs ───────────────────────────────────────────────────────────────────

/// URL slug for a workshop name.
///
/// Lower-cases, folds accented Latin letters to their base letter, drops
/// anything outside `[a-z0-9 -]`, turns whitespace runs into `-`, collapses
/// repeated `-` and trims `-` from both ends.
pub fn slugify(name: &str) -> String {
  let folded: String = name.to_lowercase().chars().map(fold_accent).collect();
  let kept: String = folded
    .chars()
    .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || c.is_whitespace())
    .collect();

  let mut slug = String::with_capacity(kept.len());
  for c in kept.chars() {
    let c = if c.is_whitespace() { '-' } else { c };
    if c == '-' && slug.ends_with('-') {
      continue;
    }
    slug.push(c);
  }
  slug.trim_matches('-').to_string()
}

/// [`slugify`], falling back to `taller-<first 8 chars of the owner id>` when
/// nothing survives.
pub fn slug_or_fallback(name: &str, owner_id: Uuid) -> String {
  let slug = slugify(name);
  if slug.is_empty() {
    let id = owner_id.to_string();
    format!("taller-{}", &id[..8])
  } else {
    slug
  }
}

fn fold_accent(c: char) -> char {
  match c {
    'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
    'é' | 'è' | 'ê' | 'ë' => 'e',
    'í' | 'ì' | 'î' | 'ï' => 'i',
    'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
    'ú' | 'ù' | 'û' | 'ü' => 'u',
    'ñ' => 'n',
    'ç' => 'c',
    'ý' | 'ÿ' => 'y',
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugs() {
    assert_eq!(slugify("José  Peña"), "jose-pena");
    assert_eq!(slugify("Taller de Cerámica #1"), "taller-de-ceramica-1");
    assert_eq!(slugify("  --Ana--María-- "), "ana-maria");
    assert_eq!(slugify("¡¡!!"), "");
  }

  #[test]
  fn slug_fallback_uses_owner_prefix() {
    let id = Uuid::parse_str("0123abcd-0000-4000-8000-000000000000").unwrap();
    assert_eq!(slug_or_fallback("***", id), "taller-0123abcd");
    assert_eq!(slug_or_fallback("Lucía", id), "lucia");
  }

  #[test]
  fn role_labels() {
    assert_eq!(Role::from_request_label(Some("Super Admin")), Role::SuperAdmin);
    assert_eq!(Role::from_request_label(Some("super_admin")), Role::SuperAdmin);
    assert_eq!(Role::from_request_label(Some("admin")), Role::Tallerista);
    assert_eq!(Role::from_request_label(None), Role::Tallerista);
  }

  #[test]
  fn new_user_validation() {
    let short = NewUser {
      email: Some("ana@example.com".into()),
      password: Some("12345".into()),
      nombre: Some("Ana".into()),
      ..NewUser::default()
    };
    assert!(matches!(short.validate(), Err(Error::PasswordTooShort(6))));

    let missing = NewUser {
      email: Some("ana@example.com".into()),
      password: Some("123456".into()),
      ..NewUser::default()
    };
    assert!(matches!(missing.validate(), Err(Error::MissingField(_))));

    let ok = NewUser {
      email: Some("ana@example.com".into()),
      password: Some("123456".into()),
      nombre: Some("Ana".into()),
      ciudad: Some("Valencia".into()),
      ..NewUser::default()
    }
    .validate()
    .unwrap();
    assert_eq!(ok.role, Role::Tallerista);
    assert_eq!(ok.meta.city.as_deref(), Some("Valencia"));
  }

  #[test]
  fn owner_workshop() {
    let id = Uuid::new_v4();
    let w = NewWorkshop::for_owner(id, "Lucía Fernández", &ProfileMeta::default());
    assert_eq!(w.name, "Taller de Lucía Fernández");
    assert_eq!(w.slug.as_deref(), Some("lucia-fernandez"));
    assert_eq!(w.owner_id, Some(id));
  }
}
