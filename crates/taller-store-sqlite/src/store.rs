//! [`SqliteStore`]: the SQLite implementation of [`DirectoryStore`] and
//! [`Tenancy`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use taller_core::{
  directory::{
    NewWorkshop, Profile, ProfileMeta, ProfilePatch, Role, StaffMember, Workshop,
    WorkshopPatch, slugify,
  },
  store::{DirectoryStore, Identity, Tenancy},
};

use crate::{
  Error, Result,
  encode::{
    RawProfile, RawStaff, RawWorkshop, decode_dt, decode_uuid, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  sede::SedeStore,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The whole Taller database in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-column query for one optional text value.
  async fn query_opt_text(&self, sql: &'static str, arg: String) -> Result<Option<String>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(sql, rusqlite::params![arg], |row| row.get(0))
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn get_profile_raw(&self, id: Uuid) -> Result<Option<RawProfile>> {
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!("SELECT {} FROM profiles WHERE id = ?1", RawProfile::COLUMNS),
                rusqlite::params![id_str],
                RawProfile::from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }
}

// ─── Tenancy impl ────────────────────────────────────────────────────────────

impl Tenancy for SqliteStore {
  type Studio = SedeStore;

  fn studio(&self, sede_id: Uuid) -> SedeStore { SedeStore::new(self.conn.clone(), sede_id) }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn create_identity(
    &self,
    email:         &str,
    password_hash: &str,
    role:          Option<Role>,
    meta:          &ProfileMeta,
  ) -> Result<Profile> {
    let profile = Profile {
      id:         Uuid::new_v4(),
      email:      email.trim().to_lowercase(),
      full_name:  meta.full_name.clone(),
      phone:      meta.phone.clone(),
      role,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(profile.id);
    let email_str = profile.email.clone();
    let hash      = password_hash.to_owned();
    let at_str    = encode_dt(profile.created_at);
    let full_name = profile.full_name.clone();
    let phone     = profile.phone.clone();
    let role_str  = role.map(|r| r.as_ref().to_owned());
    let country   = meta.country.clone();
    let city      = meta.city.clone();

    let created: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_str, hash, at_str],
        );
        match inserted {
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            return Ok(false);
          }
          other => {
            other?;
          }
        }
        tx.execute(
          "INSERT INTO profiles (id, email, full_name, phone, role, country, city, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![id_str, email_str, full_name, phone, role_str, country, city, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken(profile.email));
    }
    Ok(profile)
  }

  async fn find_identity(&self, email: &str) -> Result<Option<Identity>> {
    let email_str = email.trim().to_owned();

    let raw: Option<(String, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, email, password_hash FROM users WHERE email = ?1",
              rusqlite::params![email_str],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(id, email, password_hash)| {
        Ok(Identity {
          id: decode_uuid(&id)?,
          email,
          password_hash,
        })
      })
      .transpose()
  }

  async fn delete_identity(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Bearer sessions ───────────────────────────────────────────────────────

  async fn insert_token(
    &self,
    user_id:    Uuid,
    digest:     &str,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let user_str    = encode_uuid(user_id);
    let digest      = digest.to_owned();
    let created_str = encode_dt(Utc::now());
    let expires_str = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO auth_sessions (token_digest, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![digest, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn resolve_token(&self, digest: &str, now: DateTime<Utc>) -> Result<Option<Uuid>> {
    let digest = digest.to_owned();

    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, expires_at FROM auth_sessions WHERE token_digest = ?1",
              rusqlite::params![digest],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((user_id, expires_at)) = raw else {
      return Ok(None);
    };
    if decode_dt(&expires_at)? <= now {
      return Ok(None);
    }
    Ok(Some(decode_uuid(&user_id)?))
  }

  async fn revoke_token(&self, digest: &str) -> Result<bool> {
    let digest = digest.to_owned();
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM auth_sessions WHERE token_digest = ?1",
          rusqlite::params![digest],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self
      .get_profile_raw(id)
      .await?
      .map(RawProfile::into_profile)
      .transpose()
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM profiles ORDER BY created_at",
          RawProfile::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> Result<Option<Profile>> {
    let id_str    = encode_uuid(id);
    let full_name = patch.full_name.clone();
    let phone     = patch.phone.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE profiles
              SET full_name = COALESCE(?2, full_name),
                  phone     = COALESCE(?3, phone)
            WHERE id = ?1",
          rusqlite::params![id_str, full_name, phone],
        )?;
        Ok(())
      })
      .await?;

    self.get_profile(id).await
  }

  async fn delete_profile(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM profiles WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Workshops ─────────────────────────────────────────────────────────────

  async fn insert_workshop(&self, input: &NewWorkshop) -> Result<Workshop> {
    let now = Utc::now();
    let workshop = Workshop {
      id:            Uuid::new_v4(),
      name:          input.name.clone(),
      slug:          input.slug.clone().unwrap_or_else(|| slugify(&input.name)),
      address:       input.address.clone(),
      city:          input.city.clone(),
      country:       input.country.clone(),
      contact_email: input.contact_email.clone(),
      contact_phone: input.contact_phone.clone(),
      owner_id:      input.owner_id,
      is_active:     input.is_active,
      created_at:    now,
      updated_at:    now,
    };

    let w = workshop.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sedes (
             id, name, slug, address, city, country, contact_email, contact_phone,
             owner_id, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            encode_uuid(w.id),
            w.name,
            w.slug,
            w.address,
            w.city,
            w.country,
            w.contact_email,
            w.contact_phone,
            w.owner_id.map(encode_uuid),
            w.is_active,
            encode_dt(w.created_at),
            encode_dt(w.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(sede = %workshop.id, slug = %workshop.slug, "workshop inserted");
    Ok(workshop)
  }

  async fn get_workshop(&self, id: Uuid) -> Result<Option<Workshop>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawWorkshop> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM sedes WHERE id = ?1", RawWorkshop::COLUMNS),
              rusqlite::params![id_str],
              RawWorkshop::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawWorkshop::into_workshop).transpose()
  }

  async fn list_workshops(&self) -> Result<Vec<Workshop>> {
    let raws: Vec<RawWorkshop> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM sedes ORDER BY created_at",
          RawWorkshop::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawWorkshop::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWorkshop::into_workshop).collect()
  }

  async fn update_workshop(&self, id: Uuid, patch: &WorkshopPatch) -> Result<Option<Workshop>> {
    let id_str = encode_uuid(id);
    let p = patch.clone();
    let now_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sedes
              SET name          = COALESCE(?2, name),
                  slug          = COALESCE(?3, slug),
                  address       = COALESCE(?4, address),
                  city          = COALESCE(?5, city),
                  country       = COALESCE(?6, country),
                  contact_email = COALESCE(?7, contact_email),
                  contact_phone = COALESCE(?8, contact_phone),
                  owner_id      = COALESCE(?9, owner_id),
                  is_active     = COALESCE(?10, is_active),
                  updated_at    = ?11
            WHERE id = ?1",
          rusqlite::params![
            id_str,
            p.name,
            p.slug,
            p.address,
            p.city,
            p.country,
            p.contact_email,
            p.contact_phone,
            p.owner_id.map(encode_uuid),
            p.is_active,
            now_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.get_workshop(id).await
  }

  async fn owned_workshop(&self, user_id: Uuid) -> Result<Option<Workshop>> {
    let id = self
      .query_opt_text(
        "SELECT id FROM sedes WHERE owner_id = ?1 ORDER BY created_at LIMIT 1",
        encode_uuid(user_id),
      )
      .await?;
    match id {
      Some(id) => self.get_workshop(decode_uuid(&id)?).await,
      None => Ok(None),
    }
  }

  async fn purge_workshop(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for table in [
          "session_students",
          "sessions",
          "student_assigned_classes",
          "students",
          "teachers",
          "pieces",
          "gift_cards",
          "inventory_movements",
          "inventory_items",
          "payments",
          "sede_members",
        ] {
          tx.execute(
            &format!("DELETE FROM {table} WHERE sede_id = ?1"),
            rusqlite::params![id_str],
          )?;
        }
        let n = tx.execute("DELETE FROM sedes WHERE id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    tracing::info!(sede = %id, "workshop purged");
    Ok(deleted > 0)
  }

  // ── Membership ────────────────────────────────────────────────────────────

  async fn add_member(&self, sede_id: Uuid, user_id: Uuid) -> Result<Uuid> {
    let member_id = Uuid::new_v4();
    let id_str    = encode_uuid(member_id);
    let sede_str  = encode_uuid(sede_id);
    let user_str  = encode_uuid(user_id);
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sede_members (id, sede_id, user_id, role, joined_at)
           VALUES (?1, ?2, ?3, 'staff', ?4)",
          rusqlite::params![id_str, sede_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(member_id)
  }

  async fn membership(&self, user_id: Uuid) -> Result<Option<Uuid>> {
    self
      .query_opt_text(
        "SELECT sede_id FROM sede_members WHERE user_id = ?1 ORDER BY joined_at LIMIT 1",
        encode_uuid(user_id),
      )
      .await?
      .as_deref()
      .map(decode_uuid)
      .transpose()
  }

  async fn list_staff(&self, sede_id: Uuid) -> Result<Vec<StaffMember>> {
    let sede_str = encode_uuid(sede_id);

    let raws: Vec<RawStaff> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.user_id, m.id, p.email, p.full_name, m.role, m.joined_at, p.created_at
             FROM sede_members m
             JOIN profiles p ON p.id = m.user_id
            WHERE m.sede_id = ?1
            ORDER BY m.joined_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![sede_str], RawStaff::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStaff::into_staff).collect()
  }

  async fn remove_member(&self, sede_id: Uuid, user_id: Uuid) -> Result<bool> {
    let sede_str = encode_uuid(sede_id);
    let user_str = encode_uuid(user_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sede_members WHERE sede_id = ?1 AND user_id = ?2",
          rusqlite::params![sede_str, user_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }
}
