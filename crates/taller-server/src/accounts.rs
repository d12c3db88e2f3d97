//! User provisioning and the delete-user cascade, shared by the functions
//! endpoints, the admin console and the bootstrap command.

use serde::Serialize;
use taller_core::{
  directory::{NewUser, NewWorkshop, Profile, Role, ValidUser, Workshop},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{Backend, auth::hash_password, error::Error};

/// Outcome of the workshop provisioned for a new owner. A failure is reported
/// next to the created user instead of failing the request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SedeOutcome {
  Created(Workshop),
  Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
  pub user: Profile,
  pub sede: Option<SedeOutcome>,
}

// ─── Creation ─────────────────────────────────────────────────────────────────

/// Create an identity and profile with the role named in `input`. Workshop
/// owners also get a `Taller de <nombre>` workshop.
pub async fn create_user<S: Backend>(store: &S, input: NewUser) -> Result<CreatedUser, Error> {
  let valid = input.validate()?;
  let user = create_identity(store, &valid).await?;
  tracing::info!(user = %user.id, role = %valid.role, "user created");

  let sede = if valid.role == Role::Tallerista {
    Some(provision_workshop(store, &user, &valid).await)
  } else {
    None
  };

  Ok(CreatedUser { user, sede })
}

/// Create a staff account and attach it to `sede_id`.
pub async fn create_staff<S: Backend>(
  store: &S,
  sede_id: Uuid,
  input: NewUser,
) -> Result<Profile, Error> {
  let mut valid = input.validate()?;
  valid.role = Role::Staff;
  valid.email = valid.email.trim().to_lowercase();

  let user = create_identity(store, &valid).await?;
  store
    .add_member(sede_id, user.id)
    .await
    .map_err(Error::store)?;

  tracing::info!(user = %user.id, sede = %sede_id, "staff member created");
  Ok(user)
}

async fn create_identity<S: Backend>(store: &S, valid: &ValidUser) -> Result<Profile, Error> {
  if store
    .find_identity(&valid.email)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::EmailTaken);
  }

  let hash = hash_password(&valid.password)?;
  store
    .create_identity(&valid.email, &hash, Some(valid.role), &valid.meta)
    .await
    .map_err(Error::store)
}

async fn provision_workshop<S: Backend>(store: &S, user: &Profile, valid: &ValidUser) -> SedeOutcome {
  let input = NewWorkshop::for_owner(user.id, &valid.nombre, &valid.meta);
  match store.insert_workshop(&input).await {
    Ok(workshop) => {
      tracing::info!(user = %user.id, sede = %workshop.id, slug = %workshop.slug, "workshop provisioned");
      SedeOutcome::Created(workshop)
    }
    Err(e) => {
      tracing::error!(user = %user.id, error = %e, "failed to provision workshop for new owner");
      SedeOutcome::Failed { error: e.to_string() }
    }
  }
}

// ─── Deletion ─────────────────────────────────────────────────────────────────

/// Remove a user and everything they own.
///
/// The owned workshop and its studio data go first, then the profile, then
/// the identity. Only a failure to delete the identity is reported; earlier
/// steps are logged and skipped.
pub async fn delete_user<S: Backend>(store: &S, user_id: Uuid) -> Result<(), Error> {
  match store.owned_workshop(user_id).await {
    Ok(Some(workshop)) => match store.purge_workshop(workshop.id).await {
      Ok(_) => tracing::info!(user = %user_id, sede = %workshop.id, "owned workshop purged"),
      Err(e) => tracing::error!(user = %user_id, sede = %workshop.id, error = %e, "failed to purge owned workshop"),
    },
    Ok(None) => {}
    Err(e) => tracing::error!(user = %user_id, error = %e, "failed to look up owned workshop"),
  }

  if let Err(e) = store.delete_profile(user_id).await {
    tracing::error!(user = %user_id, error = %e, "failed to delete profile");
  }

  match store.delete_identity(user_id).await {
    Ok(true) => {
      tracing::info!(user = %user_id, "user deleted");
      Ok(())
    }
    Ok(false) => Err(Error::IdentityDeletion("User not found".to_string())),
    Err(e) => Err(Error::IdentityDeletion(e.to_string())),
  }
}
