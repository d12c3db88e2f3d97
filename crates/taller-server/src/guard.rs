//! Role guards for the workshop console (`/api`) and the admin console
//! (`/admin`).
//!
//! A caller whose role does not belong behind a guard is refused with 403 and
//! their bearer session is revoked, so the client has to sign in again.

use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use taller_api::SedeScope;
use taller_core::{directory::Role, store::DirectoryStore};

use crate::{
  AppState, Backend,
  auth::{Caller, authenticate},
  error::Error,
};

/// Admit workshop owners and staff, scoping the request to their workshop.
pub async fn require_studio<S: Backend>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response {
  let scope = studio_scope(&state, req.headers()).await;
  match scope {
    Ok(scope) => {
      req.extensions_mut().insert(scope);
      next.run(req).await
    }
    Err(e) => e.into_response(),
  }
}

/// Admit super admins only. The caller is inserted as a request extension.
pub async fn require_super_admin<S: Backend>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response {
  let caller = match authenticate(req.headers(), &*state.store).await {
    Ok(caller) => caller,
    Err(e) => return e.into_response(),
  };
  if caller.profile.role != Some(Role::SuperAdmin) {
    return reject(&state, &caller, "Access denied: super admin role required")
      .await
      .into_response();
  }
  req.extensions_mut().insert(caller);
  next.run(req).await
}

async fn studio_scope<S: Backend>(state: &AppState<S>, headers: &HeaderMap) -> Result<SedeScope, Error> {
  let caller = authenticate(headers, &*state.store).await?;
  let user_id = caller.id();

  let sede = match caller.profile.role {
    Some(Role::Tallerista) => state
      .store
      .owned_workshop(user_id)
      .await
      .map_err(Error::store)?
      .map(|w| w.id),
    Some(Role::Staff) => state
      .store
      .membership(user_id)
      .await
      .map_err(Error::store)?,
    Some(Role::SuperAdmin) | None => None,
  };

  match sede {
    Some(id) => Ok(SedeScope(id)),
    None => Err(reject(state, &caller, "Access denied: no workshop for this account").await),
  }
}

/// Revoke the caller's session and build the 403.
async fn reject<S: Backend>(state: &AppState<S>, caller: &Caller, message: &str) -> Error {
  tracing::warn!(
    user = %caller.id(),
    role = ?caller.profile.role,
    "signing out caller refused by role guard"
  );
  if let Err(e) = state.store.revoke_token(&caller.digest).await {
    tracing::error!(user = %caller.id(), error = %e, "failed to revoke bearer token");
  }
  Error::Forbidden(message.to_string())
}
