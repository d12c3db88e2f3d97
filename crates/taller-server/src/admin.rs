//! Super-admin console endpoints under `/admin`. The router is mounted behind
//! [`crate::guard::require_super_admin`].

use axum::{
  Extension, Json, Router,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
  routing::{get, patch},
};
use serde_json::{Value, json};
use taller_core::{
  directory::{NewWorkshop, Profile, ProfilePatch, Workshop, WorkshopPatch},
  report::WorkshopReport,
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{AppState, Backend, accounts, auth::Caller, error::Error};

pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route(
      "/workshops",
      get(list_workshops::<S>).post(create_workshop::<S>),
    )
    .route(
      "/workshops/{id}",
      patch(update_workshop::<S>).delete(delete_workshop::<S>),
    )
    .route("/users", get(list_users::<S>))
    .route("/users/{id}", patch(update_user::<S>))
    .route("/reports/workshops", get(workshop_report::<S>))
    .with_state(state)
}

// ─── Workshops ────────────────────────────────────────────────────────────────

/// `GET /admin/workshops`
async fn list_workshops<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Workshop>>, Error> {
  let workshops = state.store.list_workshops().await.map_err(Error::store)?;
  Ok(Json(workshops))
}

/// `POST /admin/workshops`
async fn create_workshop<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewWorkshop>,
) -> Result<impl IntoResponse, Error> {
  let input = body.validated()?;
  let workshop = state
    .store
    .insert_workshop(&input)
    .await
    .map_err(Error::store)?;
  tracing::info!(sede = %workshop.id, slug = %workshop.slug, "workshop created");
  Ok((StatusCode::CREATED, Json(workshop)))
}

/// `PATCH /admin/workshops/:id`
async fn update_workshop<S: Backend>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<WorkshopPatch>,
) -> Result<Json<Workshop>, Error> {
  let patch = patch.with_derived_slug();
  state
    .store
    .update_workshop(id, &patch)
    .await
    .map_err(Error::store)?
    .map(Json)
    .ok_or_else(|| Error::NotFound(format!("workshop not found: {id}")))
}

/// `DELETE /admin/workshops/:id`
///
/// Deleting a workshop deletes its owner, through the same cascade as the
/// `delete-user` function.
async fn delete_workshop<S: Backend>(
  State(state): State<AppState<S>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, Error> {
  let workshop = state
    .store
    .get_workshop(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("workshop not found: {id}")))?;

  let Some(owner) = workshop.owner_id else {
    return Err(Error::BadRequest(
      "No se encontró el propietario del taller".to_string(),
    ));
  };
  if owner == caller.id() {
    return Err(Error::BadRequest("No puedes eliminarte a ti mismo".to_string()));
  }

  accounts::delete_user(&*state.store, owner).await?;
  Ok(Json(json!({
    "success": true,
    "message": "Usuario y todos sus datos eliminados correctamente",
  })))
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// `GET /admin/users`
async fn list_users<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Profile>>, Error> {
  let users = state.store.list_profiles().await.map_err(Error::store)?;
  Ok(Json(users))
}

/// `PATCH /admin/users/:id`
async fn update_user<S: Backend>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, Error> {
  state
    .store
    .update_profile(id, &patch)
    .await
    .map_err(Error::store)?
    .map(Json)
    .ok_or_else(|| Error::NotFound(format!("user not found: {id}")))
}

// ─── Reports ──────────────────────────────────────────────────────────────────

/// `GET /admin/reports/workshops`
async fn workshop_report<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<WorkshopReport>, Error> {
  let workshops = state.store.list_workshops().await.map_err(Error::store)?;
  let users = state.store.list_profiles().await.map_err(Error::store)?;
  Ok(Json(WorkshopReport::build(&workshops, users.len())))
}
