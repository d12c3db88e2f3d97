//! The privileged user-management functions under `/functions/v1`.
//!
//! Apart from a missing or invalid bearer token (401), every outcome is an
//! HTTP 200 whose body is either the success payload or `{"error": "..."}`.
//! Clients branch on the presence of `error`, not on the status code.

use axum::{
  Json, Router,
  body::Bytes,
  extract::State,
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Response},
  routing::post,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use taller_core::{
  directory::{NewUser, Role},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{
  AppState, Backend, accounts,
  auth::{Caller, authenticate},
  error::Error,
};

pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/create-user", post(create_user::<S>).options(preflight))
    .route("/delete-user", post(delete_user::<S>).options(preflight))
    .route("/manage-staff", post(manage_staff::<S>).options(preflight))
    .layer(axum::middleware::map_response_with_state(
      state.clone(),
      cors::<S>,
    ))
    .with_state(state)
}

// ─── CORS ─────────────────────────────────────────────────────────────────────

async fn preflight() -> &'static str { "ok" }

async fn cors<S: Backend>(State(state): State<AppState<S>>, mut res: Response) -> Response {
  let headers = res.headers_mut();
  match HeaderValue::from_str(&state.config.cors_origin) {
    Ok(origin) => {
      headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    Err(_) => tracing::warn!(origin = %state.config.cors_origin, "invalid CORS origin in config"),
  }
  headers.insert(
    header::ACCESS_CONTROL_ALLOW_HEADERS,
    HeaderValue::from_static("authorization, x-client-info, apikey, content-type"),
  );
  headers.insert(
    header::ACCESS_CONTROL_ALLOW_METHODS,
    HeaderValue::from_static("POST, OPTIONS"),
  );
  res
}

// ─── In-band bodies ───────────────────────────────────────────────────────────

fn in_band(message: impl Into<String>) -> Response {
  Json(json!({ "error": message.into() })).into_response()
}

fn failure(e: Error) -> Response {
  if matches!(e, Error::Store(_) | Error::Hash(_) | Error::IdentityDeletion(_)) {
    tracing::error!(error = %e, "function failed");
  }
  in_band(e.in_band_message())
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
  serde_json::from_slice(body).map_err(|e| Error::BadRequest(e.to_string()))
}

// ─── create-user ──────────────────────────────────────────────────────────────

async fn create_user<S: Backend>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, Error> {
  let caller = authenticate(&headers, &*state.store).await?;
  if caller.profile.role != Some(Role::SuperAdmin) {
    tracing::warn!(user = %caller.id(), "create-user refused for a non super admin");
    return Ok(in_band("Forbidden: Only Super Admins can execute this action."));
  }

  let result = async {
    let input: NewUser = parse(&body)?;
    accounts::create_user(&*state.store, input).await
  }
  .await;

  Ok(match result {
    Ok(created) => Json(created).into_response(),
    Err(e) => failure(e),
  })
}

// ─── delete-user ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DeleteUserRequest {
  #[serde(rename = "userId")]
  user_id: Option<String>,
}

async fn delete_user<S: Backend>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, Error> {
  let caller = authenticate(&headers, &*state.store).await?;
  if caller.profile.role != Some(Role::SuperAdmin) {
    tracing::warn!(user = %caller.id(), "delete-user refused for a non super admin");
    return Ok(in_band("Forbidden: Only Super Admins can delete users."));
  }

  let result = async {
    let request: DeleteUserRequest = parse(&body)?;
    let Some(raw_id) = request.user_id.filter(|id| !id.is_empty()) else {
      return Err(Error::BadRequest("Falta el campo userId".to_string()));
    };
    let user_id =
      Uuid::parse_str(&raw_id).map_err(|e| Error::IdentityDeletion(e.to_string()))?;
    if user_id == caller.id() {
      return Err(Error::BadRequest("No puedes eliminarte a ti mismo".to_string()));
    }
    accounts::delete_user(&*state.store, user_id).await
  }
  .await;

  Ok(match result {
    Ok(()) => Json(json!({
      "success": true,
      "message": "Usuario y todos sus datos eliminados correctamente",
    }))
    .into_response(),
    Err(e) => failure(e),
  })
}

// ─── manage-staff ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StaffRequest {
  #[serde(default)]
  action:        String,
  nombre:        Option<String>,
  email:         Option<String>,
  password:      Option<String>,
  #[serde(rename = "staffUserId")]
  staff_user_id: Option<Uuid>,
}

/// List, create and delete the staff of the caller's workshop. Staff members
/// may list; only the owner may create or delete.
async fn manage_staff<S: Backend>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, Error> {
  let caller = authenticate(&headers, &*state.store).await?;
  Ok(match staff_action(&*state.store, &caller, &body).await {
    Ok(res) => res,
    Err(e) => failure(e),
  })
}

async fn staff_action<S: Backend>(store: &S, caller: &Caller, body: &[u8]) -> Result<Response, Error> {
  let (sede, is_owner) = match caller.profile.role {
    Some(Role::Tallerista) => (
      store
        .owned_workshop(caller.id())
        .await
        .map_err(Error::store)?
        .map(|w| w.id),
      true,
    ),
    Some(Role::Staff) => (store.membership(caller.id()).await.map_err(Error::store)?, false),
    Some(Role::SuperAdmin) | None => (None, false),
  };
  let Some(sede) = sede else {
    return Err(Error::Forbidden("Forbidden: No workshop found for this account.".to_string()));
  };

  let request: StaffRequest = parse(body)?;
  match request.action.as_str() {
    "list" => {
      let staff = store.list_staff(sede).await.map_err(Error::store)?;
      Ok(Json(json!({ "staff": staff })).into_response())
    }
    "create" | "delete" if !is_owner => Err(Error::Forbidden(
      "Forbidden: Only the workshop owner can manage staff.".to_string(),
    )),
    "create" => {
      let input = NewUser {
        email: request.email,
        password: request.password,
        nombre: request.nombre,
        ..NewUser::default()
      };
      let user = accounts::create_staff(store, sede, input).await?;
      Ok(Json(json!({ "success": true, "user": user })).into_response())
    }
    "delete" => {
      let Some(user_id) = request.staff_user_id else {
        return Err(Error::BadRequest("Falta el campo staffUserId".to_string()));
      };
      let staff = store.list_staff(sede).await.map_err(Error::store)?;
      if !staff.iter().any(|m| m.id == user_id) {
        return Err(Error::NotFound("El usuario no pertenece a este taller".to_string()));
      }
      store
        .remove_member(sede, user_id)
        .await
        .map_err(Error::store)?;
      accounts::delete_user(store, user_id).await?;
      Ok(Json(json!({ "success": true })).into_response())
    }
    other => Err(Error::BadRequest(format!("Acción no válida: {other}"))),
  }
}
