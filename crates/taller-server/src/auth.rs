//! Password hashing, opaque bearer tokens and the `/auth/v1` endpoints.
//!
//! Tokens are 32 random bytes, URL-safe base64 encoded. Only the SHA-256 hex
//! digest of a token is ever stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json, Router,
  extract::{FromRequestParts, Query, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  routing::{get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use taller_core::{
  directory::{MIN_PASSWORD_LEN, Profile, ProfileMeta},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{AppState, Backend, error::Error};

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

pub struct IssuedToken {
  /// Handed to the client once.
  pub token:  String,
  /// What the store keeps.
  pub digest: String,
}

pub fn issue_token() -> IssuedToken {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  let token = URL_SAFE_NO_PAD.encode(bytes);
  let digest = token_digest(&token);
  IssuedToken { token, digest }
}

pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Caller ───────────────────────────────────────────────────────────────────

/// An authenticated request: the caller's profile and the digest of the
/// bearer token they presented.
#[derive(Debug, Clone)]
pub struct Caller {
  pub profile: Profile,
  pub digest:  String,
}

impl Caller {
  pub fn id(&self) -> Uuid { self.profile.id }
}

/// Resolve the bearer token in `headers` to a caller.
pub async fn authenticate<S: Backend>(headers: &HeaderMap, store: &S) -> Result<Caller, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::MissingAuthorization)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)?;

  let digest = token_digest(token);
  let user_id = store
    .resolve_token(&digest, Utc::now())
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  let profile = store
    .get_profile(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  Ok(Caller { profile, digest })
}

impl<S: Backend> FromRequestParts<AppState<S>> for Caller {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, &*state.store).await
  }
}

// ─── Endpoints ────────────────────────────────────────────────────────────────

pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/signup", post(signup::<S>))
    .route("/token", post(token::<S>))
    .route("/logout", post(logout::<S>))
    .route("/user", get(user::<S>))
    .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
  #[serde(default)]
  pub email:     String,
  #[serde(default)]
  pub password:  String,
  pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
  pub grant_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   &'static str,
  /// Seconds until the token expires.
  pub expires_in:   i64,
  pub expires_at:   DateTime<Utc>,
  pub user:         Profile,
}

/// Self-service sign-up. The profile gets no role, so the account cannot use
/// either console until a super admin provisions it.
async fn signup<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<Profile>), Error> {
  let email = body.email.trim();
  if email.is_empty() || body.password.is_empty() {
    return Err(taller_core::Error::MissingField("email, password").into());
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(taller_core::Error::PasswordTooShort(MIN_PASSWORD_LEN).into());
  }
  if state
    .store
    .find_identity(email)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::EmailTaken);
  }

  let hash = hash_password(&body.password)?;
  let meta = ProfileMeta {
    full_name: body.full_name,
    ..ProfileMeta::default()
  };
  let profile = state
    .store
    .create_identity(email, &hash, None, &meta)
    .await
    .map_err(Error::store)?;

  tracing::info!(user = %profile.id, "account signed up");
  Ok((StatusCode::CREATED, Json(profile)))
}

/// Password grant.
async fn token<S: Backend>(
  State(state): State<AppState<S>>,
  Query(params): Query<TokenParams>,
  Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, Error> {
  if let Some(grant) = params.grant_type.as_deref()
    && grant != "password"
  {
    return Err(Error::BadRequest(format!("unsupported grant_type: {grant}")));
  }

  let invalid = || Error::BadRequest("Invalid login credentials".to_string());

  let identity = state
    .store
    .find_identity(body.email.trim())
    .await
    .map_err(Error::store)?
    .ok_or_else(invalid)?;

  if !verify_password(&body.password, &identity.password_hash) {
    tracing::warn!(user = %identity.id, "rejected sign-in with a wrong password");
    return Err(invalid());
  }

  let profile = state
    .store
    .get_profile(identity.id)
    .await
    .map_err(Error::store)?
    .ok_or_else(invalid)?;

  let ttl = Duration::hours(state.config.token_ttl_hours);
  let expires_at = Utc::now() + ttl;
  let issued = issue_token();
  state
    .store
    .insert_token(identity.id, &issued.digest, expires_at)
    .await
    .map_err(Error::store)?;

  tracing::info!(user = %identity.id, "bearer token issued");
  Ok(Json(TokenResponse {
    access_token: issued.token,
    token_type: "bearer",
    expires_in: ttl.num_seconds(),
    expires_at,
    user: profile,
  }))
}

async fn logout<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<StatusCode, Error> {
  state
    .store
    .revoke_token(&caller.digest)
    .await
    .map_err(Error::store)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn user<S: Backend>(caller: Caller) -> Json<Profile> { Json(caller.profile) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_hash_verifies_only_the_original() {
    let phc = hash_password("barro-cocido").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("barro-cocido", &phc));
    assert!(!verify_password("barro-crudo", &phc));
    assert!(!verify_password("barro-cocido", "not a phc string"));
  }

  #[test]
  fn tokens_are_random_and_only_digests_are_hex() {
    let a = issue_token();
    let b = issue_token();
    assert_ne!(a.token, b.token);
    // 32 bytes, unpadded base64.
    assert_eq!(a.token.len(), 43);
    assert_eq!(a.digest.len(), 64);
    assert!(a.digest.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(a.digest, token_digest(&a.token));
  }

  #[tokio::test]
  async fn missing_and_malformed_headers_are_distinguished() {
    let store = taller_store_sqlite::SqliteStore::open_in_memory().await.unwrap();

    let err = authenticate(&HeaderMap::new(), &store).await.unwrap_err();
    assert!(matches!(err, Error::MissingAuthorization));

    let mut basic = HeaderMap::new();
    basic.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
    let err = authenticate(&basic, &store).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));

    let mut unknown = HeaderMap::new();
    unknown.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
    let err = authenticate(&unknown, &store).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
  }
}
