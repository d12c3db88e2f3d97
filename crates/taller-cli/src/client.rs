//! Async HTTP client for the Taller auth, functions and admin endpoints.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use taller_core::{
  directory::{NewUser, Profile, Workshop},
  report::WorkshopReport,
};
use uuid::Uuid;

/// Connection settings for a Taller server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub token:    Option<String>,
}

/// A signed-in session returned by the password grant.
#[derive(Debug, Deserialize)]
pub struct Session {
  pub access_token: String,
  pub expires_in:   i64,
  pub user:         Profile,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  fn require_token(&self) -> Result<()> {
    if self.config.token.is_none() {
      bail!("no access token; run `taller login` and set TALLER_TOKEN");
    }
    Ok(())
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /auth/v1/token?grant_type=password`
  pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
    let resp = self
      .client
      .post(self.url("/auth/v1/token"))
      .query(&[("grant_type", "password")])
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await
      .context("POST /auth/v1/token failed")?;
    decode(resp, "signing in").await
  }

  // ── Functions ─────────────────────────────────────────────────────────────

  /// `POST /functions/v1/create-user`
  pub async fn create_user(&self, input: &NewUser) -> Result<Value> {
    self.require_token()?;
    let resp = self
      .auth(self.client.post(self.url("/functions/v1/create-user")))
      .json(input)
      .send()
      .await
      .context("POST /functions/v1/create-user failed")?;
    in_band(decode(resp, "creating user").await?)
  }

  /// `POST /functions/v1/delete-user`
  pub async fn delete_user(&self, user_id: Uuid) -> Result<String> {
    self.require_token()?;
    let resp = self
      .auth(self.client.post(self.url("/functions/v1/delete-user")))
      .json(&json!({ "userId": user_id }))
      .send()
      .await
      .context("POST /functions/v1/delete-user failed")?;
    let body = in_band(decode(resp, "deleting user").await?)?;
    Ok(
      body["message"]
        .as_str()
        .unwrap_or("user deleted")
        .to_string(),
    )
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  /// `GET /admin/workshops`
  pub async fn list_workshops(&self) -> Result<Vec<Workshop>> {
    self.require_token()?;
    let resp = self
      .auth(self.client.get(self.url("/admin/workshops")))
      .send()
      .await
      .context("GET /admin/workshops failed")?;
    decode(resp, "listing workshops").await
  }

  /// `GET /admin/reports/workshops`
  pub async fn workshop_report(&self) -> Result<WorkshopReport> {
    self.require_token()?;
    let resp = self
      .auth(self.client.get(self.url("/admin/reports/workshops")))
      .send()
      .await
      .context("GET /admin/reports/workshops failed")?;
    decode(resp, "fetching workshop report").await
  }
}

/// Deserialize a successful response, or turn the server's `{"error": ...}`
/// body into the error message.
async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    return Err(match body["error"].as_str() {
      Some(msg) => anyhow!("{what}: {msg} ({status})"),
      None => anyhow!("{what}: {status}"),
    });
  }
  resp
    .json()
    .await
    .with_context(|| format!("deserialising response while {what}"))
}

/// Function endpoints answer 200 even when they fail; an `error` field in the
/// body is the failure.
pub fn in_band(body: Value) -> Result<Value> {
  match body.get("error").and_then(Value::as_str) {
    Some(msg) => Err(anyhow!("{msg}")),
    None => Ok(body),
  }
}
