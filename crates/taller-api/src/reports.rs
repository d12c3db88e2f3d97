//! Handlers for `/snapshot` and `/dashboard`.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use taller_core::{report::Dashboard, store::Tenancy, studio::Snapshot};

use crate::{SedeScope, error::ApiError, studio};

/// `GET /snapshot`. Every table of the workshop in one response.
pub async fn snapshot<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Snapshot>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).snapshot().await?))
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
  /// Defaults to the server's local date.
  pub date: Option<NaiveDate>,
}

/// `GET /dashboard[?date=YYYY-MM-DD]`
pub async fn dashboard<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>, ApiError> {
  let today = params.date.unwrap_or_else(|| Local::now().date_naive());
  Ok(Json(studio(&*tenancy, scope).dashboard(today).await?))
}
