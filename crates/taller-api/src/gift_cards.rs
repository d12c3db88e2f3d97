//! Handlers for `/gift-cards` endpoints.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use taller_core::{
  gift_card::{GiftCard, GiftCardPatch, NewGiftCard},
  store::Tenancy,
};
use uuid::Uuid;

use crate::{SedeScope, error::ApiError, studio};

/// `GET /gift-cards`
pub async fn list<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
) -> Result<Json<Vec<GiftCard>>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).list_gift_cards().await?))
}

/// `POST /gift-cards`
pub async fn create<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Json(body): Json<NewGiftCard>,
) -> Result<impl IntoResponse, ApiError> {
  let card = studio(&*tenancy, scope).add_gift_card(body).await?;
  Ok((StatusCode::CREATED, Json(card)))
}

/// `PATCH /gift-cards/:id`
pub async fn update<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
  Json(patch): Json<GiftCardPatch>,
) -> Result<Json<GiftCard>, ApiError> {
  Ok(Json(studio(&*tenancy, scope).update_gift_card(id, patch).await?))
}

/// `DELETE /gift-cards/:id`
pub async fn delete<T: Tenancy>(
  State(tenancy): State<Arc<T>>,
  Extension(scope): Extension<SedeScope>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  studio(&*tenancy, scope).delete_gift_card(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
