//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Extension, Router,
  body::Body,
  http::{Request, StatusCode},
};
use serde_json::{Value, json};
use taller_core::{directory::NewWorkshop, store::DirectoryStore};
use taller_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{SedeScope, api_router};

async fn setup() -> (Arc<SqliteStore>, Uuid) {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("store"));
  let input = NewWorkshop {
    name: "Taller Central".into(),
    ..NewWorkshop::default()
  }
  .validated()
  .unwrap();
  let sede = store.insert_workshop(&input).await.unwrap().id;
  (store, sede)
}

fn router(store: Arc<SqliteStore>, sede: Uuid) -> Router {
  api_router(store).layer(Extension(SedeScope(sede)))
}

async fn call(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(b) => builder
      .header("content-type", "application/json")
      .body(Body::from(b.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

#[tokio::test]
async fn student_with_assigned_class_appears_on_session_roster() {
  let (store, sede) = setup().await;

  let (status, student) = call(
    router(store.clone(), sede),
    "POST",
    "/students",
    Some(json!({
      "name": "Ana",
      "surname": "Martínez",
      "classes_remaining": 3,
      "assigned_classes": [
        { "date": "2025-03-10", "start_time": "10:00", "end_time": "12:00" }
      ]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(student["assigned_classes"][0]["status"], "pending");

  let (status, sessions) = call(router(store, sede), "GET", "/sessions", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(sessions[0]["class_type"], "mesa");
  assert_eq!(sessions[0]["start_time"], "10:00");
  assert_eq!(sessions[0]["students"], json!(["ANA MARTÍNEZ"]));
}

#[tokio::test]
async fn unknown_student_is_404() {
  let (store, sede) = setup().await;
  let (status, body) = call(
    router(store, sede),
    "GET",
    &format!("/students/{}", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("student not found"));
}

#[tokio::test]
async fn duplicate_session_is_409_and_bad_range_is_400() {
  let (store, sede) = setup().await;
  let body = json!({
    "date": "2025-03-10", "start_time": "18:00", "end_time": "20:00", "class_type": "torno"
  });

  let (status, _) = call(router(store.clone(), sede), "POST", "/sessions", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = call(router(store.clone(), sede), "POST", "/sessions", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    router(store, sede),
    "POST",
    "/sessions",
    Some(json!({
      "date": "2025-03-10", "start_time": "20:00", "end_time": "18:00", "class_type": "torno"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attendance_put_marks_roster() {
  let (store, sede) = setup().await;
  call(
    router(store.clone(), sede),
    "POST",
    "/students",
    Some(json!({
      "name": "Sofía",
      "surname": "Gómez",
      "assigned_classes": [
        { "date": "2025-03-11", "start_time": "10:00", "end_time": "12:00" }
      ]
    })),
  )
  .await;
  let (_, sessions) = call(router(store.clone(), sede), "GET", "/sessions", None).await;
  let id = sessions[0]["id"].as_str().unwrap().to_string();

  let (status, session) = call(
    router(store, sede),
    "PUT",
    &format!("/sessions/{id}/attendance"),
    Some(json!({ "SOFÍA GÓMEZ": "absent" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(session["attendance"]["SOFÍA GÓMEZ"], "absent");
}

#[tokio::test]
async fn movement_with_new_quantity_updates_stock() {
  let (store, sede) = setup().await;
  let (status, item) = call(
    router(store.clone(), sede),
    "POST",
    "/inventory/items",
    Some(json!({
      "category": "glaze",
      "name": "Celadón",
      "code": "es-01",
      "unit": "kg",
      "current_quantity": 4.0,
      "min_quantity": 2.0,
      "color_family": "verdes"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(item["code"], "ES-01");
  let id = item["id"].as_str().unwrap().to_string();

  let (status, movement) = call(
    router(store.clone(), sede),
    "POST",
    "/inventory/movements",
    Some(json!({
      "item_id": id,
      "type": "out",
      "quantity": 3.0,
      "new_quantity": 1.0,
      "reason": "Clase de esmaltado"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(movement["reason"], "Clase de esmaltado [Stock: 1]");

  let (_, summary) = call(router(store, sede), "GET", "/inventory/summary", None).await;
  assert_eq!(summary["overall"]["critical"], 1);
}

#[tokio::test]
async fn workshop_scope_isolates_data() {
  let (store, sede) = setup().await;
  let other = store
    .insert_workshop(
      &NewWorkshop {
        name: "Otro".into(),
        ..NewWorkshop::default()
      }
      .validated()
      .unwrap(),
    )
    .await
    .unwrap()
    .id;

  call(
    router(store.clone(), sede),
    "POST",
    "/teachers",
    Some(json!({ "name": "Rosa" })),
  )
  .await;
  let (_, mine) = call(router(store.clone(), sede), "GET", "/teachers", None).await;
  let (_, theirs) = call(router(store, other), "GET", "/teachers", None).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
  assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_for_date() {
  let (store, sede) = setup().await;
  call(
    router(store.clone(), sede),
    "POST",
    "/students",
    Some(json!({
      "name": "Ana",
      "classes_remaining": 1,
      "class_type": "Torno",
      "assigned_classes": [
        { "date": "2025-03-10", "start_time": "18:00", "end_time": "20:00" }
      ]
    })),
  )
  .await;

  let (status, dash) = call(router(store, sede), "GET", "/dashboard?date=2025-03-10", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(dash["unique_students"], 1);
  assert_eq!(dash["occupancy"]["wheel_spots"], 5);
  assert_eq!(dash["alerts"][0]["level"], "critical");
}
