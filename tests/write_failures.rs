//! Writes that fail after the availability check has passed.
//!
//! A trigger aborting one statement stands in for a storage failure while the
//! database itself stays reachable.

mod common;

use axum::http::{header, Request, StatusCode};
use axum::body::Body;
use common::{body_text, flash_cookie, location, TestApp};

async fn reject(app: &TestApp, operation: &str, table: &str) {
    let raw = sqlx::sqlite::SqlitePool::connect(&app.database_url)
        .await
        .unwrap();
    let sql = format!(
        "CREATE TRIGGER reject_{table}_{operation} BEFORE {operation} ON {table} \
         BEGIN SELECT RAISE(ABORT, '{table} is read only'); END"
    );
    sqlx::query(&sql).execute(&raw).await.unwrap();
    raw.close().await;
}

async fn seeded(app: &TestApp) -> String {
    let id = app
        .create_event("Launch", "2025-01-10T09:00", "2025-01-10T11:00")
        .await;
    let response = app
        .post(&format!("/events/{id}/attendances/register"), "name=Ana")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    id
}

#[tokio::test]
async fn test_failed_create_rerenders_form_with_500() {
    let app = TestApp::spawn().await;
    reject(&app, "INSERT", "event").await;

    let response = app
        .post(
            "/events/create",
            "name=Retro&place=Room+2&start=2025-01-17T15%3A00&end=2025-01-17T16%3A00",
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Could not create the event"));
    assert!(html.contains(r#"value="Retro""#));
    assert!(html.contains(r#"value="Room 2""#));
    assert!(!html.contains("read only"));

    assert!(app.export().await.is_empty());
}

#[tokio::test]
async fn test_failed_edit_rerenders_form_and_keeps_event() {
    let app = TestApp::spawn().await;
    let id = seeded(&app).await;
    reject(&app, "UPDATE", "event").await;

    let response = app
        .post(
            &format!("/events/{id}/edit"),
            "name=Renamed&start=2025-01-10T09%3A00&end=2025-01-10T11%3A00",
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Could not update the event"));
    assert!(html.contains(r#"value="Renamed""#));

    assert_eq!(app.export().await[0]["name"], "Launch");
}

#[tokio::test]
async fn test_failed_event_delete_returns_to_detail_with_notice() {
    let app = TestApp::spawn().await;
    let id = seeded(&app).await;
    reject(&app, "DELETE", "event").await;

    let response = app
        .post(&format!("/events/{id}/delete"), "confirm_delete=true")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/events/{id}"));
    let cookie = flash_cookie(&response);
    assert!(cookie.starts_with("flash=event-delete-failed."));

    // The cascaded attendance delete is rolled back with the event delete.
    assert_eq!(app.export().await.len(), 1);
    assert_eq!(app.attendance_count(&id).await, 1);

    let detail = app
        .send(
            Request::get(format!("/events/{id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(body_text(detail).await.contains("Could not delete the event"));
}

#[tokio::test]
async fn test_failed_registration_redirects_with_notice() {
    let app = TestApp::spawn().await;
    let id = seeded(&app).await;
    reject(&app, "INSERT", "attendance").await;

    let response = app
        .post(&format!("/events/{id}/attendances/register"), "name=Bo")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/events/{id}/attendances"));
    assert!(flash_cookie(&response).starts_with("flash=attendance-register-failed."));

    assert_eq!(app.attendance_count(&id).await, 1);
}

#[tokio::test]
async fn test_failed_attendance_delete_redirects_with_notice() {
    let app = TestApp::spawn().await;
    let id = seeded(&app).await;

    let mut uow = app.store.begin().await.unwrap();
    let attendance_id = uow.list_attendances(id.parse().unwrap()).await.unwrap()[0].id;
    drop(uow);
    reject(&app, "DELETE", "attendance").await;

    let response = app
        .post(&format!("/attendances/{attendance_id}/delete"), "")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/events/{id}/attendances"));
    assert!(flash_cookie(&response).starts_with("flash=attendance-delete-failed."));

    assert_eq!(app.attendance_count(&id).await, 1);
}
