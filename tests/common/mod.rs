#![allow(dead_code)]

use attendance_server::config::{Config, DEFAULT_ALLOWED_ORIGINS, DEFAULT_PORT};
use attendance_server::db::Store;
use attendance_server::routes::create_routes;
use attendance_server::state::AppState;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    _dir: TempDir,
    pub database_url: String,
    pub store: Store,
    pub router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let database_url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("events.db").display()
        );
        let store = Store::connect(&database_url).unwrap();
        store.migrate().await.unwrap();

        let config = Config {
            database_url: database_url.clone(),
            secret_key: "test-secret".to_string(),
            port: DEFAULT_PORT,
            production: false,
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
        };
        let router = create_routes(AppState::new(store.clone(), &config), &config);

        Self {
            _dir: dir,
            database_url,
            store,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(get(uri)).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> Response<Body> {
        self.send(form(uri, body)).await
    }

    /// Creates an event through the form and returns its id from the export.
    pub async fn create_event(&self, name: &str, start: &str, end: &str) -> String {
        let body = format!(
            "name={}&place=HQ&start={}&end={}",
            name,
            start.replace(':', "%3A"),
            end.replace(':', "%3A")
        );
        let response = self.post("/events/create", &body).await;
        assert_eq!(response.status(), 303, "create {name} failed");

        self.export()
            .await
            .into_iter()
            .find(|e| e["name"] == name)
            .and_then(|e| e["id"].as_str().map(str::to_string))
            .unwrap()
    }

    pub async fn export(&self) -> Vec<serde_json::Value> {
        let response = self.get("/api/events").await;
        assert_eq!(response.status(), 200);
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    /// Number of attendees listed on the event's attendance page.
    pub async fn attendance_count(&self, event_id: &str) -> usize {
        let response = self.get(&format!("/events/{event_id}/attendances")).await;
        assert_eq!(response.status(), 200);
        body_text(response).await.matches("class=\"attendee\"").count()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` part of the response's flash cookie.
pub fn flash_cookie(response: &Response<Body>) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}
