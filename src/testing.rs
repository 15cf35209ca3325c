//! In-process mock of the status-check API, served by axum on an ephemeral port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct MockApi {
    pub root_status: u16,
    /// Delay before `GET /` answers.
    pub root_delay: Duration,
    pub message: String,
    /// `None` answers the preflight with 405 and no CORS headers.
    pub allow_origin: Option<String>,
    pub created_id: String,
    pub omit_timestamp: bool,
    pub list_status: u16,
    /// Fixed body for `GET /status`; `None` lists the records created so far.
    pub list_body: Option<Value>,
    /// Raw text for `GET /status`, served instead of JSON.
    pub list_raw: Option<String>,
    pub posts: Arc<AtomicUsize>,
    pub records: Arc<Mutex<Vec<Value>>>,
}

impl MockApi {
    /// An API that satisfies every check.
    pub fn healthy() -> Self {
        Self {
            root_status: 200,
            root_delay: Duration::ZERO,
            message: "Hello World".to_string(),
            allow_origin: Some("*".to_string()),
            created_id: "abc-123".to_string(),
            omit_timestamp: false,
            list_status: 200,
            list_body: None,
            list_raw: None,
            posts: Arc::new(AtomicUsize::new(0)),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of `POST /status` requests served, shared with the running server.
    pub fn post_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.posts)
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn root(State(mock): State<MockApi>) -> Response {
    if !mock.root_delay.is_zero() {
        tokio::time::sleep(mock.root_delay).await;
    }
    (status(mock.root_status), Json(json!({ "message": mock.message }))).into_response()
}

async fn preflight(State(mock): State<MockApi>) -> Response {
    match mock.allow_origin {
        Some(origin) => (
            StatusCode::OK,
            [
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
                (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS".to_string()),
            ],
        )
            .into_response(),
        None => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn create(State(mock): State<MockApi>, Json(payload): Json<Value>) -> Response {
    mock.posts.fetch_add(1, Ordering::SeqCst);
    let mut record = json!({
        "id": mock.created_id,
        "client_name": payload["client_name"].clone(),
    });
    if !mock.omit_timestamp {
        record["timestamp"] = json!("2024-01-01T00:00:00Z");
    }
    mock.records.lock().unwrap().push(record.clone());
    Json(record).into_response()
}

async fn list(State(mock): State<MockApi>) -> Response {
    if let Some(raw) = mock.list_raw.clone() {
        return (status(mock.list_status), raw).into_response();
    }
    let body = match mock.list_body.clone() {
        Some(body) => body,
        None => Value::Array(mock.records.lock().unwrap().clone()),
    };
    (status(mock.list_status), Json(body)).into_response()
}

/// Serve `mock` on 127.0.0.1 and return its base URL (`http://127.0.0.1:<port>/api`).
pub async fn serve(mock: MockApi) -> String {
    let app = Router::new()
        .route("/api/", get(root).options(preflight))
        .route("/api/status", get(list).post(create))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// Base URL of a port that was just released, so connecting is refused.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api")
}
