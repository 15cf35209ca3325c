use std::time::Duration;

use serde_json::{Value, json};

use crate::config::SuiteConfig;
use crate::http::{ApiClient, HttpExchange};
use crate::types::{CheckLog, Failure, FailureKind};

const ROOT_PATH: &str = "/";
const STATUS_PATH: &str = "/status";
const STATUS_FIELDS: &[&str] = &["id", "client_name", "timestamp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    ServerResponse,
    HealthCheck,
    CorsConfiguration,
    CreateStatusCheck,
    GetStatusChecks,
    DatabaseConnection,
}

pub struct CheckSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub kind: CheckKind,
    pub fix_hint: &'static str,
}

/// The suite, in execution order.
pub const CHECKS: &[CheckSpec] = &[
    CheckSpec {
        name: "server_response",
        title: "Server Response",
        kind: CheckKind::ServerResponse,
        fix_hint: "Start the API server and confirm the base URL (--base-url)",
    },
    CheckSpec {
        name: "health_check",
        title: "Health Check",
        kind: CheckKind::HealthCheck,
        fix_hint: "GET {base}/ should return 200 with the expected \"message\"",
    },
    CheckSpec {
        name: "cors_configuration",
        title: "CORS Configuration",
        kind: CheckKind::CorsConfiguration,
        fix_hint: "Allow the frontend origin (or \"*\") in the server's CORS middleware",
    },
    CheckSpec {
        name: "create_status_check",
        title: "Create Status Check",
        kind: CheckKind::CreateStatusCheck,
        fix_hint: "POST {base}/status should echo client_name and add id and timestamp",
    },
    CheckSpec {
        name: "get_status_checks",
        title: "Get Status Checks",
        kind: CheckKind::GetStatusChecks,
        fix_hint: "GET {base}/status should return a JSON array of status checks",
    },
    CheckSpec {
        name: "database_connection",
        title: "Database Connection",
        kind: CheckKind::DatabaseConnection,
        fix_hint: "Check that the API can reach its database",
    },
];

/// Run one check. `Ok` carries the auxiliary value, if the check produces one.
pub async fn run_check(
    kind: CheckKind,
    api: &ApiClient,
    cfg: &SuiteConfig,
    log: &mut CheckLog,
) -> Result<Option<String>, Failure> {
    match kind {
        CheckKind::ServerResponse => server_response(api, cfg, log).await.map(|()| None),
        CheckKind::HealthCheck => health_check(api, cfg, log).await.map(|()| None),
        CheckKind::CorsConfiguration => cors_configuration(api, cfg, log).await.map(|()| None),
        CheckKind::CreateStatusCheck => create_status_check(api, cfg, log).await.map(Some),
        CheckKind::GetStatusChecks => get_status_checks(api, log).await.map(|()| None),
        CheckKind::DatabaseConnection => database_connection(api, cfg, log).await,
    }
}

fn note_body(log: &mut CheckLog, ex: &HttpExchange) {
    let body = ex.snippet(log.body_limit());
    log.note(format!("Response: {body}"));
}

fn note_response(log: &mut CheckLog, ex: &HttpExchange) {
    log.note(format!("Status Code: {}", ex.status));
    note_body(log, ex);
}

/// Any answer in `alive_statuses` means the server is up.
pub async fn server_response(api: &ApiClient, cfg: &SuiteConfig, log: &mut CheckLog) -> Result<(), Failure> {
    let timeout = Duration::from_secs(cfg.alive_timeout_secs);
    let ex = api
        .get_with_timeout(ROOT_PATH, timeout)
        .await
        .map_err(|f| f.during("server is not responding"))?;
    log.note(format!("Status Code: {} ({} ms)", ex.status, ex.duration.as_millis()));

    if cfg.alive_statuses.contains(&ex.status) {
        Ok(())
    } else {
        let expected = cfg
            .alive_statuses
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join("/");
        Err(Failure::status(&expected, ex.status).during("server response unexpected"))
    }
}

pub async fn health_check(api: &ApiClient, cfg: &SuiteConfig, log: &mut CheckLog) -> Result<(), Failure> {
    let ex = api.get(ROOT_PATH).await?;
    note_response(log, &ex);
    if ex.status != 200 {
        return Err(Failure::status("200", ex.status));
    }

    let body = ex.json()?;
    match body.get("message").and_then(Value::as_str) {
        Some(msg) if msg == cfg.expected_message => Ok(()),
        Some(msg) => Err(Failure::body(format!(
            "incorrect message (expected {:?}, got {:?})",
            cfg.expected_message, msg
        ))),
        None => Err(Failure::body("response has no \"message\" field")),
    }
}

pub async fn cors_configuration(api: &ApiClient, cfg: &SuiteConfig, log: &mut CheckLog) -> Result<(), Failure> {
    let ex = api.preflight(ROOT_PATH, &cfg.origin, &cfg.request_method).await?;
    log.note(format!("Status Code: {}", ex.status));
    for header in [
        "Access-Control-Allow-Origin",
        "Access-Control-Allow-Methods",
        "Access-Control-Allow-Headers",
    ] {
        log.note(format!("{header}: {}", ex.header(header).unwrap_or("<missing>")));
    }

    match ex.header("Access-Control-Allow-Origin") {
        Some(allowed) if allowed == "*" || allowed == cfg.origin => Ok(()),
        Some(allowed) => Err(Failure::new(
            FailureKind::Other,
            format!("origin {} not allowed (Access-Control-Allow-Origin: {allowed})", cfg.origin),
        )),
        None => Err(Failure::new(
            FailureKind::Other,
            "no Access-Control-Allow-Origin header in preflight response",
        )),
    }
}

/// Create a record and return its generated id.
pub async fn create_status_check(api: &ApiClient, cfg: &SuiteConfig, log: &mut CheckLog) -> Result<String, Failure> {
    let payload = json!({ "client_name": cfg.client_name });
    let ex = api.post_json(STATUS_PATH, &payload).await?;
    note_response(log, &ex);
    if ex.status != 200 {
        return Err(Failure::status("200", ex.status));
    }

    let body = ex.json()?;
    if body.get("client_name").and_then(Value::as_str) != Some(cfg.client_name.as_str()) {
        return Err(Failure::body("incorrect response format: client_name not echoed"));
    }
    if body.get("timestamp").is_none() {
        return Err(Failure::body("incorrect response format: missing timestamp"));
    }
    match body.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(Failure::body("incorrect response format: missing id")),
    }
}

pub async fn get_status_checks(api: &ApiClient, log: &mut CheckLog) -> Result<(), Failure> {
    let ex = api.get(STATUS_PATH).await?;
    note_response(log, &ex);
    if ex.status != 200 {
        return Err(Failure::status("200", ex.status));
    }

    let body = ex.json()?;
    let Some(items) = body.as_array() else {
        return Err(Failure::body("response is not a list"));
    };
    log.note(format!("Found {} status checks", items.len()));

    for (idx, item) in items.iter().enumerate() {
        if let Some(field) = STATUS_FIELDS.iter().find(|f| item.get(**f).is_none()) {
            return Err(Failure::body(format!("incorrect item format: item {idx} has no \"{field}\"")));
        }
    }
    Ok(())
}

/// Create then list. Re-runs the create step, so every run adds another record.
pub async fn database_connection(
    api: &ApiClient,
    cfg: &SuiteConfig,
    log: &mut CheckLog,
) -> Result<Option<String>, Failure> {
    let id = create_status_check(api, cfg, log)
        .await
        .map_err(|f| f.during("could not create record"))?;
    log.note(format!("Created record {id}"));

    get_status_checks(api, log)
        .await
        .map_err(|f| f.during("could not retrieve records"))?;
    Ok(Some(id))
}
