use serde::Serialize;

/// Outcome of a single executed check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub title: String,
    pub passed: bool,
    pub detail: Vec<String>,
    pub failure: Option<Failure>,
    pub fix_hint: Option<String>,
    /// Auxiliary value produced by the check (the id of a created record).
    pub aux: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Connection,
    Timeout,
    Status,
    Body,
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Connection => write!(f, "Connection"),
            FailureKind::Timeout => write!(f, "Timeout"),
            FailureKind::Status => write!(f, "Status"),
            FailureKind::Body => write!(f, "Body"),
            FailureKind::Other => write!(f, "Other"),
        }
    }
}

/// Why a check failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn status(expected: &str, got: u16) -> Self {
        Self::new(
            FailureKind::Status,
            format!("wrong status code (expected {expected}, got {got})"),
        )
    }

    pub fn body(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::Body, reason)
    }

    /// Prefix the reason with the step that failed, keeping the kind.
    pub fn during(self, step: &str) -> Self {
        Self {
            kind: self.kind,
            reason: format!("{step}: {}", self.reason),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.reason)
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connection
        } else if err.is_decode() {
            FailureKind::Body
        } else {
            FailureKind::Other
        };
        let mut reason = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        Failure::new(kind, reason)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::body(format!("response is not valid JSON: {err}"))
    }
}

/// Longest response body excerpt a check prints unless full bodies were asked for.
pub const SNIPPET_LIMIT: usize = 200;

/// Diagnostic lines a check collects while it runs.
#[derive(Debug)]
pub struct CheckLog {
    lines: Vec<String>,
    body_limit: Option<usize>,
}

impl Default for CheckLog {
    fn default() -> Self {
        Self::new(Some(SNIPPET_LIMIT))
    }
}

impl CheckLog {
    /// `body_limit` of `None` keeps response bodies whole.
    pub fn new(body_limit: Option<usize>) -> Self {
        Self {
            lines: Vec::new(),
            body_limit,
        }
    }

    pub fn body_limit(&self) -> Option<usize> {
        self.body_limit
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_during_keeps_kind() {
        let f = Failure::status("200", 500).during("could not create record");
        assert_eq!(f.kind, FailureKind::Status);
        assert!(f.reason.starts_with("could not create record: wrong status code"));
    }

    #[test]
    fn test_json_error_is_body_failure() {
        let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let f: Failure = err.into();
        assert_eq!(f.kind, FailureKind::Body);
        assert!(f.reason.contains("not valid JSON"));
    }

    #[test]
    fn test_failure_display() {
        let f = Failure::body("response is not a list");
        assert_eq!(f.to_string(), "[Body] response is not a list");
    }

    #[test]
    fn test_check_log_keeps_order() {
        let mut log = CheckLog::default();
        log.note("Status Code: 200");
        log.note("Response: {}");
        assert_eq!(log.into_lines(), vec!["Status Code: 200", "Response: {}"]);
    }
}
