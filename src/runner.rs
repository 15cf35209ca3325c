use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::checks::{self, CHECKS, CheckSpec};
use crate::config::SuiteConfig;
use crate::http::ApiClient;
use crate::progress;
use crate::report;
use crate::types::{CheckLog, CheckResult, Failure, FailureKind};

/// Everything a finished run produced, in execution order.
#[derive(Debug)]
pub struct SuiteOutcome {
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub results: Vec<CheckResult>,
}

impl SuiteOutcome {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_count() == self.total_count()
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}

/// The fixed check suite bound to one target.
pub struct Suite {
    cfg: SuiteConfig,
    api: ApiClient,
    body_limit: Option<usize>,
}

impl Suite {
    pub fn new(cfg: SuiteConfig, body_limit: Option<usize>) -> Result<Self> {
        let api = ApiClient::new(&cfg.base_url)?;
        Ok(Self {
            cfg,
            api,
            body_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Run every check once, in order, printing each report as it completes.
    pub async fn run(&self) -> SuiteOutcome {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(CHECKS.len());

        for spec in CHECKS {
            let pb = progress::stage_spinner(&format!("Testing {}...", spec.title));
            let result = self.run_one(spec).await;
            progress::clear_spinner(&pb);

            report::print_check(&result);
            results.push(result);
        }

        SuiteOutcome {
            base_url: self.api.base_url().to_string(),
            started_at,
            duration: start.elapsed(),
            results,
        }
    }

    async fn run_one(&self, spec: &CheckSpec) -> CheckResult {
        let start = Instant::now();
        let mut log = CheckLog::new(self.body_limit);
        let verdict = isolate(checks::run_check(spec.kind, &self.api, &self.cfg, &mut log)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (passed, failure, aux) = match verdict {
            Ok(aux) => (true, None, aux),
            Err(failure) => (false, Some(failure), None),
        };

        CheckResult {
            name: spec.name.to_string(),
            title: spec.title.to_string(),
            passed,
            detail: log.into_lines(),
            fix_hint: (!passed).then(|| spec.fix_hint.replace("{base}", self.api.base_url())),
            failure,
            aux,
            duration_ms,
        }
    }
}

/// Await a check, turning a panic inside it into an `Other` failure.
async fn isolate<F>(check: F) -> Result<Option<String>, Failure>
where
    F: Future<Output = Result<Option<String>, Failure>>,
{
    match AssertUnwindSafe(check).catch_unwind().await {
        Ok(verdict) => verdict,
        Err(payload) => Err(Failure::new(
            FailureKind::Other,
            format!("check panicked: {}", panic_message(&*payload)),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
