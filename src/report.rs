use anyhow::{Context, Result};
use console::Style;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::runner::SuiteOutcome;
use crate::types::CheckResult;

const SUITE_NAME: &str = "status-probe";

pub fn print_header(base_url: &str) {
    println!("{}", "=".repeat(60));
    println!("BACKEND API TESTING SUITE");
    println!("{}", "=".repeat(60));
    println!("Testing Backend URL: {base_url}");
    println!();
}

/// `✓ Health Check (12 ms)`, coloured by outcome.
fn check_heading(result: &CheckResult) -> String {
    let (glyph, style) = if result.passed {
        ("✓", Style::new().green().bold())
    } else {
        ("✗", Style::new().red().bold())
    };
    let elapsed = Style::new().dim().apply_to(format!("({} ms)", result.duration_ms));
    format!("{} {} {}", style.apply_to(glyph), result.title, elapsed)
}

/// Print one check as soon as it has finished.
pub fn print_check(result: &CheckResult) {
    let red = Style::new().red().bold();

    println!("{}", check_heading(result));
    for line in &result.detail {
        println!("    {line}");
    }
    if let Some(failure) = &result.failure {
        println!("    {} {}", red.apply_to("failed:"), failure);
    }
    if let Some(hint) = &result.fix_hint {
        println!("    hint: {hint}");
    }
    println!();
}

/// Print the PASS/FAIL table and the overall count.
pub fn print_summary(outcome: &SuiteOutcome) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let yellow = Style::new().yellow().bold();

    println!("{}", "=".repeat(60));
    println!("TEST SUMMARY");
    println!("{}", "=".repeat(60));

    for r in &outcome.results {
        let status = if r.passed {
            green.apply_to("PASS")
        } else {
            red.apply_to("FAIL")
        };
        println!("  {} {}", status, title_case(&r.name));
    }

    println!();
    println!(
        "Overall Result: {}/{} tests passed ({:.1}s)",
        outcome.passed_count(),
        outcome.total_count(),
        outcome.duration.as_secs_f64()
    );
    if outcome.all_passed() {
        println!("{}", green.apply_to("All backend tests passed!"));
    } else {
        println!("{}", yellow.apply_to("Some backend tests failed!"));
    }
}

/// `create_status_check` -> `Create Status Check`.
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// --- JSON report ---

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    base_url: &'a str,
    started_at: String,
    duration_ms: u64,
    passed: usize,
    total: usize,
    results: &'a [CheckResult],
}

/// Write the run as pretty-printed JSON.
pub fn write_json(outcome: &SuiteOutcome, output_path: &Path) -> Result<()> {
    let report = JsonReport {
        base_url: &outcome.base_url,
        started_at: outcome.started_at.to_rfc3339(),
        duration_ms: outcome.duration.as_millis() as u64,
        passed: outcome.passed_count(),
        total: outcome.total_count(),
        results: &outcome.results,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize results to JSON")?;
    create_parent(output_path)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write results to {}", output_path.display()))?;
    Ok(())
}

// --- JUnit XML report ---

#[derive(Debug, Serialize)]
#[serde(rename = "testsuite")]
struct JUnitTestSuite {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@tests")]
    tests: usize,
    #[serde(rename = "@failures")]
    failures: usize,
    #[serde(rename = "@errors")]
    errors: usize,
    #[serde(rename = "@time")]
    time: String,
    #[serde(rename = "@timestamp")]
    timestamp: String,
    #[serde(rename = "testcase")]
    testcases: Vec<JUnitTestCase>,
}

#[derive(Debug, Serialize)]
struct JUnitTestCase {
    #[serde(rename = "@classname")]
    classname: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@time")]
    time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<JUnitFailure>,
}

#[derive(Debug, Serialize)]
struct JUnitFailure {
    #[serde(rename = "@message")]
    message: String,
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "$text")]
    text: String,
}

fn seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

fn junit_suite(outcome: &SuiteOutcome) -> JUnitTestSuite {
    let testcases = outcome
        .results
        .iter()
        .map(|r| JUnitTestCase {
            classname: SUITE_NAME.to_string(),
            name: r.name.clone(),
            time: seconds(r.duration_ms),
            failure: r.failure.as_ref().map(|f| JUnitFailure {
                message: f.reason.clone(),
                kind: f.kind.to_string(),
                text: r.detail.join("\n"),
            }),
        })
        .collect();

    JUnitTestSuite {
        name: SUITE_NAME.to_string(),
        tests: outcome.total_count(),
        failures: outcome.total_count() - outcome.passed_count(),
        errors: 0,
        time: seconds(outcome.duration.as_millis() as u64),
        timestamp: outcome.started_at.to_rfc3339(),
        testcases,
    }
}

pub fn render_junit(outcome: &SuiteOutcome) -> Result<String> {
    let body = quick_xml::se::to_string(&junit_suite(outcome)).context("Failed to serialize JUnit XML")?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
}

/// Write the run as a single JUnit `<testsuite>`.
pub fn write_junit(outcome: &SuiteOutcome, output_path: &Path) -> Result<()> {
    let xml = render_junit(outcome)?;
    create_parent(output_path)?;
    fs::write(output_path, xml)
        .with_context(|| format!("Failed to write JUnit XML to {}", output_path.display()))?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
