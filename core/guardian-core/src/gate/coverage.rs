//! Coverage threshold check against a `coverage-summary.json` report.
//!
//! Expected shape (Istanbul `json-summary`):
//!
//! ```json
//! { "total": { "lines": { "pct": 92.5 }, "functions": { "pct": 100 }, ... } }
//! ```
//!
//! A missing or non-object report fails the gate. A metric that is absent or
//! non-numeric reads as -1, so it fails any threshold.

use fs_err as fs;
use serde_json::Value;
use std::path::Path;

use crate::config::number_from_value;

const MISSING_PCT: f64 = -1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCheck {
    pub metric: String,
    pub actual: f64,
    pub required: f64,
}

impl MetricCheck {
    pub fn passed(&self) -> bool {
        self.actual >= self.required
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub passed: bool,
    /// Human-readable verdict; begins with "Coverage gate passed" or "Coverage gate failed".
    pub message: String,
    pub checks: Vec<MetricCheck>,
}

/// Compares the report at `summary_path` against `thresholds` (metric, minimum %).
pub fn check_coverage(summary_path: &Path, thresholds: &[(String, f64)]) -> CoverageReport {
    let Some(summary) = load_summary(summary_path) else {
        return CoverageReport {
            passed: false,
            message: format!(
                "Coverage gate failed: Coverage summary not found or invalid: {}",
                summary_path.display()
            ),
            checks: Vec::new(),
        };
    };

    let total = summary.get("total");
    let checks: Vec<MetricCheck> = thresholds
        .iter()
        .map(|(metric, required)| MetricCheck {
            metric: metric.clone(),
            actual: read_pct(total, metric),
            required: *required,
        })
        .collect();

    let failures: Vec<String> = checks
        .iter()
        .filter(|check| !check.passed())
        .map(|check| {
            format!(
                "{}: {:.2}% < {:.2}%",
                check.metric, check.actual, check.required
            )
        })
        .collect();

    if !failures.is_empty() {
        return CoverageReport {
            passed: false,
            message: format!("Coverage gate failed: {}", failures.join("; ")),
            checks,
        };
    }

    let summary_line = checks
        .iter()
        .map(|check| format!("{}={:.2}%", check.metric, check.actual))
        .collect::<Vec<_>>()
        .join(", ");

    CoverageReport {
        passed: true,
        message: format!("Coverage gate passed: {}", summary_line),
        checks,
    }
}

fn load_summary(path: &Path) -> Option<Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(error = %err, "Coverage summary unreadable");
            return None;
        }
    };
    serde_json::from_str::<Value>(&content)
        .ok()
        .filter(Value::is_object)
}

fn read_pct(total: Option<&Value>, metric: &str) -> f64 {
    total
        .and_then(|total| total.get(metric))
        .and_then(|data| data.get("pct"))
        .and_then(number_from_value)
        .unwrap_or(MISSING_PCT)
}
