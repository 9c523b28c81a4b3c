//! Guardian policy loaded from `.claude/tdd-guardian/config.json`.
//!
//! The file is operator-authored and read fresh on every hook invocation.
//! Parsing never fails: a missing or unparsable file yields the all-defaults
//! config (which is disabled), and a field with the wrong JSON type falls
//! back to that field's default without discarding the rest of the document.

use fs_err as fs;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::path::Path;

pub const DEFAULT_BYPASS_ENV: &str = "TDD_GUARD_BYPASS";
pub const DEFAULT_GATE_FRESHNESS_MINUTES: f64 = 120.0;
pub const DEFAULT_COVERAGE_SUMMARY_PATH: &str = "coverage/coverage-summary.json";
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 100.0;
pub const DEFAULT_DIAGNOSTIC_TAIL_CHARS: usize = 8000;

/// Metrics every coverage check covers, in report order.
pub const COVERAGE_METRICS: [&str; 4] = ["lines", "functions", "branches", "statements"];

const TRUTHY_VALUES: [&str; 3] = ["1", "true", "yes"];

/// Environment lookup used for the bypass switch. Injected so tests never
/// touch the process environment.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// `1`, `true`, `yes` (any case) are truthy; everything else, including unset, is not.
pub fn is_truthy(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    TRUTHY_VALUES.contains(&normalized.as_str())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianConfig {
    #[serde(default, deserialize_with = "lenient")]
    enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    bypass_env: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    block_commit_without_fresh_gate: Option<bool>,
    #[serde(default, deserialize_with = "lenient_number")]
    gate_freshness_minutes: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    enforce_on_task_completed: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    preflight_command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    test_command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    coverage_command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    mutation_command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    require_mutation: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    coverage_summary_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    coverage_thresholds: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_number")]
    diagnostic_tail_chars: Option<f64>,
}

impl GuardianConfig {
    /// Loads the config, returning defaults if the file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %err, "Failed to read guardian config, using defaults");
                } else {
                    tracing::debug!(path = %path.display(), "No guardian config found");
                }
                return Self::default();
            }
        };
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Self {
        match serde_json::from_str::<Value>(content) {
            Ok(value @ Value::Object(_)) => Self::from_value(value),
            Ok(_) => {
                tracing::warn!("Guardian config is not a JSON object, using defaults");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to parse guardian config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn bypass_env(&self) -> &str {
        non_blank(self.bypass_env.as_deref()).unwrap_or(DEFAULT_BYPASS_ENV)
    }

    /// Whether the configured bypass variable holds a truthy value.
    pub fn bypass_active(&self, env: EnvLookup<'_>) -> bool {
        env(self.bypass_env()).is_some_and(|value| is_truthy(&value))
    }

    pub fn blocks_without_fresh_gate(&self) -> bool {
        self.block_commit_without_fresh_gate.unwrap_or(true)
    }

    /// Zero and non-numeric windows fall back to the default. A negative
    /// window is kept, so no recorded pass is ever fresh.
    pub fn gate_freshness_minutes(&self) -> f64 {
        self.gate_freshness_minutes
            .filter(|minutes| minutes.is_finite() && *minutes != 0.0)
            .unwrap_or(DEFAULT_GATE_FRESHNESS_MINUTES)
    }

    pub fn enforce_on_task_completed(&self) -> bool {
        self.enforce_on_task_completed.unwrap_or(true)
    }

    pub fn preflight_command(&self) -> Option<&str> {
        non_blank(self.preflight_command.as_deref())
    }

    pub fn test_command(&self) -> Option<&str> {
        non_blank(self.test_command.as_deref())
    }

    pub fn coverage_command(&self) -> Option<&str> {
        non_blank(self.coverage_command.as_deref())
    }

    pub fn mutation_command(&self) -> Option<&str> {
        non_blank(self.mutation_command.as_deref())
    }

    pub fn require_mutation(&self) -> bool {
        self.require_mutation.unwrap_or(false)
    }

    /// Configured summary path, unresolved (as echoed into state).
    pub fn coverage_summary_path(&self) -> &str {
        non_blank(self.coverage_summary_path.as_deref()).unwrap_or(DEFAULT_COVERAGE_SUMMARY_PATH)
    }

    /// Thresholds for the four standard metrics followed by any extra
    /// configured metrics. Non-numeric values fall back to 100.
    pub fn coverage_thresholds(&self) -> Vec<(String, f64)> {
        let overrides = self.coverage_thresholds.as_ref();
        let threshold_for = |metric: &str| {
            overrides
                .and_then(|map| map.get(metric))
                .and_then(number_from_value)
                .unwrap_or(DEFAULT_COVERAGE_THRESHOLD)
        };

        let mut thresholds: Vec<(String, f64)> = COVERAGE_METRICS
            .iter()
            .map(|metric| (metric.to_string(), threshold_for(metric)))
            .collect();

        if let Some(map) = overrides {
            let mut extra: Vec<&String> = map
                .keys()
                .filter(|key| !COVERAGE_METRICS.contains(&key.as_str()))
                .collect();
            extra.sort();
            for key in extra {
                thresholds.push((key.clone(), threshold_for(key)));
            }
        }

        thresholds
    }

    pub fn diagnostic_tail_chars(&self) -> usize {
        self.diagnostic_tail_chars
            .filter(|chars| chars.is_finite() && *chars >= 1.0)
            .map(|chars| chars as usize)
            .unwrap_or(DEFAULT_DIAGNOSTIC_TAIL_CHARS)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reads a JSON number, or a string holding one.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// Keeps a field's default when its JSON value has the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}
