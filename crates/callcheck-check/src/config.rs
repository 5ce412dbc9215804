//! Checker configuration.
//!
//! [`CheckerConfig`] carries the few knobs the checking engine honours. It
//! deserializes from JSON with every field optional, and
//! [`CheckerConfig::from_env`] layers environment overrides on the defaults:
//!
//! - `CALLCHECK_REAL_TIME_TOLERANCE`: relative tolerance for `real_time_match`
//! - `CALLCHECK_CALL_ORDER`: `any` or `strict` multi-call matching

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Historical tolerance for `real_time_match` results (20%).
pub const DEFAULT_REAL_TIME_TOLERANCE: f64 = 0.2;

/// How multi-call AST categories pair candidate calls with expected calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOrder {
    /// Greedy, ground-truth-first search over unmatched candidates.
    #[default]
    Any,
    /// Candidate `i` must match expected call `i`.
    Strict,
}

/// A pause inserted before REST calls whose URL contains `url_contains`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleRule {
    pub url_contains: String,
    pub delay_ms: u64,
}

/// Configuration for the checking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Relative tolerance for `real_time_match`. Default: 0.2.
    pub real_time_tolerance: f64,
    /// Matching policy for multi-call AST categories. Default: `Any`.
    pub call_order: CallOrder,
    /// Models whose function names have `.` replaced by `_`, because their
    /// APIs reject dots in identifiers.
    pub underscore_to_dot_models: Vec<String>,
    /// Rate-limit pauses for REST checks.
    pub rest_throttle: Vec<ThrottleRule>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            real_time_tolerance: DEFAULT_REAL_TIME_TOLERANCE,
            call_order: CallOrder::Any,
            underscore_to_dot_models: [
                "gpt-4o-2024-05-13-FC",
                "gpt-4-turbo-2024-04-09-FC",
                "gpt-4-1106-preview-FC",
                "gpt-4-0125-preview-FC",
                "gpt-4-0613-FC",
                "gpt-3.5-turbo-0125-FC",
                "claude-3-opus-20240229-FC",
                "claude-3-sonnet-20240229-FC",
                "claude-3-haiku-20240307-FC",
                "mistral-large-2402-FC",
                "mistral-large-2402-FC-Any",
                "mistral-large-2402-FC-Auto",
                "mistral-small-2402-FC-Any",
                "mistral-small-2402-FC-Auto",
                "gemini-1.0-pro",
                "gemini-1.5-pro-preview-0409",
                "meetkai/functionary-small-v2.2-FC",
                "meetkai/functionary-medium-v2.2-FC",
                "meetkai/functionary-small-v2.4-FC",
                "meetkai/functionary-medium-v2.4-FC",
                "command-r-plus-FC",
                "command-r-plus-FC-optimized",
                "NousResearch/Hermes-2-Pro-Mistral-7B",
                "databricks-dbrx-instruct",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            rest_throttle: vec![ThrottleRule {
                url_contains: "https://geocode.maps.co".to_string(),
                delay_ms: 2000,
            }],
        }
    }
}

impl CheckerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Unparseable values are logged and
    /// ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("CALLCHECK_REAL_TIME_TOLERANCE") {
            match raw.trim().parse::<f64>() {
                Ok(tolerance) if tolerance >= 0.0 => self.real_time_tolerance = tolerance,
                _ => tracing::warn!("ignoring invalid CALLCHECK_REAL_TIME_TOLERANCE '{}'", raw),
            }
        }
        if let Some(raw) = lookup("CALLCHECK_CALL_ORDER") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "any" => self.call_order = CallOrder::Any,
                "strict" => self.call_order = CallOrder::Strict,
                _ => tracing::warn!("ignoring invalid CALLCHECK_CALL_ORDER '{}'", raw),
            }
        }
        self
    }

    /// Whether `model` has dotted function names rewritten with underscores.
    ///
    /// Model names stored with `_` in place of `/` match too.
    pub fn rewrites_dotted_names(&self, model: &str) -> bool {
        let escaped = model.replace('_', "/");
        self.underscore_to_dot_models
            .iter()
            .any(|m| m == model || *m == escaped)
    }

    /// The pause to observe before requesting `url`, if any.
    pub fn throttle_for(&self, url: &str) -> Option<Duration> {
        self.rest_throttle
            .iter()
            .find(|rule| url.contains(rule.url_contains.as_str()))
            .map(|rule| Duration::from_millis(rule.delay_ms))
    }
}
