//! Environment variable access.
//!
//! Every lookup goes through the [`Env`] trait so coordinators can be built
//! against an isolated variable set in tests instead of the process
//! environment.

use std::collections::HashMap;
use std::time::Duration;

pub const LOG_LEVEL: &str = "OTEL_LOG_LEVEL";
pub const LOG_FORMAT: &str = "LOG_FORMAT";
pub const TRACING_ENABLED: &str = "APM_TRACING_ENABLED";
pub const METRICS_ENABLED: &str = "APM_METRICS_ENABLED";
pub const PROFILER_ENABLED: &str = "APM_PROFILER_ENABLED";
pub const INSTRUMENTATION_METRICS_ENABLED: &str = "APM_INSTRUMENTATION_METRICS_ENABLED";

pub const ACCESS_TOKEN: &str = "APM_ACCESS_TOKEN";
pub const SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
pub const OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
pub const OTLP_TRACES_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT";
pub const OTLP_METRICS_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_METRICS_ENDPOINT";
pub const METRIC_EXPORT_INTERVAL: &str = "OTEL_METRIC_EXPORT_INTERVAL";

pub const PROFILER_LOGS_ENDPOINT: &str = "APM_PROFILER_LOGS_ENDPOINT";
pub const PROFILER_CALL_STACK_INTERVAL: &str = "APM_PROFILER_CALL_STACK_INTERVAL";
pub const PROFILER_COLLECTION_INTERVAL: &str = "APM_PROFILER_COLLECTION_INTERVAL";
pub const PROFILER_MEMORY_ENABLED: &str = "APM_PROFILER_MEMORY_ENABLED";

/// Source of environment variables.
pub trait Env: Send + Sync {
    /// Raw value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Value of `key` unless it is unset or only whitespace.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.trim().is_empty())
    }

    /// Strict boolean: only `true`/`false` (any case) are understood.
    fn flag(&self, key: &str) -> Option<bool> {
        parse_bool_str(self.non_empty(key).as_deref())
    }

    /// Lenient boolean: unset means `default`, `false`/`no`/`0` mean false,
    /// anything else means true.
    fn boolean(&self, key: &str, default: bool) -> bool {
        match self.non_empty(key) {
            None => default,
            Some(value) => !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "false" | "no" | "0"
            ),
        }
    }

    /// Whole milliseconds, ignoring values that do not parse.
    fn millis(&self, key: &str) -> Option<Duration> {
        self.non_empty(key)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
    }
}

/// Parse `"true"`/`"false"` (case-insensitive); anything else is `None`.
pub fn parse_bool_str(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
