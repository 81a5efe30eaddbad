use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::telemetry::diag::LogLevel;
use crate::telemetry::env::{self, Env};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::signals::{MetricsOptions, ProfilingOptions, TracingOptions};

/// Top-level keys accepted by [`StartOptions::from_json`].
pub const RECOGNIZED_OPTIONS: [&str; 7] = [
    "accessToken",
    "endpoint",
    "serviceName",
    "logLevel",
    "metrics",
    "profiling",
    "tracing",
];

/// The three observability signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Tracing,
    Metrics,
    Profiling,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracing => "tracing",
            Self::Metrics => "metrics",
            Self::Profiling => "profiling",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty human-readable format with colors (for local dev)
    #[default]
    Pretty,
    /// JSON structured format (for cloud environments)
    Json,
}

impl LogFormat {
    pub fn from_env(env: &dyn Env) -> Self {
        match env.non_empty(env::LOG_FORMAT).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Caller's choice for a single signal.
///
/// In JSON a signal is either a boolean or an options object; `true` maps to
/// [`SignalConfig::EnabledWithDefaults`], `false` to [`SignalConfig::Disabled`].
#[derive(Debug, Clone, PartialEq)]
pub enum SignalConfig<T> {
    Disabled,
    EnabledWithDefaults,
    EnabledWithOptions(T),
}

impl<T> SignalConfig<T> {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Caller-supplied options, if any.
    pub fn into_options(self) -> Option<T> {
        match self {
            Self::EnabledWithOptions(options) => Some(options),
            _ => None,
        }
    }
}

impl<T> From<bool> for SignalConfig<T> {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::EnabledWithDefaults
        } else {
            Self::Disabled
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSignalConfig<T> {
    Flag(bool),
    Options(T),
}

impl<'de, T> Deserialize<'de> for SignalConfig<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawSignalConfig::<T>::deserialize(deserializer)? {
            RawSignalConfig::Flag(enabled) => enabled.into(),
            RawSignalConfig::Options(options) => Self::EnabledWithOptions(options),
        })
    }
}

/// Options accepted by [`SignalCoordinator::start`](crate::telemetry::SignalCoordinator::start).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartOptions {
    pub access_token: Option<String>,
    pub endpoint: Option<String>,
    pub service_name: Option<String>,
    pub log_level: Option<LogLevel>,
    pub tracing: Option<SignalConfig<TracingOptions>>,
    pub metrics: Option<SignalConfig<MetricsOptions>>,
    pub profiling: Option<SignalConfig<ProfilingOptions>>,
}

impl StartOptions {
    /// Parse options from a JSON object, rejecting unknown top-level keys.
    pub fn from_json(value: serde_json::Value) -> Result<Self, TelemetryError> {
        let object = value
            .as_object()
            .ok_or_else(|| TelemetryError::InvalidOptions("expected a JSON object".into()))?;

        let unknown: Vec<String> = object
            .keys()
            .filter(|key| !RECOGNIZED_OPTIONS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(TelemetryError::UnrecognizedOptions(unknown));
        }

        serde_json::from_value(value).map_err(|e| TelemetryError::InvalidOptions(e.to_string()))
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn with_tracing(mut self, config: impl Into<SignalConfig<TracingOptions>>) -> Self {
        self.tracing = Some(config.into());
        self
    }

    pub fn with_metrics(mut self, config: impl Into<SignalConfig<MetricsOptions>>) -> Self {
        self.metrics = Some(config.into());
        self
    }

    pub fn with_profiling(mut self, config: impl Into<SignalConfig<ProfilingOptions>>) -> Self {
        self.profiling = Some(config.into());
        self
    }

    pub fn shared(&self) -> SharedOptions {
        SharedOptions {
            access_token: self.access_token.clone(),
            endpoint: self.endpoint.clone(),
            service_name: self.service_name.clone(),
        }
    }
}

/// Identity and transport fields applicable to every enabled signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedOptions {
    pub access_token: Option<String>,
    pub endpoint: Option<String>,
    pub service_name: Option<String>,
}
