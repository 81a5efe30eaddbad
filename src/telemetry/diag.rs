//! Diagnostic logging for the telemetry layer itself.
//!
//! The logger is a `tracing-subscriber` registry writing to the console. It is
//! what makes SDK and coordinator startup messages visible, so it has to be
//! installed before any signal starts.
//!
//! A global subscriber can only be set once per process. The level filter sits
//! behind a [`reload`] layer so later starts can change the level in place.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Layer, Registry};

use crate::telemetry::config::LogFormat;

/// Diagnostic severity threshold. `None` suppresses the logger entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    #[default]
    None,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
    All,
}

impl LogLevel {
    /// `EnvFilter` directive for this level, `None` when logging is off.
    pub fn directive(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Error => Some("error"),
            Self::Warn => Some("warn"),
            Self::Info => Some("info"),
            Self::Debug => Some("debug"),
            Self::Verbose | Self::All => Some("trace"),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Verbose => "verbose",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLogLevel(pub String);

impl fmt::Display for UnknownLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level `{}`", self.0)
    }
}

impl std::error::Error for UnknownLogLevel {}

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "verbose" => Ok(Self::Verbose),
            "all" => Ok(Self::All),
            _ => Err(UnknownLogLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = UnknownLogLevel;

    fn try_from(value: String) -> Result<Self, UnknownLogLevel> {
        value.parse()
    }
}

/// Level from an environment value; absent or unknown names turn logging off.
pub fn parse_log_level(value: Option<&str>) -> LogLevel {
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}

/// Build the pretty fmt layer for human-readable output (local dev)
pub fn build_pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// Build the JSON fmt layer for structured logging (cloud environments)
pub fn build_json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_current_span(true)
}

/// Build the env filter for a level
pub fn build_filter(level: LogLevel) -> Option<EnvFilter> {
    level.directive().map(EnvFilter::new)
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Console logger whose level can be changed after installation.
pub struct DiagnosticLogger {
    filter: Mutex<Option<FilterHandle>>,
}

static GLOBAL_LOGGER: DiagnosticLogger = DiagnosticLogger::new();

impl DiagnosticLogger {
    pub const fn new() -> Self {
        Self {
            filter: Mutex::new(None),
        }
    }

    /// The logger shared by every coordinator in the process.
    pub fn global() -> &'static Self {
        &GLOBAL_LOGGER
    }

    /// Log at `level` from now on.
    ///
    /// The first call with a level other than `None` installs the global
    /// subscriber in `format`; later calls only swap the filter, and `None`
    /// turns output off. Returns `true` when output is enabled afterwards.
    pub fn apply(&self, level: LogLevel, format: LogFormat) -> bool {
        let mut slot = self.filter.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = slot.as_ref() {
            let filter = build_filter(level).unwrap_or_else(|| EnvFilter::new("off"));
            return match handle.reload(filter) {
                Ok(()) => level != LogLevel::None,
                Err(e) => {
                    tracing::debug!(error = %e, "diagnostic filter reload failed");
                    false
                }
            };
        }

        let Some(filter) = build_filter(level) else {
            return false;
        };
        let (filter, handle) = reload::Layer::new(filter);

        let installed = match format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(build_pretty_layer())
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(build_json_layer())
                .try_init(),
        };

        match installed {
            Ok(()) => {
                *slot = Some(handle);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "another global subscriber is installed");
                false
            }
        }
    }

    /// Directives of the active filter, `None` before installation.
    pub fn current_filter(&self) -> Option<String> {
        let slot = self.filter.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .and_then(|handle| handle.with_current(|filter| filter.to_string()).ok())
    }
}

impl Default for DiagnosticLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `level` to the process-wide [`DiagnosticLogger`].
pub fn install_diagnostic_logger(level: LogLevel, format: LogFormat) -> bool {
    DiagnosticLogger::global().apply(level, format)
}
