use thiserror::Error;

use crate::telemetry::config::Signal;

/// Broad classification of a [`TelemetryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller misused the coordinator; fix the call site.
    Usage,
    /// An engine failed while starting or stopping a signal.
    Subsystem,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("signals already started; call stop() before starting again")]
    AlreadyStarted,
    #[error("unrecognized start options: {}", .0.join(", "))]
    UnrecognizedOptions(Vec<String>),
    #[error("invalid start options: {0}")]
    InvalidOptions(String),
    #[error("Exporter error: {0}")]
    Exporter(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Initialization error: {0}")]
    Init(String),
    #[error("Shutdown error: {0}")]
    Shutdown(String),
    #[error("failed to stop {}", describe_failures(.0))]
    Stop(Vec<(Signal, TelemetryError)>),
}

impl TelemetryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyStarted | Self::UnrecognizedOptions(_) | Self::InvalidOptions(_) => {
                ErrorKind::Usage
            }
            _ => ErrorKind::Subsystem,
        }
    }

    pub fn is_usage(&self) -> bool {
        self.kind() == ErrorKind::Usage
    }
}

fn describe_failures(failures: &[(Signal, TelemetryError)]) -> String {
    failures
        .iter()
        .map(|(signal, err)| format!("{signal}: {err}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<opentelemetry_sdk::error::OTelSdkError> for TelemetryError {
    fn from(err: opentelemetry_sdk::error::OTelSdkError) -> Self {
        Self::Shutdown(err.to_string())
    }
}

#[cfg(feature = "otlp")]
impl From<opentelemetry_otlp::ExporterBuildError> for TelemetryError {
    fn from(err: opentelemetry_otlp::ExporterBuildError) -> Self {
        Self::Exporter(err.to_string())
    }
}
