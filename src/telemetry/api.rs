use futures_util::future::BoxFuture;

use crate::telemetry::env::Env;
use crate::telemetry::error::TelemetryError;
use crate::telemetry::meter::SharedMeterProvider;
use crate::telemetry::signals::{
    MetricsOptions, ProfilingOptions, ProfilingSettings, TracingOptions,
};

/// Running instance of a signal, returned by an engine's `start`.
pub trait SignalHandle: Send {
    /// Begin shutting the signal down. The future resolves once it has stopped.
    fn stop(self: Box<Self>) -> BoxFuture<'static, Result<(), TelemetryError>>;
}

/// Running metrics pipeline; also exposes its meter provider.
pub trait MetricsHandle: SignalHandle {
    fn meter_provider(&self) -> SharedMeterProvider;
}

/// Engine for distributed tracing (OTLP, etc.)
pub trait TracingEngine: Send + Sync {
    fn start(&self, options: TracingOptions) -> Result<Box<dyn SignalHandle>, TelemetryError>;
}

/// Engine for metrics collection and export
pub trait MetricsEngine: Send + Sync {
    fn start(&self, options: MetricsOptions) -> Result<Box<dyn MetricsHandle>, TelemetryError>;
}

/// Engine for continuous profiling
pub trait ProfilingEngine: Send + Sync {
    fn start(&self, options: ProfilingOptions) -> Result<Box<dyn SignalHandle>, TelemetryError>;

    /// Settings the engine would run with for `options`. Must not start anything.
    fn materialize(&self, options: &ProfilingOptions, env: &dyn Env) -> ProfilingSettings {
        options.materialize(env)
    }
}
