//! Per-signal option bags.
//!
//! Each signal declares which shared identity fields it accepts through
//! [`SignalOptions::inherit`]. Fields the caller set on the signal's own
//! options always win over the shared values.

mod metrics;
mod profiling;
mod traces;

pub use metrics::{MetricsOptions, MetricsSettings, DEFAULT_EXPORT_INTERVAL};
pub use profiling::{
    ProfilingOptions, ProfilingSettings, DEFAULT_CALL_STACK_INTERVAL,
    DEFAULT_COLLECTION_INTERVAL,
};
pub use traces::{TracingOptions, TracingSettings};

use crate::telemetry::config::SharedOptions;
use crate::telemetry::env::{self, Env};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4317";
pub const DEFAULT_SERVICE_NAME: &str = "unnamed-rust-service";

/// Options struct for one signal.
pub trait SignalOptions: Default {
    /// Fill unset fields from `shared`, limited to the fields this signal accepts.
    fn inherit(self, shared: &SharedOptions) -> Self;
}

fn fill(slot: Option<String>, shared: &Option<String>) -> Option<String> {
    slot.or_else(|| shared.clone())
}

/// First non-empty of the explicit value, the signal-specific variable, the
/// generic OTLP endpoint variable and the local collector.
fn resolve_endpoint(explicit: Option<&str>, env: &dyn Env, signal_key: &str) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| env.non_empty(signal_key))
        .or_else(|| env.non_empty(env::OTLP_ENDPOINT))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

fn resolve_service_name(explicit: Option<&str>, env: &dyn Env) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| env.non_empty(env::SERVICE_NAME))
        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string())
}
