use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use super::{fill, resolve_endpoint, resolve_service_name, SignalOptions};
use crate::telemetry::config::{SharedOptions, SignalConfig};
use crate::telemetry::env::{self, Env};

pub const DEFAULT_CALL_STACK_INTERVAL: Duration = Duration::from_millis(1_000);
pub const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_millis(30_000);

/// Profiler options. Profiles are shipped as logs, so there is no access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilingOptions {
    pub endpoint: Option<String>,
    pub service_name: Option<String>,
    pub call_stack_interval_millis: Option<u64>,
    pub collection_interval_millis: Option<u64>,
    pub memory_profiling_enabled: Option<bool>,
    pub resource_attributes: BTreeMap<String, String>,
}

/// Fully defaulted profiler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingSettings {
    pub endpoint: String,
    pub service_name: String,
    pub call_stack_interval: Duration,
    pub collection_interval: Duration,
    pub memory_profiling_enabled: bool,
    pub resource_attributes: BTreeMap<String, String>,
}

impl ProfilingOptions {
    /// Apply defaults without starting anything.
    pub fn materialize(&self, env: &dyn Env) -> ProfilingSettings {
        ProfilingSettings {
            endpoint: resolve_endpoint(self.endpoint.as_deref(), env, env::PROFILER_LOGS_ENDPOINT),
            service_name: resolve_service_name(self.service_name.as_deref(), env),
            call_stack_interval: self
                .call_stack_interval_millis
                .map(Duration::from_millis)
                .or_else(|| env.millis(env::PROFILER_CALL_STACK_INTERVAL))
                .unwrap_or(DEFAULT_CALL_STACK_INTERVAL),
            collection_interval: self
                .collection_interval_millis
                .map(Duration::from_millis)
                .or_else(|| env.millis(env::PROFILER_COLLECTION_INTERVAL))
                .unwrap_or(DEFAULT_COLLECTION_INTERVAL),
            memory_profiling_enabled: self
                .memory_profiling_enabled
                .unwrap_or_else(|| env.boolean(env::PROFILER_MEMORY_ENABLED, false)),
            resource_attributes: self.resource_attributes.clone(),
        }
    }
}

impl SignalOptions for ProfilingOptions {
    fn inherit(self, shared: &SharedOptions) -> Self {
        Self {
            endpoint: fill(self.endpoint, &shared.endpoint),
            service_name: fill(self.service_name, &shared.service_name),
            ..self
        }
    }
}

impl From<ProfilingOptions> for SignalConfig<ProfilingOptions> {
    fn from(options: ProfilingOptions) -> Self {
        Self::EnabledWithOptions(options)
    }
}
