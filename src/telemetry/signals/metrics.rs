use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use super::{fill, resolve_endpoint, resolve_service_name, SignalOptions};
use crate::telemetry::config::{SharedOptions, SignalConfig};
use crate::telemetry::env::{self, Env};

pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricsOptions {
    pub access_token: Option<String>,
    pub endpoint: Option<String>,
    pub service_name: Option<String>,
    pub export_interval_millis: Option<u64>,
    pub resource_attributes: BTreeMap<String, String>,
}

/// Fully defaulted metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSettings {
    pub access_token: Option<String>,
    pub endpoint: String,
    pub service_name: String,
    pub export_interval: Duration,
    pub resource_attributes: BTreeMap<String, String>,
}

impl MetricsOptions {
    pub fn materialize(&self, env: &dyn Env) -> MetricsSettings {
        MetricsSettings {
            access_token: self
                .access_token
                .clone()
                .or_else(|| env.non_empty(env::ACCESS_TOKEN)),
            endpoint: resolve_endpoint(self.endpoint.as_deref(), env, env::OTLP_METRICS_ENDPOINT),
            service_name: resolve_service_name(self.service_name.as_deref(), env),
            export_interval: self
                .export_interval_millis
                .map(Duration::from_millis)
                .or_else(|| env.millis(env::METRIC_EXPORT_INTERVAL))
                .unwrap_or(DEFAULT_EXPORT_INTERVAL),
            resource_attributes: self.resource_attributes.clone(),
        }
    }
}

impl SignalOptions for MetricsOptions {
    fn inherit(self, shared: &SharedOptions) -> Self {
        Self {
            access_token: fill(self.access_token, &shared.access_token),
            endpoint: fill(self.endpoint, &shared.endpoint),
            service_name: fill(self.service_name, &shared.service_name),
            ..self
        }
    }
}

impl From<MetricsOptions> for SignalConfig<MetricsOptions> {
    fn from(options: MetricsOptions) -> Self {
        Self::EnabledWithOptions(options)
    }
}
