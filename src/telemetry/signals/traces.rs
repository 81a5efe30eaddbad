use std::collections::BTreeMap;

use serde::Deserialize;

use super::{fill, resolve_endpoint, resolve_service_name, SignalOptions};
use crate::telemetry::config::{SharedOptions, SignalConfig};
use crate::telemetry::env::{self, Env};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracingOptions {
    pub access_token: Option<String>,
    pub endpoint: Option<String>,
    pub service_name: Option<String>,
    pub resource_attributes: BTreeMap<String, String>,
}

/// Fully defaulted tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingSettings {
    pub access_token: Option<String>,
    pub endpoint: String,
    pub service_name: String,
    pub resource_attributes: BTreeMap<String, String>,
}

impl TracingOptions {
    pub fn materialize(&self, env: &dyn Env) -> TracingSettings {
        TracingSettings {
            access_token: self
                .access_token
                .clone()
                .or_else(|| env.non_empty(env::ACCESS_TOKEN)),
            endpoint: resolve_endpoint(self.endpoint.as_deref(), env, env::OTLP_TRACES_ENDPOINT),
            service_name: resolve_service_name(self.service_name.as_deref(), env),
            resource_attributes: self.resource_attributes.clone(),
        }
    }
}

impl SignalOptions for TracingOptions {
    fn inherit(self, shared: &SharedOptions) -> Self {
        Self {
            access_token: fill(self.access_token, &shared.access_token),
            endpoint: fill(self.endpoint, &shared.endpoint),
            service_name: fill(self.service_name, &shared.service_name),
            ..self
        }
    }
}

impl From<TracingOptions> for SignalConfig<TracingOptions> {
    fn from(options: TracingOptions) -> Self {
        Self::EnabledWithOptions(options)
    }
}
