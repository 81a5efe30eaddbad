use std::sync::Arc;

use futures_util::future::BoxFuture;
use opentelemetry_otlp::{MetricExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use tracing::info;

use super::{access_token_metadata, shutdown_on_blocking_pool, tls_config_for};
use crate::telemetry::api::{MetricsEngine, MetricsHandle, SignalHandle};
use crate::telemetry::env::{Env, ProcessEnv};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::meter::SharedMeterProvider;
use crate::telemetry::resource::build_resource;
use crate::telemetry::signals::{MetricsOptions, MetricsSettings};

/// Metrics engine pushing to OTLP/gRPC on a fixed export interval.
#[derive(Clone)]
pub struct OtlpMetricsEngine {
    env: Arc<dyn Env>,
}

impl OtlpMetricsEngine {
    pub fn new() -> Self {
        Self::with_env(Arc::new(ProcessEnv))
    }

    pub fn with_env(env: Arc<dyn Env>) -> Self {
        Self { env }
    }

    /// Build the meter provider without installing it globally.
    pub fn build_provider(
        &self,
        settings: &MetricsSettings,
    ) -> Result<SdkMeterProvider, TelemetryError> {
        let metadata = access_token_metadata(settings.access_token.as_deref())?;

        let mut builder = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(settings.endpoint.clone())
            .with_metadata(metadata);
        if let Some(tls) = tls_config_for(&settings.endpoint) {
            builder = builder.with_tls_config(tls);
        }
        let exporter = builder.build()?;

        let reader = PeriodicReader::builder(exporter)
            .with_interval(settings.export_interval)
            .build();

        Ok(SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(build_resource(
                &settings.service_name,
                &settings.resource_attributes,
            ))
            .build())
    }
}

impl Default for OtlpMetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEngine for OtlpMetricsEngine {
    fn start(&self, options: MetricsOptions) -> Result<Box<dyn MetricsHandle>, TelemetryError> {
        let settings = options.materialize(self.env.as_ref());
        let provider = self.build_provider(&settings)?;

        opentelemetry::global::set_meter_provider(provider.clone());
        info!(
            endpoint = %settings.endpoint,
            interval_ms = settings.export_interval.as_millis() as u64,
            "OTLP metrics started"
        );

        Ok(Box::new(OtlpMetricsHandle { provider }))
    }
}

pub struct OtlpMetricsHandle {
    provider: SdkMeterProvider,
}

impl SignalHandle for OtlpMetricsHandle {
    fn stop(self: Box<Self>) -> BoxFuture<'static, Result<(), TelemetryError>> {
        let provider = self.provider;
        shutdown_on_blocking_pool(move || provider.shutdown().map_err(TelemetryError::from))
    }
}

impl MetricsHandle for OtlpMetricsHandle {
    fn meter_provider(&self) -> SharedMeterProvider {
        Arc::new(self.provider.clone())
    }
}
