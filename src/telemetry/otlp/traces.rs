use std::sync::Arc;

use futures_util::future::BoxFuture;
use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::info;

use super::{access_token_metadata, shutdown_on_blocking_pool, tls_config_for};
use crate::telemetry::api::{SignalHandle, TracingEngine};
use crate::telemetry::env::{Env, ProcessEnv};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::resource::build_resource;
use crate::telemetry::signals::{TracingOptions, TracingSettings};

/// Tracing engine exporting spans over OTLP/gRPC with a batch processor.
#[derive(Clone)]
pub struct OtlpTracingEngine {
    env: Arc<dyn Env>,
}

impl OtlpTracingEngine {
    pub fn new() -> Self {
        Self::with_env(Arc::new(ProcessEnv))
    }

    pub fn with_env(env: Arc<dyn Env>) -> Self {
        Self { env }
    }

    /// Build the tracer provider without installing it globally.
    pub fn build_provider(
        &self,
        settings: &TracingSettings,
    ) -> Result<SdkTracerProvider, TelemetryError> {
        let metadata = access_token_metadata(settings.access_token.as_deref())?;

        let mut builder = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(settings.endpoint.clone())
            .with_metadata(metadata);
        if let Some(tls) = tls_config_for(&settings.endpoint) {
            builder = builder.with_tls_config(tls);
        }
        let exporter = builder.build()?;

        Ok(SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(build_resource(
                &settings.service_name,
                &settings.resource_attributes,
            ))
            .build())
    }
}

impl Default for OtlpTracingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingEngine for OtlpTracingEngine {
    fn start(&self, options: TracingOptions) -> Result<Box<dyn SignalHandle>, TelemetryError> {
        let settings = options.materialize(self.env.as_ref());
        let provider = self.build_provider(&settings)?;

        opentelemetry::global::set_tracer_provider(provider.clone());
        info!(
            endpoint = %settings.endpoint,
            service_name = %settings.service_name,
            "OTLP tracing started"
        );

        Ok(Box::new(OtlpTracingHandle { provider }))
    }
}

pub struct OtlpTracingHandle {
    provider: SdkTracerProvider,
}

impl OtlpTracingHandle {
    pub fn provider(&self) -> &SdkTracerProvider {
        &self.provider
    }
}

impl SignalHandle for OtlpTracingHandle {
    fn stop(self: Box<Self>) -> BoxFuture<'static, Result<(), TelemetryError>> {
        let provider = self.provider;
        shutdown_on_blocking_pool(move || provider.shutdown().map_err(TelemetryError::from))
    }
}
