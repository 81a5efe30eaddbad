//! Default OTLP/gRPC engines for tracing and metrics.
//!
//! # Behavior
//!
//! - Endpoints, service name and access token are materialized from the
//!   signal options and the environment (see [`crate::telemetry::signals`]).
//! - The access token, when present, is sent as a bearer `authorization`
//!   header on every export.
//! - `https://` endpoints get TLS with the platform's native roots.
//! - Each engine installs its provider as the OpenTelemetry global.
//!
//! Engines must be started inside a Tokio runtime. Their handles begin the SDK
//! provider shutdown on the blocking pool as soon as `stop` is called.
//!
//! # Example
//!
//! ```rust,ignore
//! use apm_bootstrap::telemetry::otlp::{OtlpMetricsEngine, OtlpTracingEngine};
//!
//! let coordinator = SignalCoordinator::builder()
//!     .tracing_engine(OtlpTracingEngine::new())
//!     .metrics_engine(OtlpMetricsEngine::new())
//!     .build();
//! ```

mod metadata;
mod metrics;
mod traces;

pub use metadata::access_token_metadata;
pub use metrics::{OtlpMetricsEngine, OtlpMetricsHandle};
pub use traces::{OtlpTracingEngine, OtlpTracingHandle};

use futures_util::future::BoxFuture;
use tonic::transport::ClientTlsConfig;

use crate::telemetry::error::TelemetryError;

fn tls_config_for(endpoint: &str) -> Option<ClientTlsConfig> {
    endpoint
        .starts_with("https://")
        .then(|| ClientTlsConfig::new().with_native_roots())
}

/// Begin a blocking provider shutdown off the async executor.
///
/// The shutdown is spawned right away, so dropping the returned future does
/// not cancel it. Outside a Tokio runtime it runs inline instead.
fn shutdown_on_blocking_pool<F>(shutdown: F) -> BoxFuture<'static, Result<(), TelemetryError>>
where
    F: FnOnce() -> Result<(), TelemetryError> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            let task = runtime.spawn_blocking(shutdown);
            Box::pin(async move {
                task.await
                    .map_err(|e| TelemetryError::Shutdown(e.to_string()))?
            })
        }
        Err(_) => Box::pin(futures_util::future::ready(shutdown())),
    }
}
