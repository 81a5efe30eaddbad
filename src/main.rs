use std::sync::Arc;

use apm_bootstrap::telemetry::{
    InstrumentationRegistry, LibraryInstrumentation, SignalCoordinator, StartOptions,
    TelemetryError,
};
use opentelemetry::trace::Tracer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), TelemetryError> {
    let registry = InstrumentationRegistry::new();
    let http = Arc::new(LibraryInstrumentation::new("demo-http").with_version("0.1.0"));
    registry.register(http.clone());

    let mut coordinator = SignalCoordinator::builder().registry(registry).build();
    coordinator.start(StartOptions::default().with_service_name("apm-bootstrap-demo"))?;

    info!(signals = ?coordinator.running_signals(), "telemetry running");

    let tracer = opentelemetry::global::tracer("apm-bootstrap-demo");
    let requests = http.meter().u64_counter("demo.requests").build();
    for _ in 0..3 {
        tracer.in_span("handle_request", |_cx| requests.add(1, &[]));
    }

    coordinator.stop().await
}
