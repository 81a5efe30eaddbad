//! Meter providers handed to instrumentation libraries.

use std::sync::Arc;

use opentelemetry::metrics::{InstrumentProvider, Meter, MeterProvider};
use opentelemetry::InstrumentationScope;
use opentelemetry_sdk::metrics::SdkMeterProvider;

use crate::telemetry::error::TelemetryError;

/// A meter provider that can also be flushed.
///
/// Some instrumentation flushes its provider before reporting, so even the
/// no-op variant has to answer `force_flush`.
pub trait FlushableMeterProvider: MeterProvider + Send + Sync {
    fn force_flush(&self) -> Result<(), TelemetryError>;
}

pub type SharedMeterProvider = Arc<dyn FlushableMeterProvider>;

impl FlushableMeterProvider for SdkMeterProvider {
    fn force_flush(&self) -> Result<(), TelemetryError> {
        SdkMeterProvider::force_flush(self).map_err(|e| TelemetryError::Exporter(e.to_string()))
    }
}

/// Instruments from this provider record nothing.
struct NoopInstruments;

impl InstrumentProvider for NoopInstruments {}

/// Meter provider whose meters discard every recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMeterProvider;

impl NoopMeterProvider {
    pub fn shared() -> SharedMeterProvider {
        Arc::new(Self)
    }
}

impl MeterProvider for NoopMeterProvider {
    fn meter_with_scope(&self, _scope: InstrumentationScope) -> Meter {
        Meter::new(Arc::new(NoopInstruments))
    }
}

impl FlushableMeterProvider for NoopMeterProvider {
    fn force_flush(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Whatever provider is installed as the OpenTelemetry global.
///
/// Used when instrumentation metrics are requested while no metrics engine
/// of ours is running.
pub struct ProcessMeterProvider {
    inner: Arc<dyn MeterProvider + Send + Sync>,
}

impl ProcessMeterProvider {
    pub fn current() -> Self {
        Self {
            inner: opentelemetry::global::meter_provider(),
        }
    }
}

impl MeterProvider for ProcessMeterProvider {
    fn meter_with_scope(&self, scope: InstrumentationScope) -> Meter {
        self.inner.meter_with_scope(scope)
    }
}

impl FlushableMeterProvider for ProcessMeterProvider {
    /// Does nothing. The global provider is type-erased and exposes no flush,
    /// so pending measurements are only exported on its own schedule.
    fn force_flush(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}
