//! Registry of loaded instrumentation libraries.
//!
//! Libraries register themselves once; every coordinator start hands each of
//! them the meter provider it should record into.

use std::sync::{Arc, PoisonError, RwLock};

use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::InstrumentationScope;

use crate::telemetry::error::TelemetryError;
use crate::telemetry::meter::{FlushableMeterProvider, NoopMeterProvider, SharedMeterProvider};

/// A loaded instrumentation library that records metrics.
pub trait Instrumentation: Send + Sync {
    fn name(&self) -> &str;

    fn set_meter_provider(&self, provider: SharedMeterProvider);
}

/// Shared list of loaded instrumentations. Clones see the same list.
#[derive(Clone, Default)]
pub struct InstrumentationRegistry {
    loaded: Arc<RwLock<Vec<Arc<dyn Instrumentation>>>>,
}

impl InstrumentationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, instrumentation: Arc<dyn Instrumentation>) {
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instrumentation);
    }

    /// Snapshot of the currently loaded instrumentations.
    pub fn loaded(&self) -> Vec<Arc<dyn Instrumentation>> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.loaded.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ready-made [`Instrumentation`] for libraries that just need a meter.
///
/// Starts out with a no-op provider until a coordinator injects one.
pub struct LibraryInstrumentation {
    name: String,
    version: Option<String>,
    provider: RwLock<SharedMeterProvider>,
}

impl LibraryInstrumentation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            provider: RwLock::new(NoopMeterProvider::shared()),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Meter scoped to this library from the current provider.
    pub fn meter(&self) -> Meter {
        let mut scope = InstrumentationScope::builder(self.name.clone());
        if let Some(version) = &self.version {
            scope = scope.with_version(version.clone());
        }
        self.meter_provider().meter_with_scope(scope.build())
    }

    pub fn meter_provider(&self) -> SharedMeterProvider {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        self.meter_provider().force_flush()
    }
}

impl Instrumentation for LibraryInstrumentation {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_meter_provider(&self, provider: SharedMeterProvider) {
        *self.provider.write().unwrap_or_else(PoisonError::into_inner) = provider;
    }
}
