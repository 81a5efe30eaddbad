//! Lifecycle coordination for tracing, metrics and profiling.
//!
//! A [`SignalCoordinator`] starts and stops the three signals as one unit.
//! Each signal is produced by a pluggable engine; with the `otlp` feature
//! (on by default) tracing and metrics export over OTLP/gRPC.
//!
//! # Features
//!
//! - `otlp`: Default OTLP/gRPC tracing and metrics engines
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use apm_bootstrap::telemetry::{SignalCoordinator, StartOptions};
//!
//! let mut coordinator = SignalCoordinator::builder().build();
//! coordinator.start(StartOptions::default().with_service_name("checkout"))?;
//!
//! // ...
//!
//! coordinator.stop().await?;
//! ```
//!
//! # Configuration
//!
//! ## Enablement
//!
//! Each signal is enabled by the first source that has an opinion:
//!
//! 1. The caller's [`SignalConfig`] (`true`/`false` or an options object)
//! 2. The signal's environment flag (only exact `true`/`false`, any case)
//! 3. The default: tracing on, metrics off, profiling off
//!
//! A profiler running with memory profiling raises the metrics default to on.
//!
//! ## Shared Fields
//!
//! `accessToken`, `endpoint` and `serviceName` at the top level fill the same
//! fields of every signal's options unless the signal sets its own. Profiling
//! takes `endpoint` and `serviceName` only.
//!
//! ## Log Formats
//!
//! - [`LogFormat::Pretty`]: Human-readable with colors (default for local dev)
//! - [`LogFormat::Json`]: Structured JSON (for cloud environments)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_LOG_LEVEL` | Diagnostic log level | `none` |
//! | `LOG_FORMAT` | `pretty` or `json` | `pretty` |
//! | `APM_TRACING_ENABLED` | Enable tracing | `true` |
//! | `APM_METRICS_ENABLED` | Enable metrics | `false` |
//! | `APM_PROFILER_ENABLED` | Enable profiling | `false` |
//! | `APM_PROFILER_MEMORY_ENABLED` | Memory profiling | `false` |
//! | `APM_INSTRUMENTATION_METRICS_ENABLED` | Real meter provider for instrumentations | `false` |
//! | `APM_ACCESS_TOKEN` | Bearer token for OTLP exports | - |
//! | `OTEL_SERVICE_NAME` | Service name | `unnamed-rust-service` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP endpoint | `http://localhost:4317` |
//! | `OTEL_EXPORTER_OTLP_TRACES_ENDPOINT` | Traces endpoint | - |
//! | `OTEL_EXPORTER_OTLP_METRICS_ENDPOINT` | Metrics endpoint | - |
//! | `OTEL_METRIC_EXPORT_INTERVAL` | Export interval (ms) | `30000` |
//! | `APM_PROFILER_LOGS_ENDPOINT` | Profiler endpoint | - |
//! | `APM_PROFILER_CALL_STACK_INTERVAL` | Sampling interval (ms) | `1000` |
//! | `APM_PROFILER_COLLECTION_INTERVAL` | Upload interval (ms) | `30000` |
//!
//! # Module Structure
//!
//! - [`api`]: Engine and handle traits
//! - [`config`]: Start options
//! - [`coordinator`]: Start/stop sequencing
//! - [`signals`]: Per-signal options and defaults
//! - [`instrumentation`]: Meter provider propagation
//! - [`otlp`]: OTLP engines (feature-gated)

pub mod api;
pub mod config;
pub mod coordinator;
pub mod diag;
pub mod env;
pub mod error;
pub mod instrumentation;
pub mod meter;
pub mod resolve;
pub mod resource;
pub mod signals;

#[cfg(feature = "otlp")]
pub mod otlp;
#[cfg(feature = "otlp")]
pub use otlp::{OtlpMetricsEngine, OtlpTracingEngine};

// Re-exports
pub use api::{MetricsEngine, MetricsHandle, ProfilingEngine, SignalHandle, TracingEngine};
pub use config::{LogFormat, Signal, SignalConfig, StartOptions};
pub use coordinator::{CoordinatorBuilder, SignalCoordinator};
pub use diag::{DiagnosticLogger, LogLevel};
pub use env::{Env, ProcessEnv};
pub use error::{ErrorKind, TelemetryError};
pub use instrumentation::{Instrumentation, InstrumentationRegistry, LibraryInstrumentation};
pub use meter::{FlushableMeterProvider, NoopMeterProvider, SharedMeterProvider};
pub use signals::{MetricsOptions, ProfilingOptions, TracingOptions};
