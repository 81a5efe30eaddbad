//! Bootstrap for application performance monitoring.
//!
//! See [`telemetry`] for the coordinator and its configuration.

pub mod telemetry;
