//! Enablement precedence and option merging for a single start call.

use crate::telemetry::config::{SharedOptions, SignalConfig};
use crate::telemetry::diag::{parse_log_level, LogLevel};
use crate::telemetry::env::{self, Env};
use crate::telemetry::signals::SignalOptions;

/// Caller level, then `OTEL_LOG_LEVEL`, then [`LogLevel::None`].
pub fn resolve_log_level(option: Option<LogLevel>, env: &dyn Env) -> LogLevel {
    option.unwrap_or_else(|| parse_log_level(env.non_empty(env::LOG_LEVEL).as_deref()))
}

/// Caller value, then environment flag, then the hard default.
pub fn is_signal_enabled<T>(
    config: Option<&SignalConfig<T>>,
    env_flag: Option<bool>,
    default: bool,
) -> bool {
    match (config, env_flag) {
        (Some(config), _) => config.is_enabled(),
        (None, Some(flag)) => flag,
        (None, None) => default,
    }
}

/// Signal options with shared identity fields filled in where the caller
/// left them unset.
pub fn signal_options<T: SignalOptions>(
    config: Option<SignalConfig<T>>,
    shared: &SharedOptions,
) -> T {
    config
        .and_then(SignalConfig::into_options)
        .unwrap_or_default()
        .inherit(shared)
}
