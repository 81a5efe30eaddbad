//! Start/stop sequencing for the three signals.
//!
//! A [`SignalCoordinator`] owns at most one running handle per signal. Signals
//! start in a fixed order (profiling, tracing, metrics) because a profiler
//! with memory profiling turns metrics on by default. Stopping takes every
//! handle at once and shuts them down concurrently.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{join_all, BoxFuture};
use tracing::{debug, info, warn};

use crate::telemetry::api::{MetricsEngine, MetricsHandle, ProfilingEngine, SignalHandle, TracingEngine};
use crate::telemetry::config::{LogFormat, Signal, StartOptions};
use crate::telemetry::diag::install_diagnostic_logger;
use crate::telemetry::env::{self, Env, ProcessEnv};
use crate::telemetry::error::TelemetryError;
use crate::telemetry::instrumentation::InstrumentationRegistry;
use crate::telemetry::meter::{NoopMeterProvider, ProcessMeterProvider, SharedMeterProvider};
use crate::telemetry::resolve::{is_signal_enabled, resolve_log_level, signal_options};

#[derive(Default)]
struct LifecycleState {
    tracing: Option<Box<dyn SignalHandle>>,
    metrics: Option<Box<dyn MetricsHandle>>,
    profiling: Option<Box<dyn SignalHandle>>,
}

impl LifecycleState {
    fn is_idle(&self) -> bool {
        self.tracing.is_none() && self.metrics.is_none() && self.profiling.is_none()
    }
}

/// Owns the running tracing, metrics and profiling subsystems.
pub struct SignalCoordinator {
    tracing_engine: Option<Arc<dyn TracingEngine>>,
    metrics_engine: Option<Arc<dyn MetricsEngine>>,
    profiling_engine: Option<Arc<dyn ProfilingEngine>>,
    registry: InstrumentationRegistry,
    env: Arc<dyn Env>,
    log_format: LogFormat,
    state: LifecycleState,
}

impl SignalCoordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    /// Start every enabled signal.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::AlreadyStarted`] if any signal is still running.
    /// Engine failures are returned as-is; signals started before the
    /// failure keep running until [`stop`](Self::stop).
    pub fn start(&mut self, options: StartOptions) -> Result<(), TelemetryError> {
        self.ensure_idle()?;
        self.launch(options)
    }

    /// Like [`start`](Self::start), taking options as a JSON object.
    ///
    /// Unknown top-level keys fail with [`TelemetryError::UnrecognizedOptions`]
    /// before anything starts.
    pub fn start_from_json(&mut self, value: serde_json::Value) -> Result<(), TelemetryError> {
        self.ensure_idle()?;
        let options = StartOptions::from_json(value)?;
        self.launch(options)
    }

    /// Stop every running signal.
    ///
    /// Handles are released before this returns, so [`start`](Self::start) may
    /// be called again right away. The returned future resolves once every
    /// shutdown has finished and fails if any of them failed.
    pub fn stop(&mut self) -> impl Future<Output = Result<(), TelemetryError>> + Send + 'static {
        let mut pending: Vec<(Signal, BoxFuture<'static, Result<(), TelemetryError>>)> =
            Vec::with_capacity(3);

        if let Some(handle) = self.state.metrics.take() {
            pending.push((Signal::Metrics, handle.stop()));
        }
        if let Some(handle) = self.state.tracing.take() {
            pending.push((Signal::Tracing, handle.stop()));
        }
        if let Some(handle) = self.state.profiling.take() {
            pending.push((Signal::Profiling, handle.stop()));
        }

        async move {
            let (signals, shutdowns): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
            let results = join_all(shutdowns).await;

            let failures: Vec<(Signal, TelemetryError)> = signals
                .into_iter()
                .zip(results)
                .filter_map(|(signal, result)| result.err().map(|err| (signal, err)))
                .collect();

            if failures.is_empty() {
                Ok(())
            } else {
                for (signal, err) in &failures {
                    warn!(signal = %signal, error = %err, "signal failed to stop");
                }
                Err(TelemetryError::Stop(failures))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn running_signals(&self) -> Vec<Signal> {
        let mut running = Vec::new();
        if self.state.tracing.is_some() {
            running.push(Signal::Tracing);
        }
        if self.state.metrics.is_some() {
            running.push(Signal::Metrics);
        }
        if self.state.profiling.is_some() {
            running.push(Signal::Profiling);
        }
        running
    }

    pub fn registry(&self) -> &InstrumentationRegistry {
        &self.registry
    }

    fn ensure_idle(&self) -> Result<(), TelemetryError> {
        if self.state.is_idle() {
            Ok(())
        } else {
            Err(TelemetryError::AlreadyStarted)
        }
    }

    fn launch(&mut self, options: StartOptions) -> Result<(), TelemetryError> {
        let log_level = resolve_log_level(options.log_level, self.env.as_ref());
        if install_diagnostic_logger(log_level, self.log_format) {
            debug!(level = %log_level, "diagnostic logger active");
        }

        let shared = options.shared();
        let StartOptions {
            tracing,
            metrics,
            profiling,
            ..
        } = options;

        let mut metrics_by_default = false;

        if is_signal_enabled(profiling.as_ref(), self.env.flag(env::PROFILER_ENABLED), false) {
            let engine = self
                .profiling_engine
                .clone()
                .ok_or_else(|| missing_engine(Signal::Profiling))?;
            let options = signal_options(profiling, &shared);
            self.state.profiling = Some(engine.start(options.clone())?);
            info!(signal = %Signal::Profiling, "signal started");

            if engine.materialize(&options, self.env.as_ref()).memory_profiling_enabled {
                debug!("memory profiling enabled, metrics default raised");
                metrics_by_default = true;
            }
        }

        if is_signal_enabled(tracing.as_ref(), self.env.flag(env::TRACING_ENABLED), true) {
            let engine = self
                .tracing_engine
                .clone()
                .ok_or_else(|| missing_engine(Signal::Tracing))?;
            self.state.tracing = Some(engine.start(signal_options(tracing, &shared))?);
            info!(signal = %Signal::Tracing, "signal started");
        }

        if is_signal_enabled(
            metrics.as_ref(),
            self.env.flag(env::METRICS_ENABLED),
            metrics_by_default,
        ) {
            let engine = self
                .metrics_engine
                .clone()
                .ok_or_else(|| missing_engine(Signal::Metrics))?;
            self.state.metrics = Some(engine.start(signal_options(metrics, &shared))?);
            info!(signal = %Signal::Metrics, "signal started");
        }

        self.propagate_meter_provider();
        Ok(())
    }

    fn propagate_meter_provider(&self) {
        let provider: SharedMeterProvider =
            if self.env.boolean(env::INSTRUMENTATION_METRICS_ENABLED, false) {
                match &self.state.metrics {
                    Some(handle) => handle.meter_provider(),
                    None => Arc::new(ProcessMeterProvider::current()),
                }
            } else {
                NoopMeterProvider::shared()
            };

        for instrumentation in self.registry.loaded() {
            debug!(instrumentation = instrumentation.name(), "setting meter provider");
            instrumentation.set_meter_provider(provider.clone());
        }
    }
}

fn missing_engine(signal: Signal) -> TelemetryError {
    TelemetryError::Config(format!("{signal} is enabled but no {signal} engine is registered"))
}

/// Builder for [`SignalCoordinator`].
///
/// With the `otlp` feature, tracing and metrics default to the OTLP engines.
/// There is no default profiling engine.
#[derive(Default)]
pub struct CoordinatorBuilder {
    tracing_engine: Option<Arc<dyn TracingEngine>>,
    metrics_engine: Option<Arc<dyn MetricsEngine>>,
    profiling_engine: Option<Arc<dyn ProfilingEngine>>,
    registry: Option<InstrumentationRegistry>,
    env: Option<Arc<dyn Env>>,
    log_format: Option<LogFormat>,
}

impl CoordinatorBuilder {
    pub fn tracing_engine(mut self, engine: impl TracingEngine + 'static) -> Self {
        self.tracing_engine = Some(Arc::new(engine));
        self
    }

    pub fn metrics_engine(mut self, engine: impl MetricsEngine + 'static) -> Self {
        self.metrics_engine = Some(Arc::new(engine));
        self
    }

    pub fn profiling_engine(mut self, engine: impl ProfilingEngine + 'static) -> Self {
        self.profiling_engine = Some(Arc::new(engine));
        self
    }

    pub fn registry(mut self, registry: InstrumentationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn env(mut self, env: impl Env + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn json(self) -> Self {
        self.log_format(LogFormat::Json)
    }

    pub fn pretty(self) -> Self {
        self.log_format(LogFormat::Pretty)
    }

    pub fn build(self) -> SignalCoordinator {
        let env: Arc<dyn Env> = self.env.unwrap_or_else(|| Arc::new(ProcessEnv));

        #[cfg(feature = "otlp")]
        let (tracing_engine, metrics_engine) = (
            self.tracing_engine.or_else(|| {
                Some(Arc::new(crate::telemetry::otlp::OtlpTracingEngine::with_env(env.clone()))
                    as Arc<dyn TracingEngine>)
            }),
            self.metrics_engine.or_else(|| {
                Some(Arc::new(crate::telemetry::otlp::OtlpMetricsEngine::with_env(env.clone()))
                    as Arc<dyn MetricsEngine>)
            }),
        );
        #[cfg(not(feature = "otlp"))]
        let (tracing_engine, metrics_engine) = (self.tracing_engine, self.metrics_engine);

        SignalCoordinator {
            tracing_engine,
            metrics_engine,
            profiling_engine: self.profiling_engine,
            registry: self.registry.unwrap_or_default(),
            log_format: self
                .log_format
                .unwrap_or_else(|| LogFormat::from_env(env.as_ref())),
            env,
            state: LifecycleState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::config::SignalConfig;
    use crate::telemetry::instrumentation::Instrumentation;
    use crate::telemetry::meter::FlushableMeterProvider;
    use crate::telemetry::signals::{MetricsOptions, ProfilingOptions, TracingOptions};
    use futures_util::future;
    use opentelemetry::metrics::{Meter, MeterProvider};
    use opentelemetry::InstrumentationScope;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct CountingMeterProvider {
        flushes: AtomicUsize,
    }

    impl MeterProvider for CountingMeterProvider {
        fn meter_with_scope(&self, scope: InstrumentationScope) -> Meter {
            NoopMeterProvider.meter_with_scope(scope)
        }
    }

    impl FlushableMeterProvider for CountingMeterProvider {
        fn force_flush(&self) -> Result<(), TelemetryError> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScopeRecordingProvider(Arc<Mutex<Vec<String>>>);

    impl MeterProvider for ScopeRecordingProvider {
        fn meter_with_scope(&self, scope: InstrumentationScope) -> Meter {
            self.0.lock().unwrap().push(scope.name().to_string());
            NoopMeterProvider.meter_with_scope(scope)
        }
    }

    struct FakeHandle {
        signal: Signal,
        journal: Journal,
        fail_stop: bool,
        meter_provider: Arc<CountingMeterProvider>,
    }

    impl SignalHandle for FakeHandle {
        fn stop(self: Box<Self>) -> BoxFuture<'static, Result<(), TelemetryError>> {
            self.journal.push(format!("stop:{}", self.signal));
            let result = if self.fail_stop {
                Err(TelemetryError::Shutdown(format!("{} exporter hung", self.signal)))
            } else {
                Ok(())
            };
            Box::pin(future::ready(result))
        }
    }

    impl MetricsHandle for FakeHandle {
        fn meter_provider(&self) -> SharedMeterProvider {
            self.meter_provider.clone()
        }
    }

    #[derive(Clone, Default)]
    struct FakeEngine<T> {
        journal: Journal,
        started: Arc<Mutex<Vec<T>>>,
        fail_start: bool,
        fail_stop: bool,
        meter_provider: Arc<CountingMeterProvider>,
    }

    impl<T: Clone> FakeEngine<T> {
        fn record(&self, signal: Signal, options: T) -> Result<FakeHandle, TelemetryError> {
            self.journal.push(format!("start:{signal}"));
            if self.fail_start {
                return Err(TelemetryError::Init(format!("{signal} engine refused to start")));
            }
            self.started.lock().unwrap().push(options);
            Ok(FakeHandle {
                signal,
                journal: self.journal.clone(),
                fail_stop: self.fail_stop,
                meter_provider: self.meter_provider.clone(),
            })
        }

        fn started(&self) -> Vec<T> {
            self.started.lock().unwrap().clone()
        }
    }

    impl TracingEngine for FakeEngine<TracingOptions> {
        fn start(&self, options: TracingOptions) -> Result<Box<dyn SignalHandle>, TelemetryError> {
            Ok(Box::new(self.record(Signal::Tracing, options)?))
        }
    }

    impl MetricsEngine for FakeEngine<MetricsOptions> {
        fn start(&self, options: MetricsOptions) -> Result<Box<dyn MetricsHandle>, TelemetryError> {
            Ok(Box::new(self.record(Signal::Metrics, options)?))
        }
    }

    impl ProfilingEngine for FakeEngine<ProfilingOptions> {
        fn start(
            &self,
            options: ProfilingOptions,
        ) -> Result<Box<dyn SignalHandle>, TelemetryError> {
            Ok(Box::new(self.record(Signal::Profiling, options)?))
        }
    }

    #[derive(Default)]
    struct RecordingInstrumentation {
        provider: Mutex<Option<SharedMeterProvider>>,
    }

    impl RecordingInstrumentation {
        fn provider(&self) -> SharedMeterProvider {
            self.provider
                .lock()
                .unwrap()
                .clone()
                .expect("meter provider was never set")
        }
    }

    impl Instrumentation for RecordingInstrumentation {
        fn name(&self) -> &str {
            "recording"
        }

        fn set_meter_provider(&self, provider: SharedMeterProvider) {
            *self.provider.lock().unwrap() = Some(provider);
        }
    }

    #[derive(Default)]
    struct Harness {
        journal: Journal,
        tracing: FakeEngine<TracingOptions>,
        metrics: FakeEngine<MetricsOptions>,
        profiling: FakeEngine<ProfilingOptions>,
        registry: InstrumentationRegistry,
    }

    impl Harness {
        fn new() -> Self {
            let journal = Journal::default();
            Self {
                tracing: FakeEngine {
                    journal: journal.clone(),
                    ..FakeEngine::default()
                },
                metrics: FakeEngine {
                    journal: journal.clone(),
                    ..FakeEngine::default()
                },
                profiling: FakeEngine {
                    journal: journal.clone(),
                    ..FakeEngine::default()
                },
                journal,
                registry: InstrumentationRegistry::new(),
            }
        }

        fn coordinator(&self, vars: &[(&str, &str)]) -> SignalCoordinator {
            let env: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            SignalCoordinator::builder()
                .env(env)
                .tracing_engine(self.tracing.clone())
                .metrics_engine(self.metrics.clone())
                .profiling_engine(self.profiling.clone())
                .registry(self.registry.clone())
                .build()
        }

        fn instrument(&self) -> Arc<RecordingInstrumentation> {
            let instrumentation = Arc::new(RecordingInstrumentation::default());
            self.registry.register(instrumentation.clone());
            instrumentation
        }
    }

    fn memory_profiling() -> ProfilingOptions {
        ProfilingOptions {
            memory_profiling_enabled: Some(true),
            ..ProfilingOptions::default()
        }
    }

    #[test]
    fn identity_only_start_runs_tracing_with_shared_fields() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start_from_json(json!({ "accessToken": "t", "endpoint": "e", "serviceName": "s" }))
            .unwrap();

        assert_eq!(
            harness.tracing.started(),
            vec![TracingOptions {
                access_token: Some("t".into()),
                endpoint: Some("e".into()),
                service_name: Some("s".into()),
                ..TracingOptions::default()
            }]
        );
        assert!(harness.metrics.started().is_empty());
        assert!(harness.profiling.started().is_empty());
        assert_eq!(coordinator.running_signals(), vec![Signal::Tracing]);
    }

    #[test]
    fn second_start_fails_without_side_effects() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);
        coordinator
            .start(StartOptions::default().with_metrics(true))
            .unwrap();
        let journal_before = harness.journal.entries();

        let err = coordinator
            .start(StartOptions::default().with_profiling(true))
            .unwrap_err();

        assert!(matches!(err, TelemetryError::AlreadyStarted));
        assert!(err.is_usage());
        assert_eq!(harness.journal.entries(), journal_before);
        assert_eq!(
            coordinator.running_signals(),
            vec![Signal::Tracing, Signal::Metrics]
        );
    }

    #[test]
    fn already_started_is_checked_before_option_keys() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);
        coordinator.start(StartOptions::default()).unwrap();

        let err = coordinator
            .start_from_json(json!({ "bogus": true }))
            .unwrap_err();

        assert!(matches!(err, TelemetryError::AlreadyStarted));
    }

    #[test]
    fn unknown_option_key_starts_nothing() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        let err = coordinator
            .start_from_json(json!({ "serviceName": "s", "tracer": true }))
            .unwrap_err();

        match err {
            TelemetryError::UnrecognizedOptions(keys) => assert_eq!(keys, vec!["tracer"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(harness.journal.entries().is_empty());
        assert!(!coordinator.is_running());
    }

    #[test]
    fn memory_profiling_turns_metrics_on_by_default() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start(StartOptions::default().with_profiling(memory_profiling()))
            .unwrap();

        assert_eq!(
            harness.journal.entries(),
            vec!["start:profiling", "start:tracing", "start:metrics"]
        );
    }

    #[test]
    fn memory_profiling_from_env_turns_metrics_on() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[
            (env::PROFILER_ENABLED, "true"),
            (env::PROFILER_MEMORY_ENABLED, "true"),
        ]);

        coordinator.start(StartOptions::default()).unwrap();

        assert_eq!(
            coordinator.running_signals(),
            vec![Signal::Tracing, Signal::Metrics, Signal::Profiling]
        );
        assert_eq!(harness.profiling.started().len(), 1);
    }

    #[test]
    fn profiling_without_memory_leaves_metrics_off() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start(StartOptions::default().with_profiling(true))
            .unwrap();

        assert_eq!(
            coordinator.running_signals(),
            vec![Signal::Tracing, Signal::Profiling]
        );
    }

    #[test]
    fn disabled_profiling_never_raises_metrics_default() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[(env::PROFILER_MEMORY_ENABLED, "true")]);

        coordinator.start(StartOptions::default()).unwrap();

        assert_eq!(coordinator.running_signals(), vec![Signal::Tracing]);
    }

    #[test]
    fn explicit_metrics_false_beats_raised_default() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start(
                StartOptions::default()
                    .with_profiling(memory_profiling())
                    .with_metrics(false),
            )
            .unwrap();

        assert!(harness.metrics.started().is_empty());
    }

    #[test]
    fn env_metrics_false_beats_raised_default() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[(env::METRICS_ENABLED, "false")]);

        coordinator
            .start(StartOptions::default().with_profiling(memory_profiling()))
            .unwrap();

        assert!(harness.metrics.started().is_empty());
    }

    #[test]
    fn caller_disable_beats_env_enable() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[(env::TRACING_ENABLED, "true")]);

        coordinator
            .start(StartOptions::default().with_tracing(false))
            .unwrap();

        assert!(harness.tracing.started().is_empty());
        assert!(!coordinator.is_running());
    }

    #[test]
    fn env_overrides_hard_defaults() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[
            (env::TRACING_ENABLED, "FALSE"),
            (env::METRICS_ENABLED, "True"),
        ]);

        coordinator.start(StartOptions::default()).unwrap();

        assert_eq!(coordinator.running_signals(), vec![Signal::Metrics]);
    }

    #[test]
    fn unparseable_env_flag_falls_back_to_default() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[(env::TRACING_ENABLED, "off")]);

        coordinator.start(StartOptions::default()).unwrap();

        assert_eq!(coordinator.running_signals(), vec![Signal::Tracing]);
    }

    #[test]
    fn signal_options_override_shared_fields() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start_from_json(json!({
                "accessToken": "shared-token",
                "endpoint": "shared-endpoint",
                "tracing": false,
                "metrics": { "endpoint": "metrics-endpoint", "exportIntervalMillis": 1000 },
                "profiling": { "serviceName": "profiled" },
            }))
            .unwrap();

        assert_eq!(
            harness.metrics.started(),
            vec![MetricsOptions {
                access_token: Some("shared-token".into()),
                endpoint: Some("metrics-endpoint".into()),
                export_interval_millis: Some(1000),
                ..MetricsOptions::default()
            }]
        );
        assert_eq!(
            harness.profiling.started(),
            vec![ProfilingOptions {
                endpoint: Some("shared-endpoint".into()),
                service_name: Some("profiled".into()),
                ..ProfilingOptions::default()
            }]
        );
    }

    #[test]
    fn enabled_signal_without_engine_is_a_config_error() {
        let mut coordinator = SignalCoordinator::builder()
            .env(HashMap::<String, String>::new())
            .tracing_engine(FakeEngine::<TracingOptions>::default())
            .build();

        let err = coordinator
            .start(StartOptions::default().with_profiling(true))
            .unwrap_err();

        assert!(matches!(err, TelemetryError::Config(_)));
        assert!(!err.is_usage());
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn failed_start_keeps_earlier_signals_running() {
        let harness = Harness {
            tracing: FakeEngine {
                fail_start: true,
                ..FakeEngine::default()
            },
            ..Harness::new()
        };
        let mut coordinator = harness.coordinator(&[]);

        let err = coordinator
            .start(StartOptions::default().with_profiling(true))
            .unwrap_err();

        assert!(matches!(err, TelemetryError::Init(_)));
        assert_eq!(coordinator.running_signals(), vec![Signal::Profiling]);

        coordinator.stop().await.unwrap();
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn stop_with_nothing_running_succeeds() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);

        coordinator.stop().await.unwrap();

        assert!(harness.journal.entries().is_empty());
    }

    #[tokio::test]
    async fn stop_issues_metrics_then_tracing_then_profiling() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);
        coordinator
            .start(StartOptions::default().with_profiling(memory_profiling()))
            .unwrap();

        coordinator.stop().await.unwrap();

        let stops: Vec<String> = harness
            .journal
            .entries()
            .into_iter()
            .filter(|entry| entry.starts_with("stop:"))
            .collect();
        assert_eq!(stops, vec!["stop:metrics", "stop:tracing", "stop:profiling"]);
    }

    #[tokio::test]
    async fn stop_releases_handles_before_completion() {
        let harness = Harness::new();
        let mut coordinator = harness.coordinator(&[]);
        coordinator
            .start(StartOptions::default().with_metrics(true).with_profiling(true))
            .unwrap();

        let stopping = coordinator.stop();
        assert!(!coordinator.is_running());

        coordinator.start(StartOptions::default()).unwrap();
        stopping.await.unwrap();

        assert_eq!(coordinator.running_signals(), vec![Signal::Tracing]);
    }

    #[tokio::test]
    async fn failed_stop_still_clears_every_handle() {
        let harness = Harness {
            metrics: FakeEngine {
                fail_stop: true,
                ..FakeEngine::default()
            },
            ..Harness::new()
        };
        let mut coordinator = harness.coordinator(&[]);
        coordinator
            .start(StartOptions::default().with_metrics(true).with_profiling(true))
            .unwrap();

        let err = coordinator.stop().await.unwrap_err();

        match err {
            TelemetryError::Stop(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, Signal::Metrics);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!coordinator.is_running());
        coordinator
            .start(StartOptions::default().with_metrics(true).with_profiling(true))
            .unwrap();
        assert_eq!(coordinator.running_signals().len(), 3);
    }

    #[test]
    fn instrumentation_gets_noop_provider_by_default() {
        let harness = Harness::new();
        let instrumentation = harness.instrument();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start(StartOptions::default().with_metrics(true))
            .unwrap();

        instrumentation.provider().force_flush().unwrap();
        assert_eq!(harness.metrics.meter_provider.flushes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn instrumentation_gets_metrics_provider_when_enabled() {
        let harness = Harness::new();
        let instrumentation = harness.instrument();
        let mut coordinator =
            harness.coordinator(&[(env::INSTRUMENTATION_METRICS_ENABLED, "true")]);

        coordinator
            .start(StartOptions::default().with_metrics(true))
            .unwrap();

        instrumentation.provider().force_flush().unwrap();
        assert_eq!(harness.metrics.meter_provider.flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn instrumentation_falls_back_to_global_provider_without_metrics() {
        let scopes = Arc::new(Mutex::new(Vec::new()));
        opentelemetry::global::set_meter_provider(ScopeRecordingProvider(scopes.clone()));
        let harness = Harness::new();
        let instrumentation = harness.instrument();
        let mut coordinator =
            harness.coordinator(&[(env::INSTRUMENTATION_METRICS_ENABLED, "true")]);

        coordinator
            .start(StartOptions::default().with_metrics(false))
            .unwrap();

        assert!(harness.metrics.started().is_empty());
        instrumentation.provider().meter("global-fallback");
        assert!(scopes
            .lock()
            .unwrap()
            .iter()
            .any(|name| name == "global-fallback"));
    }

    #[test]
    fn instrumentation_is_updated_even_with_every_signal_off() {
        let harness = Harness::new();
        let instrumentation = harness.instrument();
        let mut coordinator = harness.coordinator(&[]);

        coordinator
            .start(
                StartOptions::default()
                    .with_tracing(SignalConfig::<TracingOptions>::Disabled)
                    .with_metrics(false),
            )
            .unwrap();

        assert!(!coordinator.is_running());
        assert!(instrumentation.provider().force_flush().is_ok());
    }
}
