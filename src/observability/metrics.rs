use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Refresh metrics
    pub credential_refresh_total: IntCounterVec,
    pub credential_refresh_failures: IntCounterVec,
    pub credential_refresh_duration: HistogramVec,
    pub credential_stale_served: IntCounterVec,
    pub credential_expiry_unix: IntGaugeVec,

    // Chain metrics
    pub chain_attempts: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub credential_requests: IntCounterVec,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("credentialsagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Refresh
            credential_refresh_total: IntCounterVec::new(Opts::new("credential_refresh_total", "Refresh attempts by provider"),&["provider"],).unwrap(),
            credential_refresh_failures: IntCounterVec::new(Opts::new("credential_refresh_failures_total", "Refresh failures by provider and error kind"),&["provider", "reason"],).unwrap(),
            credential_refresh_duration: HistogramVec::new(HistogramOpts::new("credential_refresh_duration_seconds", "Refresh duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["provider"],).unwrap(),
            credential_stale_served: IntCounterVec::new(Opts::new("credential_stale_served_total", "Stale credentials served after a failed refresh"),&["provider"],).unwrap(),
            credential_expiry_unix: IntGaugeVec::new(Opts::new("credential_expiry_unix_seconds", "Expiry timestamp of the cached credential"),&["provider"],).unwrap(),

            // Chain
            chain_attempts: IntCounterVec::new(Opts::new("chain_attempts_total", "Provider chain attempts by provider and outcome"),&["provider", "outcome"],).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Provider configuration validation errors",).unwrap(),
            credential_requests: IntCounterVec::new(Opts::new("credential_requests_total", "Credentials served over HTTP"),&["status"],).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.credential_refresh_total.clone())).unwrap();
        reg.register(Box::new(metrics.credential_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.credential_refresh_duration.clone())).unwrap();
        reg.register(Box::new(metrics.credential_stale_served.clone())).unwrap();
        reg.register(Box::new(metrics.credential_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.chain_attempts.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.credential_requests.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
