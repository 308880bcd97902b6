use commonware_runtime::Metrics as RuntimeMetrics;
use prometheus_client::metrics::{counter::Counter, gauge::Gauge};

/// Metrics for the [`Engine`](super::Engine).
#[derive(Default)]
pub struct Metrics {
    /// Number of accepted contributions
    pub contributions: Counter,
    /// Number of registered decryption requests
    pub requests: Counter,
    /// Number of accepted decryptions
    pub fulfilled: Counter,
    /// Number of rejected transactions
    pub rejected: Counter,
    /// Id of the open batch
    pub batch: Gauge,
    /// Number of decryption requests awaiting fulfillment
    pub pending: Gauge,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given context.
    pub fn init<E: RuntimeMetrics>(context: E) -> Self {
        let metrics = Metrics::default();
        context.register(
            "contributions",
            "Number of accepted contributions",
            metrics.contributions.clone(),
        );
        context.register(
            "requests",
            "Number of registered decryption requests",
            metrics.requests.clone(),
        );
        context.register(
            "fulfilled",
            "Number of accepted decryptions",
            metrics.fulfilled.clone(),
        );
        context.register(
            "rejected",
            "Number of rejected transactions",
            metrics.rejected.clone(),
        );
        context.register("batch", "Id of the open batch", metrics.batch.clone());
        context.register(
            "pending",
            "Number of decryption requests awaiting fulfillment",
            metrics.pending.clone(),
        );
        metrics
    }
}
