//! Prometheus metrics for the Ferry bridge.
//!
//! All metrics follow the naming convention: `ferry_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: dispatches by outcome, delivered and malformed events
//! - **Gauge**: live handles by kind, open event subscriptions
//! - **Histogram**: dispatch round-trip latency

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Bridge metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCH METRICS
    // =========================================================================

    /// Dispatches by target (client/wallet/secretManager/utils) and outcome
    pub static ref DISPATCH_TOTAL: CounterVec = CounterVec::new(
        Opts::new("ferry_dispatch_calls_total", "Method dispatches by target and outcome"),
        &["target", "outcome"]  // outcome: ok/error/panic/transport
    ).expect("metric creation failed");

    /// Round trip through the native core
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "ferry_dispatch_duration_seconds",
            "Time from envelope encode to classified outcome"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("valid bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // HANDLE METRICS
    // =========================================================================

    /// Live handles by kind
    pub static ref LIVE_HANDLES: GaugeVec = GaugeVec::new(
        Opts::new("ferry_handles_live", "Handles created and not yet destroyed"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT METRICS
    // =========================================================================

    /// Events handed to a listener callback or stream
    pub static ref EVENTS_DELIVERED: Counter = Counter::new(
        "ferry_events_delivered_total",
        "Pushed events delivered to listeners"
    ).expect("metric creation failed");

    /// Pushed events that could not be decoded
    pub static ref EVENTS_MALFORMED: Counter = Counter::new(
        "ferry_events_malformed_total",
        "Pushed events skipped because they could not be decoded"
    ).expect("metric creation failed");

    /// Open event subscriptions
    pub static ref EVENT_SUBSCRIPTIONS: Gauge = Gauge::new(
        "ferry_event_subscriptions_open",
        "Event subscriptions not yet cleared"
    ).expect("metric creation failed");
}

/// Handle returned by [`register_metrics`].
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the bridge registry.
///
/// Safe to call more than once; metrics already present are left alone.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatch
        Box::new(DISPATCH_TOTAL.clone()),
        Box::new(DISPATCH_DURATION.clone()),
        // Handles
        Box::new(LIVE_HANDLES.clone()),
        // Events
        Box::new(EVENTS_DELIVERED.clone()),
        Box::new(EVENTS_MALFORMED.clone()),
        Box::new(EVENT_SUBSCRIPTIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Registers (if needed) and renders every bridge metric.
pub fn gather_text() -> Result<String, TelemetryError> {
    register_metrics()?;
    encode_metrics()
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
