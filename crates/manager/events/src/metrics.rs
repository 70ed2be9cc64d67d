use crate::DispatchError;
use std::time::Duration;

#[derive(Debug)]
pub(crate) struct Metrics;

impl Metrics {
    // --- Metric Names ---
    /// Identifier for dispatched events.
    /// Labels: `queue`, `kind`
    pub(crate) const DISPATCHED_TOTAL: &'static str = "ewm_events_dispatched_total";

    /// Identifier for failed dispatches.
    /// Labels: `queue`, `kind`
    pub(crate) const DISPATCH_ERROR_TOTAL: &'static str = "ewm_events_dispatch_error_total";

    /// Identifier for dispatch latency.
    /// Labels: `queue`, `kind`
    pub(crate) const DISPATCH_LATENCY_SECONDS: &'static str = "ewm_events_dispatch_latency_seconds";

    /// Describes the metrics and zeroes them for every kind of `queue`.
    pub(crate) fn init(queue: &'static str, kinds: &[&'static str]) {
        Self::describe();
        for kind in kinds {
            Self::zero(queue, kind);
        }
    }

    fn describe() {
        metrics::describe_counter!(
            Self::DISPATCHED_TOTAL,
            metrics::Unit::Count,
            "Total number of events dispatched by the wallet manager queues",
        );

        metrics::describe_counter!(
            Self::DISPATCH_ERROR_TOTAL,
            metrics::Unit::Count,
            "Total number of event dispatches that failed or panicked",
        );

        metrics::describe_histogram!(
            Self::DISPATCH_LATENCY_SECONDS,
            metrics::Unit::Seconds,
            "Time spent dispatching a single event",
        );
    }

    fn zero(queue: &'static str, kind: &'static str) {
        metrics::counter!(Self::DISPATCHED_TOTAL, "queue" => queue, "kind" => kind).increment(0);
        metrics::counter!(Self::DISPATCH_ERROR_TOTAL, "queue" => queue, "kind" => kind)
            .increment(0);
        metrics::histogram!(Self::DISPATCH_LATENCY_SECONDS, "queue" => queue, "kind" => kind)
            .record(0.0);
    }

    /// Records the outcome and latency of one dispatch.
    pub(crate) fn record_dispatch(
        queue: &'static str,
        kind: &'static str,
        result: &Result<(), DispatchError>,
        latency: Duration,
    ) {
        metrics::counter!(Self::DISPATCHED_TOTAL, "queue" => queue, "kind" => kind).increment(1);
        if result.is_err() {
            metrics::counter!(Self::DISPATCH_ERROR_TOTAL, "queue" => queue, "kind" => kind)
                .increment(1);
        }
        metrics::histogram!(Self::DISPATCH_LATENCY_SECONDS, "queue" => queue, "kind" => kind)
            .record(latency.as_secs_f64());
    }
}
