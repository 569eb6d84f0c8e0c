//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Materialization logic never touches `metrics` directly; every counter
//! update flows through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, ShapeCounters, ShapeSummary};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
