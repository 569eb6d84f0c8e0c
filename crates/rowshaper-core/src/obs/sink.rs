//! Metrics sink boundary.
//!
//! This module is the only bridge between materialization code and the
//! global metrics state.

use crate::{error::ErrorClass, key::ShapeFingerprint, obs::metrics};
use std::cell::Cell;

thread_local! {
    static SINK_OVERRIDE: Cell<Option<&'static dyn MetricsSink>> = const { Cell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    SessionStart {
        fingerprint: ShapeFingerprint,
    },
    SessionFinish {
        fingerprint: ShapeFingerprint,
        rows_read: u64,
        roots_released: u64,
        elements_built: u64,
    },
    SessionError {
        fingerprint: ShapeFingerprint,
        class: ErrorClass,
    },
    PlanCacheHit,
    PlanCacheMiss,
    PlanCompiled {
        nodes: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink writing into the thread-local metrics state.
/// Used whenever no scoped override is installed.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::SessionStart { fingerprint } => {
                metrics::with_state_mut(|m| {
                    m.ops.sessions_started = m.ops.sessions_started.saturating_add(1);
                    let entry = m.shapes.entry(fingerprint.as_hex()).or_default();
                    entry.sessions = entry.sessions.saturating_add(1);
                });
            }

            MetricsEvent::SessionFinish {
                fingerprint,
                rows_read,
                roots_released,
                elements_built,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.sessions_finished = m.ops.sessions_finished.saturating_add(1);
                    m.ops.rows_read = m.ops.rows_read.saturating_add(rows_read);
                    m.ops.roots_released = m.ops.roots_released.saturating_add(roots_released);
                    m.ops.elements_built = m.ops.elements_built.saturating_add(elements_built);

                    let entry = m.shapes.entry(fingerprint.as_hex()).or_default();
                    entry.rows_read = entry.rows_read.saturating_add(rows_read);
                    entry.roots_released = entry.roots_released.saturating_add(roots_released);
                });
            }

            MetricsEvent::SessionError { fingerprint, class } => {
                metrics::with_state_mut(|m| {
                    m.ops.session_errors = m.ops.session_errors.saturating_add(1);
                    let errors = m.errors.entry(class.to_string()).or_insert(0);
                    *errors = errors.saturating_add(1);

                    let entry = m.shapes.entry(fingerprint.as_hex()).or_default();
                    entry.errors = entry.errors.saturating_add(1);
                });
            }

            MetricsEvent::PlanCacheHit => {
                metrics::with_state_mut(|m| {
                    m.ops.plan_cache_hits = m.ops.plan_cache_hits.saturating_add(1);
                });
            }

            MetricsEvent::PlanCacheMiss => {
                metrics::with_state_mut(|m| {
                    m.ops.plan_cache_misses = m.ops.plan_cache_misses.saturating_add(1);
                });
            }

            MetricsEvent::PlanCompiled { nodes } => {
                metrics::with_state_mut(|m| {
                    m.ops.plans_compiled = m.ops.plans_compiled.saturating_add(1);
                    m.ops.plan_nodes_compiled = m.ops.plan_nodes_compiled.saturating_add(nodes);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    match SINK_OVERRIDE.with(Cell::get) {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Saturating `usize` → `u64` for counters.
pub(crate) fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::since_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub(crate) fn with_metrics_sink<T>(sink: &'static dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<&'static dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| cell.set(self.0));
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.replace(Some(sink)));
    let _guard = Guard(prev);

    f()
}
