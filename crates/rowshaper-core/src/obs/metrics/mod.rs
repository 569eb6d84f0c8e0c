use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    cmp::Ordering,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for materialization sessions.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub errors: BTreeMap<String, u64>,
    pub shapes: BTreeMap<String, ShapeCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            errors: BTreeMap::new(),
            shapes: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Sessions
    pub sessions_started: u64,
    pub sessions_finished: u64,
    pub session_errors: u64,

    // Rows and elements
    pub rows_read: u64,
    pub roots_released: u64,
    pub elements_built: u64,

    // Plan cache
    pub plan_cache_hits: u64,
    pub plan_cache_misses: u64,
    pub plans_compiled: u64,
    pub plan_nodes_compiled: u64,
}

///
/// ShapeCounters
/// Per-plan counters keyed by fingerprint hex.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ShapeCounters {
    pub sessions: u64,
    pub rows_read: u64,
    pub roots_released: u64,
    pub errors: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub fn reset() {
    with_state_mut(|m| *m = EventState::default());
}

pub fn reset_all() {
    reset();
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Per-shape counters and averages.
    pub shape_counters: Vec<ShapeSummary>,
}

///
/// ShapeSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ShapeSummary {
    pub fingerprint: String,
    pub sessions: u64,
    pub rows_read: u64,
    pub roots_released: u64,
    pub errors: u64,
    pub avg_rows_per_session: f64,
    pub avg_roots_per_session: f64,
}

/// Build a report whose window started at or after `window_start_ms`.
///
/// When the current window started earlier the counters are omitted.
#[must_use]
pub fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let report = report();

    match (window_start_ms, &report.counters) {
        (Some(start), Some(counters)) if counters.since_ms < start => EventReport::default(),
        _ => report,
    }
}

/// Build a metrics report from the in-memory counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut shape_counters: Vec<ShapeSummary> = snap
        .shapes
        .iter()
        .map(|(fingerprint, counters)| {
            let per_session = |total: u64| {
                if counters.sessions > 0 {
                    total as f64 / counters.sessions as f64
                } else {
                    0.0
                }
            };

            ShapeSummary {
                fingerprint: fingerprint.clone(),
                sessions: counters.sessions,
                rows_read: counters.rows_read,
                roots_released: counters.roots_released,
                errors: counters.errors,
                avg_rows_per_session: per_session(counters.rows_read),
                avg_roots_per_session: per_session(counters.roots_released),
            }
        })
        .collect();

    shape_counters.sort_by(|a, b| {
        match b
            .avg_rows_per_session
            .partial_cmp(&a.avg_rows_per_session)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => match b.rows_read.cmp(&a.rows_read) {
                Ordering::Equal => a.fingerprint.cmp(&b.fingerprint),
                other => other,
            },
            other => other,
        }
    });

    EventReport {
        counters: Some(snap),
        shape_counters,
    }
}

///
/// TESTS
///
