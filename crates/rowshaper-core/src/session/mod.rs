//! Materialization sessions.
//!
//! A session drives one cursor through one plan and yields root elements.
//! It is single-threaded and single-pass; all mutable state (coordinators,
//! state slots, the release queue) is owned here and never shared with the
//! plan.

mod coordinator;
mod shaper;
mod trace;

#[cfg(test)]
mod tests;

use crate::{
    cursor::RowCursor,
    element::Element,
    error::InternalError,
    obs::sink::{self, MetricsEvent, MetricsSink, with_metrics_sink},
    plan::Plan,
};
use coordinator::CoordinatorTree;
use serde::Serialize;
use std::{fmt, sync::Arc};
use trace::TraceScope;

// re-exports
pub use coordinator::CoordinatorId;
pub use shaper::{Collaborators, RowContext, StateSlot};
pub use trace::{MaterializeTraceEvent, MaterializeTraceSink, TracePhase};

///
/// SessionOptions
///
/// Per-session policy handed down by the `Materializer`.
///

#[derive(Clone, Default)]
pub struct SessionOptions {
    pub collaborators: Collaborators,
    pub debug: bool,
    pub metrics: Option<&'static dyn MetricsSink>,
    pub trace: Option<&'static dyn MaterializeTraceSink>,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("debug", &self.debug)
            .field("metrics", &self.metrics.is_some())
            .field("trace", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}

///
/// SessionStats
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SessionStats {
    pub rows_read: u64,
    pub roots_released: u64,
    pub elements_per_depth: Vec<usize>,
}

impl SessionStats {
    #[must_use]
    pub fn elements_built(&self) -> u64 {
        self.elements_per_depth.iter().map(|n| sink::count(*n)).sum()
    }
}

///
/// Session
///
/// Forward-only enumeration of root elements over a row cursor.
///
/// Root elements are released one row late: a root is complete only once a
/// row with a different root key (or the end of the cursor) is seen.
///

pub struct Session<C: RowCursor> {
    plan: Arc<Plan>,
    cursor: C,
    tree: CoordinatorTree,
    collaborators: Collaborators,
    current: Option<Element>,
    pending_error: Option<InternalError>,
    stats: SessionStats,
    trace: Option<TraceScope>,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
    exhausted: bool,
    done: bool,
    closed: bool,
    finished: bool,
}

impl<C: RowCursor> Session<C> {
    #[must_use]
    pub fn new(plan: Arc<Plan>, cursor: C, options: SessionOptions) -> Self {
        let SessionOptions {
            collaborators,
            debug,
            metrics,
            trace,
        } = options;
        let fingerprint = plan.fingerprint();

        let session = Self {
            tree: CoordinatorTree::new(Arc::clone(&plan)),
            trace: trace.map(|sink| TraceScope::start(sink, fingerprint, plan.is_simple())),
            plan,
            cursor,
            collaborators,
            current: None,
            pending_error: None,
            stats: SessionStats::default(),
            debug,
            metrics,
            exhausted: false,
            done: false,
            closed: false,
            finished: false,
        };

        session.with_metrics(|| sink::record(MetricsEvent::SessionStart { fingerprint }));
        session.debug_log(format!(
            "session open: plan {} ({} collections, simple={})",
            session.plan.fingerprint(),
            session.plan.node_count(),
            session.plan.is_simple()
        ));

        session
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        scoped_metrics(self.metrics, f)
    }

    #[must_use]
    pub const fn plan(&self) -> &Arc<Plan> {
        &self.plan
    }

    /// Last released root element; `None` before the first advance, after
    /// exhaustion and after close.
    #[must_use]
    pub const fn current(&self) -> Option<&Element> {
        self.current.as_ref()
    }

    /// Take the last released root element out of the session.
    pub const fn take_current(&mut self) -> Option<Element> {
        self.current.take()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        stats.elements_per_depth = self.tree.elements_per_depth().to_vec();

        stats
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Move to the next root element.
    ///
    /// Returns `Ok(false)` once the cursor is exhausted. After the first
    /// error or exhaustion every later call returns `Ok(false)`.
    pub fn advance(&mut self) -> Result<bool, InternalError> {
        let sink = self.metrics;

        scoped_metrics(sink, || self.advance_inner())
    }

    fn advance_inner(&mut self) -> Result<bool, InternalError> {
        loop {
            if let Some(element) = self.tree.pop_released() {
                self.stats.roots_released += 1;
                if let Some(trace) = &self.trace {
                    trace.phase(TracePhase::Release, self.stats.rows_read);
                }
                self.current = Some(element);

                return Ok(true);
            }

            self.current = None;

            if let Some(err) = self.pending_error.take() {
                self.fail(&err);

                return Err(err);
            }

            if self.done {
                return Ok(false);
            }

            if self.exhausted {
                self.finish();
                continue;
            }

            if let Err(err) = self.step() {
                self.pending_error = Some(err);
                self.done = true;
            }
        }
    }

    /// Read and shape one row, or flush once the cursor runs dry.
    fn step(&mut self) -> Result<(), InternalError> {
        let has_row = self
            .cursor
            .advance()
            .map_err(|err| InternalError::row_read(&err))?;

        if !has_row {
            self.tree.flush();
            self.exhausted = true;
            if let Some(trace) = &self.trace {
                trace.phase(TracePhase::Flush, self.stats.rows_read);
            }

            return Ok(());
        }

        self.stats.rows_read += 1;
        self.tree.process_row(&self.cursor, &self.collaborators)?;
        if let Some(trace) = &self.trace {
            trace.phase(TracePhase::Row, self.stats.rows_read);
        }

        Ok(())
    }

    fn finish(&mut self) {
        self.done = true;
        self.debug_log(format!(
            "session exhausted: {} rows, {} roots",
            self.stats.rows_read, self.stats.roots_released
        ));
        if let Some(trace) = self.trace.take() {
            trace.finish(self.stats.rows_read, self.stats.roots_released);
        }
        self.record_finish();
        self.close_cursor();
    }

    fn fail(&mut self, err: &InternalError) {
        self.debug_log(format!("session failed: {}", err.display_with_class()));
        self.tree.discard();
        if let Some(trace) = self.trace.take() {
            trace.error(err);
        }
        sink::record(MetricsEvent::SessionError {
            fingerprint: self.plan.fingerprint(),
            class: err.class,
        });
        self.record_finish();
    }

    fn record_finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let stats = self.stats();
        sink::record(MetricsEvent::SessionFinish {
            fingerprint: self.plan.fingerprint(),
            rows_read: stats.rows_read,
            roots_released: stats.roots_released,
            elements_built: stats.elements_built(),
        });
    }

    fn close_cursor(&mut self) {
        if !self.closed {
            self.closed = true;
            self.cursor.close();
        }
    }

    /// Stop the session and release the cursor. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let sink = self.metrics;

        scoped_metrics(sink, || {
            self.debug_log("session closed");
            self.current = None;
            self.pending_error = None;
            self.done = true;
            self.tree.discard();
            while self.tree.pop_released().is_some() {}
            if let Some(trace) = self.trace.take() {
                trace.finish(self.stats.rows_read, self.stats.roots_released);
            }
            self.record_finish();
            self.close_cursor();
        });
    }
}

impl<C: RowCursor> Iterator for Session<C> {
    type Item = Result<Element, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => self.current.take().map(Ok),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<C: RowCursor> std::iter::FusedIterator for Session<C> {}

impl<C: RowCursor> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: RowCursor> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("plan", &self.plan.fingerprint())
            .field("stats", &self.stats)
            .field("done", &self.done)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn scoped_metrics<T>(sink: Option<&'static dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    match sink {
        Some(sink) => with_metrics_sink(sink, f),
        None => f(),
    }
}
