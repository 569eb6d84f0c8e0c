//! Session tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! materialization semantics.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::ShapeFingerprint,
};

///
/// MaterializeTraceSink
///

pub trait MaterializeTraceSink: Send + Sync {
    fn on_event(&self, event: MaterializeTraceEvent);
}

///
/// TracePhase
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TracePhase {
    /// A row was shaped.
    Row,
    /// A root element was complete and handed out.
    Release,
    /// The cursor ran dry and open collections were closed.
    Flush,
}

///
/// MaterializeTraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaterializeTraceEvent {
    Start {
        fingerprint: ShapeFingerprint,
        simple: bool,
    },
    Phase {
        fingerprint: ShapeFingerprint,
        phase: TracePhase,
        rows: u64,
    },
    Finish {
        fingerprint: ShapeFingerprint,
        rows: u64,
        roots: u64,
    },
    Error {
        fingerprint: ShapeFingerprint,
        class: ErrorClass,
        origin: ErrorOrigin,
    },
}

///
/// TraceScope
///

pub(crate) struct TraceScope {
    sink: &'static dyn MaterializeTraceSink,
    fingerprint: ShapeFingerprint,
}

impl TraceScope {
    pub(crate) fn start(
        sink: &'static dyn MaterializeTraceSink,
        fingerprint: ShapeFingerprint,
        simple: bool,
    ) -> Self {
        sink.on_event(MaterializeTraceEvent::Start {
            fingerprint,
            simple,
        });

        Self { sink, fingerprint }
    }

    pub(crate) fn phase(&self, phase: TracePhase, rows: u64) {
        self.sink.on_event(MaterializeTraceEvent::Phase {
            fingerprint: self.fingerprint,
            phase,
            rows,
        });
    }

    pub(crate) fn finish(self, rows: u64, roots: u64) {
        self.sink.on_event(MaterializeTraceEvent::Finish {
            fingerprint: self.fingerprint,
            rows,
            roots,
        });
    }

    pub(crate) fn error(self, err: &InternalError) {
        self.sink.on_event(MaterializeTraceEvent::Error {
            fingerprint: self.fingerprint,
            class: err.class,
            origin: err.origin,
        });
    }
}
