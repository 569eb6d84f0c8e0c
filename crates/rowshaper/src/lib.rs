//! ## Crate layout
//! - `core`: shapes, the plan compiler and cache, sessions over row
//!   cursors, records, and observability.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module covers describing shapes and consuming the
//! materialized elements; `metrics` exposes the in-process counters.

pub use rowshaper_core as core;

pub mod error;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        core::{
            config::MaterializerConfig,
            cursor::CursorError,
            prelude::*,
            record::RecordReader,
            session::Session,
        },
    };
    pub use serde::Serialize;
}

///
/// Metrics
/// Process-local counters fed by the default metrics sink.
///

pub mod metrics {
    pub use crate::core::obs::{
        EventOps, EventReport, EventState, MetricsEvent, MetricsSink, ShapeCounters, ShapeSummary,
        metrics_report, metrics_reset_all,
    };
}
