//! Value-layer records: the untyped fallback representation used when a
//! structure is not mapped to a concrete type.

mod factory;
mod reader;
mod state;


// re-exports
pub(crate) use factory::RecordColumn;
pub use factory::{ColumnKind, RecordStateFactory};
pub use reader::RecordReader;
pub use state::RecordState;
