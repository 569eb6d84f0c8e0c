mod identity;
mod lifecycle;
mod records;

use crate::{
    cursor::VecRowCursor,
    element::Element,
    materializer::Materializer,
    plan::PlanCache,
    shape::ShapeNode,
    value::Value,
};
use std::sync::Arc;

/// Materializer with a private cache so tests never share plans.
fn materializer() -> Materializer {
    Materializer::new().cache(Arc::new(PlanCache::new()))
}

fn run(shape: &ShapeNode, rows: Vec<Vec<Value>>) -> Vec<Element> {
    materializer()
        .collect(shape, VecRowCursor::from_rows(rows))
        .unwrap()
}
