//! Shared fixtures for unit tests.

use crate::{
    cursor::{CursorError, RowCursor, VecRowCursor},
    element::{Collection, Element, EntityKey, MergeOption, Object},
    error::InternalError,
    obs::sink::{MetricsEvent, MetricsSink},
    session::{MaterializeTraceEvent, MaterializeTraceSink},
    shape::{CollectionShape, ScalarShape, ShapeNode, StructureShape},
    traits::IdentityResolver,
    value::{ScalarType, Value},
};
use std::{
    collections::{BTreeMap, btree_map::Entry},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// `Customer { id @0, name @1, orders: [Order { id @2, item @3 }] }`,
/// customers keyed by column 0 and orders by column 2.
pub(crate) fn customer_orders_shape() -> ShapeNode {
    let order = StructureShape::new("Order")
        .property("id", ScalarShape::new(2, ScalarType::Int32))
        .property("item", ScalarShape::new(3, ScalarType::Text).nullable());
    let orders = CollectionShape::new(order).key(ScalarShape::new(2, ScalarType::Int32));

    let customer = StructureShape::new("Customer")
        .property("id", ScalarShape::new(0, ScalarType::Int32))
        .property("name", ScalarShape::new(1, ScalarType::Text).nullable())
        .property("orders", orders);

    CollectionShape::new(customer)
        .key(ScalarShape::new(0, ScalarType::Int32))
        .into()
}

/// One flat structure per row, no keys.
pub(crate) fn flat_shape() -> ShapeNode {
    let point = StructureShape::new("Point")
        .property("x", ScalarShape::new(0, ScalarType::Int32))
        .property("label", ScalarShape::new(1, ScalarType::Text).nullable());

    CollectionShape::new(point).into()
}

pub(crate) fn row(values: impl IntoIterator<Item = Value>) -> Vec<Value> {
    values.into_iter().collect()
}

/// Integer value of a scalar property on an object element.
pub(crate) fn int_property(element: &Element, name: &str) -> Option<i64> {
    element
        .as_object()?
        .get(name)?
        .as_value()?
        .as_i64()
}

/// Items of a collection property on an object element.
pub(crate) fn collection_property<'a>(element: &'a Element, name: &str) -> &'a [Element] {
    element
        .as_object()
        .and_then(|object| object.get(name))
        .and_then(Element::as_collection)
        .map_or(&[][..], Collection::items)
}

///
/// ProbeCursor
///
/// In-memory cursor counting how often it was closed.
///

pub(crate) struct ProbeCursor {
    inner: VecRowCursor,
    closes: Arc<AtomicUsize>,
}

impl ProbeCursor {
    pub(crate) fn new(rows: Vec<Vec<Value>>) -> (Self, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let cursor = Self {
            inner: VecRowCursor::from_rows(rows),
            closes: Arc::clone(&closes),
        };

        (cursor, closes)
    }
}

impl RowCursor for ProbeCursor {
    fn advance(&mut self) -> Result<bool, CursorError> {
        self.inner.advance()
    }

    fn field_count(&self) -> usize {
        self.inner.field_count()
    }

    fn value(&self, ordinal: usize) -> Result<&Value, CursorError> {
        self.inner.value(ordinal)
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

///
/// TrackingResolver
///
/// Identity map keyed by the rendered entity key.
///

#[derive(Default)]
pub(crate) struct TrackingResolver {
    tracked: Mutex<BTreeMap<String, Object>>,
    calls: AtomicUsize,
}

impl TrackingResolver {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn tracked_keys(&self) -> Vec<String> {
        self.tracked
            .lock()
            .map(|tracked| tracked.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl IdentityResolver for TrackingResolver {
    fn resolve(
        &self,
        key: &EntityKey,
        object: Object,
        merge_option: MergeOption,
    ) -> Result<Object, InternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if merge_option == MergeOption::NoTracking {
            return Ok(object);
        }

        let mut tracked = self
            .tracked
            .lock()
            .map_err(|_| InternalError::collaborator("identity map poisoned"))?;
        let resolved = match (tracked.entry(key.to_string()), merge_option) {
            (Entry::Occupied(mut existing), MergeOption::OverwriteChanges) => {
                existing.insert(object.clone());
                object
            }
            (Entry::Occupied(existing), _) => existing.get().clone(),
            (Entry::Vacant(slot), _) => {
                slot.insert(object.clone());
                object
            }
        };

        Ok(resolved)
    }
}

///
/// RecordingMetricsSink
///

#[derive(Default)]
pub(crate) struct RecordingMetricsSink {
    events: Mutex<Vec<MetricsEvent>>,
}

impl RecordingMetricsSink {
    pub(crate) fn leaked() -> &'static Self {
        Box::leak(Box::default())
    }

    pub(crate) fn events(&self) -> Vec<MetricsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn record(&self, event: MetricsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

///
/// RecordingTraceSink
///

#[derive(Default)]
pub(crate) struct RecordingTraceSink {
    events: Mutex<Vec<MaterializeTraceEvent>>,
}

impl RecordingTraceSink {
    pub(crate) fn leaked() -> &'static Self {
        Box::leak(Box::default())
    }

    pub(crate) fn events(&self) -> Vec<MaterializeTraceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl MaterializeTraceSink for RecordingTraceSink {
    fn on_event(&self, event: MaterializeTraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

pub(crate) const fn int(value: i32) -> Value {
    Value::Int32(value)
}

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
