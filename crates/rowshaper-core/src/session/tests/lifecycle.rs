use super::materializer;
use crate::{
    cursor::{RowCursor, VecRowCursor},
    error::{ErrorClass, ErrorDetail, ErrorOrigin},
    obs::sink::MetricsEvent,
    session::{MaterializeTraceEvent, TracePhase},
    test_support::{
        ProbeCursor, RecordingMetricsSink, RecordingTraceSink, customer_orders_shape, flat_shape,
        int, int_property, row, text,
    },
    value::Value,
};
use std::sync::{Arc, atomic::Ordering};

fn customer_rows() -> Vec<Vec<Value>> {
    vec![
        row([int(1), text("Ann"), int(10), text("A")]),
        row([int(1), text("Ann"), int(11), text("B")]),
        row([int(2), text("Bob"), int(12), text("C")]),
        row([int(3), text("Cid"), int(13), text("D")]),
    ]
}

#[test]
fn dropping_mid_enumeration_closes_the_cursor_once() {
    let (cursor, closes) = ProbeCursor::new(customer_rows());
    let mut session = materializer()
        .materialize(&customer_orders_shape(), cursor)
        .unwrap();

    assert!(session.next().unwrap().is_ok());
    assert_eq!(closes.load(Ordering::SeqCst), 0);

    drop(session);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn close_is_idempotent_and_clears_current() {
    let (cursor, closes) = ProbeCursor::new(customer_rows());
    let mut session = materializer()
        .materialize(&customer_orders_shape(), cursor)
        .unwrap();

    assert!(session.advance().unwrap());
    assert!(session.current().is_some());

    session.close();
    session.close();
    assert!(session.current().is_none());
    assert!(session.is_closed());
    assert!(!session.advance().unwrap());

    drop(session);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn exhaustion_closes_the_cursor_and_fuses() {
    let (cursor, closes) = ProbeCursor::new(customer_rows());
    let mut session = materializer()
        .materialize(&customer_orders_shape(), cursor)
        .unwrap();

    let roots: Vec<_> = session.by_ref().map(Result::unwrap).collect();
    assert_eq!(roots.len(), 3);
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    assert!(session.next().is_none());
    assert!(!session.advance().unwrap());
    assert!(session.current().is_none());

    drop(session);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn current_exposes_the_last_released_root() {
    let mut session = materializer()
        .materialize(
            &customer_orders_shape(),
            VecRowCursor::from_rows(customer_rows()),
        )
        .unwrap();

    assert!(session.current().is_none());
    assert!(session.advance().unwrap());
    assert_eq!(session.current().and_then(|c| int_property(c, "id")), Some(1));
    assert!(session.advance().unwrap());
    assert_eq!(session.current().and_then(|c| int_property(c, "id")), Some(2));
}

#[test]
fn conversion_failure_names_the_property_and_expected_type() {
    let mut session = materializer()
        .materialize(
            &flat_shape(),
            VecRowCursor::from_rows(vec![
                row([int(1), text("ok")]),
                row([text("oops"), text("bad")]),
                row([int(3), text("never")]),
            ]),
        )
        .unwrap();

    assert!(session.next().unwrap().is_ok());

    let err = session.next().unwrap().unwrap_err();
    assert_eq!(err.class, ErrorClass::ValueConversion);
    assert!(err.message.contains("'x' property on 'Point'"), "{err}");
    assert!(err.message.contains("Int32"), "{err}");
    assert!(err.message.contains("Text"), "{err}");
    let Some(ErrorDetail::Conversion(detail)) = &err.detail else {
        panic!("expected conversion detail, got {:?}", err.detail);
    };
    assert_eq!(detail.ordinal, 0);

    assert!(session.next().is_none());
}

#[test]
fn cursor_read_failure_is_a_row_read_error() {
    let err = materializer()
        .collect(
            &customer_orders_shape(),
            VecRowCursor::from_rows(vec![
                row([int(1), text("Ann"), int(10), text("A")]),
                row([int(2), text("Bob"), int(11), text("B")]),
            ])
            .fail_at(1, "connection reset"),
        )
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::RowRead);
    assert_eq!(err.origin, ErrorOrigin::Cursor);
    assert!(!err.is_row_read_closed());
    assert!(err.message.contains("connection reset"));
}

#[test]
fn a_failed_row_never_exposes_its_partial_root() {
    let mut session = materializer()
        .materialize(
            &customer_orders_shape(),
            VecRowCursor::from_rows(vec![
                row([int(1), text("Ann"), int(10), text("A")]),
                row([int(2), text("Bob"), int(11), text("B")]),
                row([int(2), text("Bob"), int(12), int(5)]),
            ]),
        )
        .unwrap();

    let first = session.next().unwrap().unwrap();
    assert_eq!(int_property(&first, "id"), Some(1));

    let err = session.next().unwrap().unwrap_err();
    assert_eq!(err.class, ErrorClass::ValueConversion);
    assert!(err.message.contains("'item' property on 'Order'"), "{err}");

    assert!(session.next().is_none());
}

#[test]
fn two_sessions_from_one_plan_keep_separate_key_state() {
    let materializer = materializer();
    let shape = customer_orders_shape();
    let plan = materializer.compile(&shape).unwrap();
    assert!(Arc::ptr_eq(&plan, &materializer.compile(&shape).unwrap()));

    let mut first = materializer.session(Arc::clone(&plan), VecRowCursor::from_rows(customer_rows()));
    let mut second =
        materializer.session(Arc::clone(&plan), VecRowCursor::from_rows(customer_rows()));

    // interleave the two sessions row group by row group
    let a1 = first.next().unwrap().unwrap();
    let b1 = second.next().unwrap().unwrap();
    let a2 = first.next().unwrap().unwrap();
    let b2 = second.next().unwrap().unwrap();

    assert_eq!(a1, b1);
    assert_eq!(a2, b2);
    assert_eq!(int_property(&a2, "id"), Some(2));

    assert_eq!(first.by_ref().count(), 1);
    assert_eq!(second.by_ref().count(), 1);
}

#[test]
fn stats_count_rows_roots_and_elements_per_depth() {
    let mut session = materializer()
        .materialize(
            &customer_orders_shape(),
            VecRowCursor::from_rows(customer_rows()),
        )
        .unwrap();
    while session.advance().unwrap() {}

    let stats = session.stats();
    assert_eq!(stats.rows_read, 4);
    assert_eq!(stats.roots_released, 3);
    assert_eq!(stats.elements_per_depth, [3, 4]);
    assert_eq!(stats.elements_built(), 7);
}

#[test]
fn metrics_and_trace_sinks_observe_the_session() {
    let metrics = RecordingMetricsSink::leaked();
    let trace = RecordingTraceSink::leaked();
    let materializer = materializer().metrics_sink(metrics).trace_sink(trace);

    let roots = materializer
        .collect(
            &customer_orders_shape(),
            VecRowCursor::from_rows(customer_rows()),
        )
        .unwrap();
    assert_eq!(roots.len(), 3);

    let events = metrics.events();
    assert!(events.contains(&MetricsEvent::PlanCacheMiss));
    assert!(events.iter().any(|e| matches!(e, MetricsEvent::PlanCompiled { nodes: 2 })));
    assert!(events.iter().any(|e| matches!(e, MetricsEvent::SessionStart { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        MetricsEvent::SessionFinish {
            rows_read: 4,
            roots_released: 3,
            elements_built: 7,
            ..
        }
    )));

    let events = trace.events();
    assert!(matches!(
        events.first(),
        Some(MaterializeTraceEvent::Start { simple: false, .. })
    ));
    let rows = events
        .iter()
        .filter(|e| matches!(e, MaterializeTraceEvent::Phase { phase: TracePhase::Row, .. }))
        .count();
    assert_eq!(rows, 4);
    assert!(matches!(
        events.last(),
        Some(MaterializeTraceEvent::Finish { rows: 4, roots: 3, .. })
    ));
}

#[test]
fn failures_are_reported_to_trace_and_metrics() {
    let metrics = RecordingMetricsSink::leaked();
    let trace = RecordingTraceSink::leaked();
    let materializer = materializer().metrics_sink(metrics).trace_sink(trace);

    let result = materializer.collect(
        &flat_shape(),
        VecRowCursor::from_rows(vec![row([Value::Null, text("x")])]),
    );
    let err = result.unwrap_err();
    assert_eq!(err.class, ErrorClass::NullViolation);
    assert!(err.message.contains("'x' property on 'Point'"), "{err}");

    assert!(metrics.events().iter().any(|e| matches!(
        e,
        MetricsEvent::SessionError {
            class: ErrorClass::NullViolation,
            ..
        }
    )));
    assert!(matches!(
        trace.events().last(),
        Some(MaterializeTraceEvent::Error {
            class: ErrorClass::NullViolation,
            ..
        })
    ));
}

#[test]
fn reading_a_closed_cursor_is_reported_as_closed() {
    let mut cursor = VecRowCursor::from_rows(customer_rows());
    cursor.close();

    let err = materializer()
        .collect(&customer_orders_shape(), cursor)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::RowRead);
    assert!(err.is_row_read_closed());
}
