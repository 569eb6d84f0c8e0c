use super::materializer;
use crate::{
    cursor::VecRowCursor,
    element::Element,
    error::ErrorClass,
    materializer::Materializer,
    plan::{MaterializeMode, PlanCache},
    record::{ColumnKind, RecordReader},
    shape::{CollectionShape, ScalarShape, ShapeNode, StructureShape},
    test_support::{customer_orders_shape, flat_shape, int, row, text},
    traits::{StaticCatalog, TypeMapping},
    value::{ScalarType, Value},
};
use std::sync::Arc;

fn records() -> Materializer {
    materializer().mode(MaterializeMode::Records)
}

fn document_shape() -> ShapeNode {
    let document = StructureShape::new("Document")
        .property("id", ScalarShape::new(0, ScalarType::Int32))
        .property("body", ScalarShape::new(1, ScalarType::Blob).nullable())
        .property("title", ScalarShape::new(2, ScalarType::Text).nullable());

    CollectionShape::new(document).into()
}

fn document_rows() -> Vec<Vec<Value>> {
    vec![
        row([int(1), Value::Blob(vec![1, 2, 3, 4, 5]), text("hello")]),
        row([int(2), Value::Null, Value::Null]),
    ]
}

#[test]
fn records_mode_builds_records_for_every_structure() {
    let customers = records()
        .collect(
            &customer_orders_shape(),
            VecRowCursor::from_rows(vec![
                row([int(1), text("Ann"), int(10), text("A")]),
                row([int(1), text("Ann"), int(11), text("B")]),
                row([int(2), text("Bob"), int(12), Value::Null]),
            ]),
        )
        .unwrap();

    assert_eq!(customers.len(), 2);
    let ann = customers[0].as_record().unwrap();
    assert_eq!(ann.type_name(), "Customer");
    assert_eq!(ann.field_count(), 3);
    assert_eq!(ann.get_name(1).unwrap(), "name");
    assert_eq!(ann.column_kind(0), Some(ColumnKind::Scalar(ScalarType::Int32)));
    assert_eq!(ann.column_kind(2), Some(ColumnKind::Collection));
    assert_eq!(ann.get_value(1).unwrap(), &Element::Scalar(text("Ann")));
}

#[test]
fn nested_records_expose_promoted_values() {
    let customers = records()
        .collect(
            &customer_orders_shape(),
            VecRowCursor::from_rows(vec![
                row([int(1), text("Ann"), int(10), text("A")]),
                row([int(1), text("Ann"), int(11), Value::Null]),
            ]),
        )
        .unwrap();

    let ann = customers[0].as_record().unwrap();
    let orders = ann.get_value(2).unwrap().as_collection().unwrap();
    assert_eq!(orders.len(), 2);

    let first = orders.items()[0].as_record().unwrap();
    assert_eq!(first.get_value(0).unwrap(), &Element::Scalar(int(10)));
    assert_eq!(first.get_value(1).unwrap(), &Element::Scalar(text("A")));

    let second = orders.items()[1].as_record().unwrap();
    assert!(second.is_db_null(1).unwrap());
    assert!(!second.is_null_record());
}

#[test]
fn null_sentinel_builds_a_null_record() {
    let point = StructureShape::new("Point")
        .null_sentinel(0)
        .property("x", ScalarShape::new(0, ScalarType::Int32).nullable());
    let line = StructureShape::new("Line")
        .property("id", ScalarShape::new(1, ScalarType::Int32))
        .property("points", CollectionShape::new(point).key(ScalarShape::new(2, ScalarType::Int32)));
    let shape: ShapeNode = CollectionShape::new(line)
        .key(ScalarShape::new(1, ScalarType::Int32))
        .into();

    let lines = records()
        .collect(
            &shape,
            VecRowCursor::from_rows(vec![
                row([int(5), int(1), int(100)]),
                row([Value::Null, int(1), int(101)]),
                row([int(6), int(1), int(102)]),
            ]),
        )
        .unwrap();

    let line = lines[0].as_record().unwrap();
    let points = line.get_value(1).unwrap().as_collection().unwrap();
    let xs: Vec<_> = points
        .iter()
        .map(|p| p.as_record().unwrap().get_value(0).unwrap().clone())
        .collect();
    assert_eq!(xs, vec![Element::Scalar(int(5)), Element::Scalar(int(6))]);

    let flat = records()
        .collect(
            &CollectionShape::new(
                StructureShape::new("Point")
                    .null_sentinel(0)
                    .property("x", ScalarShape::new(0, ScalarType::Int32).nullable()),
            )
            .into(),
            VecRowCursor::from_rows(vec![row([Value::Null])]),
        )
        .unwrap();
    let root = flat[0].as_record().unwrap();
    assert!(root.is_null_record());
    assert!(flat[0].is_null());
}

#[test]
fn reader_walks_records_by_ordinal() {
    let session = records()
        .materialize(&document_shape(), VecRowCursor::from_rows(document_rows()))
        .unwrap();
    let mut reader = RecordReader::new(session);

    assert!(reader.read().unwrap());
    assert_eq!(reader.field_count().unwrap(), 3);
    assert_eq!(reader.get_name(2).unwrap(), "title");
    assert_eq!(reader.get_ordinal("TITLE").unwrap(), 2);
    assert_eq!(reader.get_bytes(1, 0, None).unwrap(), 5);

    let mut bytes = [0u8; 4];
    assert_eq!(reader.get_bytes(1, 2, Some(&mut bytes[..])).unwrap(), 3);
    assert_eq!(&bytes[..3], &[3, 4, 5]);

    let mut chars = ['_'; 2];
    assert_eq!(reader.get_chars(2, 1, Some(&mut chars[..])).unwrap(), 2);
    assert_eq!(chars, ['e', 'l']);
    assert_eq!(reader.get_chars(2, 9, Some(&mut chars[..])).unwrap(), 0);

    assert!(reader.read().unwrap());
    assert!(reader.is_db_null(1).unwrap());
    let err = reader.get_bytes(1, 0, None).unwrap_err();
    assert_eq!(err.class, ErrorClass::NullViolation);

    assert!(!reader.read().unwrap());
    assert!(reader.record().is_none());
}

#[test]
fn reader_rejects_bad_ordinals_and_names() {
    let session = records()
        .materialize(&document_shape(), VecRowCursor::from_rows(document_rows()))
        .unwrap();
    let mut reader = RecordReader::new(session);

    let before = reader.field_count().unwrap_err();
    assert_eq!(before.class, ErrorClass::InvariantViolation);

    reader.read().unwrap();
    assert_eq!(
        reader.get_value(7).unwrap_err().class,
        ErrorClass::InvariantViolation
    );
    assert!(reader.get_ordinal("missing").is_err());
    assert_eq!(
        reader.get_chars(0, 0, None).unwrap_err().class,
        ErrorClass::ValueConversion
    );
}

#[test]
fn reader_requires_record_roots() {
    let session = materializer()
        .materialize(
            &flat_shape(),
            VecRowCursor::from_rows(vec![row([int(1), text("a")])]),
        )
        .unwrap();
    let mut reader = RecordReader::new(session);

    let err = reader.read().unwrap_err();
    assert_eq!(err.class, ErrorClass::ValueConversion);
}

#[test]
fn closing_the_reader_closes_the_session() {
    let session = records()
        .materialize(&document_shape(), VecRowCursor::from_rows(document_rows()))
        .unwrap();
    let mut reader = RecordReader::new(session);

    reader.read().unwrap();
    reader.close();
    assert!(reader.record().is_none());
    assert!(reader.into_session().is_closed());
}

#[test]
fn catalogs_sharing_a_cache_keep_their_own_mapping() {
    let cache = Arc::new(PlanCache::new());
    let under = |mapping: TypeMapping| {
        Materializer::new()
            .cache(Arc::clone(&cache))
            .catalog(Arc::new(StaticCatalog::new().with_type("Point", mapping)))
            .collect(
                &flat_shape(),
                VecRowCursor::from_rows(vec![row([int(1), text("a")])]),
            )
            .unwrap()
    };

    let objects = under(TypeMapping::object());
    let records = under(TypeMapping::record());

    assert!(objects[0].as_object().is_some());
    assert_eq!(records[0].as_record().map(|r| r.type_name()), Some("Point"));
    assert_eq!(cache.len(), 2);
}
