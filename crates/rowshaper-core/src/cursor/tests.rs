use super::*;

fn rows() -> Vec<Vec<Value>> {
    vec![
        vec![Value::Int32(1), Value::Null],
        vec![Value::Int32(2), Value::Text("b".into())],
    ]
}

#[test]
fn advance_walks_rows_then_reports_exhaustion() {
    let mut cursor = VecRowCursor::from_rows(rows());

    assert_eq!(cursor.field_count(), 2);
    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.value(0).unwrap(), &Value::Int32(1));
    assert!(cursor.is_null(1).unwrap());

    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.value(1).unwrap(), &Value::Text("b".into()));

    assert!(!cursor.advance().unwrap());
    assert!(!cursor.advance().unwrap());
    assert_eq!(cursor.value(0), Err(CursorError::NoCurrentRow));
}

#[test]
fn reads_before_first_advance_have_no_current_row() {
    let cursor = VecRowCursor::from_rows(rows());

    assert_eq!(cursor.value(0), Err(CursorError::NoCurrentRow));
    assert_eq!(cursor.rows_consumed(), 0);
}

#[test]
fn out_of_range_ordinal_is_reported() {
    let mut cursor = VecRowCursor::from_rows(rows());
    cursor.advance().unwrap();

    assert_eq!(
        cursor.value(5),
        Err(CursorError::OrdinalOutOfRange {
            ordinal: 5,
            field_count: 2
        })
    );
}

#[test]
fn closed_cursor_rejects_reads_and_advances() {
    let mut cursor = VecRowCursor::from_rows(rows());
    cursor.advance().unwrap();
    cursor.close();

    assert!(cursor.is_closed());
    assert!(cursor.value(0).unwrap_err().is_closed());
    assert_eq!(cursor.advance(), Err(CursorError::Closed));
}

#[test]
fn armed_failure_fires_on_the_given_row() {
    let mut cursor = VecRowCursor::from_rows(rows()).fail_at(1, "connection reset");

    assert!(cursor.advance().unwrap());
    let err = cursor.advance().unwrap_err();

    assert_eq!(err, CursorError::Read("connection reset".to_string()));
    assert!(!err.is_closed());
}
