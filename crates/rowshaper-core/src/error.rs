use crate::value::ScalarType;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every failure surfaced by compilation or materialization is one of these.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `class`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a compile-time configuration error (malformed shape).
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Compile, message)
    }

    /// Construct a shape-origin invariant violation.
    ///
    /// Raised for node kinds that upstream must have eliminated.
    pub(crate) fn shape_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Shape, message)
    }

    /// Construct a session-origin invariant violation.
    pub(crate) fn session_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Session, message)
    }

    /// Construct a record-origin invariant violation.
    pub(crate) fn record_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Record, message)
    }

    /// Construct a record-origin conversion error (random-access reads).
    pub(crate) fn record_conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ValueConversion, ErrorOrigin::Record, message)
    }

    /// Construct a collaborator failure (construction or identity resolution).
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Collaborator, ErrorOrigin::Session, message)
    }

    /// Map a cursor failure into a row-read error.
    ///
    /// Closed cursors are reported distinctly from other read failures.
    pub(crate) fn row_read(err: &crate::cursor::CursorError) -> Self {
        let closed = err.is_closed();
        let message = if closed {
            "invalid attempt to read when the row cursor is closed".to_string()
        } else {
            format!("row read failed: {err}")
        };

        Self {
            class: ErrorClass::RowRead,
            origin: ErrorOrigin::Cursor,
            message,
            detail: Some(ErrorDetail::RowRead(RowReadError { closed })),
        }
    }

    /// Fast-path conversion failure; deliberately carries no column context.
    pub(crate) fn invalid_cast(expected: ScalarType) -> Self {
        Self::new(
            ErrorClass::ValueConversion,
            ErrorOrigin::Session,
            format!("specified cast is not valid (expected {expected})"),
        )
    }

    /// Fast-path null failure; deliberately carries no column context.
    pub(crate) fn null_cast(expected: ScalarType) -> Self {
        Self::new(
            ErrorClass::NullViolation,
            ErrorOrigin::Session,
            format!("null value cannot be cast to non-nullable {expected}"),
        )
    }

    /// Diagnostic conversion failure naming the column and owning property.
    pub(crate) fn conversion(detail: ConversionError) -> Self {
        Self {
            class: ErrorClass::ValueConversion,
            origin: ErrorOrigin::Session,
            message: detail.to_string(),
            detail: Some(ErrorDetail::Conversion(detail)),
        }
    }

    /// Diagnostic null failure naming the column and owning property.
    pub(crate) fn null_violation(detail: NullViolation) -> Self {
        Self {
            class: ErrorClass::NullViolation,
            origin: ErrorOrigin::Session,
            message: detail.to_string(),
            detail: Some(ErrorDetail::NullViolation(detail)),
        }
    }

    #[must_use]
    pub const fn is_row_read_closed(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::RowRead(RowReadError { closed: true }))
        )
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    /// Upgrade this error's message with a diagnostic re-run of the failing accessor.
    ///
    /// Class and origin always stay those of the original failure; message and
    /// detail are replaced only when the diagnostic failure has the same class.
    #[must_use]
    pub(crate) fn upgraded_with(mut self, diagnostic: Option<Self>) -> Self {
        if let Some(diagnostic) = diagnostic
            && diagnostic.class == self.class
            && diagnostic.detail.is_some()
        {
            self.message = diagnostic.message;
            self.detail = diagnostic.detail;
        }

        self
    }
}

///
/// ErrorDetail
///
/// Structured, class-specific error detail carried by [`InternalError`].
///

#[derive(Clone, Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Conversion(ConversionError),

    #[error("{0}")]
    NullViolation(NullViolation),

    #[error("{0}")]
    RowRead(RowReadError),
}

///
/// RowReadError
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
#[error("row read failed (closed: {closed})")]
pub struct RowReadError {
    pub closed: bool,
}

///
/// ConversionError
///
/// A column held a value of the wrong runtime type for its target.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error(
    "the {target} could not be set to a '{found}' value; a non-null value of type '{expected}' is required (column {ordinal})"
)]
pub struct ConversionError {
    pub expected: ScalarType,
    pub found: &'static str,
    pub ordinal: usize,
    pub target: ColumnTarget,
}

///
/// NullViolation
///
/// A non-nullable target received a null column.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error(
    "the {target} could not be set to a null value; a non-null value of type '{expected}' is required (column {ordinal})"
)]
pub struct NullViolation {
    pub expected: ScalarType,
    pub ordinal: usize,
    pub target: ColumnTarget,
}

///
/// ColumnTarget
///
/// What a diagnosed column was being read into.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ColumnTarget {
    Column {
        name: Option<String>,
    },
    Key {
        name: Option<String>,
        declaring_type: String,
    },
    Property {
        property: String,
        declaring_type: String,
    },
}

impl fmt::Display for ColumnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { name: None } => write!(f, "column value"),
            Self::Column { name: Some(name) } => write!(f, "'{name}' column value"),
            Self::Key {
                name: None,
                declaring_type,
            } => write!(f, "key column of '{declaring_type}'"),
            Self::Key {
                name: Some(name),
                declaring_type,
            } => write!(f, "'{name}' key column of '{declaring_type}'"),
            Self::Property {
                property,
                declaring_type,
            } => write!(f, "'{property}' property on '{declaring_type}'"),
        }
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Collaborator,
    Configuration,
    InvariantViolation,
    NullViolation,
    RowRead,
    ValueConversion,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Collaborator => "collaborator",
            Self::Configuration => "configuration",
            Self::InvariantViolation => "invariant_violation",
            Self::NullViolation => "null_violation",
            Self::RowRead => "row_read",
            Self::ValueConversion => "value_conversion",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Compile,
    Config,
    Cursor,
    Record,
    Session,
    Shape,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Compile => "compile",
            Self::Config => "config",
            Self::Cursor => "cursor",
            Self::Record => "record",
            Self::Session => "session",
            Self::Shape => "shape",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorError;

    #[test]
    fn closed_cursor_reads_are_distinguished_from_io_failures() {
        let closed = InternalError::row_read(&CursorError::Closed);
        let io = InternalError::row_read(&CursorError::Read("socket reset".to_string()));

        assert_eq!(closed.class, ErrorClass::RowRead);
        assert!(closed.is_row_read_closed());
        assert!(!io.is_row_read_closed());
        assert!(io.message.contains("socket reset"));
    }

    #[test]
    fn upgrade_keeps_original_class_and_origin() {
        let original = InternalError::invalid_cast(ScalarType::Int32);
        let diagnostic = InternalError::conversion(ConversionError {
            expected: ScalarType::Int32,
            found: "Text",
            ordinal: 3,
            target: ColumnTarget::Property {
                property: "Age".to_string(),
                declaring_type: "Customer".to_string(),
            },
        });

        let upgraded = original.upgraded_with(Some(diagnostic));

        assert_eq!(upgraded.class, ErrorClass::ValueConversion);
        assert_eq!(upgraded.origin, ErrorOrigin::Session);
        assert!(upgraded.message.contains("'Age' property on 'Customer'"));
        assert!(upgraded.message.contains("Int32"));
    }

    #[test]
    fn upgrade_ignores_diagnostics_of_a_different_class() {
        let original = InternalError::invalid_cast(ScalarType::Int32);
        let message = original.message.clone();
        let unrelated = InternalError::collaborator("factory refused type");

        let upgraded = original.upgraded_with(Some(unrelated));

        assert_eq!(upgraded.message, message);
        assert!(upgraded.detail.is_none());
    }

    #[test]
    fn upgrade_without_diagnostic_failure_returns_original() {
        let original = InternalError::null_cast(ScalarType::Bool);
        let message = original.message.clone();

        let upgraded = original.upgraded_with(None);

        assert_eq!(upgraded.class, ErrorClass::NullViolation);
        assert_eq!(upgraded.message, message);
    }
}
