use derive_more::Display;
use rowshaper_core::error::{
    ErrorClass as CoreErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Whether the failure came from reading the row cursor.
    #[must_use]
    pub const fn is_row_read(&self) -> bool {
        matches!(self.kind, ErrorKind::RowRead)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Collaborator,
    Configuration,
    Conversion,
    Internal,
    NullViolation,
    RowRead,
}

impl From<CoreErrorClass> for ErrorKind {
    fn from(class: CoreErrorClass) -> Self {
        match class {
            CoreErrorClass::Collaborator => Self::Collaborator,
            CoreErrorClass::Configuration => Self::Configuration,
            CoreErrorClass::InvariantViolation => Self::Internal,
            CoreErrorClass::NullViolation => Self::NullViolation,
            CoreErrorClass::RowRead => Self::RowRead,
            CoreErrorClass::ValueConversion => Self::Conversion,
        }
    }
}

///
/// ErrorOrigin
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Compile,
    Config,
    Cursor,
    Record,
    Session,
    Shape,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Compile => Self::Compile,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Cursor => Self::Cursor,
            CoreErrorOrigin::Record => Self::Record,
            CoreErrorOrigin::Session => Self::Session,
            CoreErrorOrigin::Shape => Self::Shape,
        }
    }
}
