use std::io;

use arrow::error::ArrowError;
use thiserror::Error;

use crate::datatype::element_type::ElementType;
use crate::vector::column_vector::VectorState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Two elements of one array literal have no common type.
    #[error("type conflict in array literal: cannot combine {old} with {new}")]
    TypeConflict { old: ElementType, new: ElementType },
    /// A value's runtime shape does not fit the vector it is written into.
    #[error("invalid element value for {expected} vector: {found}")]
    InvalidElementValue { expected: ElementType, found: String },
    #[error("element type {0} is not supported for array literal construction")]
    UnsupportedElementType(ElementType),
    #[error("allocation of {requested} bytes failed, {available} bytes available")]
    AllocationFailed { requested: usize, available: usize },
    #[error("cannot {operation} a vector in state {state:?}")]
    InvalidVectorState {
        state: VectorState,
        operation: &'static str,
    },
    #[error("index {index} out of bounds for vector of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("arrow error: {0}")]
    ArrowError(#[from] ArrowError),
    #[error("io error: {0}")]
    IOError(#[from] io::Error),
    #[error("config error: {0}")]
    ConfigError(String),
}

impl Error {
    pub(crate) fn invalid_value(expected: ElementType, found: impl ToString) -> Self {
        Error::InvalidElementValue {
            expected,
            found: found.to_string(),
        }
    }
}
