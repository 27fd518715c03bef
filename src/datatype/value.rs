use std::fmt;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::error::Result;

/// A slot of an array that was computed before the literal is built.
#[derive(Debug, Clone)]
pub struct ForwardedValue {
    array: ArrayRef,
    row: usize,
}

impl ForwardedValue {
    pub fn new(array: ArrayRef, row: usize) -> Self {
        Self { array, row }
    }

    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn is_null(&self) -> bool {
        self.row < self.array.len()
            && (self.array.data_type() == &DataType::Null || self.array.is_null(self.row))
    }

    pub fn element_type(&self) -> Result<ElementType> {
        ElementType::try_from(self.array.data_type())
    }

    pub fn to_scalar(&self) -> Result<Scalar> {
        Scalar::try_from_array(&self.array, self.row)
    }
}

/// The canonical runtime form of one literal element, as consumed by a vector builder.
#[derive(Debug, Clone)]
pub enum ElementValue {
    Null,
    Scalar(Scalar),
    Forwarded(ForwardedValue),
}

impl ElementValue {
    pub fn is_null(&self) -> bool {
        match self {
            ElementValue::Null => true,
            ElementValue::Scalar(scalar) => scalar.is_null(),
            ElementValue::Forwarded(forwarded) => forwarded.is_null(),
        }
    }

    /// Materializes the value, `Scalar::Null` for nulls
    pub fn to_scalar(&self) -> Result<Scalar> {
        match self {
            ElementValue::Null => Ok(Scalar::Null),
            ElementValue::Scalar(scalar) => Ok(scalar.clone()),
            ElementValue::Forwarded(forwarded) => forwarded.to_scalar(),
        }
    }
}

impl From<Scalar> for ElementValue {
    fn from(scalar: Scalar) -> Self {
        ElementValue::Scalar(scalar)
    }
}

impl fmt::Display for ElementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementValue::Null => f.write_str("NULL"),
            ElementValue::Scalar(scalar) => write!(f, "{scalar}"),
            ElementValue::Forwarded(forwarded) => write!(
                f,
                "{:?}[{}]",
                forwarded.array.data_type(),
                forwarded.row
            ),
        }
    }
}
