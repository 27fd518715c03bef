use crate::datatype::scalar::Scalar;
use crate::error::Result;
use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;

/// The result of evaluating an expression over one record batch.
/// A literal is kept as a scalar plus a row count until someone needs the array,
/// avoiding the need to repeat a constant for every row in the column.
#[derive(Debug, Clone)]
pub enum ColumnArray {
    Array(ArrayRef),
    Literal(Scalar, usize), // the second member represents how many rows this column has
}

impl ColumnArray {
    pub fn data_type(&self) -> Result<DataType> {
        match self {
            ColumnArray::Array(array_ref) => Ok(array_ref.data_type().clone()),
            ColumnArray::Literal(scalar, _) => scalar.data_type(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnArray::Array(array_ref) => array_ref.len(),
            ColumnArray::Literal(_, size) => *size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_array(self) -> Result<ArrayRef> {
        match self {
            ColumnArray::Array(array_ref) => Ok(array_ref),
            ColumnArray::Literal(scalar, size) => scalar.to_array(size),
        }
    }
}
