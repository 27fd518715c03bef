use arrow::array::ArrayRef;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::{Error, Result};
use crate::vector::builder::VectorBuilder;
use crate::vector::column_vector::{ColumnVector, VectorOptions};

/// Stands in for element types an array literal cannot be built from (BINARY, UNRESOLVED).
/// Every operation fails with `UnsupportedElementType`.
#[derive(Debug)]
pub struct UnsupportedBuilder {
    element_type: ElementType,
}

impl UnsupportedBuilder {
    pub const fn new(element_type: ElementType) -> Self {
        Self { element_type }
    }

    fn unsupported<T>(&self) -> Result<T> {
        Err(Error::UnsupportedElementType(self.element_type))
    }
}

impl VectorBuilder for UnsupportedBuilder {
    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn allocate(&self, _requested: usize, _options: &VectorOptions) -> Result<ColumnVector> {
        self.unsupported()
    }

    fn write_at(&self, _vector: &mut ColumnVector, _index: usize, _value: &ElementValue) -> Result<()> {
        self.unsupported()
    }

    fn read_at(&self, _vector: &ColumnVector, _index: usize) -> Result<Scalar> {
        self.unsupported()
    }

    fn finalize(&self, _vector: &mut ColumnVector, _count: usize) -> Result<()> {
        self.unsupported()
    }

    fn to_array(&self, _vector: &ColumnVector) -> Result<ArrayRef> {
        self.unsupported()
    }
}
