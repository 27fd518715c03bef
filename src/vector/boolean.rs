use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::util::bit_util;
use tracing::trace;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::Result;
use crate::vector::builder::{invalid, number_of, value_scalar, Number, VectorBuilder};
use crate::vector::column_vector::ColumnVector;

/// Bit-packed BOOLEAN vectors. Besides booleans only the integers 0 and 1 are accepted.
#[derive(Debug, Default)]
pub struct BooleanBuilder;

fn coerce(scalar: &Scalar) -> Option<bool> {
    match scalar {
        Scalar::Boolean(v) => *v,
        other => match number_of(other)? {
            Number::Int(0) => Some(false),
            Number::Int(1) => Some(true),
            _ => None,
        },
    }
}

impl VectorBuilder for BooleanBuilder {
    fn element_type(&self) -> ElementType {
        ElementType::Boolean
    }

    fn write_at(&self, vector: &mut ColumnVector, index: usize, value: &ElementValue) -> Result<()> {
        let bit = match value_scalar(value)? {
            None => false,
            Some(scalar) => coerce(&scalar).ok_or_else(|| invalid(ElementType::Boolean, &scalar))?,
        };
        vector.check_writable("write")?;
        vector.reserve_index(index)?;
        let bits = vector.values_buffer_mut()?.as_slice_mut();
        if bit {
            bit_util::set_bit(bits, index);
        } else {
            bit_util::unset_bit(bits, index);
        }
        vector.mark_written(index);
        trace!(index, bit, "wrote boolean element");
        Ok(())
    }

    fn read_at(&self, vector: &ColumnVector, index: usize) -> Result<Scalar> {
        vector.check_readable(index)?;
        Ok(Scalar::Boolean(Some(vector.is_bit_set(index)?)))
    }

    fn to_array(&self, vector: &ColumnVector) -> Result<ArrayRef> {
        let bits = vector.values_buffer()?.as_slice();
        let values: Vec<bool> = (0..vector.len())
            .map(|i| bit_util::get_bit(bits, i))
            .collect();
        Ok(Arc::new(BooleanArray::from(values)))
    }
}
