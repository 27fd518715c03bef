use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use tracing::trace;

use crate::datatype::element_type::{ElementType, MAX_VARCHAR_LENGTH};
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::{Error, Result};
use crate::vector::builder::{value_scalar, VectorBuilder};
use crate::vector::column_vector::ColumnVector;

/// STRING vectors.
///
/// Each slot holds an (offset, length) pair into a byte heap, so elements can be written
/// at any index and in any order. Every scalar is accepted through its textual form,
/// binary values as lowercase hex.
///
/// Overwriting a slot reuses its bytes when the new text is not longer. A longer text is
/// appended and the old bytes stay unused until the vector is released.
#[derive(Debug, Default)]
pub struct StringBuilder;

fn render(scalar: Scalar) -> String {
    match scalar {
        Scalar::Utf8(Some(v)) => v,
        other => other.to_string(),
    }
}

fn slot(vector: &ColumnVector, index: usize) -> Result<(usize, usize)> {
    let slots = vector.values_buffer()?.typed_data::<u32>();
    Ok((slots[2 * index] as usize, slots[2 * index + 1] as usize))
}

impl VectorBuilder for StringBuilder {
    fn element_type(&self) -> ElementType {
        ElementType::Utf8
    }

    fn write_at(&self, vector: &mut ColumnVector, index: usize, value: &ElementValue) -> Result<()> {
        let text = value_scalar(value)?.map(render).unwrap_or_default();
        if text.len() > MAX_VARCHAR_LENGTH {
            return Err(Error::invalid_value(
                ElementType::Utf8,
                format!("string of {} bytes", text.len()),
            ));
        }
        vector.check_writable("write")?;

        let (old_offset, old_len) = if index < vector.capacity() {
            slot(vector, index)?
        } else {
            (0, 0)
        };
        let in_place = text.len() <= old_len;
        if !in_place {
            let heap_len = vector.heap_bytes()?.len();
            // slot offsets are u32
            if u32::try_from(heap_len + text.len()).is_err() {
                return Err(Error::AllocationFailed {
                    requested: text.len(),
                    available: (u32::MAX as usize).saturating_sub(heap_len),
                });
            }
            // heap first: if it cannot grow the slot table keeps its capacity
            vector.reserve_heap(text.len())?;
        }
        vector.reserve_index(index)?;

        let offset = if in_place {
            vector.overwrite_heap(old_offset, text.as_bytes())?;
            old_offset
        } else {
            vector.push_heap(text.as_bytes())?
        };
        let slots = vector.values_buffer_mut()?.typed_data_mut::<u32>();
        slots[2 * index] = offset as u32;
        slots[2 * index + 1] = text.len() as u32;
        vector.mark_written(index);
        trace!(index, offset, len = text.len(), "wrote string element");
        Ok(())
    }

    fn read_at(&self, vector: &ColumnVector, index: usize) -> Result<Scalar> {
        vector.check_readable(index)?;
        let (offset, len) = slot(vector, index)?;
        let bytes = &vector.heap_bytes()?[offset..offset + len];
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::invalid_value(ElementType::Utf8, e))?;
        Ok(Scalar::Utf8(Some(text.to_string())))
    }

    fn to_array(&self, vector: &ColumnVector) -> Result<ArrayRef> {
        let mut values = Vec::with_capacity(vector.len());
        for index in 0..vector.len() {
            if let Scalar::Utf8(Some(text)) = self.read_at(vector, index)? {
                values.push(text);
            }
        }
        Ok(Arc::new(StringArray::from(values)))
    }
}
