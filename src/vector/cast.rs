use tracing::debug;

use crate::datatype::element_type::ElementType;
use crate::datatype::value::ElementValue;
use crate::error::{Error, Result};
use crate::vector::builder::builder_for;
use crate::vector::column_vector::{ColumnVector, VectorOptions, VectorState};

/// Whether vectors of `from` can be cast to `to` element by element.
pub fn can_cast(from: ElementType, to: ElementType) -> bool {
    (from.is_numeric() && to.is_numeric())
        || (to == ElementType::Utf8 && from != ElementType::Binary && from != ElementType::Unresolved)
        || (from == to && from.is_decimal())
}

/// Casts every element of a finalized vector into a new finalized vector of `target`.
///
/// A value that does not fit the target, e.g. 300 into TINYINT, fails the whole cast.
pub fn cast_vector(
    vector: &ColumnVector,
    target: ElementType,
    options: &VectorOptions,
) -> Result<ColumnVector> {
    if vector.state() != VectorState::Finalized {
        return Err(Error::InvalidVectorState {
            state: vector.state(),
            operation: "cast",
        });
    }
    if !can_cast(vector.element_type(), target) {
        return Err(Error::UnsupportedElementType(target));
    }

    let builder = builder_for(target);
    let mut output = builder.allocate(vector.len(), options)?;
    for index in 0..vector.len() {
        let value = ElementValue::Scalar(vector.get(index)?);
        if let Err(e) = builder.write_at(&mut output, index, &value) {
            output.release();
            return Err(e);
        }
    }
    builder.finalize(&mut output, vector.len())?;
    debug!(from = %vector.element_type(), to = %target, len = vector.len(), "cast column vector");
    Ok(output)
}
