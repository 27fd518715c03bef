use std::marker::PhantomData;
use std::sync::Arc;

use arrow::array::{ArrayRef, Decimal128Array};
use arrow::datatypes::ArrowNativeType;
use tracing::trace;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::Result;
use crate::vector::builder::{invalid, value_scalar, VectorBuilder};
use crate::vector::column_vector::ColumnVector;

/// Storage integer of one decimal family.
pub trait DecimalNative: ArrowNativeType + TryFrom<i128> + Into<i128> {}

impl DecimalNative for i32 {}
impl DecimalNative for i64 {}
impl DecimalNative for i128 {}

/// Builder for the four fixed-precision decimal families.
///
/// A vector adopts the scale of the first non-null decimal written into it. Values with a
/// smaller scale are rescaled, a larger scale or too many digits is rejected.
pub struct DecimalBuilder<T> {
    element_type: ElementType,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DecimalBuilder<T> {
    pub const fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            _marker: PhantomData,
        }
    }
}

impl<T: DecimalNative> DecimalBuilder<T> {
    fn max_precision(&self) -> u8 {
        self.element_type.max_precision().unwrap_or(38)
    }

    /// Unscaled value at the vector's scale, plus that scale.
    fn coerce(&self, scalar: &Scalar, vector_scale: Option<i8>) -> Option<(T, i8)> {
        let Scalar::Decimal128(Some(unscaled), _, scale) = scalar else {
            return None;
        };
        let target = vector_scale.unwrap_or(*scale);
        if *scale > target {
            return None;
        }
        let factor = 10_i128.checked_pow(u32::try_from(target - *scale).ok()?)?;
        let rescaled = unscaled.checked_mul(factor)?;
        let bound = 10_i128.checked_pow(u32::from(self.max_precision()))?;
        if rescaled.unsigned_abs() >= bound.unsigned_abs() {
            return None;
        }
        Some((T::try_from(rescaled).ok()?, target))
    }
}

impl<T: DecimalNative> VectorBuilder for DecimalBuilder<T> {
    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn write_at(&self, vector: &mut ColumnVector, index: usize, value: &ElementValue) -> Result<()> {
        let (native, scale) = match value_scalar(value)? {
            None => (T::default(), None),
            Some(scalar) => {
                let (native, scale) = self
                    .coerce(&scalar, vector.scale())
                    .ok_or_else(|| invalid(self.element_type, &scalar))?;
                (native, Some(scale))
            }
        };
        vector.check_writable("write")?;
        vector.reserve_index(index)?;
        vector.values_buffer_mut()?.typed_data_mut::<T>()[index] = native;
        if let (None, Some(scale)) = (vector.scale(), scale) {
            vector.set_scale(scale);
        }
        vector.mark_written(index);
        trace!(element_type = %self.element_type, index, "wrote decimal element");
        Ok(())
    }

    fn read_at(&self, vector: &ColumnVector, index: usize) -> Result<Scalar> {
        vector.check_readable(index)?;
        let value: i128 = vector.values_buffer()?.typed_data::<T>()[index].into();
        Ok(Scalar::Decimal128(
            Some(value),
            self.max_precision(),
            vector.scale().unwrap_or(0),
        ))
    }

    fn to_array(&self, vector: &ColumnVector) -> Result<ArrayRef> {
        let values: Vec<i128> = vector.values_buffer()?.typed_data::<T>()[..vector.len()]
            .iter()
            .map(|v| (*v).into())
            .collect();
        let array = Decimal128Array::from(values)
            .with_precision_and_scale(self.max_precision(), vector.scale().unwrap_or(0))?;
        Ok(Arc::new(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::vector::column_vector::VectorOptions;
    use arrow::array::Array;
    use arrow::datatypes::DataType;
    use pretty_assertions::assert_eq;

    fn decimal(unscaled: i128, precision: u8, scale: i8) -> ElementValue {
        Scalar::Decimal128(Some(unscaled), precision, scale).into()
    }

    #[test]
    fn test_scale_is_adopted_and_rescaled() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Decimal18, 3, &VectorOptions::default())?;
        vector.write_at(0, &ElementValue::Null)?;
        vector.write_at(1, &decimal(12345, 12, 2))?;
        vector.write_at(2, &decimal(7, 12, 0))?;
        vector.finalize(3)?;

        assert_eq!(vector.scale(), Some(2));
        assert_eq!(
            vector.values()?,
            vec![
                Scalar::Decimal128(Some(0), 18, 2),
                Scalar::Decimal128(Some(12345), 18, 2),
                Scalar::Decimal128(Some(700), 18, 2),
            ]
        );

        let array = vector.to_array()?;
        assert_eq!(array.data_type(), &DataType::Decimal128(18, 2));
        Ok(())
    }

    #[test]
    fn test_larger_scale_is_rejected() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Decimal9, 2, &VectorOptions::default())?;
        vector.write_at(0, &decimal(1, 5, 1))?;
        let err = vector.write_at(1, &decimal(1, 5, 3)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidElementValue {
                expected: ElementType::Decimal9,
                ..
            }
        ));
        assert_eq!(vector.cursor(), 1);
        Ok(())
    }

    #[test]
    fn test_precision_overflow_is_rejected() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Decimal9, 1, &VectorOptions::default())?;
        assert!(vector.write_at(0, &decimal(999_999_999, 9, 0)).is_ok());
        assert!(vector.write_at(0, &decimal(1_000_000_000, 9, 0)).is_err());
        assert!(vector.write_at(0, &Scalar::Int32(Some(1)).into()).is_err());
        Ok(())
    }

    #[test]
    fn test_wide_decimals() -> Result<()> {
        let big = 10_i128.pow(30) + 1;
        let mut vector = ColumnVector::allocate(ElementType::Decimal38, 1, &VectorOptions::default())?;
        vector.write_at(0, &decimal(big, 31, 4))?;
        vector.finalize(1)?;
        assert_eq!(vector.get(0)?, Scalar::Decimal128(Some(big), 38, 4));
        Ok(())
    }
}
