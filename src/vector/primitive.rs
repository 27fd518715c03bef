use std::marker::PhantomData;
use std::sync::Arc;

use arrow::array::{ArrayRef, PrimitiveArray};
use arrow::datatypes::{
    ArrowPrimitiveType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    IntervalDayTime, IntervalDayTimeType, IntervalYearMonthType,
};
use tracing::trace;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::Result;
use crate::vector::builder::{invalid, number_of, value_scalar, Number, VectorBuilder};
use crate::vector::column_vector::ColumnVector;

/// An arrow primitive type that backs one fixed-width element type.
pub trait PrimitiveElement: ArrowPrimitiveType {
    const ELEMENT_TYPE: ElementType;

    /// The native value for `scalar`, or `None` if it does not fit this type.
    fn coerce(scalar: &Scalar) -> Option<Self::Native>;

    fn to_scalar(value: Self::Native) -> Scalar;
}

/// Integers must fit, floats are truncated toward zero when finite and in range.
macro_rules! integer_element {
    ($ARROW_TYPE:ty, $NATIVE:ty, $ELEMENT_TYPE:expr, $SCALAR:ident) => {
        impl PrimitiveElement for $ARROW_TYPE {
            const ELEMENT_TYPE: ElementType = $ELEMENT_TYPE;

            fn coerce(scalar: &Scalar) -> Option<$NATIVE> {
                match number_of(scalar)? {
                    Number::Int(v) => <$NATIVE>::try_from(v).ok(),
                    Number::Float(v) => {
                        let truncated = v.trunc();
                        let in_range = truncated >= <$NATIVE>::MIN as f64
                            && truncated < (<$NATIVE>::MAX as f64) + 1.0;
                        (v.is_finite() && in_range).then(|| truncated as $NATIVE)
                    }
                }
            }

            fn to_scalar(value: $NATIVE) -> Scalar {
                Scalar::$SCALAR(Some(value))
            }
        }
    };
}

integer_element!(Int8Type, i8, ElementType::TinyInt, Int8);
integer_element!(Int16Type, i16, ElementType::SmallInt, Int16);
integer_element!(Int32Type, i32, ElementType::Int, Int32);
integer_element!(Int64Type, i64, ElementType::BigInt, Int64);

impl PrimitiveElement for Float32Type {
    const ELEMENT_TYPE: ElementType = ElementType::Float;

    fn coerce(scalar: &Scalar) -> Option<f32> {
        match number_of(scalar)? {
            Number::Int(v) => Some(v as f32),
            Number::Float(v) => Some(v as f32),
        }
    }

    fn to_scalar(value: f32) -> Scalar {
        Scalar::Float32(Some(value))
    }
}

impl PrimitiveElement for Float64Type {
    const ELEMENT_TYPE: ElementType = ElementType::Double;

    fn coerce(scalar: &Scalar) -> Option<f64> {
        match number_of(scalar)? {
            Number::Int(v) => Some(v as f64),
            Number::Float(v) => Some(v),
        }
    }

    fn to_scalar(value: f64) -> Scalar {
        Scalar::Float64(Some(value))
    }
}

impl PrimitiveElement for IntervalYearMonthType {
    const ELEMENT_TYPE: ElementType = ElementType::IntervalYear;

    fn coerce(scalar: &Scalar) -> Option<i32> {
        match scalar {
            Scalar::IntervalYearMonth(v) => *v,
            _ => None,
        }
    }

    fn to_scalar(value: i32) -> Scalar {
        Scalar::IntervalYearMonth(Some(value))
    }
}

impl PrimitiveElement for IntervalDayTimeType {
    const ELEMENT_TYPE: ElementType = ElementType::IntervalDay;

    fn coerce(scalar: &Scalar) -> Option<IntervalDayTime> {
        match scalar {
            Scalar::IntervalDayTime(v) => *v,
            _ => None,
        }
    }

    fn to_scalar(value: IntervalDayTime) -> Scalar {
        Scalar::IntervalDayTime(Some(value))
    }
}

/// Builder for every fixed-width element type that maps onto one arrow primitive type.
pub struct PrimitiveBuilder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> PrimitiveBuilder<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for PrimitiveBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrimitiveElement> VectorBuilder for PrimitiveBuilder<T> {
    fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
    }

    fn write_at(&self, vector: &mut ColumnVector, index: usize, value: &ElementValue) -> Result<()> {
        let native = match value_scalar(value)? {
            None => T::Native::default(),
            Some(scalar) => T::coerce(&scalar).ok_or_else(|| invalid(T::ELEMENT_TYPE, &scalar))?,
        };
        vector.check_writable("write")?;
        vector.reserve_index(index)?;
        vector.values_buffer_mut()?.typed_data_mut::<T::Native>()[index] = native;
        vector.mark_written(index);
        trace!(element_type = %T::ELEMENT_TYPE, index, "wrote element");
        Ok(())
    }

    fn read_at(&self, vector: &ColumnVector, index: usize) -> Result<Scalar> {
        vector.check_readable(index)?;
        let value = vector.values_buffer()?.typed_data::<T::Native>()[index];
        Ok(T::to_scalar(value))
    }

    fn to_array(&self, vector: &ColumnVector) -> Result<ArrayRef> {
        let values = &vector.values_buffer()?.typed_data::<T::Native>()[..vector.len()];
        Ok(Arc::new(PrimitiveArray::<T>::from_iter_values(
            values.iter().copied(),
        )))
    }
}
