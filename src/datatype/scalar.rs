use std::fmt;
use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, BinaryArray, BooleanArray, Decimal128Array, Float32Array,
    Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, IntervalDayTimeArray,
    IntervalYearMonthArray, StringArray,
};
use arrow::datatypes::{DataType, IntervalDayTime, IntervalUnit};
use arrow::error::ArrowError;

use crate::datatype::element_type::ElementType;
use crate::datatype::field::Field;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
/// A single constant value. Every typed variant carries an `Option`, `None` being a typed null.
pub enum Scalar {
    /// represents an untyped null, it widens to any element type
    Null,
    /// true or false
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    /// unscaled value, precision, scale
    Decimal128(Option<i128>, u8, i8),
    /// number of months
    IntervalYearMonth(Option<i32>),
    IntervalDayTime(Option<IntervalDayTime>),
    // utf-8 encoded string
    Utf8(Option<String>),
    Binary(Option<Vec<u8>>),
}

/// Macro used to convert scalar values to array based on the scalar value type
macro_rules! scalar_to_array {
    ($DATA_TYPE:expr, $ARRAY_TYPE:ident, $VALUE:expr, $SIZE:expr) => {{
        match $VALUE {
            Some(value) => Arc::new($ARRAY_TYPE::from(vec![*value; $SIZE])) as ArrayRef,
            None => new_null_array(&$DATA_TYPE, $SIZE),
        }
    }};
}

/// Reads one slot of a concrete arrow array, `None` when the slot is null
macro_rules! array_value {
    ($ARRAY:expr, $ARRAY_TYPE:ident, $ROW:expr) => {{
        let array = $ARRAY
            .as_any()
            .downcast_ref::<$ARRAY_TYPE>()
            .ok_or_else(|| {
                ArrowError::InvalidArgumentError(format!(
                    "array of type {:?} is not a {}",
                    $ARRAY.data_type(),
                    stringify!($ARRAY_TYPE)
                ))
            })?;
        if array.is_null($ROW) {
            None
        } else {
            Some(array.value($ROW))
        }
    }};
}

impl Scalar {
    /// The element type this constant contributes to an array literal
    pub fn element_type(&self) -> ElementType {
        match self {
            Scalar::Null => ElementType::Unresolved,
            Scalar::Boolean(_) => ElementType::Boolean,
            Scalar::Int8(_) => ElementType::TinyInt,
            Scalar::Int16(_) => ElementType::SmallInt,
            Scalar::Int32(_) => ElementType::Int,
            Scalar::Int64(_) => ElementType::BigInt,
            Scalar::Float32(_) => ElementType::Float,
            Scalar::Float64(_) => ElementType::Double,
            Scalar::Decimal128(_, precision, _) => match precision {
                0..=9 => ElementType::Decimal9,
                10..=18 => ElementType::Decimal18,
                19..=28 => ElementType::Decimal28,
                _ => ElementType::Decimal38,
            },
            Scalar::IntervalYearMonth(_) => ElementType::IntervalYear,
            Scalar::IntervalDayTime(_) => ElementType::IntervalDay,
            Scalar::Utf8(_) => ElementType::Utf8,
            Scalar::Binary(_) => ElementType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Boolean(v) => v.is_none(),
            Scalar::Int8(v) => v.is_none(),
            Scalar::Int16(v) => v.is_none(),
            Scalar::Int32(v) => v.is_none(),
            Scalar::Int64(v) => v.is_none(),
            Scalar::Float32(v) => v.is_none(),
            Scalar::Float64(v) => v.is_none(),
            Scalar::Decimal128(v, _, _) => v.is_none(),
            Scalar::IntervalYearMonth(v) => v.is_none(),
            Scalar::IntervalDayTime(v) => v.is_none(),
            Scalar::Utf8(v) => v.is_none(),
            Scalar::Binary(v) => v.is_none(),
        }
    }

    pub fn data_type(&self) -> Result<DataType> {
        match self {
            Scalar::Null => Ok(DataType::Null),
            Scalar::Decimal128(_, precision, scale) => Ok(DataType::Decimal128(*precision, *scale)),
            other => other.element_type().to_arrow(0),
        }
    }

    /// Creates a Field corresponding to the scalar value type
    pub fn to_field(&self) -> Result<Field> {
        Ok(Field::new(&self.to_string(), self.data_type()?, self.is_null()))
    }

    /// Convert scalar value to an array repeating it `size` times
    pub fn to_array(&self, size: usize) -> Result<ArrayRef> {
        let data_type = self.data_type()?;
        let array = match self {
            Scalar::Null => new_null_array(&DataType::Null, size),
            Scalar::Boolean(v) => Arc::new(BooleanArray::from(vec![*v; size])),
            Scalar::Int8(v) => scalar_to_array!(data_type, Int8Array, v, size),
            Scalar::Int16(v) => scalar_to_array!(data_type, Int16Array, v, size),
            Scalar::Int32(v) => scalar_to_array!(data_type, Int32Array, v, size),
            Scalar::Int64(v) => scalar_to_array!(data_type, Int64Array, v, size),
            Scalar::Float32(v) => scalar_to_array!(data_type, Float32Array, v, size),
            Scalar::Float64(v) => scalar_to_array!(data_type, Float64Array, v, size),
            Scalar::Decimal128(v, precision, scale) => match v {
                Some(value) => Arc::new(
                    Decimal128Array::from(vec![*value; size])
                        .with_precision_and_scale(*precision, *scale)?,
                ),
                None => new_null_array(&data_type, size),
            },
            Scalar::IntervalYearMonth(v) => {
                scalar_to_array!(data_type, IntervalYearMonthArray, v, size)
            }
            Scalar::IntervalDayTime(v) => {
                scalar_to_array!(data_type, IntervalDayTimeArray, v, size)
            }
            Scalar::Utf8(v) => match v {
                Some(str) => Arc::new(StringArray::from_iter_values(
                    std::iter::repeat(str).take(size),
                )),
                None => new_null_array(&DataType::Utf8, size),
            },
            Scalar::Binary(v) => match v {
                Some(bytes) => Arc::new(BinaryArray::from_iter_values(
                    std::iter::repeat(bytes).take(size),
                )),
                None => new_null_array(&DataType::Binary, size),
            },
        };
        Ok(array)
    }

    /// Reads the value at `row` of an already materialized array
    pub fn try_from_array(array: &ArrayRef, row: usize) -> Result<Scalar> {
        if row >= array.len() {
            return Err(Error::IndexOutOfBounds {
                index: row,
                len: array.len(),
            });
        }

        let scalar = match array.data_type() {
            DataType::Null => Scalar::Null,
            DataType::Boolean => Scalar::Boolean(array_value!(array, BooleanArray, row)),
            DataType::Int8 => Scalar::Int8(array_value!(array, Int8Array, row)),
            DataType::Int16 => Scalar::Int16(array_value!(array, Int16Array, row)),
            DataType::Int32 => Scalar::Int32(array_value!(array, Int32Array, row)),
            DataType::Int64 => Scalar::Int64(array_value!(array, Int64Array, row)),
            DataType::Float32 => Scalar::Float32(array_value!(array, Float32Array, row)),
            DataType::Float64 => Scalar::Float64(array_value!(array, Float64Array, row)),
            DataType::Decimal128(precision, scale) => Scalar::Decimal128(
                array_value!(array, Decimal128Array, row),
                *precision,
                *scale,
            ),
            DataType::Interval(IntervalUnit::YearMonth) => {
                Scalar::IntervalYearMonth(array_value!(array, IntervalYearMonthArray, row))
            }
            DataType::Interval(IntervalUnit::DayTime) => {
                Scalar::IntervalDayTime(array_value!(array, IntervalDayTimeArray, row))
            }
            DataType::Utf8 => {
                Scalar::Utf8(array_value!(array, StringArray, row).map(|s| s.to_string()))
            }
            DataType::Binary => {
                Scalar::Binary(array_value!(array, BinaryArray, row).map(|b| b.to_vec()))
            }
            other => {
                return Err(Error::ArrowError(ArrowError::InvalidArgumentError(
                    format!("arrow type {other:?} cannot be read as an array element"),
                )))
            }
        };
        Ok(scalar)
    }
}

/// Renders an unscaled decimal with its scale, e.g. (12345, 2) as `123.45`
pub(crate) fn format_decimal(unscaled: i128, scale: i8) -> String {
    if scale <= 0 {
        if unscaled == 0 {
            return "0".to_string();
        }
        return format!("{}{}", unscaled, "0".repeat(scale.unsigned_abs() as usize));
    }

    let scale = scale as usize;
    let digits = unscaled.unsigned_abs().to_string();
    let digits = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = digits.split_at(digits.len() - scale);
    let sign = if unscaled < 0 { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            Scalar::Boolean(Some(v)) => write!(f, "{v}"),
            Scalar::Int8(Some(v)) => write!(f, "{v}"),
            Scalar::Int16(Some(v)) => write!(f, "{v}"),
            Scalar::Int32(Some(v)) => write!(f, "{v}"),
            Scalar::Int64(Some(v)) => write!(f, "{v}"),
            // Debug keeps the trailing `.0` on whole floats
            Scalar::Float32(Some(v)) => write!(f, "{v:?}"),
            Scalar::Float64(Some(v)) => write!(f, "{v:?}"),
            Scalar::Decimal128(Some(v), _, scale) => f.write_str(&format_decimal(*v, *scale)),
            Scalar::IntervalYearMonth(Some(months)) => {
                write!(f, "P{}Y{}M", months / 12, months % 12)
            }
            Scalar::IntervalDayTime(Some(v)) => {
                let sign = if v.milliseconds < 0 { "-" } else { "" };
                let millis = v.milliseconds.unsigned_abs();
                write!(f, "P{}DT{sign}{}.{:03}S", v.days, millis / 1000, millis % 1000)
            }
            Scalar::Utf8(Some(v)) => f.write_str(v),
            Scalar::Binary(Some(v)) => {
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            _ => f.write_str("NULL"),
        }
    }
}
