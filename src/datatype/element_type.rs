use std::fmt;

use arrow::datatypes::{DataType, IntervalUnit};
use arrow::error::ArrowError;

use crate::error::{Error, Result};

/// Longest string a STRING element may hold, in bytes.
pub const MAX_VARCHAR_LENGTH: usize = 65_536;

/// The closed set of kinds an array literal element can have.
///
/// The discriminants are stable and index the vector builder registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    /// No element has fixed the type yet.
    Unresolved = 0,
    Boolean = 1,
    TinyInt = 2,
    SmallInt = 3,
    Int = 4,
    BigInt = 5,
    Float = 6,
    Double = 7,
    /// Decimal with precision up to 9, stored in 4 bytes.
    Decimal9 = 8,
    /// Decimal with precision up to 18, stored in 8 bytes.
    Decimal18 = 9,
    /// Decimal with precision up to 28, stored in 16 bytes.
    Decimal28 = 10,
    /// Decimal with precision up to 38, stored in 16 bytes.
    Decimal38 = 11,
    /// Interval in months.
    IntervalYear = 12,
    /// Interval in days and milliseconds.
    IntervalDay = 13,
    Utf8 = 14,
    Binary = 15,
}

/// How a single element is laid out in a vector's backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementLayout {
    /// One bit per element.
    Bit,
    Fixed { width: usize },
    Variable { max_len: usize },
    Unsized,
}

impl ElementType {
    pub const COUNT: usize = 16;

    pub const ALL: [ElementType; ElementType::COUNT] = [
        ElementType::Unresolved,
        ElementType::Boolean,
        ElementType::TinyInt,
        ElementType::SmallInt,
        ElementType::Int,
        ElementType::BigInt,
        ElementType::Float,
        ElementType::Double,
        ElementType::Decimal9,
        ElementType::Decimal18,
        ElementType::Decimal28,
        ElementType::Decimal38,
        ElementType::IntervalYear,
        ElementType::IntervalDay,
        ElementType::Utf8,
        ElementType::Binary,
    ];

    pub fn layout(&self) -> ElementLayout {
        match self {
            ElementType::Unresolved => ElementLayout::Unsized,
            ElementType::Boolean => ElementLayout::Bit,
            ElementType::TinyInt => ElementLayout::Fixed { width: 1 },
            ElementType::SmallInt => ElementLayout::Fixed { width: 2 },
            ElementType::Int | ElementType::Float => ElementLayout::Fixed { width: 4 },
            ElementType::BigInt | ElementType::Double => ElementLayout::Fixed { width: 8 },
            ElementType::Decimal9 => ElementLayout::Fixed { width: 4 },
            ElementType::Decimal18 => ElementLayout::Fixed { width: 8 },
            ElementType::Decimal28 | ElementType::Decimal38 => ElementLayout::Fixed { width: 16 },
            ElementType::IntervalYear => ElementLayout::Fixed { width: 4 },
            ElementType::IntervalDay => ElementLayout::Fixed { width: 8 },
            ElementType::Utf8 | ElementType::Binary => ElementLayout::Variable {
                max_len: MAX_VARCHAR_LENGTH,
            },
        }
    }

    /// Sealed families only widen to themselves.
    pub fn is_sealed(&self) -> bool {
        matches!(
            self,
            ElementType::Decimal9
                | ElementType::Decimal18
                | ElementType::Decimal28
                | ElementType::Decimal38
                | ElementType::IntervalYear
                | ElementType::IntervalDay
                | ElementType::Binary
        )
    }

    /// Members of the BOOLEAN..DOUBLE widening chain.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ElementType::Boolean
                | ElementType::TinyInt
                | ElementType::SmallInt
                | ElementType::Int
                | ElementType::BigInt
                | ElementType::Float
                | ElementType::Double
        )
    }

    pub fn is_decimal(&self) -> bool {
        matches!(
            self,
            ElementType::Decimal9
                | ElementType::Decimal18
                | ElementType::Decimal28
                | ElementType::Decimal38
        )
    }

    /// Largest precision a decimal family can hold.
    pub fn max_precision(&self) -> Option<u8> {
        match self {
            ElementType::Decimal9 => Some(9),
            ElementType::Decimal18 => Some(18),
            ElementType::Decimal28 => Some(28),
            ElementType::Decimal38 => Some(38),
            _ => None,
        }
    }

    /// The narrowest decimal family that can hold `precision` digits.
    pub fn decimal_for_precision(precision: u8) -> Result<ElementType> {
        match precision {
            1..=9 => Ok(ElementType::Decimal9),
            10..=18 => Ok(ElementType::Decimal18),
            19..=28 => Ok(ElementType::Decimal28),
            29..=38 => Ok(ElementType::Decimal38),
            _ => Err(Error::UnsupportedElementType(ElementType::Decimal38)),
        }
    }

    /// Arrow type of a finished vector of this element type.
    pub fn to_arrow(&self, scale: i8) -> Result<DataType> {
        let data_type = match self {
            ElementType::Boolean => DataType::Boolean,
            ElementType::TinyInt => DataType::Int8,
            ElementType::SmallInt => DataType::Int16,
            ElementType::Int => DataType::Int32,
            ElementType::BigInt => DataType::Int64,
            ElementType::Float => DataType::Float32,
            ElementType::Double => DataType::Float64,
            ElementType::Decimal9 => DataType::Decimal128(9, scale),
            ElementType::Decimal18 => DataType::Decimal128(18, scale),
            ElementType::Decimal28 => DataType::Decimal128(28, scale),
            ElementType::Decimal38 => DataType::Decimal128(38, scale),
            ElementType::IntervalYear => DataType::Interval(IntervalUnit::YearMonth),
            ElementType::IntervalDay => DataType::Interval(IntervalUnit::DayTime),
            ElementType::Utf8 => DataType::Utf8,
            ElementType::Binary => DataType::Binary,
            ElementType::Unresolved => return Err(Error::UnsupportedElementType(*self)),
        };
        Ok(data_type)
    }
}

impl TryFrom<&DataType> for ElementType {
    type Error = Error;

    fn try_from(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Null => Ok(ElementType::Unresolved),
            DataType::Boolean => Ok(ElementType::Boolean),
            DataType::Int8 => Ok(ElementType::TinyInt),
            DataType::Int16 => Ok(ElementType::SmallInt),
            DataType::Int32 => Ok(ElementType::Int),
            DataType::Int64 => Ok(ElementType::BigInt),
            DataType::Float32 => Ok(ElementType::Float),
            DataType::Float64 => Ok(ElementType::Double),
            DataType::Decimal128(precision, _) => ElementType::decimal_for_precision(*precision),
            DataType::Interval(IntervalUnit::YearMonth) => Ok(ElementType::IntervalYear),
            DataType::Interval(IntervalUnit::DayTime) => Ok(ElementType::IntervalDay),
            DataType::Utf8 => Ok(ElementType::Utf8),
            DataType::Binary => Ok(ElementType::Binary),
            other => Err(Error::ArrowError(ArrowError::InvalidArgumentError(
                format!("arrow type {other:?} has no array element type"),
            ))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Unresolved => "UNRESOLVED",
            ElementType::Boolean => "BOOLEAN",
            ElementType::TinyInt => "TINYINT",
            ElementType::SmallInt => "SMALLINT",
            ElementType::Int => "INT",
            ElementType::BigInt => "BIGINT",
            ElementType::Float => "FLOAT",
            ElementType::Double => "DOUBLE",
            ElementType::Decimal9 => "DECIMAL9",
            ElementType::Decimal18 => "DECIMAL18",
            ElementType::Decimal28 => "DECIMAL28",
            ElementType::Decimal38 => "DECIMAL38",
            ElementType::IntervalYear => "INTERVAL YEAR",
            ElementType::IntervalDay => "INTERVAL DAY",
            ElementType::Utf8 => "STRING",
            ElementType::Binary => "BINARY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_follow_all() {
        for (i, element_type) in ElementType::ALL.iter().enumerate() {
            assert_eq!(*element_type as usize, i);
        }
    }

    #[test]
    fn test_sealed_families() {
        let sealed = ElementType::ALL
            .iter()
            .filter(|t| t.is_sealed())
            .count();
        assert_eq!(sealed, 7);
        assert!(!ElementType::Utf8.is_sealed());
        assert!(!ElementType::Double.is_sealed());
    }

    #[test]
    fn test_layout_widths() {
        assert_eq!(ElementType::Boolean.layout(), ElementLayout::Bit);
        assert_eq!(ElementType::BigInt.layout(), ElementLayout::Fixed { width: 8 });
        assert_eq!(ElementType::Decimal28.layout(), ElementLayout::Fixed { width: 16 });
        assert_eq!(
            ElementType::Utf8.layout(),
            ElementLayout::Variable {
                max_len: MAX_VARCHAR_LENGTH
            }
        );
    }

    #[test]
    fn test_arrow_round_trip() -> Result<()> {
        for element_type in ElementType::ALL.iter().skip(1) {
            let data_type = element_type.to_arrow(2)?;
            assert_eq!(ElementType::try_from(&data_type)?, *element_type);
        }
        Ok(())
    }

    #[test]
    fn test_decimal_for_precision() -> Result<()> {
        assert_eq!(ElementType::decimal_for_precision(5)?, ElementType::Decimal9);
        assert_eq!(ElementType::decimal_for_precision(18)?, ElementType::Decimal18);
        assert_eq!(ElementType::decimal_for_precision(20)?, ElementType::Decimal28);
        assert_eq!(ElementType::decimal_for_precision(38)?, ElementType::Decimal38);
        assert!(ElementType::decimal_for_precision(39).is_err());
        Ok(())
    }
}
