use arrow::array::ArrayRef;
use arrow::datatypes::{
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, IntervalDayTimeType,
    IntervalYearMonthType,
};
use tracing::trace;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::{Error, Result};
use crate::literal::extract::{extract, ElementExpr, EvalContext};
use crate::vector::boolean::BooleanBuilder;
use crate::vector::column_vector::{ColumnVector, VectorOptions};
use crate::vector::decimal::DecimalBuilder;
use crate::vector::primitive::PrimitiveBuilder;
use crate::vector::string::StringBuilder;
use crate::vector::unsupported::UnsupportedBuilder;

/// Per element type allocate / write / read / finalize logic for [`ColumnVector`]s.
///
/// The set of implementations is closed, see [`builder_for`].
pub trait VectorBuilder: Send + Sync {
    fn element_type(&self) -> ElementType;

    /// Allocates a vector sized for `max(1, requested)` elements.
    fn allocate(&self, requested: usize, options: &VectorOptions) -> Result<ColumnVector> {
        ColumnVector::allocate(self.element_type(), requested, options)
    }

    /// Writes `value` at `index`, growing the vector if needed. Nulls write the default.
    /// When the value does not fit this element type the vector is left as it was.
    fn write_at(&self, vector: &mut ColumnVector, index: usize, value: &ElementValue)
        -> Result<()>;

    fn read_at(&self, vector: &ColumnVector, index: usize) -> Result<Scalar>;

    fn finalize(&self, vector: &mut ColumnVector, count: usize) -> Result<()> {
        vector.set_finalized(count)
    }

    /// The finalized contents as an arrow array of the vector's logical length.
    fn to_array(&self, vector: &ColumnVector) -> Result<ArrayRef>;

    /// Extracts each element in order and writes it at its position.
    /// Stops at the first failure, already written slots stay written.
    fn copy_from_evaluated_elements(
        &self,
        vector: &mut ColumnVector,
        elements: &[ElementExpr],
        ctx: Option<&EvalContext>,
    ) -> Result<usize> {
        for (index, element) in elements.iter().enumerate() {
            let value = extract(element, ctx)?;
            trace!(index, %value, "copying literal element");
            self.write_at(vector, index, &value)?;
        }
        Ok(elements.len())
    }
}

static UNRESOLVED: UnsupportedBuilder = UnsupportedBuilder::new(ElementType::Unresolved);
static BOOLEAN: BooleanBuilder = BooleanBuilder;
static TINYINT: PrimitiveBuilder<Int8Type> = PrimitiveBuilder::new();
static SMALLINT: PrimitiveBuilder<Int16Type> = PrimitiveBuilder::new();
static INT: PrimitiveBuilder<Int32Type> = PrimitiveBuilder::new();
static BIGINT: PrimitiveBuilder<Int64Type> = PrimitiveBuilder::new();
static FLOAT: PrimitiveBuilder<Float32Type> = PrimitiveBuilder::new();
static DOUBLE: PrimitiveBuilder<Float64Type> = PrimitiveBuilder::new();
static DECIMAL9: DecimalBuilder<i32> = DecimalBuilder::new(ElementType::Decimal9);
static DECIMAL18: DecimalBuilder<i64> = DecimalBuilder::new(ElementType::Decimal18);
static DECIMAL28: DecimalBuilder<i128> = DecimalBuilder::new(ElementType::Decimal28);
static DECIMAL38: DecimalBuilder<i128> = DecimalBuilder::new(ElementType::Decimal38);
static INTERVAL_YEAR: PrimitiveBuilder<IntervalYearMonthType> = PrimitiveBuilder::new();
static INTERVAL_DAY: PrimitiveBuilder<IntervalDayTimeType> = PrimitiveBuilder::new();
static STRING: StringBuilder = StringBuilder;
static BINARY: UnsupportedBuilder = UnsupportedBuilder::new(ElementType::Binary);

/// Indexed by `ElementType as usize`.
static REGISTRY: [&(dyn VectorBuilder); ElementType::COUNT] = [
    &UNRESOLVED,
    &BOOLEAN,
    &TINYINT,
    &SMALLINT,
    &INT,
    &BIGINT,
    &FLOAT,
    &DOUBLE,
    &DECIMAL9,
    &DECIMAL18,
    &DECIMAL28,
    &DECIMAL38,
    &INTERVAL_YEAR,
    &INTERVAL_DAY,
    &STRING,
    &BINARY,
];

pub fn builder_for(element_type: ElementType) -> &'static dyn VectorBuilder {
    REGISTRY[element_type as usize]
}

/// A value from the BOOLEAN..DOUBLE chain, as read from a scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

pub(crate) fn number_of(scalar: &Scalar) -> Option<Number> {
    match scalar {
        Scalar::Boolean(Some(v)) => Some(Number::Int(i64::from(*v))),
        Scalar::Int8(Some(v)) => Some(Number::Int(i64::from(*v))),
        Scalar::Int16(Some(v)) => Some(Number::Int(i64::from(*v))),
        Scalar::Int32(Some(v)) => Some(Number::Int(i64::from(*v))),
        Scalar::Int64(Some(v)) => Some(Number::Int(*v)),
        Scalar::Float32(Some(v)) => Some(Number::Float(f64::from(*v))),
        Scalar::Float64(Some(v)) => Some(Number::Float(*v)),
        _ => None,
    }
}

/// The scalar a write carries, `None` for any kind of null.
pub(crate) fn value_scalar(value: &ElementValue) -> Result<Option<Scalar>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(value.to_scalar()?))
}

pub(crate) fn invalid(element_type: ElementType, scalar: &Scalar) -> Error {
    Error::invalid_value(element_type, format!("{scalar} ({})", scalar.element_type()))
}
