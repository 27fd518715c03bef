use std::fmt;

use arrow::array::Array;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::{ElementValue, ForwardedValue};
use crate::error::{Error, Result};

/// A column of the input batch whose value becomes an element at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub index: usize,
    /// The type the column was declared with when the literal was typed.
    pub element_type: ElementType,
}

impl ColumnRef {
    pub fn new(index: usize, element_type: ElementType) -> Self {
        Self {
            index,
            element_type,
        }
    }
}

/// One element of an array literal as written in the query.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementExpr {
    Constant(Scalar),
    Column(ColumnRef),
}

impl ElementExpr {
    /// The type this element contributes when the literal's type is resolved.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementExpr::Constant(scalar) => scalar.element_type(),
            ElementExpr::Column(column) => column.element_type,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ElementExpr::Constant(_))
    }
}

impl From<Scalar> for ElementExpr {
    fn from(scalar: Scalar) -> Self {
        ElementExpr::Constant(scalar)
    }
}

impl fmt::Display for ElementExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementExpr::Constant(Scalar::Utf8(Some(v))) => write!(f, "'{v}'"),
            ElementExpr::Constant(scalar) => write!(f, "{scalar}"),
            ElementExpr::Column(column) => write!(f, "#{}", column.index),
        }
    }
}

/// The row a literal is being built for.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub batch: &'a RecordBatch,
    pub row: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(batch: &'a RecordBatch, row: usize) -> Self {
        Self { batch, row }
    }
}

/// Turns one element into the value a vector builder writes.
///
/// Constants are returned as they are, nulls of any kind become [`ElementValue::Null`] and a
/// non-null column slot is forwarded without being copied.
pub fn extract(expr: &ElementExpr, ctx: Option<&EvalContext>) -> Result<ElementValue> {
    match expr {
        ElementExpr::Constant(scalar) if scalar.is_null() => Ok(ElementValue::Null),
        ElementExpr::Constant(scalar) => Ok(ElementValue::Scalar(scalar.clone())),
        ElementExpr::Column(column) => {
            let ctx = ctx.ok_or_else(|| {
                Error::invalid_value(
                    column.element_type,
                    format!("column #{} outside of an evaluation context", column.index),
                )
            })?;
            extract_column(column, ctx)
        }
    }
}

fn extract_column(column: &ColumnRef, ctx: &EvalContext) -> Result<ElementValue> {
    let batch = ctx.batch;
    if column.index >= batch.num_columns() {
        return Err(Error::invalid_value(
            column.element_type,
            format!(
                "column #{} of a batch with {} columns",
                column.index,
                batch.num_columns()
            ),
        ));
    }
    let array = batch.column(column.index);
    if ctx.row >= array.len() {
        return Err(Error::IndexOutOfBounds {
            index: ctx.row,
            len: array.len(),
        });
    }

    // a NullArray carries no validity buffer, every slot is null
    if array.data_type() == &DataType::Null {
        return Ok(ElementValue::Null);
    }
    let actual = ElementType::try_from(array.data_type())?;
    if actual != column.element_type {
        return Err(Error::invalid_value(
            column.element_type,
            format!("column #{} of type {actual}", column.index),
        ));
    }

    if array.is_null(ctx.row) {
        return Ok(ElementValue::Null);
    }
    Ok(ElementValue::Forwarded(ForwardedValue::new(
        array.clone(),
        ctx.row,
    )))
}
