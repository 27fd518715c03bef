use crate::datatype::column_array::ColumnArray;
use crate::datatype::field::Field;
use crate::error::Result;
use crate::literal::array_literal::BoundArrayLiteral;
use crate::literal::extract::EvalContext;
use crate::physical_plan::expr::{PhysicalExpr, PhysicalExprRef};
use crate::vector::column_vector::VectorOptions;
use arrow::array::{new_empty_array, Array, ArrayRef, ListArray};
use arrow::buffer::OffsetBuffer;
use arrow::compute::concat;
use arrow::record_batch::RecordBatch;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Evaluates an array literal for every row of a batch, producing a list column.
///
/// A literal made only of constants is built once and repeated.
pub struct ArrayConstructorExpr {
    literal: BoundArrayLiteral,
    options: VectorOptions,
}

impl ArrayConstructorExpr {
    pub fn new(literal: BoundArrayLiteral, options: VectorOptions) -> PhysicalExprRef {
        Arc::new(Self { literal, options })
    }

    pub fn literal(&self) -> &BoundArrayLiteral {
        &self.literal
    }

    fn element_field(&self, input: &RecordBatch) -> Result<Field> {
        Field::array_element(
            self.literal.element_type(),
            self.literal.decimal_scale(Some(input)),
        )
    }

    fn build_row(&self, ctx: Option<&EvalContext>) -> Result<ArrayRef> {
        let vector = self.literal.build(&self.options, ctx)?;
        let array = vector.to_array();
        vector.release();
        array
    }
}

impl PhysicalExpr for ArrayConstructorExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn evaluate(&self, input: &RecordBatch) -> Result<ColumnArray> {
        let element = self.element_field(input)?;
        let rows = input.num_rows();

        let arrays: Vec<ArrayRef> = if self.literal.is_constant() {
            let array = self.build_row(None)?;
            vec![array; rows]
        } else {
            (0..rows)
                .map(|row| self.build_row(Some(&EvalContext::new(input, row))))
                .collect::<Result<_>>()?
        };

        let offsets = OffsetBuffer::<i32>::from_lengths(arrays.iter().map(|array| array.len()));
        let values = if arrays.is_empty() {
            new_empty_array(element.data_type())
        } else {
            let arrays: Vec<&dyn Array> = arrays.iter().map(|array| array.as_ref()).collect();
            concat(&arrays)?
        };
        let list = ListArray::try_new(element.to_arrow_ref(), offsets, values, None)?;
        debug!(
            rows,
            element_type = %self.literal.element_type(),
            constant = self.literal.is_constant(),
            "evaluated array constructor"
        );
        Ok(ColumnArray::Array(Arc::new(list)))
    }

    fn to_field(&self, input: &RecordBatch) -> Result<Field> {
        let element = self.element_field(input)?;
        Ok(Field::list(&self.literal.to_string(), &element))
    }
}
