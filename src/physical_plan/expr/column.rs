use crate::datatype::column_array::ColumnArray;
use crate::datatype::field::Field;
use crate::error::{Error, Result};
use crate::physical_plan::expr::{PhysicalExpr, PhysicalExprRef};
use arrow::record_batch::RecordBatch;
use std::any::Any;
use std::sync::Arc;

pub struct ColumnExpr {
    pub index: usize,
}

impl ColumnExpr {
    pub fn new(index: usize) -> PhysicalExprRef {
        Arc::new(Self { index })
    }

    fn check_index(&self, input: &RecordBatch) -> Result<()> {
        if self.index >= input.num_columns() {
            return Err(Error::IndexOutOfBounds {
                index: self.index,
                len: input.num_columns(),
            });
        }
        Ok(())
    }
}

impl PhysicalExpr for ColumnExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn evaluate(&self, input: &RecordBatch) -> Result<ColumnArray> {
        self.check_index(input)?;
        let column = input.column(self.index).clone();
        Ok(ColumnArray::Array(column))
    }

    fn to_field(&self, input: &RecordBatch) -> Result<Field> {
        self.check_index(input)?;
        let field = input.schema_ref().field(self.index).clone();
        Ok(Field { field })
    }
}
