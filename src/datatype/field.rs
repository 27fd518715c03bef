use std::sync::Arc;

use arrow::datatypes::{self, DataType, FieldRef};

use crate::datatype::element_type::ElementType;
use crate::error::Result;

/// Name given to the element field of every list produced from an array literal.
pub const ARRAY_ELEMENT_FIELD: &str = "_array";

#[derive(Debug, Clone, PartialEq)]
/// Field provides the name and data type of an evaluated expression,
/// and specifies whether it allows null values or not.
pub struct Field {
    pub field: datatypes::Field,
}

impl Field {
    pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
        Self {
            field: datatypes::Field::new(name, data_type, nullable),
        }
    }

    /// Element field of an array literal. Nulls are written as defaults, so it is never nullable.
    pub fn array_element(element_type: ElementType, scale: i8) -> Result<Self> {
        Ok(Self::new(
            ARRAY_ELEMENT_FIELD,
            element_type.to_arrow(scale)?,
            false,
        ))
    }

    /// A list field whose items are described by `element`
    pub fn list(name: &str, element: &Field) -> Self {
        Self::new(
            name,
            DataType::List(element.to_arrow_ref()),
            false,
        )
    }

    pub fn name(&self) -> &String {
        self.field.name()
    }

    pub fn data_type(&self) -> &DataType {
        self.field.data_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.field.is_nullable()
    }

    pub fn to_arrow_ref(&self) -> FieldRef {
        Arc::new(self.field.clone())
    }
}

impl From<Field> for datatypes::Field {
    fn from(f: Field) -> Self {
        f.field
    }
}
