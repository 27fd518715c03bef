use std::fmt;

use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use tracing::{debug, trace};

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::error::{Error, Result};
use crate::literal::extract::{ElementExpr, EvalContext};
use crate::literal::resolver::{CoercionMode, TypeResolver};
use crate::vector::builder::builder_for;
use crate::vector::column_vector::{ColumnVector, VectorOptions};

/// An array literal while it is being parsed.
///
/// The resolved type is always the join of every element added so far, an element that
/// cannot be joined is rejected and leaves the literal as it was.
#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    elements: Vec<ElementExpr>,
    element_type: ElementType,
    resolver: TypeResolver,
}

impl ArrayLiteral {
    pub fn new(mode: CoercionMode) -> Self {
        Self {
            elements: vec![],
            element_type: ElementType::Unresolved,
            resolver: TypeResolver::new(mode),
        }
    }

    pub fn try_from_elements<I>(mode: CoercionMode, elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = ElementExpr>,
    {
        let mut literal = Self::new(mode);
        for element in elements {
            literal.append(element)?;
        }
        Ok(literal)
    }

    pub fn append(&mut self, element: ElementExpr) -> Result<()> {
        let resolved = self
            .resolver
            .resolve(self.element_type, element.element_type())?;
        trace!(index = self.elements.len(), %element, %resolved, "appended literal element");
        self.elements.push(element);
        self.element_type = resolved;
        Ok(())
    }

    /// Replaces the element at `index` and returns the old one. The new element's type is
    /// joined into the current type, the type never narrows.
    pub fn replace(&mut self, index: usize, element: ElementExpr) -> Result<ElementExpr> {
        if index >= self.elements.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.elements.len(),
            });
        }
        let resolved = self
            .resolver
            .resolve(self.element_type, element.element_type())?;
        self.element_type = resolved;
        Ok(std::mem::replace(&mut self.elements[index], element))
    }

    pub fn elements(&self) -> &[ElementExpr] {
        &self.elements
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Fixes the element type. Literals that are empty, hold only untyped nulls, or are
    /// BINARY cannot be built.
    pub fn bind(self) -> Result<BoundArrayLiteral> {
        match self.element_type {
            ElementType::Unresolved | ElementType::Binary => {
                Err(Error::UnsupportedElementType(self.element_type))
            }
            element_type => {
                debug!(%element_type, len = self.elements.len(), "bound array literal");
                Ok(BoundArrayLiteral {
                    elements: self.elements,
                    element_type,
                })
            }
        }
    }
}

impl Default for ArrayLiteral {
    fn default() -> Self {
        Self::new(CoercionMode::default())
    }
}

impl fmt::Display for ArrayLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_elements(f, &self.elements)
    }
}

/// An array literal whose element type is fixed. Read only.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArrayLiteral {
    elements: Vec<ElementExpr>,
    element_type: ElementType,
}

impl BoundArrayLiteral {
    pub fn elements(&self) -> &[ElementExpr] {
        &self.elements
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True when no element needs a row to be evaluated.
    pub fn is_constant(&self) -> bool {
        self.elements.iter().all(ElementExpr::is_constant)
    }

    /// Scale of a decimal literal, taken from its first element: a constant's own scale, or
    /// the scale of the column in `input`.
    pub fn decimal_scale(&self, input: Option<&RecordBatch>) -> i8 {
        if !self.element_type.is_decimal() {
            return 0;
        }
        self.elements
            .iter()
            .find_map(|element| match element {
                ElementExpr::Constant(Scalar::Decimal128(_, _, scale)) => Some(*scale),
                ElementExpr::Column(column) => {
                    match input?.schema_ref().fields().get(column.index)?.data_type() {
                        DataType::Decimal128(_, scale) => Some(*scale),
                        _ => None,
                    }
                }
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Allocates a vector, writes every element and finalizes it. On failure the partly
    /// built vector is released before the error is returned.
    pub fn build(&self, options: &VectorOptions, ctx: Option<&EvalContext>) -> Result<ColumnVector> {
        let builder = builder_for(self.element_type);
        let mut vector = builder.allocate(self.elements.len(), options)?;
        if self.element_type.is_decimal() {
            // every row of a decimal literal shares one scale
            vector.set_scale(self.decimal_scale(ctx.map(|ctx| ctx.batch)));
        }
        let built = builder
            .copy_from_evaluated_elements(&mut vector, &self.elements, ctx)
            .and_then(|written| builder.finalize(&mut vector, written));
        match built {
            Ok(()) => Ok(vector),
            Err(e) => {
                debug!(element_type = %self.element_type, error = %e, "array literal build failed");
                vector.release();
                Err(e)
            }
        }
    }
}

impl fmt::Display for BoundArrayLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_elements(f, &self.elements)
    }
}

fn write_elements(f: &mut fmt::Formatter<'_>, elements: &[ElementExpr]) -> fmt::Result {
    f.write_str("[")?;
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{element}")?;
    }
    f.write_str("]")
}
