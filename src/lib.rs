//! Typed array literal construction for a columnar query engine.
//!
//! An [`literal::array_literal::ArrayLiteral`] resolves its element type as elements are
//! added, and is then built into a buffer-backed [`vector::column_vector::ColumnVector`]
//! by the builder registered for that type.

pub mod config;
pub mod datatype;
pub mod error;
pub mod literal;
pub mod logging;
pub mod physical_plan;
pub mod vector;

pub use config::LiteralConfig;
pub use datatype::element_type::ElementType;
pub use datatype::scalar::Scalar;
pub use error::{Error, Result};
pub use literal::array_literal::{ArrayLiteral, BoundArrayLiteral};
pub use literal::resolver::{resolve, CoercionMode, TypeResolver};
pub use vector::column_vector::{ColumnVector, VectorOptions, VectorState};
