pub mod column_array;
pub mod element_type;
pub mod field;
pub mod scalar;
pub mod value;
