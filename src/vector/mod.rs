pub mod boolean;
pub mod buffer;
pub mod builder;
pub mod cast;
pub mod column_vector;
pub mod decimal;
pub mod functions;
pub mod primitive;
pub mod string;
pub mod unsupported;
