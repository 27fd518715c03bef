pub mod array_literal;
pub mod extract;
pub mod resolver;
