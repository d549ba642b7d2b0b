pub mod builder;
pub mod table;
