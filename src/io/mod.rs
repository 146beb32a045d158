// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_endmember, read_stack, read_table};
pub use writer::write_outputs;
