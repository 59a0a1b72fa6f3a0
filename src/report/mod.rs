//! Report assembly and CSV serialization.

pub mod assemble;
pub mod writer;
