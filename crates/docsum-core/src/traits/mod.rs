//! Core traits for docsum.

mod llm;

pub use llm::*;
