//! Core types for docsum.

mod document;
mod length;
mod message;

pub use document::*;
pub use length::*;
pub use message::*;
