//! Low-level text parsing shared by the tree readers.
//!
//! Provides [ByteParser], an in-memory cursor over ASCII/UTF-8 text with
//! comment and whitespace skipping and quote-aware label reading, and the
//! [ParsingError] type it reports with.

pub mod byte_parser;
pub mod parsing_error;

pub use byte_parser::ByteParser;
pub use parsing_error::{ParsingError, ParsingErrorType};
