//! Newick format reader and writer for taxonomy-annotated trees.
//!
//! # Quick API
//! * [`parse_str`] - parses a single Newick string into a [`TaxTree`]
//! * [`parse_file`] - parses all trees of a file
//! * [`to_newick`] - writes a tree in one of the [`NewickStyle`]s
//! * [`write_newick_file`] - writes trees to a file, one per line
//!
//! # Format
//! Trees may be multifurcating, internal nodes may carry a name or a
//! support value:
//! * `tree ::= node ';'`
//! * `node ::= leaf | internal`
//! * `internal ::= '(' node (',' node)* ')' [name | support] [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Furthermore:
//! * Whitespace and `[...]` comments can occur between elements
//! * Unquoted labels may contain spaces; quote, tab and newline characters
//!   inside them are dropped
//! * A numeric token after `)` is a support value, anything else a name

mod parser;
pub mod writer;

pub use self::parser::NewickParser;
pub use self::writer::{NewickStyle, escape_label, to_newick, write_newick_file};

use crate::error::Result;
use crate::model::TaxTree;
use crate::parser::{ByteParser, ParsingError};
use std::path::Path;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single Newick string to obtain a [`TaxTree`].
///
/// # Example
/// ```
/// use taxwick::newick::parse_str;
///
/// let tree = parse_str("(Fratercula_cirrhata,(Fratercula_arctica,Fratercula_corniculata)95);").unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert!(tree.is_rooted());
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> std::result::Result<TaxTree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new().parse(&mut byte_parser)
}

/// Parses a file with a semicolon-separated list of Newick strings.
///
/// # Errors
/// Fails if the file cannot be read, contains no tree, or any tree is malformed.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<TaxTree>> {
    let byte_parser = ByteParser::from_file(path)?;
    Ok(NewickParser::new().parse_all(byte_parser)?)
}
