//! Crate-wide error type.
//!
//! Parse failures keep their own [ParsingError] (with position and context),
//! everything else that is fatal for a run ends up in [TaxError].
//! Recoverable conditions, such as an outgroup name that does not occur in the
//! tree, are *not* errors; see [Rooting](crate::rooting::Rooting).

use crate::parser::ParsingError;
use thiserror::Error;

/// Result type alias for taxwick operations.
pub type Result<T> = std::result::Result<T, TaxError>;

/// Errors that can occur while reading, rooting or annotating a tree.
#[derive(Error, Debug)]
pub enum TaxError {
    /// Malformed Newick text.
    #[error(transparent)]
    Parsing(#[from] ParsingError),

    /// Malformed JSON tree export.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading or writing a tree.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree violates a structural requirement of the requested operation.
    #[error("invalid tree: {0}")]
    InvalidTree(String),

    /// Rank symbol or rank name unknown to the rank table.
    #[error("unknown rank: {0}")]
    UnknownRank(String),

    /// The tree has no leaves to look up.
    #[error("no leaves to look up lineages for")]
    EmptyLookup,

    /// Number of lineages does not match the number of leaves.
    #[error("expected {expected} lineages for the leaves of the tree, got {actual}")]
    LineageCount {
        /// Leaves in the tree
        expected: usize,
        /// Lineages supplied
        actual: usize,
    },
}
