//! Taxwick roots phylogenetic trees by taxonomy and annotates every branch
//! with the taxonomic consensus of the leaves below it.
//!
//! Core functionality provided:
//! - Lineages: tagged taxonomic paths such as
//!   `<D>Bacteria<P>Proteobacteria<T>K-12`, see [crate::lineage].
//! - Newick: parse multifurcating trees with support values and write them
//!   back with consensus labels, see [crate::newick].
//! - Rooting: root at an outgroup leaf, at the smallest taxonomically coherent
//!   branch, or by one of several branch-length criteria, see [crate::rooting].
//! - Annotation: consensus label of every node and, per taxon, whether one
//!   branch holds all its members (monophyly) or into which branches it is
//!   split, see [crate::annotate].
//! - Statistics and predictions for leaves without resolved taxonomy, see
//!   [crate::stats].
//! - JSON export and import of annotated trees, see [crate::json].
//!
//! The tree model uses the arena pattern: no direct node references are
//! stored, only node indices. See [crate::model] for details.
//!
//! # Usage patterns
//! 1. [classify_tree] runs the whole pipeline: lineage lookup, leaf labelling,
//!    rooting and final annotation.
//! 2. The single steps are public for full control: [lineage::resolve_lineages],
//!    [model::TaxTree::set_leaf_lineages], [rooting::RootingEngine],
//!    [annotate::annotate_tree].
//!
//! ## Example
//! ```
//! use std::collections::HashMap;
//! use taxwick::lineage::RankTableBuilder;
//! use taxwick::rooting::RootingConfig;
//! use taxwick::{classify_tree, parse_newick_str};
//!
//! // Domain and kingdom only
//! let ranks = RankTableBuilder::new().with_output_ranks("DK").lock().unwrap();
//! let lookup: HashMap<String, String> = [
//!     ("A", "<D>X<K>Y"),
//!     ("B", "<D>X<K>Y"),
//!     ("C", "<D>X<K>Z"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let tree = parse_newick_str("(A:1,B:1,C:1);").unwrap();
//! let classified = classify_tree(tree, &lookup, &ranks, &RootingConfig::default()).unwrap();
//!
//! assert!(classified.tree.is_rooted());
//! assert!(classified.taxa.def.get("<D>X<K>Y").unwrap().monophy);
//! assert_eq!(classified.taxa.def.get("<D>X").unwrap().distract, vec![3]);
//! ```

pub mod annotate;
pub mod error;
pub mod json;
pub mod lineage;
pub mod model;
pub mod newick;
pub mod parser;
pub mod rooting;
pub mod stats;

use crate::annotate::{Taxa, annotate_tree};
use crate::error::Result;
use crate::lineage::{Lineage, LineageLookup, RankTable, resolve_lineages};
use crate::model::TaxTree;
use crate::parser::ParsingError;
use crate::rooting::{RootingConfig, RootingEngine};
use std::path::Path;
use tracing::info;

// ============================================================================
// Quick Newick API
// ============================================================================
/// Parse a Newick string using default settings, returning a [TaxTree].
///
/// See [`newick::parse_str`] for full documentation of this convenience function.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> std::result::Result<TaxTree, ParsingError> {
    newick::parse_str(newick)
}

/// Parse a file containing a semicolon-separated list of Newick strings
/// using default settings.
///
/// See [`newick::parse_file`] for full documentation of this convenience function.
pub fn parse_newick_file<P: AsRef<Path>>(path: P) -> Result<Vec<TaxTree>> {
    newick::parse_file(path)
}

// ============================================================================
// Pipeline
// ============================================================================
/// A rooted tree annotated with taxonomic consensus.
#[derive(Debug, Clone)]
pub struct Classified {
    /// Rooted, compacted and annotated tree
    pub tree: TaxTree,
    /// Taxon states after the final annotation
    pub taxa: Taxa,
    /// Resolved lineage of every leaf, in leaf pre-order of the input tree
    pub lineages: Vec<Lineage>,
}

/// Roots and annotates a tree.
///
/// 1. Looks up the lineage of every leaf and attaches it to the leaf.
/// 2. Roots the tree with the [RootingEngine] (trees with a binary root stay
///    as they are).
/// 3. Runs the final annotation on the rooted tree.
///
/// # Arguments
/// * `tree` - Tree read from Newick text
/// * `lookup` - Source of lineages by leaf name
/// * `ranks` - Rank table used to normalize the lineages
/// * `config` - Rooting settings
///
/// # Errors
/// Returns an error if the tree has no leaves or no root.
pub fn classify_tree<L: LineageLookup + ?Sized>(
    mut tree: TaxTree,
    lookup: &L,
    ranks: &RankTable,
    config: &RootingConfig,
) -> Result<Classified> {
    let lineages = resolve_lineages(&tree.leaf_names(), lookup, ranks)?;
    tree.set_leaf_lineages(&lineages)?;
    info!("Classifying tree with {} leaves", lineages.len());

    RootingEngine::new(config.clone())
        .with_ranks(ranks.clone())
        .root(&mut tree)?;
    tree.compact();
    let taxa = annotate_tree(&mut tree);
    Ok(Classified { tree, taxa, lineages })
}
