//! Taxonomy annotation of rooted trees.
//!
//! Annotation runs in two passes:
//! 1. [label_tree] computes, bottom-up, the consensus label of every internal
//!    node together with its leaf counts and taxonomic level.
//! 2. [Taxa::annotate] walks leaves first, then internal nodes bottom-up, and
//!    records for every taxon whether a single branch holds all its members
//!    and which branches hold part of them.
//!
//! [annotate_tree] runs both passes and returns the taxon states.

mod taxon;

pub use taxon::{TaxSys, Taxa, TaxonState};

use crate::lineage;
use crate::model::{NodeIndex, TaxTree};

/// Computes consensus labels, leaf counts and taxonomic levels of all nodes.
///
/// The label of an internal node is the common lineage of its children with
/// resolved taxonomy, or of all its children if none has. A single child
/// contributes its label without strain segment. Leaves keep their lineage.
pub fn label_tree(tree: &mut TaxTree) {
    let order: Vec<NodeIndex> = tree.post_order_iter().map(|n| n.index()).collect();
    for index in order {
        label_node(tree, index);
    }
}

/// Recomputes label and counts of a single node from its children.
fn label_node(tree: &mut TaxTree, index: NodeIndex) {
    if tree[index].is_leaf() {
        let leaf = &mut tree[index];
        leaf.nleaf = usize::from(!leaf.unclassified);
        leaf.nxleaf = usize::from(leaf.unclassified);
        leaf.tax_level = lineage::num_ranks(&leaf.label);
        return;
    }

    let mut classified = Vec::new();
    let mut unclassified = Vec::new();
    let (mut nleaf, mut nxleaf) = (0, 0);
    for &child in tree[index].children() {
        let child = &tree[child];
        nleaf += child.nleaf;
        nxleaf += child.nxleaf;
        if child.unclassified {
            unclassified.push(child.label.as_str());
        } else {
            classified.push(child.label.as_str());
        }
    }
    let label = if classified.is_empty() {
        branch_label(&unclassified)
    } else {
        branch_label(&classified)
    };

    let node = &mut tree[index];
    node.clear_annotation();
    node.tax_level = lineage::num_ranks(&label);
    node.label = label;
    node.nleaf = nleaf;
    node.nxleaf = nxleaf;
    node.unclassified = nleaf == 0;
}

fn branch_label(labels: &[&str]) -> String {
    match labels {
        [single] => lineage::strip_strain(single).to_string(),
        _ => lineage::common_lineage_all(labels),
    }
}

/// Number of taxa a node introduces below its parent.
///
/// This is the difference of the taxonomic levels, where the parent counts as
/// level 0 if the node is unclassified but the parent is not. For the root it
/// is its own level.
pub fn clade_count(tree: &TaxTree, index: NodeIndex) -> usize {
    let node = &tree[index];
    match node.parent() {
        None => node.tax_level,
        Some(parent) => {
            let parent = &tree[parent];
            let parent_level = if node.unclassified && !parent.unclassified {
                0
            } else {
                parent.tax_level
            };
            node.tax_level.saturating_sub(parent_level)
        }
    }
}

/// Whether a node is a clade: taxonomically deeper than its parent.
pub fn is_clade(tree: &TaxTree, index: NodeIndex) -> bool {
    clade_count(tree, index) > 0
}

/// Runs the full annotation on a rooted tree whose leaves carry lineages.
///
/// Rebuilds the taxon states from the leaves each time, so running it twice on
/// an unchanged tree gives identical labels, counts and states.
pub fn annotate_tree(tree: &mut TaxTree) -> Taxa {
    label_tree(tree);
    let mut taxa = Taxa::from_tree(tree);
    taxa.annotate(tree);
    taxa
}
