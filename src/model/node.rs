//! Node of a taxonomy-annotated phylogenetic tree.

use crate::model::tree::NodeIndex;

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// A node of a [TaxTree](crate::model::TaxTree), leaf or internal.
///
/// Names are kept in three separate fields so that the passes working on a
/// tree never overwrite each other's input:
/// - `name`: display name as read from the tree text
/// - `lineage`: raw lineage string (leaves only, set by the lookup)
/// - `label`: consensus lineage computed by the annotator
///
/// # Invariants
/// - `index` is the position in the arena
/// - A leaf has no children, an internal node has at least two (exactly two
///   once the tree is rooted)
/// - `parent` is `None` exactly for the root and for detached nodes
/// - `unclassified` implies `nleaf == 0`
/// - `tax_level` equals the number of rank tags of `label`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// Index of this node in the tree arena
    pub(crate) index: NodeIndex,
    /// Display name read from the tree text
    pub name: String,
    /// Raw lineage of a leaf
    pub lineage: String,
    /// Consensus lineage
    pub label: String,
    /// Length of the branch to the parent
    pub branch_length: Option<f64>,
    /// Support value of the branch (bootstrap or similar)
    pub support: Option<f64>,
    /// Leaf-weighted average distance to the leaves below
    pub depth: f64,
    /// Descendant leaves with resolved taxonomy
    pub nleaf: usize,
    /// Descendant leaves without resolved taxonomy
    pub nxleaf: usize,
    /// Size of the taxon named by `label`
    pub tax_size: usize,
    /// Number of rank tags in `label`
    pub tax_level: usize,
    /// No descendant leaf has resolved taxonomy
    pub unclassified: bool,
    /// Stop point of the branch-length root search
    pub otu: bool,
    /// Byte offset in `label` where the monophyletic tail starts
    pub mono_prefix: usize,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) parent: Option<NodeIndex>,
}

impl Node {
    /// Creates a detached node.
    ///
    /// # Arguments
    /// * `index` - The index of this node in the tree (arena)
    /// * `name` - The display name, may be empty
    /// * `branch_length` - Length of the branch to the parent
    pub fn new(index: NodeIndex, name: String, branch_length: Option<f64>) -> Self {
        Self {
            index,
            name,
            branch_length,
            ..Default::default()
        }
    }

    /// Returns the index of this node in the arena.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Returns the children in order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Returns the parent index, `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Returns whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the total number of leaves below (or at) this node.
    ///
    /// Only meaningful once leaf counts have been computed.
    pub fn num_leaves(&self) -> usize {
        self.nleaf + self.nxleaf
    }

    /// Returns the monophyletic tail of the consensus label.
    ///
    /// This is the part of `label` after the last rank that is not
    /// monophyletic at this node; the full label if every rank is.
    pub fn display_label(&self) -> &str {
        self.label.get(self.mono_prefix..).unwrap_or_default()
    }

    /// Resets everything the annotator computes.
    pub(crate) fn clear_annotation(&mut self) {
        if !self.is_leaf() {
            self.label.clear();
        }
        self.nleaf = 0;
        self.nxleaf = 0;
        self.tax_size = 0;
        self.tax_level = 0;
        self.mono_prefix = 0;
    }
}
