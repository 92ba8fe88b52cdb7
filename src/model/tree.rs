//! Tree module for taxonomy-annotated phylogenetic trees.
//!
//! This module provides the arena-based [TaxTree] with:
//! - construction from the bottom up (used by the readers),
//! - the traversal primitives used by every pass (leaves, internal nodes,
//!   descendants; all in a fixed pre-order),
//! - structural edits expressed as batches of [LinkChange]s,
//! - the root moves used by the rooting engine (reroot, force-root, unroot).

use crate::error::{Result, TaxError};
use crate::lineage::Lineage;
use crate::model::node::Node;

/// Index of a node in a tree (arena).
pub type NodeIndex = usize;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: NodeIndex = usize::MAX;

// =#========================================================================#=
// LINK CHANGE
// =#========================================================================#=
/// One edit of a parent/child link.
///
/// Each change updates the child list of `parent` together with the parent
/// reference of `child`, so a node never points to a parent that does not
/// list it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    /// Removes `child` from the children of `parent`.
    Detach {
        /// Current parent
        parent: NodeIndex,
        /// Node to detach
        child: NodeIndex,
    },
    /// Appends `child` to the children of `parent`.
    Attach {
        /// New parent
        parent: NodeIndex,
        /// Node to attach, must be detached
        child: NodeIndex,
    },
}

// =#========================================================================#=
// TAX TREE
// =#========================================================================#=
/// A multifurcating phylogenetic tree represented using the arena pattern on [Node].
///
/// # Structure
/// - All nodes are stored in the arena and referenced by [NodeIndex]
/// - Index of root is maintained; the root has no parent
/// - Root moves may leave detached nodes in the arena; they are unreachable
///   from the root and dropped by [TaxTree::compact]
///
/// # Example
/// ```
/// use taxwick::model::TaxTree;
///
/// // ((A:1,B:1):0.5,C:2);
/// let mut tree = TaxTree::new();
/// let a = tree.add_node("A".into(), Some(1.0));
/// let b = tree.add_node("B".into(), Some(1.0));
/// let ab = tree.add_node(String::new(), Some(0.5));
/// tree.attach_child(ab, a);
/// tree.attach_child(ab, b);
/// let c = tree.add_node("C".into(), Some(2.0));
/// let root = tree.add_node(String::new(), None);
/// tree.attach_child(root, ab);
/// tree.attach_child(root, c);
/// tree.set_root(root);
///
/// assert!(tree.is_valid());
/// assert!(tree.is_rooted());
/// assert_eq!(tree.leaf_names(), vec!["A", "B", "C"]);
/// ```
#[derive(Debug, Clone)]
pub struct TaxTree {
    /// Nodes of this tree (arena pattern)
    nodes: Vec<Node>,
    /// Index of the root of this tree
    root: NodeIndex,
}

impl Default for TaxTree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl TaxTree {
    /// Creates an empty tree without root.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NO_ROOT_SET_INDEX,
        }
    }

    /// Adds a detached node, returning its index.
    pub fn add_node(&mut self, name: String, branch_length: Option<f64>) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(Node::new(index, name, branch_length));
        index
    }

    /// Appends `child` to the children of `parent` and sets its parent.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn attach_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.apply_links(&[LinkChange::Attach { parent, child }]);
    }

    /// Removes `child` from the children of `parent` and clears its parent.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn detach_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.apply_links(&[LinkChange::Detach { parent, child }]);
    }

    /// Applies a batch of link changes in order.
    pub fn apply_links(&mut self, changes: &[LinkChange]) {
        for change in changes {
            match *change {
                LinkChange::Detach { parent, child } => {
                    self.nodes[parent].children.retain(|&c| c != child);
                    self.nodes[child].parent = None;
                }
                LinkChange::Attach { parent, child } => {
                    self.nodes[parent].children.push(child);
                    self.nodes[child].parent = Some(parent);
                }
            }
        }
    }

    /// Sets the root of this tree.
    pub fn set_root(&mut self, root: NodeIndex) {
        self.root = root;
    }

    /// Returns whether root of tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root != NO_ROOT_SET_INDEX
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    /// Returns a reference to the root node.
    ///
    /// # Panics
    /// Panics if the root hasn't been set.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    /// Returns a reference to the node at the given index.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    /// Returns a mutable reference to the node at the given index.
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index]
    }

    /// Returns whether the root has exactly two children.
    pub fn is_rooted(&self) -> bool {
        self.is_root_set() && self.root().children.len() == 2
    }

    /// Returns the number of leaves reachable from the root.
    pub fn num_leaves(&self) -> usize {
        self.pre_order_iter().filter(|n| n.is_leaf()).count()
    }

    /// Returns the number of nodes reachable from the root.
    pub fn num_nodes(&self) -> usize {
        self.pre_order_iter().count()
    }

    /// Returns all leaves in pre-order.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.pre_order_iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.index)
            .collect()
    }

    /// Returns all internal (non-leaf) nodes in pre-order, root first.
    pub fn internal_nodes(&self) -> Vec<NodeIndex> {
        self.pre_order_iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.index)
            .collect()
    }

    /// Returns all nodes except the root in pre-order.
    pub fn descendants(&self) -> Vec<NodeIndex> {
        self.pre_order_iter().skip(1).map(|n| n.index).collect()
    }

    /// Returns all nodes below `index` (excluding it) in pre-order.
    pub fn descendants_of(&self, index: NodeIndex) -> Vec<NodeIndex> {
        PreOrderIter::from(self, index).skip(1).map(|n| n.index).collect()
    }

    /// Returns the display names of all leaves in pre-order.
    pub fn leaf_names(&self) -> Vec<String> {
        self.pre_order_iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.name.clone())
            .collect()
    }

    /// Returns the ancestors of `index`, from its parent up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.nodes[parent].parent;
        }
        chain
    }

    /// Attaches lineages to the leaves, in pre-order.
    ///
    /// Sets the raw lineage and the initial consensus label of each leaf;
    /// leaves whose lineage is not well defined become unclassified.
    ///
    /// # Errors
    /// Returns [TaxError::LineageCount] if the number of lineages differs from
    /// the number of leaves.
    pub fn set_leaf_lineages(&mut self, lineages: &[Lineage]) -> Result<()> {
        let leaves = self.leaves();
        if leaves.len() != lineages.len() {
            return Err(TaxError::LineageCount {
                expected: leaves.len(),
                actual: lineages.len(),
            });
        }

        for (leaf, lineage) in leaves.into_iter().zip(lineages) {
            let node = &mut self.nodes[leaf];
            node.lineage = lineage.name.clone();
            node.label = lineage.name.clone();
            node.unclassified = !lineage.well_defined;
            node.nleaf = usize::from(lineage.well_defined);
            node.nxleaf = usize::from(!lineage.well_defined);
        }
        Ok(())
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is valid and the root has no parent
    /// - All reachable node indices match their position in the arena
    /// - Every child points back to its parent and is visited once
    /// - Every internal node has at least two children
    pub fn is_valid(&self) -> bool {
        if self.root >= self.nodes.len() || self.nodes[self.root].parent.is_some() {
            return false;
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            if seen[index] {
                return false;
            }
            seen[index] = true;

            let node = &self.nodes[index];
            if node.index != index || node.children.len() == 1 {
                return false;
            }
            for &child in &node.children {
                if child >= self.nodes.len() || self.nodes[child].parent != Some(index) {
                    return false;
                }
                stack.push(child);
            }
        }
        true
    }
}

impl std::ops::Index<NodeIndex> for TaxTree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl std::ops::IndexMut<NodeIndex> for TaxTree {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

// ============================================================================
// Root moves (pub)
// ============================================================================
impl TaxTree {
    /// Moves the root to the parent of `target`.
    ///
    /// Every edge on the path from `target` up to the current root is reversed:
    /// the former ancestor becomes a child of the node below it and takes over
    /// that node's branch length. The new root loses its branch length and
    /// `target` becomes its *last* child.
    ///
    /// # Returns
    /// The index of the new root (unchanged if `target` is the root).
    pub fn reroot_at(&mut self, target: NodeIndex) -> NodeIndex {
        let chain = self.ancestors(target);
        let Some(&new_root) = chain.first() else {
            return self.root;
        };

        let mut changes = Vec::with_capacity(2 * chain.len());
        for pair in chain.windows(2).rev() {
            let (lower, upper) = (pair[0], pair[1]);
            self.nodes[upper].branch_length = self.nodes[lower].branch_length;
            self.nodes[lower].branch_length = None;
            changes.push(LinkChange::Detach { parent: upper, child: lower });
            changes.push(LinkChange::Attach { parent: lower, child: upper });
        }
        self.apply_links(&changes);
        self.nodes[new_root].branch_length = None;
        self.root = new_root;

        let children = &mut self.nodes[new_root].children;
        if let Some(pos) = children.iter().position(|&c| c == target) {
            let last = children.len() - 1;
            children.swap(pos, last);
        }
        new_root
    }

    /// Turns a multifurcating root into a binary one.
    ///
    /// No-op if the root has at most two children. Otherwise a new root gets
    /// two children: the last child of the old root (the outgroup) and the old
    /// root with its remaining children. The outgroup branch length is split
    /// between the two new branches: a leaf outgroup hands the fraction
    /// `leaf_fraction` of it to the other side, an internal one splits it evenly.
    ///
    /// # Returns
    /// The index of the (possibly new) root.
    pub fn force_root(&mut self, leaf_fraction: f64) -> NodeIndex {
        let root = self.root;
        if self.nodes[root].children.len() <= 2 {
            return root;
        }
        let Some(&outgroup) = self.nodes[root].children.last() else {
            return root;
        };

        let (outgroup_length, rest_length) = match self.nodes[outgroup].branch_length {
            Some(length) if self.nodes[outgroup].is_leaf() => {
                (Some(length * (1.0 - leaf_fraction)), Some(length * leaf_fraction))
            }
            Some(length) => (Some(length / 2.0), Some(length / 2.0)),
            None => (None, None),
        };

        let new_root = self.add_node(String::new(), None);
        self.apply_links(&[
            LinkChange::Detach { parent: root, child: outgroup },
            LinkChange::Attach { parent: new_root, child: outgroup },
            LinkChange::Attach { parent: new_root, child: root },
        ]);
        self.nodes[outgroup].branch_length = outgroup_length;
        self.nodes[root].branch_length = rest_length;
        self.root = new_root;
        new_root
    }

    /// Removes a binary root by merging its two branches.
    ///
    /// An internal child of the root becomes the new root and the other child
    /// hangs below it (as last child) with the summed branch length. No-op if
    /// the root is not binary or both of its children are leaves.
    ///
    /// # Returns
    /// The index of the (possibly new) root.
    pub fn unroot(&mut self) -> NodeIndex {
        let root = self.root;
        let [first, second] = self.nodes[root].children[..] else {
            return root;
        };
        let (keep, other) = if !self.nodes[first].is_leaf() {
            (first, second)
        } else if !self.nodes[second].is_leaf() {
            (second, first)
        } else {
            return root;
        };

        let merged = match (self.nodes[keep].branch_length, self.nodes[other].branch_length) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        };
        self.apply_links(&[
            LinkChange::Detach { parent: root, child: keep },
            LinkChange::Detach { parent: root, child: other },
            LinkChange::Attach { parent: keep, child: other },
        ]);
        self.nodes[other].branch_length = merged;
        self.nodes[keep].branch_length = None;
        self.root = keep;
        keep
    }

    /// Renumbers the arena in pre-order from the root, dropping detached nodes.
    ///
    /// Invalidates every [NodeIndex] held outside the tree.
    pub fn compact(&mut self) {
        let order: Vec<NodeIndex> = self.pre_order_iter().map(|n| n.index).collect();
        let mut new_index = vec![NO_ROOT_SET_INDEX; self.nodes.len()];
        for (new, &old) in order.iter().enumerate() {
            new_index[old] = new;
        }

        let mut nodes = Vec::with_capacity(order.len());
        for &old in &order {
            let mut node = std::mem::take(&mut self.nodes[old]);
            node.index = new_index[old];
            node.parent = node.parent.map(|p| new_index[p]);
            for child in node.children.iter_mut() {
                *child = new_index[*child];
            }
            nodes.push(node);
        }
        self.nodes = nodes;
        self.root = 0;
    }

    /// Computes `depth` of every node: the leaf-weighted average distance to
    /// the leaves below (0 for leaves). Unset branch lengths count as 0.
    pub fn update_depths(&mut self) {
        let order: Vec<NodeIndex> = self.post_order_iter().map(|n| n.index).collect();
        let mut leaf_counts = vec![0usize; self.nodes.len()];

        for index in order {
            if self.nodes[index].is_leaf() {
                leaf_counts[index] = 1;
                self.nodes[index].depth = 0.0;
                continue;
            }
            let mut count = 0;
            let mut weighted = 0.0;
            for &child in &self.nodes[index].children {
                let child_node = &self.nodes[child];
                count += leaf_counts[child];
                weighted += leaf_counts[child] as f64
                    * (child_node.depth + child_node.branch_length.unwrap_or(0.0));
            }
            leaf_counts[index] = count;
            self.nodes[index].depth = weighted / count as f64;
        }
    }

    /// Returns the distance from `top` down to each leaf below it, in
    /// pre-order. Unset branch lengths count as 0.
    pub fn leaf_distances(&self, top: NodeIndex) -> Vec<f64> {
        let mut distances = Vec::new();
        let mut stack = vec![(top, 0.0)];
        while let Some((index, distance)) = stack.pop() {
            let node = &self.nodes[index];
            if node.is_leaf() {
                distances.push(distance);
                continue;
            }
            for &child in node.children.iter().rev() {
                let length = self.nodes[child].branch_length.unwrap_or(0.0);
                stack.push((child, distance + length));
            }
        }
        distances
    }
}

// ============================================================================
// Iterators (pub)
// ============================================================================
impl TaxTree {
    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before children,
    /// children in order).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::from(self, self.root)
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator for post-order traversal (children before parents).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
pub struct PostOrderIter<'a> {
    tree: &'a TaxTree,
    stack: Vec<(NodeIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a TaxTree) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push((tree.root, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let node = &self.tree[index];

            if children_visited || node.is_leaf() {
                return Some(node);
            }
            self.stack.push((index, true));
            // Push children in reverse, so the first child is processed first
            for &child in node.children.iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
pub struct PreOrderIter<'a> {
    tree: &'a TaxTree,
    stack: Vec<NodeIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn from(tree: &'a TaxTree, start: NodeIndex) -> Self {
        let mut stack = Vec::new();
        if start < tree.nodes.len() {
            stack.push(start);
        }
        PreOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let node = &self.tree[index];
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
