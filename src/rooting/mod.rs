//! Rooting of unrooted trees.
//!
//! The [RootingEngine] tries its strategies in a fixed order until one
//! applies:
//! 1. An explicit outgroup leaf, if configured and present in the tree.
//! 2. Taxonomy: the smallest taxonomically coherent branch becomes the
//!    outgroup, optionally refined by branch lengths ([RootingEngine::rebalance]).
//! 3. Branch lengths alone, if no leaf has resolved taxonomy.
//! 4. Forcing the current root into two branches.
//!
//! Every strategy leaves a compacted tree whose root has exactly two children
//! when the tree has at least three leaves.

mod config;
pub mod criteria;
mod search;

pub use config::{Criterion, DEFAULT_LEAF_SPLIT_FRACTION, RootingConfig};

use crate::annotate::{self, label_tree};
use crate::error::{Result, TaxError};
use crate::lineage::{self, RankTable};
use crate::model::{NodeIndex, TaxTree};
use tracing::{debug, info, warn};

/// Outcome of one rooting strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rooting {
    /// The tree was rooted; holds the index of the new root.
    Applied(NodeIndex),
    /// The strategy does not apply to this tree and left it untouched.
    NotApplicable(String),
}

impl Rooting {
    /// Whether the strategy rooted the tree.
    pub fn is_applied(&self) -> bool {
        matches!(self, Rooting::Applied(_))
    }

    /// Index of the new root, if the strategy applied.
    pub fn root(&self) -> Option<NodeIndex> {
        match self {
            Rooting::Applied(root) => Some(*root),
            Rooting::NotApplicable(_) => None,
        }
    }
}

// =#========================================================================#=
// ROOTING ENGINE
// =#========================================================================#=
/// Places the root of a tree by outgroup, taxonomy or branch lengths.
///
/// # Example
/// ```
/// use taxwick::newick::parse_str;
/// use taxwick::rooting::{RootingConfig, RootingEngine};
///
/// let mut tree = parse_str("(A:1,B:1,(C:1,D:1):1);").unwrap();
/// let engine = RootingEngine::new(RootingConfig::default().with_outgroup("A"));
///
/// let root = engine.root(&mut tree).unwrap();
/// assert_eq!(tree[root].children().len(), 2);
/// assert_eq!(tree[tree[root].children()[0]].name, "A");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RootingEngine {
    config: RootingConfig,
    ranks: RankTable,
}

// ============================================================================
// New, Getters (pub)
// ============================================================================
impl RootingEngine {
    /// Creates an engine with the given settings and the default rank table.
    pub fn new(config: RootingConfig) -> Self {
        Self {
            config,
            ranks: RankTable::default(),
        }
    }

    /// Uses `ranks` to resolve the configured boundary rank.
    pub fn with_ranks(mut self, ranks: RankTable) -> Self {
        self.ranks = ranks;
        self
    }

    /// Settings of this engine.
    pub fn config(&self) -> &RootingConfig {
        &self.config
    }
}

// ============================================================================
// Strategies (pub)
// ============================================================================
impl RootingEngine {
    /// Roots a tree with the first applicable strategy.
    ///
    /// Trees whose root already has two children are kept as they are.
    ///
    /// # Returns
    /// The index of the root.
    ///
    /// # Errors
    /// Returns [TaxError::InvalidTree] if the tree has no root.
    pub fn root(&self, tree: &mut TaxTree) -> Result<NodeIndex> {
        if !tree.is_root_set() {
            return Err(TaxError::InvalidTree("tree has no root".to_string()));
        }
        if tree.is_rooted() {
            info!("Tree is already rooted");
            return Ok(tree.root_index());
        }

        if let Some(name) = &self.config.outgroup {
            match self.root_by_outgroup(tree, name) {
                Rooting::Applied(root) => return Ok(root),
                Rooting::NotApplicable(reason) => warn!("{}", reason),
            }
        }
        match self.root_by_taxonomy(tree) {
            Rooting::Applied(root) => return Ok(root),
            Rooting::NotApplicable(reason) => info!("{}", reason),
        }
        match self.root_by_length(tree) {
            Rooting::Applied(root) => return Ok(root),
            Rooting::NotApplicable(reason) => info!("{}", reason),
        }
        match self.force_root(tree) {
            Rooting::Applied(root) => Ok(root),
            Rooting::NotApplicable(reason) => Err(TaxError::InvalidTree(reason)),
        }
    }

    /// Roots the tree on the branch above the leaf called `name`.
    ///
    /// The name may carry quotes or the `|` monophyly mark; it matches a leaf's
    /// display name or the deepest name of its lineage. The first matching leaf
    /// in pre-order wins. An existing binary root is removed first.
    ///
    /// # Returns
    /// [Rooting::NotApplicable] with the tree untouched if no leaf matches.
    pub fn root_by_outgroup(&self, tree: &mut TaxTree, name: &str) -> Rooting {
        let target: String = name
            .chars()
            .filter(|c| !matches!(c, '|' | '\'' | '"'))
            .collect();
        let target = target.trim();

        let matches: Vec<NodeIndex> = tree
            .leaves()
            .into_iter()
            .filter(|&leaf| {
                let node = &tree[leaf];
                node.name == target
                    || (!node.lineage.is_empty() && lineage::last_name_no_rank(&node.lineage) == target)
            })
            .collect();
        let Some(&outgroup) = matches.first() else {
            return Rooting::NotApplicable(format!("Outgroup {:?} not found in tree", name));
        };
        if matches.len() > 1 {
            warn!("Outgroup {:?} matches {} leaves, using the first", name, matches.len());
        }

        info!("Rooting at outgroup {:?}", target);
        if tree.is_rooted() {
            tree.unroot();
        }
        tree.reroot_at(outgroup);
        tree.force_root(self.config.leaf_split_fraction);
        label_tree(tree);
        tree.compact();
        Rooting::Applied(tree.root_index())
    }

    /// Roots the tree at the smallest taxonomically coherent branch.
    ///
    /// Branches qualify if they are leaves or clades (deeper than their
    /// parent), or if all their children qualify, in which case the children
    /// become outgroup candidates. The candidate with the fewest leaves is the
    /// outgroup (the first one on ties). After rerooting above it, the branch
    /// at the new root that diverges most from the outgroup's former
    /// grandparent is split off as the second root branch. Branch lengths then
    /// refine the position if rebalancing is enabled.
    ///
    /// # Returns
    /// [Rooting::NotApplicable] with the tree untouched if the root has fewer
    /// than two children or no leaf has resolved taxonomy.
    pub fn root_by_taxonomy(&self, tree: &mut TaxTree) -> Rooting {
        if !tree.is_root_set() || tree.root().children().len() < 2 {
            return Rooting::NotApplicable("Too few branches at the root".to_string());
        }
        let resolved = tree.leaves().into_iter().any(|leaf| {
            let node = &tree[leaf];
            !node.unclassified && node.lineage.contains(lineage::TAG_OPEN)
        });
        if !resolved {
            return Rooting::NotApplicable("No leaf with resolved taxonomy".to_string());
        }
        label_tree(tree);
        if tree.is_rooted() {
            tree.unroot();
            label_tree(tree);
        }

        let mut candidates = Vec::new();
        for &child in tree.root().children() {
            collect_outgroups(tree, child, &mut candidates);
        }
        debug!("{} outgroup candidates", candidates.len());

        let outgroup = candidates.iter().copied().min_by_key(|&i| tree[i].num_leaves());
        if let Some(outgroup) = outgroup {
            info!(
                "Rooting at taxonomy {:?} with {} leaves",
                tree[outgroup].label,
                tree[outgroup].num_leaves()
            );
            let grandparent = tree[outgroup].parent().and_then(|p| tree[p].parent());
            let root = tree.reroot_at(outgroup);
            label_tree(tree);
            if let Some(grandparent) = grandparent {
                split_most_divergent(tree, root, grandparent, outgroup);
            }
        }
        tree.force_root(self.config.leaf_split_fraction);
        label_tree(tree);
        tree.compact();

        if self.config.rebalance {
            if let Rooting::NotApplicable(reason) = self.rebalance(tree) {
                warn!("{}", reason);
            }
        }
        Rooting::Applied(tree.root_index())
    }

    /// Moves a binary root to the best position by branch lengths, searching
    /// only internal nodes above the boundary level.
    ///
    /// The boundary is the level of the configured `boundary_rank` among the
    /// output ranks, or one level below the root's consensus. Nodes at the
    /// boundary are marked as operational taxonomic units.
    ///
    /// # Returns
    /// [Rooting::NotApplicable] if the root is not binary.
    pub fn rebalance(&self, tree: &mut TaxTree) -> Rooting {
        if !tree.is_rooted() {
            return Rooting::NotApplicable("Root is not binary, cannot rebalance".to_string());
        }
        label_tree(tree);
        let boundary = self.boundary_level(tree.root().tax_level + 1);
        let candidates = search::bounded_candidates(tree, boundary);
        debug!("Rebalancing over {} candidates with boundary {}", candidates.len(), boundary);

        if search::search_root(tree, &candidates, self.config.criterion, self.config.leaf_split_fraction) {
            info!("Root moved by {} criterion", self.config.criterion);
        }
        label_tree(tree);
        Rooting::Applied(tree.root_index())
    }

    /// Roots the tree by branch lengths alone, trying every branch.
    ///
    /// # Returns
    /// [Rooting::NotApplicable] if the tree has fewer than three leaves.
    pub fn root_by_length(&self, tree: &mut TaxTree) -> Rooting {
        if tree.num_leaves() < 3 {
            return Rooting::NotApplicable("Too few leaves to root by branch lengths".to_string());
        }
        if !tree.is_rooted() {
            tree.force_root(self.config.leaf_split_fraction);
        }
        let candidates = tree.descendants();
        info!(
            "Rooting by {} criterion over {} branches",
            self.config.criterion,
            candidates.len()
        );
        search::search_root(tree, &candidates, self.config.criterion, self.config.leaf_split_fraction);
        label_tree(tree);
        Rooting::Applied(tree.root_index())
    }

    /// Splits the last child off a multifurcating root.
    ///
    /// # Returns
    /// [Rooting::NotApplicable] if the tree has no root.
    pub fn force_root(&self, tree: &mut TaxTree) -> Rooting {
        if !tree.is_root_set() {
            return Rooting::NotApplicable("Tree has no root".to_string());
        }
        tree.force_root(self.config.leaf_split_fraction);
        label_tree(tree);
        tree.compact();
        Rooting::Applied(tree.root_index())
    }
}

// ============================================================================
// Helpers (private)
// ============================================================================
impl RootingEngine {
    /// Taxonomic level of the configured boundary rank, or `default` if none is
    /// set or the symbol is not an output rank.
    fn boundary_level(&self, default: usize) -> usize {
        let Some(symbol) = self.config.boundary_rank else {
            return default;
        };
        match self.ranks.rank_index(symbol) {
            Some(index) => index + 1,
            None => {
                warn!("Boundary rank {:?} is not an output rank, using level {}", symbol, default);
                default
            }
        }
    }
}

/// Whether the branch at `index` is taxonomically coherent; pushes the
/// children of coherent non-clade branches to `candidates`.
fn collect_outgroups(tree: &TaxTree, index: NodeIndex, candidates: &mut Vec<NodeIndex>) -> bool {
    let node = &tree[index];
    if node.unclassified {
        return false;
    }
    if node.is_leaf() || annotate::is_clade(tree, index) {
        return true;
    }

    let mut coherent = true;
    for &child in node.children() {
        coherent &= collect_outgroups(tree, child, candidates);
    }
    if coherent {
        candidates.extend_from_slice(node.children());
    }
    coherent
}

/// Moves the root child sharing the fewest ranks with `reference` to the last
/// position. The outgroup holds that position unless another child is strictly
/// more divergent, or equally divergent on a longer branch.
fn split_most_divergent(tree: &mut TaxTree, root: NodeIndex, reference: NodeIndex, outgroup: NodeIndex) {
    let divergence = |tree: &TaxTree, index: NodeIndex| {
        let common = lineage::common_lineage(&tree[reference].label, &tree[index].label);
        (lineage::num_ranks(&common), tree[index].branch_length.unwrap_or(0.0))
    };

    let mut best = outgroup;
    let (mut best_level, mut best_length) = divergence(tree, outgroup);
    for &child in tree[root].children() {
        if child == outgroup || child == reference {
            continue;
        }
        let (level, length) = divergence(tree, child);
        if level < best_level || (level == best_level && length > best_length) {
            best = child;
            best_level = level;
            best_length = length;
        }
    }

    if best != outgroup {
        debug!("Splitting off {:?} instead of the outgroup", tree[best].label);
        let children = &mut tree[root].children;
        if let Some(pos) = children.iter().position(|&c| c == best) {
            let last = children.len() - 1;
            children.swap(pos, last);
        }
    }
}
