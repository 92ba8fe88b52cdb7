//! Branch-length search over candidate root positions.

use crate::model::{NodeIndex, TaxTree};
use crate::rooting::Criterion;
use crate::rooting::criteria::{self, Evaluation, Split};
use tracing::debug;

/// Internal nodes below the root down to the boundary level.
///
/// Descends from the root's children and stops at nodes whose taxonomic level
/// reaches `boundary` or that hold at most one resolved leaf; those are
/// collected and marked as operational taxonomic units. Clears the mark on
/// every other node. Leaves are never candidates.
pub(crate) fn bounded_candidates(tree: &mut TaxTree, boundary: usize) -> Vec<NodeIndex> {
    for index in tree.descendants() {
        tree[index].otu = false;
    }

    let mut candidates = Vec::new();
    let mut stack: Vec<NodeIndex> = tree.root().children().iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        let node = &tree[index];
        if node.is_leaf() {
            continue;
        }
        candidates.push(index);
        if node.tax_level >= boundary || node.nleaf <= 1 {
            tree[index].otu = true;
            continue;
        }
        stack.extend(node.children().iter().rev());
    }
    candidates
}

/// Scores the current root of a binary-rooted tree.
///
/// Returns `None` if the root is not binary.
pub(crate) fn evaluate_root(tree: &mut TaxTree, criterion: Criterion) -> Option<Evaluation> {
    let &[top_a, top_b] = tree.root().children() else {
        return None;
    };
    tree.update_depths();

    let a = tree.leaf_distances(top_a);
    let b = tree.leaf_distances(top_b);
    let total = tree[top_a].branch_length.unwrap_or(0.0) + tree[top_b].branch_length.unwrap_or(0.0);
    let split = Split {
        a: &a,
        b: &b,
        depth_a: tree[top_a].depth,
        depth_b: tree[top_b].depth,
        total,
    };
    Some(criteria::evaluate(criterion, &split))
}

/// Moves the root of a binary-rooted tree to the best scoring candidate branch.
///
/// Every candidate is tried on a copy: the root is removed, the tree is
/// rerooted above the candidate and made binary again. The current root is the
/// baseline; a candidate replaces it only on strict improvement, so ties keep
/// the earlier position. The two root branches of the winner get the lengths
/// placing the root, and the tree is compacted.
///
/// # Returns
/// Whether the root moved.
pub(crate) fn search_root(
    tree: &mut TaxTree,
    candidates: &[NodeIndex],
    criterion: Criterion,
    leaf_fraction: f64,
) -> bool {
    let Some(mut best) = evaluate_root(tree, criterion) else {
        return false;
    };
    debug!("Baseline root scores {:?} with {}", best.score, criterion);

    let mut winner: Option<TaxTree> = None;
    for &candidate in candidates {
        let mut trial = tree.clone();
        let top = trial.unroot();
        if candidate == top || trial.is_rooted() {
            continue;
        }
        trial.reroot_at(candidate);
        trial.force_root(leaf_fraction);

        let Some(evaluation) = evaluate_root(&mut trial, criterion) else {
            continue;
        };
        debug!("Candidate {} scores {:?}", candidate, evaluation.score);
        if evaluation.is_better_than(&best) {
            best = evaluation;
            winner = Some(trial);
        }
    }

    let moved = winner.is_some();
    if let Some(trial) = winner {
        *tree = trial;
    }
    let root = tree.root_index();
    if let &[top_a, top_b] = tree[root].children() {
        tree[top_a].branch_length = Some(best.length_a);
        tree[top_b].branch_length = Some(best.length_b);
    }
    tree.compact();
    moved
}
