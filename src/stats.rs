//! Agreement statistics of an annotated tree with the taxonomy.
//!
//! For every output rank, [Statistics] counts the taxa with a single leaf
//! (solo), the monophyletic ones and all of them, and compares two entropies
//! over the leaves with resolved taxonomy:
//!
//! ```text
//! S = log2 N - Σ n log2 n / N
//! ```
//!
//! `s_tax` sums over taxon sizes, `s_tree` over the member counts of the
//! branches each taxon is split into. Equal values mean the tree splits no
//! taxon of that rank. Solo taxa contribute to neither sum.

use crate::annotate::Taxa;
use crate::lineage::{self, RankTable};
use crate::model::TaxTree;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Label of the extra line for the strain level.
pub const STRAIN_LINE: &str = "Strain";

/// Figures of one rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankStats {
    /// Rank name, or [STRAIN_LINE]
    pub rank: String,
    /// Taxa with a single leaf
    pub n_solo: usize,
    /// Monophyletic taxa with more than one leaf
    pub n_mono: usize,
    /// All taxa
    pub n_total: usize,
    /// Entropy of the taxonomy
    pub s_tax: f64,
    /// Entropy of the taxonomy as split by the tree
    pub s_tree: f64,
}

/// Figures per output rank and for the strain level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// One entry per output rank, shallowest first
    pub ranks: Vec<RankStats>,
    /// Every leaf as its own taxon
    pub strain: RankStats,
}

#[derive(Default)]
struct Sums {
    n_solo: usize,
    n_mono: usize,
    n_poly: usize,
    s_tax: f64,
    s_tree: f64,
}

impl Statistics {
    /// Computes the statistics of the resolved taxa of an annotated tree.
    ///
    /// # Arguments
    /// * `taxa` - Taxon states after annotation
    /// * `ranks` - Rank table naming the output ranks
    pub fn new(taxa: &Taxa, ranks: &RankTable) -> Self {
        let mut sums: HashMap<char, Sums> = HashMap::new();
        for (taxon, state) in &taxa.def.state {
            let Some(symbol) = lineage::last_name(taxon).chars().nth(1) else {
                continue;
            };
            let sum = sums.entry(symbol).or_default();
            if state.n_strain == 1 {
                sum.n_solo += 1;
                continue;
            }
            if state.monophy {
                sum.n_mono += 1;
            } else {
                sum.n_poly += 1;
            }
            sum.s_tax += x_log2_x(state.n_strain);
            sum.s_tree += state.distract.iter().map(|&n| x_log2_x(n)).sum::<f64>();
        }

        let n = taxa.def.n_strain;
        let max_entropy = if n == 0 { 0.0 } else { (n as f64).log2() };
        let entropy = |sum: f64| if n == 0 { 0.0 } else { max_entropy - sum / n as f64 };

        let ranks = ranks
            .output_ranks()
            .iter()
            .map(|(name, symbol)| {
                let sum = sums.remove(symbol).unwrap_or_default();
                RankStats {
                    rank: name.clone(),
                    n_solo: sum.n_solo,
                    n_mono: sum.n_mono,
                    n_total: sum.n_solo + sum.n_mono + sum.n_poly,
                    s_tax: entropy(sum.s_tax),
                    s_tree: entropy(sum.s_tree),
                }
            })
            .collect();

        Self {
            ranks,
            strain: RankStats {
                rank: STRAIN_LINE.to_string(),
                n_solo: n,
                n_mono: 0,
                n_total: n,
                s_tax: max_entropy,
                s_tree: max_entropy,
            },
        }
    }
}

fn x_log2_x(n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        n as f64 * (n as f64).log2()
    }
}

/// Tab-separated table: rank, solo, monophyletic, total, `s_tax`, `s_tree`.
impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.ranks.iter().chain(std::iter::once(&self.strain)) {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{:.5}\t{:.5}",
                line.rank, line.n_solo, line.n_mono, line.n_total, line.s_tax, line.s_tree
            )?;
        }
        Ok(())
    }
}

/// Predicted placement of a leaf without resolved taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    /// Display name of the leaf
    pub leaf: String,
    /// Consensus label of the nearest ancestor holding its whole taxon
    pub label: String,
}

/// Predicts a taxonomy for every unclassified leaf of an annotated tree.
///
/// Each such leaf gets the label of its nearest ancestor whose leaf count
/// equals its taxon size, or the root's label if there is none. Leaves are
/// listed in pre-order.
pub fn predict_unclassified(tree: &TaxTree) -> Vec<Prediction> {
    tree.leaves()
        .into_iter()
        .filter(|&leaf| tree[leaf].unclassified)
        .map(|leaf| {
            let ancestors = tree.ancestors(leaf);
            let holder = ancestors
                .iter()
                .copied()
                .find(|&a| tree[a].nleaf == tree[a].tax_size)
                .or(ancestors.last().copied())
                .unwrap_or(leaf);
            Prediction {
                leaf: tree[leaf].name.clone(),
                label: tree[holder].label.clone(),
            }
        })
        .collect()
}
