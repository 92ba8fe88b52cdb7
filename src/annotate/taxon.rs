use crate::annotate::clade_count;
use crate::lineage::{self, Lineage};
use crate::model::{NodeIndex, TaxTree};
use serde::Serialize;
use std::collections::BTreeMap;

// =#========================================================================#=
// TAXON STATE
// =#========================================================================#=
/// Agreement of one taxon with the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonState {
    /// Some branch holds all members of the taxon
    pub monophy: bool,
    /// Number of leaves in the taxon
    pub n_strain: usize,
    /// Member counts of the disjoint branches holding part of the taxon
    pub distract: Vec<usize>,
}

impl Default for TaxonState {
    fn default() -> Self {
        Self {
            monophy: false,
            n_strain: 1,
            distract: Vec::new(),
        }
    }
}

// =#========================================================================#=
// TAX SYS
// =#========================================================================#=
/// Taxon states of one set of leaves, keyed by lineage prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxSys {
    /// Number of leaves in the set
    pub n_strain: usize,
    /// State per taxon
    pub state: BTreeMap<String, TaxonState>,
}

impl TaxSys {
    /// Counts the members of every taxon named by a prefix of the given
    /// lineages (the strain segment excluded).
    pub fn new<S: AsRef<str>>(lineages: &[S]) -> Self {
        let mut state: BTreeMap<String, TaxonState> = BTreeMap::new();
        for lng in lineages {
            let mut taxa = lineage::prefixes(lng.as_ref());
            taxa.pop();
            for taxon in taxa {
                state
                    .entry(taxon.to_string())
                    .and_modify(|s| s.n_strain += 1)
                    .or_default();
            }
        }
        Self {
            n_strain: lineages.len(),
            state,
        }
    }

    /// State of a taxon, if any leaf belongs to it.
    pub fn get(&self, taxon: &str) -> Option<&TaxonState> {
        self.state.get(taxon)
    }

    /// Records a leaf. Returns the offset of its monophyletic tail.
    fn annotate_leaf(&mut self, clade: usize, label: &str) -> usize {
        let mut taxa = lineage::prefixes(label);
        taxa.pop();

        for i in 1..clade.min(taxa.len() + 1) {
            if let Some(state) = self.state.get_mut(taxa[taxa.len() - i]) {
                state.distract.push(1);
            }
        }
        self.mark_monophyletic(&taxa, 1)
    }

    /// Records an internal node holding `count` members of its taxa.
    /// Returns its taxon size and the offset of its monophyletic tail.
    fn annotate_branch(&mut self, count: usize, clade: usize, label: &str) -> (usize, usize) {
        if label.is_empty() {
            return (self.n_strain, 0);
        }
        let taxa = lineage::prefixes(label);

        for i in 1..=clade.min(taxa.len()) {
            if let Some(state) = self.state.get_mut(taxa[taxa.len() - i]) {
                state.distract.push(count);
            }
        }
        let tax_size = taxa
            .last()
            .and_then(|deepest| self.state.get(*deepest))
            .map_or(0, |s| s.n_strain);
        (tax_size, self.mark_monophyletic(&taxa, count))
    }

    /// Walks from the deepest taxon upwards, marking taxa with exactly `count`
    /// members as monophyletic, and stops at the first one with more.
    fn mark_monophyletic(&mut self, taxa: &[&str], count: usize) -> usize {
        for taxon in taxa.iter().rev() {
            match self.state.get_mut(*taxon) {
                Some(state) if state.n_strain == count => state.monophy = true,
                _ => return taxon.len(),
            }
        }
        0
    }
}

// =#========================================================================#=
// TAXA
// =#========================================================================#=
/// Taxon states of the leaves with (`def`) and without (`undef`) resolved
/// taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Taxa {
    /// Leaves with well-defined lineage
    pub def: TaxSys,
    /// Leaves with an unclassified rank
    pub undef: TaxSys,
}

impl Taxa {
    /// Builds the states from a list of lineages.
    pub fn new(lineages: &[Lineage]) -> Self {
        let (def, undef): (Vec<&Lineage>, Vec<&Lineage>) =
            lineages.iter().partition(|l| l.well_defined);
        let names = |list: Vec<&Lineage>| list.into_iter().map(|l| l.name.clone()).collect::<Vec<_>>();
        Self {
            def: TaxSys::new(&names(def)),
            undef: TaxSys::new(&names(undef)),
        }
    }

    /// Builds the states from the lineages at the leaves of `tree`.
    pub fn from_tree(tree: &TaxTree) -> Self {
        let lineages: Vec<Lineage> = tree
            .leaves()
            .into_iter()
            .map(|leaf| Lineage {
                name: tree[leaf].lineage.clone(),
                well_defined: !tree[leaf].unclassified,
            })
            .collect();
        Self::new(&lineages)
    }

    /// Records every node of a labelled tree in the taxon states and sets
    /// taxon size and monophyletic tail of each node.
    ///
    /// Leaves go first, then internal nodes bottom-up.
    pub fn annotate(&mut self, tree: &mut TaxTree) {
        for leaf in tree.leaves() {
            let clade = clade_count(tree, leaf);
            let node = &tree[leaf];
            let sys = if node.unclassified { &mut self.undef } else { &mut self.def };
            let mono_prefix = sys.annotate_leaf(clade, &node.label);

            let node = &mut tree[leaf];
            node.tax_size = 1;
            node.mono_prefix = mono_prefix;
        }

        let branches: Vec<NodeIndex> = tree
            .post_order_iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.index())
            .collect();
        for branch in branches {
            let clade = clade_count(tree, branch);
            let node = &tree[branch];
            let (tax_size, mono_prefix) = if node.unclassified {
                self.undef.annotate_branch(node.nxleaf, clade, &node.label)
            } else {
                self.def.annotate_branch(node.nleaf, clade, &node.label)
            };

            let node = &mut tree[branch];
            node.tax_size = tax_size;
            node.mono_prefix = mono_prefix;
        }
    }
}
