//! Lineage lookup seam and resolution of leaf names into formatted lineages.

use crate::error::{Result, TaxError};
use crate::lineage::{Lineage, RankTable};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Source of lineage strings for leaf display names.
///
/// How the lineages are stored is up to the implementor; a plain map from leaf
/// name to lineage string is provided.
pub trait LineageLookup {
    /// Lineage string for a leaf name, if known.
    fn lookup(&self, name: &str) -> Option<String>;
}

impl LineageLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl LineageLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolves leaf names to formatted, unique lineages.
///
/// Every name is looked up; a hit without strain segment gets `<T>name`
/// appended, a miss keeps the bare name (which formats to an all-unclassified
/// lineage). Results are normalized with [RankTable::format] and repeated
/// lineages are renamed with [check_repeats].
///
/// # Errors
/// Returns [TaxError::EmptyLookup] if `names` is empty.
pub fn resolve_lineages<L: LineageLookup + ?Sized>(
    names: &[String],
    lookup: &L,
    ranks: &RankTable,
) -> Result<Vec<Lineage>> {
    if names.is_empty() {
        return Err(TaxError::EmptyLookup);
    }

    let mut hits = 0;
    let mut lineages: Vec<String> = names
        .iter()
        .map(|name| match lookup.lookup(name) {
            Some(found) => {
                hits += 1;
                ranks.format(&RankTable::with_strain(&found, name))
            }
            None => ranks.format(name),
        })
        .collect();
    info!("Found lineages for {}/{} leaves", hits, names.len());

    check_repeats(&mut lineages);
    Ok(lineages.into_iter().map(Lineage::new).collect())
}

/// Renames repeated lineages: the second occurrence of `x` becomes
/// `x.repeat-2`, the third `x.repeat-3` and so on.
pub fn check_repeats(lineages: &mut [String]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for lineage in lineages.iter_mut() {
        let count = seen.entry(lineage.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            info!("Repeat strain: {}", lineage);
            lineage.push_str(&format!(".repeat-{}", count));
        }
    }
}
