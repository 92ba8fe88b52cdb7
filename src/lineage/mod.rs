//! Encoding of taxonomic paths as tagged lineage strings.
//!
//! A lineage string is a sequence of segments `<R>name`, where `R` is a
//! one-letter rank symbol, ordered from the shallowest to the deepest rank and
//! terminated by a strain segment `<T>name`:
//!
//! ```text
//! <D>Bacteria<K>Bacteria<P>Proteobacteria<C>Gammaproteobacteria<T>K-12
//! ```
//!
//! Missing ranks carry the placeholder name [UNCLASSIFIED]. All functions in
//! this module are pure. Two decompositions exist and serve different purposes:
//! [prefixes] (cumulative, used to key per-taxon state) and [segments] (one
//! `<R>name` unit each).

pub mod lookup;
pub mod rank_table;

pub use lookup::{LineageLookup, check_repeats, resolve_lineages};
pub use rank_table::{RankTable, RankTableBuilder};

use serde::{Deserialize, Serialize};

/// Opening mark of a rank tag.
pub const TAG_OPEN: char = '<';
/// Closing mark of a rank tag.
pub const TAG_CLOSE: char = '>';
/// Placeholder name for a rank missing from a lineage.
pub const UNCLASSIFIED: &str = "Unclassified";
/// Tag of the terminal strain segment.
pub const STRAIN_TAG: &str = "<T>";

/// Lineage of one leaf together with its well-defined flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    /// Encoded lineage string.
    pub name: String,
    /// `true` iff no rank of `name` is [UNCLASSIFIED].
    pub well_defined: bool,
}

impl Lineage {
    /// Creates a lineage, deriving the well-defined flag from the string.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let well_defined = is_well_defined(&name);
        Self { name, well_defined }
    }
}

/// Byte offsets of every tag opening after position 0.
fn tag_starts(lineage: &str) -> impl Iterator<Item = usize> + '_ {
    lineage
        .char_indices()
        .skip(1)
        .filter(|(_, c)| *c == TAG_OPEN)
        .map(|(i, _)| i)
}

/// Cumulative prefixes of `lineage`, one per segment, the last one being the
/// full string.
///
/// `prefixes("<D>X<K>Y")` is `["<D>X", "<D>X<K>Y"]`. The empty string has no
/// prefixes.
pub fn prefixes(lineage: &str) -> Vec<&str> {
    if lineage.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<&str> = tag_starts(lineage).map(|i| &lineage[..i]).collect();
    out.push(lineage);
    out
}

/// Single segments of `lineage`.
///
/// `segments("<D>X<K>Y")` is `["<D>X", "<K>Y"]`.
pub fn segments(lineage: &str) -> Vec<&str> {
    if lineage.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut prev = 0;
    for pos in tag_starts(lineage) {
        out.push(&lineage[prev..pos]);
        prev = pos;
    }
    out.push(&lineage[prev..]);
    out
}

/// Longest common run of whole leading segments of `a` and `b`.
///
/// Returns the empty string if either input is empty or the first segments
/// already differ.
pub fn common_lineage(a: &str, b: &str) -> String {
    if a.is_empty() || b.is_empty() {
        return String::new();
    }
    prefixes(a)
        .into_iter()
        .zip(prefixes(b))
        .take_while(|(pa, pb)| pa == pb)
        .last()
        .map(|(pa, _)| pa.to_string())
        .unwrap_or_default()
}

/// Common lineage of a list, folded pairwise from the first entry.
pub fn common_lineage_all<S: AsRef<str>>(lineages: &[S]) -> String {
    let mut iter = lineages.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    iter.fold(first.as_ref().to_string(), |acc, lng| {
        common_lineage(&acc, lng.as_ref())
    })
}

/// Number of rank tags in `lineage`.
pub fn num_ranks(lineage: &str) -> usize {
    lineage.chars().filter(|c| *c == TAG_OPEN).count()
}

/// `true` iff no segment of `lineage` above the deepest one carries the
/// [UNCLASSIFIED] placeholder.
///
/// The deepest segment is not checked: `<D>X<K>Unclassified` counts as well
/// defined. Formatted lineages always end in a strain segment, so this only
/// affects unformatted input.
pub fn is_well_defined(lineage: &str) -> bool {
    let segs = segments(lineage);
    let Some((_, upper)) = segs.split_last() else {
        return true;
    };
    upper.iter().all(|seg| last_name_no_rank(seg) != UNCLASSIFIED)
}

/// Deepest segment including its tag, e.g. `<T>K-12`.
pub fn last_name(lineage: &str) -> &str {
    match lineage.rfind(TAG_OPEN) {
        Some(pos) => &lineage[pos..],
        None => lineage,
    }
}

/// Deepest name without its tag, e.g. `K-12`.
pub fn last_name_no_rank(lineage: &str) -> &str {
    match lineage.rfind(TAG_CLOSE) {
        Some(pos) => &lineage[pos + 1..],
        None => lineage,
    }
}

/// Lineage without its strain segment.
pub fn strip_strain(lineage: &str) -> &str {
    match lineage.find(STRAIN_TAG) {
        Some(pos) => &lineage[..pos],
        None => lineage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ECOLI: &str = "<D>Bacteria<P>Proteobacteria<G>Escherichia<T>K-12";

    #[test]
    fn test_prefixes_and_segments() {
        assert_eq!(
            prefixes("<D>X<K>Y<T>a"),
            vec!["<D>X", "<D>X<K>Y", "<D>X<K>Y<T>a"]
        );
        assert_eq!(segments("<D>X<K>Y<T>a"), vec!["<D>X", "<K>Y", "<T>a"]);
        assert!(prefixes("").is_empty());
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_common_lineage() {
        assert_eq!(common_lineage("<D>X<K>Y<T>a", "<D>X<K>Y<T>b"), "<D>X<K>Y");
        assert_eq!(common_lineage("<D>X<K>Y", "<D>X<K>Z"), "<D>X");
        assert_eq!(common_lineage("<D>X", "<D>W"), "");
        assert_eq!(common_lineage("", "<D>X"), "");
        // segment boundary, not character prefix
        assert_eq!(common_lineage("<D>X<K>Yz", "<D>X<K>Y"), "<D>X");
    }

    #[test]
    fn test_common_lineage_all() {
        let list = ["<D>X<K>Y<T>a", "<D>X<K>Y<T>b", "<D>X<K>Z<T>c"];
        assert_eq!(common_lineage_all(&list), "<D>X");
        assert_eq!(common_lineage_all::<&str>(&[]), "");
        assert_eq!(common_lineage_all(&["<D>X"]), "<D>X");
    }

    #[test]
    fn test_names_and_ranks() {
        assert_eq!(num_ranks(ECOLI), 4);
        assert_eq!(last_name(ECOLI), "<T>K-12");
        assert_eq!(last_name_no_rank(ECOLI), "K-12");
        assert_eq!(last_name_no_rank("plain"), "plain");
        assert_eq!(strip_strain(ECOLI), "<D>Bacteria<P>Proteobacteria<G>Escherichia");
    }

    #[test]
    fn test_well_defined() {
        assert!(is_well_defined(ECOLI));
        assert!(!is_well_defined("<D>Bacteria<P>Unclassified<T>x"));
        assert!(!Lineage::new("<D>Bacteria<P>Unclassified<T>x").well_defined);
        assert!(!is_well_defined("<D>Unclassified<K>Y<T>x"));
        assert!(is_well_defined(""));
        assert!(is_well_defined("Unclassified"));
    }

    #[test]
    fn test_well_defined_ignores_deepest_segment() {
        assert!(is_well_defined("<D>Bacteria<P>Unclassified"));
        assert!(is_well_defined("<D>Bacteria<T>Unclassified"));
        assert!(!is_well_defined("<D>Bacteria<P>Unclassified<G>Unclassified"));
    }

    fn lineage_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec(("[DKPCOFGS]", "[a-c]{1,2}"), 0..6).prop_map(|segs| {
            segs.into_iter()
                .map(|(rank, name)| format!("<{rank}>{name}"))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_common_lineage_idempotent(a in lineage_strategy()) {
            prop_assert_eq!(common_lineage(&a, &a), a);
        }

        #[test]
        fn test_common_lineage_is_segment_prefix(a in lineage_strategy(), b in lineage_strategy()) {
            let common = common_lineage(&a, &b);
            let n = segments(&common).len();
            prop_assert_eq!(&segments(&a)[..n], &segments(&common)[..]);
            prop_assert_eq!(&segments(&b)[..n], &segments(&common)[..]);
            prop_assert_eq!(common_lineage(&a, &b), common_lineage(&b, &a));
        }
    }
}
