//! Rank names, rank symbols and the ordered list of output ranks.
//!
//! A [RankTableBuilder] collects rank definitions and is turned into an
//! immutable [RankTable] by [RankTableBuilder::lock]. Everything downstream
//! borrows the locked table.

use crate::error::{Result, TaxError};
use crate::lineage::{STRAIN_TAG, TAG_CLOSE, TAG_OPEN, UNCLASSIFIED};
use std::collections::BTreeMap;

/// Default rank name to symbol mapping.
const DEFAULT_RANKS: &[(&str, char)] = &[
    ("superkingdom", 'D'),
    ("kingdom", 'K'),
    ("subkingdom", 'k'),
    ("phylum", 'P'),
    ("subphylum", 'p'),
    ("class", 'C'),
    ("subclass", 'c'),
    ("order", 'O'),
    ("suborder", 'o'),
    ("family", 'F'),
    ("subfamily", 'f'),
    ("genus", 'G'),
    ("subgenus", 'g'),
    ("species", 'S'),
    ("subspecies", 's'),
    ("varietas", 'V'),
    ("subvariety", 'v'),
    ("tribe", 'R'),
    ("subtribe", 'r'),
    ("section", 'E'),
    ("subsection", 'E'),
    ("serotype", 'Y'),
    ("isolate", 'I'),
    ("superphylum", 'Q'),
    ("superclass", 'L'),
    ("superorder", 'W'),
    ("superfamily", 'M'),
    ("infraorder", 'i'),
    ("biotype", 'B'),
    ("genotype", 'N'),
];

/// Default output ranks: domain, kingdom, phylum, class, order, family, genus, species.
const DEFAULT_OUTPUT_RANKS: &[(&str, char)] = &[
    ("Domain", 'D'),
    ("Kingdom", 'K'),
    ("Phylum", 'P'),
    ("Class", 'C'),
    ("Order", 'O'),
    ("Family", 'F'),
    ("Genus", 'G'),
    ("Species", 'S'),
];

// =#========================================================================#=
// RANK TABLE BUILDER
// =#========================================================================#=
/// Mutable collection of rank definitions.
///
/// # Example
/// ```
/// use taxwick::lineage::RankTableBuilder;
///
/// let table = RankTableBuilder::new()
///     .with_rank("clade", 'A')
///     .with_output_ranks("DPA")
///     .lock()
///     .unwrap();
/// assert_eq!(table.num_output_ranks(), 3);
/// assert_eq!(table.rank_name('A'), Some("Clade"));
/// ```
#[derive(Debug, Clone)]
pub struct RankTableBuilder {
    ranks: BTreeMap<String, char>,
    output_symbols: Option<String>,
}

impl Default for RankTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RankTableBuilder {
    /// Creates a builder with the default rank names and output ranks.
    pub fn new() -> Self {
        Self {
            ranks: DEFAULT_RANKS
                .iter()
                .map(|(name, sym)| (name.to_string(), *sym))
                .collect(),
            output_symbols: None,
        }
    }

    /// Adds or overrides the symbol of a rank name.
    pub fn with_rank(mut self, name: &str, symbol: char) -> Self {
        self.ranks.insert(name.to_lowercase(), symbol);
        self
    }

    /// Sets the output ranks as a string of rank symbols, e.g. `"DKPCOFGS"`.
    pub fn with_output_ranks(mut self, symbols: &str) -> Self {
        self.output_symbols = Some(symbols.to_string());
        self
    }

    /// Locks the definitions into a read-only [RankTable].
    ///
    /// # Errors
    /// Returns [TaxError::UnknownRank] if an output rank symbol has no rank name.
    pub fn lock(self) -> Result<RankTable> {
        let mut names_by_symbol = BTreeMap::new();
        for (name, symbol) in &self.ranks {
            names_by_symbol.insert(*symbol, capitalize(name));
        }

        let output_ranks = match &self.output_symbols {
            None => DEFAULT_OUTPUT_RANKS
                .iter()
                .map(|(name, sym)| (name.to_string(), *sym))
                .collect(),
            Some(symbols) => symbols
                .chars()
                .map(|sym| {
                    names_by_symbol
                        .get(&sym)
                        .map(|name| (name.clone(), sym))
                        .ok_or_else(|| TaxError::UnknownRank(sym.to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(RankTable {
            ranks: self.ranks,
            names_by_symbol,
            output_ranks,
        })
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =#========================================================================#=
// RANK TABLE
// =#========================================================================#=
/// Read-only rank definitions, shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    ranks: BTreeMap<String, char>,
    names_by_symbol: BTreeMap<char, String>,
    output_ranks: Vec<(String, char)>,
}

impl Default for RankTable {
    fn default() -> Self {
        let ranks: BTreeMap<String, char> = DEFAULT_RANKS
            .iter()
            .map(|(name, sym)| (name.to_string(), *sym))
            .collect();
        let names_by_symbol = ranks
            .iter()
            .map(|(name, sym)| (*sym, capitalize(name)))
            .collect();
        Self {
            ranks,
            names_by_symbol,
            output_ranks: DEFAULT_OUTPUT_RANKS
                .iter()
                .map(|(name, sym)| (name.to_string(), *sym))
                .collect(),
        }
    }
}

impl RankTable {
    /// Symbol of a rank name (case-insensitive).
    pub fn symbol(&self, rank_name: &str) -> Option<char> {
        self.ranks.get(&rank_name.to_lowercase()).copied()
    }

    /// Capitalized rank name of a symbol.
    pub fn rank_name(&self, symbol: char) -> Option<&str> {
        if let Some((name, _)) = self.output_ranks.iter().find(|(_, s)| *s == symbol) {
            return Some(name);
        }
        self.names_by_symbol.get(&symbol).map(String::as_str)
    }

    /// Output ranks as `(name, symbol)` from shallowest to deepest.
    pub fn output_ranks(&self) -> &[(String, char)] {
        &self.output_ranks
    }

    /// Number of output ranks.
    pub fn num_output_ranks(&self) -> usize {
        self.output_ranks.len()
    }

    /// Position of `symbol` among the output ranks.
    pub fn rank_index(&self, symbol: char) -> Option<usize> {
        self.output_ranks.iter().position(|(_, s)| *s == symbol)
    }

    /// Tag of a rank symbol, e.g. `<D>`.
    pub fn tag(symbol: char) -> String {
        format!("{TAG_OPEN}{symbol}{TAG_CLOSE}")
    }

    /// Normalizes `lineage` to exactly the output ranks plus a strain segment.
    ///
    /// Ranks missing from `lineage` become [UNCLASSIFIED]. The strain segment
    /// is kept if present, otherwise the deepest name of the input is used. A
    /// missing kingdom is filled with the domain name.
    ///
    /// ```
    /// use taxwick::lineage::RankTable;
    ///
    /// let table = RankTable::default();
    /// assert_eq!(
    ///     table.format("<D>Archaea<P>Euryarchaeota<G>Methanococcus<T>JAL-1"),
    ///     "<D>Archaea<K>Archaea<P>Euryarchaeota<C>Unclassified<O>Unclassified\
    ///      <F>Unclassified<G>Methanococcus<S>Unclassified<T>JAL-1",
    /// );
    /// ```
    pub fn format(&self, lineage: &str) -> String {
        let mut out = String::with_capacity(lineage.len() + 16 * self.output_ranks.len());
        for (_, sym) in &self.output_ranks {
            let tag = Self::tag(*sym);
            match lineage.find(&tag) {
                Some(begin) => out.push_str(segment_at(lineage, begin)),
                None => {
                    out.push_str(&tag);
                    out.push_str(UNCLASSIFIED);
                }
            }
        }

        match lineage.rfind(STRAIN_TAG) {
            Some(begin) => out.push_str(segment_at(lineage, begin)),
            None => {
                out.push_str(STRAIN_TAG);
                let begin = lineage.rfind(TAG_CLOSE).map_or(0, |p| p + 1);
                out.push_str(&lineage[begin..]);
            }
        }

        repair_kingdom(&out)
    }

    /// Appends a strain segment named `strain` unless `lineage` has one.
    pub fn with_strain(lineage: &str, strain: &str) -> String {
        if lineage.contains(STRAIN_TAG) {
            lineage.to_string()
        } else {
            format!("{lineage}{STRAIN_TAG}{strain}")
        }
    }
}

/// The segment of `lineage` starting at byte `begin`.
fn segment_at(lineage: &str, begin: usize) -> &str {
    let end = lineage[begin + 1..]
        .find(TAG_OPEN)
        .map_or(lineage.len(), |p| p + begin + 1);
    &lineage[begin..end]
}

/// `<D>X<K>Unclassified` becomes `<D>X<K>X` for alphabetic domain names.
fn repair_kingdom(lineage: &str) -> String {
    let domain = RankTable::tag('D');
    let missing_kingdom = format!("{}{}", RankTable::tag('K'), UNCLASSIFIED);

    let Some(begin) = lineage.find(&domain) else {
        return lineage.to_string();
    };
    let name_start = begin + domain.len();
    let name_len = lineage[name_start..]
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(lineage.len() - name_start);
    let name = &lineage[name_start..name_start + name_len];
    let rest = &lineage[name_start + name_len..];

    match rest.strip_prefix(&missing_kingdom) {
        Some(tail) if !name.is_empty() && !tail.starts_with(|c: char| c.is_ascii_alphabetic()) => {
            format!(
                "{}{}{}{}",
                &lineage[..name_start],
                name,
                RankTable::tag('K'),
                name
            ) + tail
        }
        _ => lineage.to_string(),
    }
}
