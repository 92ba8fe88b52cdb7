//! Configuration of the rooting engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Default fraction of a leaf outgroup's branch handed to the other side
/// when force-rooting.
pub const DEFAULT_LEAF_SPLIT_FRACTION: f64 = 0.05;

/// Criterion that scores a root position by branch lengths.
///
/// Deserializes through [Criterion::from_name], so unknown names fall back to
/// [Criterion::MinimalAncestorDeviation].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Criterion {
    /// Minimal ancestor deviation over cross pairs of leaves
    #[default]
    #[serde(rename = "mad")]
    MinimalAncestorDeviation,
    /// Largest fraction of cross pairs whose midpoint lies on the root branch
    #[serde(rename = "pmr")]
    PairwiseMidpoint,
    /// Smallest tree height after midpoint placement
    #[serde(rename = "md")]
    MinimalDepth,
    /// As [Criterion::MinimalDepth], preferring strictly positive lengths on
    /// both root branches
    #[serde(rename = "mp")]
    MinimalDepthPositive,
    /// Smallest variance of root-to-leaf distances
    #[serde(rename = "mv")]
    MinimalVariance,
}

impl Criterion {
    /// Looks a criterion up by its short name (`mad`, `pmr`, `md`, `mp`, `mv`),
    /// case-insensitively.
    ///
    /// Unknown names fall back to [Criterion::MinimalAncestorDeviation] with a
    /// warning.
    ///
    /// ```
    /// use taxwick::rooting::Criterion;
    ///
    /// assert_eq!(Criterion::from_name("PMR"), Criterion::PairwiseMidpoint);
    /// assert_eq!(Criterion::from_name("nope"), Criterion::MinimalAncestorDeviation);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "mad" => Criterion::MinimalAncestorDeviation,
            "pmr" => Criterion::PairwiseMidpoint,
            "md" => Criterion::MinimalDepth,
            "mp" => Criterion::MinimalDepthPositive,
            "mv" => Criterion::MinimalVariance,
            other => {
                warn!("Unknown rooting criterion {:?}, using mad", other);
                Criterion::MinimalAncestorDeviation
            }
        }
    }

    /// Short name of this criterion.
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::MinimalAncestorDeviation => "mad",
            Criterion::PairwiseMidpoint => "pmr",
            Criterion::MinimalDepth => "md",
            Criterion::MinimalDepthPositive => "mp",
            Criterion::MinimalVariance => "mv",
        }
    }
}

impl From<String> for Criterion {
    fn from(name: String) -> Self {
        Criterion::from_name(&name)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings of the [RootingEngine](crate::rooting::RootingEngine).
///
/// # Configuration
/// * `with_outgroup(name)` - Leaf to root at; tried before taxonomy
/// * `with_criterion(criterion)` - Branch-length criterion for the root search
/// * `with_boundary_rank(symbol)` - Rank at which the bounded root search stops
///   descending, e.g. `'P'`; defaults to one level below the root's consensus
/// * `with_leaf_split_fraction(f)` - Share of a leaf outgroup's branch given to
///   the other side when force-rooting
/// * `with_rebalance(bool)` - Whether taxonomy rooting is refined by branch lengths
///
/// # Example
/// ```
/// use taxwick::rooting::{Criterion, RootingConfig};
///
/// let config = RootingConfig::default()
///     .with_outgroup("Aquifex")
///     .with_criterion(Criterion::MinimalVariance);
/// assert_eq!(config.leaf_split_fraction, 0.05);
///
/// let json = r#"{"criterion":"pmr","rebalance":false}"#;
/// let config: RootingConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.criterion, Criterion::PairwiseMidpoint);
/// assert!(config.outgroup.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootingConfig {
    /// Display name of the outgroup leaf
    pub outgroup: Option<String>,
    /// Branch-length criterion
    pub criterion: Criterion,
    /// Symbol of the output rank bounding the root search
    pub boundary_rank: Option<char>,
    /// Share of a leaf outgroup's branch length moved to the other root branch
    pub leaf_split_fraction: f64,
    /// Refine taxonomy rooting by branch lengths
    pub rebalance: bool,
}

impl Default for RootingConfig {
    fn default() -> Self {
        Self {
            outgroup: None,
            criterion: Criterion::default(),
            boundary_rank: None,
            leaf_split_fraction: DEFAULT_LEAF_SPLIT_FRACTION,
            rebalance: true,
        }
    }
}

impl RootingConfig {
    /// Sets the outgroup leaf name.
    pub fn with_outgroup(mut self, name: &str) -> Self {
        self.outgroup = Some(name.to_string());
        self
    }

    /// Sets the branch-length criterion.
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Sets the symbol of the output rank bounding the root search.
    pub fn with_boundary_rank(mut self, symbol: char) -> Self {
        self.boundary_rank = Some(symbol);
        self
    }

    /// Sets the leaf split fraction; values outside `[0, 1]` are clamped
    /// with a warning.
    pub fn with_leaf_split_fraction(mut self, fraction: f64) -> Self {
        if !(0.0..=1.0).contains(&fraction) {
            warn!("Leaf split fraction {} outside [0, 1], clamping", fraction);
        }
        self.leaf_split_fraction = if fraction.is_nan() {
            DEFAULT_LEAF_SPLIT_FRACTION
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self
    }

    /// Enables or disables branch-length refinement after taxonomy rooting.
    pub fn with_rebalance(mut self, rebalance: bool) -> Self {
        self.rebalance = rebalance;
        self
    }
}
