//! Scores of a root position computed from branch lengths.
//!
//! A root position splits the leaves into two sides `A` and `B` joined by the
//! root branch of total length `T`. Every criterion places the root on that
//! branch and scores the placement; lower scores are better.

use crate::rooting::Criterion;

/// Distances of the leaves on both sides of a root branch.
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    /// Distances from the top of side `A` to its leaves
    pub a: &'a [f64],
    /// Distances from the top of side `B` to its leaves
    pub b: &'a [f64],
    /// Average leaf distance below the top of side `A`
    pub depth_a: f64,
    /// Average leaf distance below the top of side `B`
    pub depth_b: f64,
    /// Length of the root branch, sum of both root branch lengths
    pub total: f64,
}

/// Score of one root position and the branch lengths placing the root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Lower is better
    pub score: f64,
    /// Whether the placement satisfies the criterion's constraint
    pub feasible: bool,
    /// Length of the root branch towards side `A`
    pub length_a: f64,
    /// Length of the root branch towards side `B`
    pub length_b: f64,
}

impl Evaluation {
    fn new(score: f64, length_a: f64, total: f64) -> Self {
        Self {
            score,
            feasible: true,
            length_a,
            length_b: total - length_a,
        }
    }

    /// Strict improvement: feasible beats infeasible, then a lower score wins.
    /// NaN scores never win.
    pub fn is_better_than(&self, other: &Evaluation) -> bool {
        match (self.feasible, other.feasible) {
            (true, false) => !self.score.is_nan(),
            (false, true) => false,
            _ => self.score < other.score || (other.score.is_nan() && !self.score.is_nan()),
        }
    }
}

/// Scores a split with the given criterion.
pub fn evaluate(criterion: Criterion, split: &Split) -> Evaluation {
    match criterion {
        Criterion::MinimalAncestorDeviation => ancestor_deviation(split),
        Criterion::PairwiseMidpoint => pairwise_midpoint(split),
        Criterion::MinimalDepth => minimal_depth(split, false),
        Criterion::MinimalDepthPositive => minimal_depth(split, true),
        Criterion::MinimalVariance => minimal_variance(split),
    }
}

/// Clamps `x` to `[0, total]`, or to 0 when `total` is not positive.
fn clamp_to(x: f64, total: f64) -> f64 {
    if total <= 0.0 || x.is_nan() {
        0.0
    } else {
        x.max(0.0).min(total)
    }
}

/// Unclamped root position on side `A` that balances the average depths.
fn raw_midpoint(split: &Split) -> f64 {
    (split.total + split.depth_b - split.depth_a) / 2.0
}

/// Cross pairs `(a, b, D)` with `D` the leaf-to-leaf distance through the root branch.
fn cross_pairs<'a>(split: &'a Split<'a>) -> impl Iterator<Item = (f64, f64, f64)> + 'a {
    split
        .a
        .iter()
        .flat_map(move |&a| split.b.iter().map(move |&b| (a, b, a + b + split.total)))
}

/// Places the root to minimise the mean squared relative deviation of the
/// root from the midpoint of each cross pair.
fn ancestor_deviation(split: &Split) -> Evaluation {
    let (mut numerator, mut denominator) = (0.0, 0.0);
    for (a, _, d) in cross_pairs(split).filter(|&(_, _, d)| d > 0.0) {
        numerator += (d - 2.0 * a) / (d * d);
        denominator += 1.0 / (d * d);
    }
    let x = if denominator > 0.0 {
        clamp_to(numerator / (2.0 * denominator), split.total)
    } else {
        clamp_to(split.total / 2.0, split.total)
    };

    let score = cross_pairs(split)
        .filter(|&(_, _, d)| d > 0.0)
        .map(|(a, _, d)| {
            let deviation = 2.0 * (a + x) / d - 1.0;
            deviation * deviation
        })
        .sum();
    Evaluation::new(score, x, split.total)
}

/// Scores by the fraction of cross pairs whose midpoint falls on the root
/// branch; the root itself goes to the depth-balancing midpoint.
fn pairwise_midpoint(split: &Split) -> Evaluation {
    let pairs = split.a.len() * split.b.len();
    let inside = cross_pairs(split)
        .filter(|&(a, _, d)| a < d / 2.0 && d / 2.0 < a + split.total)
        .count();
    let fraction = if pairs == 0 {
        0.0
    } else {
        inside as f64 / pairs as f64
    };
    let x = clamp_to(raw_midpoint(split), split.total);
    Evaluation::new(-fraction, x, split.total)
}

/// Scores by the height of the tree with the root at the depth-balancing
/// midpoint. With `positive`, placements that need the clamp are infeasible.
fn minimal_depth(split: &Split, positive: bool) -> Evaluation {
    let raw = raw_midpoint(split);
    let x = clamp_to(raw, split.total);
    let height = (x + split.depth_a).max(split.total - x + split.depth_b);

    let mut evaluation = Evaluation::new(height, x, split.total);
    if positive {
        evaluation.feasible = raw > 0.0 && raw < split.total;
    }
    evaluation
}

/// Places the root to minimise the variance of root-to-leaf distances.
fn minimal_variance(split: &Split) -> Evaluation {
    // Root-to-leaf distance is c + u*x: side A gets (a, +1), side B (b + T, -1).
    let points: Vec<(f64, f64)> = split
        .a
        .iter()
        .map(|&a| (a, 1.0))
        .chain(split.b.iter().map(|&b| (b + split.total, -1.0)))
        .collect();
    if points.is_empty() {
        return Evaluation::new(0.0, 0.0, split.total);
    }

    let n = points.len() as f64;
    let mean_c = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_u = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut var_c, mut cov, mut var_u) = (0.0, 0.0, 0.0);
    for &(c, u) in &points {
        var_c += (c - mean_c) * (c - mean_c) / n;
        cov += (c - mean_c) * (u - mean_u) / n;
        var_u += (u - mean_u) * (u - mean_u) / n;
    }

    let x = if var_u > 0.0 {
        clamp_to(-cov / var_u, split.total)
    } else {
        clamp_to(split.total / 2.0, split.total)
    };
    let variance = var_c + 2.0 * x * cov + x * x * var_u;
    Evaluation::new(variance, x, split.total)
}
