use super::store::RatingVector;
use std::collections::HashSet;
use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Metric {
    Euclidean,
    Pearson,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Euclidean, Metric::Pearson];

    pub fn score(self, v1: &RatingVector, v2: &RatingVector) -> f64 {
        match self {
            Metric::Euclidean => euclidean_similarity(v1, v2),
            Metric::Pearson => pearson_similarity(v1, v2),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Euclidean => write!(f, "distance"),
            Metric::Pearson => write!(f, "pearson"),
        }
    }
}

/// Attributes present in `v1` that carry a nonzero rating in `v2`.
///
/// Not symmetric: a zero in `v2` counts as unrated, a zero in `v1` does not.
pub fn common_keys<'a>(v1: &'a RatingVector, v2: &RatingVector) -> HashSet<&'a str> {
    v1.keys()
        .filter(|key| v2.get(key.as_str()).map_or(false, |r| *r != 0.0))
        .map(|key| key.as_str())
        .collect()
}

/// `1 / (1 + sum of squared differences)` over the common keys, 0 when
/// nothing overlaps.
pub fn euclidean_similarity(v1: &RatingVector, v2: &RatingVector) -> f64 {
    let common = common_keys(v1, v2);
    if common.is_empty() {
        return 0.0;
    }

    let sum_of_squares: f64 = common
        .iter()
        .map(|key| (v1[*key] - v2[*key]).powi(2))
        .sum();

    1.0 / (1.0 + sum_of_squares)
}

/// Pearson correlation over the common keys.
///
/// Returns 0 when nothing overlaps or either side has no variance.
pub fn pearson_similarity(v1: &RatingVector, v2: &RatingVector) -> f64 {
    let common = common_keys(v1, v2);
    if common.is_empty() {
        return 0.0;
    }
    let n = common.len() as f64;

    let (mut sum1, mut sum2, mut sumsq1, mut sumsq2, mut sump) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for key in common.iter() {
        let (r1, r2) = (v1[*key], v2[*key]);
        sum1 += r1;
        sum2 += r2;
        sumsq1 += r1 * r1;
        sumsq2 += r2 * r2;
        sump += r1 * r2;
    }

    let num = sump - (sum1 * sum2) / n;
    let den = ((sumsq1 - sum1 * sum1 / n) * (sumsq2 - sum2 * sum2 / n)).sqrt();

    // rounding can leave a zero variance slightly negative, which sqrt turns into NaN
    if !(den > 0.0) {
        return 0.0;
    }

    (num / den).clamp(-1.0, 1.0)
}
