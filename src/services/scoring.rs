/// Threshold-table scoring shared by every metric group.
///
/// Each metric maps its summary statistic through an ordered list of
/// `(boundary, subscore)` rules; the first boundary satisfied wins. The same
/// reducer serves all exercises, parameterized per metric, instead of
/// duplicating cascading conditionals.

/// Which way a metric's boundaries are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Boundaries are checked with `<=`; smaller values score higher.
    LowerIsBetter,
    /// Boundaries are checked with `>=`; larger values score higher.
    HigherIsBetter,
}

/// Ordered threshold table for one metric group.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable {
    direction: Direction,
    bands: &'static [(f64, u8)],
    fallback: u8,
}

impl ThresholdTable {
    pub const fn new(direction: Direction, bands: &'static [(f64, u8)], fallback: u8) -> Self {
        Self {
            direction,
            bands,
            fallback,
        }
    }

    /// First matching boundary top-down, or the fallback subscore.
    pub fn score(&self, value: f64) -> u8 {
        for &(boundary, subscore) in self.bands {
            let hit = match self.direction {
                Direction::LowerIsBetter => value <= boundary,
                Direction::HigherIsBetter => value >= boundary,
            };
            if hit {
                return subscore;
            }
        }
        self.fallback
    }
}

/// Fixed convex combination of subscores, rounded to the nearest integer.
///
/// Weights encode relative injury-risk priority and must sum to 1.0 per
/// exercise.
pub fn weighted_overall(parts: &[(u8, f64)]) -> u8 {
    let total: f64 = parts
        .iter()
        .map(|&(subscore, weight)| subscore as f64 * weight)
        .sum();
    total.round() as u8
}

/// Distance of `value` outside the inclusive band [lo, hi]; 0.0 inside.
///
/// Lets banded targets (for example step width) reuse the ordered
/// lower-is-better table form.
pub fn band_distance(value: f64, lo: f64, hi: f64) -> f64 {
    if value < lo {
        lo - value
    } else if value > hi {
        value - hi
    } else {
        0.0
    }
}
