//! Isotonic regression for probability recalibration.
//!
//! Fits a non-decreasing step function to (predicted, outcome) pairs with
//! pool-adjacent-violators, then remaps new raw probabilities by linear
//! interpolation between the fitted control points. The monotone partition
//! PAVA produces is unique, so the stack-based single pass used here gives
//! the same output as a restart-scan implementation.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::metrics::CalibrationSample;

/// One fitted control point: raw model probability -> calibrated probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingPoint {
    pub raw: f64,
    pub calibrated: f64,
}

/// A learned monotonic probability remapping
///
/// Invariant: control points are ordered by `raw`, and `calibrated` is
/// non-decreasing across adjacent points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IsotonicMapping {
    points: Vec<MappingPoint>,
}

impl IsotonicMapping {
    /// Build a mapping from control points, sorting them by raw probability
    pub fn new(mut points: Vec<MappingPoint>) -> Self {
        points.sort_by(|a, b| a.raw.partial_cmp(&b.raw).unwrap_or(Ordering::Equal));
        Self { points }
    }

    pub fn points(&self) -> &[MappingPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when every adjacent pair of calibrated values is non-decreasing
    pub fn is_monotonic(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[0].calibrated <= pair[1].calibrated)
    }

    /// Remap a raw probability through the learned curve
    ///
    /// An empty mapping is the identity. Raw values outside the learned
    /// domain clamp to the boundary calibrated values; no extrapolation.
    pub fn apply(&self, raw: f64) -> f64 {
        if self.points.is_empty() {
            return raw;
        }

        let first = &self.points[0];
        let last = &self.points[self.points.len() - 1];
        if raw <= first.raw {
            return first.calibrated;
        }
        if raw >= last.raw {
            return last.calibrated;
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if raw >= lo.raw && raw <= hi.raw {
                let span = hi.raw - lo.raw;
                if span <= f64::EPSILON {
                    return lo.calibrated;
                }
                let t = (raw - lo.raw) / span;
                return lo.calibrated + t * (hi.calibrated - lo.calibrated);
            }
        }

        // Points are sorted, so one window always brackets the raw value
        last.calibrated
    }

    /// Load a mapping from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mapping: Self = serde_json::from_str(&content)?;
        Ok(Self::new(mapping.points))
    }

    /// Save the mapping to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Fit a monotone mapping from settled samples with pool-adjacent-violators
///
/// Samples are sorted by predicted value; each starts as its own block with
/// value = outcome and the sample's weight. Adjacent order violations merge
/// into weight-weighted means until the sequence is non-decreasing. One
/// control point is emitted per final block at the block's mean predicted
/// value. Empty input yields the empty (identity) mapping.
pub fn isotonic_regression(samples: &[CalibrationSample]) -> IsotonicMapping {
    if samples.is_empty() {
        return IsotonicMapping::default();
    }

    let mut ordered: Vec<&CalibrationSample> = samples.iter().collect();
    ordered.sort_by(|a, b| {
        a.predicted
            .partial_cmp(&b.predicted)
            .unwrap_or(Ordering::Equal)
    });

    struct Block {
        weight: f64,
        predicted_sum: f64,
        value_sum: f64,
    }

    impl Block {
        fn value(&self) -> f64 {
            self.value_sum / self.weight
        }
        fn raw(&self) -> f64 {
            self.predicted_sum / self.weight
        }
    }

    let mut blocks: Vec<Block> = Vec::with_capacity(ordered.len());
    for sample in ordered {
        let w = sample.effective_weight();
        let mut block = Block {
            weight: w,
            predicted_sum: sample.predicted * w,
            value_sum: sample.actual * w,
        };

        while blocks
            .last()
            .map_or(false, |prev| prev.value() > block.value())
        {
            let prev = blocks.pop().expect("checked non-empty");
            block = Block {
                weight: prev.weight + block.weight,
                predicted_sum: prev.predicted_sum + block.predicted_sum,
                value_sum: prev.value_sum + block.value_sum,
            };
        }
        blocks.push(block);
    }

    IsotonicMapping::new(
        blocks
            .iter()
            .map(|b| MappingPoint {
                raw: b.raw(),
                calibrated: b.value(),
            })
            .collect(),
    )
}
