//! Calibration scoring: Brier score, log loss, and the Murphy decomposition.
//!
//! All functions here are pure and total over their inputs. Empty sample
//! sets are expected (cold start, sparse sports, new bet types) and yield
//! zero/empty outputs rather than errors.

use serde::{Deserialize, Serialize};

/// Clamp applied to predicted probabilities before log loss
const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Wilson score z for a 95% interval
const WILSON_Z: f64 = 1.96;

/// A settled historical prediction: what the model said vs what happened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Predicted probability in [0, 1]
    pub predicted: f64,
    /// Settled outcome: 1.0 hit, 0.0 miss
    pub actual: f64,
    /// Optional sample weight (> 0); unweighted samples count as 1.0
    #[serde(default)]
    pub weight: Option<f64>,
}

impl CalibrationSample {
    pub fn new(predicted: f64, won: bool) -> Self {
        Self {
            predicted,
            actual: if won { 1.0 } else { 0.0 },
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// One non-empty probability bin with its Wilson confidence interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub predicted_avg: f64,
    pub actual_avg: f64,
    pub count: usize,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
}

/// Murphy decomposition of the Brier score
///
/// Invariant: `brier_score ≈ uncertainty - resolution + reliability`
/// (within floating tolerance, when predictions are constant per bin).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrierDecomposition {
    pub brier_score: f64,
    /// Miscalibration: weighted squared gap between predicted and observed
    pub reliability: f64,
    /// Discrimination: weighted squared spread of bin outcomes vs base rate
    pub resolution: f64,
    /// Base-rate variance, the score of always predicting the base rate
    pub uncertainty: f64,
    /// `sqrt(reliability)`, in probability units
    pub calibration_error: f64,
}

/// Letter grade for a Brier score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationGrade {
    pub grade: String,
    pub label: String,
}

/// Mean squared error between predicted probability and outcome
///
/// Empty input scores 0 (no evidence of miscalibration yet).
pub fn brier_score(samples: &[CalibrationSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| (s.predicted - s.actual).powi(2))
        .sum();
    sum / samples.len() as f64
}

/// Mean cross-entropy, with predictions clamped away from 0 and 1
pub fn log_loss(samples: &[CalibrationSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let p = s.predicted.clamp(LOG_LOSS_EPSILON, 1.0 - LOG_LOSS_EPSILON);
            -(s.actual * p.ln() + (1.0 - s.actual) * (1.0 - p).ln())
        })
        .sum();
    sum / samples.len() as f64
}

/// Partition [0, 1] into `num_buckets` equal-width bins by predicted value
///
/// Only non-empty bins are returned. Each carries a Wilson score interval
/// on its observed hit rate, clamped to [0, 1].
pub fn bucketize(samples: &[CalibrationSample], num_buckets: usize) -> Vec<CalibrationBucket> {
    if samples.is_empty() || num_buckets == 0 {
        return Vec::new();
    }

    #[derive(Default, Clone)]
    struct Acc {
        predicted_sum: f64,
        actual_sum: f64,
        count: usize,
    }

    let width = 1.0 / num_buckets as f64;
    let mut bins = vec![Acc::default(); num_buckets];

    for sample in samples {
        let idx = ((sample.predicted / width) as usize).min(num_buckets - 1);
        let bin = &mut bins[idx];
        bin.predicted_sum += sample.predicted;
        bin.actual_sum += sample.actual;
        bin.count += 1;
    }

    bins.iter()
        .enumerate()
        .filter(|(_, bin)| bin.count > 0)
        .map(|(i, bin)| {
            let n = bin.count as f64;
            let actual_avg = bin.actual_sum / n;
            let (confidence_lower, confidence_upper) = wilson_interval(actual_avg, n);
            CalibrationBucket {
                range_start: i as f64 * width,
                range_end: (i + 1) as f64 * width,
                predicted_avg: bin.predicted_sum / n,
                actual_avg,
                count: bin.count,
                confidence_lower,
                confidence_upper,
            }
        })
        .collect()
}

/// Wilson score interval for an observed proportion
fn wilson_interval(p_hat: f64, n: f64) -> (f64, f64) {
    let z = WILSON_Z;
    let denom = 1.0 + z * z / n;
    let center = (p_hat + z * z / (2.0 * n)) / denom;
    let margin = z * ((p_hat * (1.0 - p_hat) + z * z / (4.0 * n)) / n).sqrt() / denom;
    ((center - margin).clamp(0.0, 1.0), (center + margin).clamp(0.0, 1.0))
}

/// Murphy decomposition over equal-width probability bins
///
/// Empty input returns the all-zero decomposition.
pub fn decompose(samples: &[CalibrationSample], num_buckets: usize) -> BrierDecomposition {
    if samples.is_empty() {
        return BrierDecomposition::default();
    }

    let total = samples.len() as f64;
    let base_rate = samples.iter().map(|s| s.actual).sum::<f64>() / total;
    let uncertainty = base_rate * (1.0 - base_rate);

    let mut reliability = 0.0;
    let mut resolution = 0.0;
    for bucket in bucketize(samples, num_buckets) {
        let weight = bucket.count as f64 / total;
        reliability += weight * (bucket.predicted_avg - bucket.actual_avg).powi(2);
        resolution += weight * (bucket.actual_avg - base_rate).powi(2);
    }

    BrierDecomposition {
        brier_score: brier_score(samples),
        reliability,
        resolution,
        uncertainty,
        calibration_error: reliability.sqrt(),
    }
}

/// Expected calibration error: count-weighted mean |predicted - actual| gap
pub fn ece(buckets: &[CalibrationBucket]) -> f64 {
    let total: usize = buckets.iter().map(|b| b.count).sum();
    if total == 0 {
        return 0.0;
    }
    buckets
        .iter()
        .map(|b| (b.count as f64 / total as f64) * (b.predicted_avg - b.actual_avg).abs())
        .sum()
}

/// Maximum calibration error: worst single-bucket gap
pub fn mce(buckets: &[CalibrationBucket]) -> f64 {
    buckets
        .iter()
        .map(|b| (b.predicted_avg - b.actual_avg).abs())
        .fold(0.0, f64::max)
}

/// Fixed grading thresholds on the Brier score
pub fn grade(brier_score: f64) -> CalibrationGrade {
    let (grade, label) = if brier_score <= 0.10 {
        ("A+", "Excellent calibration")
    } else if brier_score <= 0.15 {
        ("A", "Strong calibration")
    } else if brier_score <= 0.20 {
        ("B", "Good calibration")
    } else if brier_score <= 0.25 {
        ("C", "Acceptable calibration")
    } else if brier_score <= 0.30 {
        ("D", "Weak calibration")
    } else {
        ("F", "Poor calibration")
    };
    CalibrationGrade {
        grade: grade.to_string(),
        label: label.to_string(),
    }
}
