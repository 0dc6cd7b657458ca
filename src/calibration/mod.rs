//! Calibration engine
//!
//! Learns how trustworthy the model's predicted probabilities are by
//! comparing them against settled outcomes, and produces the monotonic
//! remapping the selection side applies to live confidences.
//!
//! The pipeline: settled `CalibrationSample`s -> Brier score and Murphy
//! decomposition (`metrics`) -> isotonic remapping (`isotonic`) -> one
//! `CalibrationReport` per batch (`batch`) -> atomically published derived
//! state (`registry`).

pub mod batch;
pub mod isotonic;
pub mod metrics;
pub mod registry;

pub use batch::{run_batch, CalibrationConfig, CalibrationReport};
pub use isotonic::{isotonic_regression, IsotonicMapping, MappingPoint};
pub use metrics::{
    brier_score, bucketize, decompose, ece, grade, log_loss, mce, BrierDecomposition,
    CalibrationBucket, CalibrationGrade, CalibrationSample,
};
pub use registry::{
    BucketTableKey, CalibrationRegistry, MappingKey, PublishedBuckets, PublishedMapping,
};
