//! slipforge — calibration and gated slate selection for a props
//! recommendation platform.
//!
//! Two engines, both synchronous and free of I/O:
//!
//! - `calibration` learns how trustworthy predicted probabilities are from
//!   settled outcomes (Brier decomposition, isotonic regression) and
//!   publishes the derived remapping atomically.
//! - `selection` runs live candidates through five qualification gates and
//!   fills the fixed slip layout deterministically, failing closed when a
//!   slot cannot be filled.
//!
//! Data acquisition, persistence, scheduling, and presentation belong to
//! calling collaborators.

pub mod calibration;
pub mod config;
pub mod error;
pub mod observer;
pub mod selection;

pub use calibration::{
    brier_score, bucketize, decompose, ece, grade, isotonic_regression, log_loss, mce, run_batch,
    BrierDecomposition, BucketTableKey, CalibrationBucket, CalibrationConfig, CalibrationGrade,
    CalibrationRegistry, CalibrationReport, CalibrationSample, IsotonicMapping, MappingKey,
    MappingPoint,
};
pub use config::AppConfig;
pub use error::{Result, SlipforgeError};
pub use observer::{CalibrationEvent, CalibrationObserver, NoopObserver, TracingObserver};
pub use selection::{
    Candidate, CycleReport, DecisionCycle, Direction, Gate, GatePipeline, GateReport, GateResult,
    GatesConfig, ParticipationMetrics, RiskFlag, Role, Slip, SlipLeg, Slot, SlotKind, SlotTable,
    SlotsConfig, StatCategory,
};
