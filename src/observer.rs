//! Structured observer for calibration batch runs.
//!
//! The scoring functions themselves are pure and silent. Progress and
//! intermediate statistics are reported through this trait so the caller
//! decides where they go (tracing, metrics, nowhere).

use tracing::{debug, info};

/// Events emitted while a calibration batch runs
#[derive(Debug, Clone)]
pub enum CalibrationEvent {
    BatchStarted {
        sample_count: usize,
    },
    ScoresComputed {
        brier_score: f64,
        log_loss: f64,
    },
    Decomposed {
        reliability: f64,
        resolution: f64,
        uncertainty: f64,
    },
    MappingFitted {
        control_points: usize,
    },
    /// Too few samples to fit a mapping; the identity mapping is published
    MappingSkipped {
        sample_count: usize,
        min_samples: usize,
    },
    BatchCompleted {
        grade: String,
        ece: f64,
        mce: f64,
    },
}

/// Callback surface supplied by the caller of a calibration batch
pub trait CalibrationObserver {
    fn on_event(&self, event: &CalibrationEvent);
}

/// Observer that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CalibrationObserver for NoopObserver {
    fn on_event(&self, _event: &CalibrationEvent) {}
}

/// Observer that forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CalibrationObserver for TracingObserver {
    fn on_event(&self, event: &CalibrationEvent) {
        match event {
            CalibrationEvent::BatchStarted { sample_count } => {
                debug!(sample_count, "calibration batch started");
            }
            CalibrationEvent::ScoresComputed {
                brier_score,
                log_loss,
            } => {
                debug!(brier_score, log_loss, "scores computed");
            }
            CalibrationEvent::Decomposed {
                reliability,
                resolution,
                uncertainty,
            } => {
                debug!(reliability, resolution, uncertainty, "brier decomposition");
            }
            CalibrationEvent::MappingFitted { control_points } => {
                debug!(control_points, "isotonic mapping fitted");
            }
            CalibrationEvent::MappingSkipped {
                sample_count,
                min_samples,
            } => {
                debug!(
                    sample_count,
                    min_samples, "too few samples, keeping identity mapping"
                );
            }
            CalibrationEvent::BatchCompleted { grade, ece, mce } => {
                info!(%grade, ece, mce, "calibration batch completed");
            }
        }
    }
}
