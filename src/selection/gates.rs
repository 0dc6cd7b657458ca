//! Qualification gates for live candidates.
//!
//! Five independent pass/fail rules; a candidate is eligible only when all
//! five pass. These are risk controls, not alpha sources: every failure
//! carries a reason string, and all five results are retained per candidate
//! for downstream diagnostics and threshold tuning.
//!
//! Thresholds arrive as injected configuration. The defaults mirror the
//! reference deployment's relaxed values; production values are expected
//! to come from the config layer.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, Direction, RiskFlag, Role};

/// Gate thresholds, injected per decision cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatesConfig {
    // Participation / rotation gate
    pub privileged_roles: Vec<Role>,
    pub max_infractions: u32,
    pub min_avg_minutes: f64,

    // Edge vs uncertainty gate
    pub edge_multiplier: f64,
    pub edge_floor: Decimal,

    // Directional scrutiny gate (under legs only)
    pub min_fatigue_score: f64,
    pub max_variance_ratio: f64,

    // Confidence floor gate
    pub min_confidence_pct: f64,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            privileged_roles: vec![Role::Starter, Role::PrimaryHandler, Role::RotationRegular],
            max_infractions: 4,
            min_avg_minutes: 24.0,
            edge_multiplier: 1.25,
            edge_floor: dec!(0.5),
            min_fatigue_score: 0.45,
            max_variance_ratio: 0.35,
            min_confidence_pct: 55.0,
        }
    }
}

/// The five qualification rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    Participation,
    Category,
    EdgeVsUncertainty,
    DirectionalScrutiny,
    ConfidenceFloor,
}

impl Gate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Participation => "participation",
            Self::Category => "category",
            Self::EdgeVsUncertainty => "edge_vs_uncertainty",
            Self::DirectionalScrutiny => "directional_scrutiny",
            Self::ConfidenceFloor => "confidence_floor",
        }
    }
}

/// One gate's verdict on one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub passed: bool,
    pub reason: Option<String>,
}

impl GateResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: String) -> Self {
        Self {
            passed: false,
            reason: Some(reason),
        }
    }

    fn from_failures(failures: Vec<String>) -> Self {
        if failures.is_empty() {
            Self::pass()
        } else {
            Self::fail(failures.join("; "))
        }
    }
}

/// A gate paired with its result, so reports stay self-describing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOutcome {
    pub gate: Gate,
    pub result: GateResult,
}

/// All five verdicts for one candidate; never discarded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    pub subject_id: String,
    pub outcomes: Vec<GateOutcome>,
}

impl GateReport {
    /// Eligible iff every gate passed (logical AND, order-independent)
    pub fn eligible(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.passed)
    }

    /// Failure reasons prefixed with the gate name
    pub fn failure_reasons(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.result.passed)
            .map(|o| {
                format!(
                    "{}: {}",
                    o.gate.name(),
                    o.result.reason.as_deref().unwrap_or("failed")
                )
            })
            .collect()
    }
}

/// Evaluates candidates against the five gates
pub struct GatePipeline {
    config: GatesConfig,
}

impl GatePipeline {
    pub fn new(config: GatesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GatesConfig {
        &self.config
    }

    /// Run all five gates; every result is retained
    pub fn evaluate(&self, candidate: &Candidate) -> GateReport {
        let outcomes = vec![
            GateOutcome {
                gate: Gate::Participation,
                result: self.check_participation(candidate),
            },
            GateOutcome {
                gate: Gate::Category,
                result: self.check_category(candidate),
            },
            GateOutcome {
                gate: Gate::EdgeVsUncertainty,
                result: self.check_edge(candidate),
            },
            GateOutcome {
                gate: Gate::DirectionalScrutiny,
                result: self.check_directional_scrutiny(candidate),
            },
            GateOutcome {
                gate: Gate::ConfidenceFloor,
                result: self.check_confidence_floor(candidate),
            },
        ];

        GateReport {
            subject_id: candidate.subject_id.clone(),
            outcomes,
        }
    }

    /// Role privileged, rotation stable, infractions and minutes in range.
    /// All four sub-conditions required.
    fn check_participation(&self, candidate: &Candidate) -> GateResult {
        let mut failures = Vec::new();

        if !self.config.privileged_roles.contains(&candidate.role) {
            failures.push(format!("Role {:?} outside privileged set", candidate.role));
        }
        if candidate.participation.rotation_volatile {
            failures.push("Rotation flagged volatile".to_string());
        }
        if candidate.participation.infractions > self.config.max_infractions {
            failures.push(format!(
                "Infractions {} > max {}",
                candidate.participation.infractions, self.config.max_infractions
            ));
        }
        if candidate.participation.avg_minutes < self.config.min_avg_minutes {
            failures.push(format!(
                "Average minutes {:.1} < min {:.1}",
                candidate.participation.avg_minutes, self.config.min_avg_minutes
            ));
        }

        GateResult::from_failures(failures)
    }

    /// Hard block on anything outside the three core categories
    fn check_category(&self, candidate: &Candidate) -> GateResult {
        if candidate.stat_category.is_core_category() {
            GateResult::pass()
        } else {
            GateResult::fail(format!(
                "Category {:?} outside the recommendable tiers",
                candidate.stat_category
            ))
        }
    }

    /// Edge must clear both the uncertainty multiple and the absolute floor
    fn check_edge(&self, candidate: &Candidate) -> GateResult {
        let mut failures = Vec::new();

        let edge = candidate.edge_f64();
        let required = candidate.uncertainty * self.config.edge_multiplier;
        if edge < required {
            failures.push(format!(
                "Edge {:.2} < {:.2} ({}x uncertainty {:.2})",
                edge, required, self.config.edge_multiplier, candidate.uncertainty
            ));
        }
        if candidate.edge() <= self.config.edge_floor {
            failures.push(format!(
                "Edge {:.2} <= absolute floor {}",
                edge, self.config.edge_floor
            ));
        }

        GateResult::from_failures(failures)
    }

    /// Extra scrutiny for under legs; overs pass trivially
    fn check_directional_scrutiny(&self, candidate: &Candidate) -> GateResult {
        if candidate.direction == Direction::Over {
            return GateResult::pass();
        }

        let mut failures = Vec::new();

        let fatigue = candidate.participation.fatigue_score();
        if fatigue < self.config.min_fatigue_score {
            failures.push(format!(
                "Fatigue score {:.2} < min {:.2}",
                fatigue, self.config.min_fatigue_score
            ));
        }

        let ratio = candidate.variance_ratio();
        if ratio > self.config.max_variance_ratio {
            failures.push(format!(
                "Variance ratio {:.2} > max {:.2}",
                ratio, self.config.max_variance_ratio
            ));
        }

        for flag in [RiskFlag::InjuryWatch, RiskFlag::FoulTrouble] {
            if candidate.has_flag(flag) {
                failures.push(format!("Risk flag {flag:?} blocks under legs"));
            }
        }

        GateResult::from_failures(failures)
    }

    /// Calibrated confidence must exceed the floor, with no disqualifying flags
    fn check_confidence_floor(&self, candidate: &Candidate) -> GateResult {
        let mut failures = Vec::new();

        if candidate.calibrated_confidence <= self.config.min_confidence_pct {
            failures.push(format!(
                "Calibrated confidence {:.1}% <= min {:.1}%",
                candidate.calibrated_confidence, self.config.min_confidence_pct
            ));
        }

        for flag in [RiskFlag::InjuryWatch, RiskFlag::LineMovedAgainst] {
            if candidate.has_flag(flag) {
                failures.push(format!("Disqualifying risk flag {flag:?}"));
            }
        }

        GateResult::from_failures(failures)
    }
}
