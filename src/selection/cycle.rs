//! One decision cycle: candidates in, slip out.
//!
//! The flow is linear with no retries: collect candidates, evaluate every
//! gate on every candidate, assign the eligible subset to slots, stop.
//! Both terminal outcomes carry full diagnostics: a valid slip keeps each
//! leg's selection reason and drivers, an invalid slip keeps the missing
//! slot names, and every candidate's gate report rides along either way.
//!
//! Cycles share no mutable state, so independent slates can run
//! concurrently on their own candidate sets and config snapshots.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::Result;

use super::candidate::Candidate;
use super::gates::{GatePipeline, GateReport};
use super::slots::{assign, Slip, SlotTable, SlotsConfig};

/// Outcome of one cycle, with diagnostics for both terminal states
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub slip: Slip,
    /// One report per input candidate, in input order; reasons retained
    pub gate_reports: Vec<GateReport>,
    pub candidate_count: usize,
    pub eligible_count: usize,
}

/// Runs decision cycles against a validated slot table
pub struct DecisionCycle {
    gates: GatePipeline,
    table: SlotTable,
    slots_config: SlotsConfig,
}

impl DecisionCycle {
    /// Build a cycle runner on the standard slot table
    ///
    /// The table is validated here, at startup, so an invalid layout is a
    /// construction error rather than a per-cycle surprise.
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_table(config, SlotTable::standard())
    }

    /// Build a cycle runner on a custom slot table
    pub fn with_table(config: &AppConfig, table: SlotTable) -> Result<Self> {
        table.validate()?;
        Ok(Self {
            gates: GatePipeline::new(config.gates.clone()),
            table,
            slots_config: config.slots.clone(),
        })
    }

    /// Run one cycle over a candidate snapshot
    ///
    /// An empty snapshot is normal and produces an invalid slip naming
    /// every slot, never an error.
    pub fn run(&self, candidates: &[Candidate]) -> CycleReport {
        debug!(candidates = candidates.len(), "decision cycle started");

        let gate_reports: Vec<GateReport> = candidates
            .iter()
            .map(|candidate| self.gates.evaluate(candidate))
            .collect();

        let eligible: Vec<Candidate> = candidates
            .iter()
            .zip(&gate_reports)
            .filter(|(_, report)| report.eligible())
            .map(|(candidate, _)| candidate.clone())
            .collect();
        debug!(eligible = eligible.len(), "gate evaluation complete");

        let slip = assign(&eligible, &self.table, &self.slots_config);
        match &slip {
            Slip::Valid { legs } => debug!(legs = legs.len(), "slip assembled"),
            Slip::Invalid { missing_slots } => {
                debug!(missing = ?missing_slots, "slip infeasible");
            }
        }

        CycleReport {
            slip,
            candidate_count: candidates.len(),
            eligible_count: eligible.len(),
            gate_reports,
        }
    }
}
