//! Gated selection engine
//!
//! Turns a per-cycle snapshot of live candidates into either a complete
//! slip or an explicit structured failure. Candidates pass through five
//! independent qualification gates (`gates`), the eligible subset fills
//! the fixed slot layout by deterministic first fit (`slots`), and one
//! `DecisionCycle` run (`cycle`) ties the two together with full
//! diagnostics.

pub mod candidate;
pub mod cycle;
pub mod gates;
pub mod slots;

pub use candidate::{
    Candidate, Direction, ParticipationMetrics, RiskFlag, Role, StatCategory,
};
pub use cycle::{CycleReport, DecisionCycle};
pub use gates::{Gate, GateOutcome, GatePipeline, GateReport, GateResult, GatesConfig};
pub use slots::{
    assign, derive_drivers, Slip, SlipLeg, Slot, SlotKind, SlotTable, SlotsConfig,
};
