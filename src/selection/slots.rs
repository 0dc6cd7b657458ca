//! Slot assignment: mapping gate-eligible candidates into the fixed slip.
//!
//! The slip has a small, statically known set of named slots, each with an
//! acceptance predicate and a unique priority rank. Assignment is
//! deterministic first-fit over a total candidate order, and the result is
//! fail-closed: either every slot is filled by a distinct subject, or the
//! slip is invalid and names exactly the slots left empty. A partially
//! filled slip is never presented as valid.

use std::cmp::Ordering;
use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipforgeError};

use super::candidate::{Candidate, Direction, Role, StatCategory};

/// Slot-layer settings, injected per decision cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    /// Minimum absolute edge for a non-core category to qualify for flex
    pub flex_edge_floor: Decimal,
    /// Fatigue score at which an under leg earns a fatigue driver
    pub fatigue_driver_min: f64,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            flex_edge_floor: dec!(4.0),
            fatigue_driver_min: 0.55,
        }
    }
}

/// What a slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    /// Narrow: points scored by a starter, over side only
    Anchor,
    /// Narrow: assists by the primary ball-handler, either side
    Playmaker,
    /// Residual: any core category; non-core categories only on an
    /// unusually large edge
    Flex,
}

/// A named, role-typed position in the slip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub priority: u8,
    pub kind: SlotKind,
}

impl Slot {
    pub fn accepts(&self, candidate: &Candidate, config: &SlotsConfig) -> bool {
        match self.kind {
            SlotKind::Anchor => {
                candidate.stat_category == StatCategory::Points
                    && candidate.role == Role::Starter
                    && candidate.direction == Direction::Over
            }
            SlotKind::Playmaker => {
                candidate.stat_category == StatCategory::Assists
                    && candidate.role == Role::PrimaryHandler
            }
            SlotKind::Flex => {
                candidate.stat_category.is_core_category()
                    || candidate.edge() >= config.flex_edge_floor
            }
        }
    }
}

/// The fixed slot set, ordered by priority and validated at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    /// Build a table, ordering slots by priority rank
    pub fn new(mut slots: Vec<Slot>) -> Self {
        slots.sort_by_key(|s| s.priority);
        Self { slots }
    }

    /// The production slip layout: anchor, playmaker, flex
    pub fn standard() -> Self {
        Self::new(vec![
            Slot {
                name: "anchor".to_string(),
                priority: 1,
                kind: SlotKind::Anchor,
            },
            Slot {
                name: "playmaker".to_string(),
                priority: 2,
                kind: SlotKind::Playmaker,
            },
            Slot {
                name: "flex".to_string(),
                priority: 3,
                kind: SlotKind::Flex,
            },
        ])
    }

    /// Reject empty tables and duplicate names or priority ranks
    pub fn validate(&self) -> Result<()> {
        if self.slots.is_empty() {
            return Err(SlipforgeError::SlotTable("no slots defined".to_string()));
        }

        let mut names = HashSet::new();
        let mut priorities = HashSet::new();
        for slot in &self.slots {
            if !names.insert(slot.name.as_str()) {
                return Err(SlipforgeError::SlotTable(format!(
                    "duplicate slot name: {}",
                    slot.name
                )));
            }
            if !priorities.insert(slot.priority) {
                return Err(SlipforgeError::SlotTable(format!(
                    "duplicate slot priority: {}",
                    slot.priority
                )));
            }
        }
        Ok(())
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// One selected leg of a valid slip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlipLeg {
    pub slot: String,
    pub subject_id: String,
    pub display_name: String,
    pub stat_category: StatCategory,
    pub direction: Direction,
    pub line: Decimal,
    pub calibrated_confidence: f64,
    /// Why this candidate was selected, for attribution
    pub reason: String,
    /// Up to two deterministic driver phrases
    pub drivers: Vec<String>,
}

/// The slip: complete or explicitly infeasible, nothing in between
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Slip {
    Valid { legs: Vec<SlipLeg> },
    Invalid { missing_slots: Vec<String> },
}

impl Slip {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn legs(&self) -> &[SlipLeg] {
        match self {
            Self::Valid { legs } => legs,
            Self::Invalid { .. } => &[],
        }
    }
}

/// Assign gate-eligible candidates to slots by first fit
///
/// Order: best matching slot priority ascending, calibrated confidence
/// descending, then subject id so ties break the same way every run. Each
/// candidate fills at most one slot, each subject appears at most once.
pub fn assign(eligible: &[Candidate], table: &SlotTable, config: &SlotsConfig) -> Slip {
    let mut ranked: Vec<(&Candidate, u8)> = eligible
        .iter()
        .filter_map(|candidate| {
            table
                .slots()
                .iter()
                .filter(|slot| slot.accepts(candidate, config))
                .map(|slot| slot.priority)
                .min()
                .map(|priority| (candidate, priority))
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.1.cmp(&b.1)
            .then_with(|| {
                b.0.calibrated_confidence
                    .partial_cmp(&a.0.calibrated_confidence)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.0.subject_id.cmp(&b.0.subject_id))
    });

    let mut filled: Vec<Option<SlipLeg>> = table.slots().iter().map(|_| None).collect();
    let mut used_subjects: HashSet<&str> = HashSet::new();

    for (candidate, _) in &ranked {
        if used_subjects.contains(candidate.subject_id.as_str()) {
            continue;
        }
        for (idx, slot) in table.slots().iter().enumerate() {
            if filled[idx].is_none() && slot.accepts(candidate, config) {
                filled[idx] = Some(build_leg(slot, candidate, config));
                used_subjects.insert(candidate.subject_id.as_str());
                break;
            }
        }
    }

    let missing_slots: Vec<String> = table
        .slots()
        .iter()
        .zip(&filled)
        .filter(|(_, leg)| leg.is_none())
        .map(|(slot, _)| slot.name.clone())
        .collect();

    if missing_slots.is_empty() {
        Slip::Valid {
            legs: filled.into_iter().flatten().collect(),
        }
    } else {
        Slip::Invalid { missing_slots }
    }
}

fn build_leg(slot: &Slot, candidate: &Candidate, config: &SlotsConfig) -> SlipLeg {
    SlipLeg {
        slot: slot.name.clone(),
        subject_id: candidate.subject_id.clone(),
        display_name: candidate.display_name.clone(),
        stat_category: candidate.stat_category,
        direction: candidate.direction,
        line: candidate.line,
        calibrated_confidence: candidate.calibrated_confidence,
        reason: format!(
            "Edge {:.1} at {:.0}% calibrated confidence",
            candidate.edge_f64(),
            candidate.calibrated_confidence
        ),
        drivers: derive_drivers(candidate, config),
    }
}

/// Deterministic driver phrases: role, then category, then fatigue for
/// qualifying under legs; truncated to two
pub fn derive_drivers(candidate: &Candidate, config: &SlotsConfig) -> Vec<String> {
    let mut drivers = Vec::with_capacity(3);

    if let Some(phrase) = role_driver(candidate.role) {
        drivers.push(phrase.to_string());
    }

    drivers.push(category_driver(candidate.stat_category).to_string());

    if candidate.direction == Direction::Under
        && candidate.participation.fatigue_score() >= config.fatigue_driver_min
    {
        drivers.push(format!(
            "Fatigue-driven under ({:.2} decline score)",
            candidate.participation.fatigue_score()
        ));
    }

    drivers.truncate(2);
    drivers
}

fn role_driver(role: Role) -> Option<&'static str> {
    match role {
        Role::Starter => Some("Stable high-minute role"),
        Role::PrimaryHandler => Some("Primary ball-handler"),
        Role::RotationRegular => Some("Locked-in rotation minutes"),
        Role::Bench | Role::TwoWay => None,
    }
}

fn category_driver(category: StatCategory) -> &'static str {
    match category {
        StatCategory::Points => "Volume scoring profile",
        StatCategory::Rebounds => "Elite positional rebounding advantage",
        StatCategory::Assists => "On-ball creation volume",
        _ => "Outsized edge against the posted line",
    }
}
