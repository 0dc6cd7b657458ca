//! Live wager candidates ("edges") and their situational data.
//!
//! A candidate materializes fresh each decision cycle from a live snapshot
//! joined upstream with player state; this core never matches names or
//! fetches anything. Quoted numbers (the posted line, the projection) are
//! `Decimal`; model quantities stay `f64`.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statistical category of a prop market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    Points,
    Rebounds,
    Assists,
    Threes,
    Steals,
    Blocks,
    Turnovers,
    PointsReboundsAssists,
}

impl StatCategory {
    /// The three categories the product recommends on; everything else is
    /// hard-blocked by the category gate
    pub fn is_core_category(&self) -> bool {
        matches!(self, Self::Points | Self::Rebounds | Self::Assists)
    }
}

/// Side of the posted line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Over,
    Under,
}

/// Player's role in the rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Starter,
    PrimaryHandler,
    RotationRegular,
    Bench,
    TwoWay,
}

/// Situational risk markers attached by upstream enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskFlag {
    InjuryWatch,
    RestRisk,
    BlowoutRisk,
    FoulTrouble,
    RoleChange,
    LineMovedAgainst,
}

/// Observed playing-time profile for the subject
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipationMetrics {
    /// Season average minutes per game
    pub avg_minutes: f64,
    /// Minutes in the most recent game
    pub recent_minutes: f64,
    /// Season-long minutes baseline for the fatigue comparison
    pub season_minutes: f64,
    /// Games played over the last seven days
    pub games_last_week: u8,
    /// Accumulated infractions (technicals, flagrants) this season
    pub infractions: u32,
    /// Upstream flag: the rotation around this player is in flux
    pub rotation_volatile: bool,
}

impl ParticipationMetrics {
    /// Fatigue/decline score in [0, 1]; higher supports an under leg
    ///
    /// Blends recent overuse versus the season baseline, schedule density
    /// over the last week, and sustained minute load.
    pub fn fatigue_score(&self) -> f64 {
        let overuse = if self.season_minutes > 0.0 {
            ((self.recent_minutes - self.season_minutes) / self.season_minutes).max(0.0)
        } else {
            0.0
        };
        let density = (f64::from(self.games_last_week) / 4.0).min(1.0);
        let load = (self.avg_minutes / 38.0).min(1.0);

        (0.4 * overuse.min(1.0) + 0.35 * density + 0.25 * load).min(1.0)
    }
}

/// A live wager opportunity for one decision cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub subject_id: String,
    pub display_name: String,
    pub stat_category: StatCategory,
    /// Posted line, as quoted by the book
    pub line: Decimal,
    pub direction: Direction,
    /// Model projection for the stat, in line units
    pub projected_value: Decimal,
    /// Model uncertainty around the projection, in line units
    pub uncertainty: f64,
    pub role: Role,
    pub participation: ParticipationMetrics,
    #[serde(default)]
    pub risk_flags: HashSet<RiskFlag>,
    /// Calibrated confidence as a percentage (0-100), produced upstream by
    /// applying the published isotonic mapping
    pub calibrated_confidence: f64,
}

impl Candidate {
    /// Absolute distance between projection and posted line
    pub fn edge(&self) -> Decimal {
        (self.projected_value - self.line).abs()
    }

    pub fn edge_f64(&self) -> f64 {
        self.edge().to_f64().unwrap_or(0.0)
    }

    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.risk_flags.contains(&flag)
    }

    /// Uncertainty relative to the projection magnitude
    ///
    /// Non-positive projections make the ratio infinite, which fails any
    /// finite ceiling.
    pub fn variance_ratio(&self) -> f64 {
        let projected = self.projected_value.to_f64().unwrap_or(0.0);
        if projected <= 0.0 {
            return f64::INFINITY;
        }
        self.uncertainty / projected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate(projected: Decimal, line: Decimal) -> Candidate {
        Candidate {
            subject_id: "nba_00123".to_string(),
            display_name: "Test Player".to_string(),
            stat_category: StatCategory::Points,
            line,
            direction: Direction::Over,
            projected_value: projected,
            uncertainty: 2.0,
            role: Role::Starter,
            participation: ParticipationMetrics::default(),
            risk_flags: HashSet::new(),
            calibrated_confidence: 60.0,
        }
    }

    #[test]
    fn test_edge_is_absolute() {
        assert_eq!(candidate(dec!(12), dec!(8)).edge(), dec!(4));
        assert_eq!(candidate(dec!(8), dec!(12)).edge(), dec!(4));
    }

    #[test]
    fn test_core_categories() {
        assert!(StatCategory::Points.is_core_category());
        assert!(StatCategory::Rebounds.is_core_category());
        assert!(StatCategory::Assists.is_core_category());
        assert!(!StatCategory::Threes.is_core_category());
        assert!(!StatCategory::PointsReboundsAssists.is_core_category());
    }

    #[test]
    fn test_variance_ratio() {
        let c = candidate(dec!(10), dec!(8));
        assert!((c.variance_ratio() - 0.2).abs() < 1e-12);

        let zero = candidate(dec!(0), dec!(8));
        assert!(zero.variance_ratio().is_infinite());
    }

    #[test]
    fn test_fatigue_score_rises_with_load() {
        let rested = ParticipationMetrics {
            avg_minutes: 20.0,
            recent_minutes: 18.0,
            season_minutes: 20.0,
            games_last_week: 1,
            ..Default::default()
        };
        let run_down = ParticipationMetrics {
            avg_minutes: 37.0,
            recent_minutes: 42.0,
            season_minutes: 33.0,
            games_last_week: 4,
            ..Default::default()
        };

        assert!(run_down.fatigue_score() > rested.fatigue_score());
        assert!(run_down.fatigue_score() <= 1.0);
    }

    #[test]
    fn test_fatigue_score_handles_zero_baseline() {
        let fresh = ParticipationMetrics::default();
        assert!(fresh.fatigue_score() >= 0.0);
        assert!(fresh.fatigue_score() < 0.1);
    }
}
