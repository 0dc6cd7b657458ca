use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::calibration::CalibrationConfig;
use crate::selection::slots::SlotTable;
use crate::selection::{GatesConfig, SlotsConfig};

/// Main configuration structure
///
/// Every threshold the engines consult lives here and is passed in
/// explicitly; nothing reads from globals, so tests and parallel slates
/// can run with different snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub calibration: CalibrationConfig,
    pub gates: GatesConfig,
    pub slots: SlotsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SLIPFORGE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SLIPFORGE_GATES__EDGE_MULTIPLIER, etc.)
            .add_source(
                Environment::with_prefix("SLIPFORGE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Calibration params
        if self.calibration.num_buckets < 2 {
            errors.push("calibration.num_buckets must be at least 2".to_string());
        }

        // Gate params
        if self.gates.privileged_roles.is_empty() {
            errors.push("gates.privileged_roles must not be empty".to_string());
        }
        if self.gates.edge_multiplier <= 0.0 {
            errors.push("gates.edge_multiplier must be positive".to_string());
        }
        if self.gates.edge_floor < Decimal::ZERO {
            errors.push("gates.edge_floor cannot be negative".to_string());
        }
        if self.gates.min_avg_minutes < 0.0 {
            errors.push("gates.min_avg_minutes cannot be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.gates.min_fatigue_score) {
            errors.push("gates.min_fatigue_score must be between 0 and 1".to_string());
        }
        if self.gates.max_variance_ratio <= 0.0 {
            errors.push("gates.max_variance_ratio must be positive".to_string());
        }
        if !(0.0..100.0).contains(&self.gates.min_confidence_pct) {
            errors.push("gates.min_confidence_pct must be in [0, 100)".to_string());
        }

        // Slot params
        if self.slots.flex_edge_floor <= Decimal::ZERO {
            errors.push("slots.flex_edge_floor must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.slots.fatigue_driver_min) {
            errors.push("slots.fatigue_driver_min must be between 0 and 1".to_string());
        }

        // Logging params
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => errors.push(format!("Unknown log level: {other}")),
        }

        // The slot layout is static but still checked at startup
        if let Err(err) = SlotTable::standard().validate() {
            errors.push(err.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
