use std::time::Duration;

use endless_defence_system_spawning::DEFAULT_AUTO_WAVE_DELAY;
use endless_defence_system_tower_combat::DEFAULT_SELL_REFUND_FRACTION;
use endless_defence_world::GridSpec;
use serde::Deserialize;
use thiserror::Error;

/// Default match seed used when no configuration overrides it.
pub const DEFAULT_SEED: u64 = 0x5EED_DEF0;

/// Money available before the first purchase.
pub const DEFAULT_STARTING_MONEY: u32 = 200;

/// Player health at the start of a match.
pub const DEFAULT_STARTING_HEALTH: u32 = 20;

/// Largest accepted time scale; commands asking for more are clamped to it.
pub const MAX_TIME_SCALE: f32 = 100.0;

/// Reasons a match configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document is malformed or has fields of the wrong type.
    #[error("failed to parse match configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A field parsed but holds a value the simulation cannot run with.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Dimensions of every procedurally generated map segment.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of build cells across the segment.
    pub columns: u32,
    /// Number of build cells along the segment's depth.
    pub rows: u32,
    /// Edge length of a single build cell in world units.
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        let spec = GridSpec::default();
        Self {
            columns: spec.columns,
            rows: spec.rows,
            cell_size: spec.cell_size,
        }
    }
}

impl From<GridConfig> for GridSpec {
    fn from(config: GridConfig) -> Self {
        GridSpec {
            columns: config.columns,
            rows: config.rows,
            cell_size: config.cell_size,
        }
    }
}

/// Tunables of a single match, loadable from TOML.
///
/// Every field is optional in the document; missing ones take the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Seed every random stream of the match is derived from.
    pub seed: u64,
    /// Money the player starts with.
    pub starting_money: u32,
    /// Health the player starts with.
    pub starting_health: u32,
    /// Seconds between a cleared wave and the next automatic wave.
    pub auto_wave_delay_secs: f32,
    /// Initial factor applied to every tick's delta time.
    pub time_scale: f32,
    /// Fraction of a tower's cumulative spend refunded when sold.
    pub sell_refund_fraction: f32,
    /// Map segment dimensions.
    pub grid: GridConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            starting_money: DEFAULT_STARTING_MONEY,
            starting_health: DEFAULT_STARTING_HEALTH,
            auto_wave_delay_secs: DEFAULT_AUTO_WAVE_DELAY.as_secs_f32(),
            time_scale: 1.0,
            sell_refund_fraction: DEFAULT_SELL_REFUND_FRACTION,
            grid: GridConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if !(self.auto_wave_delay_secs.is_finite() && self.auto_wave_delay_secs >= 0.0) {
            return invalid("auto_wave_delay_secs", "must be a non-negative number of seconds");
        }
        if !(0.0..=MAX_TIME_SCALE).contains(&self.time_scale) {
            return invalid("time_scale", "must lie within [0, 100]");
        }
        if !(0.0..=1.0).contains(&self.sell_refund_fraction) {
            return invalid("sell_refund_fraction", "must lie within [0, 1]");
        }
        if self.grid.columns == 0 || self.grid.rows < 2 {
            return invalid("grid", "needs at least one column and two rows");
        }
        if !(self.grid.cell_size.is_finite() && self.grid.cell_size > 0.0) {
            return invalid("grid.cell_size", "must be positive");
        }
        Ok(())
    }

    /// Pause between a cleared wave and the next automatic wave.
    #[must_use]
    pub fn auto_wave_delay(&self) -> Duration {
        Duration::from_secs_f32(self.auto_wave_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = MatchConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, MatchConfig::default());
        assert_eq!(config.auto_wave_delay(), Duration::from_secs(10));
        assert_eq!(GridSpec::from(config.grid), GridSpec::default());
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config = MatchConfig::from_toml_str(
            "seed = 42\nstarting_money = 500\n\n[grid]\ncolumns = 8\n",
        )
        .expect("partial config is valid");

        assert_eq!(config.seed, 42);
        assert_eq!(config.starting_money, 500);
        assert_eq!(config.starting_health, DEFAULT_STARTING_HEALTH);
        assert_eq!(config.grid.columns, 8);
        assert_eq!(config.grid.rows, GridSpec::default().rows);
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        let error = MatchConfig::from_toml_str("seed = \"lots\"").expect_err("wrong type");
        assert!(matches!(error, ConfigError::Parse(_)));

        let error = MatchConfig::from_toml_str("seeds = 1").expect_err("unknown field");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let error = MatchConfig::from_toml_str("sell_refund_fraction = 1.5").expect_err("range");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "sell_refund_fraction",
                ..
            }
        ));

        let error = MatchConfig::from_toml_str("time_scale = -2.0").expect_err("negative");
        assert_eq!(error.to_string(), "invalid `time_scale`: must lie within [0, 100]");

        let error = MatchConfig::from_toml_str("time_scale = 1e30").expect_err("too fast");
        assert!(matches!(error, ConfigError::Invalid { field: "time_scale", .. }));
        assert!(MatchConfig::from_toml_str("time_scale = 100.0").is_ok());
    }
}
