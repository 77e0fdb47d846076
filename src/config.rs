//! Engine settings.
//!
//! Settings are plain values; building them from the environment is the only
//! place the engine touches anything ambient. Every pipeline entry point
//! takes settings as a parameter, so tests and embedding services construct
//! them directly.

use crate::domain::Decimal;
use crate::error::SettingsError;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::str::FromStr;

/// Whether aggregate P&L figures net fees in.
///
/// Per-trade and per-day records always carry gross P&L with the fee as a
/// separate field; this switch only affects the projected scalar metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PnlMode {
    #[default]
    Gross,
    Net,
}

/// Settings the pipeline needs beyond its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Timezone used to bucket close timestamps into calendar days.
    pub timezone: Tz,
    /// Starting capital for portfolio-value and percent metrics.
    pub initial_capital: Decimal,
    /// Fee netting policy for scalar metrics.
    pub pnl_mode: PnlMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            initial_capital: Decimal::from(10_000),
            pnl_mode: PnlMode::Gross,
        }
    }
}

impl EngineSettings {
    /// Build settings from the process environment.
    ///
    /// # Errors
    /// Returns a [`SettingsError`] for an unparseable value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_env_map(std::env::vars().collect())
    }

    /// Build settings from an explicit environment map.
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, SettingsError> {
        let timezone = match env_map.get("TIMEZONE") {
            None => chrono_tz::UTC,
            Some(name) => Tz::from_str(name).map_err(|_| {
                SettingsError::InvalidValue(
                    "TIMEZONE".to_string(),
                    format!("unknown IANA timezone {name}"),
                )
            })?,
        };

        let initial_capital = env_map
            .get("INITIAL_CAPITAL")
            .map(|s| s.as_str())
            .unwrap_or("10000");
        let initial_capital = Decimal::from_str_canonical(initial_capital).map_err(|_| {
            SettingsError::InvalidValue(
                "INITIAL_CAPITAL".to_string(),
                "must be a decimal number".to_string(),
            )
        })?;
        if initial_capital.is_negative() {
            return Err(SettingsError::InvalidValue(
                "INITIAL_CAPITAL".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let pnl_mode = match env_map.get("PNL_MODE").map(|s| s.as_str()).unwrap_or("gross") {
            "gross" => PnlMode::Gross,
            "net" => PnlMode::Net,
            other => {
                return Err(SettingsError::InvalidValue(
                    "PNL_MODE".to_string(),
                    format!("must be gross or net, got {other}"),
                ))
            }
        };

        Ok(EngineSettings {
            timezone,
            initial_capital,
            pnl_mode,
        })
    }
}
