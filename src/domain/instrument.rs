//! Instrument descriptors and the structured position-grouping key.
//!
//! A tagged union replaces the stringly-typed `asset_type` branching of
//! earlier journal implementations, and [`InstrumentKey`] replaces
//! delimiter-joined composite strings: two executions net against each other
//! iff their keys compare equal, field by field.

use crate::domain::{Decimal, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset class of an instrument, carried onto derived records for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Option,
    Future,
    Crypto,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Equity => write!(f, "equity"),
            AssetClass::Option => write!(f, "option"),
            AssetClass::Future => write!(f, "future"),
            AssetClass::Crypto => write!(f, "crypto"),
        }
    }
}

/// Call or put, for equity options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// What was traded, with only the fields relevant to its asset class.
///
/// Symbol/contract-code decoding happens upstream; by the time an execution
/// reaches the engine its instrument is already structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assetClass", rename_all = "lowercase")]
pub enum Instrument {
    /// A listed share.
    Equity { symbol: Symbol },
    /// A standard equity option contract.
    Option {
        underlying: Symbol,
        option_type: OptionType,
        strike: Decimal,
        expiry: NaiveDate,
        /// Explicit per-contract multiplier; standard contracts omit it.
        multiplier_override: Option<Decimal>,
    },
    /// A dated futures contract.
    Future {
        /// Contract root, e.g. "ES", "CL".
        root: String,
        /// Contract month, 1-12.
        month: u8,
        /// Contract year, four digits.
        year: u16,
        /// Explicit point value; omitted contracts use the root table.
        point_value_override: Option<Decimal>,
    },
    /// A spot crypto pair or coin.
    Crypto { symbol: Symbol },
}

impl Instrument {
    /// The asset class of this instrument.
    pub fn asset_class(&self) -> AssetClass {
        match self {
            Instrument::Equity { .. } => AssetClass::Equity,
            Instrument::Option { .. } => AssetClass::Option,
            Instrument::Future { .. } => AssetClass::Future,
            Instrument::Crypto { .. } => AssetClass::Crypto,
        }
    }

    /// The position-grouping key for this instrument.
    pub fn key(&self) -> InstrumentKey {
        match self {
            Instrument::Equity { symbol } => InstrumentKey::Equity {
                symbol: symbol.clone(),
            },
            Instrument::Option {
                underlying,
                option_type,
                strike,
                expiry,
                ..
            } => InstrumentKey::Option {
                underlying: underlying.clone(),
                option_type: *option_type,
                strike: *strike,
                expiry: *expiry,
            },
            Instrument::Future {
                root, month, year, ..
            } => InstrumentKey::Future {
                root: root.clone(),
                month: *month,
                year: *year,
            },
            Instrument::Crypto { symbol } => InstrumentKey::Crypto {
                symbol: symbol.clone(),
            },
        }
    }

    /// Check the per-variant field constraints.
    ///
    /// # Errors
    /// Returns a human-readable reason when a required field is missing or
    /// out of range.
    pub fn check_fields(&self) -> Result<(), String> {
        match self {
            Instrument::Equity { symbol } | Instrument::Crypto { symbol } => {
                if symbol.as_str().is_empty() {
                    return Err("symbol must not be empty".to_string());
                }
            }
            Instrument::Option {
                underlying,
                strike,
                multiplier_override,
                ..
            } => {
                if underlying.as_str().is_empty() {
                    return Err("option underlying must not be empty".to_string());
                }
                if !strike.is_positive() {
                    return Err(format!("option strike must be positive, got {strike}"));
                }
                if let Some(m) = multiplier_override {
                    if !m.is_positive() {
                        return Err(format!("multiplier override must be positive, got {m}"));
                    }
                }
            }
            Instrument::Future {
                root,
                month,
                point_value_override,
                ..
            } => {
                if root.is_empty() {
                    return Err("futures root must not be empty".to_string());
                }
                if !(1..=12).contains(month) {
                    return Err(format!("futures month must be 1-12, got {month}"));
                }
                if let Some(pv) = point_value_override {
                    if !pv.is_positive() {
                        return Err(format!("point value override must be positive, got {pv}"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Composite identity grouping executions into one position.
///
/// Structured on purpose: a strike of `7.5` and an expiry can never collide
/// with another contract the way `"X_7.5_..."` string keys could.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstrumentKey {
    Equity {
        symbol: Symbol,
    },
    Option {
        underlying: Symbol,
        option_type: OptionType,
        strike: Decimal,
        expiry: NaiveDate,
    },
    Future {
        root: String,
        month: u8,
        year: u16,
    },
    Crypto {
        symbol: Symbol,
    },
}

impl InstrumentKey {
    /// Human-readable label for reports and log lines.
    pub fn display_label(&self) -> String {
        format!("{self}")
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentKey::Equity { symbol } => write!(f, "{symbol}"),
            InstrumentKey::Option {
                underlying,
                option_type,
                strike,
                expiry,
            } => write!(f, "{underlying} {expiry} {strike} {option_type}"),
            InstrumentKey::Future { root, month, year } => {
                write!(f, "{root} {year}-{month:02}")
            }
            InstrumentKey::Crypto { symbol } => write!(f, "{symbol}"),
        }
    }
}
