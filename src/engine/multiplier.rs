//! Contract multiplier resolution.
//!
//! The multiplier converts a per-unit price move into dollar P&L: 1 for
//! shares and spot crypto, 100 for standard equity options, the contract
//! point value for futures. Unknown futures roots fall back to 1 with a
//! `degraded` flag so callers can badge the number instead of failing.

use crate::domain::{Decimal, Instrument};

/// Point value per futures contract root. E-mini and micro CME/NYMEX/COMEX
/// contracts the journal's import path emits today.
const FUTURES_POINT_VALUES: &[(&str, &str)] = &[
    ("ES", "50"),
    ("MES", "5"),
    ("NQ", "20"),
    ("MNQ", "2"),
    ("YM", "5"),
    ("MYM", "0.5"),
    ("RTY", "50"),
    ("M2K", "5"),
    ("CL", "1000"),
    ("MCL", "100"),
    ("GC", "100"),
    ("MGC", "10"),
    ("SI", "5000"),
    ("SIL", "1000"),
];

/// Outcome of multiplier resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMultiplier {
    /// Dollar P&L per unit per point of price movement.
    pub multiplier: Decimal,
    /// True when the root was unknown and the value is a fallback of 1;
    /// callers should surface a warning badge, not an error.
    pub degraded: bool,
}

impl ResolvedMultiplier {
    fn exact(multiplier: Decimal) -> Self {
        Self {
            multiplier,
            degraded: false,
        }
    }

    fn fallback() -> Self {
        Self {
            multiplier: Decimal::one(),
            degraded: true,
        }
    }
}

/// Resolve the contract multiplier for an instrument.
///
/// Pure function of the descriptor: equity/crypto resolve to 1, options to
/// their override or 100, futures to their override or the point value table
/// keyed by root (case-insensitive). Overrides are validated positive at row
/// validation, so resolution itself cannot fail.
pub fn resolve(instrument: &Instrument) -> ResolvedMultiplier {
    match instrument {
        Instrument::Equity { .. } | Instrument::Crypto { .. } => {
            ResolvedMultiplier::exact(Decimal::one())
        }
        Instrument::Option {
            multiplier_override,
            ..
        } => ResolvedMultiplier::exact(multiplier_override.unwrap_or_else(Decimal::hundred)),
        Instrument::Future {
            root,
            point_value_override,
            ..
        } => {
            if let Some(pv) = point_value_override {
                return ResolvedMultiplier::exact(*pv);
            }
            point_value_for_root(root)
                .map(ResolvedMultiplier::exact)
                .unwrap_or_else(ResolvedMultiplier::fallback)
        }
    }
}

/// Look up the point value for a futures root, case-insensitively.
pub fn point_value_for_root(root: &str) -> Option<Decimal> {
    let upper = root.to_ascii_uppercase();
    FUTURES_POINT_VALUES
        .iter()
        .find(|(r, _)| *r == upper)
        .and_then(|(_, pv)| Decimal::from_str_canonical(pv).ok())
}
