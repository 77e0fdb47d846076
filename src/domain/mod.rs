//! Domain types and determinism layer for the realized-P&L engine.
//!
//! This module provides:
//! - Lossless numeric handling via a Decimal wrapper
//! - Domain primitives: TimeMs, UserId, Symbol, Side
//! - The tagged Instrument union and structured InstrumentKey
//! - Execution rows with per-row validation and stable chronological sorting

pub mod decimal;
pub mod execution;
pub mod instrument;
pub mod primitives;

pub use decimal::Decimal;
pub use execution::{sort_chronological, Execution, ExecutionId};
pub use instrument::{AssetClass, Instrument, InstrumentKey, OptionType};
pub use primitives::{Side, Symbol, TimeMs, UserId};
