//! Error taxonomy for the matching engine.
//!
//! Two failure families, deliberately kept apart:
//!
//! - [`ValidationError`]: a malformed input row. Recoverable; the compiler
//!   rejects the row, keeps going, and surfaces the reason per row.
//! - [`InvariantViolation`]: an impossible internal state. Fatal; the engine
//!   refuses to emit a plausible-but-wrong number and returns the error
//!   instead.

use crate::domain::{Decimal, ExecutionId, InstrumentKey};
use serde::Serialize;
use thiserror::Error;

/// A malformed execution row, rejected before it reaches the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: Decimal },

    #[error("price must be positive, got {price}")]
    NonPositivePrice { price: Decimal },

    #[error("fee must not be negative, got {fee}")]
    NegativeFee { fee: Decimal },

    #[error("invalid instrument: {reason}")]
    InvalidInstrument { reason: String },

    #[error("timestamp {ms} ms is outside the representable range")]
    UnrepresentableTimestamp { ms: i64 },
}

/// An engine bug: internal state that the matching algorithm can never
/// legally reach. Surfaced as an error, never as a wrong P&L figure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("close quantity went negative for {key}")]
    NegativeCloseQuantity { key: InstrumentKey },

    #[error("entry price read on a flat position for {key}")]
    EntryPriceOnFlatPosition { key: InstrumentKey },

    #[error(
        "multiplier changed mid-segment for {key}: segment opened at {segment}, execution resolves to {resolved}"
    )]
    MultiplierChangedMidSegment {
        key: InstrumentKey,
        segment: Decimal,
        resolved: Decimal,
    },

    #[error("timestamp {ms} ms reached date bucketing unvalidated")]
    TimestampOutOfRange { ms: i64 },

    #[error("execution for {got} fed to the matcher for {expected}")]
    KeyMismatch {
        expected: InstrumentKey,
        got: InstrumentKey,
    },
}

/// Either failure a single execution can produce inside the matcher.
///
/// The matcher reports validation failures without deciding policy; the
/// caller chooses between skipping the row and rejecting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("execution {id}: {source}")]
    Validation {
        id: ExecutionId,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// A rejected input row with its reason, surfaced in compiler output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedExecution {
    /// Id of the offending row.
    pub id: ExecutionId,
    /// Human-readable rejection reason.
    pub reason: String,
}

impl RejectedExecution {
    pub fn new(id: ExecutionId, error: &ValidationError) -> Self {
        Self {
            id,
            reason: error.to_string(),
        }
    }
}

/// Configuration errors raised while building [`crate::EngineSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
