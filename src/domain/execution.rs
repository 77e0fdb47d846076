//! Execution records: one row per fill, immutable once recorded.

use crate::domain::{Decimal, Instrument, Side, TimeMs, UserId};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of one execution row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        ExecutionId(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single trade execution (fill).
///
/// `quantity` and `price` are always positive; direction lives in `side`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Stable unique identifier for this row.
    pub id: ExecutionId,
    /// Owning journal user.
    pub user: UserId,
    /// What was traded.
    pub instrument: Instrument,
    /// Buy or sell.
    pub side: Side,
    /// Units/contracts filled, positive.
    pub quantity: Decimal,
    /// Per-unit fill price, positive.
    pub price: Decimal,
    /// Commission and fees on this fill, non-negative.
    pub fee: Decimal,
    /// Fill time, milliseconds since Unix epoch.
    pub executed_at: TimeMs,
}

impl Execution {
    /// Signed quantity: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> Decimal {
        match self.side {
            Side::Buy => self.quantity,
            Side::Sell => -self.quantity,
        }
    }

    /// Validate the row's field constraints.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found. The caller decides
    /// whether to skip the row or reject the batch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.quantity.is_positive() {
            return Err(ValidationError::NonPositiveQuantity {
                quantity: self.quantity,
            });
        }
        if !self.price.is_positive() {
            return Err(ValidationError::NonPositivePrice { price: self.price });
        }
        if self.fee.is_negative() {
            return Err(ValidationError::NegativeFee { fee: self.fee });
        }
        if let Err(reason) = self.instrument.check_fields() {
            return Err(ValidationError::InvalidInstrument { reason });
        }
        if !self.executed_at.is_representable() {
            return Err(ValidationError::UnrepresentableTimestamp {
                ms: self.executed_at.as_i64(),
            });
        }
        Ok(())
    }
}

/// Sort executions chronologically, keeping input order for equal timestamps.
///
/// The stable tie-break makes replay order a pure function of the input list,
/// so equal-timestamp fills from a broker export never reorder between runs.
pub fn sort_chronological(executions: &mut [Execution]) {
    executions.sort_by_key(|e| e.executed_at);
}
