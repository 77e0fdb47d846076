//! Signed-quantity position matching for one instrument key.
//!
//! The matcher replays one position's executions in order, maintaining a
//! signed open quantity and weighted-average entry price, and emits one
//! [`ClosedTradeRecord`] per closing event. A closing execution that
//! overshoots flips the position: the overshoot opens a fresh segment in the
//! opposite direction at the flip price.

use crate::domain::{AssetClass, Decimal, Execution, InstrumentKey};
use crate::engine::multiplier::{self, ResolvedMultiplier};
use crate::engine::{ClosedTradeRecord, Position, TradeDirection};
use crate::error::{InvariantViolation, MatchError};

/// Result of matching one instrument key's executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Closed portions in replay order.
    pub closed_trades: Vec<ClosedTradeRecord>,
    /// The position after the last execution; flat positions are kept, not
    /// destroyed.
    pub final_position: Position,
}

/// Matcher state for a single (user, instrument key) position.
pub struct PositionMatcher {
    position: Position,
    closed: Vec<ClosedTradeRecord>,
}

impl PositionMatcher {
    /// Start matching a fresh, flat position for a key.
    pub fn new(key: InstrumentKey, asset_class: AssetClass) -> Self {
        Self {
            position: Position::flat(key, asset_class),
            closed: Vec::new(),
        }
    }

    /// Current position state.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Apply one execution in replay order.
    ///
    /// The caller feeds executions pre-sorted chronologically (stable on
    /// input order for ties); the matcher never re-sorts, so its behavior is
    /// independently verifiable against the input list.
    ///
    /// # Errors
    /// [`MatchError::Validation`] for a malformed row (the caller decides
    /// skip-vs-reject); [`MatchError::Invariant`] for internal states that
    /// must never be turned into a number.
    pub fn apply(&mut self, execution: &Execution) -> Result<(), MatchError> {
        execution.validate().map_err(|source| MatchError::Validation {
            id: execution.id,
            source,
        })?;

        let key = execution.instrument.key();
        if key != self.position.key {
            return Err(InvariantViolation::KeyMismatch {
                expected: self.position.key.clone(),
                got: key,
            }
            .into());
        }

        let resolved = multiplier::resolve(&execution.instrument);
        let delta = execution.signed_quantity();

        if self.position.is_flat() {
            self.open_segment(execution, delta, resolved);
        } else if delta.is_positive() == self.position.is_long() {
            self.add_to_segment(execution, delta, resolved)?;
        } else {
            self.reduce_or_flip(execution, delta, resolved)?;
        }

        self.position.contributing.push(execution.id);
        self.position.last_executed_at = Some(execution.executed_at);
        Ok(())
    }

    /// Finish and hand back the accumulated outputs.
    pub fn into_outcome(self) -> MatchOutcome {
        MatchOutcome {
            closed_trades: self.closed,
            final_position: self.position,
        }
    }

    /// Open a fresh segment from flat.
    fn open_segment(&mut self, execution: &Execution, delta: Decimal, resolved: ResolvedMultiplier) {
        if resolved.degraded {
            tracing::warn!(
                key = %self.position.key,
                "unknown contract root; falling back to multiplier 1"
            );
        }
        self.position.open_quantity = delta;
        self.position.avg_entry_price = execution.price;
        self.position.multiplier = resolved.multiplier;
        self.position.degraded = resolved.degraded;
    }

    /// Add to the open segment in the same direction, re-weighting the
    /// average entry price.
    fn add_to_segment(
        &mut self,
        execution: &Execution,
        delta: Decimal,
        resolved: ResolvedMultiplier,
    ) -> Result<(), MatchError> {
        // The multiplier is fixed for the lifetime of one open segment; an
        // addition that resolves differently would silently change the value
        // of units already open.
        if resolved.multiplier != self.position.multiplier {
            return Err(InvariantViolation::MultiplierChangedMidSegment {
                key: self.position.key.clone(),
                segment: self.position.multiplier,
                resolved: resolved.multiplier,
            }
            .into());
        }

        let open_abs = self.position.open_quantity.abs();
        let add_abs = delta.abs();
        let entry = self.position.entry_price()?;
        self.position.avg_entry_price =
            (open_abs * entry + add_abs * execution.price) / (open_abs + add_abs);
        self.position.open_quantity = self.position.open_quantity + delta;
        Ok(())
    }

    /// Close part or all of the open segment; flip when the execution
    /// overshoots.
    fn reduce_or_flip(
        &mut self,
        execution: &Execution,
        delta: Decimal,
        resolved: ResolvedMultiplier,
    ) -> Result<(), MatchError> {
        let open_abs = self.position.open_quantity.abs();
        let delta_abs = delta.abs();
        let close_qty = delta_abs.min(open_abs);
        if close_qty.is_negative() {
            return Err(InvariantViolation::NegativeCloseQuantity {
                key: self.position.key.clone(),
            }
            .into());
        }

        let entry = self.position.entry_price()?;
        let direction = if self.position.is_long() {
            TradeDirection::Long
        } else {
            TradeDirection::Short
        };
        let realized_pnl = match direction {
            TradeDirection::Long => {
                (execution.price - entry) * close_qty * self.position.multiplier
            }
            TradeDirection::Short => {
                (entry - execution.price) * close_qty * self.position.multiplier
            }
        };

        let leftover = delta_abs - close_qty;
        // A flip splits the execution's fee between the closing and opening
        // portions by quantity.
        let close_fee = if leftover.is_positive() {
            execution.fee * close_qty / delta_abs
        } else {
            execution.fee
        };

        self.closed.push(ClosedTradeRecord {
            key: self.position.key.clone(),
            asset_class: self.position.asset_class,
            direction,
            closed_quantity: close_qty,
            entry_price: entry,
            exit_price: execution.price,
            realized_pnl,
            fee: close_fee,
            closed_at: execution.executed_at,
            closing_execution: execution.id,
            degraded: self.position.degraded,
        });

        // Shrink toward zero by the closed quantity.
        self.position.open_quantity = match direction {
            TradeDirection::Long => self.position.open_quantity - close_qty,
            TradeDirection::Short => self.position.open_quantity + close_qty,
        };

        if leftover.is_positive() {
            // The overshoot opens a new segment in the execution's direction
            // at the flip price; the multiplier re-resolves at the boundary.
            if resolved.degraded {
                tracing::warn!(
                    key = %self.position.key,
                    "unknown contract root; falling back to multiplier 1"
                );
            }
            self.position.open_quantity = if delta.is_positive() {
                leftover
            } else {
                -leftover
            };
            self.position.avg_entry_price = execution.price;
            self.position.multiplier = resolved.multiplier;
            self.position.degraded = resolved.degraded;
        } else if self.position.is_flat() {
            self.position.avg_entry_price = Decimal::zero();
        }
        Ok(())
    }
}

/// Match one instrument key's pre-sorted executions in a single call.
///
/// Returns `None` for an empty slice (there is no key to attribute a
/// position to). Any row error rejects the batch; callers wanting the
/// skip-row policy drive [`PositionMatcher::apply`] directly.
///
/// # Errors
/// Propagates the first [`MatchError`] encountered.
pub fn match_executions(executions: &[Execution]) -> Result<Option<MatchOutcome>, MatchError> {
    let Some(first) = executions.first() else {
        return Ok(None);
    };
    let mut matcher = PositionMatcher::new(first.instrument.key(), first.instrument.asset_class());
    for execution in executions {
        matcher.apply(execution)?;
    }
    Ok(Some(matcher.into_outcome()))
}
