//! Pure computation engine for deterministic realized-P&L logic.

use crate::domain::{AssetClass, Decimal, ExecutionId, InstrumentKey, TimeMs};
use serde::Serialize;

pub mod daily;
pub mod matcher;
pub mod metrics;
pub mod multiplier;

pub use daily::{aggregate, CalendarData, DailyBucket, DayPnl, TradeStatus, TradeSummary};
pub use matcher::{match_executions, MatchOutcome, PositionMatcher};
pub use metrics::{project, Metrics};
pub use multiplier::{resolve, ResolvedMultiplier};

/// Direction of an open position segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    /// Positive open quantity.
    Long,
    /// Negative open quantity.
    Short,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "long"),
            TradeDirection::Short => write!(f, "short"),
        }
    }
}

/// The realized outcome of one closing (or reducing) event.
///
/// Produced exactly once per closing event and never mutated afterwards.
/// `realized_pnl` is gross; `fee` rides alongside so each consumer decides
/// whether to net it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedTradeRecord {
    /// Position identity the close belongs to.
    pub key: InstrumentKey,
    /// Asset class, for display and downstream filtering.
    pub asset_class: AssetClass,
    /// Direction of the position that was closed.
    pub direction: TradeDirection,
    /// Units closed by this event, positive.
    pub closed_quantity: Decimal,
    /// Weighted-average cost of the units that were closed.
    pub entry_price: Decimal,
    /// Price of the closing execution.
    pub exit_price: Decimal,
    /// Gross realized P&L: price difference x quantity x multiplier.
    pub realized_pnl: Decimal,
    /// Fee attributed to this close (prorated when the execution flips).
    pub fee: Decimal,
    /// Timestamp of the closing execution.
    pub closed_at: TimeMs,
    /// Id of the closing execution.
    pub closing_execution: ExecutionId,
    /// True when the segment's multiplier came from a degraded fallback.
    pub degraded: bool,
}

/// Per-(user, instrument key) accumulator for the currently open segment.
///
/// The sign of `open_quantity` is the sole source of truth for direction:
/// `> 0` long, `< 0` short, `== 0` flat. `avg_entry_price` is the cost basis
/// of `abs(open_quantity)` units and is zero when flat. The position is never
/// destroyed on close; a later execution starts a fresh segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Identity of this position.
    pub key: InstrumentKey,
    /// Asset class of the instrument.
    pub asset_class: AssetClass,
    /// Signed open quantity.
    pub open_quantity: Decimal,
    /// Weighted-average entry price of the open units; zero when flat.
    pub avg_entry_price: Decimal,
    /// Contract multiplier fixed for the current open segment.
    pub multiplier: Decimal,
    /// True when the multiplier came from a degraded fallback.
    pub degraded: bool,
    /// Ids of every execution that touched this position, in replay order.
    pub contributing: Vec<ExecutionId>,
    /// Timestamp of the most recent contributing execution.
    pub last_executed_at: Option<TimeMs>,
}

impl Position {
    /// A fresh, flat position for a key.
    pub fn flat(key: InstrumentKey, asset_class: AssetClass) -> Self {
        Self {
            key,
            asset_class,
            open_quantity: Decimal::zero(),
            avg_entry_price: Decimal::zero(),
            multiplier: Decimal::one(),
            degraded: false,
            contributing: Vec::new(),
            last_executed_at: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.open_quantity.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.open_quantity.is_positive()
    }

    pub fn is_short(&self) -> bool {
        self.open_quantity.is_negative()
    }

    /// Direction of the open segment, `None` when flat.
    pub fn direction(&self) -> Option<TradeDirection> {
        if self.is_long() {
            Some(TradeDirection::Long)
        } else if self.is_short() {
            Some(TradeDirection::Short)
        } else {
            None
        }
    }

    /// Checked read of the entry price.
    ///
    /// # Errors
    /// Reading the entry price of a flat position is an engine bug.
    pub fn entry_price(&self) -> Result<Decimal, crate::error::InvariantViolation> {
        if self.is_flat() {
            return Err(crate::error::InvariantViolation::EntryPriceOnFlatPosition {
                key: self.key.clone(),
            });
        }
        Ok(self.avg_entry_price)
    }
}
