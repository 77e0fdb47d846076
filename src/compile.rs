//! The one pipeline from raw executions to calendar and metrics.
//!
//! Every call site that needs realized trades, daily buckets, or dashboard
//! metrics goes through [`compile`] and picks the granularity it wants from
//! the result; there is exactly one matching algorithm in the crate.
//!
//! Compilation always replays the full execution list from scratch. Derived
//! artifacts are never patched incrementally: after any insert, edit, or
//! delete the caller recompiles, and identical input is guaranteed to
//! produce identical output.

use crate::config::EngineSettings;
use crate::domain::{sort_chronological, Execution, InstrumentKey};
use crate::engine::daily::{aggregate, CalendarData};
use crate::engine::matcher::PositionMatcher;
use crate::engine::metrics::{project, Metrics};
use crate::engine::{ClosedTradeRecord, Position};
use crate::error::{InvariantViolation, MatchError, RejectedExecution};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Everything one compilation produces, at every granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLedger {
    /// All closed portions, chronological (ties keep instrument-key order).
    pub closed_trades: Vec<ClosedTradeRecord>,
    /// Final position per instrument key, in key order; flat positions
    /// included.
    pub positions: Vec<Position>,
    /// Rows rejected at validation, with per-row reasons.
    pub rejected: Vec<RejectedExecution>,
    /// Daily buckets and day-level stats.
    pub calendar: CalendarData,
    /// Scalar dashboard metrics.
    pub metrics: Metrics,
}

impl CompiledLedger {
    /// Final positions that are still open.
    pub fn open_positions(&self) -> impl Iterator<Item = &Position> + '_ {
        self.positions.iter().filter(|p| !p.is_flat())
    }
}

/// Replay a user's executions into realized trades, calendar buckets, and
/// metrics.
///
/// Malformed rows are rejected individually and reported in
/// [`CompiledLedger::rejected`]; the rest of the batch proceeds. `as_of`
/// anchors the period windows so the pipeline never reads the clock.
///
/// # Errors
/// Only an [`InvariantViolation`] aborts compilation: an impossible internal
/// state must surface as an error, never as a wrong number.
pub fn compile(
    executions: &[Execution],
    settings: &EngineSettings,
    as_of: NaiveDate,
) -> Result<CompiledLedger, InvariantViolation> {
    let mut rejected = Vec::new();
    let mut valid: Vec<Execution> = Vec::with_capacity(executions.len());
    for execution in executions {
        match execution.validate() {
            Ok(()) => valid.push(execution.clone()),
            Err(reason) => {
                tracing::warn!(id = %execution.id, %reason, "rejecting execution row");
                rejected.push(RejectedExecution::new(execution.id, &reason));
            }
        }
    }

    // Stable chronological order, then grouped per key; grouping preserves
    // that order, so each matcher sees its rows pre-sorted as its contract
    // requires.
    sort_chronological(&mut valid);
    let mut groups: BTreeMap<InstrumentKey, Vec<Execution>> = BTreeMap::new();
    for execution in valid {
        groups
            .entry(execution.instrument.key())
            .or_default()
            .push(execution);
    }

    let mut closed_trades = Vec::new();
    let mut positions = Vec::new();
    for (key, group) in groups {
        let asset_class = match group.first() {
            Some(first) => first.instrument.asset_class(),
            None => continue,
        };
        let mut matcher = PositionMatcher::new(key, asset_class);
        for execution in &group {
            match matcher.apply(execution) {
                Ok(()) => {}
                // Rows are pre-validated, but the skip-row policy still
                // applies if one slips through.
                Err(MatchError::Validation { id, source }) => {
                    tracing::warn!(%id, reason = %source, "rejecting execution row");
                    rejected.push(RejectedExecution::new(id, &source));
                }
                Err(MatchError::Invariant(violation)) => return Err(violation),
            }
        }
        let outcome = matcher.into_outcome();
        closed_trades.extend(outcome.closed_trades);
        positions.push(outcome.final_position);
    }

    // Per-key runs emit in key order; re-merge chronologically. The sort is
    // stable, so simultaneous closes keep key order and output stays a pure
    // function of the input.
    closed_trades.sort_by_key(|t| t.closed_at);

    let calendar = aggregate(&closed_trades, &positions, settings.timezone)?;
    let metrics = project(&calendar, settings.initial_capital, as_of, settings.pnl_mode);

    tracing::debug!(
        closed = closed_trades.len(),
        positions = positions.len(),
        rejected = rejected.len(),
        "compiled execution ledger"
    );

    Ok(CompiledLedger {
        closed_trades,
        positions,
        rejected,
        calendar,
        metrics,
    })
}
