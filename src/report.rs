//! JSON-ready report shapes for out-of-scope HTTP handlers.
//!
//! Wire conventions: camelCase field names, decimals as canonical strings
//! (never floats, never exponent notation), dates as ISO `YYYY-MM-DD`.
//! The engine defines no protocol of its own; these are plain serializable
//! values a handler can return as-is.

use crate::compile::CompiledLedger;
use crate::engine::daily::{CalendarData, DailyBucket, DayPnl, TradeStatus, TradeSummary};
use crate::engine::metrics::Metrics;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One calendar entry, shaped for the heatmap tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSummaryReport {
    /// Display label of the instrument, e.g. "AAPL 2024-06-21 150 call".
    pub instrument: String,
    pub asset_class: String,
    pub direction: String,
    pub quantity: String,
    pub entry_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<String>,
    pub realized_pnl: String,
    pub fee: String,
    pub status: String,
}

impl From<&TradeSummary> for TradeSummaryReport {
    fn from(summary: &TradeSummary) -> Self {
        Self {
            instrument: summary.key.display_label(),
            asset_class: summary.asset_class.to_string(),
            direction: summary.direction.to_string(),
            quantity: summary.quantity.to_canonical_string(),
            entry_price: summary.entry_price.to_canonical_string(),
            exit_price: summary.exit_price.map(|p| p.to_canonical_string()),
            realized_pnl: summary.realized_pnl.to_canonical_string(),
            fee: summary.fee.to_canonical_string(),
            status: match summary.status {
                TradeStatus::Closed => "closed".to_string(),
                TradeStatus::Open => "open".to_string(),
            },
        }
    }
}

/// One day of the calendar payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucketReport {
    pub date: String,
    pub realized_pnl: String,
    pub fees: String,
    pub trade_count: usize,
    pub trades: Vec<TradeSummaryReport>,
}

impl From<&DailyBucket> for DailyBucketReport {
    fn from(bucket: &DailyBucket) -> Self {
        Self {
            date: bucket.date.to_string(),
            realized_pnl: bucket.realized_pnl.to_canonical_string(),
            fees: bucket.fees.to_canonical_string(),
            trade_count: bucket.trade_count,
            trades: bucket.trades.iter().map(TradeSummaryReport::from).collect(),
        }
    }
}

/// A best/worst day entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPnlReport {
    pub date: String,
    pub pnl: String,
}

impl From<&DayPnl> for DayPnlReport {
    fn from(day: &DayPnl) -> Self {
        Self {
            date: day.date.to_string(),
            pnl: day.pnl.to_canonical_string(),
        }
    }
}

/// The calendar/heatmap payload: date-keyed buckets plus summary fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarReport {
    pub daily_data: BTreeMap<String, DailyBucketReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    pub total_realized_pnl: String,
    pub total_fees: String,
    pub trading_days: usize,
    pub winning_days: usize,
    pub losing_days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_day: Option<DayPnlReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_day: Option<DayPnlReport>,
}

impl From<&CalendarData> for CalendarReport {
    fn from(calendar: &CalendarData) -> Self {
        Self {
            daily_data: calendar
                .daily
                .iter()
                .map(|(date, bucket)| (date.to_string(), DailyBucketReport::from(bucket)))
                .collect(),
            min_date: calendar.min_date.map(|d| d.to_string()),
            max_date: calendar.max_date.map(|d| d.to_string()),
            total_realized_pnl: calendar.total_realized_pnl.to_canonical_string(),
            total_fees: calendar.total_fees.to_canonical_string(),
            trading_days: calendar.trading_days,
            winning_days: calendar.winning_days,
            losing_days: calendar.losing_days,
            best_day: calendar.best_day.as_ref().map(DayPnlReport::from),
            worst_day: calendar.worst_day.as_ref().map(DayPnlReport::from),
        }
    }
}

/// The dashboard KPI payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub portfolio_value: String,
    pub total_pnl: String,
    pub total_pnl_percent: String,
    pub win_rate: String,
    pub today_pnl: String,
    pub week_pnl: String,
    pub month_pnl: String,
    pub avg_win: String,
    pub avg_loss: String,
    pub best_trade: String,
    pub worst_trade: String,
    pub closed_trade_count: usize,
    pub open_position_count: usize,
}

impl From<&Metrics> for MetricsReport {
    fn from(metrics: &Metrics) -> Self {
        Self {
            portfolio_value: metrics.portfolio_value.to_canonical_string(),
            total_pnl: metrics.total_pnl.to_canonical_string(),
            total_pnl_percent: metrics.total_pnl_percent.to_canonical_string(),
            win_rate: metrics.win_rate.to_canonical_string(),
            today_pnl: metrics.today_pnl.to_canonical_string(),
            week_pnl: metrics.week_pnl.to_canonical_string(),
            month_pnl: metrics.month_pnl.to_canonical_string(),
            avg_win: metrics.avg_win.to_canonical_string(),
            avg_loss: metrics.avg_loss.to_canonical_string(),
            best_trade: metrics.best_trade.to_canonical_string(),
            worst_trade: metrics.worst_trade.to_canonical_string(),
            closed_trade_count: metrics.closed_trade_count,
            open_position_count: metrics.open_position_count,
        }
    }
}

/// A rejected input row, surfaced so the import UI can explain itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRowReport {
    pub id: String,
    pub reason: String,
}

/// Everything one compilation produced, shaped for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    pub calendar: CalendarReport,
    pub metrics: MetricsReport,
    pub rejected_rows: Vec<RejectedRowReport>,
    /// Instruments whose multiplier fell back to 1; display as a warning
    /// badge, not an error.
    pub degraded_instruments: Vec<String>,
}

impl LedgerReport {
    /// Shape a compiled ledger for serialization.
    pub fn from_ledger(ledger: &CompiledLedger) -> Self {
        // Degraded flags live on positions and closed trades; dedupe into a
        // sorted label list.
        let mut degraded: Vec<String> = ledger
            .positions
            .iter()
            .filter(|p| p.degraded)
            .map(|p| p.key.display_label())
            .chain(
                ledger
                    .closed_trades
                    .iter()
                    .filter(|t| t.degraded)
                    .map(|t| t.key.display_label()),
            )
            .collect();
        degraded.sort();
        degraded.dedup();

        Self {
            calendar: CalendarReport::from(&ledger.calendar),
            metrics: MetricsReport::from(&ledger.metrics),
            rejected_rows: ledger
                .rejected
                .iter()
                .map(|r| RejectedRowReport {
                    id: r.id.to_string(),
                    reason: r.reason.clone(),
                })
                .collect(),
            degraded_instruments: degraded,
        }
    }
}

/// SHA-256 fingerprint of a report's canonical JSON encoding.
///
/// Two compilations of identical input produce identical fingerprints, so
/// callers can verify the bit-identical-output contract without diffing
/// payloads.
///
/// # Errors
/// Propagates serialization failure, which serde derives cannot produce for
/// these types in practice.
pub fn fingerprint<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(report)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
