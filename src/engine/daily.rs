//! Calendar-day aggregation of closed trades.
//!
//! Closed trades bucket by their exit date converted to a calendar day in
//! the configured timezone. Open positions are surfaced as zero-P&L display
//! entries on the day of their most recent execution; they never contribute
//! to realized sums or day counts.

use crate::domain::{AssetClass, Decimal, InstrumentKey};
use crate::engine::{ClosedTradeRecord, Position, TradeDirection};
use crate::error::InvariantViolation;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a calendar entry is a realized close or an open-position marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Closed,
    Open,
}

/// One line of a day's activity, shaped for calendar display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeSummary {
    /// Position identity the entry belongs to.
    pub key: InstrumentKey,
    /// Asset class, for display filtering.
    pub asset_class: AssetClass,
    /// Direction of the position (as closed, or as currently open).
    pub direction: TradeDirection,
    /// Closed quantity, or signed open quantity for open markers.
    pub quantity: Decimal,
    /// Weighted-average entry price.
    pub entry_price: Decimal,
    /// Exit price; absent on open markers.
    pub exit_price: Option<Decimal>,
    /// Gross realized P&L; zero on open markers.
    pub realized_pnl: Decimal,
    /// Fee attributed to the close; zero on open markers.
    pub fee: Decimal,
    /// Closed or open.
    pub status: TradeStatus,
}

/// One calendar day's realized activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    /// Calendar date in the aggregation timezone.
    pub date: NaiveDate,
    /// Gross realized P&L summed over the day's closes.
    pub realized_pnl: Decimal,
    /// Closing fees summed over the day's closes, kept separate from P&L.
    pub fees: Decimal,
    /// Number of closed trades; open markers do not count.
    pub trade_count: usize,
    /// The day's entries: closes in replay order, then open markers.
    pub trades: Vec<TradeSummary>,
}

impl DailyBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            realized_pnl: Decimal::zero(),
            fees: Decimal::zero(),
            trade_count: 0,
            trades: Vec::new(),
        }
    }
}

/// A day singled out by its realized P&L (best or worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayPnl {
    pub date: NaiveDate,
    pub pnl: Decimal,
}

/// The full calendar aggregation: date-keyed buckets plus day-level stats.
///
/// The map is a `BTreeMap` so iteration (and everything serialized from it)
/// is in date order, independent of input arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarData {
    /// Buckets keyed by calendar date.
    pub daily: BTreeMap<NaiveDate, DailyBucket>,
    /// Sum of gross realized P&L over all buckets.
    pub total_realized_pnl: Decimal,
    /// Sum of closing fees over all buckets.
    pub total_fees: Decimal,
    /// Days with nonzero realized P&L.
    pub trading_days: usize,
    /// Days with realized P&L > 0. A day at exactly zero counts as neither
    /// winning nor losing.
    pub winning_days: usize,
    /// Days with realized P&L < 0.
    pub losing_days: usize,
    /// Highest-P&L trading day; earliest date wins ties. None without any
    /// trading day.
    pub best_day: Option<DayPnl>,
    /// Lowest-P&L trading day; earliest date wins ties.
    pub worst_day: Option<DayPnl>,
    /// First calendar date present (including open-marker-only days).
    pub min_date: Option<NaiveDate>,
    /// Last calendar date present.
    pub max_date: Option<NaiveDate>,
}

impl CalendarData {
    fn empty() -> Self {
        Self {
            daily: BTreeMap::new(),
            total_realized_pnl: Decimal::zero(),
            total_fees: Decimal::zero(),
            trading_days: 0,
            winning_days: 0,
            losing_days: 0,
            best_day: None,
            worst_day: None,
            min_date: None,
            max_date: None,
        }
    }
}

/// Aggregate closed trades and open positions into calendar buckets.
///
/// `closed_trades` are expected in deterministic (chronological) order; the
/// order is preserved within each bucket. Open positions with nonzero
/// quantity surface as zero-P&L markers and never touch realized sums.
///
/// # Errors
/// A timestamp outside chrono's representable range is an
/// [`InvariantViolation`]: validated inputs cannot produce one, so hitting
/// it means a bug upstream, and clamping the date would misattribute P&L.
pub fn aggregate(
    closed_trades: &[ClosedTradeRecord],
    open_positions: &[Position],
    timezone: Tz,
) -> Result<CalendarData, InvariantViolation> {
    let mut calendar = CalendarData::empty();

    for trade in closed_trades {
        let date = trade
            .closed_at
            .date_in(timezone)
            .ok_or(InvariantViolation::TimestampOutOfRange {
                ms: trade.closed_at.as_i64(),
            })?;
        let bucket = calendar
            .daily
            .entry(date)
            .or_insert_with(|| DailyBucket::empty(date));
        bucket.realized_pnl += trade.realized_pnl;
        bucket.fees += trade.fee;
        bucket.trade_count += 1;
        bucket.trades.push(TradeSummary {
            key: trade.key.clone(),
            asset_class: trade.asset_class,
            direction: trade.direction,
            quantity: trade.closed_quantity,
            entry_price: trade.entry_price,
            exit_price: Some(trade.exit_price),
            realized_pnl: trade.realized_pnl,
            fee: trade.fee,
            status: TradeStatus::Closed,
        });

        calendar.total_realized_pnl += trade.realized_pnl;
        calendar.total_fees += trade.fee;
    }

    for position in open_positions {
        if position.is_flat() {
            continue;
        }
        let Some(direction) = position.direction() else {
            continue;
        };
        let Some(last) = position.last_executed_at else {
            continue;
        };
        let date = last
            .date_in(timezone)
            .ok_or(InvariantViolation::TimestampOutOfRange { ms: last.as_i64() })?;
        let bucket = calendar
            .daily
            .entry(date)
            .or_insert_with(|| DailyBucket::empty(date));
        bucket.trades.push(TradeSummary {
            key: position.key.clone(),
            asset_class: position.asset_class,
            direction,
            quantity: position.open_quantity,
            entry_price: position.avg_entry_price,
            exit_price: None,
            realized_pnl: Decimal::zero(),
            fee: Decimal::zero(),
            status: TradeStatus::Open,
        });
    }

    let mut best_day: Option<DayPnl> = None;
    let mut worst_day: Option<DayPnl> = None;
    for (date, bucket) in &calendar.daily {
        if bucket.realized_pnl.is_zero() {
            continue;
        }
        calendar.trading_days += 1;
        if bucket.realized_pnl.is_positive() {
            calendar.winning_days += 1;
        } else {
            calendar.losing_days += 1;
        }
        // Strict comparisons keep the earliest date on ties; the map
        // iterates in ascending date order.
        let day = DayPnl {
            date: *date,
            pnl: bucket.realized_pnl,
        };
        if best_day.map_or(true, |best| day.pnl > best.pnl) {
            best_day = Some(day);
        }
        if worst_day.map_or(true, |worst| day.pnl < worst.pnl) {
            worst_day = Some(day);
        }
    }
    calendar.best_day = best_day;
    calendar.worst_day = worst_day;

    calendar.min_date = calendar.daily.keys().next().copied();
    calendar.max_date = calendar.daily.keys().next_back().copied();
    Ok(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionId, Symbol, TimeMs};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn key(symbol: &str) -> InstrumentKey {
        InstrumentKey::Equity {
            symbol: Symbol::new(symbol.to_string()),
        }
    }

    fn closed(symbol: &str, pnl: &str, at_ms: i64) -> ClosedTradeRecord {
        ClosedTradeRecord {
            key: key(symbol),
            asset_class: AssetClass::Equity,
            direction: TradeDirection::Long,
            closed_quantity: d("1"),
            entry_price: d("100"),
            exit_price: d("110"),
            realized_pnl: d(pnl),
            fee: d("1"),
            closed_at: TimeMs::new(at_ms),
            closing_execution: ExecutionId::new(),
            degraded: false,
        }
    }

    // 2024-01-15T15:00:00Z, ms.
    const JAN_15: i64 = 1_705_330_800_000;
    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn test_same_day_trades_share_bucket() {
        let trades = vec![
            closed("AAPL", "100", JAN_15),
            closed("MSFT", "-40", JAN_15 + 3_600_000),
        ];
        let calendar = aggregate(&trades, &[], chrono_tz::UTC).unwrap();

        assert_eq!(calendar.daily.len(), 1);
        let bucket = calendar.daily.values().next().unwrap();
        assert_eq!(bucket.realized_pnl, d("60"));
        assert_eq!(bucket.fees, d("2"));
        assert_eq!(bucket.trade_count, 2);
        assert_eq!(calendar.total_realized_pnl, d("60"));
    }

    #[test]
    fn test_zero_net_day_counts_neither_way() {
        let trades = vec![
            closed("AAPL", "50", JAN_15),
            closed("AAPL", "-50", JAN_15 + 1000),
            closed("MSFT", "10", JAN_15 + DAY_MS),
        ];
        let calendar = aggregate(&trades, &[], chrono_tz::UTC).unwrap();

        assert_eq!(calendar.daily.len(), 2);
        assert_eq!(calendar.trading_days, 1);
        assert_eq!(calendar.winning_days, 1);
        assert_eq!(calendar.losing_days, 0);
    }

    #[test]
    fn test_best_and_worst_tie_to_earliest_date() {
        let trades = vec![
            closed("AAPL", "100", JAN_15),
            closed("MSFT", "100", JAN_15 + DAY_MS),
            closed("AAPL", "-30", JAN_15 + 2 * DAY_MS),
            closed("MSFT", "-30", JAN_15 + 3 * DAY_MS),
        ];
        let calendar = aggregate(&trades, &[], chrono_tz::UTC).unwrap();

        let best = calendar.best_day.unwrap();
        let worst = calendar.worst_day.unwrap();
        assert_eq!(best.pnl, d("100"));
        assert_eq!(best.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(worst.pnl, d("-30"));
        assert_eq!(worst.date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
    }

    #[test]
    fn test_open_positions_do_not_touch_realized_sums() {
        let mut open = Position::flat(key("TSLA"), AssetClass::Equity);
        open.open_quantity = d("10");
        open.avg_entry_price = d("250");
        open.last_executed_at = Some(TimeMs::new(JAN_15));

        let calendar = aggregate(&[], &[open], chrono_tz::UTC).unwrap();

        assert_eq!(calendar.total_realized_pnl, Decimal::zero());
        assert_eq!(calendar.trading_days, 0);
        assert!(calendar.best_day.is_none());

        let bucket = calendar.daily.values().next().unwrap();
        assert_eq!(bucket.trade_count, 0);
        assert_eq!(bucket.trades.len(), 1);
        assert_eq!(bucket.trades[0].status, TradeStatus::Open);
        assert_eq!(bucket.trades[0].realized_pnl, Decimal::zero());
        assert_eq!(bucket.trades[0].exit_price, None);
    }

    #[test]
    fn test_flat_positions_are_invisible() {
        let flat = Position::flat(key("TSLA"), AssetClass::Equity);
        let calendar = aggregate(&[], &[flat], chrono_tz::UTC).unwrap();
        assert!(calendar.daily.is_empty());
    }

    #[test]
    fn test_timezone_shifts_bucket_date() {
        // 02:30 UTC on Jan 16 is still Jan 15 in New York.
        let late_night_utc = JAN_15 + 11 * 3_600_000 + 30 * 60_000;
        let trades = vec![closed("AAPL", "10", late_night_utc)];

        let utc = aggregate(&trades, &[], chrono_tz::UTC).unwrap();
        assert_eq!(
            utc.min_date,
            NaiveDate::from_ymd_opt(2024, 1, 16)
        );

        let ny = aggregate(&trades, &[], chrono_tz::America::New_York).unwrap();
        assert_eq!(
            ny.min_date,
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_empty_input_is_empty_calendar() {
        let calendar = aggregate(&[], &[], chrono_tz::UTC).unwrap();
        assert!(calendar.daily.is_empty());
        assert_eq!(calendar.total_realized_pnl, Decimal::zero());
        assert_eq!(calendar.min_date, None);
        assert_eq!(calendar.max_date, None);
    }

    #[test]
    fn test_unvalidated_timestamp_is_fatal() {
        let bad = closed("AAPL", "10", i64::MAX);
        assert!(matches!(
            aggregate(&[bad], &[], chrono_tz::UTC),
            Err(InvariantViolation::TimestampOutOfRange { .. })
        ));
    }
}
