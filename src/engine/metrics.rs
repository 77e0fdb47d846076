//! Scalar dashboard metrics projected from the calendar aggregation.
//!
//! Referentially transparent on purpose: the ambient clock is never read,
//! every window is anchored to the explicit `as_of` date, and identical
//! inputs always produce identical output.

use crate::config::PnlMode;
use crate::domain::Decimal;
use crate::engine::daily::{CalendarData, TradeStatus};
use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

/// Dashboard KPI figures for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Initial capital plus total realized P&L.
    pub portfolio_value: Decimal,
    /// Total realized P&L (net of fees when the mode says so).
    pub total_pnl: Decimal,
    /// Total P&L as a percentage of initial capital; zero when capital is
    /// zero.
    pub total_pnl_percent: Decimal,
    /// Winning closed trades over all closed trades, as a percentage; zero
    /// (never NaN) when there are no closed trades.
    pub win_rate: Decimal,
    /// Realized P&L on the `as_of` date.
    pub today_pnl: Decimal,
    /// Realized P&L over the 7 calendar days ending at `as_of`.
    pub week_pnl: Decimal,
    /// Realized P&L over the calendar month ending at `as_of`.
    pub month_pnl: Decimal,
    /// Mean gross P&L of winning closed trades; zero without winners.
    pub avg_win: Decimal,
    /// Mean gross loss of losing closed trades, as a positive magnitude;
    /// zero without losers.
    pub avg_loss: Decimal,
    /// Largest single-trade gross gain; zero without winners.
    pub best_trade: Decimal,
    /// Largest single-trade gross loss (negative); zero without losers.
    pub worst_trade: Decimal,
    /// Closed trades counted across all buckets.
    pub closed_trade_count: usize,
    /// Open (nonzero) positions surfaced on the calendar.
    pub open_position_count: usize,
}

/// Period windows ending at the projection date, half-open on the far side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodWindow {
    Today,
    Week,
    Month,
}

impl PeriodWindow {
    /// Whether `date` falls inside this window ending at `as_of`.
    fn contains(self, date: NaiveDate, as_of: NaiveDate) -> bool {
        if date > as_of {
            return false;
        }
        match self {
            PeriodWindow::Today => date == as_of,
            // (as_of - 7d, as_of]: the 7 calendar days ending at as_of.
            PeriodWindow::Week => match as_of.checked_sub_days(Days::new(7)) {
                Some(start) => date > start,
                None => true,
            },
            PeriodWindow::Month => match as_of.checked_sub_months(Months::new(1)) {
                Some(start) => date > start,
                None => true,
            },
        }
    }
}

/// Project scalar metrics from a calendar aggregation.
///
/// `pnl_mode` nets fees into the aggregate P&L figures when set to
/// [`PnlMode::Net`]; win/loss classification stays gross in both modes so
/// the mode never flips which trades count as winners.
pub fn project(
    calendar: &CalendarData,
    initial_capital: Decimal,
    as_of: NaiveDate,
    pnl_mode: PnlMode,
) -> Metrics {
    let mut closed_trade_count = 0usize;
    let mut winning_trade_count = 0usize;
    let mut losing_trade_count = 0usize;
    let mut open_position_count = 0usize;

    let mut winning_pnl_sum = Decimal::zero();
    let mut losing_pnl_sum = Decimal::zero();
    let mut best_trade = Decimal::zero();
    let mut worst_trade = Decimal::zero();

    let mut today_pnl = Decimal::zero();
    let mut week_pnl = Decimal::zero();
    let mut month_pnl = Decimal::zero();

    for (date, bucket) in &calendar.daily {
        for trade in &bucket.trades {
            match trade.status {
                TradeStatus::Closed => {
                    closed_trade_count += 1;
                    if trade.realized_pnl.is_positive() {
                        winning_trade_count += 1;
                        winning_pnl_sum += trade.realized_pnl;
                        if trade.realized_pnl > best_trade {
                            best_trade = trade.realized_pnl;
                        }
                    } else if trade.realized_pnl.is_negative() {
                        losing_trade_count += 1;
                        losing_pnl_sum += trade.realized_pnl;
                        if trade.realized_pnl < worst_trade {
                            worst_trade = trade.realized_pnl;
                        }
                    }
                }
                TradeStatus::Open => open_position_count += 1,
            }
        }

        let day_pnl = match pnl_mode {
            PnlMode::Gross => bucket.realized_pnl,
            PnlMode::Net => bucket.realized_pnl - bucket.fees,
        };
        if PeriodWindow::Today.contains(*date, as_of) {
            today_pnl += day_pnl;
        }
        if PeriodWindow::Week.contains(*date, as_of) {
            week_pnl += day_pnl;
        }
        if PeriodWindow::Month.contains(*date, as_of) {
            month_pnl += day_pnl;
        }
    }

    let total_pnl = match pnl_mode {
        PnlMode::Gross => calendar.total_realized_pnl,
        PnlMode::Net => calendar.total_realized_pnl - calendar.total_fees,
    };

    let win_rate = if closed_trade_count == 0 {
        Decimal::zero()
    } else {
        Decimal::from(winning_trade_count as i64) / Decimal::from(closed_trade_count as i64)
            * Decimal::hundred()
    };

    let total_pnl_percent = if initial_capital.is_zero() {
        Decimal::zero()
    } else {
        total_pnl / initial_capital * Decimal::hundred()
    };

    let avg_win = if winning_trade_count == 0 {
        Decimal::zero()
    } else {
        winning_pnl_sum / Decimal::from(winning_trade_count as i64)
    };
    let avg_loss = if losing_trade_count == 0 {
        Decimal::zero()
    } else {
        (losing_pnl_sum / Decimal::from(losing_trade_count as i64)).abs()
    };

    Metrics {
        portfolio_value: initial_capital + total_pnl,
        total_pnl,
        total_pnl_percent,
        win_rate,
        today_pnl,
        week_pnl,
        month_pnl,
        avg_win,
        avg_loss,
        best_trade,
        worst_trade,
        closed_trade_count,
        open_position_count,
    }
}
