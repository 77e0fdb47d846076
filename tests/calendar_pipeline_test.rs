//! End-to-end pipeline tests: executions through compile() to calendar and
//! metrics, exercising timezone bucketing and period windows together.

use chrono::NaiveDate;
use tallybook::{
    compile, Decimal, EngineSettings, Execution, ExecutionId, Instrument, PnlMode, Side, Symbol,
    TimeMs, UserId,
};

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn exec(symbol: &str, side: Side, quantity: &str, price: &str, at: i64) -> Execution {
    Execution {
        id: ExecutionId::new(),
        user: UserId::new("user-1".to_string()),
        instrument: Instrument::Equity {
            symbol: Symbol::new(symbol.to_string()),
        },
        side,
        quantity: d(quantity),
        price: d(price),
        fee: d("0.50"),
        executed_at: TimeMs::new(at),
    }
}

// 2024-01-16T02:30:00Z: the evening of Jan 15 in New York.
const LATE_NIGHT_UTC: i64 = 1_705_372_200_000;
const DAY_MS: i64 = 86_400_000;

#[test]
fn test_timezone_moves_close_to_local_day() {
    let rows = vec![
        exec("AAPL", Side::Buy, "10", "100", LATE_NIGHT_UTC - 3_600_000),
        exec("AAPL", Side::Sell, "10", "110", LATE_NIGHT_UTC),
    ];

    let utc = EngineSettings::default();
    let ledger = compile(&rows, &utc, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()).unwrap();
    assert_eq!(
        ledger.calendar.min_date,
        NaiveDate::from_ymd_opt(2024, 1, 16)
    );

    let ny = EngineSettings {
        timezone: chrono_tz::America::New_York,
        ..EngineSettings::default()
    };
    let ledger = compile(&rows, &ny, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()).unwrap();
    assert_eq!(
        ledger.calendar.min_date,
        NaiveDate::from_ymd_opt(2024, 1, 15)
    );
    assert_eq!(ledger.calendar.total_realized_pnl, d("100"));
}

#[test]
fn test_metrics_follow_as_of_not_the_clock() {
    let rows = vec![
        exec("AAPL", Side::Buy, "10", "100", LATE_NIGHT_UTC - 3_600_000),
        exec("AAPL", Side::Sell, "10", "110", LATE_NIGHT_UTC),
        exec("MSFT", Side::Buy, "5", "300", LATE_NIGHT_UTC + 20 * DAY_MS),
        exec("MSFT", Side::Sell, "5", "308", LATE_NIGHT_UTC + 20 * DAY_MS + 1_000),
    ];
    let settings = EngineSettings::default();

    // Seen from Feb 5, only the MSFT close is in the week window.
    let feb_5 = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
    let ledger = compile(&rows, &settings, feb_5).unwrap();
    assert_eq!(ledger.metrics.week_pnl, d("40"));
    assert_eq!(ledger.metrics.month_pnl, d("140"));
    assert_eq!(ledger.metrics.total_pnl, d("140"));

    // Seen from the AAPL close date itself, that close is "today".
    let jan_16 = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
    let ledger = compile(&rows, &settings, jan_16).unwrap();
    assert_eq!(ledger.metrics.today_pnl, d("100"));
    assert_eq!(ledger.metrics.week_pnl, d("100"));
}

#[test]
fn test_net_mode_end_to_end() {
    let rows = vec![
        exec("AAPL", Side::Buy, "10", "100", LATE_NIGHT_UTC - 3_600_000),
        exec("AAPL", Side::Sell, "10", "110", LATE_NIGHT_UTC),
    ];
    let net = EngineSettings {
        pnl_mode: PnlMode::Net,
        ..EngineSettings::default()
    };
    let as_of = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    let ledger = compile(&rows, &net, as_of).unwrap();

    // Only the closing fee rides the record; the gross 100 nets to 99.50.
    assert_eq!(ledger.metrics.total_pnl, d("99.5"));
    assert_eq!(ledger.metrics.portfolio_value, d("10099.5"));
    // The calendar itself stays gross, fees alongside.
    assert_eq!(ledger.calendar.total_realized_pnl, d("100"));
    assert_eq!(ledger.calendar.total_fees, d("0.5"));
}

#[test]
fn test_open_position_count_flows_to_metrics() {
    let rows = vec![
        exec("AAPL", Side::Buy, "10", "100", LATE_NIGHT_UTC),
        exec("MSFT", Side::Buy, "5", "300", LATE_NIGHT_UTC + 1_000),
        exec("AAPL", Side::Sell, "10", "110", LATE_NIGHT_UTC + 2_000),
    ];
    let as_of = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    let ledger = compile(&rows, &EngineSettings::default(), as_of).unwrap();

    assert_eq!(ledger.metrics.open_position_count, 1);
    assert_eq!(ledger.metrics.closed_trade_count, 1);
    assert_eq!(ledger.open_positions().count(), 1);
}
