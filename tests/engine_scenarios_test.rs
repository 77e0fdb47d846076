//! Matching-engine scenario tests: the canonical round trips, short covers,
//! flips, and multiplier cases the engine must get exactly right.

use chrono::NaiveDate;
use tallybook::{
    match_executions, AssetClass, Decimal, Execution, ExecutionId, Instrument, InstrumentKey,
    OptionType, PositionMatcher, Side, Symbol, TimeMs, TradeDirection, UserId,
};

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn exec(instrument: Instrument, side: Side, quantity: &str, price: &str, at: i64) -> Execution {
    Execution {
        id: ExecutionId::new(),
        user: UserId::new("user-1".to_string()),
        instrument,
        side,
        quantity: d(quantity),
        price: d(price),
        fee: Decimal::zero(),
        executed_at: TimeMs::new(at),
    }
}

fn equity(symbol: &str) -> Instrument {
    Instrument::Equity {
        symbol: Symbol::new(symbol.to_string()),
    }
}

fn call(underlying: &str, strike: &str) -> Instrument {
    Instrument::Option {
        underlying: Symbol::new(underlying.to_string()),
        option_type: OptionType::Call,
        strike: d(strike),
        expiry: NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
        multiplier_override: None,
    }
}

fn es_future() -> Instrument {
    Instrument::Future {
        root: "ES".to_string(),
        month: 12,
        year: 2024,
        point_value_override: None,
    }
}

#[test]
fn test_equity_round_trip() {
    let rows = vec![
        exec(equity("AAPL"), Side::Buy, "100", "150", 1000),
        exec(equity("AAPL"), Side::Sell, "100", "155", 2000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    assert_eq!(outcome.closed_trades.len(), 1);
    let trade = &outcome.closed_trades[0];
    assert_eq!(trade.realized_pnl, d("500"));
    assert_eq!(trade.entry_price, d("150"));
    assert_eq!(trade.exit_price, d("155"));
    assert_eq!(trade.closed_quantity, d("100"));
    assert_eq!(trade.direction, TradeDirection::Long);
    assert!(outcome.final_position.is_flat());
    assert_eq!(outcome.final_position.avg_entry_price, Decimal::zero());
}

#[test]
fn test_option_contract_multiplier() {
    let rows = vec![
        exec(call("AAPL", "150"), Side::Buy, "1", "2.00", 1000),
        exec(call("AAPL", "150"), Side::Sell, "1", "3.50", 2000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    assert_eq!(outcome.closed_trades.len(), 1);
    assert_eq!(outcome.closed_trades[0].realized_pnl, d("150"));
    assert_eq!(outcome.closed_trades[0].asset_class, AssetClass::Option);
}

#[test]
fn test_short_cover() {
    let rows = vec![
        exec(equity("GME"), Side::Sell, "50", "200", 1000),
        exec(equity("GME"), Side::Buy, "50", "190", 2000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    assert_eq!(outcome.closed_trades.len(), 1);
    let trade = &outcome.closed_trades[0];
    assert_eq!(trade.realized_pnl, d("500"));
    assert_eq!(trade.direction, TradeDirection::Short);
    assert!(outcome.final_position.is_flat());
}

#[test]
fn test_losing_short_goes_negative() {
    let rows = vec![
        exec(equity("GME"), Side::Sell, "10", "100", 1000),
        exec(equity("GME"), Side::Buy, "10", "130", 2000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();
    assert_eq!(outcome.closed_trades[0].realized_pnl, d("-300"));
}

#[test]
fn test_flip_long_to_short_then_close() {
    let rows = vec![
        exec(equity("AAPL"), Side::Buy, "10", "100", 1000),
        exec(equity("AAPL"), Side::Sell, "15", "110", 2000),
        exec(equity("AAPL"), Side::Buy, "5", "105", 3000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    assert_eq!(outcome.closed_trades.len(), 2);

    // The overshooting sell closes all 10 long units...
    let first = &outcome.closed_trades[0];
    assert_eq!(first.closed_quantity, d("10"));
    assert_eq!(first.realized_pnl, d("100"));
    assert_eq!(first.direction, TradeDirection::Long);

    // ...and the leftover 5 become a short at the flip price, closed by the
    // final buy.
    let second = &outcome.closed_trades[1];
    assert_eq!(second.closed_quantity, d("5"));
    assert_eq!(second.entry_price, d("110"));
    assert_eq!(second.realized_pnl, d("25"));
    assert_eq!(second.direction, TradeDirection::Short);

    assert!(outcome.final_position.is_flat());
}

#[test]
fn test_flip_intermediate_state() {
    let mut matcher = PositionMatcher::new(
        InstrumentKey::Equity {
            symbol: Symbol::new("AAPL".to_string()),
        },
        AssetClass::Equity,
    );
    matcher
        .apply(&exec(equity("AAPL"), Side::Buy, "10", "100", 1000))
        .unwrap();
    matcher
        .apply(&exec(equity("AAPL"), Side::Sell, "15", "110", 2000))
        .unwrap();

    let position = matcher.position();
    assert_eq!(position.open_quantity, d("-5"));
    assert_eq!(position.avg_entry_price, d("110"));
    assert!(position.is_short());
}

#[test]
fn test_futures_point_value() {
    let rows = vec![
        exec(es_future(), Side::Buy, "1", "5000", 1000),
        exec(es_future(), Side::Sell, "1", "5010", 2000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    // 10 points x $50 per point.
    assert_eq!(outcome.closed_trades[0].realized_pnl, d("500"));
    assert!(!outcome.closed_trades[0].degraded);
}

#[test]
fn test_unknown_futures_root_degrades() {
    let unknown = Instrument::Future {
        root: "XX".to_string(),
        month: 6,
        year: 2025,
        point_value_override: None,
    };
    let rows = vec![
        exec(unknown.clone(), Side::Buy, "2", "100", 1000),
        exec(unknown, Side::Sell, "2", "110", 2000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    // Falls back to multiplier 1 and flags the record for a warning badge.
    assert_eq!(outcome.closed_trades[0].realized_pnl, d("20"));
    assert!(outcome.closed_trades[0].degraded);
}

#[test]
fn test_scale_in_then_close_uses_weighted_average() {
    let rows = vec![
        exec(equity("AAPL"), Side::Buy, "100", "10", 1000),
        exec(equity("AAPL"), Side::Buy, "50", "16", 2000),
        exec(equity("AAPL"), Side::Sell, "150", "14", 3000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    // Weighted average entry is 12; (14 - 12) x 150.
    assert_eq!(outcome.closed_trades.len(), 1);
    assert_eq!(outcome.closed_trades[0].entry_price, d("12"));
    assert_eq!(outcome.closed_trades[0].realized_pnl, d("300"));
}

#[test]
fn test_reopen_after_flat_gets_fresh_basis() {
    let rows = vec![
        exec(equity("AAPL"), Side::Buy, "10", "100", 1000),
        exec(equity("AAPL"), Side::Sell, "10", "110", 2000),
        exec(equity("AAPL"), Side::Buy, "10", "200", 3000),
        exec(equity("AAPL"), Side::Sell, "10", "210", 4000),
    ];
    let outcome = match_executions(&rows).unwrap().unwrap();

    assert_eq!(outcome.closed_trades.len(), 2);
    assert_eq!(outcome.closed_trades[0].entry_price, d("100"));
    assert_eq!(outcome.closed_trades[1].entry_price, d("200"));
    assert_eq!(outcome.closed_trades[1].realized_pnl, d("100"));
}

#[test]
fn test_matcher_is_deterministic() {
    let rows = vec![
        exec(equity("AAPL"), Side::Buy, "10", "100.25", 1000),
        exec(equity("AAPL"), Side::Buy, "7", "101.75", 2000),
        exec(equity("AAPL"), Side::Sell, "20", "103.5", 3000),
        exec(equity("AAPL"), Side::Buy, "3", "102", 4000),
    ];
    let a = match_executions(&rows).unwrap().unwrap();
    let b = match_executions(&rows).unwrap().unwrap();

    assert_eq!(a.closed_trades, b.closed_trades);
    assert_eq!(a.final_position, b.final_position);

    let bytes_a = serde_json::to_vec(&a.closed_trades).unwrap();
    let bytes_b = serde_json::to_vec(&b.closed_trades).unwrap();
    assert_eq!(bytes_a, bytes_b, "serialized output must be byte-identical");
}
