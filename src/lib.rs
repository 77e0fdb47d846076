//! Deterministic realized-P&L matching engine for multi-asset trade
//! journals.
//!
//! The crate turns one user's ordered trade executions into realized trades,
//! calendar-day aggregates, and dashboard metrics, as a pure synchronous
//! transformation: no I/O, no clock reads, bit-identical output for
//! identical input. Everything downstream of a journal (heatmaps, KPI
//! cards, reports) hangs off the numbers produced here.

pub mod compile;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod report;

pub use compile::{compile, CompiledLedger};
pub use config::{EngineSettings, PnlMode};
pub use domain::{
    sort_chronological, AssetClass, Decimal, Execution, ExecutionId, Instrument, InstrumentKey,
    OptionType, Side, Symbol, TimeMs, UserId,
};
pub use engine::{
    aggregate, match_executions, project, CalendarData, ClosedTradeRecord, DailyBucket, DayPnl,
    MatchOutcome, Metrics, Position, PositionMatcher, ResolvedMultiplier, TradeDirection,
    TradeStatus, TradeSummary,
};
pub use error::{
    InvariantViolation, MatchError, RejectedExecution, SettingsError, ValidationError,
};
pub use report::{fingerprint, CalendarReport, LedgerReport, MetricsReport};
