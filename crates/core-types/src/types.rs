use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for the per-trade fee ratio (1%).
pub const MAX_FEE_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The direction of a single trade as reported by the evaluation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// A strategy known to the remote catalog. Immutable; cached in memory for
/// the process lifetime once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor {
    /// Unique strategy key used in requests (e.g. "ma_crossover").
    pub code: String,
    /// Human-readable display name.
    pub name: String,
    pub description: String,
    /// Opaque parameter specification string, rendered by the UI only.
    pub param_spec: String,
}

/// The user-editable backtest parameters. Mutable until a run is dispatched,
/// at which point the orchestrating caller clones it so in-flight requests
/// are unaffected by further edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    pub interval: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    pub fee_ratio: Decimal,
    pub strategy_code: String,
}

impl BacktestConfig {
    /// Checks the range invariants on the configuration.
    ///
    /// The strategy code is deliberately not checked here: the catalog is
    /// remote, so an unknown code is the service's rejection to make.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::EmptyField("symbol"));
        }
        if self.interval.trim().is_empty() {
            return Err(Error::EmptyField("interval"));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(Error::InvalidInitialCapital(self.initial_capital));
        }
        if self.fee_ratio < Decimal::ZERO || self.fee_ratio > MAX_FEE_RATIO {
            return Err(Error::InvalidFeeRatio(self.fee_ratio));
        }
        if self.start_date > self.end_date {
            return Err(Error::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Returns a copy with the patch applied, if the patched result is still
    /// valid. The original config is left untouched either way.
    pub fn patched(&self, patch: &ConfigPatch) -> Result<BacktestConfig> {
        let mut next = self.clone();
        if let Some(symbol) = &patch.symbol {
            next.symbol = symbol.clone();
        }
        if let Some(interval) = &patch.interval {
            next.interval = interval.clone();
        }
        if let Some(start_date) = patch.start_date {
            next.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            next.end_date = end_date;
        }
        if let Some(initial_capital) = patch.initial_capital {
            next.initial_capital = initial_capital;
        }
        if let Some(fee_ratio) = patch.fee_ratio {
            next.fee_ratio = fee_ratio;
        }
        if let Some(strategy_code) = &patch.strategy_code {
            next.strategy_code = strategy_code.clone();
        }
        next.validate()?;
        Ok(next)
    }
}

/// A partial update to a [`BacktestConfig`]. Fields left as `None` keep
/// their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: Option<Decimal>,
    pub fee_ratio: Option<Decimal>,
    pub strategy_code: Option<String>,
}

/// One closed trade from a completed backtest. Produced only by the remote
/// service; immutable once created; ordered by entry time as returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: u64,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub exit_price: Decimal,
    pub side: Side,
    pub amount: Decimal,
    pub profit: Decimal,
    /// Percentage-scale return of this trade (62.9 means 62.9%).
    pub profit_percentage: Decimal,
}

/// The scored outcome of one completed backtest run.
///
/// Rate fields (`profit_percentage`, `win_rate`, `max_drawdown`) are on the
/// percentage scale; the boundary mapping converts the service's fractional
/// rates on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResults {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub profit: Decimal,
    pub profit_percentage: Decimal,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: Decimal,
    pub max_drawdown: Decimal,
    pub sharpe_ratio: Decimal,
    /// Identifies the run for later detail lookup. Always present when a
    /// result set is persisted; a client-side fallback is assigned when the
    /// service omits it.
    pub backtest_id: String,
    pub trades: Vec<TradeRecord>,
}

/// Per-strategy success/failure record within a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub strategy_code: String,
    pub strategy_name: String,
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Lifecycle state of a multi-strategy batch run.
///
/// `Completed` means a response was received, however many individual
/// strategies failed inside it; `Failed` is reserved for the batch request
/// itself never producing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// A multi-strategy batch run, mutated only by the batch orchestrator as
/// outcomes arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRun {
    /// Batch identifier assigned by the remote service, when it provides
    /// one. Callers use it to navigate to a batch-summary view.
    pub id: Option<String>,
    pub status: BatchStatus,
    /// One entry per dispatched strategy, keyed by strategy code.
    pub outcomes: BTreeMap<String, StrategyOutcome>,
    pub status_message: String,
}

impl BatchRun {
    /// A batch that has been requested but not yet answered.
    pub fn running() -> Self {
        Self {
            id: None,
            status: BatchStatus::Running,
            outcomes: BTreeMap::new(),
            status_message: String::new(),
        }
    }

    /// A batch whose request never produced a response.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            id: None,
            status: BatchStatus::Failed,
            outcomes: BTreeMap::new(),
            status_message: message.into(),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| o.status == OutcomeStatus::Success)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .count()
    }
}
