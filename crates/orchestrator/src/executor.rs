use api_client::{ApiClient, RawBacktestReport, RawTrade, RunQuery};
use chrono::{NaiveDate, Utc};
use core_types::{BacktestConfig, BacktestResults, TradeRecord};
use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// Drives one backtest request through the remote service and maps the
/// response into the domain result shape.
///
/// The config is cloned up front, so edits made while the request is in
/// flight cannot affect it. This function has no side effects beyond the
/// network call; dispatching `Start` before and `Finish` after is the
/// caller's job.
pub async fn run_single(client: &ApiClient, config: &BacktestConfig) -> Result<BacktestResults> {
    let config = config.clone();
    let query = RunQuery {
        symbol: &config.symbol,
        interval: &config.interval,
        start_time: start_of_day(config.start_date),
        end_time: end_of_day(config.end_date),
        initial_amount: config.initial_capital,
        fee_ratio: config.fee_ratio,
    };

    tracing::info!(
        symbol = %config.symbol,
        strategy = %config.strategy_code,
        start = %query.start_time,
        end = %query.end_time,
        "dispatching backtest"
    );

    let report = client
        .run_backtest(&query, &config.strategy_code)
        .await
        .map_err(Error::from_api)?;

    if !report.success {
        let message = report
            .error_message
            .unwrap_or_else(|| "backtest failed".to_string());
        return Err(Error::Rejected(message));
    }

    Ok(into_results(report))
}

/// Expands a date into the start-of-day boundary the service expects.
pub(crate) fn start_of_day(date: NaiveDate) -> String {
    format!("{date} 00:00:00")
}

/// Expands a date into the end-of-day boundary the service expects.
pub(crate) fn end_of_day(date: NaiveDate) -> String {
    format!("{date} 23:59:59")
}

/// Boundary conversion from the service's raw report. The service reports
/// fractional rates; the domain shape carries them on the percentage scale.
fn into_results(report: RawBacktestReport) -> BacktestResults {
    // Clock-based fallback when the service omits an id. Not guaranteed
    // unique against a later real id; the service should always return one.
    let backtest_id = report
        .backtest_id
        .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());

    let trades = report
        .trades
        .into_iter()
        .enumerate()
        .map(|(i, trade)| into_trade(i, trade))
        .collect();

    BacktestResults {
        initial_capital: report.initial_amount,
        final_capital: report.final_amount,
        profit: report.total_profit,
        profit_percentage: report.total_return * Decimal::ONE_HUNDRED,
        total_trades: report.number_of_trades,
        winning_trades: report.profitable_trades,
        losing_trades: report.unprofitable_trades,
        win_rate: report.win_rate * Decimal::ONE_HUNDRED,
        max_drawdown: report.max_drawdown * Decimal::ONE_HUNDRED,
        sharpe_ratio: report.sharpe_ratio,
        backtest_id,
        trades,
    }
}

fn into_trade(index: usize, trade: RawTrade) -> TradeRecord {
    TradeRecord {
        // Ordinal fallback keeps rows addressable when the service sends
        // no ids.
        id: trade.id.unwrap_or(index as u64 + 1),
        entry_time: trade.entry_time,
        entry_price: trade.entry_price,
        exit_time: trade.exit_time,
        exit_price: trade.exit_price,
        side: trade.side,
        amount: trade.amount,
        profit: trade.profit,
        profit_percentage: trade.profit_percentage * Decimal::ONE_HUNDRED,
    }
}
