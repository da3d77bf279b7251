use chrono::{DateTime, Utc};
use core_types::Side;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The main client for interacting with the backtest evaluation service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL of the evaluation service, without a trailing slash.
    pub base_url: String,
}

/// The standard `{code, data, message}` wrapper around most service
/// responses. `code == 0` is success; anything else carries `message`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// One entry of the strategy catalog as the service returns it. The
/// strategy code is the map key, not a field.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawStrategy {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub param_spec: String,
}

/// Market and date parameters shared by the single-run and batch endpoints.
/// Time boundaries are preformatted strings ("YYYY-MM-DD HH:MM:SS").
#[derive(Debug, Clone)]
pub struct RunQuery<'a> {
    pub symbol: &'a str,
    pub interval: &'a str,
    pub start_time: String,
    pub end_time: String,
    pub initial_amount: Decimal,
    pub fee_ratio: Decimal,
}

/// Raw payload of `GET /backtest/run`, before boundary conversion into the
/// domain result shape. Rate fields are fractional here (0.629, not 62.9).
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawBacktestReport {
    pub success: bool,
    #[serde(default)]
    pub backtest_id: Option<String>,
    #[serde(default)]
    pub initial_amount: Decimal,
    #[serde(default)]
    pub final_amount: Decimal,
    #[serde(default)]
    pub total_profit: Decimal,
    #[serde(default)]
    pub total_return: Decimal,
    #[serde(default)]
    pub number_of_trades: u32,
    #[serde(default)]
    pub profitable_trades: u32,
    #[serde(default)]
    pub unprofitable_trades: u32,
    #[serde(default)]
    pub win_rate: Decimal,
    #[serde(default)]
    pub max_drawdown: Decimal,
    #[serde(default)]
    pub sharpe_ratio: Decimal,
    #[serde(default)]
    pub trades: Vec<RawTrade>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One trade row inside a raw backtest report.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTrade {
    #[serde(default)]
    pub id: Option<u64>,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub exit_price: Decimal,
    pub side: Side,
    pub amount: Decimal,
    pub profit: Decimal,
    #[serde(default)]
    pub profit_percentage: Decimal,
}

/// Raw payload of `GET /backtest/run-all`. This endpoint does not use the
/// `{code, data, message}` envelope.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawBatchReport {
    pub success: bool,
    #[serde(default)]
    pub batch_backtest_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Per-strategy outcomes. Any subset may report failure while the rest
    /// succeed; an absent array means the service reported nothing per
    /// strategy.
    #[serde(default)]
    pub results: Vec<RawBatchOutcome>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawBatchOutcome {
    pub strategy_type: String,
    #[serde(default)]
    pub strategy_name: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}
