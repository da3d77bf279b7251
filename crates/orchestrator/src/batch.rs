use std::collections::BTreeMap;

use api_client::{ApiClient, RunQuery, StrategyCatalog};
use core_types::{BacktestConfig, BatchRun, BatchStatus, OutcomeStatus, StrategyOutcome};

use crate::executor::{end_of_day, start_of_day};

/// Dispatches a batch backtest as one remote call and aggregates the
/// per-strategy outcomes.
///
/// The service fans out across strategies itself; any subset of them may
/// fail while the rest succeed, and every reported outcome is recorded
/// either way. A received response always yields a `Completed` batch. Only
/// a request that produced no response at all (network failure, timeout,
/// HTTP error) yields `Failed` — encoded in the returned `BatchRun` rather
/// than thrown, so partial failure stays data, not an error.
pub async fn run_batch(
    client: &ApiClient,
    catalog: &StrategyCatalog,
    config: &BacktestConfig,
    strategy_codes: Option<&[String]>,
) -> BatchRun {
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
        strategies = ?strategy_codes,
        "dispatching batch backtest"
    );

    let report = match client.run_batch(&query, strategy_codes).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "batch backtest produced no response");
            return BatchRun::failed(e.to_string());
        }
    };

    let mut outcomes = BTreeMap::new();
    for raw in report.results {
        let code = raw.strategy_type;
        let status = if raw.success {
            OutcomeStatus::Success
        } else {
            tracing::warn!(
                strategy = %code,
                error = raw.error_message.as_deref().unwrap_or("unspecified"),
                "strategy failed inside the batch"
            );
            OutcomeStatus::Failed
        };
        // Label with the catalog display name when the service sent none.
        let strategy_name = raw
            .strategy_name
            .or_else(|| catalog.get(&code).map(|d| d.name.clone()))
            .unwrap_or_else(|| code.clone());

        outcomes.insert(
            code.clone(),
            StrategyOutcome {
                strategy_code: code,
                strategy_name,
                status,
                error: raw.error_message,
            },
        );
    }

    // The caller is expected to navigate to a batch-summary view keyed by
    // the id when the service provides one; surfacing it is all we do here.
    BatchRun {
        id: report.batch_backtest_id,
        status: BatchStatus::Completed,
        outcomes,
        status_message: report.message.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_config::types::ServiceSettings;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&ServiceSettings {
            base_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            symbol: "BTCUSDT".into(),
            interval: "4h".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            initial_capital: dec!(5_000),
            fee_ratio: dec!(0.001),
            strategy_code: String::new(),
        }
    }

    const PARTIAL_FAILURE_BODY: &str = r#"{
        "success": true,
        "batchBacktestId": "batch-99",
        "message": "3 of 4 strategies completed",
        "results": [
            {"strategyType": "ma_crossover", "strategyName": "MA Crossover", "success": true},
            {"strategyType": "rsi_reversal", "success": true},
            {"strategyType": "supertrend", "success": true},
            {"strategyType": "grid", "success": false, "errorMessage": "insufficient volatility"}
        ]
    }"#;

    #[tokio::test]
    async fn partial_failure_still_completes_with_every_outcome_recorded() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backtest/run-all")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(PARTIAL_FAILURE_BODY)
            .create_async()
            .await;

        let client = client_for(&server);
        let catalog = StrategyCatalog::new(client.clone());
        let run = run_batch(&client, &catalog, &config(), None).await;

        assert_eq!(run.status, BatchStatus::Completed);
        assert_eq!(run.outcomes.len(), 4);
        assert_eq!(run.succeeded_count(), 3);
        assert_eq!(run.failed_count(), 1);

        let failed = &run.outcomes["grid"];
        assert_eq!(failed.status, OutcomeStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("insufficient volatility"));

        // The batch identifier is surfaced for the caller to navigate with.
        assert_eq!(run.id.as_deref(), Some("batch-99"));
    }

    #[tokio::test]
    async fn outcome_names_fall_back_to_codes_without_a_catalog() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backtest/run-all")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(PARTIAL_FAILURE_BODY)
            .create_async()
            .await;

        let client = client_for(&server);
        let catalog = StrategyCatalog::new(client.clone());
        let run = run_batch(&client, &catalog, &config(), None).await;

        assert_eq!(run.outcomes["ma_crossover"].strategy_name, "MA Crossover");
        assert_eq!(run.outcomes["rsi_reversal"].strategy_name, "rsi_reversal");
    }

    #[tokio::test]
    async fn transport_failure_yields_a_failed_batch_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backtest/run-all")
            .match_query(mockito::Matcher::Any)
            .with_status(504)
            .create_async()
            .await;

        let client = client_for(&server);
        let catalog = StrategyCatalog::new(client.clone());
        let run = run_batch(&client, &catalog, &config(), None).await;

        assert_eq!(run.status, BatchStatus::Failed);
        assert!(run.outcomes.is_empty());
        assert!(!run.status_message.is_empty());
    }

    #[tokio::test]
    async fn explicit_strategy_list_is_forwarded() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/backtest/run-all")
            .match_query(mockito::Matcher::UrlEncoded(
                "strategyTypes".into(),
                "ma_crossover,supertrend".into(),
            ))
            .with_status(200)
            .with_body(r#"{"success":true,"message":"ok","results":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let catalog = StrategyCatalog::new(client.clone());
        let codes = vec!["ma_crossover".to_string(), "supertrend".to_string()];
        let run = run_batch(&client, &catalog, &config(), Some(&codes)).await;

        m.assert_async().await;
        assert_eq!(run.status, BatchStatus::Completed);
    }
}
