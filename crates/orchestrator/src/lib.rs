use std::sync::Arc;

use api_client::{ApiClient, StrategyCatalog};
use core_types::{BacktestResults, BatchRun};
use session::{SessionStore, Transition};

pub mod batch;
pub mod error;
pub mod executor;

// Re-export public types
pub use error::{Error, Result};

/// Owns the dispatch protocol around the executor and the batch
/// orchestrator.
///
/// The runner never holds the session aggregate itself; it only submits
/// transitions to the store and reads snapshots. The store's transition
/// guards do the rest: a second start is rejected before any request goes
/// out, and a stale response landing after the session moved on is dropped
/// by the `Finish`-requires-`Running` rule.
pub struct SessionRunner {
    store: Arc<SessionStore>,
    client: ApiClient,
    catalog: Arc<StrategyCatalog>,
}

impl SessionRunner {
    pub fn new(store: Arc<SessionStore>, client: ApiClient, catalog: Arc<StrategyCatalog>) -> Self {
        Self {
            store,
            client,
            catalog,
        }
    }

    /// Runs one backtest with the store's current config.
    ///
    /// The config is snapshotted before `Start` is dispatched, so the run
    /// uses exactly what the user saw when they hit start. On completion
    /// the outcome lands in the store: `Success` with results, or
    /// `Failure` with the error returned to the caller for display.
    pub async fn execute(&self) -> Result<BacktestResults> {
        let config = self.store.state().config;

        if !self.store.dispatch(Transition::Start) {
            return Err(Error::AlreadyRunning);
        }

        match executor::run_single(&self.client, &config).await {
            Ok(results) => {
                if !self
                    .store
                    .dispatch(Transition::Finish(Some(results.clone())))
                {
                    tracing::warn!(
                        backtest_id = %results.backtest_id,
                        "session left the running phase before the result arrived; result discarded"
                    );
                }
                Ok(results)
            }
            Err(e) => {
                if !self.store.dispatch(Transition::Finish(None)) {
                    tracing::warn!("session left the running phase before the failure arrived");
                }
                Err(e)
            }
        }
    }

    /// Runs a batch across `strategy_codes`, or across every strategy the
    /// service knows when `None`.
    ///
    /// The store sees the batch twice: once as `Running` when dispatched,
    /// once with its terminal state. Individual strategy failures are data
    /// inside the returned `BatchRun`, never an error from this method.
    pub async fn execute_batch(&self, strategy_codes: Option<&[String]>) -> BatchRun {
        let config = self.store.state().config;

        self.store.dispatch(Transition::SetBatch(BatchRun::running()));
        let run = batch::run_batch(&self.client, &self.catalog, &config, strategy_codes).await;
        self.store.dispatch(Transition::SetBatch(run.clone()));
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_config::types::ServiceSettings;
    use chrono::NaiveDate;
    use core_types::{BacktestConfig, BatchStatus};
    use rust_decimal_macros::dec;
    use session::Phase;

    fn config() -> BacktestConfig {
        BacktestConfig {
            symbol: "BTCUSDT".into(),
            interval: "1h".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            initial_capital: dec!(10_000),
            fee_ratio: dec!(0.001),
            strategy_code: "ma_crossover".into(),
        }
    }

    fn runner_for(server: &mockito::ServerGuard) -> (Arc<SessionStore>, SessionRunner) {
        let client = ApiClient::new(&ServiceSettings {
            base_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap();
        let store = Arc::new(SessionStore::new(config()));
        let catalog = Arc::new(StrategyCatalog::new(client.clone()));
        let runner = SessionRunner::new(store.clone(), client, catalog);
        (store, runner)
    }

    #[tokio::test]
    async fn successful_run_lands_the_session_in_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backtest/run")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"code":0,"data":{"success":true,"backtestId":"bt-1","initialAmount":10000,
                    "finalAmount":10300,"totalProfit":300,"totalReturn":0.03,"numberOfTrades":0,
                    "profitableTrades":0,"unprofitableTrades":0,"winRate":0,"maxDrawdown":0,
                    "sharpeRatio":0,"trades":[]},"message":"ok"}"#,
            )
            .create_async()
            .await;

        let (store, runner) = runner_for(&server);
        let results = runner.execute().await.unwrap();

        assert_eq!(results.backtest_id, "bt-1");
        let state = store.state();
        assert_eq!(state.phase, Phase::Success);
        assert_eq!(state.results.unwrap().backtest_id, "bt-1");
    }

    #[tokio::test]
    async fn failed_run_lands_the_session_in_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backtest/run")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let (store, runner) = runner_for(&server);
        let err = runner.execute().await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        let state = store.state();
        assert_eq!(state.phase, Phase::Failure);
        assert!(state.results.is_none());
    }

    #[tokio::test]
    async fn execute_while_running_is_rejected_without_a_request() {
        let server = mockito::Server::new_async().await;
        let (store, runner) = runner_for(&server);

        // Simulate an in-flight run.
        assert!(store.dispatch(Transition::Start));

        let err = runner.execute().await.unwrap_err();
        assert!(matches!(err, Error::AlreadyRunning));
        assert_eq!(store.state().phase, Phase::Running);
    }

    #[tokio::test]
    async fn batch_outcome_is_mirrored_into_the_store() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backtest/run-all")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"success":true,"batchBacktestId":"batch-3","message":"done",
                    "results":[{"strategyType":"ma_crossover","success":true}]}"#,
            )
            .create_async()
            .await;

        let (store, runner) = runner_for(&server);
        let mut rx = store.subscribe();
        let run = runner.execute_batch(None).await;

        assert_eq!(run.status, BatchStatus::Completed);
        assert_eq!(run.id.as_deref(), Some("batch-3"));

        // First the running marker, then the terminal batch.
        let first = rx.try_recv().unwrap().batch.unwrap();
        assert_eq!(first.status, BatchStatus::Running);
        let second = rx.try_recv().unwrap().batch.unwrap();
        assert_eq!(second.status, BatchStatus::Completed);
        assert_eq!(second.outcomes.len(), 1);
    }
}
