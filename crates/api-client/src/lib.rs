use std::collections::HashMap;
use std::time::Duration;

use app_config::types::ServiceSettings;
use core_types::StrategyDescriptor;
use serde::de::DeserializeOwned;

pub mod catalog;
pub mod error;
pub mod types;

// Re-export public types
pub use catalog::StrategyCatalog;
pub use error::{Error, Result};
pub use types::*;

impl ApiClient {
    /// Constructs a new ApiClient from ServiceSettings.
    pub fn new(settings: &ServiceSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        // The base_url is taken directly from the settings struct that was
        // populated from your .toml file.
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        Ok(ApiClient {
            http_client,
            base_url,
        })
    }

    /// Fetches the strategy catalog.
    ///
    /// This corresponds to the `GET /strategies` endpoint. The service keys
    /// the map by strategy code; the code is copied into each descriptor so
    /// downstream consumers can pass descriptors around on their own.
    pub async fn get_strategies(&self) -> Result<HashMap<String, StrategyDescriptor>> {
        let url = format!("{}/strategies", self.base_url);
        let raw: HashMap<String, RawStrategy> = self.get_enveloped(&url, &[]).await?;

        let strategies = raw
            .into_iter()
            .map(|(code, raw)| {
                let name = if raw.name.is_empty() {
                    code.clone()
                } else {
                    raw.name
                };
                let descriptor = StrategyDescriptor {
                    code: code.clone(),
                    name,
                    description: raw.description,
                    param_spec: raw.param_spec,
                };
                (code, descriptor)
            })
            .collect();

        Ok(strategies)
    }

    /// Runs one backtest for a single strategy.
    ///
    /// This corresponds to the `GET /backtest/run` endpoint. Returns the raw
    /// report; the caller owns the conversion into the domain result shape.
    pub async fn run_backtest(
        &self,
        query: &RunQuery<'_>,
        strategy_type: &str,
    ) -> Result<RawBacktestReport> {
        let url = format!("{}/backtest/run", self.base_url);
        let mut params = Self::common_params(query);
        params.push(("strategyType", strategy_type.to_string()));

        self.get_enveloped(&url, &params).await
    }

    /// Dispatches a batch backtest across many strategies in one request.
    ///
    /// This corresponds to the `GET /backtest/run-all` endpoint. When
    /// `strategy_codes` is `None`, no strategy filter is sent and the
    /// service runs every strategy it knows. Unlike the other endpoints the
    /// response is not wrapped in the `{code, data, message}` envelope.
    pub async fn run_batch(
        &self,
        query: &RunQuery<'_>,
        strategy_codes: Option<&[String]>,
    ) -> Result<RawBatchReport> {
        let url = format!("{}/backtest/run-all", self.base_url);
        let mut params = Self::common_params(query);
        if let Some(codes) = strategy_codes {
            params.push(("strategyTypes", codes.join(",")));
        }

        let text = self.get_text(&url, &params).await?;
        let report: RawBatchReport =
            serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        Ok(report)
    }

    fn common_params(query: &RunQuery<'_>) -> Vec<(&'static str, String)> {
        vec![
            ("startTime", query.start_time.clone()),
            ("endTime", query.end_time.clone()),
            ("initialAmount", query.initial_amount.to_string()),
            ("symbol", query.symbol.to_string()),
            ("interval", query.interval.to_string()),
            ("feeRatio", query.fee_ratio.to_string()),
        ]
    }

    /// Issues a GET and returns the body text, failing on transport errors
    /// and non-success HTTP statuses.
    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        tracing::debug!(url, "issuing service request");
        let response = self
            .http_client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        response.text().await.map_err(Error::RequestFailed)
    }

    /// GET an endpoint that wraps its payload in the standard envelope and
    /// unwrap it, mapping a non-zero envelope code to `Error::ApiError`.
    async fn get_enveloped<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let text = self.get_text(url, params).await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;

        if envelope.code != 0 {
            let msg = envelope
                .message
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(Error::ApiError {
                code: envelope.code,
                msg,
            });
        }

        envelope.data.ok_or(Error::EmptyPayload)
    }
}
