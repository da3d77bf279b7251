use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Settings for the remote backtest evaluation service.
    pub service: ServiceSettings,
    /// Settings for the local durable session store.
    pub storage: StorageSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServiceSettings {
    /// The REST base URL of the evaluation service.
    pub base_url: String,
    /// Per-request timeout. Backtests over long date ranges can take a
    /// while, so this defaults generously.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StorageSettings {
    /// Directory the session record is written under.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}
