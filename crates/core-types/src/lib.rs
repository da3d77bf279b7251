pub mod error;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use types::{
    BacktestConfig, BacktestResults, BatchRun, BatchStatus, ConfigPatch, OutcomeStatus, Side,
    StrategyDescriptor, StrategyOutcome, TradeRecord,
};
