use std::sync::Arc;

use anyhow::Result;
use api_client::{ApiClient, StrategyCatalog};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use core_types::{BacktestConfig, BacktestResults, BatchRun, BatchStatus, OutcomeStatus};
use orchestrator::SessionRunner;
use rust_decimal::Decimal;
use session::{FileStore, SessionStore, Transition};
use tracing_subscriber::EnvFilter;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Console for a remote backtest evaluation service.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists the strategies known to the remote catalog.
    Strategies,

    /// Runs one strategy backtest and stores the result set.
    Run {
        /// The trading symbol to backtest (e.g., "BTCUSDT").
        #[arg(short, long)]
        symbol: String,

        /// The kline interval (e.g., "5m", "1h").
        #[arg(short, long)]
        interval: String,

        /// The start date for the backtest in YYYY-MM-DD format.
        #[arg(long)]
        start_date: NaiveDate,

        /// The end date for the backtest in YYYY-MM-DD format.
        #[arg(long)]
        end_date: NaiveDate,

        /// Starting capital for the simulation.
        #[arg(long, default_value = "10000")]
        initial_capital: Decimal,

        /// Per-trade fee ratio, at most 0.01.
        #[arg(long, default_value = "0.001")]
        fee_ratio: Decimal,

        /// The strategy code to run (see `strategies`).
        #[arg(long)]
        strategy: String,
    },

    /// Runs every known strategy (or a chosen subset) as one batch.
    Batch {
        #[arg(short, long)]
        symbol: String,

        #[arg(short, long)]
        interval: String,

        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        end_date: NaiveDate,

        #[arg(long, default_value = "10000")]
        initial_capital: Decimal,

        #[arg(long, default_value = "0.001")]
        fee_ratio: Decimal,

        /// Comma-separated strategy codes; omit to run all known strategies.
        #[arg(long, value_delimiter = ',')]
        strategies: Option<Vec<String>>,
    },

    /// Shows one page of trades from the stored result set.
    Results {
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },

    /// Drops the stored result set.
    Clear,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = app_config::load_settings()?;
    let client = ApiClient::new(&settings.service)?;
    let files = FileStore::new(&settings.storage.dir);

    match cli.command {
        Commands::Strategies => {
            let catalog = StrategyCatalog::new(client);
            catalog.ensure_loaded().await?;
            print_strategies(&catalog);
        }

        Commands::Run {
            symbol,
            interval,
            start_date,
            end_date,
            initial_capital,
            fee_ratio,
            strategy,
        } => {
            let config = BacktestConfig {
                symbol,
                interval,
                start_date,
                end_date,
                initial_capital,
                fee_ratio,
                strategy_code: strategy,
            };
            config.validate()?;

            let store = Arc::new(SessionStore::with_persistence(config, files));
            let catalog = Arc::new(StrategyCatalog::new(client.clone()));
            let runner = SessionRunner::new(store, client, catalog);

            let results = runner.execute().await?;
            print_results(&results);
            println!("Result set stored; browse trades with `app results --page 1`.");
        }

        Commands::Batch {
            symbol,
            interval,
            start_date,
            end_date,
            initial_capital,
            fee_ratio,
            strategies,
        } => {
            let config = BacktestConfig {
                symbol,
                interval,
                start_date,
                end_date,
                initial_capital,
                fee_ratio,
                strategy_code: String::new(),
            };
            config.validate()?;

            let store = Arc::new(SessionStore::with_persistence(config, files));
            let catalog = Arc::new(StrategyCatalog::new(client.clone()));
            if let Err(e) = catalog.ensure_loaded().await {
                tracing::warn!(error = %e, "strategy catalog unavailable; outcomes will be labeled by code");
            }
            let runner = SessionRunner::new(store, client, catalog);

            let run = runner.execute_batch(strategies.as_deref()).await;
            print_batch(&run);
        }

        Commands::Results { page, page_size } => {
            let store = SessionStore::with_persistence(placeholder_config(), files);
            match store.state().results {
                Some(results) => print_trades_page(&results, page, page_size),
                None => println!("No stored backtest results. Run `app run` first."),
            }
        }

        Commands::Clear => {
            let store = SessionStore::with_persistence(placeholder_config(), files);
            if store.dispatch(Transition::ClearResults) {
                println!("Stored results cleared.");
            } else {
                println!("No stored results to clear.");
            }
        }
    }

    Ok(())
}

/// Stand-in config for commands that only touch the stored result set and
/// never dispatch a run.
fn placeholder_config() -> BacktestConfig {
    BacktestConfig {
        symbol: "BTCUSDT".into(),
        interval: "1h".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date"),
        initial_capital: Decimal::from(10_000),
        fee_ratio: Decimal::ZERO,
        strategy_code: String::new(),
    }
}

fn print_strategies(catalog: &StrategyCatalog) {
    println!("\n--- Available Strategies ---");
    println!("----------------------------");
    for descriptor in catalog.all() {
        println!("{:<20} {}", descriptor.code, descriptor.name);
        if !descriptor.description.is_empty() {
            println!("{:<20} {}", "", descriptor.description);
        }
        if !descriptor.param_spec.is_empty() {
            println!("{:<20} params: {}", "", descriptor.param_spec);
        }
    }
    println!("----------------------------");
}

/// Helper function to print the result set in a readable format.
fn print_results(results: &BacktestResults) {
    println!("\n--- Backtest Results ---");
    println!("-----------------------------------");
    println!("Backtest ID:      {}", results.backtest_id);
    println!("Initial Capital:  ${:.2}", results.initial_capital);
    println!("Final Capital:    ${:.2}", results.final_capital);
    println!(
        "Profit:           ${:.2} ({:.2}%)",
        results.profit, results.profit_percentage
    );
    println!("Max Drawdown:     {:.2}%", results.max_drawdown);
    println!("Sharpe Ratio:     {:.3}", results.sharpe_ratio);
    println!("Win Rate:         {:.2}%", results.win_rate);
    println!(
        "Trades:           {} ({} won / {} lost)",
        results.total_trades, results.winning_trades, results.losing_trades
    );
    println!("-----------------------------------");
}

fn print_trades_page(results: &BacktestResults, page: usize, page_size: usize) {
    let total = views::total_pages(results, page_size);
    let trades = views::page(results, page, page_size);

    print_results(results);
    println!("Trades, page {page} of {total}:");
    if trades.is_empty() {
        println!("  (no trades on this page)");
        return;
    }
    for trade in trades {
        println!(
            "  #{:<4} {:?} {} @ ${} -> {} @ ${}  profit ${:.2} ({:.2}%)",
            trade.id,
            trade.side,
            trade.entry_time.format("%Y-%m-%d %H:%M"),
            trade.entry_price,
            trade.exit_time.format("%Y-%m-%d %H:%M"),
            trade.exit_price,
            trade.profit,
            trade.profit_percentage
        );
    }
}

fn print_batch(run: &BatchRun) {
    println!("\n--- Batch Backtest ---");
    println!("-----------------------------------");
    println!("Status:           {:?}", run.status);
    if let Some(id) = &run.id {
        println!("Batch ID:         {id}");
    }
    if !run.status_message.is_empty() {
        println!("Message:          {}", run.status_message);
    }
    if !run.outcomes.is_empty() {
        println!(
            "Outcomes:         {} succeeded / {} failed",
            run.succeeded_count(),
            run.failed_count()
        );
        for outcome in run.outcomes.values() {
            match outcome.status {
                OutcomeStatus::Success => {
                    println!("  [ok]     {:<20} {}", outcome.strategy_code, outcome.strategy_name);
                }
                OutcomeStatus::Failed => {
                    println!(
                        "  [failed] {:<20} {}",
                        outcome.strategy_code,
                        outcome.error.as_deref().unwrap_or("unspecified error")
                    );
                }
            }
        }
    }
    println!("-----------------------------------");
    if run.status == BatchStatus::Completed {
        if let Some(id) = &run.id {
            println!("View the batch summary with id {id} once the service publishes it.");
        }
    }
}
