//! FutLab CLI: replay event scripts and inspect portfolio state.
//!
//! Commands:
//! - `replay`: play a JSON-lines event script through the portfolio core
//! - `points`: print the effective point-value table
//! - `check-symbol`: validate symbols against the grammar and table
//! - `checkpoint inspect`: verify and summarize a saved checkpoint

mod replay;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use futlab_core::data::{CsvPriceProvider, InMemoryPrices, PriceProvider, TimeoutPriceProvider};
use futlab_core::domain::{FuturesSymbol, PositionSide};
use futlab_core::ledger::{MemoryLedger, PositionLedger};
use futlab_core::portfolio::PortfolioCheckpoint;
use futlab_core::{Portfolio, PortfolioConfig};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "futlab",
    about = "FutLab CLI: futures order and position reconciliation"
)]
struct Cli {
    /// Log filter when RUST_LOG is unset (e.g. info, debug, futlab_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event script through the portfolio.
    Replay {
        /// Event script, one JSON event per line.
        events: PathBuf,

        /// Path to a TOML portfolio config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV settlement prices (trading_day,symbol,<field>...).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Restore attribution state from this checkpoint before replaying.
        #[arg(long)]
        restore: Option<PathBuf>,

        /// Write a checkpoint of the final attribution state here.
        #[arg(long)]
        checkpoint_out: Option<PathBuf>,

        /// Trading day assumed before the first dated event (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Exit non-zero if any event was rejected or any symbol went unpriced.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the effective point-value table.
    Points {
        /// Path to a TOML portfolio config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate symbols and print their multipliers.
    CheckSymbol {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Path to a TOML portfolio config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Checkpoint inspection.
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
}

#[derive(Subcommand)]
enum CheckpointAction {
    /// Verify a checkpoint's checksum and list its in-flight orders.
    Inspect { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Replay {
            events,
            config,
            prices,
            restore,
            checkpoint_out,
            start,
            strict,
        } => run_replay_cmd(
            &events,
            config.as_deref(),
            prices.as_deref(),
            restore.as_deref(),
            checkpoint_out.as_deref(),
            start.as_deref(),
            strict,
        ),
        Commands::Points { config } => run_points(config.as_deref()),
        Commands::CheckSymbol { symbols, config } => run_check_symbol(&symbols, config.as_deref()),
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Inspect { path } => run_checkpoint_inspect(&path),
        },
    }
}

fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("invalid log filter '{default_level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PortfolioConfig> {
    match path {
        Some(path) => PortfolioConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PortfolioConfig::default()),
    }
}

fn build_provider(prices: Option<&Path>, config: &PortfolioConfig) -> Result<Box<dyn PriceProvider>> {
    let provider: Arc<dyn PriceProvider> = match prices {
        Some(path) => Arc::new(
            CsvPriceProvider::from_path(path)
                .with_context(|| format!("loading prices {}", path.display()))?,
        ),
        None => Arc::new(InMemoryPrices::new()),
    };
    let bounded: Box<dyn PriceProvider> = match config.price_timeout() {
        Some(timeout) => Box::new(TimeoutPriceProvider::new(provider, timeout)),
        None => Box::new(provider),
    };
    Ok(bounded)
}

fn run_replay_cmd(
    events: &Path,
    config_path: Option<&Path>,
    prices: Option<&Path>,
    restore: Option<&Path>,
    checkpoint_out: Option<&Path>,
    start: Option<&str>,
    strict: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = build_provider(prices, &config)?;
    tracing::info!(provider = provider.name(), field = %config.settlement_field, "replay starting");

    let mut portfolio = Portfolio::new(MemoryLedger::new(), provider, &config);
    if let Some(path) = restore {
        let checkpoint = PortfolioCheckpoint::load(path)
            .with_context(|| format!("loading checkpoint {}", path.display()))?;
        portfolio.restore(&checkpoint)?;
    }

    let start_day = match start {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --start '{s}'"))?,
        None => chrono::Local::now().date_naive(),
    };
    let mut engine = replay::ReplayEngine::new(start_day);

    let file = File::open(events).with_context(|| format!("opening {}", events.display()))?;
    let summary = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        replay::run_replay(&mut portfolio, &mut engine, BufReader::new(file), &mut out)?
    };

    print_positions(portfolio.ledger());
    println!(
        "{} events: {} orders, {} fills, {} cancels, {} bars, {} settlements ({} unpriced), {} rejected",
        summary.events,
        summary.orders,
        summary.fills,
        summary.cancels,
        summary.bars,
        summary.settlements,
        summary.unpriced,
        summary.errors.len(),
    );
    println!("In flight: {} order(s)", portfolio.attribution().len());

    if let Some(path) = checkpoint_out {
        portfolio
            .checkpoint()
            .save(path)
            .with_context(|| format!("writing checkpoint {}", path.display()))?;
        println!("Checkpoint saved to: {}", path.display());
    }

    if strict && (!summary.errors.is_empty() || summary.unpriced > 0) {
        bail!(
            "{} event(s) rejected, {} symbol(s) unpriced",
            summary.errors.len(),
            summary.unpriced
        );
    }
    Ok(())
}

fn print_positions(ledger: &MemoryLedger) {
    let symbols = ledger.symbols();
    if symbols.is_empty() {
        return;
    }
    println!();
    println!("{:<10} {:>8} {:>8}", "Symbol", "Long", "Short");
    println!("{}", "-".repeat(28));
    for symbol in &symbols {
        println!(
            "{:<10} {:>8} {:>8}",
            symbol,
            ledger.position(symbol, PositionSide::Long),
            ledger.position(symbol, PositionSide::Short)
        );
    }
    println!();
}

fn run_points(config_path: Option<&Path>) -> Result<()> {
    let table = load_config(config_path)?.point_value_table();
    println!("{:<8} {:>10}", "Product", "Multiplier");
    println!("{}", "-".repeat(19));
    for (product, multiplier) in table.iter() {
        println!("{product:<8} {multiplier:>10}");
    }
    println!("{} products", table.len());
    Ok(())
}

fn run_check_symbol(symbols: &[String], config_path: Option<&Path>) -> Result<()> {
    let table = load_config(config_path)?.point_value_table();
    let mut invalid = 0;
    for symbol in symbols {
        match table.multiplier_for(symbol) {
            Ok(multiplier) => {
                // multiplier_for only succeeds on a symbol that parses.
                let parts = FuturesSymbol::parse(symbol)?;
                println!(
                    "{symbol}: product {} contract {} multiplier {multiplier}",
                    parts.product, parts.contract
                );
            }
            Err(e) => {
                invalid += 1;
                println!("{symbol}: invalid ({e})");
            }
        }
    }
    if invalid > 0 {
        bail!("{invalid} of {} symbol(s) invalid", symbols.len());
    }
    Ok(())
}

fn run_checkpoint_inspect(path: &Path) -> Result<()> {
    let checkpoint = PortfolioCheckpoint::load(path)
        .with_context(|| format!("loading checkpoint {}", path.display()))?;
    println!("Checkpoint: {}", path.display());
    println!("Version: {}", checkpoint.version);
    println!("Next index: {}", checkpoint.next_index);
    println!("In flight: {}", checkpoint.entries.len());
    if checkpoint.entries.is_empty() {
        return Ok(());
    }
    println!();
    println!("{:<8} {:<10} {:<16} {:>10}", "Index", "Symbol", "Strategy", "Remaining");
    println!("{}", "-".repeat(47));
    for entry in &checkpoint.entries {
        println!(
            "{:<8} {:<10} {:<16} {:>10}",
            entry.index.to_string(),
            entry.attribution.symbol,
            entry.attribution.strategy.to_string(),
            entry.attribution.remaining
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_with_csv_prices_writes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let events = dir.path().join("events.jsonl");
        let prices = dir.path().join("prices.csv");
        let config = dir.path().join("futlab.toml");
        let checkpoint = dir.path().join("state.json");

        std::fs::write(
            &events,
            concat!(
                r#"{"event":"signal","trading_day":"2017-06-01","symbol":"rb1710","strategy":"trend","signal_type":"LONG","strength":2}"#,
                "\n",
                r#"{"event":"signal","trading_day":"2017-06-01","symbol":"hc1710","strategy":"carry","signal_type":"SHORT","strength":1}"#,
                "\n",
                r#"{"event":"fill","index":1,"price":3120.0}"#,
                "\n",
                r#"{"event":"settle","trading_day":"2017-06-01"}"#,
                "\n",
            ),
        )
        .unwrap();
        std::fs::write(&prices, "trading_day,symbol,closeprice\n2017-06-01,rb1710,3130\n").unwrap();
        std::fs::write(&config, "price_timeout_ms = 1000\n").unwrap();

        run_replay_cmd(
            &events,
            Some(&config),
            Some(&prices),
            None,
            Some(&checkpoint),
            Some("2017-06-01"),
            true,
        )
        .unwrap();

        let saved = PortfolioCheckpoint::load(&checkpoint).unwrap();
        assert_eq!(saved.entries.len(), 1);
        assert_eq!(saved.entries[0].attribution.symbol, "hc1710");
        assert_eq!(saved.next_index.0, 3);
    }

    #[test]
    fn strict_replay_fails_on_rejected_events() {
        let dir = tempfile::tempdir().unwrap();
        let events = dir.path().join("events.jsonl");
        std::fs::write(&events, "{\"event\":\"cancel\",\"index\":7}\n").unwrap();

        assert!(run_replay_cmd(&events, None, None, None, None, Some("2017-06-01"), true).is_err());
        assert!(run_replay_cmd(&events, None, None, None, None, Some("2017-06-01"), false).is_ok());
    }

    #[test]
    fn check_symbol_rejects_bad_symbols() {
        assert!(run_check_symbol(&["rb1710".into(), "IF1709".into()], None).is_ok());
        assert!(run_check_symbol(&["rebar".into()], None).is_err());
    }

    #[test]
    fn cli_parses_replay_arguments() {
        let cli = Cli::try_parse_from([
            "futlab",
            "--log-level",
            "debug",
            "replay",
            "events.jsonl",
            "--prices",
            "prices.csv",
            "--strict",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Replay { strict: true, .. }));
    }
}
