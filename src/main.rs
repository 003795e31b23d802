use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use reorder_sim::config::{AppConfig, ConfigOverrides};
use reorder_sim::io::history;
use reorder_sim::io::reporting::{self, CsvRecommendationSink, RECOMMENDATIONS_FILE, SALES_FILE};
use reorder_sim::pipeline::{export_simulation, run_reorder, run_simulation};
use reorder_sim::telemetry;

#[derive(Debug, Parser)]
#[command(
    name = "reorder-sim",
    about = "Synthetic retail history and forecast-driven reorder points",
    after_help = "Examples:\n  reorder-sim run --seed 7\n  reorder-sim simulate --items 10 --days 30\n  reorder-sim forecast --history out/sales.csv"
)]
struct Cli {
    #[arg(long, global = true, help = "TOML configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Random seed")]
    seed: Option<u64>,
    #[arg(long, global = true, help = "Catalog size")]
    items: Option<u32>,
    #[arg(long, global = true, help = "Simulated days")]
    days: Option<u32>,
    #[arg(long, global = true, help = "Directory for the CSV tables")]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level (RUST_LOG takes precedence)")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Generate the catalog, simulate sales and stock, write items/sales/inventory")]
    Simulate,
    #[command(about = "Forecast demand from a sales log and replace the reorder recommendations")]
    Forecast {
        #[arg(long, help = "Sales log to read (defaults to <output-dir>/sales.csv)")]
        history: Option<PathBuf>,
    },
    #[command(about = "Simulate, then forecast from the fresh history")]
    Run,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. SETUP CONFIGURATION
    let overrides = ConfigOverrides {
        seed: cli.seed,
        items: cli.items,
        days: cli.days,
        output_dir: cli.output_dir,
        log_level: cli.log_level,
    };
    let config = AppConfig::load(cli.config.as_deref(), overrides)
        .context("loading configuration")?;
    telemetry::init(&config.logging);

    let out = &config.output.dir;
    let mut sink = CsvRecommendationSink::new(out.join(RECOMMENDATIONS_FILE));

    match cli.command {
        Command::Simulate => {
            let artifacts = run_simulation(&config.simulation).context("simulating inventory")?;
            export_simulation(out, &artifacts).context("exporting simulation tables")?;
        }
        Command::Forecast { history: history_path } => {
            let path = history_path.unwrap_or_else(|| out.join(SALES_FILE));
            let history = history::load_history(&path)
                .with_context(|| format!("reading sales history from {}", path.display()))?;
            reporting::ensure_dir(out)?;
            run_reorder(&history, &config.forecast, &config.reorder, &mut sink)
                .context("computing reorder recommendations")?;
        }
        Command::Run => {
            let artifacts = run_simulation(&config.simulation).context("simulating inventory")?;
            export_simulation(out, &artifacts).context("exporting simulation tables")?;
            run_reorder(&artifacts.history(), &config.forecast, &config.reorder, &mut sink)
                .context("computing reorder recommendations")?;
        }
    }

    info!(dir = %out.display(), recommendations = %sink.path().display(), "done");
    Ok(())
}
