//! biblioharvest - Bibliometric harvester for OpenAlex
//!
//! Queries OpenAlex for every (topic, year) pair, records the match count
//! and the five most-cited works, and writes one JSON document.
//!
//! ## Usage
//!
//! ```bash
//! biblioharvest harvest --topic Blockchain --topic "Smart contract" --from-year 2020 --to-year 2025
//! biblioharvest gaps --input data.json
//! ```

use anyhow::{Context, Result};
use biblioharvest::{
    harvest::{HarvestConfig, Harvester},
    openalex::{OpenAlexClient, OPENALEX_API_BASE},
    output,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Bibliometric harvester - per-topic, per-year OpenAlex counts and top-cited samples
#[derive(Parser)]
#[command(name = "biblioharvest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest the topic × year grid and write the document
    Harvest {
        /// First publication year (inclusive)
        #[arg(long, default_value_t = 2020)]
        from_year: i32,

        /// Last publication year (inclusive)
        #[arg(long, default_value_t = 2025)]
        to_year: i32,

        /// Topic to harvest (repeatable, order is kept); defaults to the built-in list
        #[arg(long = "topic")]
        topics: Vec<String>,

        /// Output file
        #[arg(short, long, default_value = "data.json")]
        output: PathBuf,

        /// Contact email for the OpenAlex polite pool
        #[arg(long, default_value = "researcher@example.com")]
        mailto: String,

        /// Pause between cells, in milliseconds
        #[arg(long, default_value_t = 200)]
        delay_ms: u64,

        /// Maximum cells fetched at once
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// OpenAlex API base URL
        #[arg(long, default_value = OPENALEX_API_BASE)]
        base_url: String,
    },

    /// List zero-count cells of a harvested document
    Gaps {
        /// Harvested document
        #[arg(short, long, default_value = "data.json")]
        input: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Harvest {
            from_year,
            to_year,
            topics,
            output,
            mailto,
            delay_ms,
            concurrency,
            base_url,
        } => {
            let defaults = HarvestConfig::default();
            let config = HarvestConfig {
                from_year,
                to_year,
                topics: if topics.is_empty() { defaults.topics } else { topics },
                output,
                mailto,
                base_url,
                delay: Duration::from_millis(delay_ms),
                concurrency,
            };
            run_harvest(config).await
        }
        Commands::Gaps { input } => show_gaps(&input),
    }
}

// ============================================================================
// Harvest
// ============================================================================

async fn run_harvest(config: HarvestConfig) -> Result<()> {
    config.validate().context("Invalid harvest configuration")?;
    output::check_output_path(&config.output).context("Invalid output path")?;

    let started = Local::now();
    info!(
        started_at = %started.format("%Y-%m-%d %H:%M:%S"),
        topics = ?config.topics,
        from_year = config.from_year,
        to_year = config.to_year,
        cells = config.cell_total(),
        output = %config.output.display(),
        "Harvest run starting"
    );

    let client = OpenAlexClient::with_base_url(&config.base_url, &config.mailto)
        .context("Failed to create OpenAlex client")?;
    let harvester = Harvester::new(client, config.clone())?;
    let report = harvester.run().await.context("Harvest failed")?;

    output::write_document(&config.output, &report.document)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    for failed in &report.failed_cells {
        warn!(topic = %failed.topic, year = failed.year, error = %failed.error, "Cell recorded as empty");
    }

    let elapsed = Local::now() - started;
    info!(
        cells = report.document.cell_count(),
        failed = report.failed_cells.len(),
        elapsed_secs = elapsed.num_seconds(),
        "Harvest run finished"
    );
    println!("Done! Data saved to {}", config.output.display());
    Ok(())
}

// ============================================================================
// Gap Report
// ============================================================================

fn show_gaps(input: &Path) -> Result<()> {
    let document = output::read_document(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let gaps = document.zero_count_cells();
    if gaps.is_empty() {
        println!(
            "No zero-count cells in {} ({} cells).",
            input.display(),
            document.cell_count()
        );
        return Ok(());
    }

    println!(
        "{} of {} cells have a zero count:",
        gaps.len(),
        document.cell_count()
    );
    for (topic, year) in gaps {
        println!("  {} {}", topic, year);
    }
    Ok(())
}
