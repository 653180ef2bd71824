//! Polymarket screener entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use polymarket_screener::analysis::ResultSet;
use polymarket_screener::api::{create_router, AppState};
use polymarket_screener::config::Config;
use polymarket_screener::dashboard::{format_number, format_percent, write_outputs};
use polymarket_screener::error::ScreenerError;
use polymarket_screener::market::{sample_markets, GammaClient};
use polymarket_screener::metrics;
use polymarket_screener::pipeline;
use polymarket_screener::utils::shutdown_signal;

/// Polymarket mispricing screener.
#[derive(Parser, Debug)]
#[command(name = "polymarket-screener")]
#[command(about = "Screens active Polymarket markets for mispriced outcomes and renders a dashboard")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch markets once and write data.json and index.html (default).
    Generate {
        /// Output directory (overrides OUTPUT_DIR).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Refresh periodically and serve the dashboard over HTTP.
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the pipeline on the embedded sample markets.
    Sample {
        /// Output directory (overrides OUTPUT_DIR).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Check configuration validity.
    CheckConfig,
}

fn init_logging(verbose: bool, json: bool, default_directive: &str) {
    let filter = if verbose {
        EnvFilter::new("polymarket_screener=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
    };

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load();
    let log_directive = config
        .as_ref()
        .map(|c| c.rust_log.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(args.verbose, args.json_logs, &log_directive);

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::Serve { port }) => cmd_serve(load_valid(config)?, port).await,
        Some(Command::Sample { output_dir }) => cmd_sample(load_valid(config)?, output_dir).await,
        Some(Command::Generate { output_dir }) => {
            cmd_generate(load_valid(config)?, output_dir).await
        }
        None => cmd_generate(load_valid(config)?, None).await,
    }
}

/// Unwrap and validate a loaded configuration.
fn load_valid(config: Result<Config, envy::Error>) -> anyhow::Result<Config> {
    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(ScreenerError::InvalidConfig(e).into());
    }

    info!(
        min_spread = %config.min_spread,
        max_spread = %config.max_spread,
        min_volume = %config.min_volume,
        "Configuration loaded"
    );
    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config(config: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("POLYMARKET SCREENER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match config {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Gamma API URL: {}", config.gamma_api_url);
    println!("  API Key: {}", if config.has_api_key() { "present" } else { "not set (public listing)" });
    println!("  Fetch Limit: {}", config.fetch_limit);
    println!("  Spread Window: {} - {}", format_percent(config.min_spread), format_percent(config.max_spread));
    println!("  Min Volume: {}", format_number(config.min_volume));
    println!("  Output Dir: {}", config.output_dir);
    println!("  Refresh Interval: {}s", config.refresh_interval_secs);
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

fn print_summary(result: &ResultSet) {
    println!("======================================================================");
    println!(
        "{} opportunities ({}) generated at {}",
        result.total_count, result.tier, result.generated_at
    );
    println!("----------------------------------------------------------------------");
    for opp in result.opportunities.iter().take(10) {
        println!(
            "  {:<12} {:<4} {:>8}  vol {:>7}  {}",
            opp.signal.label(),
            opp.underpriced_side.to_string(),
            format_percent(opp.max_spread),
            format_number(opp.market.volume),
            opp.market.question
        );
    }
    if result.total_count > 10 {
        println!("  ... and {} more", result.total_count - 10);
    }
    println!("======================================================================");
}

/// Fetch the live listing and rank it.
async fn fetch_result(config: &Config) -> polymarket_screener::Result<ResultSet> {
    let client = GammaClient::new(config)?;
    if !client.is_authenticated() {
        warn!("POLYMARKET_API_KEY not set, using the public listing");
    }

    let result =
        pipeline::refresh_with_base(&client, &config.filter_config(), &config.market_base_url)
            .await?;
    Ok(result)
}

/// Rank the embedded sample markets.
fn sample_result(config: &Config) -> polymarket_screener::Result<ResultSet> {
    let result = pipeline::run_with_base(
        &sample_markets(),
        &config.filter_config(),
        &config.market_base_url,
    )?;
    Ok(result)
}

/// Fetch once and write the dashboard files.
async fn cmd_generate(config: Config, output_dir: Option<PathBuf>) -> anyhow::Result<()> {
    metrics::init_metrics();

    let result = fetch_result(&config).await?;

    let dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let paths = write_outputs(&dir, &result).await?;

    print_summary(&result);
    println!("Wrote {} and {}", paths.data.display(), paths.page.display());
    Ok(())
}

/// Run the pipeline over the embedded samples and write the dashboard files.
async fn cmd_sample(config: Config, output_dir: Option<PathBuf>) -> anyhow::Result<()> {
    metrics::init_metrics();

    let result = sample_result(&config)?;

    let dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let paths = write_outputs(&dir, &result).await?;

    print_summary(&result);
    println!("Wrote {} and {}", paths.data.display(), paths.page.display());
    Ok(())
}

/// Serve the dashboard, refreshing the snapshot on an interval.
async fn cmd_serve(config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    let prometheus = metrics::install_recorder()?;
    let app_state = AppState::new().with_prometheus(prometheus);

    let client = GammaClient::new(&config).map_err(ScreenerError::from)?;
    let filters = config.filter_config();
    let base_url = config.market_base_url.clone();
    let interval_secs = config.refresh_interval_secs;

    let refresher_state = app_state.clone();
    let refresher = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = refresher_state.refresh_from(&client, &filters, &base_url).await {
                warn!(error = %e, "Scheduled refresh failed");
            }
        }
    });

    let port = port_override.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!(interval_secs, "Refreshing opportunities periodically");

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.abort();
    info!("Server stopped");
    Ok(())
}
