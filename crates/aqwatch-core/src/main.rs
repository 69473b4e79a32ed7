//! aqwatch CLI
//!
//! Command-line interface for the aqwatch air quality alerting service.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use aqwatch::alerting::{self, AlertDispatcher, AlertPipeline, FetchOutcome};
use aqwatch::models::AlertState;
use aqwatch::source::AirQualitySource;
use aqwatch::Config;

/// aqwatch - Air Quality Alerting
#[derive(Parser)]
#[command(name = "aqwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "AQWATCH_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed and alert on category transitions until interrupted
    Run {
        /// Override the configured polling interval (e.g. "10m")
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },

    /// Run exactly one alert cycle and exit
    Once,

    /// Classify an AQI value offline and print the message it would send
    Check {
        /// AQI value to classify
        value: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config, cli.verbose);

    // A malformed category table would silently misclassify; fail fast.
    if let Err(e) = alerting::verify_bounds() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Run { interval } => run_loop(&config, interval).await,
        Commands::Once => run_once(&config).await,
        Commands::Check { value } => run_check(&config, value),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &Config, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_pipeline(config: &Config) -> AlertPipeline {
    let source = AirQualitySource::new(
        &config.source.base_url,
        &config.source.city,
        &config.source.token,
        config.source.fetch_timeout,
    );
    let dispatcher = AlertDispatcher::new(
        config.delivery.channel.clone(),
        config.delivery.dispatch_timeout,
    );
    let state = AlertState::new(&config.source.city);

    AlertPipeline::new(
        source,
        dispatcher,
        state,
        &config.delivery.recipient,
        config.pipeline.message_max_len,
    )
}

async fn run_loop(config: &Config, interval_override: Option<Duration>) -> anyhow::Result<()> {
    config.validate()?;

    let poll_interval = interval_override.unwrap_or(config.pipeline.poll_interval);
    let mut pipeline = build_pipeline(config);

    info!(
        city = %config.source.city,
        interval = ?poll_interval,
        channel = config.delivery.channel.kind(),
        "starting alert loop"
    );

    let mut ticker = tokio::time::interval(poll_interval);
    // cycles for one location are strictly sequential; a slow cycle must
    // not stack overlapping ticks
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                pipeline.run_cycle().await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn run_once(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let mut pipeline = build_pipeline(config);
    let record = pipeline.run_cycle().await;

    if record.fetch_outcome != FetchOutcome::Ok {
        anyhow::bail!("cycle did not obtain a usable reading");
    }

    Ok(())
}

fn run_check(config: &Config, value: f64) -> anyhow::Result<()> {
    let category = alerting::classify(Some(value))?;
    let (lower, upper) = alerting::bounds_for(category);
    let message = alerting::compose(
        value,
        category,
        config.pipeline.message_max_len,
        chrono::Utc::now(),
    );

    match upper {
        Some(upper) => println!("AQI {value}: {} [{lower}, {upper})", category.label()),
        None => println!("AQI {value}: {} [{lower}, \u{221e})", category.label()),
    }
    println!("{}", message.text);

    Ok(())
}
