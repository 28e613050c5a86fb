//! Command-line entry point for the dota-elo rating engine
//!
//! Replays a JSON-lines match feed through the engine, then reports
//! leaderboards, distribution statistics, predictions or a full export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use dota_elo::config::AppConfig;
use dota_elo::feed::{export_to_file, FeedReader};
use dota_elo::metrics::RatingMetrics;
use dota_elo::rating::{RatingDistribution, ReplaySummary};
use dota_elo::utils::current_timestamp;
use dota_elo::{EntityId, EntityKind, MatchOutcome, RatingEngine};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Dota ELO - rating engine for Dota 2 players and teams
#[derive(Parser)]
#[command(
    name = "dota-elo",
    version,
    about = "ELO ratings for Dota 2 players and teams",
    long_about = "dota-elo replays finished matches through an ELO engine with a dynamic \
                 K-factor, inactivity decay and tournament tier/stage weighting, and reports \
                 ratings, distribution statistics and win predictions."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without reading a feed")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a match feed and report ratings
    Replay {
        /// JSON-lines feed of finished matches
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Write every rating record to this file as JSON
        #[arg(short, long, value_name = "FILE")]
        export: Option<PathBuf>,

        /// Settle inactivity decay at this time (RFC 3339, or "now")
        #[arg(long, value_name = "TIME", value_parser = parse_time)]
        sweep_at: Option<DateTime<Utc>>,

        /// Number of leaderboard entries per kind
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print Prometheus metrics after the replay
        #[arg(long)]
        metrics: bool,
    },

    /// Replay a match feed, then predict a pairing
    Predict {
        /// JSON-lines feed of finished matches
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Side A, e.g. team:8599101
        #[arg(short, long, value_name = "ID")]
        a: EntityId,

        /// Side B, e.g. team:2163
        #[arg(short, long, value_name = "ID")]
        b: EntityId,

        /// Apply pending decay as of this time (RFC 3339, or "now")
        #[arg(long, value_name = "TIME", value_parser = parse_time)]
        as_of: Option<DateTime<Utc>>,
    },
}

fn parse_time(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    if value.eq_ignore_ascii_case("now") {
        return Ok(current_timestamp());
    }

    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time '{}': {}", value, e))
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file, environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    dota_elo::config::validate_config(&config)?;
    Ok(config)
}

fn display_banner(config: &AppConfig) {
    let rating = &config.rating;
    info!("{} v{}", config.service.name, dota_elo::VERSION);
    info!("   Baseline rating: {}", rating.baseline_rating);
    info!("   Base K-factor: {}", rating.k_factor.base_k);
    info!("   Draws allowed: {}", rating.allow_draws);
    if rating.decay.enabled {
        info!(
            "   Decay: {:?} {} every {} days after {} days idle",
            rating.decay.mode,
            rating.decay.rate,
            rating.decay.period_days,
            rating.decay.grace_period_days
        );
    } else {
        info!("   Decay: disabled");
    }
}

/// Feed every readable match into the engine. Unparseable lines count as
/// rejections.
fn replay_feed(engine: &RatingEngine, input: &Path) -> Result<ReplaySummary> {
    info!("Replaying matches from {}", input.display());

    let mut matches: Vec<MatchOutcome> = Vec::new();
    let mut unreadable = 0;
    for item in FeedReader::open(input)? {
        match item {
            Ok(outcome) => matches.push(outcome),
            Err(e) => {
                warn!("Skipping feed entry: {}", e);
                unreadable += 1;
            }
        }
    }

    let summary = engine.replay(matches);
    if unreadable > 0 {
        warn!("{} feed lines could not be parsed", unreadable);
    }

    Ok(summary)
}

fn print_leaderboard(engine: &RatingEngine, kind: EntityKind, top: usize) -> Result<()> {
    let records = engine.leaderboard(Some(kind), top)?;
    if records.is_empty() {
        return Ok(());
    }

    println!("Top {} {}s:", records.len(), kind);
    for (rank, record) in records.iter().enumerate() {
        println!(
            "  {:>3}. {:<24} {:>8.1}  {:>4} matches  {:>5.1}% wins  peak {:.1}",
            rank + 1,
            record.entity_id.to_string(),
            record.rating,
            record.matches_played,
            record.win_rate() * 100.0,
            record.peak_rating()
        );
    }
    Ok(())
}

fn print_distribution(kind: EntityKind, stats: &RatingDistribution) {
    println!("{} rating distribution ({} rated):", kind, stats.total);
    println!(
        "  mean {:.1}  median {:.1}  std dev {:.1}  range {:.1} - {:.1}",
        stats.mean, stats.median, stats.std_dev, stats.min, stats.max
    );
    for entry in &stats.brackets {
        if entry.count > 0 {
            println!("  {:<22} {}", entry.bracket.to_string(), entry.count);
        }
    }
}

fn run_replay(
    engine: &RatingEngine,
    input: &Path,
    export: Option<&Path>,
    sweep_at: Option<DateTime<Utc>>,
    top: usize,
) -> Result<()> {
    let summary = replay_feed(engine, input)?;
    println!(
        "Applied {} matches, rejected {}",
        summary.applied,
        summary.rejected.len()
    );

    if let Some(at) = sweep_at {
        let report = engine.sweep_decay(at)?;
        println!(
            "Decay sweep at {}: {} of {} records settled",
            at.to_rfc3339(),
            report.settled,
            report.examined
        );
    }

    for kind in [EntityKind::Team, EntityKind::Player] {
        print_leaderboard(engine, kind, top)?;
        if let Some(stats) = engine.distribution(Some(kind))? {
            print_distribution(kind, &stats);
        }
    }

    if let Some(path) = export {
        let count = export_to_file(path, engine.export_all()?)?;
        info!("Exported {} records to {}", count, path.display());
    }

    Ok(())
}

fn run_predict(
    engine: &RatingEngine,
    input: &Path,
    a: &EntityId,
    b: &EntityId,
    as_of: Option<DateTime<Utc>>,
) -> Result<()> {
    replay_feed(engine, input)?;

    let prediction = match as_of {
        Some(at) => engine.predict_as_of(a, b, at)?,
        None => engine.predict(a, b)?,
    };

    println!("{} vs {}", prediction.entity_a, prediction.entity_b);
    println!(
        "  win probability: {:.1}% / {:.1}%",
        prediction.win_probability_a * 100.0,
        prediction.win_probability_b * 100.0
    );
    println!("  rating difference: {:+.1}", prediction.rating_difference);
    println!("  confidence: {:.2}", prediction.confidence);
    println!("  verdict: {}", prediction.verdict);

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    let Some(command) = args.command else {
        error!("No command given; use --help to list commands");
        std::process::exit(2);
    };

    let print_metrics = matches!(command, Command::Replay { metrics: true, .. });
    let metrics = RatingMetrics::new()?;
    let engine = RatingEngine::new(config.rating.clone())?.with_metrics(metrics.clone());

    let outcome = match &command {
        Command::Replay {
            input,
            export,
            sweep_at,
            top,
            ..
        } => run_replay(&engine, input, export.as_deref(), *sweep_at, *top),
        Command::Predict { input, a, b, as_of } => run_predict(&engine, input, a, b, *as_of),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }

    if print_metrics {
        print!("{}", metrics.encode_text()?);
    }

    Ok(())
}
