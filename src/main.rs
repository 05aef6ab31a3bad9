//! Betslip Engine - Command Line Entry Point
//!
//! Parses betslips from provider output or images, grades single markets and
//! runs settlement passes over a file of slips.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use betslip_engine::config::load_config;
use betslip_engine::extraction::provider::ProviderResponse;
use betslip_engine::settlement::SlipStore;
use betslip_engine::{
    CachedFixtureCatalog, EnrichmentCoordinator, FixtureMatcher, InMemorySlipStore, LivescoreClient, Market,
    MarketSettlementEngine, OddsReconciler, OddsValidation, ParsedSlip, Provider, Slip,
    SlipParser, SlipPipeline, SlipSettlementOrchestrator, SubmissionRequest,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a saved provider response and check its odds
    Parse {
        /// Provider response JSON
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Run a betslip image through the full submission pipeline
    Extract {
        /// Betslip image
        #[arg(short, long)]
        image: PathBuf,

        /// Identifier given to the created slip
        #[arg(long, default_value = "cli-slip")]
        slip_id: String,
    },
    /// Grade one market and pick against a final score
    Grade {
        #[arg(long)]
        market: String,

        #[arg(long)]
        pick: String,

        /// Final score as H-A
        #[arg(long)]
        score: String,

        /// Home team, for handicap picks that name a team
        #[arg(long, requires = "away_team")]
        home_team: Option<String>,

        #[arg(long, requires = "home_team")]
        away_team: Option<String>,
    },
    /// Run one settlement pass over a JSON file of slips
    Settle {
        /// Slips JSON, rewritten in place unless --output is given
        #[arg(short, long)]
        slips: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scoreboard day (YYYY-MM-DD); by default the earliest unresolved kickoff
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct ParseOutput {
    parsed: ParsedSlip,
    validation: OddsValidation,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config)).context("loading configuration")?;
    info!("Configuration file: {}", args.config);

    match args.command {
        Command::Parse { input } => {
            let raw = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let response: ProviderResponse = serde_json::from_str(&raw)?;
            let output = response.into_output()?;

            let parsed = SlipParser::new().parse(&output, Utc::now())?;
            let validation = OddsReconciler::from_config(&config.validation)
                .validate(&parsed.selections, parsed.total_odds);
            print_json(&ParseOutput { parsed, validation })?;
        }
        Command::Extract { image, slip_id } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("reading {}", image.display()))?;

            let provider = Provider::from_config(&config.provider)?;
            let catalog = Arc::new(CachedFixtureCatalog::from_config(&config.fixtures)?);
            let matcher = FixtureMatcher::from_config(catalog, &config.matching);
            let pipeline = SlipPipeline::new(
                Arc::new(provider),
                OddsReconciler::from_config(&config.validation),
                EnrichmentCoordinator::from_config(matcher, &config.fixtures),
            );

            let report = pipeline.process(&SubmissionRequest::new(slip_id, bytes)).await?;
            print_json(&report)?;
        }
        Command::Grade {
            market,
            pick,
            score,
            home_team,
            away_team,
        } => {
            let (home, away) = parse_score(&score)?;
            let kind = match (home_team, away_team) {
                (Some(home_team), Some(away_team)) => {
                    Market::classify_for_teams(&market, &pick, &home_team, &away_team)
                }
                _ => Market::classify(&market, &pick),
            };
            let outcome = MarketSettlementEngine::new().evaluate(&kind, home, away);
            print_json(&outcome)?;
        }
        Command::Settle { slips, output, date } => {
            let raw = tokio::fs::read_to_string(&slips)
                .await
                .with_context(|| format!("reading {}", slips.display()))?;
            let loaded: Vec<Slip> = serde_json::from_str(&raw)?;
            let ids: Vec<String> = loaded.iter().map(|slip| slip.id.clone()).collect();

            let store = Arc::new(InMemorySlipStore::new());
            for slip in loaded {
                store.insert(slip).await?;
            }

            let livescore = Arc::new(LivescoreClient::from_config(&config.livescore)?);
            let orchestrator =
                SlipSettlementOrchestrator::new(store.clone(), livescore, config.matching, &config.settings);
            let now = Utc::now();
            let report = match date {
                Some(date) => orchestrator.run_on(date, now).await?,
                None => orchestrator.run(now).await?,
            };

            let mut updated = Vec::with_capacity(ids.len());
            for id in &ids {
                updated.push(store.get(id).await?);
            }
            let target = output.unwrap_or(slips);
            tokio::fs::write(&target, serde_json::to_string_pretty(&updated)?)
                .await
                .with_context(|| format!("writing {}", target.display()))?;
            info!(path = %target.display(), "Slips written");
            print_json(&report)?;
        }
    }

    Ok(())
}

fn parse_score(score: &str) -> Result<(u32, u32)> {
    let Some((home, away)) = score.split_once(['-', ':']) else {
        bail!("score must look like H-A, got {:?}", score);
    };
    Ok((home.trim().parse()?, away.trim().parse()?))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
