//! ml-analyzer: run the analytics engine over JSON fixture files.
//!
//! Usage:
//!   ml-analyzer analyze --symbol AAPL --bars bars.json --news news.json
//!   ml-analyzer risk --volatility 35 --rsi 72
//!   ml-analyzer patterns --bars bars.json
//!   ml-analyzer simulate --portfolio portfolio.json --days 30 --iterations 10000 --seed 7
//!   ml-analyzer alerts --positions positions.json --news news.json
//!   ml-analyzer train --trades trades.json --out risk_model.json

use std::path::Path;
use std::sync::Arc;

use analysis_core::{validate_bars, Bar, MarketState};
use analysis_orchestrator::{AnalysisEngine, AnalysisEngineBuilder, EngineConfig, Position, TrainingData};
use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use risk_manager::PortfolioPosition;
use serde::de::DeserializeOwned;
use serde::Serialize;

mod cli;
mod providers;

use cli::{Cli, Commands};
use providers::{JsonNewsFile, JsonPriceFile, JsonSocialFile};

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    // logs go to stderr, stdout carries the JSON result
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn with_sentiment_files(
    mut builder: AnalysisEngineBuilder,
    news: Option<&Path>,
    social: Option<&Path>,
) -> AnalysisEngineBuilder {
    if let Some(path) = news {
        builder = builder.news_provider(Arc::new(JsonNewsFile::new(path)));
    }
    if let Some(path) = social {
        builder = builder.social_provider(Arc::new(JsonSocialFile::new(path)));
    }
    builder
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;
    let builder = AnalysisEngine::builder().config(config);

    match cli.command {
        Commands::Analyze { symbol, bars, news, social, days } => {
            let engine = with_sentiment_files(builder, news.as_deref(), social.as_deref())
                .price_provider(Arc::new(JsonPriceFile::new(bars)))
                .build();
            let analysis = engine.analyze_symbol(&symbol, days).await?;
            print_json(&analysis, cli.pretty)?;
        }
        Commands::Risk { volatility, rsi, volume_ratio, price_change } => {
            let engine = builder.build();
            let state = MarketState {
                volatility,
                rsi,
                volume_ratio,
                price_change,
                ..Default::default()
            };
            print_json(&engine.get_optimal_risk_params(&state), cli.pretty)?;
        }
        Commands::Patterns { bars } => {
            let bars: Vec<Bar> = read_json(&bars)?;
            validate_bars(&bars)?;
            let engine = builder.build();
            print_json(&engine.detect_patterns(&bars), cli.pretty)?;
        }
        Commands::Simulate { portfolio, days, iterations, seed } => {
            let portfolio: Vec<PortfolioPosition> = read_json(&portfolio)?;
            let engine = builder.build();
            let summary = match seed {
                Some(seed) => engine.monte_carlo_risk_simulation_with_rng(
                    &portfolio,
                    days,
                    iterations,
                    &mut StdRng::seed_from_u64(seed),
                )?,
                None => engine.monte_carlo_risk_simulation(&portfolio, days, iterations)?,
            };
            print_json(&summary, cli.pretty)?;
        }
        Commands::Alerts { positions, news, social } => {
            let positions: Vec<Position> = read_json(&positions)?;
            let engine = with_sentiment_files(builder, news.as_deref(), social.as_deref()).build();
            let alerts = engine.get_ml_alerts(&positions).await;
            tracing::info!("{} alerts for {} positions", alerts.len(), positions.len());
            print_json(&alerts, cli.pretty)?;
        }
        Commands::Train { trades, out } => {
            let data: TrainingData = read_json(&trades)?;
            let engine = builder.build();
            let report = engine.train_models(&data);
            engine
                .save_model(&out)
                .with_context(|| format!("Failed to write model snapshot to {}", out.display()))?;
            print_json(&report, cli.pretty)?;
        }
    }

    Ok(())
}
