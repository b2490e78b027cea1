use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ml-analyzer", author, version, about = "Risk, pattern and sentiment analytics over JSON fixtures")]
pub struct Cli {
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full analysis: risk params, anomalies, patterns, sentiment and the combined signal
    Analyze {
        #[arg(long)]
        symbol: String,

        /// JSON array of OHLCV bars, oldest first
        #[arg(long)]
        bars: PathBuf,

        /// JSON array of news articles
        #[arg(long)]
        news: Option<PathBuf>,

        /// JSON array of social posts
        #[arg(long)]
        social: Option<PathBuf>,

        /// Most recent bars to analyze
        #[arg(long, default_value = "365")]
        days: u32,
    },

    /// Stop-loss / take-profit for a market state
    Risk {
        /// Annualised volatility in percent
        #[arg(long)]
        volatility: f64,

        #[arg(long, default_value = "50")]
        rsi: f64,

        #[arg(long, default_value = "1")]
        volume_ratio: f64,

        /// Latest price move in percent
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        price_change: f64,
    },

    /// Chart and candlestick patterns plus support/resistance
    Patterns {
        #[arg(long)]
        bars: PathBuf,
    },

    /// Monte Carlo portfolio simulation
    Simulate {
        /// JSON array of {symbol, value, volatility}
        #[arg(long)]
        portfolio: PathBuf,

        #[arg(long, default_value = "30")]
        days: u32,

        #[arg(long, default_value = "10000")]
        iterations: usize,

        /// Fixed seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Stop-loss / take-profit proximity and sentiment surge alerts
    Alerts {
        /// JSON array of open positions
        #[arg(long)]
        positions: PathBuf,

        #[arg(long)]
        news: Option<PathBuf>,

        #[arg(long)]
        social: Option<PathBuf>,
    },

    /// Retrain the risk model on closed trades and write the snapshot
    Train {
        /// JSON object {"trades": [...]}
        #[arg(long)]
        trades: PathBuf,

        /// Snapshot output path
        #[arg(long)]
        out: PathBuf,
    },
}
