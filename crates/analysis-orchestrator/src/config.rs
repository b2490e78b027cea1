use anyhow::{Context, Result};
use sentiment_analysis::SentimentConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    // Monte Carlo
    pub monte_carlo_max_iterations: usize, // 100,000
    pub risk_free_rate: f64,               // annual, 0.02

    // Sentiment
    pub news_cache_ttl_secs: i64,          // 300 (5 minutes)
    pub sentiment_history_capacity: usize, // 100 samples per symbol

    // Position alerts for positions without their own levels
    pub default_stop_loss_pct: f64,   // 5%
    pub default_take_profit_pct: f64, // 10%

    /// Risk model snapshot loaded at startup
    pub model_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monte_carlo_max_iterations: risk_manager::MAX_ITERATIONS,
            risk_free_rate: 0.02,
            news_cache_ttl_secs: 300,
            sentiment_history_capacity: 100,
            default_stop_loss_pct: 5.0,
            default_take_profit_pct: 10.0,
            model_path: None,
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("{} is not a valid value", name))
}

impl EngineConfig {
    /// Read the engine settings from the environment (after `.env`, if the
    /// caller loaded one). Unset variables take their defaults.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            monte_carlo_max_iterations: parse_var("ML_MONTE_CARLO_MAX_ITERATIONS", "100000")?,
            risk_free_rate: parse_var("ML_RISK_FREE_RATE", "0.02")?,
            news_cache_ttl_secs: parse_var("ML_NEWS_CACHE_TTL_SECS", "300")?,
            sentiment_history_capacity: parse_var("ML_SENTIMENT_HISTORY_CAPACITY", "100")?,
            default_stop_loss_pct: parse_var("ML_DEFAULT_STOP_LOSS_PCT", "5")?,
            default_take_profit_pct: parse_var("ML_DEFAULT_TAKE_PROFIT_PCT", "10")?,
            model_path: env::var("ML_MODEL_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.monte_carlo_max_iterations == 0 || self.monte_carlo_max_iterations > risk_manager::MAX_ITERATIONS {
            anyhow::bail!(
                "ML_MONTE_CARLO_MAX_ITERATIONS must be between 1 and {}",
                risk_manager::MAX_ITERATIONS
            );
        }
        if !self.risk_free_rate.is_finite() || !(0.0..1.0).contains(&self.risk_free_rate) {
            anyhow::bail!("ML_RISK_FREE_RATE must be a fraction in [0, 1)");
        }
        if self.news_cache_ttl_secs < 0 {
            anyhow::bail!("ML_NEWS_CACHE_TTL_SECS cannot be negative");
        }
        if self.sentiment_history_capacity < 10 {
            anyhow::bail!("ML_SENTIMENT_HISTORY_CAPACITY must hold at least 10 samples");
        }
        if self.default_stop_loss_pct <= 0.0 || self.default_take_profit_pct <= 0.0 {
            anyhow::bail!("default stop-loss and take-profit percentages must be positive");
        }
        Ok(())
    }

    pub fn sentiment_config(&self) -> SentimentConfig {
        SentimentConfig {
            news_cache_ttl_secs: self.news_cache_ttl_secs,
            history_capacity: self.sentiment_history_capacity,
            ..Default::default()
        }
    }
}
