use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use analysis_core::{
    validate_bars, AnalysisError, Bar, MarketState, NewsProvider, PriceDataProvider, SocialProvider,
    SourceResult,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use risk_manager::{
    detect_anomalies_in_series, MarketObservation, PortfolioPosition, RiskEstimator, RiskParams,
    RiskSimulationSummary,
};
use sentiment_analysis::{SentimentAlertKind, SentimentEstimator, SentimentResult, SentimentSource};
use technical_analysis::{market_state, PatternAnalysis, PatternAnalysisEngine};

use crate::config::EngineConfig;
use crate::fusion::{direction_action, generate_combined_signal, recommendation_direction, FusionInputs};
use crate::models::*;

const RULE_BASED_NOTE: &str = "rule-based; no training input";

/// Builder for [`AnalysisEngine`]; collaborators not supplied stay unset and
/// their sources report as errored.
#[derive(Default)]
pub struct AnalysisEngineBuilder {
    config: EngineConfig,
    price_provider: Option<Arc<dyn PriceDataProvider>>,
    news_provider: Option<Arc<dyn NewsProvider>>,
    social_provider: Option<Arc<dyn SocialProvider>>,
    risk_estimator: Option<RiskEstimator>,
}

impl AnalysisEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn price_provider(mut self, provider: Arc<dyn PriceDataProvider>) -> Self {
        self.price_provider = Some(provider);
        self
    }

    pub fn news_provider(mut self, provider: Arc<dyn NewsProvider>) -> Self {
        self.news_provider = Some(provider);
        self
    }

    pub fn social_provider(mut self, provider: Arc<dyn SocialProvider>) -> Self {
        self.social_provider = Some(provider);
        self
    }

    pub fn risk_estimator(mut self, estimator: RiskEstimator) -> Self {
        self.risk_estimator = Some(estimator);
        self
    }

    pub fn build(self) -> AnalysisEngine {
        let mut sentiment = SentimentEstimator::new(self.config.sentiment_config());
        if let Some(news) = self.news_provider {
            sentiment = sentiment.with_news_provider(news);
        }
        if let Some(social) = self.social_provider {
            sentiment = sentiment.with_social_provider(social);
        }

        let risk = self.risk_estimator.unwrap_or_default();
        if let Some(path) = &self.config.model_path {
            // a bad snapshot leaves the seeded model in place
            if let Err(e) = risk.load_model(path) {
                tracing::warn!("Could not load risk model from {}: {}", path.display(), e);
            }
        }

        AnalysisEngine {
            risk,
            patterns: PatternAnalysisEngine::new(),
            sentiment,
            price_provider: self.price_provider,
            config: self.config,
        }
    }
}

/// Runs the risk, pattern and sentiment estimators for a symbol and fuses
/// their outputs into one recommendation.
pub struct AnalysisEngine {
    risk: RiskEstimator,
    patterns: PatternAnalysisEngine,
    sentiment: SentimentEstimator,
    price_provider: Option<Arc<dyn PriceDataProvider>>,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn builder() -> AnalysisEngineBuilder {
        AnalysisEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn risk_estimator(&self) -> &RiskEstimator {
        &self.risk
    }

    pub fn sentiment_estimator(&self) -> &SentimentEstimator {
        &self.sentiment
    }

    /// Perform the full analysis on caller-supplied bars and market state
    pub async fn get_ml_analysis(
        &self,
        symbol: &str,
        bars: &[Bar],
        state: &MarketState,
    ) -> Result<MlAnalysis, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidInput("symbol is required".to_string()));
        }
        validate_bars(bars)?;

        tracing::info!("Starting ML analysis for {} with {} bars", symbol, bars.len());

        let (risk, patterns, sentiment) = tokio::join!(
            async {
                let params = self.risk.get_optimal_risk_params(state);
                let anomalies = detect_anomalies_in_series(&MarketObservation::series_from_bars(bars));
                RiskAnalysis { params, anomalies }
            },
            async { self.patterns.detect_patterns(bars) },
            async {
                SourceResult::from(self.sentiment.analyze_stock_sentiment(&symbol, &[]).await)
            },
        );

        if risk.anomalies.is_anomaly {
            tracing::warn!("Market anomaly flagged for {}; risk component excluded from fusion", symbol);
        }

        let combined_signal = generate_combined_signal(&FusionInputs {
            anomalies: Some(&risk.anomalies),
            patterns: Some(&patterns),
            sentiment: Some(&sentiment),
        });
        let recommendations = build_recommendations(&risk, &patterns, &sentiment);

        tracing::info!(
            "ML analysis for {}: {} (score {:.3}, confidence {:.1})",
            symbol,
            combined_signal.signal.as_str(),
            combined_signal.score,
            combined_signal.confidence
        );

        Ok(MlAnalysis {
            symbol,
            timestamp: Utc::now(),
            risk,
            patterns,
            sentiment,
            combined_signal,
            recommendations,
        })
    }

    /// Fetch bars from the price provider, derive the market state and analyze
    pub async fn analyze_symbol(&self, symbol: &str, days: u32) -> Result<MlAnalysis, AnalysisError> {
        let provider = self
            .price_provider
            .as_ref()
            .ok_or_else(|| AnalysisError::upstream("price", "no price provider configured"))?;
        let bars = provider.get_bars(symbol, days).await?;
        if bars.is_empty() {
            tracing::warn!("No bars returned for {}; analysis will be neutral", symbol);
        }
        let state = market_state(&bars);
        self.get_ml_analysis(symbol, &bars, &state).await
    }

    pub fn get_optimal_risk_params(&self, state: &MarketState) -> RiskParams {
        self.risk.get_optimal_risk_params(state)
    }

    pub fn detect_patterns(&self, bars: &[Bar]) -> PatternAnalysis {
        self.patterns.detect_patterns(bars)
    }

    pub async fn get_sentiment(
        &self,
        symbol: &str,
        sources: &[SentimentSource],
    ) -> Result<SentimentResult, AnalysisError> {
        self.sentiment.analyze_stock_sentiment(symbol, sources).await
    }

    /// Monte Carlo with an entropy-seeded generator
    pub fn monte_carlo_risk_simulation(
        &self,
        portfolio: &[PortfolioPosition],
        days: u32,
        iterations: usize,
    ) -> Result<RiskSimulationSummary, AnalysisError> {
        self.monte_carlo_risk_simulation_with_rng(portfolio, days, iterations, &mut StdRng::from_entropy())
    }

    pub fn monte_carlo_risk_simulation_with_rng<R: Rng + ?Sized>(
        &self,
        portfolio: &[PortfolioPosition],
        days: u32,
        iterations: usize,
        rng: &mut R,
    ) -> Result<RiskSimulationSummary, AnalysisError> {
        let cap = self.config.monte_carlo_max_iterations;
        if iterations > cap {
            tracing::warn!("Requested {} Monte Carlo iterations, capping at {}", iterations, cap);
        }
        risk_manager::monte_carlo_risk_simulation(
            portfolio,
            days,
            iterations.min(cap),
            self.config.risk_free_rate,
            rng,
        )
    }

    /// Stop-loss / take-profit proximity alerts plus sentiment surges for
    /// each distinct symbol held.
    pub async fn get_ml_alerts(&self, positions: &[Position]) -> Vec<MlAlert> {
        let now = Utc::now();
        let mut alerts: Vec<MlAlert> = positions
            .iter()
            .filter_map(|p| self.position_alert(p, now))
            .collect();

        let symbols: Vec<String> = positions
            .iter()
            .map(|p| p.symbol.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for surge in self.sentiment.get_sentiment_alerts(&symbols).await {
            alerts.push(MlAlert {
                symbol: surge.symbol,
                kind: match surge.kind {
                    SentimentAlertKind::PositiveSurge => AlertKind::PositiveSurge,
                    SentimentAlertKind::NegativeSurge => AlertKind::NegativeSurge,
                },
                severity: AlertSeverity::Medium,
                message: surge.message,
                timestamp: surge.timestamp,
            });
        }

        alerts
    }

    fn position_alert(&self, position: &Position, now: chrono::DateTime<Utc>) -> Option<MlAlert> {
        let pnl = position.unrealized_pct()?;
        let stop_loss = position.stop_loss.unwrap_or(self.config.default_stop_loss_pct);
        let take_profit = position.take_profit.unwrap_or(self.config.default_take_profit_pct);

        if -pnl > stop_loss * 0.8 {
            Some(MlAlert {
                symbol: position.symbol.clone(),
                kind: AlertKind::StopLossProximity,
                severity: AlertSeverity::High,
                message: format!(
                    "{} is down {:.1}%, approaching its {:.1}% stop loss",
                    position.symbol, -pnl, stop_loss
                ),
                timestamp: now,
            })
        } else if pnl > take_profit * 0.9 {
            Some(MlAlert {
                symbol: position.symbol.clone(),
                kind: AlertKind::TakeProfitProximity,
                severity: AlertSeverity::Medium,
                message: format!(
                    "{} is up {:.1}%, near its {:.1}% take profit",
                    position.symbol, pnl, take_profit
                ),
                timestamp: now,
            })
        } else {
            None
        }
    }

    /// Feed closed trades to the risk model. Pattern and sentiment
    /// components are rule-based and take no training input.
    pub fn train_models(&self, data: &TrainingData) -> TrainingReport {
        let risk = self.risk.train(&data.trades);
        TrainingReport {
            risk,
            patterns: RULE_BASED_NOTE.to_string(),
            sentiment: RULE_BASED_NOTE.to_string(),
        }
    }

    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        self.risk.save_model(path)
    }

    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        self.risk.load_model(path)
    }
}

fn build_recommendations(
    risk: &RiskAnalysis,
    patterns: &PatternAnalysis,
    sentiment: &SourceResult<SentimentResult>,
) -> Vec<Recommendation> {
    let mut recommendations = vec![Recommendation {
        source: "risk_ai".to_string(),
        action: if risk.anomalies.is_anomaly { "REDUCE_EXPOSURE" } else { "MANAGE_RISK" }.to_string(),
        confidence: risk.params.confidence,
        detail: format!(
            "Stop loss {:.1}%, take profit {:.1}% ({:?} risk)",
            risk.params.stop_loss, risk.params.take_profit, risk.params.risk_level
        ),
    }];

    if let Some(top) = patterns.top_signal() {
        recommendations.push(Recommendation {
            source: "pattern_ai".to_string(),
            action: action_label(direction_action(recommendation_direction(&top.recommendation))),
            confidence: top.confidence,
            detail: format!("{}: {}", top.pattern, top.recommendation),
        });
    }

    if let Some(result) = sentiment.ok() {
        recommendations.push(Recommendation {
            source: "sentiment_ai".to_string(),
            action: action_label(result.signal.action),
            confidence: result.signal.confidence,
            detail: result.signal.reason.clone(),
        });
    }

    recommendations
}
