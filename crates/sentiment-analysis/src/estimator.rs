use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use analysis_core::{AnalysisError, NewsArticle, NewsProvider, SocialProvider, SourceResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;

use crate::aggregate::*;
use crate::classifier::TextClassifier;
use crate::history::{SentimentHistory, DEFAULT_HISTORY_CAPACITY};
use crate::keywords::classify_event;
use crate::models::*;

/// Overall scores beyond this magnitude raise a surge alert
pub const SURGE_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct SentimentConfig {
    pub source_weights: HashMap<SentimentSource, f64>,
    pub history_capacity: usize,
    pub news_cache_ttl_secs: i64,
    pub news_limit: usize,
    pub social_limit: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            source_weights: default_source_weights(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            news_cache_ttl_secs: 300,
            news_limit: 50,
            social_limit: 100,
        }
    }
}

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// Scores news and social text for a symbol and turns the blend into a
/// trading signal.
pub struct SentimentEstimator {
    news_provider: Option<Arc<dyn NewsProvider>>,
    social_provider: Option<Arc<dyn SocialProvider>>,
    classifier: TextClassifier,
    history: SentimentHistory,
    /// Cache news articles per symbol and limit
    news_cache: DashMap<String, CacheEntry<Vec<NewsArticle>>>,
    config: SentimentConfig,
}

impl SentimentEstimator {
    pub fn new(config: SentimentConfig) -> Self {
        Self {
            news_provider: None,
            social_provider: None,
            classifier: TextClassifier::default(),
            history: SentimentHistory::new(config.history_capacity),
            news_cache: DashMap::new(),
            config,
        }
    }

    pub fn with_news_provider(mut self, provider: Arc<dyn NewsProvider>) -> Self {
        self.news_provider = Some(provider);
        self
    }

    pub fn with_social_provider(mut self, provider: Arc<dyn SocialProvider>) -> Self {
        self.social_provider = Some(provider);
        self
    }

    pub fn history(&self) -> &SentimentHistory {
        &self.history
    }

    pub fn config(&self) -> &SentimentConfig {
        &self.config
    }

    /// Get news articles for a symbol (cached)
    async fn get_news(&self, provider: &dyn NewsProvider, symbol: &str) -> Result<Vec<NewsArticle>, AnalysisError> {
        let cache_key = format!("news:{}:{}", symbol, self.config.news_limit);
        if let Some(entry) = self.news_cache.get(&cache_key) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < self.config.news_cache_ttl_secs {
                tracing::debug!("News cache hit for {}", symbol);
                return Ok(entry.data.clone());
            }
        }

        let articles = provider.get_news(symbol, self.config.news_limit).await?;

        self.news_cache.insert(cache_key, CacheEntry {
            data: articles.clone(),
            cached_at: Utc::now(),
        });

        Ok(articles)
    }

    async fn analyze_news(&self, symbol: &str) -> SourceResult<SourceSentiment> {
        let Some(provider) = &self.news_provider else {
            return SourceResult::errored("no news provider configured");
        };

        match self.get_news(provider.as_ref(), symbol).await {
            Ok(articles) => {
                let items = articles
                    .iter()
                    .map(|a| {
                        let text = a.text();
                        let item = score_item(&self.classifier, &a.id, a.published_utc, &text);
                        with_event(item, classify_event(&text))
                    })
                    .collect();
                SourceResult::Ok(aggregate_news(items))
            }
            Err(e) => {
                tracing::warn!("News fetch failed for {}: {}", symbol, e);
                SourceResult::errored(e.to_string())
            }
        }
    }

    async fn analyze_social(&self, symbol: &str) -> SourceResult<SourceSentiment> {
        let Some(provider) = &self.social_provider else {
            return SourceResult::errored("no social provider configured");
        };

        match provider.get_posts(symbol, self.config.social_limit).await {
            Ok(posts) => {
                let items = posts
                    .iter()
                    .map(|p| {
                        let item = score_item(&self.classifier, &p.id, p.posted_at, &p.text);
                        with_engagement(item, p.engagement)
                    })
                    .collect();
                SourceResult::Ok(aggregate_social(items))
            }
            Err(e) => {
                tracing::warn!("Social fetch failed for {}: {}", symbol, e);
                SourceResult::errored(e.to_string())
            }
        }
    }

    /// Score every requested source (all of them when `sources` is empty),
    /// blend them, record the blend in history and derive a signal.
    /// Nothing is recorded when no source contributed to the blend.
    /// A failing source is reported in `sources` and left out of the blend.
    pub async fn analyze_stock_sentiment(
        &self,
        symbol: &str,
        sources: &[SentimentSource],
    ) -> Result<SentimentResult, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidInput("symbol is required".to_string()));
        }
        let requested: &[SentimentSource] = if sources.is_empty() { &SentimentSource::ALL } else { sources };
        let wants = |s: SentimentSource| requested.contains(&s);

        let (news, social) = tokio::join!(
            async {
                if wants(SentimentSource::News) {
                    Some(self.analyze_news(&symbol).await)
                } else {
                    None
                }
            },
            async {
                if wants(SentimentSource::Social) {
                    Some(self.analyze_social(&symbol).await)
                } else {
                    None
                }
            }
        );

        let mut by_source = BTreeMap::new();
        if let Some(news) = news {
            by_source.insert(SentimentSource::News, news);
        }
        if let Some(social) = social {
            by_source.insert(SentimentSource::Social, social);
        }

        let overall = overall_sentiment(&by_source, &self.config.source_weights);
        let timestamp = Utc::now();
        // a blend with no contributing source is a placeholder, not a sample
        let historical_trend = if overall.sources_used > 0 {
            self.history.record(&symbol, overall.score, timestamp);
            self.history.trend(&symbol)
        } else {
            None
        };
        let signal = generate_signal(&overall, historical_trend);

        tracing::info!(
            "Sentiment for {}: score {:.2} from {} source(s), signal {}",
            symbol,
            overall.score,
            overall.sources_used,
            signal.action.as_str()
        );

        Ok(SentimentResult {
            symbol,
            timestamp,
            sources: by_source,
            overall,
            signal,
            historical_trend,
        })
    }

    /// Re-run analysis for each symbol and report sentiment surges.
    pub async fn get_sentiment_alerts(&self, symbols: &[String]) -> Vec<SentimentAlert> {
        let results = join_all(symbols.iter().map(|s| self.analyze_stock_sentiment(s, &[]))).await;

        results
            .into_iter()
            .zip(symbols)
            .filter_map(|(result, symbol)| match result {
                Ok(r) => surge_alert(&r),
                Err(e) => {
                    tracing::warn!("Sentiment alert check failed for {}: {}", symbol, e);
                    None
                }
            })
            .collect()
    }
}

impl Default for SentimentEstimator {
    fn default() -> Self {
        Self::new(SentimentConfig::default())
    }
}

pub fn surge_alert(result: &SentimentResult) -> Option<SentimentAlert> {
    let score = result.overall.score;
    if score.abs() <= SURGE_THRESHOLD {
        return None;
    }
    let (kind, direction) = if score > 0.0 {
        (SentimentAlertKind::PositiveSurge, "positive")
    } else {
        (SentimentAlertKind::NegativeSurge, "negative")
    };
    Some(SentimentAlert {
        symbol: result.symbol.clone(),
        kind,
        score,
        message: format!("Significant {} sentiment detected for {} ({:.1})", direction, result.symbol, score),
        timestamp: result.timestamp,
    })
}
