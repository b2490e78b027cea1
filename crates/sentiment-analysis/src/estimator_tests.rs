#[cfg(test)]
mod tests {
    use crate::estimator::*;
    use crate::models::*;
    use analysis_core::{AnalysisError, NewsArticle, NewsProvider, SignalAction, SocialPost, SocialProvider};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeNews {
        headlines: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeNews {
        fn new(headlines: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self { headlines, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl NewsProvider for FakeNews {
        async fn get_news(&self, _symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .headlines
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, title)| NewsArticle {
                    id: format!("n{}", i),
                    title: title.to_string(),
                    description: None,
                    published_utc: Utc::now() - Duration::hours((self.headlines.len() - i) as i64),
                    source: Some("wire".to_string()),
                })
                .collect())
        }
    }

    struct FakeSocial {
        posts: Vec<(&'static str, u64)>,
    }

    #[async_trait]
    impl SocialProvider for FakeSocial {
        async fn get_posts(&self, _symbol: &str, _limit: usize) -> Result<Vec<SocialPost>, AnalysisError> {
            Ok(self
                .posts
                .iter()
                .enumerate()
                .map(|(i, (text, engagement))| SocialPost {
                    id: format!("s{}", i),
                    text: text.to_string(),
                    author: None,
                    posted_at: Utc::now() - Duration::minutes(i as i64),
                    engagement: *engagement,
                })
                .collect())
        }
    }

    struct DownSocial;

    #[async_trait]
    impl SocialProvider for DownSocial {
        async fn get_posts(&self, _symbol: &str, _limit: usize) -> Result<Vec<SocialPost>, AnalysisError> {
            Err(AnalysisError::upstream("social", "503 Service Unavailable"))
        }
    }

    #[tokio::test]
    async fn test_news_only_score_is_news_average() {
        let news = FakeNews::new(vec![
            "Stock rallies on strong growth",  // 3 + 2 + 2
            "Shares drop after weak guidance", // -2 - 2
        ]);
        let estimator = SentimentEstimator::default().with_news_provider(news);

        let result = estimator
            .analyze_stock_sentiment("aapl", &[SentimentSource::News])
            .await
            .unwrap();

        assert_eq!(result.symbol, "AAPL");
        let news_result = result.sources[&SentimentSource::News].ok().unwrap();
        assert_eq!(news_result.average_score, Some(1.5));
        assert_eq!(result.overall.score, 1.5);
        assert_eq!(result.overall.trend, OverallTrend::Neutral);
        assert!(!result.sources.contains_key(&SentimentSource::Social));
        assert_eq!(result.signal.action, SignalAction::Hold);
        assert!(news_result.items.iter().all(|i| i.event.is_some()));
    }

    #[tokio::test]
    async fn test_failed_source_is_reported_and_excluded() {
        let news = FakeNews::new(vec!["Record profit and strong growth beats estimates"]);
        let estimator = SentimentEstimator::default()
            .with_news_provider(news)
            .with_social_provider(Arc::new(DownSocial));

        let result = estimator.analyze_stock_sentiment("MSFT", &[]).await.unwrap();

        let social = &result.sources[&SentimentSource::Social];
        assert!(social.is_errored());
        let json = serde_json::to_value(social).unwrap();
        assert!(json["error"].as_str().unwrap().contains("503"));

        // record 2 + profit 2 + strong 2 + growth 2 + beats 2
        assert_eq!(result.overall.score, 10.0);
        assert_eq!(result.overall.sources_used, 1);
        assert_eq!(result.signal.action, SignalAction::Buy);
        assert_eq!(result.signal.confidence, 55.0);
    }

    #[tokio::test]
    async fn test_missing_provider_is_an_errored_source() {
        let estimator = SentimentEstimator::default();
        let result = estimator.analyze_stock_sentiment("NVDA", &[]).await.unwrap();
        assert!(result.sources.values().all(|s| s.is_errored()));
        assert_eq!(result.overall.score, 0.0);
        assert_eq!(result.overall.sources_used, 0);
        assert_eq!(result.signal.action, SignalAction::Hold);
    }

    #[tokio::test]
    async fn test_blank_symbol_is_rejected() {
        let estimator = SentimentEstimator::default();
        let err = estimator.analyze_stock_sentiment("  ", &[]).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_news_is_cached() {
        let news = FakeNews::new(vec!["Quiet session"]);
        let estimator = SentimentEstimator::default().with_news_provider(news.clone());

        estimator.analyze_stock_sentiment("AMD", &[SentimentSource::News]).await.unwrap();
        estimator.analyze_stock_sentiment("AMD", &[SentimentSource::News]).await.unwrap();
        assert_eq!(news.calls.load(Ordering::SeqCst), 1);

        let uncached = SentimentEstimator::new(SentimentConfig {
            news_cache_ttl_secs: 0,
            ..Default::default()
        })
        .with_news_provider(news.clone());
        uncached.analyze_stock_sentiment("AMD", &[SentimentSource::News]).await.unwrap();
        uncached.analyze_stock_sentiment("AMD", &[SentimentSource::News]).await.unwrap();
        assert_eq!(news.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_history_is_recorded_per_call() {
        let estimator = SentimentEstimator::default()
            .with_social_provider(Arc::new(FakeSocial { posts: vec![("great quarter", 3)] }));
        for _ in 0..10 {
            estimator.analyze_stock_sentiment("GME", &[SentimentSource::Social]).await.unwrap();
        }
        assert_eq!(estimator.history().len("GME"), 10);

        let result = estimator.analyze_stock_sentiment("GME", &[SentimentSource::Social]).await.unwrap();
        assert_eq!(result.historical_trend, Some(SourceTrend::Stable));
    }

    #[tokio::test]
    async fn test_failed_fetches_leave_history_alone() {
        let estimator = SentimentEstimator::default();
        for _ in 0..5 {
            estimator.history().record("AAPL", -10.0, Utc::now());
        }

        for _ in 0..5 {
            let result = estimator.analyze_stock_sentiment("AAPL", &[]).await.unwrap();
            assert_eq!(result.overall.sources_used, 0);
            assert_eq!(result.historical_trend, None);
            assert_eq!(result.signal.action, SignalAction::Hold);
            assert_eq!(result.signal.strength, None);
        }
        assert_eq!(estimator.history().len("AAPL"), 5);

        let estimator = SentimentEstimator::default().with_social_provider(Arc::new(DownSocial));
        estimator.analyze_stock_sentiment("AAPL", &[SentimentSource::Social]).await.unwrap();
        assert_eq!(estimator.history().len("AAPL"), 0);
    }

    #[tokio::test]
    async fn test_social_engagement_weighting() {
        let estimator = SentimentEstimator::default().with_social_provider(Arc::new(FakeSocial {
            posts: vec![("excellent breakthrough", 90), ("terrible", 10)],
        }));
        let result = estimator.analyze_stock_sentiment("PLTR", &[SentimentSource::Social]).await.unwrap();
        // (8 * 90 - 3 * 10) / 100
        assert!((result.overall.score - 6.9).abs() < 1e-9);
        assert_eq!(result.signal.action, SignalAction::Buy);
    }

    #[tokio::test]
    async fn test_surge_alerts() {
        let estimator = SentimentEstimator::default().with_news_provider(FakeNews::new(vec![
            "Excellent breakthrough as stock soars on record profit and strong growth",
        ]));

        let alerts = estimator
            .get_sentiment_alerts(&["TSLA".to_string(), " ".to_string()])
            .await;

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "TSLA");
        assert_eq!(alerts[0].kind, SentimentAlertKind::PositiveSurge);
        assert!(alerts[0].score > SURGE_THRESHOLD);
    }
}
