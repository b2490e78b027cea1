use async_trait::async_trait;
use crate::{AnalysisError, Bar, NewsArticle, SocialPost};

/// Source of historical OHLCV bars, ascending by date
#[async_trait]
pub trait PriceDataProvider: Send + Sync {
    async fn get_bars(&self, symbol: &str, days: u32) -> Result<Vec<Bar>, AnalysisError>;
}

/// Source of news articles about a symbol
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn get_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError>;
}

/// Source of social media posts about a symbol
#[async_trait]
pub trait SocialProvider: Send + Sync {
    async fn get_posts(&self, symbol: &str, limit: usize) -> Result<Vec<SocialPost>, AnalysisError>;
}
