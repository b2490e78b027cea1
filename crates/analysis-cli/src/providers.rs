//! Data providers backed by JSON fixture files.
//!
//! Each file is read on every call so fixtures can be edited between runs.
//! A missing or malformed file surfaces as an upstream fetch error, which
//! the sentiment estimator reports as an errored source.

use std::path::{Path, PathBuf};

use analysis_core::{
    AnalysisError, Bar, NewsArticle, NewsProvider, PriceDataProvider, SocialPost, SocialProvider,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

async fn read_json<T: DeserializeOwned>(source_name: &str, path: &Path) -> Result<T, AnalysisError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AnalysisError::upstream(source_name, format!("{}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AnalysisError::upstream(source_name, format!("{}: {}", path.display(), e)))
}

/// Array of OHLCV bars, oldest first
pub struct JsonPriceFile {
    path: PathBuf,
}

impl JsonPriceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PriceDataProvider for JsonPriceFile {
    async fn get_bars(&self, symbol: &str, days: u32) -> Result<Vec<Bar>, AnalysisError> {
        let mut bars: Vec<Bar> = read_json("price", &self.path).await?;
        let keep = days as usize;
        if bars.len() > keep {
            bars = bars.split_off(bars.len() - keep);
        }
        tracing::debug!("Loaded {} bars for {} from {}", bars.len(), symbol, self.path.display());
        Ok(bars)
    }
}

pub struct JsonNewsFile {
    path: PathBuf,
}

impl JsonNewsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NewsProvider for JsonNewsFile {
    async fn get_news(&self, _symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError> {
        let mut articles: Vec<NewsArticle> = read_json("news", &self.path).await?;
        articles.truncate(limit);
        Ok(articles)
    }
}

pub struct JsonSocialFile {
    path: PathBuf,
}

impl JsonSocialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SocialProvider for JsonSocialFile {
    async fn get_posts(&self, _symbol: &str, limit: usize) -> Result<Vec<SocialPost>, AnalysisError> {
        let mut posts: Vec<SocialPost> = read_json("social", &self.path).await?;
        posts.truncate(limit);
        Ok(posts)
    }
}
