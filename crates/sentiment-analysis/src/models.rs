use std::collections::BTreeMap;

use analysis_core::{SignalAction, SignalStrength, SourceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keywords::NewsEventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentSource {
    News,
    Social,
}

impl SentimentSource {
    pub const ALL: [SentimentSource; 2] = [SentimentSource::News, SentimentSource::Social];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentSource::News => "news",
            SentimentSource::Social => "social",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

impl SentimentCategory {
    /// Whether the category matches the sign of a lexicon score
    pub fn agrees_with(&self, score: f64) -> bool {
        match self {
            SentimentCategory::Positive => score > 0.0,
            SentimentCategory::Negative => score < 0.0,
            SentimentCategory::Neutral => score == 0.0,
        }
    }
}

/// Score for one news article or social post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSentiment {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub comparative: f64,
    pub category: SentimentCategory,
    /// 0 to 100
    pub confidence: f64,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<NewsEventType>,
    /// Social engagement; absent for news
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTrend {
    Improving,
    Deteriorating,
    Stable,
}

impl SourceTrend {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 2.0 {
            SourceTrend::Improving
        } else if delta < -2.0 {
            SourceTrend::Deteriorating
        } else {
            SourceTrend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSentiment {
    /// `None` when the source returned no items
    pub average_score: Option<f64>,
    pub trend: SourceTrend,
    pub item_count: usize,
    pub items: Vec<ItemSentiment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallTrend {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSentiment {
    pub score: f64,
    pub magnitude: f64,
    pub trend: OverallTrend,
    /// Number of sources that contributed
    pub sources_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSignal {
    pub action: SignalAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<SignalStrength>,
    /// 0 to 95
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub sources: BTreeMap<SentimentSource, SourceResult<SourceSentiment>>,
    pub overall: OverallSentiment,
    pub signal: SentimentSignal,
    /// Trend of this symbol's retained history; `None` until enough samples exist
    pub historical_trend: Option<SourceTrend>,
}

/// One retained overall score for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSample {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentAlertKind {
    PositiveSurge,
    NegativeSurge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAlert {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: SentimentAlertKind,
    pub score: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
