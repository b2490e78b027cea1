use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(alias = "date")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Check the shape of a bar series handed in by a data provider or a caller.
/// An empty series is well-formed; estimators treat it as too little history.
pub fn validate_bars(bars: &[Bar]) -> Result<(), AnalysisError> {
    for (i, bar) in bars.iter().enumerate() {
        let fields = [bar.open, bar.high, bar.low, bar.close, bar.volume];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "bar {} has a negative or non-finite field",
                i
            )));
        }
        if bar.high < bar.open.max(bar.close) || bar.low > bar.open.min(bar.close) {
            return Err(AnalysisError::InvalidInput(format!(
                "bar {} violates low <= open/close <= high",
                i
            )));
        }
        if i > 0 && bars[i - 1].timestamp > bar.timestamp {
            return Err(AnalysisError::InvalidInput(format!(
                "bars must be sorted by date (bar {} is out of order)",
                i
            )));
        }
    }

    Ok(())
}

/// Market snapshot used as regression input. All percentages are in percent
/// units (5.0 = 5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    pub price_change: f64,
    pub volume_ratio: f64,
    pub volatility: f64,
    pub rsi: f64,
    #[serde(default)]
    pub holding_days: u32,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            price_change: 0.0,
            volume_ratio: 1.0,
            volatility: 20.0,
            rsi: 50.0,
            holding_days: 0,
        }
    }
}

/// Direction of a trading recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl SignalAction {
    /// +1 for buy, -1 for sell, 0 for hold
    pub fn direction(&self) -> f64 {
        match self {
            SignalAction::Buy => 1.0,
            SignalAction::Sell => -1.0,
            SignalAction::Hold => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Hold => "HOLD",
        }
    }
}

/// How strongly an estimator backs its action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Moderate,
    Weak,
}

/// Result of a per-source sub-analysis. A source that failed upstream is kept
/// in the output so the caller can see why it was left out of aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceResult<T> {
    Errored { error: String },
    Ok(T),
}

impl<T> SourceResult<T> {
    pub fn errored(message: impl Into<String>) -> Self {
        SourceResult::Errored { error: message.into() }
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            SourceResult::Ok(data) => Some(data),
            SourceResult::Errored { .. } => None,
        }
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, SourceResult::Errored { .. })
    }
}

impl<T> From<Result<T, AnalysisError>> for SourceResult<T> {
    fn from(result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(data) => SourceResult::Ok(data),
            Err(e) => SourceResult::errored(e.to_string()),
        }
    }
}

/// News article
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub published_utc: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
}

impl NewsArticle {
    pub fn text(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {}", self.title, desc),
            None => self.title.clone(),
        }
    }
}

/// Social media post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    pub posted_at: DateTime<Utc>,
    /// Likes + shares + replies
    #[serde(default)]
    pub engagement: u64,
}
