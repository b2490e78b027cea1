use analysis_core::{SignalAction, SourceResult};
use chrono::{DateTime, Utc};
use risk_manager::{AnomalyReport, RiskParams, TradeRecord, TrainingOutcome};
use sentiment_analysis::SentimentResult;
use serde::{Deserialize, Serialize};
use technical_analysis::PatternAnalysis;

use crate::fusion::CombinedSignal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub params: RiskParams,
    pub anomalies: AnomalyReport,
}

/// One component's headline call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub source: String,
    pub action: String,
    pub confidence: f64,
    pub detail: String,
}

/// Full analysis for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlAnalysis {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub risk: RiskAnalysis,
    pub patterns: PatternAnalysis,
    pub sentiment: SourceResult<SentimentResult>,
    pub combined_signal: CombinedSignal,
    pub recommendations: Vec<Recommendation>,
}

/// Open position checked for alerts. Stop-loss and take-profit are
/// percentages from entry; unset levels use the engine defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub current_price: f64,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
}

impl Position {
    /// Unrealised P&L in percent of entry
    pub fn unrealized_pct(&self) -> Option<f64> {
        if self.entry_price > 0.0 && self.current_price.is_finite() {
            Some((self.current_price - self.entry_price) / self.entry_price * 100.0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StopLossProximity,
    TakeProfitProximity,
    PositiveSurge,
    NegativeSurge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlAlert {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingData {
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub risk: TrainingOutcome,
    pub patterns: String,
    pub sentiment: String,
}

pub(crate) fn action_label(action: SignalAction) -> String {
    action.as_str().to_string()
}
