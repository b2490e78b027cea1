use analysis_core::{stats, Bar};
use serde::{Deserialize, Serialize};

/// Volatility bucket that drives the rule table and base confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility < 15.0 {
            RiskLevel::Low
        } else if volatility < 30.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Static (min, max) stop-loss range in percent
    pub fn stop_loss_range(&self) -> (f64, f64) {
        match self {
            RiskLevel::Low => (2.0, 4.0),
            RiskLevel::Medium => (4.0, 6.0),
            RiskLevel::High => (6.0, 10.0),
        }
    }

    /// Static (min, max) take-profit range in percent
    pub fn take_profit_range(&self) -> (f64, f64) {
        match self {
            RiskLevel::Low => (8.0, 12.0),
            RiskLevel::Medium => (10.0, 15.0),
            RiskLevel::High => (15.0, 20.0),
        }
    }

    pub fn base_confidence(&self) -> f64 {
        match self {
            RiskLevel::Low => 85.0,
            RiskLevel::Medium => 75.0,
            RiskLevel::High => 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskParams {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

/// A closed trade with the market conditions at entry and the stop-loss /
/// take-profit levels that worked out in hindsight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub volatility: f64,
    pub rsi: f64,
    pub volume_ratio: f64,
    pub price_change: f64,
    #[serde(default)]
    pub market_trend: f64,
    pub actual_stop_loss: f64,
    pub actual_take_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    /// volatility, rsi, volume ratio, price change, market trend
    pub features: [f64; 5],
    /// stop-loss, take-profit
    pub targets: [f64; 2],
}

impl From<&TradeRecord> for TrainingRow {
    fn from(t: &TradeRecord) -> Self {
        Self {
            features: [t.volatility, t.rsi, t.volume_ratio, t.price_change, t.market_trend],
            targets: [t.actual_stop_loss, t.actual_take_profit],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingOutcome {
    pub rows_accepted: usize,
    pub buffer_size: usize,
    pub refitted: bool,
}

/// One observation of the features checked for anomalies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketObservation {
    pub volume: f64,
    pub volatility: f64,
    pub price_change: f64,
}

impl MarketObservation {
    const VOLATILITY_WINDOW: usize = 10;

    /// Per-bar observations: volume, percent change from the previous close
    /// and the annualised stdev of the trailing 10 returns. The first
    /// `VOLATILITY_WINDOW` bars have no full window and are skipped.
    pub fn series_from_bars(bars: &[Bar]) -> Vec<MarketObservation> {
        let returns: Vec<f64> = bars
            .windows(2)
            .map(|w| {
                if w[0].close > 0.0 {
                    (w[1].close - w[0].close) / w[0].close
                } else {
                    0.0
                }
            })
            .collect();

        (Self::VOLATILITY_WINDOW..=returns.len())
            .map(|end| {
                let window = &returns[end - Self::VOLATILITY_WINDOW..end];
                MarketObservation {
                    volume: bars[end].volume,
                    volatility: stats::std_dev(window) * 252f64.sqrt() * 100.0,
                    price_change: returns[end - 1] * 100.0,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAnomaly {
    pub feature: String,
    pub value: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
    pub severity: Option<AnomalySeverity>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub is_anomaly: bool,
    /// Absent when there was not enough history to judge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<FeatureAnomaly>>,
}

/// A holding fed to the Monte Carlo simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub symbol: String,
    /// Current market value
    pub value: f64,
    /// Annualised volatility in percent
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSimulationSummary {
    pub iterations: usize,
    pub days: u32,
    pub initial_value: f64,
    pub expected_value: f64,
    pub var95: f64,
    pub var99: f64,
    pub best_case: f64,
    pub worst_case: f64,
    pub expected_drawdown: f64,
    pub worst_case_drawdown: f64,
    pub probability_of_loss: f64,
    pub sharpe_ratio: f64,
}
