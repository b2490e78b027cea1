use analysis_core::{SignalAction, SourceResult};
use risk_manager::AnomalyReport;
use sentiment_analysis::SentimentResult;
use serde::{Deserialize, Serialize};
use technical_analysis::PatternAnalysis;

pub const RISK_WEIGHT: f64 = 0.3;
pub const PATTERN_WEIGHT: f64 = 0.4;
pub const SENTIMENT_WEIGHT: f64 = 0.3;

/// Score a calm market contributes through the risk component
const RISK_NEUTRAL_SCORE: f64 = 0.5;
const ACTION_THRESHOLD: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 95.0;

/// What one source added to the fused score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    pub contribution: f64,
    pub weight: f64,
}

/// `None` marks a source left out of both numerator and denominator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionComponents {
    pub risk: Option<ComponentScore>,
    pub patterns: Option<ComponentScore>,
    pub sentiment: Option<ComponentScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSignal {
    pub signal: SignalAction,
    /// -1 to 1
    pub score: f64,
    /// 0 to 95
    pub confidence: f64,
    pub components: FusionComponents,
}

pub struct FusionInputs<'a> {
    pub anomalies: Option<&'a AnomalyReport>,
    pub patterns: Option<&'a PatternAnalysis>,
    pub sentiment: Option<&'a SourceResult<SentimentResult>>,
}

/// +1 for buying language, -1 for selling language, 0 otherwise
pub fn recommendation_direction(text: &str) -> f64 {
    let text = text.to_lowercase();
    if text.contains("buy") {
        1.0
    } else if text.contains("sell") {
        -1.0
    } else {
        0.0
    }
}

pub fn direction_action(direction: f64) -> SignalAction {
    if direction > 0.0 {
        SignalAction::Buy
    } else if direction < 0.0 {
        SignalAction::Sell
    } else {
        SignalAction::Hold
    }
}

fn risk_component(anomalies: &AnomalyReport) -> Option<ComponentScore> {
    if anomalies.is_anomaly {
        return None;
    }
    Some(ComponentScore {
        contribution: RISK_NEUTRAL_SCORE * RISK_WEIGHT,
        weight: RISK_WEIGHT,
    })
}

/// Every pattern signal brings its own share of the pattern weight, so more
/// patterns give the technical picture more say.
fn pattern_component(patterns: &PatternAnalysis) -> Option<ComponentScore> {
    if patterns.signals.is_empty() {
        return None;
    }
    let mut component = ComponentScore { contribution: 0.0, weight: 0.0 };
    for signal in &patterns.signals {
        let direction = recommendation_direction(&signal.recommendation);
        component.contribution += direction * PATTERN_WEIGHT * (signal.confidence / 100.0);
        component.weight += PATTERN_WEIGHT;
    }
    Some(component)
}

fn sentiment_component(sentiment: &SourceResult<SentimentResult>) -> Option<ComponentScore> {
    let result = sentiment.ok()?;
    Some(ComponentScore {
        contribution: result.signal.action.direction() * SENTIMENT_WEIGHT * (result.signal.confidence / 100.0),
        weight: SENTIMENT_WEIGHT,
    })
}

/// Weighted vote of the risk, pattern and sentiment components.
pub fn generate_combined_signal(inputs: &FusionInputs<'_>) -> CombinedSignal {
    let components = FusionComponents {
        risk: inputs.anomalies.and_then(risk_component),
        patterns: inputs.patterns.and_then(pattern_component),
        sentiment: inputs.sentiment.and_then(sentiment_component),
    };

    let included: Vec<ComponentScore> = [components.risk, components.patterns, components.sentiment]
        .into_iter()
        .flatten()
        .collect();
    let total_weight: f64 = included.iter().map(|c| c.weight).sum();
    let score = if total_weight > 0.0 {
        (included.iter().map(|c| c.contribution).sum::<f64>() / total_weight).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let signal = if score > ACTION_THRESHOLD {
        SignalAction::Buy
    } else if score < -ACTION_THRESHOLD {
        SignalAction::Sell
    } else {
        SignalAction::Hold
    };

    CombinedSignal {
        signal,
        score,
        confidence: (score.abs() * 100.0).min(MAX_CONFIDENCE),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::SignalStrength;
    use chrono::Utc;
    use sentiment_analysis::{OverallSentiment, OverallTrend, SentimentSignal};
    use std::collections::BTreeMap;
    use technical_analysis::{PatternKind, PatternSignal};

    fn anomaly(is_anomaly: bool) -> AnomalyReport {
        AnomalyReport { is_anomaly, anomalies: Some(Vec::new()) }
    }

    fn patterns(signals: &[(&str, f64)]) -> PatternAnalysis {
        PatternAnalysis {
            signals: signals
                .iter()
                .map(|&(recommendation, confidence)| PatternSignal {
                    pattern: "Test".to_string(),
                    kind: PatternKind::Chart,
                    recommendation: recommendation.to_string(),
                    confidence,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn sentiment(action: SignalAction, confidence: f64) -> SourceResult<SentimentResult> {
        SourceResult::Ok(SentimentResult {
            symbol: "TEST".to_string(),
            timestamp: Utc::now(),
            sources: BTreeMap::new(),
            overall: OverallSentiment { score: 0.0, magnitude: 0.0, trend: OverallTrend::Neutral, sources_used: 0 },
            signal: SentimentSignal {
                action,
                strength: Some(SignalStrength::Moderate),
                confidence,
                reason: String::new(),
            },
            historical_trend: None,
        })
    }

    #[test]
    fn test_anomaly_excludes_risk_weight() {
        let report = anomaly(true);
        let pats = patterns(&[("Wait for breakout direction", 70.0)]);
        let sent = sentiment(SignalAction::Hold, 50.0);
        let combined = generate_combined_signal(&FusionInputs {
            anomalies: Some(&report),
            patterns: Some(&pats),
            sentiment: Some(&sent),
        });

        assert_eq!(combined.score, 0.0);
        assert_eq!(combined.signal, SignalAction::Hold);
        assert!(combined.components.risk.is_none());

        let calm = anomaly(false);
        let combined = generate_combined_signal(&FusionInputs {
            anomalies: Some(&calm),
            patterns: Some(&pats),
            sentiment: Some(&sent),
        });
        assert!((combined.score - 0.15).abs() < 1e-12);
        assert_eq!(combined.signal, SignalAction::Hold);
    }

    #[test]
    fn test_bullish_agreement_buys() {
        let calm = anomaly(false);
        let pats = patterns(&[("Bullish reversal - consider buying", 80.0), ("Bullish continuation - consider buying", 90.0)]);
        let sent = sentiment(SignalAction::Buy, 80.0);
        let combined = generate_combined_signal(&FusionInputs {
            anomalies: Some(&calm),
            patterns: Some(&pats),
            sentiment: Some(&sent),
        });

        // (0.15 + 0.32 + 0.36 + 0.24) / (0.3 + 0.8 + 0.3)
        let expected = (0.15 + 0.4 * 0.8 + 0.4 * 0.9 + 0.3 * 0.8) / 1.4;
        assert!((combined.score - expected).abs() < 1e-12);
        assert_eq!(combined.signal, SignalAction::Buy);
        assert!((combined.confidence - expected * 100.0).abs() < 1e-9);
        assert_eq!(combined.components.patterns.unwrap().weight, 0.8);
    }

    #[test]
    fn test_bearish_patterns_sell() {
        let pats = patterns(&[("Bearish reversal - consider selling", 100.0)]);
        let combined = generate_combined_signal(&FusionInputs {
            anomalies: None,
            patterns: Some(&pats),
            sentiment: Some(&SourceResult::errored("down")),
        });
        assert_eq!(combined.score, -1.0);
        assert_eq!(combined.signal, SignalAction::Sell);
        assert_eq!(combined.confidence, 95.0);
        assert!(combined.components.sentiment.is_none());
    }

    #[test]
    fn test_nothing_included_is_hold() {
        let combined = generate_combined_signal(&FusionInputs { anomalies: None, patterns: None, sentiment: None });
        assert_eq!(combined.score, 0.0);
        assert_eq!(combined.confidence, 0.0);
        assert_eq!(combined.signal, SignalAction::Hold);
    }

    #[test]
    fn test_recommendation_direction() {
        assert_eq!(recommendation_direction("Strong bullish reversal - consider BUYING"), 1.0);
        assert_eq!(recommendation_direction("consider selling on breakdown"), -1.0);
        assert_eq!(recommendation_direction("Market indecision - wait for confirmation"), 0.0);
    }
}
