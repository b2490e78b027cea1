use analysis_core::Bar;
use serde::{Deserialize, Serialize};

use crate::chart_patterns::*;
use crate::levels::*;
use crate::patterns::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Chart,
    Candlestick,
}

/// One tradeable claim derived from a detected pattern. Confidence is on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSignal {
    pub pattern: String,
    pub kind: PatternKind,
    pub recommendation: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAnalysis {
    pub chart_patterns: Vec<ChartPattern>,
    pub candlestick_patterns: Vec<CandlestickMatch>,
    pub support_resistance: SupportResistance,
    pub signals: Vec<PatternSignal>,
}

impl PatternAnalysis {
    /// Highest-confidence signal, if any pattern was found
    pub fn top_signal(&self) -> Option<&PatternSignal> {
        self.signals.iter().max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Stateless pattern detector over a bar slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAnalysisEngine;

impl PatternAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_chart_patterns(&self, bars: &[Bar]) -> Vec<ChartPattern> {
        detect_chart_patterns(bars)
    }

    pub fn detect_candlestick_patterns(&self, bars: &[Bar]) -> Vec<CandlestickMatch> {
        detect_candlestick_patterns(bars)
    }

    pub fn predict_support_resistance(&self, bars: &[Bar]) -> SupportResistance {
        predict_support_resistance(bars)
    }

    /// Run every detector and flatten the matches into signals for fusion
    pub fn detect_patterns(&self, bars: &[Bar]) -> PatternAnalysis {
        let chart_patterns = self.detect_chart_patterns(bars);
        let candlestick_patterns = self.detect_candlestick_patterns(bars);
        let support_resistance = self.predict_support_resistance(bars);

        let mut signals = Vec::with_capacity(chart_patterns.len() + candlestick_patterns.len());
        for p in &chart_patterns {
            signals.push(PatternSignal {
                pattern: p.pattern_type.name().to_string(),
                kind: PatternKind::Chart,
                recommendation: p.recommendation.clone(),
                confidence: p.confidence * 100.0,
            });
        }
        for c in &candlestick_patterns {
            signals.push(PatternSignal {
                pattern: c.pattern.name().to_string(),
                kind: PatternKind::Candlestick,
                recommendation: c.recommendation.clone(),
                confidence: c.confidence,
            });
        }

        tracing::debug!(
            "Pattern scan over {} bars: {} chart, {} candlestick",
            bars.len(),
            chart_patterns.len(),
            candlestick_patterns.len()
        );

        PatternAnalysis {
            chart_patterns,
            candlestick_patterns,
            support_resistance,
            signals,
        }
    }
}
