use analysis_core::{stats, Bar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum bars needed before candlestick detection runs
pub const MIN_CANDLESTICK_BARS: usize = 5;

const BASE_CONFIDENCE: f64 = 70.0;
const MAX_CONFIDENCE: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlestickPattern {
    Hammer,
    HangingMan,
    Doji,
    BullishEngulfing,
    BearishEngulfing,
}

impl CandlestickPattern {
    pub fn name(&self) -> &'static str {
        match self {
            CandlestickPattern::Hammer => "Hammer",
            CandlestickPattern::HangingMan => "Hanging Man",
            CandlestickPattern::Doji => "Doji",
            CandlestickPattern::BullishEngulfing => "Bullish Engulfing",
            CandlestickPattern::BearishEngulfing => "Bearish Engulfing",
        }
    }

    pub fn bias(&self) -> PatternBias {
        match self {
            CandlestickPattern::Hammer | CandlestickPattern::BullishEngulfing => PatternBias::Bullish,
            CandlestickPattern::HangingMan | CandlestickPattern::BearishEngulfing => PatternBias::Bearish,
            CandlestickPattern::Doji => PatternBias::Neutral,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            CandlestickPattern::Hammer => "Potential bullish reversal - consider buying",
            CandlestickPattern::HangingMan => "Potential bearish reversal - consider selling",
            CandlestickPattern::Doji => "Market indecision - wait for confirmation",
            CandlestickPattern::BullishEngulfing => "Strong bullish reversal - consider buying",
            CandlestickPattern::BearishEngulfing => "Strong bearish reversal - consider selling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickMatch {
    pub pattern: CandlestickPattern,
    #[serde(rename = "type")]
    pub bias: PatternBias,
    pub date: DateTime<Utc>,
    pub confidence: f64, // 0 to 95
    pub recommendation: String,
}

/// Small body, long lower shadow, upper shadow shorter than the body
pub fn is_hammer(bar: &Bar) -> bool {
    let body = bar.body();
    let range = bar.range();
    if range <= 0.0 {
        return false;
    }
    body < range * 0.3 && bar.lower_shadow() > 2.0 * body && bar.upper_shadow() < body
}

/// Same candle geometry as the hammer. No trend context is consulted, so both
/// fire on the same candle.
pub fn is_hanging_man(bar: &Bar) -> bool {
    is_hammer(bar)
}

pub fn is_doji(bar: &Bar) -> bool {
    let range = bar.range();
    range > 0.0 && bar.body() < range * 0.1
}

/// Prior candle bearish, current bullish and its body covers the prior body
pub fn is_bullish_engulfing(prev: &Bar, curr: &Bar) -> bool {
    prev.is_bearish() && curr.is_bullish() && curr.open <= prev.close && curr.close >= prev.open
}

/// Prior candle bullish, current bearish and its body covers the prior body
pub fn is_bearish_engulfing(prev: &Bar, curr: &Bar) -> bool {
    prev.is_bullish() && curr.is_bearish() && curr.open >= prev.close && curr.close <= prev.open
}

/// Confidence for a candle on the last bar: 70 base, plus a volume bonus when
/// the last bar trades above the trailing average.
fn volume_confidence(bars: &[Bar]) -> f64 {
    let (last, trailing) = match bars.split_last() {
        Some(split) => split,
        None => return BASE_CONFIDENCE,
    };
    let avg_volume = stats::mean(&trailing.iter().map(|b| b.volume).collect::<Vec<_>>());

    let mut confidence = BASE_CONFIDENCE;
    if avg_volume > 0.0 {
        if last.volume > avg_volume * 1.5 {
            confidence += 15.0;
        } else if last.volume > avg_volume {
            confidence += 5.0;
        }
    }
    confidence.min(MAX_CONFIDENCE)
}

/// Detect candlestick patterns formed by the last one or two bars
pub fn detect_candlestick_patterns(bars: &[Bar]) -> Vec<CandlestickMatch> {
    let mut patterns = Vec::new();

    if bars.len() < MIN_CANDLESTICK_BARS {
        return patterns;
    }

    let last = &bars[bars.len() - 1];
    let prev = &bars[bars.len() - 2];

    let mut found = Vec::new();
    if is_hammer(last) {
        found.push(CandlestickPattern::Hammer);
    }
    if is_hanging_man(last) {
        found.push(CandlestickPattern::HangingMan);
    }
    if is_doji(last) {
        found.push(CandlestickPattern::Doji);
    }
    if is_bullish_engulfing(prev, last) {
        found.push(CandlestickPattern::BullishEngulfing);
    }
    if is_bearish_engulfing(prev, last) {
        found.push(CandlestickPattern::BearishEngulfing);
    }

    if found.is_empty() {
        return patterns;
    }

    let confidence = volume_confidence(bars);
    for pattern in found {
        patterns.push(CandlestickMatch {
            pattern,
            bias: pattern.bias(),
            date: last.timestamp,
            confidence,
            recommendation: pattern.recommendation().to_string(),
        });
    }

    patterns
}
