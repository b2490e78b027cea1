use std::collections::{BTreeMap, HashMap};

use analysis_core::stats::mean;
use analysis_core::{SignalAction, SignalStrength, SourceResult};
use chrono::{DateTime, Utc};

use crate::classifier::TextClassifier;
use crate::keywords::{extract_keywords, NewsEventType};
use crate::lexicon::{score_tokens, tokenize};
use crate::models::*;

/// Weight for any source missing from the configured weights
pub const DEFAULT_SOURCE_WEIGHT: f64 = 0.5;

pub fn default_source_weights() -> HashMap<SentimentSource, f64> {
    HashMap::from([(SentimentSource::News, 0.6), (SentimentSource::Social, 0.4)])
}

/// Score one text item with the lexicon and classifier.
pub fn score_item(
    classifier: &TextClassifier,
    id: &str,
    timestamp: DateTime<Utc>,
    text: &str,
) -> ItemSentiment {
    let tokens = tokenize(text);
    let lexicon = score_tokens(&tokens);
    let (category, _) = classifier.classify_tokens(&tokens);

    let mut confidence = (lexicon.comparative.abs() * 100.0).min(100.0);
    if category.agrees_with(lexicon.score) {
        confidence += 20.0;
    }

    ItemSentiment {
        id: id.to_string(),
        timestamp,
        score: lexicon.score,
        comparative: lexicon.comparative,
        category,
        confidence: confidence.min(100.0),
        keywords: extract_keywords(&tokens),
        event: None,
        engagement: None,
    }
}

/// Recent half vs older half of the date-sorted items
pub fn source_trend(items: &[ItemSentiment]) -> SourceTrend {
    if items.len() < 2 {
        return SourceTrend::Stable;
    }
    let mut sorted: Vec<&ItemSentiment> = items.iter().collect();
    sorted.sort_by_key(|i| i.timestamp);

    let mid = sorted.len() / 2;
    let older: Vec<f64> = sorted[..mid].iter().map(|i| i.score).collect();
    let recent: Vec<f64> = sorted[mid..].iter().map(|i| i.score).collect();
    SourceTrend::from_delta(mean(&recent) - mean(&older))
}

pub fn aggregate_news(items: Vec<ItemSentiment>) -> SourceSentiment {
    let scores: Vec<f64> = items.iter().map(|i| i.score).collect();
    SourceSentiment {
        average_score: (!scores.is_empty()).then(|| mean(&scores)),
        trend: source_trend(&items),
        item_count: items.len(),
        items,
    }
}

/// Engagement-weighted mean; plain mean when nothing has engagement.
pub fn aggregate_social(items: Vec<ItemSentiment>) -> SourceSentiment {
    let average_score = if items.is_empty() {
        None
    } else {
        let total_engagement: f64 = items.iter().map(|i| i.engagement.unwrap_or(0) as f64).sum();
        if total_engagement > 0.0 {
            let weighted: f64 = items
                .iter()
                .map(|i| i.score * i.engagement.unwrap_or(0) as f64)
                .sum();
            Some(weighted / total_engagement)
        } else {
            let scores: Vec<f64> = items.iter().map(|i| i.score).collect();
            Some(mean(&scores))
        }
    };

    SourceSentiment {
        average_score,
        trend: source_trend(&items),
        item_count: items.len(),
        items,
    }
}

/// Weighted mean across sources that produced a score. Errored and empty
/// sources are left out of both numerator and denominator.
pub fn overall_sentiment(
    sources: &BTreeMap<SentimentSource, SourceResult<SourceSentiment>>,
    weights: &HashMap<SentimentSource, f64>,
) -> OverallSentiment {
    let scored: Vec<(f64, f64)> = sources
        .iter()
        .filter_map(|(source, result)| {
            let score = result.ok().and_then(|s| s.average_score)?;
            Some((score, weights.get(source).copied().unwrap_or(DEFAULT_SOURCE_WEIGHT)))
        })
        .collect();
    let sources_used = scored.len();

    let total_weight: f64 = scored.iter().map(|(_, w)| w).sum();
    let score = match scored.as_slice() {
        // a lone source keeps its exact score
        [(only, _)] => *only,
        _ if total_weight > 0.0 => scored.iter().map(|(s, w)| s * w).sum::<f64>() / total_weight,
        _ => 0.0,
    };
    let trend = if score > 5.0 {
        OverallTrend::Positive
    } else if score < -5.0 {
        OverallTrend::Negative
    } else {
        OverallTrend::Neutral
    };

    OverallSentiment {
        score,
        magnitude: score.abs(),
        trend,
        sources_used,
    }
}

/// Threshold the overall score into an action. A hold is upgraded to a weak
/// buy or sell when the symbol's history is improving or deteriorating.
pub fn generate_signal(overall: &OverallSentiment, historical_trend: Option<SourceTrend>) -> SentimentSignal {
    let (score, magnitude) = (overall.score, overall.magnitude);

    let strong = |action: SignalAction, reason: &str| SentimentSignal {
        action,
        strength: Some(SignalStrength::Strong),
        confidence: (60.0 + magnitude).min(95.0),
        reason: reason.to_string(),
    };
    let moderate = |action: SignalAction, reason: &str| SentimentSignal {
        action,
        strength: Some(SignalStrength::Moderate),
        confidence: (45.0 + magnitude).min(80.0),
        reason: reason.to_string(),
    };

    if score > 10.0 && magnitude > 10.0 {
        strong(SignalAction::Buy, "Strong positive sentiment")
    } else if score > 5.0 && magnitude > 5.0 {
        moderate(SignalAction::Buy, "Positive sentiment")
    } else if score < -10.0 && magnitude > 10.0 {
        strong(SignalAction::Sell, "Strong negative sentiment")
    } else if score < -5.0 && magnitude > 5.0 {
        moderate(SignalAction::Sell, "Negative sentiment")
    } else {
        match historical_trend {
            Some(SourceTrend::Improving) => SentimentSignal {
                action: SignalAction::Buy,
                strength: Some(SignalStrength::Weak),
                confidence: 40.0,
                reason: "Sentiment improving over recent history".to_string(),
            },
            Some(SourceTrend::Deteriorating) => SentimentSignal {
                action: SignalAction::Sell,
                strength: Some(SignalStrength::Weak),
                confidence: 40.0,
                reason: "Sentiment deteriorating over recent history".to_string(),
            },
            _ => SentimentSignal {
                action: SignalAction::Hold,
                strength: None,
                confidence: 50.0,
                reason: "Neutral sentiment".to_string(),
            },
        }
    }
}

pub(crate) fn with_event(mut item: ItemSentiment, event: NewsEventType) -> ItemSentiment {
    item.event = Some(event);
    item
}

pub(crate) fn with_engagement(mut item: ItemSentiment, engagement: u64) -> ItemSentiment {
    item.engagement = Some(engagement);
    item
}
