//! Per-symbol sentiment history.
//!
//! Keeps the most recent overall scores for each symbol so a neutral reading
//! can still be nudged by the direction sentiment has been moving in.

use std::collections::VecDeque;

use analysis_core::stats::mean;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::models::{SentimentSample, SourceTrend};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
/// Samples in each of the two compared windows
const TREND_WINDOW: usize = 5;

/// Bounded, oldest-first ring of samples per symbol. Appends for one symbol
/// hold that symbol's shard lock, so concurrent analyses never interleave.
pub struct SentimentHistory {
    capacity: usize,
    samples: DashMap<String, VecDeque<SentimentSample>>,
}

impl SentimentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: DashMap::new(),
        }
    }

    pub fn record(&self, symbol: &str, score: f64, timestamp: DateTime<Utc>) {
        let mut entry = self.samples.entry(symbol.to_uppercase()).or_default();
        entry.push_back(SentimentSample { timestamp, score });
        while entry.len() > self.capacity {
            entry.pop_front();
        }
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.samples
            .get(&symbol.to_uppercase())
            .map(|e| e.len())
            .unwrap_or(0)
    }

    pub fn samples(&self, symbol: &str) -> Vec<SentimentSample> {
        self.samples
            .get(&symbol.to_uppercase())
            .map(|e| e.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Mean of the last five samples against the five before them.
    /// `None` until ten samples exist.
    pub fn trend(&self, symbol: &str) -> Option<SourceTrend> {
        let entry = self.samples.get(&symbol.to_uppercase())?;
        if entry.len() < TREND_WINDOW * 2 {
            return None;
        }

        let scores: Vec<f64> = entry
            .iter()
            .rev()
            .take(TREND_WINDOW * 2)
            .map(|s| s.score)
            .collect();
        // newest first
        let recent = mean(&scores[..TREND_WINDOW]);
        let prior = mean(&scores[TREND_WINDOW..]);
        Some(SourceTrend::from_delta(recent - prior))
    }
}

impl Default for SentimentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
