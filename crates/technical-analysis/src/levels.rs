use analysis_core::Bar;
use serde::{Deserialize, Serialize};

use crate::chart_patterns::local_extrema;

pub const MIN_LEVEL_BARS: usize = 20;
const EXTREMA_WINDOW: usize = 5;
const CLUSTER_TOLERANCE: f64 = 0.02;
const MAX_LEVELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistanceLevel {
    pub price: f64,
    pub strength: f64, // 0 to 100
    pub touches: u32,
    /// Index of the most recent bar that touched the level
    pub last_touch: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistance {
    pub support: Vec<SupportResistanceLevel>,
    pub resistance: Vec<SupportResistanceLevel>,
    pub current_price: Option<f64>,
}

/// Merge extrema whose prices sit within the relative tolerance of an
/// existing cluster; the cluster price is the running mean of its members.
fn cluster_levels(points: &[(usize, f64)], tolerance: f64) -> Vec<SupportResistanceLevel> {
    let mut clusters: Vec<SupportResistanceLevel> = Vec::new();

    for &(index, price) in points {
        let existing = clusters
            .iter_mut()
            .find(|c| c.price > 0.0 && ((price - c.price) / c.price).abs() <= tolerance);

        match existing {
            Some(cluster) => {
                let touches = cluster.touches as f64;
                cluster.price = (cluster.price * touches + price) / (touches + 1.0);
                cluster.touches += 1;
                cluster.last_touch = cluster.last_touch.max(index);
            }
            None => clusters.push(SupportResistanceLevel {
                price,
                strength: 0.0,
                touches: 1,
                last_touch: index,
            }),
        }
    }

    clusters
}

fn score_levels(
    mut levels: Vec<SupportResistanceLevel>,
    bar_count: usize,
    current_price: f64,
) -> Vec<SupportResistanceLevel> {
    for level in &mut levels {
        let recency = if bar_count > 1 {
            20.0 * level.last_touch as f64 / (bar_count - 1) as f64
        } else {
            0.0
        };
        let distance = if current_price > 0.0 {
            (level.price - current_price).abs() / current_price
        } else {
            f64::INFINITY
        };
        let proximity = if distance <= 0.05 {
            30.0
        } else if distance <= 0.10 {
            15.0
        } else {
            0.0
        };
        level.strength = (level.touches as f64 * 20.0 + recency + proximity).min(100.0);
    }

    levels.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    levels.truncate(MAX_LEVELS);
    levels
}

/// Cluster swing highs into resistance and swing lows into support; return
/// the three strongest of each together with the current price.
pub fn predict_support_resistance(bars: &[Bar]) -> SupportResistance {
    let current_price = bars.last().map(|b| b.close);
    if bars.len() < MIN_LEVEL_BARS {
        return SupportResistance {
            current_price,
            ..Default::default()
        };
    }
    let price = current_price.unwrap_or_default();

    let (peaks, troughs) = local_extrema(bars, EXTREMA_WINDOW);
    let highs: Vec<(usize, f64)> = peaks.iter().map(|&i| (i, bars[i].high)).collect();
    let lows: Vec<(usize, f64)> = troughs.iter().map(|&i| (i, bars[i].low)).collect();

    SupportResistance {
        resistance: score_levels(cluster_levels(&highs, CLUSTER_TOLERANCE), bars.len(), price),
        support: score_levels(cluster_levels(&lows, CLUSTER_TOLERANCE), bars.len(), price),
        current_price,
    }
}
