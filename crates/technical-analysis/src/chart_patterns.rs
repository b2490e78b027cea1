//! Chart geometry patterns detected over sliding windows of a bar series.
//!
//! Every detector scans left to right and, after a match, resumes past the
//! matched window so one formation is reported once. Matches at or below
//! [`MIN_CHART_CONFIDENCE`] are dropped.

use analysis_core::{stats, Bar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum bars needed before chart detection runs
pub const MIN_CHART_BARS: usize = 50;
pub const MIN_CHART_CONFIDENCE: f64 = 0.6;

const HEAD_SHOULDERS_WINDOW: usize = 20;
const DOUBLE_WINDOW: usize = 15;
const EXTREMA_NEIGHBORHOOD: usize = 5;
const TRIANGLE_WINDOW: usize = 25;
const FLAG_POLE_WINDOW: usize = 10;
const FLAG_WINDOW: usize = 15;
const WEDGE_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPatternType {
    HeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    BullFlag,
    BearFlag,
    RisingWedge,
    FallingWedge,
}

impl ChartPatternType {
    pub fn name(&self) -> &'static str {
        match self {
            ChartPatternType::HeadAndShoulders => "Head and Shoulders",
            ChartPatternType::DoubleTop => "Double Top",
            ChartPatternType::DoubleBottom => "Double Bottom",
            ChartPatternType::AscendingTriangle => "Ascending Triangle",
            ChartPatternType::DescendingTriangle => "Descending Triangle",
            ChartPatternType::SymmetricalTriangle => "Symmetrical Triangle",
            ChartPatternType::BullFlag => "Bull Flag",
            ChartPatternType::BearFlag => "Bear Flag",
            ChartPatternType::RisingWedge => "Rising Wedge",
            ChartPatternType::FallingWedge => "Falling Wedge",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            ChartPatternType::HeadAndShoulders => "Bearish reversal - consider selling",
            ChartPatternType::DoubleTop => "Bearish reversal - consider selling",
            ChartPatternType::DoubleBottom => "Bullish reversal - consider buying",
            ChartPatternType::AscendingTriangle => "Bullish continuation - consider buying on breakout",
            ChartPatternType::DescendingTriangle => "Bearish continuation - consider selling on breakdown",
            ChartPatternType::SymmetricalTriangle => "Wait for breakout direction",
            ChartPatternType::BullFlag => "Bullish continuation - consider buying",
            ChartPatternType::BearFlag => "Bearish continuation - consider selling",
            ChartPatternType::RisingWedge => "Bearish reversal - consider selling",
            ChartPatternType::FallingWedge => "Bullish reversal - consider buying",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPattern {
    #[serde(rename = "type")]
    pub pattern_type: ChartPatternType,
    pub confidence: f64, // (0, 1]
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_range: PriceRange,
    pub recommendation: String,
}

impl ChartPattern {
    fn new(pattern_type: ChartPatternType, confidence: f64, bars: &[Bar]) -> Self {
        let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        Self {
            pattern_type,
            confidence,
            start_date: bars[0].timestamp,
            end_date: bars[bars.len() - 1].timestamp,
            price_range: PriceRange { low, high },
            recommendation: pattern_type.recommendation().to_string(),
        }
    }
}

/// Run every chart detector. Fewer than [`MIN_CHART_BARS`] bars yields nothing.
pub fn detect_chart_patterns(bars: &[Bar]) -> Vec<ChartPattern> {
    if bars.len() < MIN_CHART_BARS {
        return Vec::new();
    }

    let mut patterns = Vec::new();
    patterns.extend(detect_head_and_shoulders(bars));
    patterns.extend(detect_double_patterns(bars));
    patterns.extend(detect_triangles(bars));
    patterns.extend(detect_flags(bars));
    patterns.extend(detect_wedges(bars));

    patterns.retain(|p| p.confidence > MIN_CHART_CONFIDENCE);
    patterns
}

fn argmax_high(bars: &[Bar], from: usize, to: usize) -> usize {
    (from..=to).fold(from, |best, i| if bars[i].high > bars[best].high { i } else { best })
}

/// Head & shoulders: a central peak more than 2% above two shoulders of
/// similar height placed roughly symmetrically around it.
pub fn detect_head_and_shoulders(bars: &[Bar]) -> Vec<ChartPattern> {
    let mut patterns = Vec::new();
    let half = HEAD_SHOULDERS_WINDOW / 2;
    if bars.len() < HEAD_SHOULDERS_WINDOW + 1 {
        return patterns;
    }

    let mut i = half;
    while i + half < bars.len() {
        let head = bars[i].high;
        let is_center_peak = (i - 2..=i + 2).all(|j| bars[j].high <= head);
        if !is_center_peak {
            i += 1;
            continue;
        }

        let left = argmax_high(bars, i - half, i - 3);
        let right = argmax_high(bars, i + 3, i + half);
        let left_high = bars[left].high;
        let right_high = bars[right].high;

        let shoulders_max = left_high.max(right_high);
        let height_ratio = if shoulders_max > 0.0 {
            left_high.min(right_high) / shoulders_max
        } else {
            0.0
        };
        let dl = (i - left) as f64;
        let dr = (right - i) as f64;
        let symmetry = (dl - dr).abs() / (dl + dr);

        if head > left_high * 1.02 && head > right_high * 1.02 && symmetry < 0.3 && height_ratio > 0.9 {
            let confidence = height_ratio * (1.0 - symmetry) * 0.8;
            patterns.push(ChartPattern::new(
                ChartPatternType::HeadAndShoulders,
                confidence,
                &bars[left..=right],
            ));
            i = right + 1;
        } else {
            i += 1;
        }
    }

    patterns
}

/// Indices whose high (peaks) or low (troughs) is the extreme of a ±5 bar neighbourhood
pub fn local_extrema(bars: &[Bar], neighborhood: usize) -> (Vec<usize>, Vec<usize>) {
    let mut peaks = Vec::new();
    let mut troughs = Vec::new();
    if bars.len() < 2 * neighborhood + 1 {
        return (peaks, troughs);
    }

    for i in neighborhood..bars.len() - neighborhood {
        let window = &bars[i - neighborhood..=i + neighborhood];
        let is_peak = window
            .iter()
            .enumerate()
            .all(|(k, b)| k == neighborhood || b.high < bars[i].high);
        let is_trough = window
            .iter()
            .enumerate()
            .all(|(k, b)| k == neighborhood || b.low > bars[i].low);
        if is_peak {
            peaks.push(i);
        }
        if is_trough {
            troughs.push(i);
        }
    }

    (peaks, troughs)
}

/// Double top / double bottom: the two most recent extrema up to each scan
/// point, within 3% of each other and 6 to 19 bars apart.
pub fn detect_double_patterns(bars: &[Bar]) -> Vec<ChartPattern> {
    let mut patterns = Vec::new();
    let (peaks, troughs) = local_extrema(bars, EXTREMA_NEIGHBORHOOD);

    let mut check = |indices: &[usize], price: fn(&Bar) -> f64, pattern_type: ChartPatternType| {
        for pair in indices.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let separation = second - first;
            if separation <= EXTREMA_NEIGHBORHOOD || separation >= DOUBLE_WINDOW + 5 {
                continue;
            }
            let (a, b) = (price(&bars[first]), price(&bars[second]));
            let reference = a.max(b);
            if reference <= 0.0 {
                continue;
            }
            let height_diff = (a - b).abs() / reference;
            if height_diff < 0.03 {
                let confidence = (1.0 - height_diff) * 0.7;
                patterns.push(ChartPattern::new(pattern_type, confidence, &bars[first..=second]));
            }
        }
    };

    check(&peaks, |b| b.high, ChartPatternType::DoubleTop);
    check(&troughs, |b| b.low, ChartPatternType::DoubleBottom);

    patterns
}

fn trendline_slopes(window: &[Bar]) -> (f64, f64) {
    let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
    (stats::trend_slope(&highs), stats::trend_slope(&lows))
}

/// Classify a window's trendlines as a triangle, if any
fn classify_triangle(high_slope: f64, low_slope: f64) -> Option<(ChartPatternType, f64)> {
    if high_slope.abs() < 0.001 && low_slope > 0.01 {
        let confidence = (0.6 + low_slope.abs() * 10.0).min(0.8);
        return Some((ChartPatternType::AscendingTriangle, confidence));
    }
    if low_slope.abs() < 0.001 && high_slope < -0.01 {
        let confidence = (0.6 + high_slope.abs() * 10.0).min(0.8);
        return Some((ChartPatternType::DescendingTriangle, confidence));
    }
    if high_slope < -0.005 && low_slope > 0.005 {
        let convergence = high_slope.abs() + low_slope.abs();
        let confidence = (0.6 + convergence * 5.0).min(0.75);
        return Some((ChartPatternType::SymmetricalTriangle, confidence));
    }
    None
}

pub fn detect_triangles(bars: &[Bar]) -> Vec<ChartPattern> {
    scan_windows(bars, TRIANGLE_WINDOW, |window| {
        let (high_slope, low_slope) = trendline_slopes(window);
        classify_triangle(high_slope, low_slope)
    })
}

/// Rising wedge: both lines climb with support steeper than resistance.
/// Falling wedge: both lines fall with resistance steeper than support.
pub fn detect_wedges(bars: &[Bar]) -> Vec<ChartPattern> {
    const MIN_CONVERGENCE: f64 = 1e-9;
    scan_windows(bars, WEDGE_WINDOW, |window| {
        let (high_slope, low_slope) = trendline_slopes(window);
        if high_slope > 0.0 && low_slope > 0.0 && low_slope - high_slope > MIN_CONVERGENCE {
            Some((ChartPatternType::RisingWedge, 0.7))
        } else if high_slope < 0.0 && low_slope < 0.0 && low_slope - high_slope > MIN_CONVERGENCE {
            Some((ChartPatternType::FallingWedge, 0.7))
        } else {
            None
        }
    })
}

/// Flags: a pole moving more than 5% over 10 bars followed by a 15 bar
/// consolidation that drifts against the pole within half its range.
pub fn detect_flags(bars: &[Bar]) -> Vec<ChartPattern> {
    let mut patterns = Vec::new();
    let total = FLAG_POLE_WINDOW + FLAG_WINDOW;
    if bars.len() < total {
        return patterns;
    }

    let mut start = 0;
    while start + total <= bars.len() {
        let pole = &bars[start..start + FLAG_POLE_WINDOW];
        let flag = &bars[start + FLAG_POLE_WINDOW..start + total];

        let pole_start = pole[0].close;
        let trend_strength = if pole_start > 0.0 {
            (pole[pole.len() - 1].close - pole_start) / pole_start
        } else {
            0.0
        };

        let range_of = |w: &[Bar]| {
            let high = w.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let low = w.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            high - low
        };
        let flag_direction = flag[flag.len() - 1].close - flag[0].close;

        let is_flag = trend_strength.abs() > 0.05
            && range_of(flag) < range_of(pole) * 0.5
            && flag_direction * trend_strength < 0.0;

        if is_flag {
            let pattern_type = if trend_strength > 0.0 {
                ChartPatternType::BullFlag
            } else {
                ChartPatternType::BearFlag
            };
            let confidence = (trend_strength.abs() * 10.0).min(0.8);
            patterns.push(ChartPattern::new(pattern_type, confidence, &bars[start..start + total]));
            start += total;
        } else {
            start += 1;
        }
    }

    patterns
}

fn scan_windows<F>(bars: &[Bar], window: usize, classify: F) -> Vec<ChartPattern>
where
    F: Fn(&[Bar]) -> Option<(ChartPatternType, f64)>,
{
    let mut patterns = Vec::new();
    let mut start = 0;
    while start + window <= bars.len() {
        let slice = &bars[start..start + window];
        match classify(slice) {
            Some((pattern_type, confidence)) => {
                patterns.push(ChartPattern::new(pattern_type, confidence, slice));
                start += window;
            }
            None => start += 1,
        }
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bar_at(day: usize, close: f64, high: f64, low: f64) -> Bar {
        Bar {
            timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::days(day as i64),
            open: close,
            high,
            low,
            close,
            volume: 1_000_000.0,
        }
    }

    fn from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar_at(i, c, c + 0.5, c - 0.5))
            .collect()
    }

    #[test]
    fn test_requires_fifty_bars() {
        let bars = from_closes(&vec![100.0; 49]);
        assert!(detect_chart_patterns(&bars).is_empty());
    }

    #[test]
    fn test_monotonic_uptrend_has_no_patterns() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar_at(i, c, c + 1.0, c - 1.0))
            .collect();
        assert!(detect_chart_patterns(&bars).is_empty());
    }

    #[test]
    fn test_head_and_shoulders() {
        // flat 100 with shoulders at 110 (idx 15, 35) and a head at 120 (idx 25)
        let mut closes = vec![100.0; 60];
        closes[15] = 110.0;
        closes[25] = 120.0;
        closes[35] = 110.0;
        let bars = from_closes(&closes);

        let found = detect_head_and_shoulders(&bars);
        assert_eq!(found.len(), 1);
        let p = &found[0];
        assert_eq!(p.pattern_type, ChartPatternType::HeadAndShoulders);
        assert!((p.confidence - 0.8).abs() < 1e-9);
        assert_eq!(p.start_date, bars[15].timestamp);
        assert_eq!(p.end_date, bars[35].timestamp);
        assert!((p.price_range.high - 120.5).abs() < 1e-9);
    }

    #[test]
    fn test_double_top() {
        let mut closes = vec![100.0; 60];
        closes[20] = 110.0;
        closes[30] = 110.5;
        let bars = from_closes(&closes);

        let found = detect_double_patterns(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::DoubleTop);
        assert!(found[0].confidence > 0.6 && found[0].confidence <= 0.7);
    }

    #[test]
    fn test_double_bottom_rejects_wide_gap() {
        let mut closes = vec![100.0; 60];
        closes[10] = 90.0;
        closes[40] = 90.0;
        let bars = from_closes(&closes);
        assert!(detect_double_patterns(&bars).is_empty());
    }

    #[test]
    fn test_ascending_triangle() {
        // flat resistance at 110, lows climbing 0.2 per bar
        let bars: Vec<Bar> = (0..25)
            .map(|i| {
                let low = 100.0 + 0.2 * i as f64;
                bar_at(i, (low + 110.0) / 2.0, 110.0, low)
            })
            .collect();
        let found = detect_triangles(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::AscendingTriangle);
        assert!((found[0].confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_symmetrical_triangle_capped() {
        let bars: Vec<Bar> = (0..25)
            .map(|i| {
                let high = 120.0 - 0.2 * i as f64;
                let low = 100.0 + 0.2 * i as f64;
                bar_at(i, 110.0, high, low)
            })
            .collect();
        let found = detect_triangles(&bars);
        assert_eq!(found[0].pattern_type, ChartPatternType::SymmetricalTriangle);
        assert!((found[0].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_rising_wedge() {
        let bars: Vec<Bar> = (0..20)
            .map(|i| {
                let high = 110.0 + 0.1 * i as f64;
                let low = 100.0 + 0.4 * i as f64;
                bar_at(i, (high + low) / 2.0, high, low)
            })
            .collect();
        let found = detect_wedges(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::RisingWedge);
        assert_eq!(found[0].confidence, 0.7);
    }

    #[test]
    fn test_bull_flag() {
        // 10 bar pole from 100 to 109, then a tight drift down
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..15).map(|i| 109.0 - 0.1 * i as f64));
        let bars = from_closes(&closes);

        let found = detect_flags(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::BullFlag);
        assert!((found[0].confidence - 0.8).abs() < 1e-9);
    }
    #[test]
    fn test_head_and_shoulders_rejects_lopsided_or_uneven_shoulders() {
        // right shoulder only 3 bars from the head: symmetry 7/13
        let mut closes = vec![100.0; 60];
        closes[15] = 110.0;
        closes[25] = 120.0;
        closes[28] = 110.0;
        assert!(detect_head_and_shoulders(&from_closes(&closes)).is_empty());

        // symmetric, but shoulders 110 and 95 give a height ratio below 0.9
        let mut closes = vec![100.0; 26];
        closes.extend(vec![80.0; 34]);
        closes[15] = 110.0;
        closes[25] = 120.0;
        closes[35] = 95.0;
        assert!(detect_head_and_shoulders(&from_closes(&closes)).is_empty());
    }

    #[test]
    fn test_double_bottom() {
        let mut closes = vec![100.0; 60];
        closes[20] = 90.0;
        closes[30] = 90.5;
        let bars = from_closes(&closes);

        let found = detect_double_patterns(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::DoubleBottom);
        assert!(found[0].confidence > 0.69 && found[0].confidence <= 0.7);
        assert_eq!(found[0].recommendation, "Bullish reversal - consider buying");
    }

    #[test]
    fn test_descending_triangle() {
        // flat support at 100, highs falling 0.2 per bar
        let bars: Vec<Bar> = (0..25)
            .map(|i| {
                let high = 120.0 - 0.2 * i as f64;
                bar_at(i, (high + 100.0) / 2.0, high, 100.0)
            })
            .collect();
        let found = detect_triangles(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::DescendingTriangle);
        assert!((found[0].confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_falling_wedge() {
        let bars: Vec<Bar> = (0..20)
            .map(|i| {
                let high = 120.0 - 0.4 * i as f64;
                let low = 100.0 - 0.1 * i as f64;
                bar_at(i, (high + low) / 2.0, high, low)
            })
            .collect();
        let found = detect_wedges(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::FallingWedge);
        assert_eq!(found[0].confidence, 0.7);
    }

    #[test]
    fn test_bear_flag() {
        // 10 bar pole from 109 down to 100, then a tight drift up
        let mut closes: Vec<f64> = (0..10).map(|i| 109.0 - i as f64).collect();
        closes.extend((0..15).map(|i| 100.0 + 0.1 * i as f64));
        let bars = from_closes(&closes);

        let found = detect_flags(&bars);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_type, ChartPatternType::BearFlag);
        assert!((found[0].confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_weak_flag_is_filtered() {
        // pole climbs 5.4%, so the flag scores 0.54
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + 0.6 * i as f64).collect();
        closes.extend((0..15).map(|i| 105.4 - 0.05 * i as f64));
        closes.extend(vec![104.7; 25]);
        let bars = from_closes(&closes);

        let found = detect_flags(&bars[..25]);
        assert_eq!(found.len(), 1);
        assert!((found[0].confidence - 0.54).abs() < 1e-9);

        let all = detect_chart_patterns(&bars);
        assert!(all
            .iter()
            .all(|p| !matches!(p.pattern_type, ChartPatternType::BullFlag | ChartPatternType::BearFlag)));
    }
}
