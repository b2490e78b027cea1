use analysis_core::stats::z_score_of;

use crate::models::{AnomalyReport, AnomalySeverity, FeatureAnomaly, MarketObservation};

/// Fewer historical observations than this yields a non-anomalous report
pub const MIN_ANOMALY_HISTORY: usize = 20;
const ANOMALY_Z: f64 = 3.0;
const HIGH_SEVERITY_Z: f64 = 4.0;

fn score_feature(name: &str, value: f64, history: &[f64]) -> FeatureAnomaly {
    let z_score = z_score_of(value, history);
    let is_anomaly = z_score.abs() > ANOMALY_Z;
    let severity = if !is_anomaly {
        None
    } else if z_score.abs() > HIGH_SEVERITY_Z {
        Some(AnomalySeverity::High)
    } else {
        Some(AnomalySeverity::Medium)
    };

    FeatureAnomaly {
        feature: name.to_string(),
        value,
        z_score,
        is_anomaly,
        severity,
    }
}

/// Z-score the current observation's volume, volatility and price change
/// against history. Every feature is reported; the report is anomalous if
/// any one of them is.
pub fn detect_anomalies(current: &MarketObservation, historical: &[MarketObservation]) -> AnomalyReport {
    if historical.len() < MIN_ANOMALY_HISTORY {
        return AnomalyReport::default();
    }

    let volumes: Vec<f64> = historical.iter().map(|o| o.volume).collect();
    let volatilities: Vec<f64> = historical.iter().map(|o| o.volatility).collect();
    let changes: Vec<f64> = historical.iter().map(|o| o.price_change).collect();

    let anomalies = vec![
        score_feature("volume", current.volume, &volumes),
        score_feature("volatility", current.volatility, &volatilities),
        score_feature("priceChange", current.price_change, &changes),
    ];
    let is_anomaly = anomalies.iter().any(|a| a.is_anomaly);

    if is_anomaly {
        tracing::debug!(
            "Anomalous market observation: {:?}",
            anomalies.iter().filter(|a| a.is_anomaly).map(|a| &a.feature).collect::<Vec<_>>()
        );
    }

    AnomalyReport {
        is_anomaly,
        anomalies: Some(anomalies),
    }
}

/// Split a bar-derived observation series into (current, history) and run
/// the detector on it.
pub fn detect_anomalies_in_series(series: &[MarketObservation]) -> AnomalyReport {
    match series.split_last() {
        Some((current, history)) => detect_anomalies(current, history),
        None => AnomalyReport::default(),
    }
}
