use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use analysis_core::stats::{linear_regression, LinearFit};
use analysis_core::{AnalysisError, MarketState};
use serde::{Deserialize, Serialize};

use crate::models::*;

/// Training rows kept for refits; oldest rows are evicted first
pub const MAX_TRAINING_ROWS: usize = 100;
/// Smaller training batches are ignored
pub const MIN_TRAINING_ROWS: usize = 5;

const STOP_LOSS_BOUNDS: (f64, f64) = (2.0, 15.0);
const TAKE_PROFIT_BOUNDS: (f64, f64) = (3.0, 20.0);
const CONFIDENCE_BOUNDS: (f64, f64) = (30.0, 95.0);

/// (volatility, stop-loss, take-profit) rows the default estimator starts from
const SEED_DATA: [(f64, f64, f64); 8] = [
    (8.0, 2.5, 8.0),
    (12.0, 3.0, 9.0),
    (16.0, 3.5, 10.0),
    (20.0, 4.5, 11.0),
    (25.0, 5.0, 12.0),
    (32.0, 6.5, 14.0),
    (40.0, 8.0, 16.0),
    (55.0, 10.0, 18.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionCoefficients {
    pub stop_loss_slope: f64,
    pub stop_loss_intercept: f64,
    pub take_profit_slope: f64,
    pub take_profit_intercept: f64,
}

impl RegressionCoefficients {
    fn stop_loss(&self) -> LinearFit {
        LinearFit { slope: self.stop_loss_slope, intercept: self.stop_loss_intercept }
    }

    fn take_profit(&self) -> LinearFit {
        LinearFit { slope: self.take_profit_slope, intercept: self.take_profit_intercept }
    }
}

/// Persisted form of the estimator: coefficients plus the training buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    pub coefficients: Option<RegressionCoefficients>,
    pub training: Vec<TrainingRow>,
}

#[derive(Debug, Clone, Default)]
struct RiskModel {
    coefficients: Option<RegressionCoefficients>,
    buffer: VecDeque<TrainingRow>,
}

impl RiskModel {
    fn fit(buffer: VecDeque<TrainingRow>) -> Self {
        let coefficients = if buffer.len() >= MIN_TRAINING_ROWS {
            let x: Vec<f64> = buffer.iter().map(|r| r.features[0]).collect();
            let sl: Vec<f64> = buffer.iter().map(|r| r.targets[0]).collect();
            let tp: Vec<f64> = buffer.iter().map(|r| r.targets[1]).collect();
            match (linear_regression(&x, &sl), linear_regression(&x, &tp)) {
                (Some(sl_fit), Some(tp_fit)) => Some(RegressionCoefficients {
                    stop_loss_slope: sl_fit.slope,
                    stop_loss_intercept: sl_fit.intercept,
                    take_profit_slope: tp_fit.slope,
                    take_profit_intercept: tp_fit.intercept,
                }),
                _ => {
                    tracing::warn!("Risk regression could not be fit (no volatility spread in {} rows)", buffer.len());
                    None
                }
            }
        } else {
            None
        };

        Self { coefficients, buffer }
    }

    /// `Ok(None)` when untrained
    fn predict(&self, volatility: f64) -> Result<Option<(f64, f64)>, AnalysisError> {
        let Some(coefficients) = &self.coefficients else {
            return Ok(None);
        };
        let stop_loss = coefficients.stop_loss().predict(volatility);
        let take_profit = coefficients.take_profit().predict(volatility);
        if !stop_loss.is_finite() || !take_profit.is_finite() {
            return Err(AnalysisError::ModelFit(format!(
                "non-finite prediction for volatility {}",
                volatility
            )));
        }
        Ok(Some((
            stop_loss.clamp(STOP_LOSS_BOUNDS.0, STOP_LOSS_BOUNDS.1),
            take_profit.clamp(TAKE_PROFIT_BOUNDS.0, TAKE_PROFIT_BOUNDS.1),
        )))
    }
}

/// Stop-loss / take-profit sizing from a volatility regression, with a
/// rule-based table when the regression is untrained or fails.
///
/// Reads take a cheap snapshot of the current model; `train` refits off-lock
/// and swaps the new model in, so a refit never blocks or corrupts a read.
pub struct RiskEstimator {
    model: RwLock<Arc<RiskModel>>,
    train_lock: Mutex<()>,
}

impl RiskEstimator {
    /// Estimator fit on the built-in seed dataset
    pub fn new() -> Self {
        let buffer = SEED_DATA
            .iter()
            .map(|&(volatility, stop_loss, take_profit)| TrainingRow {
                features: [volatility, 50.0, 1.0, 0.0, 0.0],
                targets: [stop_loss, take_profit],
            })
            .collect();
        Self::from_model(RiskModel::fit(buffer))
    }

    /// Estimator with no regression; every call uses the rule table until
    /// `train` supplies enough rows.
    pub fn untrained() -> Self {
        Self::from_model(RiskModel::default())
    }

    fn from_model(model: RiskModel) -> Self {
        Self {
            model: RwLock::new(Arc::new(model)),
            train_lock: Mutex::new(()),
        }
    }

    fn current_model(&self) -> Arc<RiskModel> {
        match self.model.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn swap_model(&self, model: RiskModel) {
        let model = Arc::new(model);
        match self.model.write() {
            Ok(mut guard) => *guard = model,
            Err(poisoned) => *poisoned.into_inner() = model,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.current_model().coefficients.is_some()
    }

    pub fn training_rows(&self) -> usize {
        self.current_model().buffer.len()
    }

    pub fn get_optimal_risk_params(&self, state: &MarketState) -> RiskParams {
        let risk_level = RiskLevel::from_volatility(state.volatility);

        let (mut stop_loss, mut take_profit) = match self.current_model().predict(state.volatility) {
            Ok(Some(prediction)) => prediction,
            Ok(None) => rule_based_params(risk_level, state.rsi),
            Err(e) => {
                tracing::warn!("Risk regression failed, using rule table: {}", e);
                rule_based_params(risk_level, state.rsi)
            }
        };

        if state.volume_ratio > 2.0 {
            stop_loss *= 0.9;
        } else if state.volume_ratio < 0.5 {
            stop_loss *= 1.1;
        }
        if state.price_change.abs() > 5.0 {
            stop_loss *= 1.2;
            take_profit *= 0.9;
        }

        if !stop_loss.is_finite() || !take_profit.is_finite() {
            let (sl, tp) = rule_based_params(risk_level, 50.0);
            stop_loss = sl;
            take_profit = tp;
        }

        RiskParams {
            stop_loss: stop_loss.clamp(STOP_LOSS_BOUNDS.0, STOP_LOSS_BOUNDS.1),
            take_profit: take_profit.clamp(TAKE_PROFIT_BOUNDS.0, TAKE_PROFIT_BOUNDS.1),
            confidence: confidence_for(risk_level, state),
            risk_level,
        }
    }

    /// Append the most recent trades to the training buffer and refit.
    /// Batches smaller than [`MIN_TRAINING_ROWS`] are ignored.
    pub fn train(&self, trades: &[TradeRecord]) -> TrainingOutcome {
        if trades.len() < MIN_TRAINING_ROWS {
            tracing::debug!(
                "Skipping risk model training: {} rows (need {})",
                trades.len(),
                MIN_TRAINING_ROWS
            );
            return TrainingOutcome {
                rows_accepted: 0,
                buffer_size: self.training_rows(),
                refitted: false,
            };
        }

        let _guard = match self.train_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut buffer = self.current_model().buffer.clone();
        let start = trades.len().saturating_sub(MAX_TRAINING_ROWS);
        let mut rows_accepted = 0;
        for trade in &trades[start..] {
            let row = TrainingRow::from(trade);
            if row.features.iter().chain(row.targets.iter()).any(|v| !v.is_finite()) {
                continue;
            }
            buffer.push_back(row);
            rows_accepted += 1;
            while buffer.len() > MAX_TRAINING_ROWS {
                buffer.pop_front();
            }
        }

        let model = RiskModel::fit(buffer);
        let outcome = TrainingOutcome {
            rows_accepted,
            buffer_size: model.buffer.len(),
            refitted: model.coefficients.is_some(),
        };
        self.swap_model(model);

        tracing::info!(
            "Risk model retrained: {} new rows, {} in buffer",
            outcome.rows_accepted,
            outcome.buffer_size
        );
        outcome
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        let model = self.current_model();
        ModelSnapshot {
            coefficients: model.coefficients,
            training: model.buffer.iter().copied().collect(),
        }
    }

    /// Replace the current model with a snapshot. Snapshots without
    /// coefficients are refit from their training rows.
    pub fn restore(&self, snapshot: ModelSnapshot) -> Result<(), AnalysisError> {
        let mut buffer: VecDeque<TrainingRow> = snapshot.training.into_iter().collect();
        while buffer.len() > MAX_TRAINING_ROWS {
            buffer.pop_front();
        }

        let model = match snapshot.coefficients {
            Some(c) => {
                let values = [
                    c.stop_loss_slope,
                    c.stop_loss_intercept,
                    c.take_profit_slope,
                    c.take_profit_intercept,
                ];
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(AnalysisError::InvalidInput(
                        "model snapshot has non-finite coefficients".to_string(),
                    ));
                }
                RiskModel { coefficients: Some(c), buffer }
            }
            None => RiskModel::fit(buffer),
        };

        let _guard = match self.train_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.swap_model(model);
        Ok(())
    }

    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        let json = serde_json::to_vec_pretty(&self.snapshot())?;
        std::fs::write(path.as_ref(), json)?;
        tracing::info!("Saved risk model to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        let bytes = std::fs::read(path.as_ref())?;
        let snapshot: ModelSnapshot = serde_json::from_slice(&bytes)?;
        self.restore(snapshot)?;
        tracing::info!("Loaded risk model from {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for RiskEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Midpoint of the risk level's static ranges, skewed by RSI extremes:
/// oversold widens the target and tightens the stop, overbought does the opposite.
pub fn rule_based_params(risk_level: RiskLevel, rsi: f64) -> (f64, f64) {
    let (sl_min, sl_max) = risk_level.stop_loss_range();
    let (tp_min, tp_max) = risk_level.take_profit_range();
    let mut stop_loss = (sl_min + sl_max) / 2.0;
    let mut take_profit = (tp_min + tp_max) / 2.0;

    if rsi < 30.0 {
        take_profit *= 1.2;
        stop_loss *= 0.9;
    } else if rsi > 70.0 {
        take_profit *= 0.9;
        stop_loss *= 1.2;
    }

    (stop_loss, take_profit)
}

fn confidence_for(risk_level: RiskLevel, state: &MarketState) -> f64 {
    let mut confidence = risk_level.base_confidence();
    if state.volume_ratio > 0.8 && state.volume_ratio < 1.5 {
        confidence += 10.0;
    }
    if state.rsi < 20.0 || state.rsi > 80.0 {
        confidence -= 10.0;
    }
    if state.price_change.abs() > 10.0 {
        confidence -= 15.0;
    }
    confidence.clamp(CONFIDENCE_BOUNDS.0, CONFIDENCE_BOUNDS.1)
}
