pub mod anomaly;
pub mod estimator;
pub mod models;
pub mod monte_carlo;
#[cfg(test)]
mod tests;

pub use anomaly::{detect_anomalies, detect_anomalies_in_series, MIN_ANOMALY_HISTORY};
pub use estimator::{rule_based_params, ModelSnapshot, RegressionCoefficients, RiskEstimator};
pub use models::*;
pub use monte_carlo::{monte_carlo_risk_simulation, MAX_ITERATIONS};
