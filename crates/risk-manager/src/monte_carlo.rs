use std::f64::consts::PI;

use analysis_core::stats::{mean, percentile_sorted, population_std_dev, sorted};
use analysis_core::AnalysisError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::models::{PortfolioPosition, RiskSimulationSummary};

/// Hard ceiling on simulated paths per request
pub const MAX_ITERATIONS: usize = 100_000;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard normal draw via Box-Muller
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // 1 - [0, 1) keeps u1 away from zero so ln stays finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

struct PathOutcome {
    final_value: f64,
    max_drawdown: f64,
}

/// Walk every position forward `days` times with independent normal daily
/// returns and track the drawdown of the portfolio total, normalised to 1.
fn simulate_path(
    portfolio: &[PortfolioPosition],
    daily_sd: &[f64],
    initial_value: f64,
    days: u32,
    rng: &mut StdRng,
) -> PathOutcome {
    let mut values: Vec<f64> = portfolio.iter().map(|p| p.value).collect();
    let mut peak = 1.0_f64;
    let mut max_drawdown = 0.0_f64;

    for _ in 0..days {
        for (value, sd) in values.iter_mut().zip(daily_sd) {
            let daily_return = sd * standard_normal(rng);
            *value = (*value * (1.0 + daily_return)).max(0.0);
        }
        let equity = values.iter().sum::<f64>() / initial_value;
        if equity > peak {
            peak = equity;
        }
        let drawdown = (peak - equity) / peak;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }

    PathOutcome {
        final_value: values.iter().sum(),
        max_drawdown,
    }
}

/// Simulate `iterations` random portfolio paths over `days` trading days.
///
/// Per-path seeds are drawn from `rng` up front and the paths then run in
/// parallel, so a seeded `rng` gives the same summary regardless of thread
/// scheduling. Iterations above [`MAX_ITERATIONS`] are capped.
pub fn monte_carlo_risk_simulation<R: Rng + ?Sized>(
    portfolio: &[PortfolioPosition],
    days: u32,
    iterations: usize,
    risk_free_rate: f64,
    rng: &mut R,
) -> Result<RiskSimulationSummary, AnalysisError> {
    if portfolio.is_empty() {
        return Err(AnalysisError::InvalidInput("portfolio is empty".to_string()));
    }
    if iterations == 0 {
        return Err(AnalysisError::InvalidInput("iterations must be positive".to_string()));
    }
    if portfolio
        .iter()
        .any(|p| !p.value.is_finite() || p.value < 0.0 || !p.volatility.is_finite() || p.volatility < 0.0)
    {
        return Err(AnalysisError::InvalidInput(
            "position values and volatilities must be finite and non-negative".to_string(),
        ));
    }
    let initial_value: f64 = portfolio.iter().map(|p| p.value).sum();
    if initial_value <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "portfolio total value must be positive".to_string(),
        ));
    }

    let iterations = if iterations > MAX_ITERATIONS {
        tracing::warn!("Capping Monte Carlo iterations from {} to {}", iterations, MAX_ITERATIONS);
        MAX_ITERATIONS
    } else {
        iterations
    };

    let daily_sd: Vec<f64> = portfolio
        .iter()
        .map(|p| p.volatility / 100.0 / TRADING_DAYS_PER_YEAR.sqrt())
        .collect();
    let seeds: Vec<u64> = (0..iterations).map(|_| rng.gen()).collect();

    let outcomes: Vec<PathOutcome> = seeds
        .par_iter()
        .map(|&seed| {
            let mut path_rng = StdRng::seed_from_u64(seed);
            simulate_path(portfolio, &daily_sd, initial_value, days, &mut path_rng)
        })
        .collect();

    let finals: Vec<f64> = outcomes.iter().map(|o| o.final_value).collect();
    let drawdowns: Vec<f64> = outcomes.iter().map(|o| o.max_drawdown).collect();
    let total_returns: Vec<f64> = finals.iter().map(|v| (v - initial_value) / initial_value).collect();
    let sorted_finals = sorted(&finals);

    let return_sd = population_std_dev(&total_returns);
    let sharpe_ratio = if return_sd > 0.0 {
        (mean(&total_returns) - risk_free_rate / TRADING_DAYS_PER_YEAR) / return_sd * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let losses = finals.iter().filter(|&&v| v < initial_value).count();

    tracing::debug!(
        "Monte Carlo: {} paths over {} days for {} positions",
        iterations,
        days,
        portfolio.len()
    );

    Ok(RiskSimulationSummary {
        iterations,
        days,
        initial_value,
        expected_value: mean(&finals),
        var95: percentile_sorted(&sorted_finals, 5.0),
        var99: percentile_sorted(&sorted_finals, 1.0),
        best_case: percentile_sorted(&sorted_finals, 95.0),
        worst_case: sorted_finals[0],
        expected_drawdown: mean(&drawdowns),
        worst_case_drawdown: drawdowns.iter().cloned().fold(0.0, f64::max),
        probability_of_loss: losses as f64 / iterations as f64,
        sharpe_ratio,
    })
}
