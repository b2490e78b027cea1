/// Statistics shared by the estimators.
///
/// Everything here is a pure function of the slice it is given. Degenerate
/// inputs (empty slices, zero variance) return neutral values instead of NaN so
/// callers can feed the output straight into thresholds.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Compute sample standard deviation.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Compute population standard deviation (divides by n).
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Compute the z-score of `value` relative to `data`.
/// Returns 0.0 if data has insufficient variance.
pub fn z_score_of(value: f64, data: &[f64]) -> f64 {
    let sd = population_std_dev(data);
    if sd < f64::EPSILON {
        return 0.0;
    }
    (value - mean(data)) / sd
}

/// Value at the given percentile (0-100) of an already sorted slice, using the
/// lower index `floor(p * n)`.
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((pct / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Sort a copy of `data` ascending. NaN compares as equal.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut out = data.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Ordinary least squares fit of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `(x, y)` pairs. `None` when fewer than two points are
/// given, the slices differ in length, or `x` has no variance.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let x_sum: f64 = x.iter().sum();
    let y_sum: f64 = y.iter().sum();
    let xy_sum: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let x_squared_sum: f64 = x.iter().map(|a| a * a).sum();

    let denominator = n * x_squared_sum - x_sum.powi(2);
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    let slope = (n * xy_sum - x_sum * y_sum) / denominator;
    let intercept = (y_sum - slope * x_sum) / n;
    Some(LinearFit { slope, intercept })
}

/// Least-squares slope of a series against its index (units per bar).
pub fn trend_slope(series: &[f64]) -> f64 {
    let x: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    linear_regression(&x, series).map(|f| f.slope).unwrap_or(0.0)
}
