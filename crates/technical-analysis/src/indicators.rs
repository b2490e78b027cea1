use analysis_core::{stats, Bar, MarketState};

const TRADING_DAYS: f64 = 252.0;

/// Relative Strength Index (Wilder smoothing)
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(gains.len() - period + 1);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Close-to-close simple returns
pub fn daily_returns(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect()
}

/// Annualised volatility in percent from daily returns
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    stats::std_dev(returns) * TRADING_DAYS.sqrt() * 100.0
}

/// Derive the regression input snapshot from a bar series: last-bar price
/// change, volume against the trailing 20-bar average, annualised volatility
/// and RSI(14). Missing history falls back to neutral values.
pub fn market_state(bars: &[Bar]) -> MarketState {
    let mut state = MarketState {
        price_change: 0.0,
        volume_ratio: 1.0,
        volatility: 0.0,
        rsi: 50.0,
        holding_days: 0,
    };

    let n = bars.len();
    if n < 2 {
        return state;
    }

    let prev_close = bars[n - 2].close;
    if prev_close > 0.0 {
        state.price_change = (bars[n - 1].close - prev_close) / prev_close * 100.0;
    }

    let lookback = &bars[n.saturating_sub(21)..n - 1];
    let avg_volume = stats::mean(&lookback.iter().map(|b| b.volume).collect::<Vec<_>>());
    if avg_volume > 0.0 {
        state.volume_ratio = bars[n - 1].volume / avg_volume;
    }

    state.volatility = annualized_volatility(&daily_returns(bars));

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    if let Some(&last) = rsi(&closes, 14).last() {
        state.rsi = last;
    }

    state
}
