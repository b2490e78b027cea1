#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::Bar;
    use chrono::Utc;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    // Helper function to create bars from closes with a fixed volume
    fn bars_from(closes: &[f64], volume: f64) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc::now() - chrono::Duration::days((closes.len() - i) as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume,
            })
            .collect()
    }

    #[test]
    fn test_rsi_basic() {
        let prices = sample_prices();
        let result = rsi(&prices, 14);

        // 19 changes, first value after 14 of them
        assert_eq!(result.len(), 6);
        for &value in &result {
            assert!(value >= 0.0 && value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let data = vec![1.0, 2.0, 3.0];
        let result = rsi(&data, 14);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_rsi_overbought_and_flat() {
        let uptrend: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(*rsi(&uptrend, 14).last().unwrap() > 70.0);

        let flat = vec![100.0; 20];
        assert_eq!(*rsi(&flat, 14).last().unwrap(), 50.0);
    }

    #[test]
    fn test_daily_returns_and_volatility() {
        let bars = bars_from(&[100.0, 110.0, 99.0], 1000.0);
        let returns = daily_returns(&bars);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);

        let flat = bars_from(&[100.0; 10], 1000.0);
        assert_eq!(annualized_volatility(&daily_returns(&flat)), 0.0);
    }

    #[test]
    fn test_market_state_from_bars() {
        let mut bars = bars_from(&sample_prices(), 1000.0);
        let last = bars.len() - 1;
        bars[last].volume = 3000.0;

        let state = market_state(&bars);
        let expected_change = (45.64 - 46.22) / 46.22 * 100.0;
        assert!((state.price_change - expected_change).abs() < 1e-9);
        assert!((state.volume_ratio - 3.0).abs() < 1e-9);
        assert!(state.volatility > 0.0);
        assert!(state.rsi > 0.0 && state.rsi < 100.0);
        assert_eq!(state.holding_days, 0);
    }

    #[test]
    fn test_market_state_short_series_is_neutral() {
        let state = market_state(&bars_from(&[100.0], 1000.0));
        assert_eq!(state.price_change, 0.0);
        assert_eq!(state.volume_ratio, 1.0);
        assert_eq!(state.rsi, 50.0);
    }
}
