#[cfg(test)]
mod estimator_tests {
    use crate::estimator::*;
    use crate::models::*;
    use analysis_core::MarketState;
    use approx::assert_relative_eq;

    fn state(volatility: f64, rsi: f64, volume_ratio: f64, price_change: f64) -> MarketState {
        MarketState {
            price_change,
            volume_ratio,
            volatility,
            rsi,
            holding_days: 0,
        }
    }

    fn trade(volatility: f64, stop_loss: f64, take_profit: f64) -> TradeRecord {
        TradeRecord {
            volatility,
            rsi: 50.0,
            volume_ratio: 1.0,
            price_change: 0.0,
            market_trend: 0.0,
            actual_stop_loss: stop_loss,
            actual_take_profit: take_profit,
        }
    }

    #[test]
    fn test_untrained_low_volatility_uses_table_midpoint() {
        let estimator = RiskEstimator::untrained();
        let params = estimator.get_optimal_risk_params(&state(10.0, 50.0, 1.0, 0.0));

        assert_eq!(params.risk_level, RiskLevel::Low);
        assert_relative_eq!(params.stop_loss, 3.0);
        assert_relative_eq!(params.take_profit, 10.0);
        assert_relative_eq!(params.confidence, 95.0);

        let json = serde_json::to_value(params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "stopLoss": 3.0, "takeProfit": 10.0, "confidence": 95.0, "riskLevel": "low" })
        );
    }

    #[test]
    fn test_oversold_rsi_widens_target() {
        let params = RiskEstimator::untrained().get_optimal_risk_params(&state(10.0, 25.0, 1.0, 0.0));
        assert_relative_eq!(params.stop_loss, 2.7, epsilon = 1e-9);
        assert_relative_eq!(params.take_profit, 12.0, epsilon = 1e-9);
        assert_relative_eq!(params.confidence, 95.0);
    }

    #[test]
    fn test_heavy_volume_tightens_stop() {
        let params = RiskEstimator::untrained().get_optimal_risk_params(&state(10.0, 50.0, 2.5, 0.0));
        assert_relative_eq!(params.stop_loss, 2.7, epsilon = 1e-9);
        assert_relative_eq!(params.take_profit, 10.0);
        // volume ratio outside (0.8, 1.5) earns no bonus
        assert_relative_eq!(params.confidence, 85.0);
    }

    #[test]
    fn test_large_move_in_overbought_high_volatility() {
        let params = RiskEstimator::untrained().get_optimal_risk_params(&state(40.0, 85.0, 1.0, 12.0));
        assert_eq!(params.risk_level, RiskLevel::High);
        // midpoint 8 / 17.5, overbought 9.6 / 15.75, big move 11.52 / 14.175
        assert_relative_eq!(params.stop_loss, 11.52, epsilon = 1e-9);
        assert_relative_eq!(params.take_profit, 14.175, epsilon = 1e-9);
        // 60 + 10 (volume) - 10 (rsi) - 15 (move)
        assert_relative_eq!(params.confidence, 45.0);
    }

    #[test]
    fn test_seeded_model_scales_with_volatility() {
        let estimator = RiskEstimator::new();
        assert!(estimator.is_trained());

        let calm = estimator.get_optimal_risk_params(&state(10.0, 50.0, 1.0, 0.0));
        let wild = estimator.get_optimal_risk_params(&state(50.0, 50.0, 1.0, 0.0));
        assert!(calm.stop_loss < wild.stop_loss);
        assert!(calm.take_profit < wild.take_profit);
        for p in [calm, wild] {
            assert!((2.0..=15.0).contains(&p.stop_loss));
            assert!((3.0..=20.0).contains(&p.take_profit));
            assert!((30.0..=95.0).contains(&p.confidence));
        }
    }

    #[test]
    fn test_predictions_are_clamped() {
        let estimator = RiskEstimator::untrained();
        let trades: Vec<TradeRecord> = [10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .map(|&v| trade(v, 40.0, 40.0))
            .collect();
        let outcome = estimator.train(&trades);
        assert!(outcome.refitted);

        let params = estimator.get_optimal_risk_params(&state(20.0, 50.0, 1.0, 0.0));
        assert_relative_eq!(params.stop_loss, 15.0);
        assert_relative_eq!(params.take_profit, 20.0);
    }

    #[test]
    fn test_small_batches_are_ignored() {
        let estimator = RiskEstimator::untrained();
        let outcome = estimator.train(&[trade(10.0, 3.0, 9.0); 4]);
        assert_eq!(outcome.rows_accepted, 0);
        assert_eq!(outcome.buffer_size, 0);
        assert!(!outcome.refitted);
        assert!(!estimator.is_trained());
    }

    #[test]
    fn test_training_buffer_is_bounded() {
        let estimator = RiskEstimator::new();
        assert_eq!(estimator.training_rows(), 8);

        let trades: Vec<TradeRecord> = (0..150)
            .map(|i| trade(5.0 + i as f64 * 0.3, 3.0, 10.0))
            .collect();
        let outcome = estimator.train(&trades);
        assert_eq!(outcome.rows_accepted, 100);
        assert_eq!(outcome.buffer_size, MAX_TRAINING_ROWS);

        let snapshot = estimator.snapshot();
        // only the most recent trades survive
        assert_relative_eq!(snapshot.training[0].features[0], 5.0 + 50.0 * 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_rows_are_skipped() {
        let estimator = RiskEstimator::untrained();
        let mut trades: Vec<TradeRecord> = (0..6).map(|i| trade(10.0 + i as f64, 3.0, 9.0)).collect();
        trades[2].actual_stop_loss = f64::NAN;
        let outcome = estimator.train(&trades);
        assert_eq!(outcome.rows_accepted, 5);
        assert!(outcome.refitted);
    }

    #[test]
    fn test_save_and_load_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk-model.json");

        let trained = RiskEstimator::new();
        trained.save_model(&path).unwrap();

        let restored = RiskEstimator::untrained();
        restored.load_model(&path).unwrap();
        assert!(restored.is_trained());
        assert_eq!(restored.snapshot().training, trained.snapshot().training);

        let s = state(22.0, 40.0, 1.2, 1.0);
        let before = trained.get_optimal_risk_params(&s);
        let after = restored.get_optimal_risk_params(&s);
        assert_relative_eq!(before.stop_loss, after.stop_loss, epsilon = 1e-9);
        assert_relative_eq!(before.take_profit, after.take_profit, epsilon = 1e-9);
        assert_eq!(before.risk_level, after.risk_level);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = RiskEstimator::untrained();
        assert!(estimator.load_model(dir.path().join("missing.json")).is_err());
        assert!(!estimator.is_trained());
    }

    #[test]
    fn test_restore_rejects_non_finite_coefficients() {
        let estimator = RiskEstimator::untrained();
        let snapshot = ModelSnapshot {
            coefficients: Some(RegressionCoefficients {
                stop_loss_slope: f64::NAN,
                stop_loss_intercept: 1.0,
                take_profit_slope: 0.1,
                take_profit_intercept: 5.0,
            }),
            training: Vec::new(),
        };
        assert!(estimator.restore(snapshot).is_err());
        assert!(!estimator.is_trained());
    }

    #[test]
    fn test_reads_during_training_stay_valid() {
        let estimator = RiskEstimator::new();
        let trades: Vec<TradeRecord> = (0..50)
            .map(|i| trade(5.0 + i as f64, 2.0 + i as f64 * 0.1, 8.0 + i as f64 * 0.2))
            .collect();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..20 {
                    estimator.train(&trades);
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for i in 0..200 {
                        let p = estimator.get_optimal_risk_params(&state(5.0 + (i % 60) as f64, 50.0, 1.0, 0.0));
                        assert!((2.0..=15.0).contains(&p.stop_loss));
                        assert!((3.0..=20.0).contains(&p.take_profit));
                    }
                });
            }
        });

        assert_eq!(estimator.training_rows(), MAX_TRAINING_ROWS);
    }
}

#[cfg(test)]
mod simulation_tests {
    use crate::models::*;
    use crate::monte_carlo::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn portfolio(volatility: f64) -> Vec<PortfolioPosition> {
        vec![
            PortfolioPosition { symbol: "AAPL".to_string(), value: 6_000.0, volatility },
            PortfolioPosition { symbol: "MSFT".to_string(), value: 4_000.0, volatility },
        ]
    }

    #[test]
    fn test_zero_volatility_converges_to_initial_value() {
        let mut rng = StdRng::seed_from_u64(11);
        let summary = monte_carlo_risk_simulation(&portfolio(0.0), 30, 500, 0.02, &mut rng).unwrap();

        assert_eq!(summary.iterations, 500);
        assert_relative_eq!(summary.initial_value, 10_000.0);
        assert_relative_eq!(summary.expected_value, 10_000.0, epsilon = 1e-6);
        assert_relative_eq!(summary.var95, 10_000.0, epsilon = 1e-6);
        assert_relative_eq!(summary.probability_of_loss, 0.0);
        assert_relative_eq!(summary.worst_case_drawdown, 0.0);
        assert_relative_eq!(summary.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = monte_carlo_risk_simulation(&portfolio(30.0), 60, 2_000, 0.02, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = monte_carlo_risk_simulation(&portfolio(30.0), 60, 2_000, 0.02, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_volatile_portfolio_distribution_is_ordered() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = monte_carlo_risk_simulation(&portfolio(40.0), 90, 5_000, 0.02, &mut rng).unwrap();

        assert!(s.worst_case <= s.var99);
        assert!(s.var99 <= s.var95);
        assert!(s.var95 < s.best_case);
        assert!(s.var95 < s.initial_value);
        assert!(s.probability_of_loss > 0.0 && s.probability_of_loss < 1.0);
        assert!(s.expected_drawdown > 0.0);
        assert!(s.worst_case_drawdown >= s.expected_drawdown);
        assert!(s.worst_case_drawdown < 1.0);
    }

    #[test]
    fn test_iterations_are_capped() {
        let mut rng = StdRng::seed_from_u64(5);
        let s = monte_carlo_risk_simulation(&portfolio(10.0), 1, MAX_ITERATIONS + 50_000, 0.02, &mut rng).unwrap();
        assert_eq!(s.iterations, MAX_ITERATIONS);
    }

    #[test]
    fn test_single_path_has_zero_sharpe() {
        let mut rng = StdRng::seed_from_u64(9);
        let s = monte_carlo_risk_simulation(&portfolio(25.0), 20, 1, 0.02, &mut rng).unwrap();
        assert_eq!(s.iterations, 1);
        assert_relative_eq!(s.sharpe_ratio, 0.0);
        assert_relative_eq!(s.worst_case, s.best_case);
    }
}
