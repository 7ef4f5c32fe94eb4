//! End-to-end backtest scenarios with a scripted signal source.

mod common;

use common::*;
use sigtrader::domain::backtest::run_backtest;
use sigtrader::domain::decision::{Action, DecisionReason};
use sigtrader::domain::error::SignalError;
use sigtrader::domain::ledger::PositionLedger;
use sigtrader::domain::risk::RiskConfig;
use chrono::Duration;

mod golden_scenario {
    use super::*;

    /// Balance 10000, fee 0.1%, closes [100, 100, 105, 95, 90]. A scripted
    /// BUY of 10 on the second candle fills at the third candle's open
    /// (100), costing 1000 plus a 1.00 fee. The 8% initial stop (92) trips
    /// on the last candle's close of 90 and force-sells 10 at that candle's
    /// open of 95.
    #[test]
    fn stop_loss_round_trip_matches_golden_values() {
        let candles = candles_from_closes(&[100.0, 100.0, 105.0, 95.0, 90.0]);
        let mut signal = ScriptedSignal::new().buy_at(1, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &open_gate_config()).unwrap();

        assert_eq!(report.trade_count, 2);

        let buy = &report.trades[0];
        assert_eq!(buy.action, Action::Buy);
        assert!((buy.price - 100.0).abs() < f64::EPSILON);
        assert!((buy.fee - 1.0).abs() < 1e-9);
        assert!((buy.resulting_balance - 8_999.0).abs() < 1e-9);

        let sell = &report.trades[1];
        assert_eq!(sell.action, Action::Sell);
        assert_eq!(sell.reason, DecisionReason::StopLoss);
        assert!((sell.price - 95.0).abs() < f64::EPSILON);
        assert!((sell.size - 10.0).abs() < f64::EPSILON);
        // Proceeds 950 less the 0.95 fee, against a 1000 cost basis.
        assert!((sell.realized_pnl - (-50.95)).abs() < 1e-9);

        assert!((report.final_balance - 9_948.05).abs() < 1e-9);
        assert!((report.final_position_value - 0.0).abs() < f64::EPSILON);
        assert!((report.return_pct - (-0.5195)).abs() < 1e-9);
        assert!((report.win_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn replaying_identical_inputs_yields_identical_reports() {
        let candles = candles_from_closes(&[100.0, 101.0, 104.0, 99.0, 97.0, 103.0, 95.0]);
        let config = open_gate_config();

        let mut first_signal = ScriptedSignal::new().buy_at(1, 5.0, 90).sell_at(4, 2.0, 90);
        let first = run_backtest("BTC/USDT", &candles, &mut first_signal, &config).unwrap();

        let mut second_signal = ScriptedSignal::new().buy_at(1, 5.0, 90).sell_at(4, 2.0, 90);
        let second = run_backtest("BTC/USDT", &candles, &mut second_signal, &config).unwrap();

        assert_eq!(first, second);
    }
}

mod exit_behavior {
    use super::*;

    #[test]
    fn take_profit_ladder_fires_each_rung_once() {
        let mut config = open_gate_config();
        config.take_profit = two_rung_ladder();
        config.trading_fee_pct = 0.0;

        // Fill at candle 1 open (100); +2% at candle 2, +5% at candle 4.
        let candles = candles_from_closes(&[100.0, 100.0, 102.0, 103.0, 105.0, 106.0]);
        let mut signal = ScriptedSignal::new().buy_at(0, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        let sells: Vec<_> = report
            .trades
            .iter()
            .filter(|f| f.action == Action::Sell)
            .collect();
        assert_eq!(sells.len(), 2);

        assert_eq!(sells[0].reason, DecisionReason::TakeProfit { rung: 0 });
        assert!((sells[0].size - 5.0).abs() < f64::EPSILON);

        // Second rung wants 1.0 × lifetime (10) but only 5 remain.
        assert_eq!(sells[1].reason, DecisionReason::TakeProfit { rung: 1 });
        assert!((sells[1].size - 5.0).abs() < f64::EPSILON);

        assert!((report.final_position_value - 0.0).abs() < f64::EPSILON);
        // Rung 0 filled at the breakeven open (100), rung 1 at 103: one
        // winning close out of two.
        assert!((report.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn time_exit_closes_after_holding_period() {
        let mut config = open_gate_config();
        config.max_holding_period = Some(Duration::hours(2));

        let candles = candles_from_closes(&[100.0; 6]);
        let mut signal = ScriptedSignal::new().buy_at(1, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        let sell = report
            .trades
            .iter()
            .find(|f| f.action == Action::Sell)
            .expect("time exit must close the position");
        assert_eq!(sell.reason, DecisionReason::TimeExit);
        assert!((sell.size - 10.0).abs() < f64::EPSILON);
        // Opened at hour 1, limit 2h: the exit decision lands on hour 3.
        assert_eq!(sell.timestamp, ts(3));
    }

    #[test]
    fn trailing_stop_locks_in_gains() {
        let mut config = open_gate_config();
        config.stop_loss.activation_pct = 5.0;
        config.trading_fee_pct = 0.0;

        // Fill at 100, rally to 110 (trail armed at 106.7), fade to 106.
        let candles = candles_from_closes(&[100.0, 100.0, 110.0, 106.0, 106.0]);
        let mut signal = ScriptedSignal::new().buy_at(0, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        let sell = report
            .trades
            .iter()
            .find(|f| f.action == Action::Sell)
            .expect("trailing stop must fire");
        assert_eq!(sell.reason, DecisionReason::StopLoss);
        // Forced exits fill at the triggering candle's open (110).
        assert!((sell.price - 110.0).abs() < f64::EPSILON);
        assert!(sell.realized_pnl > 0.0);
        assert!((report.win_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_loss_beats_simultaneous_buy_signal() {
        let config = open_gate_config();
        let candles = candles_from_closes(&[100.0, 100.0, 105.0, 91.0, 91.0]);
        // BUY scripted on the same candle whose close breaches the stop.
        let mut signal = ScriptedSignal::new().buy_at(1, 10.0, 90).buy_at(3, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        let sell = report
            .trades
            .iter()
            .find(|f| f.action == Action::Sell)
            .expect("stop loss must override the buy");
        assert_eq!(sell.reason, DecisionReason::StopLoss);
        assert_eq!(sell.timestamp, ts(3));
    }
}

mod degraded_bars {
    use super::*;

    #[test]
    fn signal_outage_holds_for_that_bar_only() {
        let config = open_gate_config();
        let candles = candles_from_closes(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        let mut signal = ScriptedSignal::new()
            .error_at(1, SignalError::Timeout { seconds: 30 })
            .buy_at(2, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        // The outage bar produced no trade; the next bar's buy went through.
        assert_eq!(report.trade_count, 1);
        assert_eq!(report.trades[0].action, Action::Buy);
        assert_eq!(report.trades[0].timestamp, ts(2));
    }

    #[test]
    fn bad_candle_is_skipped_without_breaking_the_run() {
        let config = open_gate_config();
        let mut candles = candles_from_closes(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        candles[2].close = 0.0; // gap in the feed

        let mut signal = ScriptedSignal::new().buy_at(2, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        // Call index 2 is the fourth candle (the bad bar consumed no call).
        assert_eq!(report.trade_count, 1);
        assert_eq!(report.trades[0].timestamp, ts(3));
    }
}

mod ledger_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Net size always equals buys minus sells and never goes negative,
        /// for any interleaving where sells are clamped to the held size.
        #[test]
        fn conservation_over_random_operations(
            ops in proptest::collection::vec((any::<bool>(), 0.1f64..10.0), 1..40)
        ) {
            let mut ledger = PositionLedger::new(0);
            let mut expected = 0.0f64;
            for (index, (is_buy, size)) in ops.into_iter().enumerate() {
                if is_buy {
                    ledger.record_buy(size, 100.0, ts(index as u32 % 24));
                    expected += size;
                } else {
                    let clamped = size.min(ledger.net_size());
                    if clamped > 0.0 {
                        ledger.record_sell(clamped).unwrap();
                        expected -= clamped;
                    }
                }
                prop_assert!(ledger.net_size() >= 0.0);
                prop_assert!((ledger.net_size() - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn fifo_consumption_reprices_remaining_lots() {
        let mut ledger = PositionLedger::new(0);
        ledger.record_buy(10.0, 100.0, ts(0));
        ledger.record_buy(5.0, 110.0, ts(1));

        ledger.record_sell(12.0).unwrap();

        assert!((ledger.net_size() - 3.0).abs() < 1e-9);
        assert!((ledger.mean_price() - 110.0).abs() < 1e-9);
    }
}

mod reporting {
    use super::*;
    use sigtrader::adapters::json_report_adapter::JsonReportAdapter;
    use sigtrader::ports::report_port::ReportPort;
    use tempfile::TempDir;

    #[test]
    fn report_survives_json_round_trip() {
        let config = open_gate_config();
        let candles = candles_from_closes(&[100.0, 100.0, 105.0, 95.0, 90.0]);
        let mut signal = ScriptedSignal::new().buy_at(1, 10.0, 90);
        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        JsonReportAdapter.write(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["trade_count"], 2);
        assert_eq!(value["trades"][0]["action"], "BUY");
        assert_eq!(value["trades"][1]["reason"]["code"], "stop_loss");
    }

    #[test]
    fn hold_only_run_reports_zero_trades() {
        // Confidence floor rejects everything the script proposes.
        let mut config = open_gate_config();
        config.min_confidence = 95;

        let candles = candles_from_closes(&[100.0, 101.0, 102.0, 103.0]);
        let mut signal = ScriptedSignal::new().buy_at(0, 10.0, 90).buy_at(1, 10.0, 90);

        let report = run_backtest("BTC/USDT", &candles, &mut signal, &config).unwrap();
        assert_eq!(report.trade_count, 0);
        assert!((report.final_balance - 10_000.0).abs() < f64::EPSILON);
        assert!((report.win_rate - 0.0).abs() < f64::EPSILON);
    }
}

// Keep a compile-time check that RiskConfig stays constructible with struct
// update syntax from library defaults, which the docs lean on.
#[test]
fn risk_config_supports_struct_update() {
    let config = RiskConfig {
        initial_balance: 5_000.0,
        ..RiskConfig::default()
    };
    assert!((config.initial_balance - 5_000.0).abs() < f64::EPSILON);
    assert!((config.base_threshold - 0.5).abs() < f64::EPSILON);
}
