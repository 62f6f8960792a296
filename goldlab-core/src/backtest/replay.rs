//! Trade synthesis: turns one strategy and a candle window into trades.
//!
//! One trade is opened at the open of every candle in the window. Stop and
//! target sit `risk_reward` and `2 * risk_reward` price units from entry, in
//! the trade's direction (`risk_reward` is an absolute price offset here).

use crate::domain::{Candle, Direction, SimulatedTrade, Strategy, TradeDirection};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a trade's exit is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSynthesis {
    /// Every trade exits at its target on the entry candle, so every trade wins.
    /// Direction is a fair coin flip.
    #[default]
    FixedPayoff,
    /// Walk the candles from entry. A candle touching both levels exits at the
    /// stop. Trades still open at the end close at the last candle's close.
    /// Direction follows the strategy's bias, or a coin flip without one.
    PricePath,
}

/// Stop and target prices for a trade entered at `entry`.
pub fn levels(direction: TradeDirection, entry: f64, offset: f64) -> (f64, f64) {
    let sign = direction.sign();
    (entry - sign * offset, entry + sign * 2.0 * offset)
}

pub(crate) fn synthesize(
    strategy: &Strategy,
    window: &[Candle],
    synthesis: TradeSynthesis,
    rng: &mut StdRng,
) -> Vec<SimulatedTrade> {
    window
        .iter()
        .enumerate()
        .map(|(j, candle)| {
            let direction = match synthesis {
                TradeSynthesis::FixedPayoff => coin_flip(rng),
                TradeSynthesis::PricePath => match strategy.bias {
                    Some(Direction::Bullish) => TradeDirection::Long,
                    Some(Direction::Bearish) => TradeDirection::Short,
                    None => coin_flip(rng),
                },
            };
            let entry = candle.open;
            let (stop, target) = levels(direction, entry, strategy.risk_reward);
            let (exit_date, exit_price) = match synthesis {
                TradeSynthesis::FixedPayoff => (candle.date.clone(), target),
                TradeSynthesis::PricePath => walk(&window[j..], direction, stop, target),
            };
            let profit = SimulatedTrade::signed_profit(direction, entry, exit_price);
            SimulatedTrade {
                id: format!("trade-{}-{j}", strategy.id),
                entry_date: candle.date.clone(),
                entry_price: entry,
                direction,
                exit_date,
                exit_price,
                stop_loss: stop,
                take_profit: target,
                profit,
                profit_percentage: SimulatedTrade::percentage_of(profit, entry),
            }
        })
        .collect()
}

fn coin_flip(rng: &mut StdRng) -> TradeDirection {
    if rng.gen_bool(0.5) {
        TradeDirection::Long
    } else {
        TradeDirection::Short
    }
}

/// First exit along `path` (entry candle first). `path` is never empty.
fn walk(path: &[Candle], direction: TradeDirection, stop: f64, target: f64) -> (String, f64) {
    for candle in path {
        let (stop_hit, target_hit) = match direction {
            TradeDirection::Long => (candle.low <= stop, candle.high >= target),
            TradeDirection::Short => (candle.high >= stop, candle.low <= target),
        };
        if stop_hit {
            return (candle.date.clone(), stop);
        }
        if target_hit {
            return (candle.date.clone(), target);
        }
    }
    match path.last() {
        Some(last) => (last.date.clone(), last.close),
        None => (String::new(), stop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn strategy(bias: Option<Direction>) -> Strategy {
        Strategy {
            id: "s".into(),
            name: "Test".into(),
            description: String::new(),
            entry_conditions: vec![],
            exit_conditions: vec![],
            stop_loss: 1.0,
            take_profit: 2.0,
            timeframe: "1D".into(),
            risk_reward: 2.0,
            expected_win_rate: 0.5,
            bias,
        }
    }

    #[test]
    fn levels_by_direction() {
        assert_eq!(levels(TradeDirection::Long, 100.0, 2.0), (98.0, 104.0));
        assert_eq!(levels(TradeDirection::Short, 100.0, 2.0), (102.0, 96.0));
    }

    #[test]
    fn fixed_payoff_always_wins_twice_the_offset() {
        let window = vec![
            Candle::new("2024-01-02", 2000.0, 2001.0, 1999.0, 2000.5),
            Candle::new("2024-01-03", 2010.0, 2011.0, 2009.0, 2010.5),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let trades = synthesize(&strategy(None), &window, TradeSynthesis::FixedPayoff, &mut rng);
        assert_eq!(trades.len(), 2);
        for (trade, candle) in trades.iter().zip(&window) {
            assert_eq!(trade.profit, 4.0);
            assert_eq!(trade.exit_date, candle.date);
        }
        assert_eq!(trades[1].id, "trade-s-1");
    }

    #[test]
    fn price_path_long_hits_target_later() {
        let window = vec![
            Candle::new("2024-01-02", 100.0, 101.0, 99.0, 100.5),
            Candle::new("2024-01-03", 100.5, 104.5, 100.0, 104.0),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let trades = synthesize(
            &strategy(Some(Direction::Bullish)),
            &window,
            TradeSynthesis::PricePath,
            &mut rng,
        );
        assert_eq!(trades[0].direction, TradeDirection::Long);
        assert_eq!(trades[0].exit_price, 104.0);
        assert_eq!(trades[0].exit_date, "2024-01-03");
        assert_eq!(trades[0].profit, 4.0);
    }

    #[test]
    fn price_path_stop_wins_ties() {
        let window = vec![Candle::new("2024-01-02", 100.0, 105.0, 97.0, 101.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let trades = synthesize(
            &strategy(Some(Direction::Bullish)),
            &window,
            TradeSynthesis::PricePath,
            &mut rng,
        );
        assert_eq!(trades[0].exit_price, 98.0);
        assert_eq!(trades[0].profit, -2.0);
    }

    #[test]
    fn price_path_short_closes_at_last_close() {
        let window = vec![
            Candle::new("2024-01-02", 100.0, 101.0, 99.0, 100.0),
            Candle::new("2024-01-03", 100.0, 101.5, 98.5, 99.0),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let trades = synthesize(
            &strategy(Some(Direction::Bearish)),
            &window,
            TradeSynthesis::PricePath,
            &mut rng,
        );
        assert_eq!(trades[0].direction, TradeDirection::Short);
        assert_eq!(trades[0].exit_date, "2024-01-03");
        assert_eq!(trades[0].exit_price, 99.0);
        assert_eq!(trades[0].profit, 1.0);
    }
}
