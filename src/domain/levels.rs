//! Classical technical levels: standard pivot points and Fibonacci
//! retracements over a recent daily OHLC window.

use super::quote::OhlcvBar;

/// Bars required before levels are computed at all; shorter windows are
/// reported as insufficient data instead.
pub const MIN_BARS: usize = 20;

const FIB_RATIOS: [f64; 5] = [0.0, 0.382, 0.5, 0.618, 1.0];

/// Standard floor-trader pivots from the last fully closed session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotPoints {
    pub pp: f64,
    pub r1: f64,
    pub s1: f64,
    pub r2: f64,
    pub s2: f64,
}

impl PivotPoints {
    pub fn from_candle(high: f64, low: f64, close: f64) -> Self {
        let pp = (high + low + close) / 3.0;
        PivotPoints {
            pp,
            r1: 2.0 * pp - low,
            s1: 2.0 * pp - high,
            r2: pp + (high - low),
            s2: pp - (high - low),
        }
    }
}

/// One retracement level, measured downward from the window high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalLevels {
    pub pivots: PivotPoints,
    pub fibonacci: Vec<FibLevel>,
    pub max_price: f64,
    pub min_price: f64,
}

/// Compute pivots and retracements from a daily window.
///
/// Pivots come from the second-to-last candle, the most recent session that
/// has fully closed. Returns `None` below [`MIN_BARS`].
pub fn compute_levels(bars: &[OhlcvBar]) -> Option<TechnicalLevels> {
    if bars.len() < MIN_BARS {
        return None;
    }

    let max_price = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let min_price = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let range = max_price - min_price;

    let fibonacci = FIB_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: max_price - ratio * range,
        })
        .collect();

    let prior = &bars[bars.len() - 2];
    let pivots = PivotPoints::from_candle(prior.high, prior.low, prior.close);

    Some(TechnicalLevels {
        pivots,
        fibonacci,
        max_price,
        min_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn flat_window(count: usize) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| bar(i as u32, 100.0, 105.0, 95.0, 100.0))
            .collect()
    }

    #[test]
    fn pivot_points_standard_candle() {
        // H=110, L=90, C=100 -> PP=100, R1=110, S1=90, R2=120, S2=80
        let pivots = PivotPoints::from_candle(110.0, 90.0, 100.0);
        assert_relative_eq!(pivots.pp, 100.0, epsilon = 1e-9);
        assert_relative_eq!(pivots.r1, 110.0, epsilon = 1e-9);
        assert_relative_eq!(pivots.s1, 90.0, epsilon = 1e-9);
        assert_relative_eq!(pivots.r2, 120.0, epsilon = 1e-9);
        assert_relative_eq!(pivots.s2, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn pivots_use_second_to_last_candle() {
        let mut bars = flat_window(MIN_BARS);
        let n = bars.len();
        bars[n - 2] = bar((n - 2) as u32, 100.0, 110.0, 90.0, 100.0);
        // The still-forming last session must not influence the pivots.
        bars[n - 1] = bar((n - 1) as u32, 100.0, 300.0, 10.0, 200.0);

        let levels = compute_levels(&bars).unwrap();
        assert_relative_eq!(levels.pivots.pp, 100.0, epsilon = 1e-9);
        assert_relative_eq!(levels.pivots.r2, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn fibonacci_golden_level() {
        // max=120, min=100 -> 61.8% level at 120 - 12.36 = 107.64
        let mut bars = flat_window(MIN_BARS);
        bars[5] = bar(5, 110.0, 120.0, 100.0, 115.0);
        for b in bars.iter_mut() {
            b.low = b.low.max(100.0);
        }

        let levels = compute_levels(&bars).unwrap();
        assert_relative_eq!(levels.max_price, 120.0, epsilon = 1e-9);
        assert_relative_eq!(levels.min_price, 100.0, epsilon = 1e-9);

        let golden = levels
            .fibonacci
            .iter()
            .find(|l| (l.ratio - 0.618).abs() < 1e-12)
            .unwrap();
        assert_relative_eq!(golden.price, 107.64, epsilon = 1e-9);
    }

    #[test]
    fn fibonacci_endpoints() {
        let bars = flat_window(MIN_BARS);
        let levels = compute_levels(&bars).unwrap();

        assert_eq!(levels.fibonacci.len(), 5);
        assert_relative_eq!(levels.fibonacci[0].price, levels.max_price, epsilon = 1e-9);
        assert_relative_eq!(levels.fibonacci[4].price, levels.min_price, epsilon = 1e-9);
    }

    #[test]
    fn short_window_reports_insufficient_data() {
        let bars = flat_window(MIN_BARS - 1);
        assert!(compute_levels(&bars).is_none());
    }

    #[test]
    fn empty_window_reports_insufficient_data() {
        assert!(compute_levels(&[]).is_none());
    }

    #[test]
    fn minimum_window_accepted() {
        let bars = flat_window(MIN_BARS);
        assert!(compute_levels(&bars).is_some());
    }
}
