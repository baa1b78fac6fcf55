//! Portfolio risk statistics against a benchmark index.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::quote::OhlcvBar;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Neutral defaults stand in whenever history is missing or degenerate;
/// these metrics never raise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskMetrics {
    pub beta: f64,
    pub sharpe: f64,
    /// Largest peak-to-trough decline, as a negative fraction.
    pub max_drawdown: f64,
}

/// Compute beta, Sharpe and max drawdown for an equal-weighted portfolio of
/// the given symbol series against the benchmark series.
///
/// Series are inner-joined on trading date; dates absent from any series are
/// dropped. Daily risk-free rate is `annual_risk_free / 252`.
pub fn compute_risk(
    symbol_series: &[Vec<OhlcvBar>],
    benchmark: &[OhlcvBar],
    annual_risk_free: f64,
) -> RiskMetrics {
    if symbol_series.is_empty() || symbol_series.iter().any(|s| s.is_empty()) {
        return RiskMetrics::default();
    }
    if benchmark.is_empty() {
        return RiskMetrics::default();
    }

    let (closes, bench_closes) = align_closes(symbol_series, benchmark);
    if bench_closes.len() < 2 {
        return RiskMetrics::default();
    }

    let bench_returns = daily_returns(&bench_closes);
    let per_symbol_returns: Vec<Vec<f64>> = closes.iter().map(|c| daily_returns(c)).collect();

    // Equal-weighted mean across symbols, day by day.
    let days = bench_returns.len();
    let portfolio_returns: Vec<f64> = (0..days)
        .map(|day| {
            let sum: f64 = per_symbol_returns.iter().map(|r| r[day]).sum();
            sum / per_symbol_returns.len() as f64
        })
        .collect();

    let beta = compute_beta(&portfolio_returns, &bench_returns);
    let sharpe = compute_sharpe(&portfolio_returns, annual_risk_free / TRADING_DAYS_PER_YEAR);
    let max_drawdown = compute_max_drawdown(&portfolio_returns);

    RiskMetrics {
        beta,
        sharpe,
        max_drawdown,
    }
}

/// Inner-join all series on date. Returns per-symbol close rows plus the
/// benchmark closes, all in ascending date order and of equal length.
fn align_closes(
    symbol_series: &[Vec<OhlcvBar>],
    benchmark: &[OhlcvBar],
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let symbol_maps: Vec<HashMap<NaiveDate, f64>> = symbol_series
        .iter()
        .map(|series| series.iter().map(|b| (b.date, b.close)).collect())
        .collect();

    let mut dates: Vec<NaiveDate> = benchmark
        .iter()
        .map(|b| b.date)
        .filter(|d| symbol_maps.iter().all(|m| m.contains_key(d)))
        .collect();
    dates.sort_unstable();
    dates.dedup();

    let bench_map: HashMap<NaiveDate, f64> =
        benchmark.iter().map(|b| (b.date, b.close)).collect();

    let closes = symbol_maps
        .iter()
        .map(|m| dates.iter().map(|d| m[d]).collect())
        .collect();
    let bench_closes = dates.iter().map(|d| bench_map[d]).collect();

    (closes, bench_closes)
}

/// Simple percent change from the prior close; the undefined first row is
/// dropped. A zero prior close contributes a zero return.
fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| {
            if w[0] != 0.0 && w[0].is_finite() && w[1].is_finite() {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn compute_beta(portfolio: &[f64], benchmark: &[f64]) -> f64 {
    if portfolio.len() != benchmark.len() || portfolio.is_empty() {
        return 0.0;
    }
    let n = portfolio.len() as f64;
    let mean_p = mean(portfolio);
    let mean_b = mean(benchmark);

    let covariance: f64 = portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| (p - mean_p) * (b - mean_b))
        .sum::<f64>()
        / n;
    let variance: f64 = benchmark.iter().map(|b| (b - mean_b).powi(2)).sum::<f64>() / n;

    if variance > 0.0 {
        covariance / variance
    } else {
        0.0
    }
}

fn compute_sharpe(returns: &[f64], daily_rf: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let mean_excess = mean(&excess);
    let variance: f64 = excess
        .iter()
        .map(|r| (r - mean_excess).powi(2))
        .sum::<f64>()
        / excess.len() as f64;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean_excess / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

fn compute_max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;

    for r in returns {
        cumulative *= 1.0 + r;
        if cumulative > peak {
            peak = cumulative;
        } else if peak > 0.0 {
            let dd = (cumulative - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
