//! Portfolio valuation engine.
//!
//! Turns raw ledger snapshots plus current quotes into the derived figures
//! the rest of the application displays. Pure: one pass in, one summary out,
//! no state survives the call.

use std::collections::HashMap;

use super::cash::{self, CashEvent};
use super::quote::Quote;
use super::trade::{Trade, TradeStatus};

/// Ephemeral per-request aggregate. Recomputed on every request, never
/// persisted, never a source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioSummary {
    pub total_deposited: f64,
    pub total_withdrawn: f64,
    pub total_returns: f64,
    pub cost_open: f64,
    pub cost_closed: f64,
    pub market_val_open: f64,
    pub sales_closed: f64,
    pub realized_pl: f64,
    pub unrealized_pl: f64,
    pub cash: f64,
    pub equity: f64,
}

/// A trade row plus everything derived from it for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTrade {
    pub trade: Trade,
    /// Latest quote for open trades, exit price for closed trades.
    pub current_price: f64,
    pub total_cost: f64,
    pub market_value: f64,
    pub gain: f64,
    pub gain_pct: f64,
    /// Share of open market value, 0 for closed trades.
    pub weight: f64,
}

/// Corrupt quote or ledger numbers must not crash the summary: anything
/// non-finite or negative is treated as zero and the pass continues.
fn coerce(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

/// Compute the portfolio summary and the enriched trade table in one pass.
///
/// `quotes` maps open-position symbols to their latest quote; symbols with
/// no quote value at zero rather than failing.
pub fn compute_summary(
    trades: &[Trade],
    deposits: &[CashEvent],
    withdrawals: &[CashEvent],
    returns: &[CashEvent],
    quotes: &HashMap<String, Quote>,
) -> (PortfolioSummary, Vec<EnrichedTrade>) {
    let mut cost_open = 0.0_f64;
    let mut cost_closed = 0.0_f64;
    let mut market_val_open = 0.0_f64;
    let mut sales_closed = 0.0_f64;
    let mut total_buy_cost = 0.0_f64;

    let mut enriched = Vec::with_capacity(trades.len());

    for trade in trades {
        let quantity = coerce(trade.quantity);
        let entry = coerce(trade.entry_price);
        let total_cost = quantity * entry;
        total_buy_cost += total_cost;

        let (current_price, market_value) = match trade.status {
            TradeStatus::Open => {
                let price = quotes
                    .get(&trade.symbol)
                    .map(|q| coerce(q.price))
                    .unwrap_or(0.0);
                (price, quantity * price)
            }
            TradeStatus::Closed => {
                let exit = trade.exit_price.map(coerce).unwrap_or(0.0);
                (exit, quantity * exit)
            }
        };

        match trade.status {
            TradeStatus::Open => {
                cost_open += total_cost;
                market_val_open += market_value;
            }
            TradeStatus::Closed => {
                cost_closed += total_cost;
                sales_closed += market_value;
            }
        }

        let gain = market_value - total_cost;
        let gain_pct = if total_cost > 0.0 {
            gain / total_cost * 100.0
        } else {
            0.0
        };

        enriched.push(EnrichedTrade {
            trade: trade.clone(),
            current_price,
            total_cost,
            market_value,
            gain,
            gain_pct,
            weight: 0.0,
        });
    }

    // Weights need the final open market value, hence the second pass.
    if market_val_open > 0.0 {
        for row in &mut enriched {
            if row.trade.is_open() {
                row.weight = row.market_value / market_val_open;
            }
        }
    }

    let total_deposited = cash::total(deposits);
    let total_withdrawn = cash::total(withdrawals);
    let total_returns = cash::total(returns);

    // Capital spent on any purchase leaves cash; only realized sales return.
    let cash_balance =
        (total_deposited + total_returns + sales_closed) - (total_withdrawn + total_buy_cost);
    let equity = cash_balance + market_val_open;

    let summary = PortfolioSummary {
        total_deposited,
        total_withdrawn,
        total_returns,
        cost_open,
        cost_closed,
        market_val_open,
        sales_closed,
        realized_pl: sales_closed - cost_closed,
        unrealized_pl: market_val_open - cost_open,
        cash: cash_balance,
        equity,
    };

    (summary, enriched)
}
