//! HTML templates using Askama.
//!
//! Handlers pre-render every number into display strings so the templates
//! only interpolate text.

use askama::Template;
use std::collections::HashMap;

use crate::domain::cash::CashEvent;
use crate::domain::levels::TechnicalLevels;
use crate::domain::quote::Quote;
use crate::domain::recommend::Recommendation;
use crate::domain::sector::{SectorAllocation, SectorTarget};
use crate::domain::valuation::{EnrichedTrade, PortfolioSummary};

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn pct(value: f64) -> String {
    format!("{:.1}", value)
}

/// One display row of the trade table.
pub struct TradeRow {
    pub id: i64,
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub strategy: String,
    pub quantity: String,
    pub entry_price: String,
    pub entry_date: String,
    pub current_price: String,
    /// Percent move since the previous close; empty when unknown.
    pub day_change_pct: String,
    pub total_cost: String,
    pub market_value: String,
    pub gain: String,
    pub gain_pct: String,
    pub weight_pct: String,
    pub exit_price: String,
    pub exit_date: String,
}

impl From<&EnrichedTrade> for TradeRow {
    fn from(row: &EnrichedTrade) -> Self {
        TradeRow {
            id: row.trade.id,
            symbol: row.trade.symbol.clone(),
            company: row.trade.company.clone(),
            sector: row.trade.sector.clone(),
            strategy: row.trade.strategy.as_str().to_string(),
            quantity: format!("{}", row.trade.quantity),
            entry_price: money(row.trade.entry_price),
            entry_date: row.trade.entry_date.to_string(),
            current_price: money(row.current_price),
            day_change_pct: String::new(),
            total_cost: money(row.total_cost),
            market_value: money(row.market_value),
            gain: money(row.gain),
            gain_pct: pct(row.gain_pct),
            weight_pct: pct(row.weight * 100.0),
            exit_price: row.trade.exit_price.map(money).unwrap_or_default(),
            exit_date: row
                .trade
                .exit_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }
}

pub struct AllocationRow {
    pub sector: String,
    pub companies: usize,
    pub cost: String,
    pub current_weight: String,
    pub target_weight: String,
    pub remaining_to_target: String,
}

impl From<&SectorAllocation> for AllocationRow {
    fn from(a: &SectorAllocation) -> Self {
        AllocationRow {
            sector: a.sector.clone(),
            companies: a.companies,
            cost: money(a.cost),
            current_weight: pct(a.current_weight),
            target_weight: pct(a.target_weight),
            remaining_to_target: money(a.remaining_to_target),
        }
    }
}

pub struct RecommendationRow {
    pub sector: String,
    pub reason: String,
    pub suggestions: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(r: &Recommendation) -> Self {
        RecommendationRow {
            sector: r.sector.clone(),
            reason: r.reason.clone(),
            suggestions: r.suggestions.join(", "),
        }
    }
}

pub struct CashRow {
    pub id: i64,
    pub date: String,
    pub amount: String,
    pub note: String,
    pub symbol: String,
}

impl From<&CashEvent> for CashRow {
    fn from(event: &CashEvent) -> Self {
        CashRow {
            id: event.id,
            date: event.date.to_string(),
            amount: money(event.amount),
            note: event.note.clone().unwrap_or_default(),
            symbol: event.symbol.clone().unwrap_or_default(),
        }
    }
}

pub struct TargetRow {
    pub sector: String,
    pub target_pct: String,
}

impl From<&SectorTarget> for TargetRow {
    fn from(t: &SectorTarget) -> Self {
        TargetRow {
            sector: t.sector.clone(),
            target_pct: pct(t.target_pct),
        }
    }
}

/// Entry in the trade form's symbol picker.
pub struct SymbolOption {
    pub symbol: String,
    pub company: String,
    pub sector: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub equity: String,
    pub cash: String,
    pub market_val_open: String,
    pub cost_open: String,
    pub unrealized_pl: String,
    pub realized_pl: String,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub total_returns: String,
    pub positions: Vec<TradeRow>,
    pub allocations: Vec<AllocationRow>,
    pub recommendations: Vec<RecommendationRow>,
}

impl DashboardTemplate {
    pub fn from_parts(
        summary: &PortfolioSummary,
        enriched: &[EnrichedTrade],
        allocations: &[SectorAllocation],
        recommendations: &[Recommendation],
        quotes: &HashMap<String, Quote>,
    ) -> Self {
        let positions = enriched
            .iter()
            .filter(|r| r.trade.is_open())
            .map(|r| {
                let mut row = TradeRow::from(r);
                if let Some(quote) = quotes.get(&r.trade.symbol) {
                    if quote.prev_close > 0.0 {
                        row.day_change_pct = pct(quote.change_pct());
                    }
                }
                row
            })
            .collect();

        DashboardTemplate {
            equity: money(summary.equity),
            cash: money(summary.cash),
            market_val_open: money(summary.market_val_open),
            cost_open: money(summary.cost_open),
            unrealized_pl: money(summary.unrealized_pl),
            realized_pl: money(summary.realized_pl),
            total_deposited: money(summary.total_deposited),
            total_withdrawn: money(summary.total_withdrawn),
            total_returns: money(summary.total_returns),
            positions,
            allocations: allocations.iter().map(AllocationRow::from).collect(),
            recommendations: recommendations
                .iter()
                .map(RecommendationRow::from)
                .collect(),
        }
    }

    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Portfolio</h1>");
        html.push_str(&format!(
            "<p><strong>Equity:</strong> {} (cash {} + open positions {})</p>",
            self.equity, self.cash, self.market_val_open
        ));
        html.push_str(&format!(
            "<p>Unrealized P&amp;L: {} | Realized P&amp;L: {}</p>",
            self.unrealized_pl, self.realized_pl
        ));
        if !self.positions.is_empty() {
            html.push_str("<table><tr><th>Symbol</th><th>Qty</th><th>Value</th><th>Gain</th><th>Weight</th></tr>");
            for row in &self.positions {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} ({}%)</td><td>{}%</td></tr>",
                    row.symbol, row.quantity, row.market_value, row.gain, row.gain_pct,
                    row.weight_pct
                ));
            }
            html.push_str("</table>");
        }
        for rec in &self.recommendations {
            html.push_str(&format!(
                "<p class=\"recommendation\">{} (consider: {})</p>",
                rec.reason, rec.suggestions
            ));
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Template)]
#[template(path = "trades.html")]
pub struct TradesTemplate {
    pub open_rows: Vec<TradeRow>,
    pub closed_rows: Vec<TradeRow>,
    pub symbols: Vec<SymbolOption>,
}

impl TradesTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Trades</h1>");
        html.push_str("<h2>Open</h2><table><tr><th>Symbol</th><th>Qty</th><th>Entry</th><th>Current</th><th>Gain</th></tr>");
        for row in &self.open_rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} ({}%)</td></tr>",
                row.symbol, row.quantity, row.entry_price, row.current_price, row.gain,
                row.gain_pct
            ));
        }
        html.push_str("</table><h2>Closed</h2><table><tr><th>Symbol</th><th>Qty</th><th>Entry</th><th>Exit</th><th>Gain</th></tr>");
        for row in &self.closed_rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                row.symbol, row.quantity, row.entry_price, row.exit_price, row.gain
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "cash.html")]
pub struct CashTemplate {
    pub deposits: Vec<CashRow>,
    pub withdrawals: Vec<CashRow>,
    pub returns: Vec<CashRow>,
}

impl CashTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Cash</h1>");
        for (title, rows) in [
            ("Deposits", &self.deposits),
            ("Withdrawals", &self.withdrawals),
            ("Returns", &self.returns),
        ] {
            html.push_str(&format!("<h2>{}</h2><table>", title));
            for row in rows {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    row.date, row.amount, row.note
                ));
            }
            html.push_str("</table>");
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Template)]
#[template(path = "sectors.html")]
pub struct SectorsTemplate {
    pub targets: Vec<TargetRow>,
    pub total_pct: String,
}

impl SectorsTemplate {
    pub fn fragment(&self) -> String {
        let mut html =
            String::from("<div id=\"content\"><h1>Sector Targets</h1><table>");
        for row in &self.targets {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}%</td></tr>",
                row.sector, row.target_pct
            ));
        }
        html.push_str(&format!(
            "<tr><td><strong>Total</strong></td><td>{}%</td></tr></table></div>",
            self.total_pct
        ));
        html
    }
}

#[derive(Template)]
#[template(path = "risk.html")]
pub struct RiskTemplate {
    pub benchmark: String,
    pub symbols: String,
    pub have_data: bool,
    pub beta: String,
    pub sharpe: String,
    pub max_drawdown_pct: String,
}

impl RiskTemplate {
    pub fn fragment(&self) -> String {
        if !self.have_data {
            return String::from(
                "<div id=\"content\"><h1>Risk</h1><p>No open positions with enough history.</p></div>",
            );
        }
        format!(
            "<div id=\"content\"><h1>Risk vs {}</h1><table>\
             <tr><td>Beta</td><td>{}</td></tr>\
             <tr><td>Sharpe Ratio</td><td>{}</td></tr>\
             <tr><td>Max Drawdown</td><td>{}%</td></tr>\
             </table><p>Portfolio: {}</p></div>",
            self.benchmark, self.beta, self.sharpe, self.max_drawdown_pct, self.symbols
        )
    }
}

pub struct FibRow {
    pub ratio_pct: String,
    pub price: String,
}

#[derive(Template)]
#[template(path = "levels.html")]
pub struct LevelsTemplate {
    pub symbol: String,
    pub bars: usize,
    pub has_levels: bool,
    pub pp: String,
    pub r1: String,
    pub s1: String,
    pub r2: String,
    pub s2: String,
    pub fibs: Vec<FibRow>,
    pub max_price: String,
    pub min_price: String,
}

impl LevelsTemplate {
    pub fn insufficient(symbol: String, bars: usize) -> Self {
        LevelsTemplate {
            symbol,
            bars,
            has_levels: false,
            pp: String::new(),
            r1: String::new(),
            s1: String::new(),
            r2: String::new(),
            s2: String::new(),
            fibs: Vec::new(),
            max_price: String::new(),
            min_price: String::new(),
        }
    }

    pub fn from_levels(symbol: String, bars: usize, levels: &TechnicalLevels) -> Self {
        LevelsTemplate {
            symbol,
            bars,
            has_levels: true,
            pp: money(levels.pivots.pp),
            r1: money(levels.pivots.r1),
            s1: money(levels.pivots.s1),
            r2: money(levels.pivots.r2),
            s2: money(levels.pivots.s2),
            fibs: levels
                .fibonacci
                .iter()
                .map(|f| FibRow {
                    ratio_pct: pct(f.ratio * 100.0),
                    price: money(f.price),
                })
                .collect(),
            max_price: money(levels.max_price),
            min_price: money(levels.min_price),
        }
    }

    pub fn fragment(&self) -> String {
        if !self.has_levels {
            return format!(
                "<div id=\"content\"><h1>{}</h1><p>Insufficient history: {} bars.</p></div>",
                self.symbol, self.bars
            );
        }
        let mut html = format!(
            "<div id=\"content\"><h1>{} Levels</h1>\
             <h2>Pivot Points</h2><table>\
             <tr><td>R2</td><td>{}</td></tr>\
             <tr><td>R1</td><td>{}</td></tr>\
             <tr><td>PP</td><td>{}</td></tr>\
             <tr><td>S1</td><td>{}</td></tr>\
             <tr><td>S2</td><td>{}</td></tr>\
             </table><h2>Fibonacci</h2><table>",
            self.symbol, self.r2, self.r1, self.pp, self.s1, self.s2
        );
        for fib in &self.fibs {
            html.push_str(&format!(
                "<tr><td>{}%</td><td>{}</td></tr>",
                fib.ratio_pct, fib.price
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    /// Empty when there is nothing to report.
    pub error: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

impl<'a> ErrorTemplate<'a> {
    pub fn fragment(&self) -> String {
        format!(
            "<div id=\"error\" class=\"error\"><h1>Error {}</h1><p>{}</p></div>",
            self.status, self.message
        )
    }
}

// askama_axum only implements `IntoResponse` for axum 0.7; this crate is on
// axum 0.8, so provide the equivalent impls here.
macro_rules! impl_into_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl axum::response::IntoResponse for $ty {
                fn into_response(self) -> axum::response::Response {
                    match self.render() {
                        Ok(html) => axum::response::Html(html).into_response(),
                        Err(err) => (
                            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                            err.to_string(),
                        )
                            .into_response(),
                    }
                }
            }
        )*
    };
}

impl_into_response!(
    DashboardTemplate,
    TradesTemplate,
    CashTemplate,
    SectorsTemplate,
    RiskTemplate,
    LevelsTemplate,
    LoginTemplate,
);
