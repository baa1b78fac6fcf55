//! HTTP request handlers for the web adapter.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::csv_ledger_io;
use crate::domain::cash::{CashEvent, CashKind};
use crate::domain::levels::compute_levels;
use crate::domain::recommend::recommend;
use crate::domain::risk::compute_risk;
use crate::domain::sector::{aggregate_sectors, lookup_symbol, SYMBOL_UNIVERSE};
use crate::domain::trade::{StrategyKind, Trade, TradeStatus};
use crate::domain::valuation::{compute_summary, EnrichedTrade, PortfolioSummary};
use crate::domain::quote::Quote;

use super::auth::Credentials;
use super::templates::{
    CashRow, CashTemplate, DashboardTemplate, LevelsTemplate, LoginTemplate, RiskTemplate,
    SectorsTemplate, SymbolOption, TargetRow, TradeRow, TradesTemplate,
};
use super::{is_htmx_request, AppState, AuthSession, WebError};

const DATE_FMT: &str = "%Y-%m-%d";

fn parse_form_date(value: &str, name: &str) -> Result<NaiveDate, WebError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FMT)
        .map_err(|_| WebError::bad_request(format!("Invalid {name} (expected YYYY-MM-DD)")))
}

fn parse_form_f64(value: &str, name: &str) -> Result<f64, WebError> {
    value
        .trim()
        .parse()
        .map_err(|_| WebError::bad_request(format!("Invalid {name}")))
}

fn open_symbols(trades: &[Trade]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for trade in trades.iter().filter(|t| t.is_open()) {
        if !symbols.contains(&trade.symbol) {
            symbols.push(trade.symbol.clone());
        }
    }
    symbols
}

/// Ledger snapshot plus live quotes, evaluated once per request.
async fn load_portfolio(
    state: &AppState,
) -> Result<(Vec<Trade>, PortfolioSummary, Vec<EnrichedTrade>, HashMap<String, Quote>), WebError> {
    let trades = state.ledger.list_trades()?;
    let deposits = state.ledger.list_cash(CashKind::Deposit)?;
    let withdrawals = state.ledger.list_cash(CashKind::Withdrawal)?;
    let returns = state.ledger.list_cash(CashKind::ReturnGrant)?;

    let symbols = open_symbols(&trades);
    let quotes = state.quotes.batch_quote(&symbols).await;

    let (summary, enriched) =
        compute_summary(&trades, &deposits, &withdrawals, &returns, &quotes);
    Ok((trades, summary, enriched, quotes))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let (trades, summary, enriched, quotes) = load_portfolio(&state).await?;
    let targets = state.ledger.list_sector_targets()?;
    let allocations = aggregate_sectors(&enriched, &targets);
    let held = open_symbols(&trades);
    let recommendations = recommend(&allocations, &targets, summary.cost_open, &held);

    let template =
        DashboardTemplate::from_parts(&summary, &enriched, &allocations, &recommendations, &quotes);

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        Ok(template.into_response())
    }
}

pub async fn trades_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let (_, _, enriched, _) = load_portfolio(&state).await?;

    let template = TradesTemplate {
        open_rows: enriched
            .iter()
            .filter(|r| r.trade.is_open())
            .map(TradeRow::from)
            .collect(),
        closed_rows: enriched
            .iter()
            .filter(|r| r.trade.is_closed())
            .map(TradeRow::from)
            .collect(),
        symbols: SYMBOL_UNIVERSE
            .iter()
            .map(|(symbol, company, sector)| SymbolOption {
                symbol: (*symbol).to_string(),
                company: (*company).to_string(),
                sector: (*sector).to_string(),
            })
            .collect(),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        Ok(template.into_response())
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TradeFormData {
    pub symbol: String,
    pub strategy: String,
    pub quantity: String,
    pub entry_price: String,
    pub entry_date: String,
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TradeFormData>,
) -> Result<Response, WebError> {
    let symbol = form.symbol.trim().to_uppercase();
    let (company, sector) = lookup_symbol(&symbol)
        .ok_or_else(|| WebError::bad_request(format!("Unknown symbol {symbol}")))?;
    let strategy = StrategyKind::parse(form.strategy.trim())
        .ok_or_else(|| WebError::bad_request("Invalid strategy"))?;

    let trade = Trade {
        id: 0,
        symbol,
        company: company.to_string(),
        sector: sector.to_string(),
        strategy,
        status: TradeStatus::Open,
        quantity: parse_form_f64(&form.quantity, "quantity")?,
        entry_price: parse_form_f64(&form.entry_price, "entry price")?,
        exit_price: None,
        entry_date: parse_form_date(&form.entry_date, "entry date")?,
        exit_date: None,
    };

    state.ledger.insert_trade(&trade)?;
    Ok(Redirect::to("/trades").into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct CloseFormData {
    pub exit_price: String,
    pub exit_date: String,
}

pub async fn close_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<CloseFormData>,
) -> Result<Response, WebError> {
    let exit_price = parse_form_f64(&form.exit_price, "exit price")?;
    let exit_date = parse_form_date(&form.exit_date, "exit date")?;
    state.ledger.close_trade(id, exit_price, exit_date)?;
    Ok(Redirect::to("/trades").into_response())
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    state.ledger.delete_trade(id)?;
    Ok(Redirect::to("/trades").into_response())
}

pub async fn cash_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let deposits = state.ledger.list_cash(CashKind::Deposit)?;
    let withdrawals = state.ledger.list_cash(CashKind::Withdrawal)?;
    let returns = state.ledger.list_cash(CashKind::ReturnGrant)?;

    let template = CashTemplate {
        deposits: deposits.iter().map(CashRow::from).collect(),
        withdrawals: withdrawals.iter().map(CashRow::from).collect(),
        returns: returns.iter().map(CashRow::from).collect(),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        Ok(template.into_response())
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct CashFormData {
    pub kind: String,
    pub date: String,
    pub amount: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub symbol: String,
}

pub async fn create_cash(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CashFormData>,
) -> Result<Response, WebError> {
    let kind = CashKind::parse(form.kind.trim())
        .ok_or_else(|| WebError::bad_request("Invalid cash event kind"))?;

    let note = form.note.trim();
    let symbol = form.symbol.trim();
    let event = CashEvent {
        id: 0,
        kind,
        date: parse_form_date(&form.date, "date")?,
        amount: parse_form_f64(&form.amount, "amount")?,
        note: (!note.is_empty()).then(|| note.to_string()),
        symbol: (!symbol.is_empty()).then(|| symbol.to_uppercase()),
    };

    state.ledger.insert_cash(&event)?;
    Ok(Redirect::to("/cash").into_response())
}

pub async fn delete_cash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    state.ledger.delete_cash(id)?;
    Ok(Redirect::to("/cash").into_response())
}

pub async fn sectors_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let targets = state.ledger.list_sector_targets()?;
    let total: f64 = targets.iter().map(|t| t.target_pct).sum();

    let template = SectorsTemplate {
        targets: targets.iter().map(TargetRow::from).collect(),
        total_pct: format!("{:.1}", total),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        Ok(template.into_response())
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TargetFormData {
    pub sector: String,
    pub target_pct: String,
}

pub async fn set_sector_target(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TargetFormData>,
) -> Result<Response, WebError> {
    let sector = form.sector.trim();
    if sector.is_empty() {
        return Err(WebError::bad_request("Sector is required"));
    }
    let target_pct = parse_form_f64(&form.target_pct, "target percentage")?;
    if !(0.0..=100.0).contains(&target_pct) {
        return Err(WebError::bad_request("Target must be between 0 and 100"));
    }

    state.ledger.set_sector_target(sector, target_pct)?;
    Ok(Redirect::to("/sectors").into_response())
}

pub async fn risk_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let trades = state.ledger.list_trades()?;
    let symbols = open_symbols(&trades);

    let benchmark_symbol = state
        .config
        .get_string("quotes", "benchmark")
        .unwrap_or_else(|| "^GSPC".to_string());
    let period = state
        .config
        .get_string("quotes", "history_period")
        .unwrap_or_else(|| "6mo".to_string());
    let risk_free = state.config.get_double("quotes", "risk_free_rate", 0.05);

    let mut series = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        series.push(state.quotes.history(symbol, &period, "1d").await);
    }
    let benchmark = state.quotes.history(&benchmark_symbol, &period, "1d").await;

    let have_data =
        !symbols.is_empty() && !benchmark.is_empty() && series.iter().all(|s| !s.is_empty());
    let metrics = compute_risk(&series, &benchmark, risk_free);

    let template = RiskTemplate {
        benchmark: benchmark_symbol,
        symbols: symbols.join(", "),
        have_data,
        beta: format!("{:.2}", metrics.beta),
        sharpe: format!("{:.2}", metrics.sharpe),
        max_drawdown_pct: format!("{:.1}", metrics.max_drawdown * 100.0),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        Ok(template.into_response())
    }
}

pub async fn levels_page(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let symbol = symbol.trim().to_uppercase();
    let period = state
        .config
        .get_string("quotes", "levels_period")
        .unwrap_or_else(|| "6mo".to_string());

    let bars = state.quotes.history(&symbol, &period, "1d").await;

    // Below the minimum window the page renders a notice instead of failing.
    let template = match compute_levels(&bars) {
        Some(levels) => LevelsTemplate::from_levels(symbol, bars.len(), &levels),
        None => LevelsTemplate::insufficient(symbol, bars.len()),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        Ok(template.into_response())
    }
}

pub async fn export_trades_csv(
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let trades = state.ledger.list_trades()?;
    let csv = csv_ledger_io::export_trades(&trades)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"trades.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn export_cash_csv(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let mut events = state.ledger.list_cash(CashKind::Deposit)?;
    events.extend(state.ledger.list_cash(CashKind::Withdrawal)?);
    events.extend(state.ledger.list_cash(CashKind::ReturnGrant)?);
    events.sort_by_key(|e| e.date);

    let csv = csv_ledger_io::export_cash(&events)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"cash.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct ImportFormData {
    pub csv: String,
}

pub async fn import_trades(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ImportFormData>,
) -> Result<Response, WebError> {
    let trades = csv_ledger_io::import_trades(&form.csv)?;
    for trade in &trades {
        state.ledger.insert_trade(trade)?;
    }
    Ok(Redirect::to("/trades").into_response())
}

pub async fn import_cash(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ImportFormData>,
) -> Result<Response, WebError> {
    let events = csv_ledger_io::import_cash(&form.csv)?;
    for event in &events {
        state.ledger.insert_cash(event)?;
    }
    Ok(Redirect::to("/cash").into_response())
}

pub async fn login_form() -> Response {
    LoginTemplate {
        error: String::new(),
    }
    .into_response()
}

pub async fn login(
    mut auth_session: AuthSession,
    Form(creds): Form<Credentials>,
) -> Result<Response, WebError> {
    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let template = LoginTemplate {
                error: "Invalid username or password".to_string(),
            };
            return Ok(template.into_response());
        }
        Err(_) => return Err(WebError::internal("Authentication backend failure")),
    };

    if auth_session.login(&user).await.is_err() {
        return Err(WebError::internal("Failed to establish session"));
    }
    Ok(Redirect::to("/").into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Response, WebError> {
    if auth_session.logout().await.is_err() {
        return Err(WebError::internal("Failed to clear session"));
    }
    Ok(Redirect::to("/login").into_response())
}

pub async fn not_found() -> Response {
    WebError::not_found("Page not found").into_response()
}
