#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use foliotrack::adapters::sqlite_ledger_adapter::SqliteLedgerAdapter;
use foliotrack::adapters::web::AppState;
use foliotrack::domain::cash::{CashEvent, CashKind};
pub use foliotrack::domain::quote::{OhlcvBar, Quote};
use foliotrack::domain::trade::{StrategyKind, Trade, TradeStatus};
use foliotrack::ports::config_port::ConfigPort;
use foliotrack::ports::quote_port::QuotePort;

pub struct MockQuotePort {
    pub quotes: HashMap<String, Quote>,
    pub histories: HashMap<String, Vec<OhlcvBar>>,
    pub period_histories: HashMap<(String, String), Vec<OhlcvBar>>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            histories: HashMap::new(),
            period_histories: HashMap::new(),
        }
    }

    pub fn with_quote(mut self, symbol: &str, price: f64, prev_close: f64) -> Self {
        self.quotes
            .insert(symbol.to_string(), Quote { price, prev_close });
        self
    }

    pub fn with_history(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.histories.insert(symbol.to_string(), bars);
        self
    }

    /// History served only when the caller asks for exactly this period.
    pub fn with_history_for_period(
        mut self,
        symbol: &str,
        period: &str,
        bars: Vec<OhlcvBar>,
    ) -> Self {
        self.period_histories
            .insert((symbol.to_string(), period.to_string()), bars);
        self
    }
}

#[async_trait]
impl QuotePort for MockQuotePort {
    async fn batch_quote(&self, symbols: &[String]) -> HashMap<String, Quote> {
        symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).map(|q| (s.clone(), *q)))
            .collect()
    }

    async fn history(&self, symbol: &str, period: &str, _interval: &str) -> Vec<OhlcvBar> {
        if let Some(bars) = self
            .period_histories
            .get(&(symbol.to_string(), period.to_string()))
        {
            return bars.clone();
        }
        self.histories.get(symbol).cloned().unwrap_or_default()
    }
}

pub struct MockConfigPort {
    pub strings: HashMap<(String, String), String>,
}

impl MockConfigPort {
    pub fn new() -> Self {
        Self {
            strings: HashMap::new(),
        }
    }

    pub fn with_string(mut self, section: &str, key: &str, value: &str) -> Self {
        self.strings
            .insert((section.to_string(), key.to_string()), value.to_string());
        self
    }
}

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.strings
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn open_trade(symbol: &str, company: &str, sector: &str, quantity: f64, entry: f64) -> Trade {
    Trade {
        id: 0,
        symbol: symbol.to_string(),
        company: company.to_string(),
        sector: sector.to_string(),
        strategy: StrategyKind::Investment,
        status: TradeStatus::Open,
        quantity,
        entry_price: entry,
        exit_price: None,
        entry_date: date("2024-01-15"),
        exit_date: None,
    }
}

pub fn closed_trade(
    symbol: &str,
    company: &str,
    sector: &str,
    quantity: f64,
    entry: f64,
    exit: f64,
) -> Trade {
    Trade {
        status: TradeStatus::Closed,
        exit_price: Some(exit),
        exit_date: Some(date("2024-06-01")),
        ..open_trade(symbol, company, sector, quantity, entry)
    }
}

pub fn deposit(amount: f64) -> CashEvent {
    CashEvent {
        id: 0,
        kind: CashKind::Deposit,
        date: date("2024-01-02"),
        amount,
        note: None,
        symbol: None,
    }
}

/// A daily walk of `count` bars from `start`, closes stepping by `step`.
pub fn generate_bars(start: &str, count: usize, start_close: f64, step: f64) -> Vec<OhlcvBar> {
    let first = date(start);
    (0..count)
        .map(|i| {
            let close = start_close + step * i as f64;
            OhlcvBar {
                date: first + chrono::Duration::days(i as i64),
                open: close - 1.0,
                high: close + 2.0,
                low: close - 2.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

pub fn in_memory_ledger() -> SqliteLedgerAdapter {
    let ledger = SqliteLedgerAdapter::in_memory().unwrap();
    ledger.initialize_schema().unwrap();
    ledger
}

pub fn make_state(
    ledger: SqliteLedgerAdapter,
    quotes: MockQuotePort,
    config: MockConfigPort,
) -> AppState {
    AppState {
        ledger: Arc::new(ledger),
        quotes: Arc::new(quotes),
        config: Arc::new(config),
    }
}
