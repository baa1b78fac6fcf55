//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_ledger_io;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_ledger_adapter::SqliteLedgerAdapter;
use crate::adapters::yahoo_quote_adapter::YahooQuoteAdapter;
use crate::domain::cash::CashKind;
use crate::domain::error::FoliotrackError;
use crate::domain::levels::compute_levels;
use crate::domain::risk::compute_risk;
use crate::domain::sector::aggregate_sectors;
use crate::domain::valuation::compute_summary;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

#[derive(Parser, Debug)]
#[command(name = "foliotrack", about = "Personal portfolio tracking dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the portfolio summary with live quotes
    Summary {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print risk metrics for the open portfolio
    Risk {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print technical levels for one symbol
    Levels {
        #[arg(short, long)]
        config: PathBuf,
        symbol: String,
    },
    /// Create the ledger schema and seed sector targets
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import trades or cash events from a CSV file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// "trades" or "cash"
        #[arg(long)]
        kind: String,
        file: PathBuf,
    },
    /// Export trades or cash events as CSV to stdout
    Export {
        #[arg(short, long)]
        config: PathBuf,
        /// "trades" or "cash"
        #[arg(long)]
        kind: String,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Summary { config } => run_summary(&config),
        Command::Risk { config } => run_risk(&config),
        Command::Levels { config, symbol } => run_levels(&config, &symbol),
        Command::InitDb { config } => run_init_db(&config),
        Command::Import { config, kind, file } => run_import(&config, &kind, &file),
        Command::Export { config, kind } => run_export(&config, &kind),
        Command::HashPassword => run_hash_password(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FoliotrackError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn open_ledger(config: &dyn ConfigPort) -> Result<SqliteLedgerAdapter, ExitCode> {
    SqliteLedgerAdapter::from_config(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    use crate::adapters::web::{build_router, AppState};
    use std::net::SocketAddr;

    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let ledger = match open_ledger(&config) {
        Ok(l) => l,
        Err(code) => return code,
    };
    if let Err(e) = ledger.initialize_schema() {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }

    let quotes = match YahooQuoteAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let addr: SocketAddr = config
        .get_string("web", "listen")
        .unwrap_or_else(|| "127.0.0.1:3000".to_string())
        .parse()
        .unwrap_or_else(|_| ([127, 0, 0, 1], 3000).into());

    eprintln!("Starting web server on {}", addr);

    let state = AppState {
        ledger: Arc::new(ledger),
        quotes: Arc::new(quotes),
        config: Arc::new(config),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result: std::io::Result<()> = runtime.block_on(async {
        let router = build_router(state).await;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: server failed: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_summary(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let ledger = match open_ledger(&config) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let trades = match ledger.list_trades() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let deposits = match ledger.list_cash(CashKind::Deposit) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let withdrawals = match ledger.list_cash(CashKind::Withdrawal) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let returns = match ledger.list_cash(CashKind::ReturnGrant) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let mut symbols: Vec<String> = Vec::new();
    for trade in trades.iter().filter(|t| t.is_open()) {
        if !symbols.contains(&trade.symbol) {
            symbols.push(trade.symbol.clone());
        }
    }

    eprintln!("Fetching quotes for {} symbols...", symbols.len());
    let quotes_adapter = match YahooQuoteAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };
    let quotes = runtime.block_on(quotes_adapter.batch_quote(&symbols));

    let (summary, enriched) =
        compute_summary(&trades, &deposits, &withdrawals, &returns, &quotes);

    eprintln!("\n=== Portfolio Summary ===");
    eprintln!("Equity:           {:.2}", summary.equity);
    eprintln!("Cash:             {:.2}", summary.cash);
    eprintln!("Open cost:        {:.2}", summary.cost_open);
    eprintln!("Open market:      {:.2}", summary.market_val_open);
    eprintln!("Unrealized P&L:   {:.2}", summary.unrealized_pl);
    eprintln!("Realized P&L:     {:.2}", summary.realized_pl);
    eprintln!("Deposited:        {:.2}", summary.total_deposited);
    eprintln!("Withdrawn:        {:.2}", summary.total_withdrawn);
    eprintln!("Returns:          {:.2}", summary.total_returns);

    let open_rows: Vec<_> = enriched.iter().filter(|r| r.trade.is_open()).collect();
    if !open_rows.is_empty() {
        eprintln!("\n=== Open Positions ===");
        for row in &open_rows {
            let sign = if row.gain >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} @ {:.2} -> {:.2}, {}{:.2} ({}{:.1}%), weight {:.1}%",
                row.trade.symbol,
                row.trade.quantity,
                row.trade.entry_price,
                row.current_price,
                sign,
                row.gain,
                sign,
                row.gain_pct,
                row.weight * 100.0,
            );
        }
    }

    match ledger.list_sector_targets() {
        Ok(targets) => {
            let allocations = aggregate_sectors(&enriched, &targets);
            if !allocations.is_empty() {
                eprintln!("\n=== Sector Allocation ===");
                for a in &allocations {
                    eprintln!(
                        "  {}:  {:.1}% of {:.2} (target {:.1}%, remaining {:.2})",
                        a.sector, a.current_weight, summary.cost_open, a.target_weight,
                        a.remaining_to_target,
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("warning: could not load sector targets ({e})");
        }
    }

    ExitCode::SUCCESS
}

fn run_risk(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let ledger = match open_ledger(&config) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let trades = match ledger.list_trades() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let mut symbols: Vec<String> = Vec::new();
    for trade in trades.iter().filter(|t| t.is_open()) {
        if !symbols.contains(&trade.symbol) {
            symbols.push(trade.symbol.clone());
        }
    }
    if symbols.is_empty() {
        eprintln!("No open positions; nothing to measure.");
        return ExitCode::SUCCESS;
    }

    let benchmark_symbol = config
        .get_string("quotes", "benchmark")
        .unwrap_or_else(|| "^GSPC".to_string());
    let period = config
        .get_string("quotes", "history_period")
        .unwrap_or_else(|| "6mo".to_string());
    let risk_free = config.get_double("quotes", "risk_free_rate", 0.05);

    eprintln!(
        "Fetching {} history for {} symbols and {}...",
        period,
        symbols.len(),
        benchmark_symbol
    );

    let quotes_adapter = match YahooQuoteAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let (series, benchmark) = runtime.block_on(async {
        let mut series = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            series.push(quotes_adapter.history(symbol, &period, "1d").await);
        }
        let benchmark = quotes_adapter.history(&benchmark_symbol, &period, "1d").await;
        (series, benchmark)
    });

    let metrics = compute_risk(&series, &benchmark, risk_free);

    eprintln!("\n=== Risk vs {} ===", benchmark_symbol);
    eprintln!("Beta:          {:.2}", metrics.beta);
    eprintln!("Sharpe Ratio:  {:.2}", metrics.sharpe);
    eprintln!("Max Drawdown:  {:.1}%", metrics.max_drawdown * 100.0);

    ExitCode::SUCCESS
}

fn run_levels(config_path: &PathBuf, symbol: &str) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbol = symbol.trim().to_uppercase();
    let period = config
        .get_string("quotes", "levels_period")
        .unwrap_or_else(|| "6mo".to_string());

    eprintln!("Fetching {} history for {}...", period, symbol);
    let quotes_adapter = match YahooQuoteAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };
    let bars = runtime.block_on(quotes_adapter.history(&symbol, &period, "1d"));

    let levels = match compute_levels(&bars) {
        Some(l) => l,
        None => {
            let err = FoliotrackError::InsufficientData {
                symbol,
                bars: bars.len(),
                minimum: crate::domain::levels::MIN_BARS,
            };
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    eprintln!("\n=== {} Levels ({} bars) ===", symbol, bars.len());
    eprintln!("Window high:  {:.2}", levels.max_price);
    eprintln!("Window low:   {:.2}", levels.min_price);
    eprintln!("\nPivot points:");
    eprintln!("  R2:  {:.2}", levels.pivots.r2);
    eprintln!("  R1:  {:.2}", levels.pivots.r1);
    eprintln!("  PP:  {:.2}", levels.pivots.pp);
    eprintln!("  S1:  {:.2}", levels.pivots.s1);
    eprintln!("  S2:  {:.2}", levels.pivots.s2);
    eprintln!("\nFibonacci retracements:");
    for fib in &levels.fibonacci {
        eprintln!("  {:>5.1}%:  {:.2}", fib.ratio * 100.0, fib.price);
    }

    ExitCode::SUCCESS
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let ledger = match open_ledger(&config) {
        Ok(l) => l,
        Err(code) => return code,
    };
    match ledger.initialize_schema() {
        Ok(()) => {
            eprintln!("Ledger schema initialized");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_import(config_path: &PathBuf, kind: &str, file: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let ledger = match open_ledger(&config) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let content = match fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", file.display(), e);
            return ExitCode::from(1);
        }
    };

    match kind {
        "trades" => {
            let trades = match csv_ledger_io::import_trades(&content) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            };
            for trade in &trades {
                if let Err(e) = ledger.insert_trade(trade) {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            }
            eprintln!("Imported {} trades", trades.len());
            ExitCode::SUCCESS
        }
        "cash" => {
            let events = match csv_ledger_io::import_cash(&content) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            };
            for event in &events {
                if let Err(e) = ledger.insert_cash(event) {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            }
            eprintln!("Imported {} cash events", events.len());
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("error: unknown import kind {other:?} (expected trades or cash)");
            ExitCode::from(1)
        }
    }
}

fn run_export(config_path: &PathBuf, kind: &str) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let ledger = match open_ledger(&config) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let csv = match kind {
        "trades" => ledger
            .list_trades()
            .and_then(|trades| csv_ledger_io::export_trades(&trades)),
        "cash" => {
            let events = ledger.list_cash(CashKind::Deposit).and_then(|mut events| {
                events.extend(ledger.list_cash(CashKind::Withdrawal)?);
                events.extend(ledger.list_cash(CashKind::ReturnGrant)?);
                events.sort_by_key(|e| e.date);
                Ok(events)
            });
            events.and_then(|events| csv_ledger_io::export_cash(&events))
        }
        other => {
            eprintln!("error: unknown export kind {other:?} (expected trades or cash)");
            return ExitCode::from(1);
        }
    };

    match csv {
        Ok(csv) => {
            print!("{csv}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_hash_password() -> ExitCode {
    use argon2::{
        password_hash::SaltString, Algorithm, Argon2, Params, PasswordHasher, Version,
    };
    use rand::rngs::OsRng;
    use std::io::{self, BufRead};

    eprintln!("Enter password to hash:");
    let stdin = io::stdin();
    let password = match stdin.lock().lines().next() {
        Some(Ok(line)) => line,
        _ => {
            eprintln!("error: failed to read password from stdin");
            return ExitCode::from(1);
        }
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to hash password: {e}");
            ExitCode::from(1)
        }
    }
}
