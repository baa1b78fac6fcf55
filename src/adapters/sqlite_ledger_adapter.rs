//! SQLite ledger store adapter.
//!
//! One pooled connection is acquired per operation and dropped on every exit
//! path; no transaction spans more than one user interaction. Concurrent
//! writers are last-write-wins, which is acceptable for a single-operator
//! tool.

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};

use crate::domain::cash::{CashEvent, CashKind};
use crate::domain::error::FoliotrackError;
use crate::domain::sector::{self, SectorTarget};
use crate::domain::trade::{StrategyKind, Trade, TradeStatus};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;

const DATE_FMT: &str = "%Y-%m-%d";

pub struct SqliteLedgerAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: r2d2::Error) -> FoliotrackError {
    FoliotrackError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> FoliotrackError {
    FoliotrackError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, FoliotrackError> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| FoliotrackError::Database {
        reason: format!("bad date {s}: {e}"),
    })
}

impl SqliteLedgerAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FoliotrackError> {
        let db_path =
            config
                .get_string("ledger", "path")
                .ok_or_else(|| FoliotrackError::ConfigMissing {
                    section: "ledger".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("ledger", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, FoliotrackError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;
        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                company TEXT NOT NULL,
                sector TEXT NOT NULL,
                strategy TEXT NOT NULL,
                status TEXT NOT NULL,
                quantity REAL NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL,
                entry_date TEXT NOT NULL,
                exit_date TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status);
            CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol);
            CREATE TABLE IF NOT EXISTS cash_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                amount REAL NOT NULL,
                note TEXT,
                symbol TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_cash_kind ON cash_events(kind);
            CREATE TABLE IF NOT EXISTS sector_targets (
                sector TEXT PRIMARY KEY,
                target_pct REAL NOT NULL
            );",
        )
        .map_err(query_err)?;

        // A fresh database renders a meaningful allocation screen.
        for target in sector::default_targets() {
            conn.execute(
                "INSERT OR IGNORE INTO sector_targets (sector, target_pct) VALUES (?1, ?2)",
                params![target.sector, target.target_pct],
            )
            .map_err(query_err)?;
        }

        Ok(())
    }

    fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, TradeRaw)> {
        Ok((
            row.get(0)?,
            TradeRaw {
                symbol: row.get(1)?,
                company: row.get(2)?,
                sector: row.get(3)?,
                strategy: row.get(4)?,
                status: row.get(5)?,
                quantity: row.get(6)?,
                entry_price: row.get(7)?,
                exit_price: row.get(8)?,
                entry_date: row.get(9)?,
                exit_date: row.get(10)?,
            },
        ))
    }
}

/// Row image before text columns are decoded into domain enums/dates.
struct TradeRaw {
    symbol: String,
    company: String,
    sector: String,
    strategy: String,
    status: String,
    quantity: f64,
    entry_price: f64,
    exit_price: Option<f64>,
    entry_date: String,
    exit_date: Option<String>,
}

impl TradeRaw {
    fn decode(self, id: i64) -> Result<Trade, FoliotrackError> {
        let status =
            TradeStatus::parse(&self.status).ok_or_else(|| FoliotrackError::Database {
                reason: format!("unknown trade status {:?}", self.status),
            })?;
        let strategy =
            StrategyKind::parse(&self.strategy).ok_or_else(|| FoliotrackError::Database {
                reason: format!("unknown strategy {:?}", self.strategy),
            })?;
        let exit_date = match self.exit_date {
            Some(s) => Some(parse_date(&s)?),
            None => None,
        };
        Ok(Trade {
            id,
            symbol: self.symbol,
            company: self.company,
            sector: self.sector,
            strategy,
            status,
            quantity: self.quantity,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            entry_date: parse_date(&self.entry_date)?,
            exit_date,
        })
    }
}

const TRADE_COLUMNS: &str = "id, symbol, company, sector, strategy, status, quantity, \
                             entry_price, exit_price, entry_date, exit_date";

impl LedgerPort for SqliteLedgerAdapter {
    fn list_trades(&self) -> Result<Vec<Trade>, FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades ORDER BY entry_date, id");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map([], Self::trade_from_row)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            let (id, raw) = row.map_err(query_err)?;
            trades.push(raw.decode(id)?);
        }
        Ok(trades)
    }

    fn get_trade(&self, id: i64) -> Result<Option<Trade>, FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1");
        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let mut rows = stmt
            .query_map(params![id], Self::trade_from_row)
            .map_err(query_err)?;

        match rows.next() {
            Some(row) => {
                let (id, raw) = row.map_err(query_err)?;
                Ok(Some(raw.decode(id)?))
            }
            None => Ok(None),
        }
    }

    fn insert_trade(&self, trade: &Trade) -> Result<i64, FoliotrackError> {
        trade.validate()?;
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute(
            "INSERT INTO trades (symbol, company, sector, strategy, status, quantity, \
             entry_price, exit_price, entry_date, exit_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                trade.symbol,
                trade.company,
                trade.sector,
                trade.strategy.as_str(),
                trade.status.as_str(),
                trade.quantity,
                trade.entry_price,
                trade.exit_price,
                trade.entry_date.format(DATE_FMT).to_string(),
                trade.exit_date.map(|d| d.format(DATE_FMT).to_string()),
            ],
        )
        .map_err(query_err)?;

        Ok(conn.last_insert_rowid())
    }

    fn update_trade(&self, trade: &Trade) -> Result<(), FoliotrackError> {
        trade.validate()?;
        let conn = self.pool.get().map_err(db_err)?;

        let changed = conn
            .execute(
                "UPDATE trades SET symbol = ?1, company = ?2, sector = ?3, strategy = ?4, \
                 status = ?5, quantity = ?6, entry_price = ?7, exit_price = ?8, \
                 entry_date = ?9, exit_date = ?10 WHERE id = ?11",
                params![
                    trade.symbol,
                    trade.company,
                    trade.sector,
                    trade.strategy.as_str(),
                    trade.status.as_str(),
                    trade.quantity,
                    trade.entry_price,
                    trade.exit_price,
                    trade.entry_date.format(DATE_FMT).to_string(),
                    trade.exit_date.map(|d| d.format(DATE_FMT).to_string()),
                    trade.id,
                ],
            )
            .map_err(query_err)?;

        if changed == 0 {
            return Err(FoliotrackError::DatabaseQuery {
                reason: format!("no trade with id {}", trade.id),
            });
        }
        Ok(())
    }

    fn close_trade(
        &self,
        id: i64,
        exit_price: f64,
        exit_date: NaiveDate,
    ) -> Result<(), FoliotrackError> {
        if !exit_price.is_finite() || exit_price < 0.0 {
            return Err(FoliotrackError::InvalidTrade {
                reason: format!("exit price must be non-negative, got {exit_price}"),
            });
        }
        let conn = self.pool.get().map_err(db_err)?;

        let changed = conn
            .execute(
                "UPDATE trades SET status = 'closed', exit_price = ?1, exit_date = ?2 \
                 WHERE id = ?3 AND status = 'open'",
                params![exit_price, exit_date.format(DATE_FMT).to_string(), id],
            )
            .map_err(query_err)?;

        if changed == 0 {
            return Err(FoliotrackError::DatabaseQuery {
                reason: format!("no open trade with id {id}"),
            });
        }
        Ok(())
    }

    fn delete_trade(&self, id: i64) -> Result<(), FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.execute("DELETE FROM trades WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(())
    }

    fn list_cash(&self, kind: CashKind) -> Result<Vec<CashEvent>, FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, date, amount, note, symbol FROM cash_events \
                 WHERE kind = ?1 ORDER BY date, id",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![kind.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(query_err)?;

        let mut events = Vec::new();
        for row in rows {
            let (id, date, amount, note, symbol) = row.map_err(query_err)?;
            events.push(CashEvent {
                id,
                kind,
                date: parse_date(&date)?,
                amount,
                note,
                symbol,
            });
        }
        Ok(events)
    }

    fn insert_cash(&self, event: &CashEvent) -> Result<i64, FoliotrackError> {
        event.validate()?;
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute(
            "INSERT INTO cash_events (kind, date, amount, note, symbol) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.kind.as_str(),
                event.date.format(DATE_FMT).to_string(),
                event.amount,
                event.note,
                event.symbol,
            ],
        )
        .map_err(query_err)?;

        Ok(conn.last_insert_rowid())
    }

    fn delete_cash(&self, id: i64) -> Result<(), FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.execute("DELETE FROM cash_events WHERE id = ?1", params![id])
            .map_err(query_err)?;
        Ok(())
    }

    fn list_sector_targets(&self) -> Result<Vec<SectorTarget>, FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare("SELECT sector, target_pct FROM sector_targets ORDER BY sector")
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SectorTarget {
                    sector: row.get(0)?,
                    target_pct: row.get(1)?,
                })
            })
            .map_err(query_err)?;

        let mut targets = Vec::new();
        for row in rows {
            targets.push(row.map_err(query_err)?);
        }
        Ok(targets)
    }

    fn set_sector_target(&self, sector: &str, target_pct: f64) -> Result<(), FoliotrackError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO sector_targets (sector, target_pct) VALUES (?1, ?2)",
            params![sector, target_pct],
        )
        .map_err(query_err)?;
        Ok(())
    }
}
