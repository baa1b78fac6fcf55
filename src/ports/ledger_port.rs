//! Ledger store port: read snapshots of the four record kinds and the write
//! intents the storage adapter executes transactionally.

use chrono::NaiveDate;

use crate::domain::cash::{CashEvent, CashKind};
use crate::domain::error::FoliotrackError;
use crate::domain::sector::SectorTarget;
use crate::domain::trade::Trade;

pub trait LedgerPort {
    fn list_trades(&self) -> Result<Vec<Trade>, FoliotrackError>;

    fn get_trade(&self, id: i64) -> Result<Option<Trade>, FoliotrackError>;

    /// Insert a validated trade; the stored id is returned and any id on the
    /// argument is ignored.
    fn insert_trade(&self, trade: &Trade) -> Result<i64, FoliotrackError>;

    fn update_trade(&self, trade: &Trade) -> Result<(), FoliotrackError>;

    /// Open → Closed transition. Irreversible in the normal flow.
    fn close_trade(
        &self,
        id: i64,
        exit_price: f64,
        exit_date: NaiveDate,
    ) -> Result<(), FoliotrackError>;

    fn delete_trade(&self, id: i64) -> Result<(), FoliotrackError>;

    fn list_cash(&self, kind: CashKind) -> Result<Vec<CashEvent>, FoliotrackError>;

    fn insert_cash(&self, event: &CashEvent) -> Result<i64, FoliotrackError>;

    fn delete_cash(&self, id: i64) -> Result<(), FoliotrackError>;

    fn list_sector_targets(&self) -> Result<Vec<SectorTarget>, FoliotrackError>;

    fn set_sector_target(&self, sector: &str, target_pct: f64) -> Result<(), FoliotrackError>;
}
