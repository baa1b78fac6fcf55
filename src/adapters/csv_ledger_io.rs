//! CSV export and import of ledger records.
//!
//! Export writes a fixed header and one row per record. Import is
//! all-or-nothing against the parser: the first malformed row aborts with its
//! record number, and nothing is returned for the caller to insert.

use chrono::NaiveDate;

use crate::domain::cash::{CashEvent, CashKind};
use crate::domain::error::FoliotrackError;
use crate::domain::trade::{StrategyKind, Trade, TradeStatus};

pub const TRADE_HEADER: [&str; 10] = [
    "symbol",
    "company",
    "sector",
    "strategy",
    "status",
    "quantity",
    "entry_price",
    "exit_price",
    "entry_date",
    "exit_date",
];

pub const CASH_HEADER: [&str; 5] = ["kind", "date", "amount", "note", "symbol"];

const DATE_FMT: &str = "%Y-%m-%d";

fn import_err(record: usize, reason: impl Into<String>) -> FoliotrackError {
    FoliotrackError::CsvImport {
        record,
        reason: reason.into(),
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'a str, FoliotrackError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| import_err(line, format!("missing {name} column")))
}

fn opt_field(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_date_field(value: &str, name: &str, line: usize) -> Result<NaiveDate, FoliotrackError> {
    NaiveDate::parse_from_str(value, DATE_FMT)
        .map_err(|e| import_err(line, format!("invalid {name}: {e}")))
}

fn parse_f64_field(value: &str, name: &str, line: usize) -> Result<f64, FoliotrackError> {
    value
        .parse()
        .map_err(|e| import_err(line, format!("invalid {name}: {e}")))
}

/// Serialize trades with the fixed column order of [`TRADE_HEADER`].
pub fn export_trades(trades: &[Trade]) -> Result<String, FoliotrackError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(TRADE_HEADER)
        .map_err(|e| import_err(0, e.to_string()))?;

    for trade in trades {
        writer
            .write_record([
                trade.symbol.as_str(),
                trade.company.as_str(),
                trade.sector.as_str(),
                trade.strategy.as_str(),
                trade.status.as_str(),
                &trade.quantity.to_string(),
                &trade.entry_price.to_string(),
                &trade
                    .exit_price
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                &trade.entry_date.format(DATE_FMT).to_string(),
                &trade
                    .exit_date
                    .map(|d| d.format(DATE_FMT).to_string())
                    .unwrap_or_default(),
            ])
            .map_err(|e| import_err(0, e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| import_err(0, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| import_err(0, e.to_string()))
}

/// Parse trades from CSV text. Rows are validated through the domain rules
/// before being returned; ids are zero and assigned on insert.
pub fn import_trades(content: &str) -> Result<Vec<Trade>, FoliotrackError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut trades = Vec::new();

    for (i, result) in reader.records().enumerate() {
        // Record 1 is the first data row after the header.
        let line = i + 1;
        let record = result.map_err(|e| import_err(line, e.to_string()))?;

        let strategy_str = field(&record, 3, "strategy", line)?;
        let strategy = StrategyKind::parse(strategy_str)
            .ok_or_else(|| import_err(line, format!("unknown strategy {strategy_str:?}")))?;

        let status_str = field(&record, 4, "status", line)?;
        let status = TradeStatus::parse(status_str)
            .ok_or_else(|| import_err(line, format!("unknown status {status_str:?}")))?;

        let exit_price = match opt_field(&record, 7) {
            Some(s) => Some(parse_f64_field(&s, "exit_price", line)?),
            None => None,
        };
        let exit_date = match opt_field(&record, 9) {
            Some(s) => Some(parse_date_field(&s, "exit_date", line)?),
            None => None,
        };

        let trade = Trade {
            id: 0,
            symbol: field(&record, 0, "symbol", line)?.to_string(),
            company: field(&record, 1, "company", line)?.to_string(),
            sector: field(&record, 2, "sector", line)?.to_string(),
            strategy,
            status,
            quantity: parse_f64_field(field(&record, 5, "quantity", line)?, "quantity", line)?,
            entry_price: parse_f64_field(
                field(&record, 6, "entry_price", line)?,
                "entry_price",
                line,
            )?,
            exit_price,
            entry_date: parse_date_field(
                field(&record, 8, "entry_date", line)?,
                "entry_date",
                line,
            )?,
            exit_date,
        };

        trade
            .validate()
            .map_err(|e| import_err(line, e.to_string()))?;
        trades.push(trade);
    }

    Ok(trades)
}

/// Serialize cash events with the fixed column order of [`CASH_HEADER`].
pub fn export_cash(events: &[CashEvent]) -> Result<String, FoliotrackError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CASH_HEADER)
        .map_err(|e| import_err(0, e.to_string()))?;

    for event in events {
        writer
            .write_record([
                event.kind.as_str(),
                &event.date.format(DATE_FMT).to_string(),
                &event.amount.to_string(),
                event.note.as_deref().unwrap_or(""),
                event.symbol.as_deref().unwrap_or(""),
            ])
            .map_err(|e| import_err(0, e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| import_err(0, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| import_err(0, e.to_string()))
}

/// Parse cash events from CSV text, validated through the domain rules.
pub fn import_cash(content: &str) -> Result<Vec<CashEvent>, FoliotrackError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut events = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let line = i + 1;
        let record = result.map_err(|e| import_err(line, e.to_string()))?;

        let kind_str = field(&record, 0, "kind", line)?;
        let kind = CashKind::parse(kind_str)
            .ok_or_else(|| import_err(line, format!("unknown kind {kind_str:?}")))?;

        let event = CashEvent {
            id: 0,
            kind,
            date: parse_date_field(field(&record, 1, "date", line)?, "date", line)?,
            amount: parse_f64_field(field(&record, 2, "amount", line)?, "amount", line)?,
            note: opt_field(&record, 3),
            symbol: opt_field(&record, 4),
        };

        event
            .validate()
            .map_err(|e| import_err(line, e.to_string()))?;
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_trade() -> Trade {
        Trade {
            id: 7,
            symbol: "AAPL".into(),
            company: "Apple Inc.".into(),
            sector: "Technology".into(),
            strategy: StrategyKind::Investment,
            status: TradeStatus::Open,
            quantity: 100.0,
            entry_price: 10.0,
            exit_price: None,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            exit_date: None,
        }
    }

    fn closed_trade() -> Trade {
        Trade {
            id: 8,
            symbol: "XOM".into(),
            company: "Exxon Mobil".into(),
            sector: "Energy".into(),
            strategy: StrategyKind::Speculative,
            status: TradeStatus::Closed,
            quantity: 50.0,
            entry_price: 20.0,
            exit_price: Some(25.0),
            entry_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            exit_date: Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
        }
    }

    #[test]
    fn export_then_import_trades_round_trips() {
        let trades = vec![open_trade(), closed_trade()];
        let csv = export_trades(&trades).unwrap();
        let imported = import_trades(&csv).unwrap();

        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].symbol, "AAPL");
        assert_eq!(imported[0].exit_price, None);
        assert_eq!(imported[1].status, TradeStatus::Closed);
        assert_eq!(imported[1].exit_price, Some(25.0));
        assert_eq!(
            imported[1].exit_date,
            Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        // Ids are never carried through an export.
        assert_eq!(imported[0].id, 0);
    }

    #[test]
    fn import_trades_reports_offending_record() {
        let csv = "symbol,company,sector,strategy,status,quantity,entry_price,exit_price,entry_date,exit_date\n\
            AAPL,Apple Inc.,Technology,investment,open,100,10.0,,2024-01-15,\n\
            XOM,Exxon Mobil,Energy,speculative,open,fifty,20.0,,2024-02-01,\n";

        match import_trades(csv) {
            Err(FoliotrackError::CsvImport { record, reason }) => {
                assert_eq!(record, 2);
                assert!(reason.contains("quantity"), "reason: {reason}");
            }
            other => panic!("expected CsvImport error, got: {other:?}"),
        }
    }

    #[test]
    fn import_trades_rejects_unknown_strategy() {
        let csv = "symbol,company,sector,strategy,status,quantity,entry_price,exit_price,entry_date,exit_date\n\
            AAPL,Apple Inc.,Technology,yolo,open,100,10.0,,2024-01-15,\n";
        assert!(import_trades(csv).is_err());
    }

    #[test]
    fn import_trades_runs_domain_validation() {
        // Closed status without exit fields fails validation, not parsing.
        let csv = "symbol,company,sector,strategy,status,quantity,entry_price,exit_price,entry_date,exit_date\n\
            AAPL,Apple Inc.,Technology,investment,closed,100,10.0,,2024-01-15,\n";
        match import_trades(csv) {
            Err(FoliotrackError::CsvImport { record, .. }) => assert_eq!(record, 1),
            other => panic!("expected CsvImport error, got: {other:?}"),
        }
    }

    #[test]
    fn import_empty_input_yields_no_trades() {
        let csv = "symbol,company,sector,strategy,status,quantity,entry_price,exit_price,entry_date,exit_date\n";
        assert!(import_trades(csv).unwrap().is_empty());
    }

    #[test]
    fn export_then_import_cash_round_trips() {
        let events = vec![
            CashEvent {
                id: 1,
                kind: CashKind::Deposit,
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                amount: 5000.0,
                note: Some("initial funding".into()),
                symbol: None,
            },
            CashEvent {
                id: 2,
                kind: CashKind::ReturnGrant,
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                amount: 120.0,
                note: None,
                symbol: Some("AAPL".into()),
            },
        ];
        let csv = export_cash(&events).unwrap();
        let imported = import_cash(&csv).unwrap();

        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].kind, CashKind::Deposit);
        assert_eq!(imported[0].note.as_deref(), Some("initial funding"));
        assert_eq!(imported[0].symbol, None);
        assert_eq!(imported[1].kind, CashKind::ReturnGrant);
        assert_eq!(imported[1].symbol.as_deref(), Some("AAPL"));
    }

    #[test]
    fn import_cash_rejects_negative_amount() {
        let csv = "kind,date,amount,note,symbol\nwithdrawal,2024-01-02,-10.0,,\n";
        match import_cash(csv) {
            Err(FoliotrackError::CsvImport { record, .. }) => assert_eq!(record, 1),
            other => panic!("expected CsvImport error, got: {other:?}"),
        }
    }

    #[test]
    fn import_cash_rejects_unknown_kind() {
        let csv = "kind,date,amount,note,symbol\nrebate,2024-01-02,10.0,,\n";
        assert!(import_cash(csv).is_err());
    }
}
