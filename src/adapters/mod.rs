//! Concrete adapter implementations for the ports.

pub mod csv_ledger_io;
pub mod file_config_adapter;
pub mod sqlite_ledger_adapter;
pub mod web;
pub mod yahoo_quote_adapter;
