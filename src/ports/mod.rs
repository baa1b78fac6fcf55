//! Port traits at the hexagon's seams.

pub mod ledger_port;
pub mod quote_port;
pub mod config_port;
