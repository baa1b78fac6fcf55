//! Market data port. Best-effort by contract: a failed symbol is simply
//! absent from a batch, and a failed history fetch is an empty series.
//! Neither raises into the core.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::quote::{OhlcvBar, Quote};

#[async_trait]
pub trait QuotePort {
    /// Latest quotes for the given symbols. Partial results on per-symbol
    /// failure; an unreachable source yields an empty map.
    async fn batch_quote(&self, symbols: &[String]) -> HashMap<String, Quote>;

    /// Daily history for one symbol, ascending by date. Empty on failure.
    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Vec<OhlcvBar>;
}
