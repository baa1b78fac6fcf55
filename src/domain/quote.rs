//! Market data shapes supplied by the quote provider.

use chrono::NaiveDate;

/// Latest quote for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub prev_close: f64,
}

impl Quote {
    /// Day change relative to the previous close, in percent. 0 when the
    /// previous close is unusable.
    pub fn change_pct(&self) -> f64 {
        if self.prev_close.is_finite() && self.prev_close > 0.0 && self.price.is_finite() {
            (self.price - self.prev_close) / self.prev_close * 100.0
        } else {
            0.0
        }
    }
}

/// One daily candle of a historical series.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}
