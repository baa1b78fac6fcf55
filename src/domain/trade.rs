//! Trade records and lifecycle invariants.

use chrono::NaiveDate;

use super::error::FoliotrackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(TradeStatus::Open),
            "closed" => Some(TradeStatus::Closed),
            _ => None,
        }
    }
}

/// Strategy tag attached to a trade at entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Investment,
    Speculative,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Investment => "investment",
            StrategyKind::Speculative => "speculative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "investment" => Some(StrategyKind::Investment),
            "speculative" => Some(StrategyKind::Speculative),
            _ => None,
        }
    }
}

/// A single buy, possibly already liquidated.
///
/// Exit fields are populated if and only if the trade is closed; the ledger
/// boundary enforces this through [`Trade::validate`] before any write.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: i64,
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub strategy: StrategyKind,
    pub status: TradeStatus,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// quantity × entry price.
    pub fn total_cost(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn validate(&self) -> Result<(), FoliotrackError> {
        if self.symbol.trim().is_empty() {
            return Err(FoliotrackError::InvalidTrade {
                reason: "symbol must not be empty".into(),
            });
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(FoliotrackError::InvalidTrade {
                reason: format!("quantity must be non-negative, got {}", self.quantity),
            });
        }
        if !self.entry_price.is_finite() || self.entry_price < 0.0 {
            return Err(FoliotrackError::InvalidTrade {
                reason: format!("entry price must be non-negative, got {}", self.entry_price),
            });
        }
        match self.status {
            TradeStatus::Open => {
                if self.exit_price.is_some() || self.exit_date.is_some() {
                    return Err(FoliotrackError::InvalidTrade {
                        reason: "open trade must not carry exit fields".into(),
                    });
                }
            }
            TradeStatus::Closed => {
                if self.exit_price.is_none() || self.exit_date.is_none() {
                    return Err(FoliotrackError::InvalidTrade {
                        reason: "closed trade requires exit price and exit date".into(),
                    });
                }
                if let Some(exit) = self.exit_price {
                    if !exit.is_finite() || exit < 0.0 {
                        return Err(FoliotrackError::InvalidTrade {
                            reason: format!("exit price must be non-negative, got {exit}"),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
