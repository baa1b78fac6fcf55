//! Cash ledger events: deposits, withdrawals and return grants.

use chrono::NaiveDate;

use super::error::FoliotrackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashKind {
    Deposit,
    Withdrawal,
    ReturnGrant,
}

impl CashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashKind::Deposit => "deposit",
            CashKind::Withdrawal => "withdrawal",
            CashKind::ReturnGrant => "return",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(CashKind::Deposit),
            "withdrawal" => Some(CashKind::Withdrawal),
            "return" => Some(CashKind::ReturnGrant),
            _ => None,
        }
    }
}

/// A single cash movement. Immutable once recorded except through explicit
/// edit/delete. A return grant may reference a symbol, but nothing enforces
/// that the symbol also appears in the trade ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CashEvent {
    pub id: i64,
    pub kind: CashKind,
    pub date: NaiveDate,
    pub amount: f64,
    pub note: Option<String>,
    pub symbol: Option<String>,
}

impl CashEvent {
    pub fn validate(&self) -> Result<(), FoliotrackError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(FoliotrackError::InvalidCashEvent {
                reason: format!("amount must be positive, got {}", self.amount),
            });
        }
        if self.symbol.is_some() && self.kind != CashKind::ReturnGrant {
            return Err(FoliotrackError::InvalidCashEvent {
                reason: "only return grants may reference a symbol".into(),
            });
        }
        Ok(())
    }
}

/// Sum of event amounts. Non-finite amounts count as zero so a corrupt row
/// cannot poison the whole summary.
pub fn total(events: &[CashEvent]) -> f64 {
    events
        .iter()
        .map(|e| if e.amount.is_finite() { e.amount } else { 0.0 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(amount: f64) -> CashEvent {
        CashEvent {
            id: 0,
            kind: CashKind::Deposit,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount,
            note: None,
            symbol: None,
        }
    }

    #[test]
    fn valid_deposit() {
        assert!(deposit(5000.0).validate().is_ok());
    }

    #[test]
    fn zero_amount_rejected() {
        assert!(deposit(0.0).validate().is_err());
    }

    #[test]
    fn negative_amount_rejected() {
        assert!(deposit(-10.0).validate().is_err());
    }

    #[test]
    fn nan_amount_rejected() {
        assert!(deposit(f64::NAN).validate().is_err());
    }

    #[test]
    fn symbol_only_on_return_grant() {
        let mut event = deposit(100.0);
        event.symbol = Some("AAPL".into());
        assert!(event.validate().is_err());

        event.kind = CashKind::ReturnGrant;
        assert!(event.validate().is_ok());
    }

    #[test]
    fn total_sums_amounts() {
        let events = vec![deposit(100.0), deposit(250.5)];
        assert!((total(&events) - 350.5).abs() < f64::EPSILON);
    }

    #[test]
    fn total_skips_non_finite() {
        let events = vec![deposit(100.0), deposit(f64::INFINITY)];
        assert!((total(&events) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_empty_is_zero() {
        assert!((total(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn kind_round_trip() {
        assert_eq!(CashKind::parse("deposit"), Some(CashKind::Deposit));
        assert_eq!(CashKind::parse("Return"), Some(CashKind::ReturnGrant));
        assert_eq!(CashKind::parse("transfer"), None);
        assert_eq!(CashKind::Withdrawal.as_str(), "withdrawal");
    }
}
