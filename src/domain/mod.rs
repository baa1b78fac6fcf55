//! Core domain types and logic.

pub mod trade;
pub mod cash;
pub mod quote;
pub mod valuation;
pub mod sector;
pub mod risk;
pub mod levels;
pub mod recommend;
pub mod error;
