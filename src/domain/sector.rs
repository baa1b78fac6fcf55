//! Sector aggregation against target weights, plus the static symbol
//! universe the trade form and recommendation engine draw from.

use std::collections::BTreeMap;

use super::valuation::EnrichedTrade;

/// Target weight for one sector, in percent of open cost.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorTarget {
    pub sector: String,
    pub target_pct: f64,
}

/// One row of the sector allocation table, open trades only.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorAllocation {
    pub sector: String,
    /// Distinct symbols held in the sector.
    pub companies: usize,
    pub cost: f64,
    pub current_weight: f64,
    pub target_weight: f64,
    /// Capital still needed to reach target; negative means over-allocated.
    pub remaining_to_target: f64,
}

/// Fixed set of exchange-listed securities the dashboard tracks:
/// (symbol, company, sector).
pub const SYMBOL_UNIVERSE: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple Inc.", "Technology"),
    ("MSFT", "Microsoft Corporation", "Technology"),
    ("NVDA", "NVIDIA Corporation", "Technology"),
    ("ORCL", "Oracle Corporation", "Technology"),
    ("JPM", "JPMorgan Chase & Co.", "Financials"),
    ("BAC", "Bank of America Corp.", "Financials"),
    ("GS", "Goldman Sachs Group", "Financials"),
    ("JNJ", "Johnson & Johnson", "Healthcare"),
    ("PFE", "Pfizer Inc.", "Healthcare"),
    ("UNH", "UnitedHealth Group", "Healthcare"),
    ("XOM", "Exxon Mobil Corporation", "Energy"),
    ("CVX", "Chevron Corporation", "Energy"),
    ("PG", "Procter & Gamble", "Consumer"),
    ("KO", "Coca-Cola Company", "Consumer"),
    ("WMT", "Walmart Inc.", "Consumer"),
    ("CAT", "Caterpillar Inc.", "Industrials"),
    ("HON", "Honeywell International", "Industrials"),
    ("GOOGL", "Alphabet Inc.", "Communication"),
    ("DIS", "Walt Disney Company", "Communication"),
    ("NEE", "NextEra Energy", "Utilities"),
];

/// Company name and sector for a tracked symbol.
pub fn lookup_symbol(symbol: &str) -> Option<(&'static str, &'static str)> {
    SYMBOL_UNIVERSE
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|(_, company, sector)| (*company, *sector))
}

/// Tracked symbols belonging to a sector.
pub fn sector_symbols(sector: &str) -> Vec<&'static str> {
    SYMBOL_UNIVERSE
        .iter()
        .filter(|(_, _, s)| *s == sector)
        .map(|(symbol, _, _)| *symbol)
        .collect()
}

/// Seed targets for a fresh database. Sum to 100.
pub fn default_targets() -> Vec<SectorTarget> {
    [
        ("Technology", 25.0),
        ("Financials", 15.0),
        ("Healthcare", 15.0),
        ("Energy", 10.0),
        ("Consumer", 10.0),
        ("Industrials", 10.0),
        ("Communication", 10.0),
        ("Utilities", 5.0),
    ]
    .iter()
    .map(|(sector, target_pct)| SectorTarget {
        sector: (*sector).to_string(),
        target_pct: *target_pct,
    })
    .collect()
}

/// Group open trades by sector and compare against targets.
///
/// Weights are relative to total open cost; the empty portfolio yields an
/// empty table rather than dividing by zero.
pub fn aggregate_sectors(
    enriched: &[EnrichedTrade],
    targets: &[SectorTarget],
) -> Vec<SectorAllocation> {
    let target_map: BTreeMap<&str, f64> = targets
        .iter()
        .map(|t| (t.sector.as_str(), t.target_pct))
        .collect();

    let mut cost_open = 0.0_f64;
    let mut by_sector: BTreeMap<&str, (Vec<&str>, f64)> = BTreeMap::new();

    for row in enriched.iter().filter(|r| r.trade.is_open()) {
        cost_open += row.total_cost;
        let entry = by_sector
            .entry(row.trade.sector.as_str())
            .or_insert_with(|| (Vec::new(), 0.0));
        if !entry.0.contains(&row.trade.symbol.as_str()) {
            entry.0.push(row.trade.symbol.as_str());
        }
        entry.1 += row.total_cost;
    }

    by_sector
        .into_iter()
        .map(|(sector, (symbols, cost))| {
            let current_weight = if cost_open > 0.0 {
                cost / cost_open * 100.0
            } else {
                0.0
            };
            let target_weight = target_map.get(sector).copied().unwrap_or(0.0);
            SectorAllocation {
                sector: sector.to_string(),
                companies: symbols.len(),
                cost,
                current_weight,
                target_weight,
                remaining_to_target: (target_weight - current_weight) * cost_open / 100.0,
            }
        })
        .collect()
}
