//! Rebalancing recommendations for underweight sectors.

use super::sector::{self, SectorAllocation, SectorTarget};

/// A sector is underweight only when its current weight sits more than this
/// many percentage points below target.
pub const UNDERWEIGHT_TOLERANCE_PCT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub sector: String,
    pub reason: String,
    /// Tracked symbols in the sector not already held open.
    pub suggestions: Vec<String>,
}

/// Propose buys for sectors materially below their target weight, largest
/// shortfall first. Sectors with a target but no open position count as
/// current weight zero. Empty output means the allocation is healthy.
pub fn recommend(
    allocations: &[SectorAllocation],
    targets: &[SectorTarget],
    cost_open: f64,
    held_symbols: &[String],
) -> Vec<Recommendation> {
    if cost_open <= 0.0 {
        return Vec::new();
    }

    // Targets with no open holdings still participate, at weight zero.
    let mut rows: Vec<SectorAllocation> = allocations.to_vec();
    for target in targets {
        if !rows.iter().any(|a| a.sector == target.sector) {
            rows.push(SectorAllocation {
                sector: target.sector.clone(),
                companies: 0,
                cost: 0.0,
                current_weight: 0.0,
                target_weight: target.target_pct,
                remaining_to_target: target.target_pct * cost_open / 100.0,
            });
        }
    }

    let mut underweight: Vec<SectorAllocation> = rows
        .into_iter()
        .filter(|a| a.current_weight < a.target_weight - UNDERWEIGHT_TOLERANCE_PCT)
        .collect();

    underweight.sort_by(|a, b| {
        b.remaining_to_target
            .partial_cmp(&a.remaining_to_target)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    underweight
        .into_iter()
        .map(|a| {
            let suggestions: Vec<String> = sector::sector_symbols(&a.sector)
                .into_iter()
                .filter(|s| !held_symbols.iter().any(|h| h == s))
                .map(|s| s.to_string())
                .collect();
            let reason = format!(
                "{} holds {:.1}% of open cost against a {:.1}% target; about {:.0} more is needed to reach it",
                a.sector, a.current_weight, a.target_weight, a.remaining_to_target
            );
            Recommendation {
                sector: a.sector,
                reason,
                suggestions,
            }
        })
        .collect()
}
