// Roster optimizer: strategy objectives and the exact selection search.

pub mod search;
pub mod strategy;

pub use search::{
    solve_selection, InfeasibleReason, NoFeasibleLineup, OptimizerSettings, Selection,
    SelectionRules,
};
pub use strategy::{strategy_catalog, CostTier, Objective, Strategy, StrategyKind, TierBounds};

use thiserror::Error;
use tracing::info;

use crate::pool::Candidate;
use crate::slots::{Lineup, SlotAssigner, SlotAssignmentError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Infeasible(#[from] NoFeasibleLineup),

    #[error(transparent)]
    SlotAssignment(#[from] SlotAssignmentError),
}

/// Build the single best lineup for `strategy` under `salary_cap`.
///
/// Infeasibility is returned as an error; there is no relaxation on this path.
pub fn optimize_lineup(
    pool: &[Candidate],
    strategy: &Strategy,
    salary_cap: f64,
    settings: &OptimizerSettings,
) -> Result<Lineup, OptimizeError> {
    let selection = solve_selection(pool, strategy, salary_cap, &SelectionRules::default(), settings)?;
    let lineup = SlotAssigner::default().build_lineup(strategy.name(), &selection.candidates(pool))?;
    info!(
        "{}: cost {:.0} / {:.0}, projected {:.2}",
        strategy.name(),
        lineup.total_cost(),
        salary_cap,
        lineup.total_value()
    );
    Ok(lineup)
}
