// Diversification controller: runs the strategy catalog in order, enforcing
// overlap caps against earlier lineups and a per-candidate exposure cap
// across the whole run.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, DiversifyConfig, StrategyConfig};
use crate::optimizer::{
    solve_selection, strategy_catalog, InfeasibleReason, NoFeasibleLineup, OptimizerSettings,
    SelectionRules, Strategy, StrategyKind,
};
use crate::pool::Candidate;
use crate::slots::{Lineup, SlotAssigner, SlotAssignmentError};

// ---------------------------------------------------------------------------
// Exposure tracking
// ---------------------------------------------------------------------------

/// Per-candidate count of lineups built so far in one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExposureTracker {
    counts: HashMap<String, usize>,
}

impl ExposureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, lineup: &Lineup) {
        for candidate in lineup.candidates() {
            *self.counts.entry(candidate.key.clone()).or_insert(0) += 1;
        }
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Keys that have reached `max_exposure` and may not be selected again.
    pub fn excluded(&self, max_exposure: usize) -> HashSet<String> {
        self.counts
            .iter()
            .filter(|(_, n)| **n >= max_exposure)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// All non-zero counts, most exposed first, ties by key.
    pub fn sorted_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> =
            self.counts.iter().map(|(k, &n)| (k.clone(), n)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StrategyOutcome {
    /// `relaxed` is set when overlap caps had to be dropped.
    Solved { lineup: Lineup, relaxed: bool },
    Failed { reason: InfeasibleReason },
}

/// One entry of the catalog run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRun {
    pub label: String,
    pub strategy: Strategy,
    pub outcome: StrategyOutcome,
}

/// Every strategy outcome of a run plus the final exposure counters.
#[derive(Debug, Clone, Serialize)]
pub struct LineupSet {
    pub runs: Vec<StrategyRun>,
    exposure: ExposureTracker,
}

impl LineupSet {
    /// Successful lineups in catalog order.
    pub fn lineups(&self) -> Vec<&Lineup> {
        self.runs
            .iter()
            .filter_map(|run| match &run.outcome {
                StrategyOutcome::Solved { lineup, .. } => Some(lineup),
                StrategyOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn exposure(&self, key: &str) -> usize {
        self.exposure.count(key)
    }

    pub fn exposure_counts(&self) -> Vec<(String, usize)> {
        self.exposure.sorted_counts()
    }

    /// Labels of strategies solved only after dropping overlap caps.
    pub fn relaxed_strategies(&self) -> Vec<&str> {
        self.runs
            .iter()
            .filter(|run| matches!(run.outcome, StrategyOutcome::Solved { relaxed: true, .. }))
            .map(|run| run.label.as_str())
            .collect()
    }

    pub fn failed_strategies(&self) -> Vec<(&str, InfeasibleReason)> {
        self.runs
            .iter()
            .filter_map(|run| match run.outcome {
                StrategyOutcome::Failed { reason } => Some((run.label.as_str(), reason)),
                StrategyOutcome::Solved { .. } => None,
            })
            .collect()
    }

    /// Largest number of candidates shared by any two lineups.
    pub fn max_pairwise_overlap(&self) -> usize {
        let lineups = self.lineups();
        let mut max = 0;
        for (i, a) in lineups.iter().enumerate() {
            for b in &lineups[i + 1..] {
                max = max.max(a.shared_with(b));
            }
        }
        max
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the run-scoped state of a multi-lineup run.
pub struct DiversificationController {
    salary_cap: f64,
    limits: DiversifyConfig,
    strategies: StrategyConfig,
    settings: OptimizerSettings,
    assigner: SlotAssigner,
    exposure: ExposureTracker,
}

impl DiversificationController {
    pub fn new(config: &Config) -> Self {
        DiversificationController {
            salary_cap: config.roster.salary_cap,
            limits: config.diversify.clone(),
            strategies: config.strategy.clone(),
            settings: OptimizerSettings::from_config(&config.solver),
            assigner: SlotAssigner::default(),
            exposure: ExposureTracker::new(),
        }
    }

    pub fn with_assigner(mut self, assigner: SlotAssigner) -> Self {
        self.assigner = assigner;
        self
    }

    /// Run the catalog against `pool`, consuming the controller.
    ///
    /// Infeasible strategies are recorded and skipped. A slot assignment
    /// failure is an internal invariant violation and aborts the run.
    pub fn run(mut self, pool: &[Candidate]) -> Result<LineupSet, SlotAssignmentError> {
        let strategies = strategy_catalog(self.limits.num_lineups, &self.strategies, pool);
        let mut runs: Vec<StrategyRun> = Vec::with_capacity(strategies.len());
        let mut prior_lineups: Vec<HashSet<String>> = Vec::new();

        for (i, strategy) in strategies.into_iter().enumerate() {
            let label = run_label(&strategy, i);
            if strategy.ceiling_fallback {
                info!("{label}: pool has no ceiling data, using value per cost");
            }

            let outcome = match self.solve_two_phase(pool, &strategy, &prior_lineups) {
                Ok((selection, relaxed)) => {
                    let lineup = self.assigner.build_lineup(label.clone(), &selection)?;
                    self.exposure.record(&lineup);
                    prior_lineups.push(lineup.keys());
                    info!(
                        "{label}: projected {:.2}, cost {:.0}{}",
                        lineup.total_value(),
                        lineup.total_cost(),
                        if relaxed { " (overlap relaxed)" } else { "" }
                    );
                    StrategyOutcome::Solved { lineup, relaxed }
                }
                Err(e) => {
                    warn!("{label}: {e}");
                    StrategyOutcome::Failed { reason: e.reason }
                }
            };
            runs.push(StrategyRun {
                label,
                strategy,
                outcome,
            });
        }

        Ok(LineupSet {
            runs,
            exposure: self.exposure,
        })
    }

    /// Phase 1 enforces overlap caps and exposure exclusions; phase 2 drops
    /// the overlap caps and keeps the exclusions.
    fn solve_two_phase(
        &self,
        pool: &[Candidate],
        strategy: &Strategy,
        prior_lineups: &[HashSet<String>],
    ) -> Result<(Vec<Candidate>, bool), NoFeasibleLineup> {
        let excluded = self.exposure.excluded(self.limits.max_exposure);
        let strict = SelectionRules {
            excluded: excluded.clone(),
            prior_lineups: prior_lineups.to_vec(),
            max_overlap: self.limits.max_overlap,
        };
        match solve_selection(pool, strategy, self.salary_cap, &strict, &self.settings) {
            Ok(selection) => return Ok((selection.candidates(pool), false)),
            Err(e) if prior_lineups.is_empty() => return Err(e),
            Err(e) => info!("{}: {e}; retrying without overlap caps", strategy.name()),
        }

        let relaxed = SelectionRules {
            excluded,
            ..SelectionRules::default()
        };
        let selection = solve_selection(pool, strategy, self.salary_cap, &relaxed, &self.settings)?;
        Ok((selection.candidates(pool), true))
    }
}

/// Strategy name, suffixed with the pass number once the catalog cycles.
fn run_label(strategy: &Strategy, index: usize) -> String {
    let pass = index / StrategyKind::CATALOG.len();
    if pass == 0 {
        strategy.name().to_string()
    } else {
        format!("{} #{}", strategy.name(), pass + 1)
    }
}

/// Generate up to `config.diversify.num_lineups` diverse lineups.
pub fn generate_lineups(pool: &[Candidate], config: &Config) -> Result<LineupSet, SlotAssignmentError> {
    DiversificationController::new(config).run(pool)
}
