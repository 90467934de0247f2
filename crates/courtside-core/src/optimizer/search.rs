// Exact depth-first branch-and-bound over rosters, filling one slot per level.
//
// The salary cap is priced into the bound with a Lagrangian multiplier fixed
// at the root: each candidate carries a reduced weight `w - λ·cost`, and the
// bound at a node is the chosen reduced weight plus `λ·cap` plus, for every
// open slot, the best free reduced weight it accepts, less what the overlap
// room left against prior lineups forces it to give up. Candidates within a
// slot are tried in descending reduced weight, so the first one whose bound
// cannot beat the incumbent ends the slot. Filling slots directly keeps every
// leaf assignable.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::strategy::{CostTier, Strategy, TierBounds};
use crate::config::SolverConfig;
use crate::pool::Candidate;
use crate::position::{EligibilityFlags, Slot, ROSTER_SIZE};
use crate::slots::assignment_exists;

const COST_EPSILON: f64 = 1e-6;
const OBJECTIVE_EPSILON: f64 = 1e-9;
const MULTIPLIER_ITERATIONS: usize = 100;

/// Slots in the order the search fills them: single-position slots first,
/// then the flex slots.
const SEARCH_ORDER: [Slot; ROSTER_SIZE] = [
    Slot::C,
    Slot::PG,
    Slot::SG,
    Slot::SF,
    Slot::PF,
    Slot::G,
    Slot::F,
    Slot::UTIL,
];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Why no lineup could be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InfeasibleReason {
    SalaryCap,
    PositionCoverage,
    Diversification,
    SearchLimit,
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            InfeasibleReason::SalaryCap => "no roster covering every position fits under the salary cap",
            InfeasibleReason::PositionCoverage => "the pool cannot fill every roster position",
            InfeasibleReason::Diversification => "overlap and exposure limits rule out every remaining roster",
            InfeasibleReason::SearchLimit => "search node limit reached before an optimum was proven",
        };
        write!(f, "{msg}")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("no feasible lineup: {reason}")]
pub struct NoFeasibleLineup {
    pub reason: InfeasibleReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    /// Nodes explored per solve before the search gives up.
    pub search_node_limit: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings::from_config(&SolverConfig::default())
    }
}

impl OptimizerSettings {
    pub fn from_config(config: &SolverConfig) -> Self {
        OptimizerSettings {
            search_node_limit: config.search_node_limit,
        }
    }
}

/// Constraints layered on top of the roster rules by the diversification
/// controller.
#[derive(Debug, Clone, Default)]
pub struct SelectionRules {
    /// Candidate keys that may not be selected.
    pub excluded: HashSet<String>,
    /// Candidate keys of earlier lineups.
    pub prior_lineups: Vec<HashSet<String>>,
    /// Most candidates a new selection may share with any prior lineup.
    pub max_overlap: usize,
}

impl SelectionRules {
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty() && self.prior_lineups.is_empty()
    }
}

/// An optimal set of eight candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Indices into the pool, in slot search order.
    pub indices: Vec<usize>,
    pub objective: f64,
    pub total_cost: f64,
}

impl Selection {
    pub fn candidates(&self, pool: &[Candidate]) -> Vec<Candidate> {
        self.indices.iter().map(|&i| pool[i].clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Find the selection maximizing the strategy's objective under the roster
/// rules, the salary cap and `rules`.
pub fn solve_selection(
    pool: &[Candidate],
    strategy: &Strategy,
    salary_cap: f64,
    rules: &SelectionRules,
    settings: &OptimizerSettings,
) -> Result<Selection, NoFeasibleLineup> {
    let weights: Vec<f64> = pool.iter().map(|c| strategy.weight(c)).collect();
    let problem = Problem::build(pool, &weights, salary_cap, strategy.tiers, rules);
    let mut search = Search::new(&problem, settings.search_node_limit, false);
    search.visit();
    debug!(
        "{}: explored {} nodes over {} candidates (salary multiplier {:.5})",
        strategy.name(),
        search.nodes,
        pool.len(),
        problem.multiplier
    );

    if search.exhausted {
        return Err(NoFeasibleLineup {
            reason: InfeasibleReason::SearchLimit,
        });
    }
    match search.best {
        Some(best) => Ok(Selection {
            indices: best.indices,
            objective: best.objective,
            total_cost: best.cost,
        }),
        None => Err(NoFeasibleLineup {
            reason: diagnose(pool, strategy.tiers, salary_cap, rules, settings),
        }),
    }
}

/// Attribute an infeasible solve to its most likely cause.
///
/// Checked in order: coverage on the unrestricted pool ignoring cost, the
/// salary cap, diversification rules, and finally tier bounds (salary when
/// they are satisfiable without a cap, coverage otherwise).
fn diagnose(
    pool: &[Candidate],
    tiers: Option<TierBounds>,
    salary_cap: f64,
    rules: &SelectionRules,
    settings: &OptimizerSettings,
) -> InfeasibleReason {
    let unrestricted = SelectionRules::default();
    match feasible(pool, None, f64::INFINITY, &unrestricted, settings) {
        None => return InfeasibleReason::SearchLimit,
        Some(false) => return InfeasibleReason::PositionCoverage,
        Some(true) => {}
    }
    match feasible(pool, None, salary_cap, &unrestricted, settings) {
        None => return InfeasibleReason::SearchLimit,
        Some(false) => return InfeasibleReason::SalaryCap,
        Some(true) => {}
    }
    if !rules.is_empty() {
        return InfeasibleReason::Diversification;
    }
    match feasible(pool, tiers, f64::INFINITY, rules, settings) {
        None => InfeasibleReason::SearchLimit,
        Some(true) => InfeasibleReason::SalaryCap,
        Some(false) => InfeasibleReason::PositionCoverage,
    }
}

/// Whether any valid selection exists; `None` when the node limit ran out.
fn feasible(
    pool: &[Candidate],
    tiers: Option<TierBounds>,
    salary_cap: f64,
    rules: &SelectionRules,
    settings: &OptimizerSettings,
) -> Option<bool> {
    let weights = vec![0.0; pool.len()];
    let problem = Problem::build(pool, &weights, salary_cap, tiers, rules);
    let mut search = Search::new(&problem, settings.search_node_limit, true);
    search.visit();
    if search.best.is_some() {
        Some(true)
    } else if search.exhausted {
        None
    } else {
        Some(false)
    }
}

// ---------------------------------------------------------------------------
// Problem data
// ---------------------------------------------------------------------------

/// Per-candidate data indexed by pool position, plus per-slot candidate lists
/// in the order the search fills the roster.
struct Problem {
    weights: Vec<f64>,
    costs: Vec<f64>,
    /// `weight - multiplier * cost`.
    reduced: Vec<f64>,
    flags: Vec<EligibilityFlags>,
    tiers: Vec<usize>,
    memberships: Vec<Vec<usize>>,
    /// Per search slot: eligible candidates by descending reduced weight.
    by_value: Vec<Vec<usize>>,
    /// Per search slot: eligible candidates by ascending cost.
    by_cost: Vec<Vec<usize>>,
    multiplier: f64,
    /// `multiplier * salary_cap`, zero when the multiplier is.
    bound_offset: f64,
    salary_cap: f64,
    tier_bounds: Option<TierBounds>,
    max_overlap: usize,
    prior_count: usize,
}

impl Problem {
    fn build(
        pool: &[Candidate],
        weights: &[f64],
        salary_cap: f64,
        tier_bounds: Option<TierBounds>,
        rules: &SelectionRules,
    ) -> Self {
        let costs: Vec<f64> = pool.iter().map(|c| c.cost).collect();
        let flags: Vec<EligibilityFlags> = pool.iter().map(Candidate::eligibility).collect();
        let selectable: Vec<usize> = (0..pool.len())
            .filter(|&i| !rules.excluded.contains(&pool[i].key))
            .collect();
        let slot_members: Vec<Vec<usize>> = SEARCH_ORDER
            .iter()
            .map(|slot| {
                selectable
                    .iter()
                    .copied()
                    .filter(|&i| slot.accepts(&flags[i]))
                    .collect()
            })
            .collect();

        let multiplier = salary_multiplier(&slot_members, weights, &costs, salary_cap);
        let reduced: Vec<f64> = weights
            .iter()
            .zip(&costs)
            .map(|(w, c)| w - multiplier * c)
            .collect();

        let by_value: Vec<Vec<usize>> = slot_members
            .iter()
            .map(|members| {
                let mut sorted = members.clone();
                sorted.sort_by(|&a, &b| {
                    reduced[b]
                        .partial_cmp(&reduced[a])
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| costs[a].partial_cmp(&costs[b]).unwrap_or(Ordering::Equal))
                        .then_with(|| pool[a].name.cmp(&pool[b].name))
                });
                sorted
            })
            .collect();
        let by_cost: Vec<Vec<usize>> = slot_members
            .into_iter()
            .map(|mut members| {
                members.sort_by(|&a, &b| costs[a].partial_cmp(&costs[b]).unwrap_or(Ordering::Equal));
                members
            })
            .collect();

        let tiers: Vec<usize> = costs
            .iter()
            .map(|&cost| match tier_bounds {
                Some(bounds) => bounds.tier_of(cost).index(),
                None => CostTier::Mid.index(),
            })
            .collect();
        let memberships: Vec<Vec<usize>> = pool
            .iter()
            .map(|c| {
                rules
                    .prior_lineups
                    .iter()
                    .enumerate()
                    .filter(|(_, keys)| keys.contains(&c.key))
                    .map(|(l, _)| l)
                    .collect()
            })
            .collect();

        let bound_offset = if multiplier > 0.0 {
            multiplier * salary_cap
        } else {
            0.0
        };

        Problem {
            weights: weights.to_vec(),
            costs,
            reduced,
            flags,
            tiers,
            memberships,
            by_value,
            by_cost,
            multiplier,
            bound_offset,
            salary_cap,
            tier_bounds,
            max_overlap: rules.max_overlap,
            prior_count: rules.prior_lineups.len(),
        }
    }
}

/// The salary multiplier `λ >= 0` minimizing the relaxed bound
/// `λ·cap + Σ_slots max_i (w_i - λ·c_i)`.
///
/// Every `λ >= 0` gives a valid upper bound on any roster under the cap; the
/// function is convex in `λ`, so a ternary search finds the tightest one.
fn salary_multiplier(
    slot_members: &[Vec<usize>],
    weights: &[f64],
    costs: &[f64],
    salary_cap: f64,
) -> f64 {
    if !salary_cap.is_finite() || slot_members.iter().any(Vec::is_empty) {
        return 0.0;
    }
    let dual = |lambda: f64| -> f64 {
        let best: f64 = slot_members
            .iter()
            .map(|members| {
                members
                    .iter()
                    .map(|&i| weights[i] - lambda * costs[i])
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .sum();
        lambda * salary_cap + best
    };

    let mut lo = 0.0;
    let mut hi = weights
        .iter()
        .zip(costs)
        .map(|(w, c)| w.abs() / c.max(1.0))
        .fold(0.0, f64::max)
        * 2.0;
    for _ in 0..MULTIPLIER_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if dual(m1) <= dual(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    let lambda = (lo + hi) / 2.0;
    if dual(lambda) < dual(0.0) {
        lambda
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

struct Incumbent {
    indices: Vec<usize>,
    objective: f64,
    cost: f64,
}

/// Depth-first search filling one slot per level in `SEARCH_ORDER`.
struct Search<'p> {
    problem: &'p Problem,
    node_limit: u64,
    first_only: bool,
    chosen: Vec<usize>,
    taken: Vec<bool>,
    tier_counts: [usize; 3],
    shared: Vec<usize>,
    cost: f64,
    objective: f64,
    reduced: f64,
    nodes: u64,
    exhausted: bool,
    best: Option<Incumbent>,
}

impl<'p> Search<'p> {
    fn new(problem: &'p Problem, node_limit: u64, first_only: bool) -> Self {
        Search {
            problem,
            node_limit,
            first_only,
            chosen: Vec::with_capacity(ROSTER_SIZE),
            taken: vec![false; problem.costs.len()],
            tier_counts: [0; 3],
            shared: vec![0; problem.prior_count],
            cost: 0.0,
            objective: 0.0,
            reduced: 0.0,
            nodes: 0,
            exhausted: false,
            best: None,
        }
    }

    fn done(&self) -> bool {
        self.exhausted || (self.first_only && self.best.is_some())
    }

    fn visit(&mut self) {
        if self.done() {
            return;
        }
        self.nodes += 1;
        if self.nodes > self.node_limit {
            self.exhausted = true;
            return;
        }

        let depth = self.chosen.len();
        if depth == ROSTER_SIZE {
            self.consider_leaf();
            return;
        }
        let Some((rest_value, rest_cost)) = self.remaining_bounds(depth + 1) else {
            return;
        };

        let problem = self.problem;
        for &i in &problem.by_value[depth] {
            if !self.selectable(i) {
                continue;
            }
            if let Some(best) = &self.best {
                let bound = self.reduced + problem.reduced[i] + rest_value + problem.bound_offset;
                if bound <= best.objective {
                    break;
                }
            }
            if self.cost + problem.costs[i] + rest_cost > problem.salary_cap + COST_EPSILON {
                continue;
            }
            if !self.tiers_reachable_with(i) {
                continue;
            }
            self.take(i);
            self.visit();
            self.untake(i);
            if self.done() {
                return;
            }
        }
    }

    /// Upper bound on the reduced weight and lower bound on the cost of
    /// filling search slots `from..`. Each slot takes its best (or cheapest)
    /// selectable candidate independently, then the bound gives back what
    /// the tightest prior-lineup overlap room forces it to. `None` when the
    /// open slots cannot be filled at all.
    fn remaining_bounds(&self, from: usize) -> Option<(f64, f64)> {
        let problem = self.problem;
        let mut value = 0.0;
        let mut cost = 0.0;
        for slot in from..ROSTER_SIZE {
            let top = problem.by_value[slot].iter().find(|&&i| self.selectable(i))?;
            let cheapest = problem.by_cost[slot].iter().find(|&&i| self.selectable(i))?;
            value += problem.reduced[*top];
            cost += problem.costs[*cheapest];
        }
        let penalty = (0..problem.prior_count)
            .map(|l| self.overlap_penalty(l, from))
            .fold(0.0, f64::max);
        if penalty.is_infinite() {
            return None;
        }
        Some((value - penalty, cost))
    }

    /// Reduced weight the open slots must give up so that at most the
    /// remaining room of prior lineup `l` is drawn from it.
    fn overlap_penalty(&self, l: usize, from: usize) -> f64 {
        let problem = self.problem;
        let room = problem.max_overlap.saturating_sub(self.shared[l]);
        let mut losses = Vec::new();
        for slot in from..ROSTER_SIZE {
            let list = &problem.by_value[slot];
            let Some(&top) = list.iter().find(|&&i| self.selectable(i)) else {
                return f64::INFINITY;
            };
            if !problem.memberships[top].contains(&l) {
                continue;
            }
            let outside = list
                .iter()
                .find(|&&i| self.selectable(i) && !problem.memberships[i].contains(&l));
            losses.push(match outside {
                Some(&i) => problem.reduced[top] - problem.reduced[i],
                None => f64::INFINITY,
            });
        }
        if losses.len() <= room {
            return 0.0;
        }
        losses.sort_by(f64::total_cmp);
        losses[..losses.len() - room].iter().sum()
    }

    /// Whether `i` may still join the roster anywhere below this node.
    fn selectable(&self, i: usize) -> bool {
        let problem = self.problem;
        if self.taken[i] {
            return false;
        }
        if let Some(bounds) = &problem.tier_bounds {
            if self.tier_counts[problem.tiers[i]] >= bounds.max_per_tier {
                return false;
            }
        }
        problem.memberships[i]
            .iter()
            .all(|&l| self.shared[l] < problem.max_overlap)
    }

    /// Whether every tier minimum can still be met after taking `i`.
    fn tiers_reachable_with(&self, i: usize) -> bool {
        let problem = self.problem;
        let Some(bounds) = &problem.tier_bounds else {
            return true;
        };
        let tier = problem.tiers[i];
        let open = ROSTER_SIZE - self.chosen.len() - 1;
        let need: usize = (0..3)
            .map(|t| {
                let count = self.tier_counts[t] + usize::from(t == tier);
                bounds.min_per_tier.saturating_sub(count)
            })
            .sum();
        need <= open
    }

    fn take(&mut self, i: usize) {
        let problem = self.problem;
        self.chosen.push(i);
        self.taken[i] = true;
        self.cost += problem.costs[i];
        self.objective += problem.weights[i];
        self.reduced += problem.reduced[i];
        self.tier_counts[problem.tiers[i]] += 1;
        for &l in &problem.memberships[i] {
            self.shared[l] += 1;
        }
    }

    fn untake(&mut self, i: usize) {
        let problem = self.problem;
        self.chosen.pop();
        self.taken[i] = false;
        self.cost -= problem.costs[i];
        self.objective -= problem.weights[i];
        self.reduced -= problem.reduced[i];
        self.tier_counts[problem.tiers[i]] -= 1;
        for &l in &problem.memberships[i] {
            self.shared[l] -= 1;
        }
    }

    fn consider_leaf(&mut self) {
        let problem = self.problem;
        if let Some(bounds) = &problem.tier_bounds {
            if self.tier_counts.iter().any(|&n| n < bounds.min_per_tier) {
                return;
            }
        }
        debug_assert!(assignment_exists(
            &self.chosen.iter().map(|&i| problem.flags[i]).collect::<Vec<_>>()
        ));
        let improves = self
            .best
            .as_ref()
            .map_or(true, |best| self.objective > best.objective + OBJECTIVE_EPSILON);
        if improves {
            self.best = Some(Incumbent {
                indices: self.chosen.clone(),
                objective: self.objective,
                cost: self.cost,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::optimizer::strategy::StrategyKind;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pool() -> Vec<Candidate> {
        vec![
            Candidate::new("PG High", 9000.0, "PG", 48.0),
            Candidate::new("PG Low", 6000.0, "PG", 35.0),
            Candidate::new("SG High", 8500.0, "SG", 44.0),
            Candidate::new("SG Low", 5000.0, "SG", 30.0),
            Candidate::new("SF High", 7800.0, "SF", 41.0),
            Candidate::new("SF Low", 4500.0, "SF", 26.0),
            Candidate::new("PF High", 7200.0, "PF", 39.0),
            Candidate::new("PF Low", 4200.0, "PF", 24.0),
            Candidate::new("C High", 8800.0, "C", 47.0),
            Candidate::new("C Low", 3900.0, "C", 22.0),
        ]
    }

    fn valid(selection: &[&Candidate], cap: f64) -> bool {
        let cost: f64 = selection.iter().map(|c| c.cost).sum();
        let flags: Vec<_> = selection.iter().map(|c| c.eligibility()).collect();
        let count = |f: fn(&EligibilityFlags) -> bool| flags.iter().filter(|x| f(x)).count();
        selection.len() == ROSTER_SIZE
            && cost <= cap
            && count(|f| f.pg) >= 1
            && count(|f| f.sg) >= 1
            && count(|f| f.sf) >= 1
            && count(|f| f.pf) >= 1
            && count(|f| f.c) >= 1
            && count(|f| f.g) >= 3
            && count(|f| f.f) >= 3
            && assignment_exists(&flags)
    }

    fn brute_force_best(
        pool: &[Candidate],
        cap: f64,
        weight: impl Fn(&Candidate) -> f64,
    ) -> Option<f64> {
        let n = pool.len();
        (0u32..(1 << n))
            .filter(|mask| mask.count_ones() as usize == ROSTER_SIZE)
            .filter_map(|mask| {
                let chosen: Vec<&Candidate> = (0..n).filter(|i| mask & (1 << i) != 0).map(|i| &pool[i]).collect();
                valid(&chosen, cap).then(|| chosen.iter().map(|c| weight(*c)).sum::<f64>())
            })
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
    }

    /// A slate with costs 3000-11000, roughly five points per 1000 of cost,
    /// and a mix of single and dual positions.
    fn seeded_slate(size: usize, seed: u64) -> Vec<Candidate> {
        const LABELS: [&str; 9] = ["PG", "SG", "SF", "PF", "C", "PG/SG", "SG/SF", "SF/PF", "PF/C"];
        let mut rng = StdRng::seed_from_u64(seed);
        (0..size)
            .map(|i| {
                let cost = f64::from(rng.random_range(30u32..=110) * 100);
                let value = cost / 1000.0 * 5.0 * rng.random_range(0.75..1.25);
                let label = LABELS[rng.random_range(0..LABELS.len())];
                let spread = rng.random_range(0.15..0.45);
                Candidate::new(&format!("Player {i:03}"), cost, label, value)
                    .with_range(value * (1.0 - spread), value * (1.0 + spread))
            })
            .collect()
    }

    fn solve(pool: &[Candidate], cap: f64) -> Result<Selection, NoFeasibleLineup> {
        solve_selection(
            pool,
            &Strategy::max_value(),
            cap,
            &SelectionRules::default(),
            &OptimizerSettings::default(),
        )
    }

    #[test]
    fn matches_brute_force_optimum() {
        let pool = pool();
        for cap in [50_000.0, 53_000.0, 58_000.0, 70_000.0] {
            let expected = brute_force_best(&pool, cap, |c| c.projected_value).expect("pool should be feasible");
            let selection = solve(&pool, cap).unwrap();
            assert!(
                (selection.objective - expected).abs() < 1e-9,
                "cap {cap}: got {} expected {expected}",
                selection.objective
            );
            let chosen = selection.candidates(&pool);
            assert!(valid(&chosen.iter().collect::<Vec<_>>(), cap));
            assert!(selection.total_cost <= cap);
        }
    }

    #[test]
    fn selection_respects_cap_and_size() {
        let pool = pool();
        let selection = solve(&pool, 50_000.0).unwrap();
        assert_eq!(selection.indices.len(), ROSTER_SIZE);
        let distinct: HashSet<usize> = selection.indices.iter().copied().collect();
        assert_eq!(distinct.len(), ROSTER_SIZE);
        let cost: f64 = selection.indices.iter().map(|&i| pool[i].cost).sum();
        assert!((cost - selection.total_cost).abs() < 1e-9);
        assert!(cost <= 50_000.0);
    }

    #[test]
    fn too_few_guards_is_position_coverage() {
        let mut pool = pool();
        // Leave only two guard-eligible candidates.
        pool.retain(|c| c.name != "PG Low" && c.name != "SG Low");
        pool.push(Candidate::new("Extra C", 3000.0, "C", 10.0));
        pool.push(Candidate::new("Extra F", 3000.0, "SF", 10.0));
        let err = solve(&pool, 50_000.0).unwrap_err();
        assert_eq!(err.reason, InfeasibleReason::PositionCoverage);
    }

    #[test]
    fn small_pool_is_infeasible() {
        let pool: Vec<Candidate> = pool().into_iter().take(5).collect();
        let err = solve(&pool, 50_000.0).unwrap_err();
        assert_eq!(err.reason, InfeasibleReason::PositionCoverage);
    }

    #[test]
    fn tight_cap_is_salary_cap() {
        let err = solve(&pool(), 20_000.0).unwrap_err();
        assert_eq!(err.reason, InfeasibleReason::SalaryCap);
    }

    #[test]
    fn exclusions_are_diversification() {
        let pool = pool();
        let rules = SelectionRules {
            excluded: ["pg high", "pg low"].iter().map(|s| s.to_string()).collect(),
            ..SelectionRules::default()
        };
        let err = solve_selection(
            &pool,
            &Strategy::max_value(),
            50_000.0,
            &rules,
            &OptimizerSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.reason, InfeasibleReason::Diversification);
    }

    #[test]
    fn node_limit_reports_search_limit() {
        let settings = OptimizerSettings {
            search_node_limit: 1,
        };
        let err = solve_selection(
            &pool(),
            &Strategy::max_value(),
            50_000.0,
            &SelectionRules::default(),
            &settings,
        )
        .unwrap_err();
        assert_eq!(err.reason, InfeasibleReason::SearchLimit);
    }

    #[test]
    fn overlap_cap_limits_shared_candidates() {
        let pool = pool();
        let first = solve(&pool, 50_000.0).unwrap();
        let first_keys: HashSet<String> = first.indices.iter().map(|&i| pool[i].key.clone()).collect();
        let rules = SelectionRules {
            prior_lineups: vec![first_keys.clone()],
            max_overlap: 6,
            ..SelectionRules::default()
        };
        let second = solve_selection(
            &pool,
            &Strategy::max_value(),
            60_000.0,
            &rules,
            &OptimizerSettings::default(),
        )
        .unwrap();
        let shared = second
            .indices
            .iter()
            .filter(|&&i| first_keys.contains(&pool[i].key))
            .count();
        assert!(shared <= 6);
    }

    #[test]
    fn tiered_strategy_respects_tier_counts() {
        let pool = pool();
        let config = StrategyConfig::default();
        let strategy = Strategy::from_kind(StrategyKind::Tiered, &config);
        let bounds = strategy.tiers.unwrap();
        let selection = solve_selection(
            &pool,
            &strategy,
            60_000.0,
            &SelectionRules::default(),
            &OptimizerSettings::default(),
        )
        .unwrap();
        let mut counts = [0usize; 3];
        for &i in &selection.indices {
            counts[bounds.tier_of(pool[i].cost).index()] += 1;
        }
        for count in counts {
            assert!((2..=3).contains(&count), "tier counts {counts:?}");
        }
    }

    #[test]
    fn tiered_strategy_under_tight_cap_is_salary_cap() {
        let strategy = Strategy::from_kind(StrategyKind::Tiered, &StrategyConfig::default());
        let err = solve_selection(
            &pool(),
            &strategy,
            50_000.0,
            &SelectionRules::default(),
            &OptimizerSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.reason, InfeasibleReason::SalaryCap);
    }

    #[test]
    fn matches_brute_force_on_seeded_pools() {
        let config = StrategyConfig::default();
        for seed in 0..6 {
            let pool = seeded_slate(16, seed);
            for kind in [
                StrategyKind::MaxValue,
                StrategyKind::MaxValuePerCost,
                StrategyKind::MaxCeiling,
                StrategyKind::Balanced,
            ] {
                let strategy = Strategy::for_pool(kind, &config, &pool);
                for cap in [45_000.0, 50_000.0, 60_000.0] {
                    let expected = brute_force_best(&pool, cap, |c| strategy.weight(c));
                    let solved = solve_selection(
                        &pool,
                        &strategy,
                        cap,
                        &SelectionRules::default(),
                        &OptimizerSettings::default(),
                    );
                    match (expected, solved) {
                        (Some(expected), Ok(selection)) => assert!(
                            (selection.objective - expected).abs() < 1e-6,
                            "seed {seed} {kind} cap {cap}: got {} expected {expected}",
                            selection.objective
                        ),
                        (None, Err(err)) => assert_ne!(err.reason, InfeasibleReason::SearchLimit),
                        (expected, solved) => {
                            panic!("seed {seed} {kind} cap {cap}: {expected:?} vs {solved:?}")
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn full_slate_solves_to_a_swap_optimal_roster() {
        let pool = seeded_slate(200, 42);
        let settings = OptimizerSettings {
            search_node_limit: 5_000_000,
        };
        let selection = solve_selection(
            &pool,
            &Strategy::max_value(),
            50_000.0,
            &SelectionRules::default(),
            &settings,
        )
        .expect("a 200-candidate slate should solve well inside the node limit");

        let chosen: Vec<&Candidate> = selection.indices.iter().map(|&i| &pool[i]).collect();
        assert!(valid(&chosen, 50_000.0));

        // No single swap with an unchosen candidate yields a better valid roster.
        for out in 0..ROSTER_SIZE {
            for (i, candidate) in pool.iter().enumerate() {
                if selection.indices.contains(&i) {
                    continue;
                }
                let mut swapped = chosen.clone();
                swapped[out] = candidate;
                let value: f64 = swapped.iter().map(|c| c.projected_value).sum();
                if valid(&swapped, 50_000.0) {
                    assert!(value <= selection.objective + 1e-6, "swap beats {}", selection.objective);
                }
            }
        }
    }

    #[test]
    fn full_slate_with_overlap_rules_solves() {
        let pool = seeded_slate(200, 7);
        let first = solve(&pool, 50_000.0).unwrap();
        let first_keys: HashSet<String> = first.indices.iter().map(|&i| pool[i].key.clone()).collect();
        let rules = SelectionRules {
            prior_lineups: vec![first_keys.clone()],
            max_overlap: 3,
            ..SelectionRules::default()
        };
        let second = solve_selection(
            &pool,
            &Strategy::max_value(),
            50_000.0,
            &rules,
            &OptimizerSettings::default(),
        )
        .unwrap();
        let shared = second
            .indices
            .iter()
            .filter(|&&i| first_keys.contains(&pool[i].key))
            .count();
        assert!(shared <= 3);
        assert!(second.objective <= first.objective + 1e-9);
    }

    #[test]
    fn salary_multiplier_is_zero_without_a_binding_cap() {
        let pool = pool();
        let weights: Vec<f64> = pool.iter().map(|c| c.projected_value).collect();
        let problem = Problem::build(&pool, &weights, f64::INFINITY, None, &SelectionRules::default());
        assert_eq!(problem.multiplier, 0.0);
        assert_eq!(problem.bound_offset, 0.0);

        let tight = Problem::build(&pool, &weights, 50_000.0, None, &SelectionRules::default());
        assert!(tight.multiplier > 0.0);
    }
}
