// Strategy catalog: per-candidate objective weights and cost-tier bounds.

use std::fmt;

use serde::Serialize;

use crate::config::StrategyConfig;
use crate::pool::{has_ceiling_data, Candidate};

/// The named lineup-building strategies, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyKind {
    MaxValue,
    MaxValuePerCost,
    MaxCeiling,
    Balanced,
    Tiered,
}

impl StrategyKind {
    /// Order in which the diversification controller walks the catalog.
    pub const CATALOG: [StrategyKind; 5] = [
        StrategyKind::MaxValue,
        StrategyKind::MaxValuePerCost,
        StrategyKind::MaxCeiling,
        StrategyKind::Balanced,
        StrategyKind::Tiered,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::MaxValue => "max_value",
            StrategyKind::MaxValuePerCost => "max_value_per_cost",
            StrategyKind::MaxCeiling => "max_ceiling",
            StrategyKind::Balanced => "balanced",
            StrategyKind::Tiered => "tiered",
        }
    }

    /// Whether the objective is built on ceiling projections.
    pub fn requires_ceiling(&self) -> bool {
        matches!(self, StrategyKind::MaxCeiling | StrategyKind::Tiered)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Linear per-candidate objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Objective {
    /// Projected value.
    Value,
    /// Projected value per `scale` cost units.
    ValuePerCost { scale: f64 },
    /// Ceiling projection (explicit, or 130% of the projection).
    Ceiling,
    /// Weighted sum of projected value and value per cost.
    Blend {
        value_weight: f64,
        efficiency_weight: f64,
        scale: f64,
    },
}

impl Objective {
    pub fn weight(&self, candidate: &Candidate) -> f64 {
        match *self {
            Objective::Value => candidate.projected_value,
            Objective::ValuePerCost { scale } => candidate.value_per_cost(scale),
            Objective::Ceiling => candidate.ceiling(),
            Objective::Blend {
                value_weight,
                efficiency_weight,
                scale,
            } => {
                value_weight * candidate.projected_value
                    + efficiency_weight * candidate.value_per_cost(scale)
            }
        }
    }
}

/// Cost band a candidate falls into under the tiered strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CostTier {
    High,
    Mid,
    Low,
}

impl CostTier {
    pub fn index(&self) -> usize {
        match self {
            CostTier::High => 0,
            CostTier::Mid => 1,
            CostTier::Low => 2,
        }
    }
}

/// Count bounds on how many selected candidates fall into each cost tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierBounds {
    /// Costs at or above this are high tier.
    pub high_min_cost: f64,
    /// Costs at or below this are low tier.
    pub low_max_cost: f64,
    pub min_per_tier: usize,
    pub max_per_tier: usize,
}

impl TierBounds {
    pub fn from_config(config: &StrategyConfig) -> Self {
        TierBounds {
            high_min_cost: config.tier_reference_cost * config.tier_high_fraction,
            low_max_cost: config.tier_reference_cost * config.tier_low_fraction,
            min_per_tier: config.tier_min,
            max_per_tier: config.tier_max,
        }
    }

    pub fn tier_of(&self, cost: f64) -> CostTier {
        if cost >= self.high_min_cost {
            CostTier::High
        } else if cost <= self.low_max_cost {
            CostTier::Low
        } else {
            CostTier::Mid
        }
    }
}

/// A resolved strategy: the objective to maximize plus any composition bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub objective: Objective,
    pub tiers: Option<TierBounds>,
    /// Set when a ceiling objective was swapped for value per cost because
    /// the pool carries no ceiling data.
    pub ceiling_fallback: bool,
}

impl Strategy {
    /// The strategy as configured, before any pool-dependent fallback.
    pub fn from_kind(kind: StrategyKind, config: &StrategyConfig) -> Self {
        let objective = match kind {
            StrategyKind::MaxValue => Objective::Value,
            StrategyKind::MaxValuePerCost => Objective::ValuePerCost {
                scale: config.efficiency_scale,
            },
            StrategyKind::MaxCeiling | StrategyKind::Tiered => Objective::Ceiling,
            StrategyKind::Balanced => Objective::Blend {
                value_weight: config.balanced_value_weight,
                efficiency_weight: config.balanced_efficiency_weight,
                scale: config.efficiency_scale,
            },
        };
        let tiers = match kind {
            StrategyKind::Tiered => Some(TierBounds::from_config(config)),
            _ => None,
        };
        Strategy {
            kind,
            objective,
            tiers,
            ceiling_fallback: false,
        }
    }

    /// Maximize total projected value; the single-lineup default.
    pub fn max_value() -> Self {
        Strategy::from_kind(StrategyKind::MaxValue, &StrategyConfig::default())
    }

    /// Resolve against a pool: ceiling objectives fall back to value per cost
    /// when no candidate carries an explicit ceiling. Tier bounds are kept.
    pub fn for_pool(kind: StrategyKind, config: &StrategyConfig, pool: &[Candidate]) -> Self {
        let mut strategy = Strategy::from_kind(kind, config);
        if kind.requires_ceiling() && !has_ceiling_data(pool) {
            strategy.objective = Objective::ValuePerCost {
                scale: config.efficiency_scale,
            };
            strategy.ceiling_fallback = true;
        }
        strategy
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn weight(&self, candidate: &Candidate) -> f64 {
        self.objective.weight(candidate)
    }
}

/// The first `count` strategies of the catalog, cycling when `count` exceeds
/// its length.
pub fn strategy_catalog(count: usize, config: &StrategyConfig, pool: &[Candidate]) -> Vec<Strategy> {
    StrategyKind::CATALOG
        .iter()
        .cycle()
        .take(count)
        .map(|kind| Strategy::for_pool(*kind, config, pool))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn objective_weights() {
        let c = Candidate::new("A", 5000.0, "PG", 40.0);
        let config = StrategyConfig::default();

        let value = Strategy::from_kind(StrategyKind::MaxValue, &config);
        assert!(approx(value.weight(&c), 40.0));

        let vpc = Strategy::from_kind(StrategyKind::MaxValuePerCost, &config);
        assert!(approx(vpc.weight(&c), 8.0));

        let ceiling = Strategy::from_kind(StrategyKind::MaxCeiling, &config);
        assert!(approx(ceiling.weight(&c), 52.0));

        let balanced = Strategy::from_kind(StrategyKind::Balanced, &config);
        assert!(approx(balanced.weight(&c), 0.6 * 40.0 + 0.4 * 8.0));
    }

    #[test]
    fn zero_cost_treated_as_one() {
        let c = Candidate::new("A", 0.0, "PG", 4.0);
        let vpc = Objective::ValuePerCost { scale: 1000.0 };
        assert!(approx(vpc.weight(&c), 4000.0));
    }

    #[test]
    fn ceiling_strategies_fall_back_without_ceiling_data() {
        let config = StrategyConfig::default();
        let pool = vec![Candidate::new("A", 5000.0, "PG", 40.0)];

        let s = Strategy::for_pool(StrategyKind::MaxCeiling, &config, &pool);
        assert!(s.ceiling_fallback);
        assert_eq!(s.objective, Objective::ValuePerCost { scale: 1000.0 });

        let tiered = Strategy::for_pool(StrategyKind::Tiered, &config, &pool);
        assert!(tiered.ceiling_fallback);
        assert!(tiered.tiers.is_some());

        let with_ceiling = vec![Candidate::new("A", 5000.0, "PG", 40.0).with_range(30.0, 55.0)];
        let s = Strategy::for_pool(StrategyKind::MaxCeiling, &config, &with_ceiling);
        assert!(!s.ceiling_fallback);
        assert_eq!(s.objective, Objective::Ceiling);
    }

    #[test]
    fn tier_boundaries() {
        let bounds = TierBounds::from_config(&StrategyConfig::default());
        assert_eq!(bounds.tier_of(8000.0), CostTier::High);
        assert_eq!(bounds.tier_of(7999.0), CostTier::Mid);
        assert_eq!(bounds.tier_of(6001.0), CostTier::Mid);
        assert_eq!(bounds.tier_of(6000.0), CostTier::Low);
        assert_eq!(bounds.tier_of(3000.0), CostTier::Low);
    }

    #[test]
    fn catalog_cycles_past_five() {
        let names: Vec<_> = strategy_catalog(7, &StrategyConfig::default(), &[])
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "max_value",
                "max_value_per_cost",
                "max_ceiling",
                "balanced",
                "tiered",
                "max_value",
                "max_value_per_cost"
            ]
        );
    }
}
