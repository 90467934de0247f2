// Boom/bust volatility scoring.
//
// Boom measures upside (ceiling headroom, value per cost, spread); bust
// measures downside (floor drop, cost per point, consistency). Raw scores are
// min-max normalized across the pool into 0-100 probabilities. The result is
// informational and never gates selection.

use std::cmp::Ordering;

use serde::Serialize;

use crate::pool::Candidate;

/// Matchup contribution; matchup data is not modeled, so it is neutral.
const NEUTRAL_MATCHUP: f64 = 0.1;
/// Cost-per-point term used when the projection is zero or negative.
const NO_PROJECTION_COST_RATIO: f64 = 10.0;
/// Spread (stddev / 10) is capped at this value.
const SPREAD_CAP: f64 = 2.0;

/// Volatility scores for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityRow {
    pub name: String,
    pub team: String,
    pub cost: f64,
    pub projected_value: f64,
    pub boom_score: f64,
    pub bust_score: f64,
    pub boom_probability: f64,
    pub bust_probability: f64,
}

fn spread(candidate: &Candidate) -> f64 {
    (candidate.stddev.unwrap_or(0.0) / 10.0).min(SPREAD_CAP)
}

/// Raw upside score.
pub fn boom_score(candidate: &Candidate) -> f64 {
    let p = candidate.projected_value;
    let ceiling_upside = (candidate.ceiling() - p).max(0.0) * 0.4;
    let value = if candidate.cost > 0.0 {
        (p / candidate.cost * 1000.0) * 0.2
    } else {
        0.0
    };
    ceiling_upside + value + spread(candidate) * 0.2 + NEUTRAL_MATCHUP
}

/// Raw downside score.
pub fn bust_score(candidate: &Candidate) -> f64 {
    let p = candidate.projected_value;
    let floor_downside = (p - candidate.floor()).max(0.0) * 0.3;
    let cost_risk = if p > 0.0 {
        (candidate.cost / p) * 0.3
    } else {
        NO_PROJECTION_COST_RATIO * 0.3
    };
    let consistency = (SPREAD_CAP - spread(candidate)).max(0.0) * 0.2;
    floor_downside + cost_risk + consistency + NEUTRAL_MATCHUP
}

/// Min-max normalize scores onto 0-100. All zeros when every score is equal.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if scores.is_empty() || !(range > 0.0) {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / range * 100.0).collect()
}

/// Score every candidate in the pool, preserving pool order.
pub fn score_pool(candidates: &[Candidate]) -> Vec<VolatilityRow> {
    let booms: Vec<f64> = candidates.iter().map(boom_score).collect();
    let busts: Vec<f64> = candidates.iter().map(bust_score).collect();
    let boom_probs = normalize_scores(&booms);
    let bust_probs = normalize_scores(&busts);

    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| VolatilityRow {
            name: c.name.clone(),
            team: c.team.clone(),
            cost: c.cost,
            projected_value: c.projected_value,
            boom_score: booms[i],
            bust_score: busts[i],
            boom_probability: boom_probs[i],
            bust_probability: bust_probs[i],
        })
        .collect()
}

/// Rows sorted by boom probability, highest first.
pub fn rank_by_boom(rows: &[VolatilityRow]) -> Vec<VolatilityRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.boom_probability
            .partial_cmp(&a.boom_probability)
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Rows sorted by bust probability, highest first.
pub fn rank_by_bust(rows: &[VolatilityRow]) -> Vec<VolatilityRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        b.bust_probability
            .partial_cmp(&a.bust_probability)
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn boom_score_formula_with_defaults() {
        // p = 40, c = 52, cost = 8000, stddev = 0
        let c = Candidate::new("A", 8000.0, "PG", 40.0);
        let expected = 0.4 * 12.0 + 0.2 * 5.0 + 0.0 + 0.1;
        assert!(approx(boom_score(&c), expected));
    }

    #[test]
    fn boom_score_caps_spread() {
        let c = Candidate::new("A", 8000.0, "PG", 40.0)
            .with_range(30.0, 40.0)
            .with_stddev(50.0);
        let expected = 0.0 + 0.2 * 5.0 + 0.2 * 2.0 + 0.1;
        assert!(approx(boom_score(&c), expected));
    }

    #[test]
    fn bust_score_formula() {
        // p = 40, f = 28, cost = 8000, stddev = 10
        let c = Candidate::new("A", 8000.0, "PG", 40.0).with_stddev(10.0);
        let expected = 0.3 * 12.0 + 0.3 * 200.0 + 0.2 * 1.0 + 0.1;
        assert!(approx(bust_score(&c), expected));
    }

    #[test]
    fn bust_score_penalizes_missing_projection() {
        let c = Candidate::new("A", 3000.0, "PG", 0.0);
        let expected = 0.0 + 0.3 * 10.0 + 0.2 * 2.0 + 0.1;
        assert!(approx(bust_score(&c), expected));
    }

    #[test]
    fn probabilities_within_range_and_max_is_hundred() {
        let pool = vec![
            Candidate::new("A", 9000.0, "PG", 50.0).with_stddev(12.0),
            Candidate::new("B", 4000.0, "SG", 20.0),
            Candidate::new("C", 6000.0, "C", 35.0).with_range(20.0, 60.0),
            Candidate::new("D", 3000.0, "SF", 0.0),
        ];
        let rows = score_pool(&pool);
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert!((0.0..=100.0).contains(&row.boom_probability));
            assert!((0.0..=100.0).contains(&row.bust_probability));
        }

        let max_boom = rows
            .iter()
            .max_by(|a, b| a.boom_score.partial_cmp(&b.boom_score).unwrap())
            .unwrap();
        assert!(approx(max_boom.boom_probability, 100.0));
        let max_bust = rows
            .iter()
            .max_by(|a, b| a.bust_score.partial_cmp(&b.bust_score).unwrap())
            .unwrap();
        assert!(approx(max_bust.bust_probability, 100.0));
        assert!(rows.iter().any(|r| approx(r.boom_probability, 0.0)));
    }

    #[test]
    fn tied_scores_give_zero_probability() {
        let pool = vec![
            Candidate::new("A", 5000.0, "PG", 30.0),
            Candidate::new("B", 5000.0, "SG", 30.0),
        ];
        let rows = score_pool(&pool);
        assert!(rows.iter().all(|r| r.boom_probability == 0.0));
        assert!(rows.iter().all(|r| r.bust_probability == 0.0));
    }

    #[test]
    fn empty_pool_scores_nothing() {
        assert!(score_pool(&[]).is_empty());
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn ranking_orders_descending() {
        let pool = vec![
            Candidate::new("Low", 9000.0, "PG", 10.0),
            Candidate::new("High", 3000.0, "SG", 40.0).with_stddev(20.0),
        ];
        let rows = score_pool(&pool);
        assert_eq!(rank_by_boom(&rows)[0].name, "High");
        assert_eq!(rank_by_bust(&rows)[0].name, "Low");
    }
}
