// Joining the cost table with the projection table.
//
// Matching runs in three passes, each over records the previous passes left
// unmatched:
// 1. exact match on the normalized name
// 2. fuzzy match on normalized Levenshtein similarity (0-100 scale)
// 3. leftover cost rows are kept with a zero projection

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Candidate, CostRecord, CostTable, MatchKind, ProjectionRecord, ProjectionTable};
use crate::config::MatchConfig;
use crate::position::ROSTER_SIZE;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Informational diagnostics about the merge. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MatchQualityWarning {
    DuplicatesRemoved { count: usize },
    Unmatched { names: Vec<String> },
    FewProjections { with_projection: usize },
}

impl fmt::Display for MatchQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchQualityWarning::DuplicatesRemoved { count } => {
                write!(f, "{count} duplicate name(s) removed from the cost table")
            }
            MatchQualityWarning::Unmatched { names } => write!(
                f,
                "{} candidate(s) have no projection and were kept at zero value: {}",
                names.len(),
                names.join(", ")
            ),
            MatchQualityWarning::FewProjections { with_projection } => write!(
                f,
                "only {with_projection} candidate(s) have a positive projection; \
                 a full roster needs {ROSTER_SIZE}"
            ),
        }
    }
}

/// Match-quality breakdown for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    pub exact: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
    pub duplicates_removed: usize,
    pub rows_rejected: usize,
    pub warnings: Vec<MatchQualityWarning>,
}

impl MatchReport {
    pub fn total(&self) -> usize {
        self.exact + self.fuzzy + self.unmatched
    }
}

#[derive(Debug, Clone)]
pub struct MergedPool {
    /// One candidate per cost row, in cost-table order.
    pub candidates: Vec<Candidate>,
    pub report: MatchReport,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Similarity of two normalized names on a 0-100 scale.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn candidate_from(cost: &CostRecord, projection: Option<&ProjectionRecord>, kind: MatchKind) -> Candidate {
    let fallback_team = cost.team.clone().unwrap_or_default();
    match projection {
        Some(p) => Candidate {
            name: cost.name.clone(),
            key: cost.key.clone(),
            team: p.team.clone().unwrap_or(fallback_team),
            opponent: p.opponent.clone(),
            tip_time: p.tip_time.clone(),
            cost: cost.cost,
            positions: cost.positions,
            projected_value: p.projected_value,
            ceiling_value: p.ceiling_value,
            floor_value: p.floor_value,
            stddev: p.stddev,
            match_kind: kind,
        },
        None => Candidate {
            name: cost.name.clone(),
            key: cost.key.clone(),
            team: fallback_team,
            opponent: None,
            tip_time: None,
            cost: cost.cost,
            positions: cost.positions,
            projected_value: 0.0,
            ceiling_value: None,
            floor_value: None,
            stddev: None,
            match_kind: MatchKind::Unmatched,
        },
    }
}

/// Merge the two tables into a candidate pool.
///
/// Every cost row yields exactly one candidate, so the optimizer always sees
/// every purchasable athlete even when its projection is missing.
pub fn merge_pool(
    costs: &CostTable,
    projections: &ProjectionTable,
    config: &MatchConfig,
) -> MergedPool {
    let records = &projections.records;
    let mut assigned: Vec<Option<(usize, MatchKind)>> = vec![None; costs.records.len()];
    let mut used = vec![false; records.len()];

    // Pass 1: exact key match against the first projection with that key.
    let mut first_by_key: HashMap<&str, usize> = HashMap::new();
    for (idx, rec) in records.iter().enumerate() {
        if !rec.key.is_empty() {
            first_by_key.entry(rec.key.as_str()).or_insert(idx);
        }
    }
    for (cost_idx, cost) in costs.records.iter().enumerate() {
        if let Some(&proj_idx) = first_by_key.get(cost.key.as_str()) {
            assigned[cost_idx] = Some((proj_idx, MatchKind::Exact));
            used[proj_idx] = true;
        }
    }

    // Pass 2: best unmatched projection above the threshold.
    if config.fuzzy_enabled {
        for (cost_idx, cost) in costs.records.iter().enumerate() {
            if assigned[cost_idx].is_some() || cost.key.is_empty() {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for (proj_idx, rec) in records.iter().enumerate() {
                if used[proj_idx] || rec.key.is_empty() {
                    continue;
                }
                let score = name_similarity(&cost.key, &rec.key);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((proj_idx, score));
                }
            }
            if let Some((proj_idx, score)) = best {
                if score >= config.fuzzy_threshold {
                    debug!(
                        "fuzzy match '{}' -> '{}' ({:.1})",
                        cost.name, records[proj_idx].name, score
                    );
                    assigned[cost_idx] = Some((proj_idx, MatchKind::Fuzzy { score }));
                    used[proj_idx] = true;
                }
            }
        }
    }

    // Pass 3: everything left keeps a zero projection.
    let mut report = MatchReport {
        duplicates_removed: costs.duplicates_removed,
        rows_rejected: costs.rows_rejected + projections.rows_rejected,
        ..MatchReport::default()
    };
    let mut unmatched_names = Vec::new();
    let candidates: Vec<Candidate> = costs
        .records
        .iter()
        .zip(&assigned)
        .map(|(cost, slot)| match slot {
            Some((proj_idx, kind)) => {
                match kind {
                    MatchKind::Exact => report.exact += 1,
                    _ => report.fuzzy += 1,
                }
                candidate_from(cost, Some(&records[*proj_idx]), *kind)
            }
            None => {
                report.unmatched += 1;
                unmatched_names.push(cost.name.clone());
                candidate_from(cost, None, MatchKind::Unmatched)
            }
        })
        .collect();

    if report.duplicates_removed > 0 {
        report.warnings.push(MatchQualityWarning::DuplicatesRemoved {
            count: report.duplicates_removed,
        });
    }
    if !unmatched_names.is_empty() {
        report.warnings.push(MatchQualityWarning::Unmatched {
            names: unmatched_names,
        });
    }
    let with_projection = candidates.iter().filter(|c| c.projected_value > 0.0).count();
    if with_projection < ROSTER_SIZE {
        report
            .warnings
            .push(MatchQualityWarning::FewProjections { with_projection });
    }

    info!(
        "merged pool: {} exact, {} fuzzy, {} unmatched ({} total)",
        report.exact,
        report.fuzzy,
        report.unmatched,
        report.total()
    );
    for warning in &report.warnings {
        warn!("{}", warning);
    }

    MergedPool { candidates, report }
}

/// Restrict a pool to candidates tipping off at one of `tip_times`.
///
/// An empty selection keeps the whole pool. Candidates without a tip time
/// are dropped by a non-empty selection.
pub fn filter_by_tip_time(candidates: &[Candidate], tip_times: &[String]) -> Vec<Candidate> {
    if tip_times.is_empty() {
        return candidates.to_vec();
    }
    candidates
        .iter()
        .filter(|c| {
            c.tip_time
                .as_ref()
                .is_some_and(|t| tip_times.iter().any(|sel| sel.trim() == t.trim()))
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{read_cost_table, read_projection_table};

    fn merge(costs: &str, preds: &str, config: &MatchConfig) -> MergedPool {
        let costs = read_cost_table(costs.as_bytes(), "costs").unwrap();
        let preds = read_projection_table(preds.as_bytes(), "preds").unwrap();
        merge_pool(&costs, &preds, config)
    }

    #[test]
    fn exact_fuzzy_and_unmatched_passes() {
        let costs = "\
name,cost,position
Jaren Jackson Jr.,8100,PF/C
Nikola Jokic,11500,C
Shai Gilgeous-Alexander,10200,PG
Unknown Rookie,3000,SF";
        let preds = "\
Player,Team,FPTS
Jaren Jackson,MEM,42.0
Nikola Jokić,DEN,60.5
Shai Gilgeous Alexander,OKC,55.0";

        let merged = merge(costs, preds, &MatchConfig::default());
        let r = &merged.report;
        assert_eq!(r.exact, 1);
        assert_eq!(r.fuzzy, 2);
        assert_eq!(r.unmatched, 1);
        assert_eq!(r.total(), 4);

        let c = &merged.candidates;
        assert_eq!(c.len(), 4);
        assert_eq!(c[0].match_kind, MatchKind::Exact);
        assert_eq!(c[0].team, "MEM");
        assert!(matches!(c[1].match_kind, MatchKind::Fuzzy { .. }));
        assert!((c[1].projected_value - 60.5).abs() < f64::EPSILON);
        assert!(matches!(c[2].match_kind, MatchKind::Fuzzy { score } if score >= 85.0));
        assert_eq!(c[3].match_kind, MatchKind::Unmatched);
        assert_eq!(c[3].projected_value, 0.0);
        assert!(r
            .warnings
            .iter()
            .any(|w| matches!(w, MatchQualityWarning::Unmatched { names } if names == &vec!["Unknown Rookie".to_string()])));
    }

    #[test]
    fn fuzzy_pass_skipped_when_disabled() {
        let costs = "\
name,cost,position
Nikola Jokic,11500,C";
        let preds = "\
Player,FPTS
Nikola Jokić,60.5";

        let config = MatchConfig {
            fuzzy_enabled: false,
            ..MatchConfig::default()
        };
        let merged = merge(costs, preds, &config);
        assert_eq!(merged.report.fuzzy, 0);
        assert_eq!(merged.report.unmatched, 1);
    }

    #[test]
    fn dissimilar_names_stay_unmatched() {
        let costs = "\
name,cost,position
Jalen Green,7000,SG";
        let preds = "\
Player,FPTS
Jalen Brunson,45";

        let merged = merge(costs, preds, &MatchConfig::default());
        assert_eq!(merged.report.unmatched, 1);
        assert_eq!(merged.candidates[0].projected_value, 0.0);
    }

    #[test]
    fn fuzzy_match_consumes_projection() {
        let costs = "\
name,cost,position
Nikola Jokic,11500,C
Nikola Jokicc,3000,C";
        let preds = "\
Player,FPTS
Nikola Jokić,60.5";

        let merged = merge(costs, preds, &MatchConfig::default());
        assert_eq!(merged.report.fuzzy, 1);
        assert_eq!(merged.report.unmatched, 1);
        assert!(merged.candidates[0].is_matched());
        assert!(!merged.candidates[1].is_matched());
    }

    #[test]
    fn duplicates_reported_as_warning() {
        let costs = "\
name,cost,position
A. Smith,5000,PG
A. Smith,6000,PG";
        let preds = "\
Player,FPTS
A. Smith,30";

        let merged = merge(costs, preds, &MatchConfig::default());
        assert_eq!(merged.candidates.len(), 1);
        assert_eq!(merged.report.duplicates_removed, 1);
        assert!(merged
            .report
            .warnings
            .contains(&MatchQualityWarning::DuplicatesRemoved { count: 1 }));
    }

    #[test]
    fn few_projections_warning() {
        let costs = "\
name,cost,position
A,5000,PG";
        let preds = "\
Player,FPTS
A,30";

        let merged = merge(costs, preds, &MatchConfig::default());
        assert!(merged
            .report
            .warnings
            .contains(&MatchQualityWarning::FewProjections { with_projection: 1 }));
    }

    #[test]
    fn projection_team_preferred_over_cost_team() {
        let costs = "\
name,cost,position,Team
A,5000,PG,XXX
B,5000,SG,BOS";
        let preds = "\
Player,Team,FPTS
A,NYK,30";

        let merged = merge(costs, preds, &MatchConfig::default());
        assert_eq!(merged.candidates[0].team, "NYK");
        assert_eq!(merged.candidates[1].team, "BOS");
    }

    #[test]
    fn tip_time_filter_keeps_selected_waves() {
        let mut early = Candidate::new("Early", 5000.0, "PG", 30.0);
        early.tip_time = Some("7:00 PM".into());
        let mut late = Candidate::new("Late", 5000.0, "PG", 30.0);
        late.tip_time = Some("10:00 PM".into());
        let unknown = Candidate::new("Unknown", 5000.0, "PG", 30.0);
        let pool = vec![early, late, unknown];

        assert_eq!(filter_by_tip_time(&pool, &[]).len(), 3);
        let filtered = filter_by_tip_time(&pool, &["7:00 PM".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Early");
    }

    #[test]
    fn similarity_scale() {
        assert!((name_similarity("abc", "abc") - 100.0).abs() < 1e-9);
        assert!(name_similarity("nikola jokic", "nikola jokić") >= 85.0);
        assert!(name_similarity("jalen green", "jalen brunson") < 85.0);
    }
}
