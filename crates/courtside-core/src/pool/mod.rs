// Candidate pool: loading the two input tables and merging them into
// immutable candidate records.

pub mod load;
pub mod merge;

pub use load::{
    load_cost_table, load_projection_table, read_cost_table, read_projection_table, CostRecord,
    CostTable, ProjectionRecord, ProjectionTable,
};
pub use merge::{filter_by_tip_time, merge_pool, MatchQualityWarning, MatchReport, MergedPool};

use serde::Serialize;

use crate::position::{EligibilityFlags, PositionSet};

/// Default ceiling multiplier when a projection carries no ceiling.
pub const DEFAULT_CEILING_FACTOR: f64 = 1.3;
/// Default floor multiplier when a projection carries no floor.
pub const DEFAULT_FLOOR_FACTOR: f64 = 0.7;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum InputFormatError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing required column `{column}` (found: {found})")]
    MissingColumn {
        path: String,
        column: String,
        found: String,
    },

    #[error("{path} produced zero valid rows")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// How a candidate's projection was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MatchKind {
    Exact,
    /// Similarity on a 0-100 scale.
    Fuzzy { score: f64 },
    /// No projection found; the candidate carries a zero projection.
    Unmatched,
}

/// A purchasable athlete with its merged projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Display name from the cost table.
    pub name: String,
    /// Normalized name; unique within a pool.
    pub key: String,
    pub team: String,
    pub opponent: Option<String>,
    pub tip_time: Option<String>,
    pub cost: f64,
    pub positions: PositionSet,
    pub projected_value: f64,
    pub ceiling_value: Option<f64>,
    pub floor_value: Option<f64>,
    pub stddev: Option<f64>,
    pub match_kind: MatchKind,
}

impl Candidate {
    /// Build a matched candidate directly, e.g. from an in-memory pool.
    ///
    /// Unparseable position tokens are ignored.
    pub fn new(name: &str, cost: f64, positions: &str, projected_value: f64) -> Self {
        Candidate {
            name: name.trim().to_string(),
            key: normalize_name(name),
            team: String::new(),
            opponent: None,
            tip_time: None,
            cost,
            positions: PositionSet::parse(positions).0,
            projected_value,
            ceiling_value: None,
            floor_value: None,
            stddev: None,
            match_kind: MatchKind::Exact,
        }
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = team.to_string();
        self
    }

    pub fn with_range(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor_value = Some(floor);
        self.ceiling_value = Some(ceiling);
        self
    }

    pub fn with_stddev(mut self, stddev: f64) -> Self {
        self.stddev = Some(stddev);
        self
    }

    pub fn eligibility(&self) -> EligibilityFlags {
        EligibilityFlags::from_positions(&self.positions)
    }

    /// Ceiling projection, defaulting to 130% of the projection.
    pub fn ceiling(&self) -> f64 {
        self.ceiling_value
            .unwrap_or(self.projected_value * DEFAULT_CEILING_FACTOR)
    }

    /// Floor projection, defaulting to 70% of the projection.
    pub fn floor(&self) -> f64 {
        self.floor_value
            .unwrap_or(self.projected_value * DEFAULT_FLOOR_FACTOR)
    }

    /// Projected value per `scale` cost units. Costs below 1 are treated as 1.
    pub fn value_per_cost(&self, scale: f64) -> f64 {
        self.projected_value / self.cost.max(1.0) * scale
    }

    pub fn is_matched(&self) -> bool {
        self.match_kind != MatchKind::Unmatched
    }
}

/// Eligibility flags for every candidate, in pool order.
pub fn eligibility_flags(candidates: &[Candidate]) -> Vec<EligibilityFlags> {
    candidates.iter().map(Candidate::eligibility).collect()
}

/// Whether any candidate in the pool carries explicit ceiling data.
pub fn has_ceiling_data(candidates: &[Candidate]) -> bool {
    candidates.iter().any(|c| c.ceiling_value.is_some())
}

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

const NAME_SUFFIXES: &[&str] = &[" jr.", " sr.", " ii", " iii", " iv", " jr", " sr"];

/// Normalize a player name into a matching key: trimmed, lower-case, with a
/// trailing generational suffix (Jr., Sr., II, III, IV) removed.
pub fn normalize_name(name: &str) -> String {
    let mut key = name.trim().to_lowercase();
    for suffix in NAME_SUFFIXES {
        if key.ends_with(suffix) {
            key.truncate(key.len() - suffix.len());
            key = key.trim_end().to_string();
        }
    }
    key
}
