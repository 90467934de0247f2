// Cost/position and projection table loading.
//
// Both tables are CSV with a header row. Column names follow the generic
// `name, cost, position` / `name, projected_value` layout, with aliases for
// the DraftKings draftables export (displayName, salary) and the predictions
// export (Player, FPTS, FPTS_Ceiling, ...). Extra columns are ignored.

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::{normalize_name, InputFormatError};
use crate::position::PositionSet;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One purchasable row of the cost/position table.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    pub name: String,
    pub key: String,
    pub team: Option<String>,
    pub cost: f64,
    pub positions: PositionSet,
}

#[derive(Debug, Clone, Default)]
pub struct CostTable {
    pub records: Vec<CostRecord>,
    /// Rows dropped because their normalized name was already present.
    pub duplicates_removed: usize,
    /// Rows dropped for a missing name, cost or position.
    pub rows_rejected: usize,
}

/// One row of the projection table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRecord {
    pub name: String,
    pub key: String,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub tip_time: Option<String>,
    pub projected_value: f64,
    pub ceiling_value: Option<f64>,
    pub floor_value: Option<f64>,
    pub stddev: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectionTable {
    pub records: Vec<ProjectionRecord>,
    pub rows_rejected: usize,
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

const COST_NAME_COLUMNS: &[&str] = &["name", "displayName", "Name", "Player"];
const COST_COLUMNS: &[&str] = &["cost", "salary", "Salary"];
const POSITION_COLUMNS: &[&str] = &["position", "Position"];

const PROJECTION_NAME_COLUMNS: &[&str] = &["name", "Player", "Name"];
const PROJECTION_VALUE_COLUMNS: &[&str] = &["projected_value", "FPTS"];

#[derive(Debug, Deserialize)]
struct RawCostRow {
    #[serde(alias = "displayName", alias = "Name", alias = "Player")]
    name: String,
    #[serde(alias = "salary", alias = "Salary")]
    cost: Option<f64>,
    #[serde(alias = "Position")]
    position: String,
    #[serde(alias = "Team", alias = "teamAbbreviation")]
    team: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProjectionRow {
    #[serde(alias = "Player", alias = "Name")]
    name: String,
    #[serde(alias = "FPTS")]
    projected_value: Option<f64>,
    #[serde(alias = "Team")]
    team: Option<String>,
    #[serde(alias = "Opponent", alias = "Opponent_Team")]
    opponent: Option<String>,
    #[serde(alias = "Tip_Time")]
    tip_time: Option<String>,
    #[serde(alias = "FPTS_Ceiling", alias = "ceiling_FPTS")]
    ceiling_value: Option<f64>,
    #[serde(alias = "FPTS_Floor", alias = "floor_FPTS")]
    floor_value: Option<f64>,
    #[serde(alias = "FPTS_StdDev")]
    stddev: Option<f64>,
    #[serde(alias = "FPTS_Variance")]
    variance: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr)
}

/// Fail with `MissingColumn` unless one of `aliases` is a header.
fn require_column(
    headers: &csv::StringRecord,
    aliases: &[&str],
    source: &str,
) -> Result<(), InputFormatError> {
    if headers.iter().any(|h| aliases.contains(&h)) {
        return Ok(());
    }
    Err(InputFormatError::MissingColumn {
        path: source.to_string(),
        column: aliases[0].to_string(),
        found: headers.iter().collect::<Vec<_>>().join(", "),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Parse a cost/position table. `source` names the input in errors and logs.
///
/// Rows with a blank name, a missing or non-positive cost, or no recognizable
/// position are dropped. Rows whose normalized name repeats an earlier row are
/// dropped and counted in `duplicates_removed`.
pub fn read_cost_table<R: Read>(rdr: R, source: &str) -> Result<CostTable, InputFormatError> {
    let mut reader = csv_reader(rdr);
    let headers = reader
        .headers()
        .map_err(|e| InputFormatError::Csv {
            path: source.to_string(),
            source: e,
        })?
        .clone();
    require_column(&headers, COST_NAME_COLUMNS, source)?;
    require_column(&headers, COST_COLUMNS, source)?;
    require_column(&headers, POSITION_COLUMNS, source)?;

    let mut table = CostTable::default();
    let mut seen: HashSet<String> = HashSet::new();

    for result in reader.deserialize::<RawCostRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed cost row in {}: {}", source, e);
                table.rows_rejected += 1;
                continue;
            }
        };

        let name = raw.name.trim().to_string();
        if name.is_empty() {
            warn!("skipping cost row with blank name in {}", source);
            table.rows_rejected += 1;
            continue;
        }
        let cost = match finite(raw.cost) {
            Some(cost) if cost > 0.0 => cost,
            _ => {
                warn!("skipping '{}': missing or non-positive cost", name);
                table.rows_rejected += 1;
                continue;
            }
        };
        let (positions, unknown) = PositionSet::parse(&raw.position);
        if !unknown.is_empty() {
            warn!("'{}': ignoring unknown position tokens {:?}", name, unknown);
        }
        if positions.is_empty() {
            warn!("skipping '{}': no recognizable position in '{}'", name, raw.position);
            table.rows_rejected += 1;
            continue;
        }

        let key = normalize_name(&name);
        if !seen.insert(key.clone()) {
            warn!("duplicate cost row for '{}', keeping first occurrence", name);
            table.duplicates_removed += 1;
            continue;
        }

        table.records.push(CostRecord {
            name,
            key,
            team: non_blank(raw.team).map(|t| t.trim().to_string()),
            cost,
            positions,
        });
    }

    if table.records.is_empty() {
        return Err(InputFormatError::Empty {
            path: source.to_string(),
        });
    }
    if table.duplicates_removed > 0 {
        warn!(
            "removed {} duplicate name(s) from {}",
            table.duplicates_removed, source
        );
    }
    info!(
        "loaded {} cost rows from {} ({} rejected)",
        table.records.len(),
        source,
        table.rows_rejected
    );
    Ok(table)
}

/// Parse a projection table. Rows with a blank name or a missing/non-finite
/// projection are dropped. A variance column is converted to a standard
/// deviation when no standard deviation is given.
pub fn read_projection_table<R: Read>(
    rdr: R,
    source: &str,
) -> Result<ProjectionTable, InputFormatError> {
    let mut reader = csv_reader(rdr);
    let headers = reader
        .headers()
        .map_err(|e| InputFormatError::Csv {
            path: source.to_string(),
            source: e,
        })?
        .clone();
    require_column(&headers, PROJECTION_NAME_COLUMNS, source)?;
    require_column(&headers, PROJECTION_VALUE_COLUMNS, source)?;

    let mut table = ProjectionTable::default();

    for result in reader.deserialize::<RawProjectionRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed projection row in {}: {}", source, e);
                table.rows_rejected += 1;
                continue;
            }
        };

        let name = raw.name.trim().to_string();
        if name.is_empty() {
            table.rows_rejected += 1;
            continue;
        }
        let Some(projected_value) = finite(raw.projected_value) else {
            warn!("skipping projection for '{}': missing or non-finite value", name);
            table.rows_rejected += 1;
            continue;
        };

        let stddev = finite(raw.stddev).or_else(|| {
            finite(raw.variance)
                .filter(|v| *v >= 0.0)
                .map(f64::sqrt)
        });

        table.records.push(ProjectionRecord {
            key: normalize_name(&name),
            name,
            team: non_blank(raw.team),
            opponent: non_blank(raw.opponent),
            tip_time: non_blank(raw.tip_time),
            projected_value,
            ceiling_value: finite(raw.ceiling_value),
            floor_value: finite(raw.floor_value),
            stddev,
        });
    }

    info!(
        "loaded {} projections from {} ({} rejected)",
        table.records.len(),
        source,
        table.rows_rejected
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load the cost/position table from a CSV file.
pub fn load_cost_table(path: &Path) -> Result<CostTable, InputFormatError> {
    let file = std::fs::File::open(path).map_err(|e| InputFormatError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_cost_table(file, &path.display().to_string())
}

/// Load the projection table from a CSV file.
pub fn load_projection_table(path: &Path) -> Result<ProjectionTable, InputFormatError> {
    let file = std::fs::File::open(path).map_err(|e| InputFormatError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_projection_table(file, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
