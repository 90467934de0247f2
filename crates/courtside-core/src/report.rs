// Lineup reports: tabular rows with a TOTAL line, summaries, and CSV/JSON
// output.

use std::fmt::Write as _;
use std::io;

use serde::Serialize;

use crate::slots::Lineup;
use crate::volatility::VolatilityRow;

/// Label of the summary row appended to every report.
pub const TOTAL_LABEL: &str = "TOTAL";

/// One output row: a filled slot, or the TOTAL line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Slot")]
    pub slot: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "ProjectedValue")]
    pub projected_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupReport {
    pub label: String,
    /// Slot rows in display order.
    pub rows: Vec<ReportRow>,
    pub total: ReportRow,
}

impl LineupReport {
    /// Slot rows followed by the TOTAL row.
    pub fn all_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().chain(std::iter::once(&self.total))
    }
}

/// Build the tabular report for a lineup.
pub fn format_lineup(lineup: &Lineup) -> LineupReport {
    let rows: Vec<ReportRow> = lineup
        .slots
        .iter()
        .map(|a| ReportRow {
            slot: a.slot.to_string(),
            name: a.candidate.name.clone(),
            position: a.candidate.positions.label(),
            team: a.candidate.team.clone(),
            cost: a.candidate.cost,
            projected_value: a.candidate.projected_value,
        })
        .collect();
    let total = ReportRow {
        slot: TOTAL_LABEL.to_string(),
        name: String::new(),
        position: String::new(),
        team: String::new(),
        cost: rows.iter().map(|r| r.cost).sum(),
        projected_value: rows.iter().map(|r| r.projected_value).sum(),
    };
    LineupReport {
        label: lineup.label.clone(),
        rows,
        total,
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupSummary {
    pub total_cost: f64,
    pub cap_remaining: f64,
    pub total_value: f64,
    pub average_value: f64,
}

pub fn summarize(lineup: &Lineup, salary_cap: f64) -> LineupSummary {
    let total_cost = lineup.total_cost();
    let total_value = lineup.total_value();
    let count = lineup.slots.len().max(1) as f64;
    LineupSummary {
        total_cost,
        cap_remaining: salary_cap - total_cost,
        total_value,
        average_value: total_value / count,
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write one report (slot rows plus TOTAL) as CSV.
pub fn write_csv<W: io::Write>(report: &LineupReport, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in report.all_rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct LabeledRow<'a> {
    #[serde(rename = "Lineup")]
    lineup: &'a str,
    #[serde(rename = "Slot")]
    slot: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Position")]
    position: &'a str,
    #[serde(rename = "Team")]
    team: &'a str,
    #[serde(rename = "Cost")]
    cost: f64,
    #[serde(rename = "ProjectedValue")]
    projected_value: f64,
}

/// Write several reports into one CSV, each row prefixed by its lineup label.
pub fn write_lineup_set_csv<W: io::Write>(reports: &[LineupReport], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for report in reports {
        for row in report.all_rows() {
            wtr.serialize(LabeledRow {
                lineup: &report.label,
                slot: &row.slot,
                name: &row.name,
                position: &row.position,
                team: &row.team,
                cost: row.cost,
                projected_value: row.projected_value,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Write the boom/bust table as CSV.
pub fn write_volatility_csv<W: io::Write>(rows: &[VolatilityRow], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_json(report: &LineupReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Fixed-width text rendering for terminal output.
pub fn render_table(report: &LineupReport, summary: &LineupSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Lineup: {}", report.label);
    let _ = writeln!(
        out,
        "{:<5} {:<28} {:<8} {:<5} {:>8} {:>8}",
        "Slot", "Name", "Pos", "Team", "Cost", "Proj"
    );
    for row in report.all_rows() {
        let _ = writeln!(
            out,
            "{:<5} {:<28} {:<8} {:<5} {:>8.0} {:>8.2}",
            row.slot, row.name, row.position, row.team, row.cost, row.projected_value
        );
    }
    let _ = writeln!(
        out,
        "Cap remaining: {:.0}  Average per player: {:.2}",
        summary.cap_remaining, summary.average_value
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Candidate;
    use crate::slots::SlotAssigner;

    fn lineup() -> Lineup {
        let selection = vec![
            Candidate::new("Point", 7000.0, "PG", 40.5).with_team("BOS"),
            Candidate::new("Combo", 6500.0, "PG/SG", 38.0).with_team("NYK"),
            Candidate::new("Shooter", 6000.0, "SG", 30.25).with_team("BOS"),
            Candidate::new("Wing", 5500.0, "SF", 28.0).with_team("LAL"),
            Candidate::new("Stretch", 5000.0, "SF/PF", 27.0).with_team("LAL"),
            Candidate::new("Big", 4500.0, "PF", 25.0).with_team("MIA"),
            Candidate::new("Center", 8000.0, "C", 45.0).with_team("DEN"),
            Candidate::new("Backup", 3500.0, "C", 15.0).with_team("DEN"),
        ];
        SlotAssigner::default()
            .build_lineup("max_value", &selection)
            .unwrap()
    }

    #[test]
    fn total_row_equals_sums() {
        let report = format_lineup(&lineup());
        assert_eq!(report.rows.len(), 8);
        assert_eq!(report.total.slot, TOTAL_LABEL);
        let cost: f64 = report.rows.iter().map(|r| r.cost).sum();
        let value: f64 = report.rows.iter().map(|r| r.projected_value).sum();
        assert!((report.total.cost - cost).abs() < 1e-9);
        assert!((report.total.projected_value - value).abs() < 1e-9);
        assert!((report.total.cost - 46_000.0).abs() < 1e-9);
    }

    #[test]
    fn rows_are_in_slot_order() {
        let report = format_lineup(&lineup());
        let slots: Vec<&str> = report.rows.iter().map(|r| r.slot.as_str()).collect();
        assert_eq!(slots, vec!["PG", "SG", "SF", "PF", "C", "G", "F", "UTIL"]);
        assert_eq!(report.rows[6].position, "SF/PF");
    }

    #[test]
    fn summary_reports_cap_remaining_and_average() {
        let summary = summarize(&lineup(), 50_000.0);
        assert!((summary.cap_remaining - 4_000.0).abs() < 1e-9);
        assert!((summary.total_value - 248.75).abs() < 1e-9);
        assert!((summary.average_value - 248.75 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn csv_has_header_rows_and_total() {
        let report = format_lineup(&lineup());
        let mut buf = Vec::new();
        write_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Slot,Name,Position,Team,Cost,ProjectedValue");
        assert_eq!(lines.len(), 10);
        assert!(lines[1].starts_with("PG,Point,PG,BOS,"));
        assert!(lines[9].starts_with("TOTAL,,,,"));
    }

    #[test]
    fn lineup_set_csv_prefixes_label() {
        let first = format_lineup(&lineup());
        let mut second = first.clone();
        second.label = "balanced".into();
        let mut buf = Vec::new();
        write_lineup_set_csv(&[first, second], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Lineup,Slot,Name,Position,Team,Cost,ProjectedValue");
        assert_eq!(lines.len(), 1 + 2 * 9);
        assert!(lines[1].starts_with("max_value,PG,"));
        assert!(lines[10].starts_with("balanced,PG,"));
    }

    #[test]
    fn json_round_trips_labels() {
        let json = to_json(&format_lineup(&lineup())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["label"], "max_value");
        assert_eq!(value["rows"][0]["Slot"], "PG");
        assert_eq!(value["total"]["Slot"], "TOTAL");
    }

    #[test]
    fn table_rendering_lists_every_row() {
        let lineup = lineup();
        let text = render_table(&format_lineup(&lineup), &summarize(&lineup, 50_000.0));
        assert!(text.contains("Lineup: max_value"));
        assert!(text.contains("TOTAL"));
        assert!(text.contains("Cap remaining: 4000"));
    }
}
