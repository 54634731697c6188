// Derived views over the normalized table: the stable-demand predicate,
// flat export rows, and a per-park rollup for the console preview.
use std::collections::HashMap;

use chrono::Datelike;
use serde::Serialize;

use crate::types::{ExportRow, Milestone, NormalizedTable, ParkSummaryRow};
use crate::util::{format_int, format_number};

/// Column token that marks a requirement-approval column; matched by
/// containment so suffix variants like 需求立项日期 still count.
const REQUIREMENT_APPROVAL_TOKEN: &str = "需求立项";

/// One flag per record: the requirement has been formally approved.
///
/// A record is stable iff its requirement-approval date survived the date
/// decoder (so it is not a 1900 placeholder) and falls in year 2000 or
/// later. Tables without any requirement-approval-like column flag every
/// record not-stable; that is a documented limitation, not an error.
pub fn stable_demand_flags(table: &NormalizedTable) -> Vec<bool> {
    let has_column = table
        .columns
        .iter()
        .any(|c| c.contains(REQUIREMENT_APPROVAL_TOKEN));
    if !has_column {
        return vec![false; table.len()];
    }
    table
        .records
        .iter()
        .map(|r| {
            r.milestone(Milestone::RequirementApproval)
                .map(|d| d.year() >= 2000)
                .unwrap_or(false)
        })
        .collect()
}

/// Flat rows for CSV export and table previews, in table order.
pub fn export_rows(table: &NormalizedTable, flags: &[bool]) -> Vec<ExportRow> {
    table
        .records
        .iter()
        .zip(flags)
        .map(|(r, stable)| ExportRow {
            sequence: r.sequence_number,
            park: r.park.clone(),
            city: r.city.clone(),
            region: r.region.clone(),
            tier: r.project_tier.clone(),
            discipline: r.discipline.clone(),
            project_name: r.project_name.clone(),
            planned_amount: format_number(r.planned_amount, 0),
            requirement_approval: r
                .milestone(Milestone::RequirementApproval)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            stable: (if *stable { "是" } else { "否" }).to_string(),
        })
        .collect()
}

/// Per-park rollup, sorted by total planned amount descending.
pub fn park_summary(table: &NormalizedTable, flags: &[bool]) -> Vec<ParkSummaryRow> {
    #[derive(Default)]
    struct Acc {
        city: String,
        region: String,
        projects: usize,
        total_amount: f64,
        stable: usize,
    }

    let mut map: HashMap<String, Acc> = HashMap::new();
    for (r, stable) in table.records.iter().zip(flags) {
        let acc = map.entry(r.park.clone()).or_default();
        acc.city = r.city.clone();
        acc.region = r.region.clone();
        acc.projects += 1;
        acc.total_amount += r.planned_amount;
        if *stable {
            acc.stable += 1;
        }
    }

    let mut rows: Vec<(f64, ParkSummaryRow)> = map
        .into_iter()
        .map(|(park, acc)| {
            let row = ParkSummaryRow {
                park,
                city: acc.city,
                region: acc.region,
                projects: format_int(acc.projects as i64),
                total_amount: format_number(acc.total_amount, 0),
                stable_projects: format_int(acc.stable as i64),
            };
            (acc.total_amount, row)
        })
        .collect();
    rows.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Headline numbers written to the JSON summary.
#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub total_projects: usize,
    pub total_parks: usize,
    pub total_planned_amount: f64,
    pub stable_projects: usize,
}

pub fn summarize(table: &NormalizedTable, flags: &[bool]) -> IngestSummary {
    let parks: std::collections::HashSet<&str> =
        table.records.iter().map(|r| r.park.as_str()).collect();
    IngestSummary {
        total_projects: table.len(),
        total_parks: parks.len(),
        total_planned_amount: table.records.iter().map(|r| r.planned_amount).sum(),
        stable_projects: flags.iter().filter(|f| **f).count(),
    }
}
