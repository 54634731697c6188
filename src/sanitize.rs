// Row-level filtering and field coercion.
//
// Turns one raw data row plus its resolved column mapping into a
// `ProjectRecord`, or rejects the row. Only two things reject a row: a
// sequence-number cell that is not a non-negative integer, and a
// sequence-number cell carrying a summary-row token. Every other problem
// degrades to a default value.
use std::collections::BTreeMap;

use crate::config;
use crate::dates::decode_date;
use crate::types::{Cell, ColumnMapping, Milestone, ProjectRecord};
use crate::util::parse_f64_safe;

/// Build a `ProjectRecord` from one data row, or reject it.
pub fn sanitize_row(row: &[Cell], mapping: &ColumnMapping) -> Option<ProjectRecord> {
    let seq_index = config::SEQUENCE_COLUMNS
        .iter()
        .find_map(|c| mapping.position(c))
        .unwrap_or(0);
    let seq_cell = row.get(seq_index).unwrap_or(&Cell::Empty);
    let seq_text = seq_cell.text();
    if config::SUMMARY_ROW_PREFIXES
        .iter()
        .any(|p| seq_text.starts_with(p))
    {
        return None;
    }
    let sequence_number = parse_sequence(seq_cell)?;

    let planned_amount = mapping
        .position(config::AMOUNT_COLUMN)
        .and_then(|i| row.get(i))
        .and_then(|c| parse_f64_safe(Some(&c.text())))
        .unwrap_or(0.0);

    let mut timeline = BTreeMap::new();
    for milestone in Milestone::ALL {
        let date = milestone_position(mapping, milestone)
            .and_then(|i| row.get(i))
            .and_then(decode_date);
        timeline.insert(milestone, date);
    }

    let record = ProjectRecord {
        sequence_number,
        park: first_text(row, mapping, &config::PARK_COLUMNS).unwrap_or_default(),
        region: first_text(row, mapping, &[config::REGION_COLUMN]).unwrap_or_default(),
        city: first_text(row, mapping, &[config::CITY_COLUMN]).unwrap_or_default(),
        project_tier: first_text(row, mapping, &[config::TIER_COLUMN]).unwrap_or_default(),
        project_category: first_text(row, mapping, &[config::CATEGORY_COLUMN]).unwrap_or_default(),
        discipline: first_text(row, mapping, &[config::DISCIPLINE_COLUMN]).unwrap_or_default(),
        discipline_subtype: first_text(row, mapping, &config::SUBTYPE_COLUMNS),
        project_name: first_text(row, mapping, &[config::PROJECT_NAME_COLUMN]).unwrap_or_default(),
        planned_amount,
        contractor: first_text(row, mapping, &config::CONTRACTOR_COLUMNS),
        headquarters_focus: first_text(row, mapping, &[config::HQ_FOCUS_COLUMN]),
        timeline,
        extras: collect_extras(row, mapping),
    };
    Some(record)
}

/// Locate a milestone's column: exact label match first, then containment,
/// so suffix variants like 需求立项日期 still feed the timeline.
fn milestone_position(mapping: &ColumnMapping, milestone: Milestone) -> Option<usize> {
    mapping.position(milestone.label()).or_else(|| {
        mapping
            .names()
            .iter()
            .position(|n| n.contains(milestone.label()))
    })
}

/// Sequence cells must be all-digit text or a non-negative whole number.
fn parse_sequence(cell: &Cell) -> Option<u32> {
    match cell {
        Cell::Number(n) => {
            (*n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX)).then(|| *n as u32)
        }
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return None;
            }
            if t.chars().all(|c| c.is_ascii_digit()) {
                return t.parse::<u32>().ok();
            }
            let n = parse_f64_safe(Some(t))?;
            (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then(|| n as u32)
        }
        _ => None,
    }
}

/// First non-blank value among the named columns, trimmed.
fn first_text(row: &[Cell], mapping: &ColumnMapping, columns: &[&str]) -> Option<String> {
    for name in columns {
        if let Some(i) = mapping.position(name) {
            if let Some(cell) = row.get(i) {
                let text = cell.text();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Values of non-canonical, named columns, in source column order.
/// Duplicate names are kept as-is here; the merger deduplicates them.
fn collect_extras(row: &[Cell], mapping: &ColumnMapping) -> Vec<(String, String)> {
    mapping
        .names()
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && !config::is_canonical_column(name))
        .map(|(i, name)| {
            let value = row.get(i).map(Cell::text).unwrap_or_default();
            (name.clone(), value)
        })
        .collect()
}
