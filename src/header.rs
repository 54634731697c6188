// Two-row header resolution and progress-sheet classification.
//
// Source files put business-info names on physical row 1 and the nine
// timeline milestone names on physical row 2; the two partial lists are
// concatenated into one logical header. Column counts and the timeline
// start offset vary between sites, so both are probed rather than assumed.
use crate::config;
use crate::types::{Cell, ColumnMapping, Milestone};

const BOM: char = '\u{feff}';

fn clean_name(cell: &Cell) -> String {
    cell.text().trim_matches(BOM).trim().to_string()
}

/// Acceptance arrives under several long-form labels
/// (e.g. 验收(社区需求完成交付), 验收(社区结算)); unify them to 验收.
fn unify_acceptance(name: String) -> String {
    if name.contains("验收") && name.contains("社区") {
        Milestone::Acceptance.label().to_string()
    } else {
        name
    }
}

/// Reconstruct the logical header from the first two physical rows.
///
/// Row 1 supplies up to 9 business-info names (all of them when fewer than
/// 8 cells exist). Row 2 supplies exactly 9 milestone names whose start
/// offset is probed: 9 when the row has >= 18 cells, 8 when it has >= 17
/// (the one-column shift depends on whether a remarks column is present),
/// otherwise `len - 9` clamped to 0. Shortfalls are padded with empty
/// strings; this function never fails.
pub fn resolve_header(row0: &[Cell], row1: &[Cell]) -> ColumnMapping {
    let line0: Vec<String> = row0.iter().map(clean_name).collect();
    let line1: Vec<String> = row1.iter().map(clean_name).collect();

    let n_first = if line0.len() >= 8 {
        line0.len().min(9)
    } else {
        line0.len()
    };
    let mut names: Vec<String> = line0[..n_first].to_vec();

    let n_time = Milestone::ALL.len();
    let start = if line1.len() >= n_time + 9 {
        9
    } else if line1.len() >= n_time + 8 {
        8
    } else {
        line1.len().saturating_sub(n_time)
    };
    let end = (start + n_time).min(line1.len());
    let mut timeline: Vec<String> = line1[start..end].to_vec();
    timeline.resize(n_time, String::new());

    names.extend(timeline);
    ColumnMapping::new(names.into_iter().map(unify_acceptance).collect())
}

/// Decide whether a resolved header belongs to an actual progress sheet.
///
/// Deliberately permissive: the test only needs to reject decorative or
/// summary worksheets living alongside real data sheets, not to validate
/// full schema conformance.
pub fn is_progress_sheet(mapping: &ColumnMapping) -> bool {
    let has_sequence = config::SEQUENCE_COLUMNS
        .iter()
        .any(|c| mapping.position(c).is_some());
    let has_key = config::KEY_COLUMNS
        .iter()
        .any(|c| mapping.position(c).is_some());
    has_sequence && has_key
}
