// Multi-source table concatenation.
//
// Appends per-sheet/per-file normalized tables into one table with a
// deterministic shape: source order and row order are preserved, the merged
// column list is the union of the inputs' columns, and column names stay
// unambiguous. Canonical schema columns union by name; non-canonical
// columns (remarks and the like) get `_2`, `_3`, ... suffixes when the same
// name appears again anywhere in the merge, and empty names get positional
// `unnamed_<index>` placeholders.
use std::collections::HashMap;

use crate::config;
use crate::types::{NormalizedTable, ProjectRecord};

pub fn merge_tables(tables: Vec<NormalizedTable>) -> NormalizedTable {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<String> = Vec::new();
    let mut records: Vec<ProjectRecord> = Vec::new();

    for table in tables {
        let mut renames: Vec<(String, String)> = Vec::new();
        for (index, name) in table.columns.iter().enumerate() {
            let trimmed = name.trim();
            let resolved = if trimmed.is_empty() {
                unique_name(&mut seen, format!("unnamed_{index}"))
            } else if config::is_canonical_column(trimmed) {
                trimmed.to_string()
            } else {
                let resolved = unique_name(&mut seen, trimmed.to_string());
                renames.push((trimmed.to_string(), resolved.clone()));
                resolved
            };
            if !columns.contains(&resolved) {
                columns.push(resolved);
            }
        }
        for mut record in table.records {
            rename_extras(&mut record, &renames);
            records.push(record);
        }
    }

    NormalizedTable { columns, records }
}

/// First occurrence of a name keeps it; later occurrences get `_2`, `_3`...
/// The counter spans the whole merge, so a remarks column arriving from a
/// second source does not silently alias the first one.
fn unique_name(seen: &mut HashMap<String, usize>, base: String) -> String {
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}_{count}")
    }
}

/// Apply per-occurrence renames to a record's extras. Extras are stored in
/// source column order, so the k-th extra with a given original name
/// corresponds to the k-th rename recorded for that name.
fn rename_extras(record: &mut ProjectRecord, renames: &[(String, String)]) {
    let mut cursor: HashMap<String, usize> = HashMap::new();
    for (name, _) in record.extras.iter_mut() {
        let k = cursor.entry(name.clone()).or_insert(0);
        let nth = renames.iter().filter(|(old, _)| old == name).nth(*k);
        *k += 1;
        if let Some((_, new)) = nth {
            *name = new.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::types::Milestone;

    fn record(seq: u32, extras: Vec<(&str, &str)>) -> ProjectRecord {
        let mut timeline = BTreeMap::new();
        for m in Milestone::ALL {
            timeline.insert(m, None);
        }
        ProjectRecord {
            sequence_number: seq,
            park: String::new(),
            region: String::new(),
            city: String::new(),
            project_tier: String::new(),
            project_category: String::new(),
            discipline: String::new(),
            discipline_subtype: None,
            project_name: String::new(),
            planned_amount: 0.0,
            contractor: None,
            headquarters_focus: None,
            timeline,
            extras: extras
                .into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn table(columns: &[&str], records: Vec<ProjectRecord>) -> NormalizedTable {
        NormalizedTable {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            records,
        }
    }

    #[test]
    fn duplicate_remarks_columns_get_suffixes_across_sources() {
        let a = table(&["序号", "备注"], vec![record(1, vec![("备注", "甲")])]);
        let b = table(&["序号", "备注"], vec![record(2, vec![("备注", "乙")])]);
        let merged = merge_tables(vec![a, b]);
        assert_eq!(merged.columns, vec!["序号", "备注", "备注_2"]);
        assert_eq!(merged.records[0].extra("备注"), Some("甲"));
        assert_eq!(merged.records[0].extra("备注_2"), None);
        assert_eq!(merged.records[1].extra("备注_2"), Some("乙"));
        assert_eq!(merged.records[1].extra("备注"), None);
    }

    #[test]
    fn duplicates_within_one_source_are_also_suffixed() {
        let a = table(
            &["序号", "备注", "备注"],
            vec![record(1, vec![("备注", "甲"), ("备注", "乙")])],
        );
        let merged = merge_tables(vec![a]);
        assert_eq!(merged.columns, vec!["序号", "备注", "备注_2"]);
        assert_eq!(merged.records[0].extra("备注"), Some("甲"));
        assert_eq!(merged.records[0].extra("备注_2"), Some("乙"));
    }

    #[test]
    fn canonical_columns_union_by_name() {
        let a = table(&["序号", "项目名称"], vec![record(1, vec![])]);
        let b = table(&["序号", "项目名称", "拟定金额"], vec![record(2, vec![])]);
        let merged = merge_tables(vec![a, b]);
        assert_eq!(merged.columns, vec!["序号", "项目名称", "拟定金额"]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_names_become_positional_placeholders() {
        let a = table(&["序号", ""], vec![record(1, vec![])]);
        let merged = merge_tables(vec![a]);
        assert_eq!(merged.columns, vec!["序号", "unnamed_1"]);
    }

    #[test]
    fn merge_preserves_source_and_row_order() {
        let a = table(&["序号"], vec![record(3, vec![]), record(1, vec![])]);
        let b = table(&["序号"], vec![record(2, vec![])]);
        let merged = merge_tables(vec![a, b]);
        let order: Vec<u32> = merged.records.iter().map(|r| r.sequence_number).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn merging_nothing_yields_an_empty_table() {
        let merged = merge_tables(Vec::new());
        assert!(merged.is_empty());
        assert!(merged.columns.is_empty());
    }
}
