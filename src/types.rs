use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// One untyped cell as read from a CSV field or a workbook cell.
///
/// CSV input only ever produces `Empty` and `Text`; workbook input
/// additionally produces `Number` and `Date` (cells typed as dates by the
/// spreadsheet itself).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn from_csv_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Trimmed textual form of the cell. Whole numbers render without a
    /// decimal point so that sequence numbers read from XLSX ("1.0") match
    /// their CSV counterparts ("1").
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// An untyped 2-D grid read from one worksheet or CSV, before any header
/// resolution. The first two rows are the candidate header block.
#[derive(Debug, Clone)]
pub struct RawTableBlock {
    /// File stem or sheet name; used as a park-name hint downstream.
    pub source: String,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTableBlock {
    pub fn new(source: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { source: source.into(), rows }
    }

    /// A block needs two header rows plus at least one data row.
    pub fn has_data(&self) -> bool {
        self.rows.len() >= 3
    }

    pub fn header_rows(&self) -> (&[Cell], &[Cell]) {
        (&self.rows[0], &self.rows[1])
    }

    pub fn data_rows(&self) -> &[Vec<Cell>] {
        &self.rows[2..]
    }
}

/// Ordered, resolved column names for one block; one entry per physical
/// column once aligned to the data width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    names: Vec<String>,
}

impl ColumnMapping {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Align to the data block's column count: truncate longer mappings,
    /// right-pad shorter ones with empty-string placeholders.
    pub fn align_to(&mut self, width: usize) {
        self.names.resize(width, String::new());
    }
}

/// The fixed set of timeline milestones, in source-sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Milestone {
    RequirementApproval,
    RequirementReview,
    DesignPlan,
    CostAccounting,
    ProjectDecision,
    Procurement,
    Implementation,
    Acceptance,
    Settlement,
}

impl Milestone {
    pub const ALL: [Milestone; 9] = [
        Milestone::RequirementApproval,
        Milestone::RequirementReview,
        Milestone::DesignPlan,
        Milestone::CostAccounting,
        Milestone::ProjectDecision,
        Milestone::Procurement,
        Milestone::Implementation,
        Milestone::Acceptance,
        Milestone::Settlement,
    ];

    /// Canonical column label as written in the second header row.
    pub fn label(self) -> &'static str {
        match self {
            Milestone::RequirementApproval => "需求立项",
            Milestone::RequirementReview => "需求审核",
            Milestone::DesignPlan => "规划设计方案",
            Milestone::CostAccounting => "成本核算",
            Milestone::ProjectDecision => "项目决策",
            Milestone::Procurement => "招采",
            Milestone::Implementation => "实施",
            Milestone::Acceptance => "验收",
            Milestone::Settlement => "结算",
        }
    }
}

/// One canonical renovation-project record.
///
/// Constructed by the row sanitizer, enriched in place by the location
/// enricher, immutable afterwards as far as this engine is concerned.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub sequence_number: u32,
    pub park: String,
    pub region: String,
    pub city: String,
    pub project_tier: String,
    pub project_category: String,
    pub discipline: String,
    pub discipline_subtype: Option<String>,
    pub project_name: String,
    pub planned_amount: f64,
    pub contractor: Option<String>,
    pub headquarters_focus: Option<String>,
    /// All nine milestones are always present as keys; an unresolved or
    /// placeholder date is `None`.
    pub timeline: BTreeMap<Milestone, Option<NaiveDate>>,
    /// Values of non-canonical columns (remarks and the like), kept in
    /// source column order so the merger can rename duplicates per row.
    pub extras: Vec<(String, String)>,
}

impl ProjectRecord {
    pub fn milestone(&self, m: Milestone) -> Option<NaiveDate> {
        self.timeline.get(&m).copied().flatten()
    }

    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An ordered sequence of records plus the realized column list they were
/// normalized under. Exclusively owned; handed to the caller by value.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub records: Vec<ProjectRecord>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Flat export/preview row for the normalized table.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ExportRow {
    #[serde(rename = "序号")]
    #[tabled(rename = "序号")]
    pub sequence: u32,
    #[serde(rename = "园区")]
    #[tabled(rename = "园区")]
    pub park: String,
    #[serde(rename = "城市")]
    #[tabled(rename = "城市")]
    pub city: String,
    #[serde(rename = "所属区域")]
    #[tabled(rename = "所属区域")]
    pub region: String,
    #[serde(rename = "项目分级")]
    #[tabled(rename = "项目分级")]
    pub tier: String,
    #[serde(rename = "专业")]
    #[tabled(rename = "专业")]
    pub discipline: String,
    #[serde(rename = "项目名称")]
    #[tabled(rename = "项目名称")]
    pub project_name: String,
    #[serde(rename = "拟定金额")]
    #[tabled(rename = "拟定金额")]
    pub planned_amount: String,
    #[serde(rename = "需求立项")]
    #[tabled(rename = "需求立项")]
    pub requirement_approval: String,
    #[serde(rename = "稳定需求")]
    #[tabled(rename = "稳定需求")]
    pub stable: String,
}

/// Per-park rollup row for the console preview and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ParkSummaryRow {
    #[serde(rename = "园区")]
    #[tabled(rename = "园区")]
    pub park: String,
    #[serde(rename = "城市")]
    #[tabled(rename = "城市")]
    pub city: String,
    #[serde(rename = "所属区域")]
    #[tabled(rename = "所属区域")]
    pub region: String,
    #[serde(rename = "项目数")]
    #[tabled(rename = "项目数")]
    pub projects: String,
    #[serde(rename = "拟定金额合计")]
    #[tabled(rename = "拟定金额合计")]
    pub total_amount: String,
    #[serde(rename = "稳定需求数")]
    #[tabled(rename = "稳定需求数")]
    pub stable_projects: String,
}
