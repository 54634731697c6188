// Organization-specific naming conventions used by the ingestion engine.
//
// Every list here is configuration data tied to how the source sheets are
// actually filled in, not an algorithmic constant. Callers that ingest data
// from a different organization are expected to swap these out (the park
// directory is injected; the token lists are compiled defaults).
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::Milestone;

/// Column names that identify the sequence-number column, in preference order.
pub const SEQUENCE_COLUMNS: [&str; 2] = ["序号", "编号"];

/// Key columns used by the sheet classifier: a block is a progress sheet iff
/// it has a sequence column and at least one of these.
pub const KEY_COLUMNS: [&str; 4] = ["项目分级", "专业", "拟定金额", "项目名称"];

/// Sequence-cell prefixes that mark subtotal/summary rows, never data rows.
pub const SUMMARY_ROW_PREFIXES: [&str; 4] = ["合计行", "合计", "差额", "小计"];

/// String tokens treated as "no date" before any parsing is attempted.
pub const ABSENT_TOKENS: [&str; 4] = ["", "nan", "None", "NaT"];

/// Sentinel park name for records whose park cannot be resolved at all.
pub const UNKNOWN_PARK: &str = "未知园区";

/// Sentinel for city/region when the park is not in the directory.
pub const OTHER_LOCATION: &str = "其他";

/// Known park names, scanned as substrings of file names, sheet names and
/// project titles when the park column itself is blank.
pub const PARK_TOKENS: [&str; 24] = [
    "燕园", "蜀园", "吴园", "粤园", "申园", "楚园", "鹭园", "大清谷",
    "湘园", "沈园", "桂园", "琴园", "赣园", "苏园", "甬园", "豫园",
    "渝园", "徽园", "鹏园", "瓯园", "福园", "儒园", "津园", "滇园",
];

/// Column name for the park field and its synonym used by some sites.
pub const PARK_COLUMNS: [&str; 2] = ["园区", "社区"];
pub const CITY_COLUMN: &str = "城市";
pub const REGION_COLUMN: &str = "所属区域";
pub const TIER_COLUMN: &str = "项目分级";
pub const CATEGORY_COLUMN: &str = "项目分类";
pub const DISCIPLINE_COLUMN: &str = "专业";
pub const SUBTYPE_COLUMNS: [&str; 2] = ["专业细分", "专业分包"];
pub const PROJECT_NAME_COLUMN: &str = "项目名称";
pub const AMOUNT_COLUMN: &str = "拟定金额";
pub const CONTRACTOR_COLUMNS: [&str; 2] = ["拟定承建组织", "拟定承建组"];
pub const HQ_FOCUS_COLUMN: &str = "总部重点关注项目";

/// Whether a resolved column name belongs to the fixed canonical schema.
///
/// Canonical columns merge by name across sources; anything else is an
/// "extra" column and gets deduplicated with numeric suffixes on merge.
pub fn is_canonical_column(name: &str) -> bool {
    let name = name.trim();
    SEQUENCE_COLUMNS.contains(&name)
        || PARK_COLUMNS.contains(&name)
        || SUBTYPE_COLUMNS.contains(&name)
        || CONTRACTOR_COLUMNS.contains(&name)
        || [
            CITY_COLUMN,
            REGION_COLUMN,
            TIER_COLUMN,
            CATEGORY_COLUMN,
            DISCIPLINE_COLUMN,
            PROJECT_NAME_COLUMN,
            AMOUNT_COLUMN,
            HQ_FOCUS_COLUMN,
        ]
        .contains(&name)
        || Milestone::ALL.iter().any(|m| m.label() == name)
}

/// Read-only park → city / park → region lookup, injected into the
/// location enricher so tests can substitute synthetic directories.
#[derive(Debug, Clone, Default)]
pub struct ParkDirectory {
    city: HashMap<String, String>,
    region: HashMap<String, String>,
}

impl ParkDirectory {
    /// Build a directory from `(park, city, region)` entries.
    pub fn from_entries(entries: &[(&str, &str, &str)]) -> Self {
        let mut dir = Self::default();
        for (park, city, region) in entries {
            dir.city.insert((*park).to_string(), (*city).to_string());
            dir.region.insert((*park).to_string(), (*region).to_string());
        }
        dir
    }

    pub fn city_of(&self, park: &str) -> Option<&str> {
        self.city.get(park).map(String::as_str)
    }

    pub fn region_of(&self, park: &str) -> Option<&str> {
        self.region.get(park).map(String::as_str)
    }
}

/// Default directory covering the 24 known parks.
pub static DEFAULT_PARKS: Lazy<ParkDirectory> = Lazy::new(|| {
    ParkDirectory::from_entries(&[
        ("燕园", "北京", "北部区域"),
        ("津园", "天津", "北部区域"),
        ("沈园", "沈阳", "北部区域"),
        ("儒园", "济南", "北部区域"),
        ("豫园", "郑州", "北部区域"),
        ("申园", "上海", "东部区域"),
        ("吴园", "苏州", "东部区域"),
        ("苏园", "南京", "东部区域"),
        ("甬园", "宁波", "东部区域"),
        ("大清谷", "杭州", "东部区域"),
        ("瓯园", "温州", "东部区域"),
        ("徽园", "合肥", "东部区域"),
        ("粤园", "广州", "南部区域"),
        ("鹏园", "深圳", "南部区域"),
        ("桂园", "南宁", "南部区域"),
        ("琴园", "珠海", "南部区域"),
        ("福园", "福州", "南部区域"),
        ("鹭园", "厦门", "南部区域"),
        ("蜀园", "成都", "西部区域"),
        ("渝园", "重庆", "西部区域"),
        ("滇园", "昆明", "西部区域"),
        ("楚园", "武汉", "中部区域"),
        ("湘园", "长沙", "中部区域"),
        ("赣园", "南昌", "中部区域"),
    ])
});
