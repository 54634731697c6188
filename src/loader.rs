// Ingestion orchestration: encoding detection, CSV/XLSX reading, the
// per-block normalization pipeline, and the load diagnostics callers use
// to observe dropped rows and skipped sheets.
//
// Only unreadable bytes, broken CSV framing and unopenable workbooks are
// fatal, and only for the one file being loaded. Unrecognized sheets and
// rejected rows are absorbed as omission.
use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use encoding_rs::GBK;

use crate::error::IngestError;
use crate::header::{is_progress_sheet, resolve_header};
use crate::location::LocationEnricher;
use crate::merge::merge_tables;
use crate::sanitize::sanitize_row;
use crate::types::{Cell, NormalizedTable, RawTableBlock};

/// Diagnostics for one ingestion call. `total_rows - kept_rows` is the
/// number of rejected data rows.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub skipped_sheets: usize,
}

impl LoadReport {
    pub fn rejected_rows(&self) -> usize {
        self.total_rows.saturating_sub(self.kept_rows)
    }

    pub fn absorb(&mut self, other: &LoadReport) {
        self.total_rows += other.total_rows;
        self.kept_rows += other.kept_rows;
        self.skipped_sheets += other.skipped_sheets;
    }
}

/// Load one file, dispatching on its extension.
///
/// `park_hint` names the park for records whose park cell is blank and is
/// taken verbatim; when absent, the file stem (or sheet name) is scanned
/// for park tokens instead.
pub fn load_path(
    path: &Path,
    park_hint: Option<&str>,
    enricher: &LocationEnricher,
) -> Result<(NormalizedTable, LoadReport), IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => {
            let bytes = fs::read(path)?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            load_csv_bytes(&bytes, stem, park_hint, enricher)
        }
        "xlsx" | "xls" => load_workbook(path, park_hint, enricher),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

/// Ingest CSV content from an in-memory byte source.
///
/// The text encoding is detected by sequential trial: UTF-8 (with or
/// without a byte-order mark), then GBK, which also covers GB2312. Bytes
/// that decode under neither are an `EncodingError`.
pub fn load_csv_bytes(
    bytes: &[u8],
    source_name: &str,
    park_hint: Option<&str>,
    enricher: &LocationEnricher,
) -> Result<(NormalizedTable, LoadReport), IngestError> {
    let text = decode_text(bytes)?;
    let block = block_from_csv(&text, source_name)?;
    let mut report = LoadReport::default();
    let table = normalize_block(&block, park_hint, enricher, false, &mut report)
        .unwrap_or_default();
    Ok((table, report))
}

/// Load an XLSX/XLS workbook: every sheet that classifies as a progress
/// sheet contributes, others are skipped. A workbook where nothing
/// classifies falls back to reading the first sheet as a single
/// two-row-header table.
pub fn load_workbook(
    path: &Path,
    park_hint: Option<&str>,
    enricher: &LocationEnricher,
) -> Result<(NormalizedTable, LoadReport), IngestError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::Excel(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut report = LoadReport::default();
    let mut tables: Vec<NormalizedTable> = Vec::new();
    for sheet in &sheet_names {
        let range = match workbook.worksheet_range(sheet) {
            Ok(r) => r,
            Err(_) => {
                report.skipped_sheets += 1;
                continue;
            }
        };
        let block = block_from_range(&range, sheet);
        if let Some(table) = normalize_block(&block, park_hint, enricher, true, &mut report) {
            tables.push(table);
        }
    }

    if tables.is_empty() {
        if let Some(first) = sheet_names.first() {
            if let Ok(range) = workbook.worksheet_range(first) {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default();
                let block = block_from_range(&range, stem);
                let skipped = report.skipped_sheets;
                report = LoadReport { skipped_sheets: skipped, ..Default::default() };
                if let Some(table) =
                    normalize_block(&block, park_hint, enricher, false, &mut report)
                {
                    tables.push(table);
                }
            }
        }
    }

    Ok((merge_tables(tables), report))
}

/// Load every CSV in a directory and merge them into one multi-park table.
/// Files that fail to load are skipped, matching the per-sheet policy.
pub fn load_directory(
    dir: &Path,
    enricher: &LocationEnricher,
) -> Result<(NormalizedTable, LoadReport), IngestError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut report = LoadReport::default();
    let mut tables = Vec::new();
    for path in paths {
        match load_path(&path, None, enricher) {
            Ok((table, file_report)) => {
                report.absorb(&file_report);
                if !table.is_empty() {
                    tables.push(table);
                }
            }
            Err(e) => {
                eprintln!("Skipping {}: {}", path.display(), e);
            }
        }
    }
    Ok((merge_tables(tables), report))
}

/// Run one raw block through the full pipeline: header resolution,
/// classification, row sanitization and location enrichment.
///
/// With `require_classified`, blocks failing the sheet classifier are
/// skipped and counted; without it (single-file CSV, workbook fallback)
/// the block is normalized unconditionally. Returns `None` for blocks
/// that contribute nothing.
pub fn normalize_block(
    block: &RawTableBlock,
    park_hint: Option<&str>,
    enricher: &LocationEnricher,
    require_classified: bool,
    report: &mut LoadReport,
) -> Option<NormalizedTable> {
    if !block.has_data() {
        if require_classified {
            report.skipped_sheets += 1;
        }
        return None;
    }
    let (row0, row1) = block.header_rows();
    let mut mapping = resolve_header(row0, row1);
    if require_classified && !is_progress_sheet(&mapping) {
        report.skipped_sheets += 1;
        return None;
    }

    let width = block
        .data_rows()
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(mapping.len());
    mapping.align_to(width);

    let mut records = Vec::new();
    for row in block.data_rows() {
        report.total_rows += 1;
        if let Some(mut record) = sanitize_row(row, &mapping) {
            enricher.enrich(&mut record, park_hint, &block.source);
            records.push(record);
            report.kept_rows += 1;
        }
    }
    if records.is_empty() {
        return None;
    }

    let mut columns = mapping.names().to_vec();
    for derived in ["园区", "城市", "所属区域"] {
        if !columns.iter().any(|c| c == derived) {
            columns.push(derived.to_string());
        }
    }
    Some(NormalizedTable { columns, records })
}

fn decode_text(bytes: &[u8]) -> Result<String, IngestError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.trim_start_matches('\u{feff}').to_string());
    }
    let (text, _, had_errors) = GBK.decode(bytes);
    if had_errors {
        return Err(IngestError::Encoding);
    }
    Ok(text.into_owned())
}

fn block_from_csv(text: &str, source: &str) -> Result<RawTableBlock, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_csv_field).collect());
    }
    Ok(RawTableBlock::new(source, rows))
}

fn block_from_range(range: &Range<Data>, source: &str) -> RawTableBlock {
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_excel).collect())
        .collect();
    RawTableBlock::new(source, rows)
}

fn cell_from_excel(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_csv_field(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParkDirectory;

    fn enricher() -> LocationEnricher {
        LocationEnricher::new(ParkDirectory::from_entries(&[
            ("燕园", "北京", "北部区域"),
            ("蜀园", "成都", "西部区域"),
        ]))
    }

    const TWO_ROW_CSV: &str = "\
序号,园区,项目分级,项目分类,专业,专业细分,项目名称,拟定金额,拟定承建组\n\
,,,,,,,,需求立项,需求审核,规划设计方案,成本核算,项目决策,招采,实施,验收,结算\n\
1,燕园,A级,修缮,暖通,锅炉,锅炉房改造,1200,一组,2024-03-15,2024-03-20,,,,,,,\n\
2,燕园,B级,更新,电气,照明,走廊照明,800,二组,45000,,,,,,,,\n\
合计,,,,,,,2000,,,,,,,,,,\n";

    #[test]
    fn csv_bytes_ingest_end_to_end() {
        let (table, report) =
            load_csv_bytes(TWO_ROW_CSV.as_bytes(), "燕园进度表", None, &enricher()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.rejected_rows(), 1);
        assert_eq!(table.records[0].city, "北京");
        assert_eq!(table.records[0].planned_amount, 1200.0);
        assert!(table.columns.iter().any(|c| c == "需求立项"));
    }

    #[test]
    fn utf8_bom_is_tolerated() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(TWO_ROW_CSV.as_bytes());
        let (table, _) = load_csv_bytes(&bytes, "燕园进度表", None, &enricher()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].sequence_number, 1);
    }

    #[test]
    fn gbk_bytes_are_decoded() {
        let (gbk_bytes, _, _) = GBK.encode(TWO_ROW_CSV);
        let (table, _) = load_csv_bytes(&gbk_bytes, "蜀园进度表", None, &enricher()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].park, "燕园");
    }

    #[test]
    fn undecodable_bytes_are_an_encoding_error() {
        // 0xFF is an invalid lead byte in both UTF-8 and GBK.
        let bytes = [0xFFu8, 0xFF, 0xFF, 0x80];
        let err = load_csv_bytes(&bytes, "bad", None, &enricher()).unwrap_err();
        assert!(matches!(err, IngestError::Encoding));
    }

    #[test]
    fn explicit_park_column_beats_the_hint() {
        let (table, _) =
            load_csv_bytes(TWO_ROW_CSV.as_bytes(), "workbook2", Some("蜀园"), &enricher())
                .unwrap();
        // The explicit park column still wins over the hint.
        assert_eq!(table.records[0].park, "燕园");
    }

    #[test]
    fn non_token_park_hint_is_assigned_verbatim() {
        // No park column at all; the caller-supplied name is not one of
        // the known tokens and must still be assigned, not degraded to
        // the unknown-park sentinel.
        let csv = "\
序号,项目分级,项目分类,专业,专业细分,项目名称,拟定金额\n\
,,,,,,,,需求立项,需求审核,规划设计方案,成本核算,项目决策,招采,实施,验收,结算\n\
1,A级,修缮,暖通,锅炉,锅炉房改造,1200,2024-03-15,,,,,,,,\n";
        let (table, _) =
            load_csv_bytes(csv.as_bytes(), "workbook2", Some("颐养苑"), &enricher()).unwrap();
        assert_eq!(table.records[0].park, "颐养苑");
        assert_eq!(table.records[0].city, "其他");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_path(Path::new("data.txt"), None, &enricher()).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
    }

    #[test]
    fn blocks_without_data_rows_contribute_nothing() {
        let block = RawTableBlock::new(
            "空表",
            vec![vec![Cell::from_csv_field("标题")], vec![Cell::Empty]],
        );
        let mut report = LoadReport::default();
        assert!(normalize_block(&block, None, &enricher(), true, &mut report).is_none());
        assert_eq!(report.skipped_sheets, 1);
    }
}
