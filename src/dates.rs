// Multi-branch cell-to-date decoding.
//
// Cells carry dates in three encodings: native spreadsheet dates, Excel
// serial-day numbers, and free-form strings. Branches share one signature
// and are tried in order; the first branch that resolves a date ends the
// chain. Any resolved date in calendar year 1900 is the spreadsheet
// placeholder artifact and is downgraded to absent.
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::config::ABSENT_TOKENS;
use crate::types::Cell;
use crate::util::parse_f64_safe;

/// Plausible Excel day-serial range, anchored at the 1899-12-30 epoch.
const SERIAL_MIN: f64 = 1.0;
const SERIAL_MAX: f64 = 100_000.0;
const SENTINEL_YEAR: i32 = 1900;

type Branch = fn(&Cell) -> Option<NaiveDate>;

const BRANCHES: [Branch; 3] = [decode_native, decode_excel_serial, decode_string];

/// Decode one cell into a calendar date, or absent.
///
/// Idempotent: an absent value stays absent, and a value that resolved
/// through some branch resolves to the same date on every call.
pub fn decode_date(cell: &Cell) -> Option<NaiveDate> {
    for branch in BRANCHES {
        if let Some(date) = branch(cell) {
            return (date.year() != SENTINEL_YEAR).then_some(date);
        }
    }
    None
}

fn decode_native(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        _ => None,
    }
}

/// Numeric cells (or numeric text) in `[1, 100000]` are day offsets from
/// 1899-12-30. Fractional serials carry a time-of-day part and truncate
/// to the day. Out-of-range numbers fall through to the string branch.
fn decode_excel_serial(cell: &Cell) -> Option<NaiveDate> {
    let serial = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_f64_safe(Some(s)),
        _ => None,
    }?;
    if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y年%m月%d日",
    "%m/%d/%Y",
];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Free-form string dates. Placeholder tokens are absent before parsing,
/// and raw text with the literal prefix `1900` is excluded entirely so a
/// lenient parser cannot guess some other year out of garbled 1900 text.
fn decode_string(cell: &Cell) -> Option<NaiveDate> {
    let Cell::Text(s) = cell else { return None };
    let t = s.trim();
    if ABSENT_TOKENS.contains(&t) {
        return None;
    }
    if t.starts_with("1900") {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn native_dates_pass_through() {
        let cell = Cell::Date(ymd(2024, 3, 15));
        assert_eq!(decode_date(&cell), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn native_year_1900_is_placeholder() {
        let cell = Cell::Date(ymd(1900, 1, 6));
        assert_eq!(decode_date(&cell), None);
    }

    #[test]
    fn serial_day_one_is_last_day_of_1899() {
        assert_eq!(decode_date(&Cell::Number(1.0)), Some(ymd(1899, 12, 31)));
    }

    #[test]
    fn serial_in_1900_is_rejected_as_sentinel() {
        // Serial 2 resolves to 1900-01-01, which is the placeholder year.
        assert_eq!(decode_date(&Cell::Number(2.0)), None);
    }

    #[test]
    fn serial_45000_lands_in_2023() {
        let d = decode_date(&Cell::Number(45000.0)).unwrap();
        assert_eq!(d.year(), 2023);
    }

    #[test]
    fn numeric_text_uses_the_serial_branch() {
        let d = decode_date(&Cell::Text("45000".to_string())).unwrap();
        assert_eq!(d.year(), 2023);
    }

    #[test]
    fn serial_above_range_falls_through_to_string_branch() {
        // 100001 fails the serial window and is not a parseable date string.
        assert_eq!(decode_date(&Cell::Text("100001".to_string())), None);
        assert_eq!(decode_date(&Cell::Number(100_001.0)), None);
    }

    #[test]
    fn placeholder_tokens_are_absent() {
        for token in ["", "nan", "None", "NaT", "  "] {
            assert_eq!(decode_date(&Cell::Text(token.to_string())), None, "{token:?}");
        }
        assert_eq!(decode_date(&Cell::Empty), None);
    }

    #[test]
    fn strings_with_1900_prefix_are_excluded_before_parsing() {
        assert_eq!(decode_date(&Cell::Text("1900-01-06".to_string())), None);
        assert_eq!(decode_date(&Cell::Text("1900/1/6 垃圾".to_string())), None);
    }

    #[test]
    fn flexible_string_formats_parse() {
        assert_eq!(decode_date(&Cell::Text("2024-03-15".into())), Some(ymd(2024, 3, 15)));
        assert_eq!(decode_date(&Cell::Text("2024/3/15".into())), Some(ymd(2024, 3, 15)));
        assert_eq!(decode_date(&Cell::Text("2024.3.15".into())), Some(ymd(2024, 3, 15)));
        assert_eq!(decode_date(&Cell::Text("2024年3月15日".into())), Some(ymd(2024, 3, 15)));
        assert_eq!(
            decode_date(&Cell::Text("2024-03-15 08:30:00".into())),
            Some(ymd(2024, 3, 15))
        );
    }

    #[test]
    fn decoding_is_idempotent() {
        let cell = Cell::Text("2024-03-15".to_string());
        let first = decode_date(&cell);
        let second = decode_date(&cell);
        assert_eq!(first, second);
        assert_eq!(decode_date(&Cell::Empty), decode_date(&Cell::Empty));
    }
}
