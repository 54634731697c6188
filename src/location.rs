// Region/city enrichment via the static park directory.
//
// Resolution is a trust hierarchy: explicit source columns beat the static
// lookup, which beats token scanning of surrounding text, which beats the
// sentinels. Explicitly filled city/region cells are never overwritten.
use crate::config::{self, ParkDirectory, DEFAULT_PARKS, OTHER_LOCATION, UNKNOWN_PARK};
use crate::types::ProjectRecord;

/// Scan free text for any known park-name token.
pub fn find_park_token(text: &str) -> Option<&'static str> {
    config::PARK_TOKENS.iter().find(|t| text.contains(*t)).copied()
}

pub struct LocationEnricher {
    parks: ParkDirectory,
}

impl LocationEnricher {
    pub fn new(parks: ParkDirectory) -> Self {
        Self { parks }
    }

    /// Fill in park, city and region on one record.
    ///
    /// A blank park cell falls back, in order, to the caller-supplied
    /// `park_name` (taken verbatim, so new sites outside the known token
    /// list still work), a token scan of `source_hint` (the file stem or
    /// sheet name, where sites often encode the park), and a token scan of
    /// the project title itself.
    pub fn enrich(&self, record: &mut ProjectRecord, park_name: Option<&str>, source_hint: &str) {
        if record.park.trim().is_empty() {
            record.park = park_name
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .or_else(|| find_park_token(source_hint))
                .or_else(|| find_park_token(&record.project_name))
                .unwrap_or(UNKNOWN_PARK)
                .to_string();
        }
        if record.city.trim().is_empty() {
            record.city = self
                .parks
                .city_of(&record.park)
                .unwrap_or(OTHER_LOCATION)
                .to_string();
        }
        if record.region.trim().is_empty() {
            record.region = self
                .parks
                .region_of(&record.park)
                .unwrap_or(OTHER_LOCATION)
                .to_string();
        }
    }
}

impl Default for LocationEnricher {
    fn default() -> Self {
        Self::new(DEFAULT_PARKS.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::types::Milestone;

    fn record(park: &str, city: &str, region: &str, project_name: &str) -> ProjectRecord {
        let mut timeline = BTreeMap::new();
        for m in Milestone::ALL {
            timeline.insert(m, None);
        }
        ProjectRecord {
            sequence_number: 1,
            park: park.to_string(),
            region: region.to_string(),
            city: city.to_string(),
            project_tier: String::new(),
            project_category: String::new(),
            discipline: String::new(),
            discipline_subtype: None,
            project_name: project_name.to_string(),
            planned_amount: 0.0,
            contractor: None,
            headquarters_focus: None,
            timeline,
            extras: Vec::new(),
        }
    }

    fn synthetic() -> LocationEnricher {
        LocationEnricher::new(ParkDirectory::from_entries(&[("燕园", "北京", "北部区域")]))
    }

    #[test]
    fn explicit_source_columns_are_never_overwritten() {
        let mut rec = record("燕园", "手填城市", "手填区域", "");
        synthetic().enrich(&mut rec, None, "");
        assert_eq!(rec.city, "手填城市");
        assert_eq!(rec.region, "手填区域");
    }

    #[test]
    fn directory_lookup_fills_city_and_region() {
        let mut rec = record("燕园", "", "", "");
        synthetic().enrich(&mut rec, None, "");
        assert_eq!(rec.city, "北京");
        assert_eq!(rec.region, "北部区域");
    }

    #[test]
    fn supplied_park_name_is_taken_verbatim() {
        // A site outside the known token list must not degrade to the
        // unknown-park sentinel when the caller names it explicitly.
        let mut rec = record("", "", "", "");
        synthetic().enrich(&mut rec, Some("颐养苑"), "workbook2");
        assert_eq!(rec.park, "颐养苑");
        assert_eq!(rec.city, OTHER_LOCATION);
        assert_eq!(rec.region, OTHER_LOCATION);

        // The explicit park column still beats the supplied name.
        let mut rec = record("燕园", "", "", "");
        synthetic().enrich(&mut rec, Some("颐养苑"), "");
        assert_eq!(rec.park, "燕园");
        assert_eq!(rec.city, "北京");
    }

    #[test]
    fn blank_park_resolves_from_hint_then_project_name() {
        let mut rec = record("", "", "", "");
        synthetic().enrich(&mut rec, None, "燕园2024进度表");
        assert_eq!(rec.park, "燕园");

        let mut rec = record("", "", "", "蜀园食堂改造");
        synthetic().enrich(&mut rec, None, "上传文件");
        assert_eq!(rec.park, "蜀园");
        // Not in the synthetic directory, so location falls to the sentinel.
        assert_eq!(rec.city, OTHER_LOCATION);
        assert_eq!(rec.region, OTHER_LOCATION);
    }

    #[test]
    fn unresolvable_park_gets_the_sentinels() {
        let mut rec = record("", "", "", "无名项目");
        synthetic().enrich(&mut rec, None, "workbook2");
        assert_eq!(rec.park, UNKNOWN_PARK);
        assert_eq!(rec.city, OTHER_LOCATION);
        assert_eq!(rec.region, OTHER_LOCATION);
    }
}
