//! WHO growth-standard reference tables.
//!
//! Reference data is read-only. A table is a set of *series*, one per `(indicator, sex)` pair,
//! each holding percentile rows sorted by age in months.
//!
//! The on-disk format is YAML:
//!
//! ```yaml
//! series:
//!   - indicator: weight
//!     sex: male
//!     rows:
//!       - { age_months: 0, p3: 2.5, p15: 2.9, p50: 3.3, p85: 3.9, p97: 4.3 }
//! ```
//!
//! Parsing is strict (`deny_unknown_fields`) and reports the YAML path of the first failing
//! field, so a typo in an override file is caught at startup rather than producing silent
//! fallback ranges at request time.

use crate::percentile::{Indicator, PercentileRow};
use crate::{GrowthError, GrowthResult};
use clinic_types::Sex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// WHO 2006 child growth standards (0–60 months) bundled with the crate.
const BUNDLED_WHO_TABLE: &str = include_str!("../data/who_reference.yaml");

/// An immutable WHO reference table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceTable {
    series: BTreeMap<(Indicator, Sex), Vec<PercentileRow>>,
}

impl ReferenceTable {
    /// The table compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`GrowthError::Reference`] only if the bundled data is malformed.
    pub fn bundled() -> GrowthResult<Self> {
        Self::parse(BUNDLED_WHO_TABLE)
    }

    /// Loads a table from a YAML file.
    pub fn load(path: &Path) -> GrowthResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses a table from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`GrowthError::Reference`] if:
    /// - the YAML does not match the table schema (the message names the failing path),
    /// - an `(indicator, sex)` series appears more than once,
    /// - a series contains duplicate ages,
    /// - a row is not finite, positive and ordered p3 <= p15 <= p50 <= p85 <= p97.
    pub fn parse(yaml_text: &str) -> GrowthResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, ReferenceTableWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(GrowthError::Reference(format!(
                    "reference table schema mismatch at {path}: {source}"
                )));
            }
        };

        wire_to_domain(wire)
    }

    /// Rows for one indicator and sex, sorted by age. Empty when the series is missing.
    pub fn rows(&self, indicator: Indicator, sex: Sex) -> &[PercentileRow] {
        self.series
            .get(&(indicator, sex))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The row whose age is closest to `age_months`.
    ///
    /// Ties resolve to the younger row. Returns `None` when the table has no series for
    /// `indicator`/`sex`, or when `age_months` lies outside the ages the series covers.
    pub fn lookup(&self, indicator: Indicator, sex: Sex, age_months: u32) -> Option<&PercentileRow> {
        let rows = self.rows(indicator, sex);
        match rows.binary_search_by_key(&age_months, |r| r.age_months) {
            Ok(idx) => rows.get(idx),
            Err(0) => None,
            Err(idx) if idx >= rows.len() => None,
            Err(idx) => {
                let younger = &rows[idx - 1];
                let older = &rows[idx];
                if older.age_months - age_months < age_months - younger.age_months {
                    Some(older)
                } else {
                    Some(younger)
                }
            }
        }
    }

    /// The `(indicator, sex)` pairs that have reference data.
    pub fn series_keys(&self) -> impl Iterator<Item = (Indicator, Sex)> + '_ {
        self.series.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ReferenceTableWire {
    series: Vec<SeriesWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SeriesWire {
    indicator: Indicator,
    sex: Sex,
    rows: Vec<PercentileRow>,
}

fn wire_to_domain(wire: ReferenceTableWire) -> GrowthResult<ReferenceTable> {
    let mut series = BTreeMap::new();

    for s in wire.series {
        let key = (s.indicator, s.sex);
        if series.contains_key(&key) {
            return Err(GrowthError::Reference(format!(
                "duplicate series for {} / {}",
                s.indicator, s.sex
            )));
        }

        let mut rows = s.rows;
        rows.sort_by_key(|r| r.age_months);
        if rows.windows(2).any(|w| w[0].age_months == w[1].age_months) {
            return Err(GrowthError::Reference(format!(
                "duplicate age in series {} / {}",
                s.indicator, s.sex
            )));
        }
        for row in &rows {
            row.validate().map_err(|msg| {
                GrowthError::Reference(format!("series {} / {}: {msg}", s.indicator, s.sex))
            })?;
        }

        series.insert(key, rows);
    }

    Ok(ReferenceTable { series })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL: &str = r#"series:
  - indicator: weight
    sex: female
    rows:
      - { age_months: 12, p3: 7.1, p15: 7.9, p50: 8.9, p85: 10.1, p97: 10.8 }
      - { age_months: 0, p3: 2.4, p15: 2.8, p50: 3.2, p85: 3.7, p97: 4.2 }
      - { age_months: 6, p3: 5.8, p15: 6.4, p50: 7.3, p85: 8.2, p97: 8.8 }
"#;

    #[test]
    fn bundled_table_covers_every_indicator_and_sex() {
        let table = ReferenceTable::bundled().expect("bundled table should parse");
        for indicator in Indicator::ALL {
            for sex in [Sex::Male, Sex::Female] {
                let rows = table.rows(indicator, sex);
                assert!(!rows.is_empty(), "missing {indicator} / {sex}");
                assert_eq!(rows[0].age_months, 0);
                assert!(rows.windows(2).all(|w| w[0].age_months < w[1].age_months));
            }
        }
    }

    #[test]
    fn rows_are_sorted_on_load() {
        let table = ReferenceTable::parse(SMALL).expect("parse");
        let ages: Vec<u32> = table
            .rows(Indicator::Weight, Sex::Female)
            .iter()
            .map(|r| r.age_months)
            .collect();
        assert_eq!(ages, vec![0, 6, 12]);
    }

    #[test]
    fn lookup_picks_closest_age_with_ties_to_younger() {
        let table = ReferenceTable::parse(SMALL).expect("parse");
        let age_of = |age| {
            table
                .lookup(Indicator::Weight, Sex::Female, age)
                .map(|r| r.age_months)
        };
        assert_eq!(age_of(0), Some(0));
        assert_eq!(age_of(2), Some(0));
        assert_eq!(age_of(3), Some(0));
        assert_eq!(age_of(4), Some(6));
        assert_eq!(age_of(9), Some(6));
        assert_eq!(age_of(10), Some(12));
        assert_eq!(age_of(12), Some(12));
    }

    #[test]
    fn lookup_outside_covered_ages_is_none() {
        let small = ReferenceTable::parse(SMALL).expect("parse");
        assert!(small.lookup(Indicator::Weight, Sex::Female, 13).is_none());
        assert!(small.lookup(Indicator::Weight, Sex::Female, 200).is_none());

        let older_only = SMALL.replace("age_months: 0,", "age_months: 2,");
        let table = ReferenceTable::parse(&older_only).expect("parse");
        assert!(table.lookup(Indicator::Weight, Sex::Female, 1).is_none());
        assert_eq!(
            table.lookup(Indicator::Weight, Sex::Female, 2).map(|r| r.age_months),
            Some(2)
        );

        let bundled = ReferenceTable::bundled().expect("bundled");
        assert_eq!(
            bundled.lookup(Indicator::Bmi, Sex::Male, 60).map(|r| r.age_months),
            Some(60)
        );
        assert!(bundled.lookup(Indicator::Bmi, Sex::Male, 61).is_none());
        assert!(bundled.lookup(Indicator::Bmi, Sex::Male, 180).is_none());
    }

    #[test]
    fn lookup_missing_series_is_none() {
        let table = ReferenceTable::parse(SMALL).expect("parse");
        assert!(table.lookup(Indicator::Weight, Sex::Male, 6).is_none());
        assert!(table.lookup(Indicator::Bmi, Sex::Female, 6).is_none());
        assert!(table.rows(Indicator::Height, Sex::Female).is_empty());
    }

    #[test]
    fn unknown_keys_report_their_path() {
        let input = SMALL.replace("sex: female", "sex: female\n    source: who");
        let err = ReferenceTable::parse(&input).expect_err("unknown key must fail");
        match err {
            GrowthError::Reference(msg) => {
                assert!(msg.contains("series"), "message was: {msg}");
                assert!(msg.contains("source"), "message was: {msg}");
            }
            other => panic!("expected Reference error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_series_and_ages() {
        let doubled = format!("{SMALL}{}", SMALL.trim_start_matches("series:\n"));
        assert!(matches!(
            ReferenceTable::parse(&doubled),
            Err(GrowthError::Reference(msg)) if msg.contains("duplicate series")
        ));

        let dup_age = SMALL.replace("age_months: 6", "age_months: 12");
        assert!(matches!(
            ReferenceTable::parse(&dup_age),
            Err(GrowthError::Reference(msg)) if msg.contains("duplicate age")
        ));
    }

    #[test]
    fn rejects_unordered_rows() {
        let bad = SMALL.replace("p50: 8.9", "p50: 11.9");
        assert!(matches!(
            ReferenceTable::parse(&bad),
            Err(GrowthError::Reference(msg)) if msg.contains("not ordered")
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SMALL.as_bytes()).expect("write");
        let table = ReferenceTable::load(file.path()).expect("load");
        assert_eq!(table.series_keys().count(), 1);
        assert!(!table.is_empty());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ReferenceTable::load(Path::new("/definitely/not/here.yaml"))
            .expect_err("missing file");
        assert!(matches!(err, GrowthError::Io(_)));
    }
}
