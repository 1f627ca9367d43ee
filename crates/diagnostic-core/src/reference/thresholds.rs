//! Sector threshold records and the immutable table store.
//!
//! A table is keyed by `(metric, sector)`. Lookups fall back to the
//! `general` table when a sector has no entry of its own, and return `None`
//! for metrics with no table at all.
//!
//! Breakpoints are only required to be monotonic in the stated direction:
//! they may be negative (a negative working-capital requirement is the best
//! case, suppliers finance the cycle).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DiagnosticError;
use crate::types::{CalculatorType, Sector};
use crate::DiagnosticResult;

use super::tables::builtin_entries;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl Direction {
    /// True when `value` meets `breakpoint` (boundaries count as met).
    pub fn at_or_better(self, value: Decimal, breakpoint: Decimal) -> bool {
        match self {
            Direction::LowerIsBetter => value <= breakpoint,
            Direction::HigherIsBetter => value >= breakpoint,
        }
    }
}

/// Four ordered breakpoints for one metric in one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorThresholds {
    pub excellent: Decimal,
    pub median: Decimal,
    pub warning: Decimal,
    pub critical: Decimal,
    pub unit: String,
    pub direction: Direction,
}

impl SectorThresholds {
    /// Check the breakpoints are ordered best to worst in `direction`.
    pub fn validate(&self) -> Result<(), String> {
        let chain = [
            ("excellent", self.excellent),
            ("median", self.median),
            ("warning", self.warning),
            ("critical", self.critical),
        ];
        for pair in chain.windows(2) {
            let (better_name, better) = pair[0];
            let (worse_name, worse) = pair[1];
            if !self.direction.at_or_better(better, worse) {
                return Err(format!(
                    "'{better_name}' ({better}) must not be worse than '{worse_name}' ({worse}) for a {:?} metric",
                    self.direction
                ));
            }
        }
        if self.unit.trim().is_empty() {
            return Err("unit must not be empty".into());
        }
        Ok(())
    }

    /// True when `value` lies strictly past the critical breakpoint.
    pub fn beyond_critical(&self, value: Decimal) -> bool {
        !self.direction.at_or_better(value, self.critical)
    }
}

/// A thresholds record together with its key, as listed or loaded from file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub metric: CalculatorType,
    #[serde(default)]
    pub sector: Sector,
    #[serde(flatten)]
    pub thresholds: SectorThresholds,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Immutable reference tables. Built once, then shared by reference.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    entries: BTreeMap<(CalculatorType, Sector), SectorThresholds>,
}

impl ReferenceTables {
    /// The hand-curated tables shipped with the engine.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        for entry in builtin_entries() {
            entries.insert((entry.metric, entry.sector), entry.thresholds);
        }
        Self { entries }
    }

    /// Build a store from explicit entries, validating every record.
    pub fn from_entries(list: Vec<ThresholdEntry>) -> DiagnosticResult<Self> {
        Self::default().with_overrides(list)
    }

    /// Return a copy of this store with `list` added or replacing existing keys.
    pub fn with_overrides(mut self, list: Vec<ThresholdEntry>) -> DiagnosticResult<Self> {
        for entry in list {
            validate_entry(&entry)?;
            self.entries
                .insert((entry.metric, entry.sector), entry.thresholds);
        }
        Ok(self)
    }

    /// Parse a JSON array of entries.
    pub fn entries_from_json(contents: &str) -> DiagnosticResult<Vec<ThresholdEntry>> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Parse a YAML sequence of entries.
    pub fn entries_from_yaml(contents: &str) -> DiagnosticResult<Vec<ThresholdEntry>> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Thresholds for `metric` in `sector`, falling back to `general`.
    pub fn lookup(&self, metric: &CalculatorType, sector: &Sector) -> Option<&SectorThresholds> {
        self.entries
            .get(&(metric.clone(), sector.clone()))
            .or_else(|| self.entries.get(&(metric.clone(), Sector::General)))
    }

    /// True when `sector` has its own table for `metric` (no fallback).
    pub fn has_specific(&self, metric: &CalculatorType, sector: &Sector) -> bool {
        self.entries.contains_key(&(metric.clone(), sector.clone()))
    }

    /// All entries, ordered by metric then sector.
    pub fn entries(&self) -> Vec<ThresholdEntry> {
        self.entries
            .iter()
            .map(|((metric, sector), thresholds)| ThresholdEntry {
                metric: metric.clone(),
                sector: sector.clone(),
                thresholds: thresholds.clone(),
            })
            .collect()
    }

    /// Entries that would apply to `sector`, one per metric, with the
    /// fallback resolved. `metric` narrows the list to one calculator.
    pub fn resolved(&self, sector: &Sector, metric: Option<&CalculatorType>) -> Vec<ThresholdEntry> {
        CalculatorType::KNOWN
            .iter()
            .filter(|m| metric.map_or(true, |wanted| wanted == *m))
            .filter_map(|m| {
                let thresholds = self.lookup(m, sector)?.clone();
                let table_sector = if self.has_specific(m, sector) {
                    sector.clone()
                } else {
                    Sector::General
                };
                Some(ThresholdEntry {
                    metric: m.clone(),
                    sector: table_sector,
                    thresholds,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry(entry: &ThresholdEntry) -> DiagnosticResult<()> {
    if !entry.metric.is_known() {
        return Err(DiagnosticError::InvalidThresholds {
            metric: entry.metric.to_string(),
            sector: entry.sector.to_string(),
            reason: "unknown calculator type".into(),
        });
    }
    entry
        .thresholds
        .validate()
        .map_err(|reason| DiagnosticError::InvalidThresholds {
            metric: entry.metric.to_string(),
            sector: entry.sector.to_string(),
            reason,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dso_general() -> SectorThresholds {
        SectorThresholds {
            excellent: dec!(30),
            median: dec!(45),
            warning: dec!(60),
            critical: dec!(90),
            unit: "days".into(),
            direction: Direction::LowerIsBetter,
        }
    }

    #[test]
    fn test_builtin_general_dso() {
        let tables = ReferenceTables::builtin();
        let t = tables.lookup(&CalculatorType::Dso, &Sector::General).unwrap();
        assert_eq!(t, &dso_general());
    }

    #[test]
    fn test_builtin_tables_are_all_valid() {
        let tables = ReferenceTables::builtin();
        assert!(!tables.is_empty());
        for entry in tables.entries() {
            assert!(
                entry.thresholds.validate().is_ok(),
                "{}/{} invalid",
                entry.metric,
                entry.sector
            );
        }
    }

    #[test]
    fn test_lookup_falls_back_to_general() {
        let tables = ReferenceTables::builtin();
        let sector = Sector::Other("biotech".into());
        let t = tables.lookup(&CalculatorType::Dso, &sector).unwrap();
        assert_eq!(t.median, dec!(45));
        assert!(!tables.has_specific(&CalculatorType::Dso, &sector));
    }

    #[test]
    fn test_lookup_unknown_metric_is_none() {
        let tables = ReferenceTables::builtin();
        assert!(tables
            .lookup(&CalculatorType::Other("churn".into()), &Sector::General)
            .is_none());
        assert!(tables
            .lookup(&CalculatorType::Valuation, &Sector::Saas)
            .is_none());
    }

    #[test]
    fn test_negative_excellent_is_valid() {
        let t = SectorThresholds {
            excellent: dec!(-10),
            median: dec!(30),
            warning: dec!(60),
            critical: dec!(90),
            unit: "days".into(),
            direction: Direction::LowerIsBetter,
        };
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let mut t = dso_general();
        t.direction = Direction::HigherIsBetter;
        assert!(t.validate().is_err());

        let entry = ThresholdEntry {
            metric: CalculatorType::Dso,
            sector: Sector::Retail,
            thresholds: t,
        };
        let err = ReferenceTables::from_entries(vec![entry]).unwrap_err();
        assert!(matches!(err, DiagnosticError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_unknown_metric_entry_rejected() {
        let entry = ThresholdEntry {
            metric: CalculatorType::Other("churn".into()),
            sector: Sector::General,
            thresholds: dso_general(),
        };
        assert!(ReferenceTables::from_entries(vec![entry]).is_err());
    }

    #[test]
    fn test_override_replaces_builtin() {
        let mut t = dso_general();
        t.median = dec!(50);
        let entry = ThresholdEntry {
            metric: CalculatorType::Dso,
            sector: Sector::General,
            thresholds: t,
        };
        let tables = ReferenceTables::builtin().with_overrides(vec![entry]).unwrap();
        let looked_up = tables.lookup(&CalculatorType::Dso, &Sector::General).unwrap();
        assert_eq!(looked_up.median, dec!(50));
    }

    #[test]
    fn test_entries_from_yaml() {
        let yaml = r#"
- metric: dso
  sector: retail
  excellent: 5
  median: 15
  warning: 30
  critical: 45
  unit: days
  direction: lower-is-better
"#;
        let entries = ReferenceTables::entries_from_yaml(yaml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sector, Sector::Retail);
        assert_eq!(entries[0].thresholds.critical, dec!(45));
    }

    #[test]
    fn test_resolved_reports_table_sector() {
        let tables = ReferenceTables::builtin();
        let saas = tables.resolved(&Sector::Saas, None);
        let burn = saas
            .iter()
            .find(|e| e.metric == CalculatorType::BurnRate)
            .unwrap();
        assert_eq!(burn.sector, Sector::Saas);
        assert!(saas.iter().all(|e| e.metric != CalculatorType::Valuation));

        let retail_runway = tables.resolved(&Sector::Retail, Some(&CalculatorType::BurnRate));
        assert_eq!(retail_runway.len(), 1);
        assert_eq!(retail_runway[0].sector, Sector::General);
    }

    #[test]
    fn test_beyond_critical() {
        let t = dso_general();
        assert!(!t.beyond_critical(dec!(90)));
        assert!(t.beyond_critical(dec!(91)));
    }
}
