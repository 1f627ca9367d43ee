use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::types::{CalculatorType, MetricResult};

/// The most recent result per known calculator.
///
/// "Most recent" is the latest `computed_at`; records without a timestamp
/// rank below timestamped ones, and ties go to the later position in the
/// input list. Unknown calculator types are counted but never retained.
#[derive(Debug, Clone, Default)]
pub struct LatestMetrics<'a> {
    by_type: BTreeMap<CalculatorType, &'a MetricResult>,
    ignored: usize,
}

impl<'a> LatestMetrics<'a> {
    pub fn from_results(results: &'a [MetricResult]) -> Self {
        let mut by_type: BTreeMap<CalculatorType, &'a MetricResult> = BTreeMap::new();
        let mut ignored = 0;
        for result in results {
            if !result.calculator.is_known() {
                ignored += 1;
                continue;
            }
            match by_type.get(&result.calculator) {
                Some(prev) if prev.computed_at > result.computed_at => {}
                _ => {
                    by_type.insert(result.calculator.clone(), result);
                }
            }
        }
        Self { by_type, ignored }
    }

    pub fn get(&self, calculator: &CalculatorType) -> Option<&'a MetricResult> {
        self.by_type.get(calculator).copied()
    }

    pub fn value(&self, calculator: &CalculatorType) -> Option<Decimal> {
        self.get(calculator).map(|m| m.value)
    }

    pub fn contains(&self, calculator: &CalculatorType) -> bool {
        self.by_type.contains_key(calculator)
    }

    /// Known calculators present, in coverage order.
    pub fn completed(&self) -> Vec<CalculatorType> {
        CalculatorType::KNOWN
            .iter()
            .filter(|t| self.contains(t))
            .cloned()
            .collect()
    }

    /// Known calculators absent, in coverage order.
    pub fn missing(&self) -> Vec<CalculatorType> {
        CalculatorType::KNOWN
            .iter()
            .filter(|t| !self.contains(t))
            .cloned()
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.by_type.len()
    }

    /// Number of records skipped for carrying an unknown calculator type.
    pub fn ignored_count(&self) -> usize {
        self.ignored
    }
}
