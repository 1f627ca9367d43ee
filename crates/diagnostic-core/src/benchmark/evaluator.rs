//! Sector benchmark evaluation.
//!
//! Classifies a single metric value against its sector thresholds into one of
//! five tiers (best to worst):
//! - **excellent** -- at or better than the `excellent` breakpoint
//! - **good** -- at or better than the `median` breakpoint
//! - **median** -- short of the median by no more than a narrow band
//! - **vigilance** -- at or better than the `warning` breakpoint
//! - **critical** -- past the `warning` breakpoint
//!
//! Every boundary is inclusive on the better side. The distance to the
//! median is signed so that a positive figure always means "better than the
//! median", whatever the metric's direction.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::reference::{Direction, ReferenceTables, SectorThresholds};
use crate::types::{CalculatorType, MetricResult, Sector};

/// Half-width of the "around median" band, in percent of the median.
pub const DEFAULT_MEDIAN_BAND_PCT: Decimal = dec!(5);

/// Distance reported when the median is zero and the value differs from it.
/// Also the saturation bound when the percentage overflows.
const ZERO_MEDIAN_SENTINEL: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BenchmarkLevel {
    Excellent,
    Good,
    Median,
    Vigilance,
    Critical,
}

impl BenchmarkLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Median => "in line with the median",
            Self::Vigilance => "under watch",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for BenchmarkLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One metric compared against its sector table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub metric: CalculatorType,
    pub value: Decimal,
    pub unit: String,
    pub sector: Sector,
    /// False when the general table stood in for the requested sector.
    pub sector_specific: bool,
    pub level: BenchmarkLevel,
    pub percentile: String,
    pub median: Decimal,
    /// Percent distance to the median, positive when better.
    pub distance_to_median: Decimal,
    pub distance_label: String,
    pub interpretation: String,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluates values against a borrowed, immutable set of reference tables.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkEvaluator<'a> {
    tables: &'a ReferenceTables,
    median_band_pct: Decimal,
}

impl<'a> BenchmarkEvaluator<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self {
            tables,
            median_band_pct: DEFAULT_MEDIAN_BAND_PCT,
        }
    }

    pub fn with_median_band(mut self, pct: Decimal) -> Self {
        self.median_band_pct = pct.abs();
        self
    }

    /// Benchmark `value` for `metric` in `sector`. `None` when no table exists.
    pub fn evaluate(
        &self,
        metric: &CalculatorType,
        value: Decimal,
        sector: &Sector,
    ) -> Option<BenchmarkResult> {
        let thresholds = self.tables.lookup(metric, sector)?;
        let distance = distance_to_median(value, thresholds);
        let level = classify(value, thresholds, self.median_band_pct);
        let percentile = percentile_band(level, value, thresholds).to_string();
        let distance_label = format_distance(distance);
        let interpretation = format!(
            "{} of {} is {} for {} ({}, {}).",
            metric.label(),
            format_with_unit(value, &thresholds.unit),
            level.label(),
            sector.label(),
            percentile,
            distance_label
        );

        Some(BenchmarkResult {
            metric: metric.clone(),
            value,
            unit: thresholds.unit.clone(),
            sector: sector.clone(),
            sector_specific: self.tables.has_specific(metric, sector),
            level,
            percentile,
            median: thresholds.median,
            distance_to_median: distance,
            distance_label,
            interpretation,
        })
    }

    /// Benchmark a calculator result's own value.
    pub fn evaluate_metric(&self, metric: &MetricResult, sector: &Sector) -> Option<BenchmarkResult> {
        self.evaluate(&metric.calculator, metric.value, sector)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Assign a tier. Every value resolves to exactly one tier.
pub fn classify(value: Decimal, t: &SectorThresholds, median_band_pct: Decimal) -> BenchmarkLevel {
    let direction = t.direction;
    if direction.at_or_better(value, t.excellent) {
        BenchmarkLevel::Excellent
    } else if direction.at_or_better(value, t.median) {
        BenchmarkLevel::Good
    } else if distance_to_median(value, t) >= -median_band_pct {
        BenchmarkLevel::Median
    } else if direction.at_or_better(value, t.warning) {
        BenchmarkLevel::Vigilance
    } else {
        BenchmarkLevel::Critical
    }
}

/// Signed percent distance to the median; positive means better.
///
/// A zero median yields the fixed sentinel +100 / -100 (or 0 when equal).
/// Values too far from the median to fit a `Decimal` saturate at the same
/// sentinel.
pub fn distance_to_median(value: Decimal, t: &SectorThresholds) -> Decimal {
    let sentinel = if value == t.median {
        Decimal::ZERO
    } else if value > t.median {
        ZERO_MEDIAN_SENTINEL
    } else {
        -ZERO_MEDIAN_SENTINEL
    };
    let raw = if t.median.is_zero() {
        sentinel
    } else {
        value
            .checked_sub(t.median)
            .and_then(|gap| gap.checked_div(t.median.abs()))
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or(sentinel)
    };

    let signed = match t.direction {
        Direction::HigherIsBetter => raw,
        Direction::LowerIsBetter => -raw,
    };
    signed.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn percentile_band(level: BenchmarkLevel, value: Decimal, t: &SectorThresholds) -> &'static str {
    match level {
        BenchmarkLevel::Excellent => "top 10%",
        BenchmarkLevel::Good => "top 25%",
        BenchmarkLevel::Median => "around median (P50)",
        BenchmarkLevel::Vigilance => "bottom 50%",
        BenchmarkLevel::Critical if t.beyond_critical(value) => "bottom 10%",
        BenchmarkLevel::Critical => "bottom 25%",
    }
}

fn format_distance(distance: Decimal) -> String {
    if distance.is_zero() {
        "at the sector median".to_string()
    } else if distance > Decimal::ZERO {
        format!("+{}% vs sector median", distance.normalize())
    } else {
        format!("{}% vs sector median", distance.normalize())
    }
}

/// Render a value with its unit: `42 days`, `5%`, `3.2x`.
pub fn format_with_unit(value: Decimal, unit: &str) -> String {
    let v = value.normalize();
    match unit {
        "%" | "x" => format!("{v}{unit}"),
        _ => format!("{v} {unit}"),
    }
}
