pub mod evaluator;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DiagnosticError;
use crate::reference::{ReferenceTables, ThresholdEntry};
use crate::types::{with_metadata, CalculatorType, ComputationOutput, Sector};
use crate::DiagnosticResult;

pub use evaluator::{BenchmarkEvaluator, BenchmarkLevel, BenchmarkResult, DEFAULT_MEDIAN_BAND_PCT};

/// Benchmark one value with the default median band.
pub fn evaluate(
    tables: &ReferenceTables,
    metric: &CalculatorType,
    value: Decimal,
    sector: &Sector,
) -> Option<BenchmarkResult> {
    BenchmarkEvaluator::new(tables).evaluate(metric, value, sector)
}

// ---------------------------------------------------------------------------
// Standalone requests
// ---------------------------------------------------------------------------

/// A single-value benchmark request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub metric: CalculatorType,
    pub value: Decimal,
    #[serde(default)]
    pub sector: Sector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_band_pct: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ThresholdEntry>,
}

/// Filter for listing reference tables. A sector resolves the general
/// fallback; without one every stored entry is listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdQuery {
    #[serde(default)]
    pub metric: Option<CalculatorType>,
    #[serde(default)]
    pub sector: Option<Sector>,
}

/// Benchmark a value, failing when nothing can be compared.
pub fn run_benchmark(request: &BenchmarkRequest) -> DiagnosticResult<ComputationOutput<BenchmarkResult>> {
    if !request.metric.is_known() {
        return Err(DiagnosticError::InvalidInput {
            field: "metric".into(),
            reason: format!("Unknown calculator type '{}'.", request.metric),
        });
    }
    let band = request.median_band_pct.unwrap_or(DEFAULT_MEDIAN_BAND_PCT);
    if band < Decimal::ZERO || band > Decimal::from(50) {
        return Err(DiagnosticError::InvalidInput {
            field: "median_band_pct".into(),
            reason: "Must be in [0, 50].".into(),
        });
    }

    let tables = ReferenceTables::builtin().with_overrides(request.thresholds.clone())?;
    let result = BenchmarkEvaluator::new(&tables)
        .with_median_band(band)
        .evaluate(&request.metric, request.value, &request.sector)
        .ok_or_else(|| DiagnosticError::InvalidInput {
            field: "metric".into(),
            reason: format!("No reference table for '{}'.", request.metric),
        })?;

    let mut warnings = Vec::new();
    if !result.sector_specific && request.sector != Sector::General {
        warnings.push(format!(
            "No {} table for {}; general table used.",
            request.sector.label(),
            request.metric
        ));
    }

    let assumptions = serde_json::json!({
        "median_band_pct": band,
        "distance": "(value - median) / |median| * 100, positive means better",
    });
    Ok(with_metadata(
        "Sector reference table tiering",
        &assumptions,
        warnings,
        result,
    ))
}

/// Reference tables matching `query`.
pub fn lookup_thresholds(tables: &ReferenceTables, query: &ThresholdQuery) -> Vec<ThresholdEntry> {
    match &query.sector {
        Some(sector) => tables.resolved(sector, query.metric.as_ref()),
        None => tables
            .entries()
            .into_iter()
            .filter(|e| query.metric.as_ref().map_or(true, |m| *m == e.metric))
            .collect(),
    }
}
