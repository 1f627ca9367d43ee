//! Diagnostic orchestration.
//!
//! Turns a list of calculator results into an [`EnrichedContext`]:
//! 1. keep the most recent result per known calculator,
//! 2. resolve the effective sector,
//! 3. benchmark each result against its sector table,
//! 4. score the pillars and aggregate the composite,
//! 5. run the alert battery,
//! 6. compile the summary text.
//!
//! The computation is pure: no I/O, no shared state, and identical inputs
//! give identical output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::alerts::{generate_alerts, Alert, AlertContext};
use crate::benchmark::{BenchmarkEvaluator, BenchmarkResult};
use crate::config::DiagnosticConfig;
use crate::metrics::LatestMetrics;
use crate::reference::{ReferenceTables, ThresholdEntry};
use crate::scoring::{aggregate, score_pillars, DiagnosticScore};
use crate::summary::compile_summary;
use crate::types::{with_metadata, CalculatorType, ComputationOutput, MetricResult, Sector};
use crate::DiagnosticResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// A full diagnostic request, as accepted by the CLI and the bindings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticInput {
    pub metrics: Vec<MetricResult>,
    /// Forces the sector instead of resolving it from the results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    #[serde(default)]
    pub config: DiagnosticConfig,
    /// Extra or replacement reference tables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ThresholdEntry>,
}

impl DiagnosticInput {
    /// Parse a request object, or a bare array of results with default
    /// settings.
    pub fn from_json_value(raw: Value) -> DiagnosticResult<Self> {
        if raw.is_array() {
            Ok(Self {
                metrics: serde_json::from_value(raw)?,
                ..Default::default()
            })
        } else {
            Ok(serde_json::from_value(raw)?)
        }
    }

    pub fn from_json_str(json: &str) -> DiagnosticResult<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }
}

/// The single artifact handed to the narrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedContext {
    pub score: DiagnosticScore,
    pub benchmarks: Vec<BenchmarkResult>,
    pub alerts: Vec<Alert>,
    pub sector: Sector,
    pub summary: String,
    pub missing: Vec<CalculatorType>,
    pub completed_count: usize,
    pub total_count: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sector of the most recent result that names one, else `general`.
///
/// Timestamped results outrank untimestamped ones; ties go to the later
/// position in the list.
pub fn resolve_sector(metrics: &[MetricResult]) -> Sector {
    let mut best: Option<&MetricResult> = None;
    for m in metrics.iter().filter(|m| m.sector.is_some()) {
        match best {
            Some(prev) if prev.computed_at > m.computed_at => {}
            _ => best = Some(m),
        }
    }
    best.and_then(|m| m.sector.clone()).unwrap_or_default()
}

/// Run the diagnostic with the sector resolved from the results.
pub fn diagnose(
    metrics: &[MetricResult],
    tables: &ReferenceTables,
    config: &DiagnosticConfig,
) -> EnrichedContext {
    diagnose_for_sector(metrics, resolve_sector(metrics), tables, config)
}

/// Run the diagnostic for an explicit sector.
pub fn diagnose_for_sector(
    metrics: &[MetricResult],
    sector: Sector,
    tables: &ReferenceTables,
    config: &DiagnosticConfig,
) -> EnrichedContext {
    let latest = LatestMetrics::from_results(metrics);
    debug!(
        sector = %sector,
        completed = latest.completed_count(),
        ignored = latest.ignored_count(),
        "running diagnostic"
    );

    let evaluator = BenchmarkEvaluator::new(tables).with_median_band(config.median_band_pct);
    let benchmarks: Vec<BenchmarkResult> = latest
        .completed()
        .iter()
        .filter_map(|t| latest.get(t))
        .filter_map(|m| evaluator.evaluate_metric(m, &sector))
        .collect();

    let score = aggregate(score_pillars(&latest, &config.risk));
    debug!(total = ?score.total, confidence = ?score.confidence, "composite scored");

    let alerts = generate_alerts(&AlertContext {
        metrics: &latest,
        benchmarks: &benchmarks,
        score: &score,
        config,
    });

    let missing = latest.missing();
    let summary = compile_summary(&score, &benchmarks, &alerts, &sector, &missing);

    EnrichedContext {
        completed_count: latest.completed_count(),
        total_count: CalculatorType::KNOWN.len(),
        score,
        benchmarks,
        alerts,
        sector,
        summary,
        missing,
    }
}

/// Validate a request, run it, and wrap the result with metadata.
pub fn run_diagnostic(input: &DiagnosticInput) -> DiagnosticResult<ComputationOutput<EnrichedContext>> {
    input.config.validate()?;
    let tables = ReferenceTables::builtin().with_overrides(input.thresholds.clone())?;

    let sector = input
        .sector
        .clone()
        .unwrap_or_else(|| resolve_sector(&input.metrics));

    let mut warnings: Vec<String> = Vec::new();
    let unknown: Vec<&str> = input
        .metrics
        .iter()
        .filter(|m| !m.calculator.is_known())
        .map(|m| m.calculator.key())
        .collect();
    if !unknown.is_empty() {
        warnings.push(format!(
            "Ignored {} result(s) with unknown calculator type: {}.",
            unknown.len(),
            unknown.join(", ")
        ));
    }

    let context = diagnose_for_sector(&input.metrics, sector, &tables, &input.config);

    // Custom sectors are fine when the request brought tables for them.
    let unrecognised = matches!(context.sector, Sector::Other(_))
        && !context.benchmarks.iter().any(|b| b.sector_specific);
    if unrecognised {
        warnings.push(format!(
            "Sector '{}' is not recognised; general reference tables apply.",
            context.sector
        ));
    }

    let fallbacks: Vec<&str> = context
        .benchmarks
        .iter()
        .filter(|b| !b.sector_specific && b.sector != Sector::General)
        .map(|b| b.metric.key())
        .collect();
    if !fallbacks.is_empty() && !unrecognised {
        warnings.push(format!(
            "No {} table for {}; general tables used.",
            context.sector.label(),
            fallbacks.join(", ")
        ));
    }
    if context.score.total.is_none() {
        warnings.push("No pillar has data; the composite score is unavailable.".into());
    }

    let assumptions = serde_json::json!({
        "pillar_max": "25 points per pillar",
        "composite": "round(sum of scored pillars / scored pillars * 4)",
        "median_band_pct": input.config.median_band_pct,
        "coverage_threshold": input.config.coverage_threshold,
        "duplicate_results": "most recent result per calculator is used",
    });

    Ok(with_metadata(
        "Sector-benchmarked pillar diagnostic",
        &assumptions,
        warnings,
        context,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_resolve_sector_defaults_to_general() {
        let metrics = vec![MetricResult::new(CalculatorType::Dso, dec!(40))];
        assert_eq!(resolve_sector(&metrics), Sector::General);
    }

    #[test]
    fn test_resolve_sector_takes_most_recent() {
        let metrics = vec![
            MetricResult::new(CalculatorType::Dso, dec!(40)).with_sector("retail"),
            MetricResult::new(CalculatorType::Margin, dec!(8)),
            MetricResult::new(CalculatorType::Ebitda, dec!(8)).with_sector("saas"),
        ];
        assert_eq!(resolve_sector(&metrics), Sector::Saas);

        let at = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        let metrics = vec![
            MetricResult::new(CalculatorType::Dso, dec!(40))
                .with_sector("retail")
                .with_computed_at(at),
            MetricResult::new(CalculatorType::Ebitda, dec!(8)).with_sector("saas"),
        ];
        assert_eq!(resolve_sector(&metrics), Sector::Retail);
    }

    #[test]
    fn test_counts_and_missing() {
        let metrics = vec![
            MetricResult::new(CalculatorType::Dso, dec!(40)),
            MetricResult::new(CalculatorType::Dso, dec!(42)),
            MetricResult::new(CalculatorType::Other("churn".into()), dec!(3)),
        ];
        let ctx = diagnose(&metrics, &ReferenceTables::builtin(), &DiagnosticConfig::default());
        assert_eq!(ctx.completed_count, 1);
        assert_eq!(ctx.total_count, 8);
        assert_eq!(ctx.missing.len(), 7);
        assert_eq!(ctx.benchmarks.len(), 1);
        assert_eq!(ctx.benchmarks[0].value, dec!(42));
    }

    #[test]
    fn test_run_diagnostic_warnings() {
        let input = DiagnosticInput {
            metrics: vec![
                MetricResult::new(CalculatorType::BurnRate, dec!(10)).with_sector("retail"),
                MetricResult::new(CalculatorType::Other("churn".into()), dec!(3)),
            ],
            ..Default::default()
        };
        let out = run_diagnostic(&input).unwrap();
        assert_eq!(out.result.sector, Sector::Retail);
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings[0].contains("churn"));
        assert!(out.warnings[1].contains("burn-rate"));
    }

    #[test]
    fn test_run_diagnostic_rejects_bad_tuning() {
        let mut input = DiagnosticInput::default();
        input.config.risk.compound_dso_margin_penalty = dec!(0);
        assert!(run_diagnostic(&input).is_err());
    }

    #[test]
    fn test_sector_override_wins() {
        let input = DiagnosticInput {
            metrics: vec![MetricResult::new(CalculatorType::Dso, dec!(40)).with_sector("retail")],
            sector: Some(Sector::Manufacturing),
            ..Default::default()
        };
        let out = run_diagnostic(&input).unwrap();
        assert_eq!(out.result.sector, Sector::Manufacturing);
        // 40 days is excellent against the manufacturing table
        assert_eq!(
            out.result.benchmarks[0].level,
            crate::benchmark::BenchmarkLevel::Excellent
        );
    }

    #[test]
    fn test_unknown_sector_warns_once_normalised() {
        let input = DiagnosticInput {
            metrics: vec![MetricResult::new(CalculatorType::Dso, dec!(40)).with_sector("Biotech")],
            ..Default::default()
        };
        let out = run_diagnostic(&input).unwrap();
        assert_eq!(out.result.sector, Sector::Other("biotech".into()));
        assert_eq!(
            out.warnings,
            vec!["Sector 'biotech' is not recognised; general reference tables apply.".to_string()]
        );
    }

    #[test]
    fn test_custom_sector_tables_silence_warning() {
        let thresholds = ReferenceTables::entries_from_json(
            r#"[{"metric": "dso", "sector": "biotech", "excellent": "50", "median": "70",
                 "warning": "90", "critical": "120", "unit": "days", "direction": "lower-is-better"}]"#,
        )
        .unwrap();
        let input = DiagnosticInput {
            metrics: vec![
                MetricResult::new(CalculatorType::Dso, dec!(60)),
                MetricResult::new(CalculatorType::Margin, dec!(8)),
            ],
            sector: Some(Sector::from("BioTech")),
            thresholds,
            ..Default::default()
        };
        let out = run_diagnostic(&input).unwrap();
        let b = &out.result.benchmarks[0];
        assert!(b.sector_specific);
        assert_eq!(b.level, crate::benchmark::BenchmarkLevel::Good);
        assert!(!out.result.benchmarks[1].sector_specific);
        assert_eq!(
            out.warnings,
            vec!["No biotech table for margin; general tables used.".to_string()]
        );
    }

    #[test]
    fn test_input_from_bare_array() {
        let input = DiagnosticInput::from_json_value(serde_json::json!([
            {"type": "dso", "value": "42"},
            {"type": "margin", "value": "5"}
        ]))
        .unwrap();
        assert_eq!(input.metrics.len(), 2);
        assert_eq!(input.metrics[1].calculator, CalculatorType::Margin);
        assert_eq!(input.metrics[1].value, dec!(5));
        assert!(input.sector.is_none());
        assert_eq!(input.config.coverage_threshold, 3);
    }

    #[test]
    fn test_input_from_request_object() {
        let input = DiagnosticInput::from_json_str(
            r#"{"metrics": [{"type": "burn-rate", "value": "9"}],
                "sector": "saas",
                "config": {"coverage_threshold": 1}}"#,
        )
        .unwrap();
        assert_eq!(input.sector, Some(Sector::Saas));
        assert_eq!(input.config.coverage_threshold, 1);

        let err = DiagnosticInput::from_json_value(serde_json::json!({"metrics": "dso"})).unwrap_err();
        assert!(matches!(err, crate::DiagnosticError::SerializationError(_)));
        assert!(DiagnosticInput::from_json_str("not json").is_err());
    }

    #[test]
    fn test_empty_input_is_incomplete_not_error() {
        let out = run_diagnostic(&DiagnosticInput::default()).unwrap();
        assert_eq!(out.result.score.total, None);
        assert!(out.result.summary.starts_with("DIAGNOSTIC SCORE: insufficient data"));
        assert_eq!(out.warnings.len(), 1);
    }
}
