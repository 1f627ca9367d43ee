//! Structured summary text handed to a downstream narrator.
//!
//! Sections always appear in the same order: score header, pillars,
//! benchmarks, critical alerts, warnings, missing analyses. The narrator may
//! rephrase around these lines but the figures are fixed here.

use std::fmt::Write;

use crate::alerts::{Alert, Severity};
use crate::benchmark::evaluator::format_with_unit;
use crate::benchmark::BenchmarkResult;
use crate::scoring::DiagnosticScore;
use crate::types::{CalculatorType, Sector};

/// Render the diagnostic as a newline-delimited block.
pub fn compile_summary(
    score: &DiagnosticScore,
    benchmarks: &[BenchmarkResult],
    alerts: &[Alert],
    sector: &Sector,
    missing: &[CalculatorType],
) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    match score.total {
        Some(total) => {
            let _ = writeln!(
                out,
                "DIAGNOSTIC SCORE: {}/100 ({}, confidence {}, {} of 4 pillars)",
                total.normalize(),
                score.level.label(),
                score.confidence.label(),
                score.pillars_scored
            );
        }
        None => {
            let _ = writeln!(out, "DIAGNOSTIC SCORE: insufficient data");
        }
    }

    let _ = writeln!(out, "PILLARS:");
    for pillar in &score.pillars {
        let figure = match pillar.score {
            Some(s) => format!("{}/25", s.normalize()),
            None => "no data".to_string(),
        };
        let done = pillar.metrics.iter().filter(|m| m.completed).count();
        let _ = writeln!(
            out,
            "- {}: {} ({}; {}/{} analyses)",
            pillar.pillar.label(),
            figure,
            pillar.level.label(),
            done,
            pillar.metrics.len()
        );
    }

    let _ = writeln!(out, "BENCHMARKS ({}):", sector.label());
    if benchmarks.is_empty() {
        let _ = writeln!(out, "- none");
    }
    for b in benchmarks {
        let _ = writeln!(
            out,
            "- {}: {} -> {}, {}, {}",
            b.metric.label(),
            format_with_unit(b.value, &b.unit),
            b.level.label(),
            b.percentile,
            b.distance_label
        );
    }

    write_alerts(&mut out, "CRITICAL ALERTS:", alerts, Severity::Critical);
    write_alerts(&mut out, "WARNINGS:", alerts, Severity::Warning);

    if missing.is_empty() {
        let _ = write!(out, "MISSING ANALYSES: none");
    } else {
        let names: Vec<&str> = missing.iter().map(|m| m.label()).collect();
        let _ = write!(out, "MISSING ANALYSES: {}", names.join(", "));
    }
    out
}

fn write_alerts(out: &mut String, heading: &str, alerts: &[Alert], severity: Severity) {
    let _ = writeln!(out, "{heading}");
    let mut any = false;
    for alert in alerts.iter().filter(|a| a.severity == severity) {
        any = true;
        let _ = write!(out, "- {}", alert.title);
        if let Some(impact) = &alert.impact {
            let _ = write!(out, " | impact: {impact}");
        }
        let _ = writeln!(out, " | action: {}", alert.action);
    }
    if !any {
        let _ = writeln!(out, "- none");
    }
}
