use clap::Args;
use serde_json::Value;
use tracing::info;

use diagnostic_core::config::DiagnosticConfig;
use diagnostic_core::engine::{self, DiagnosticInput};
use diagnostic_core::reference::ReferenceTables;
use diagnostic_core::Sector;

use crate::input;

/// Arguments shared by `diagnose` and `summary`
#[derive(Args)]
pub struct DiagnoseArgs {
    /// Path to JSON input file: a request object or a bare array of results
    /// (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Force the sector instead of resolving it from the results
    #[arg(long)]
    pub sector: Option<String>,

    /// YAML or JSON file with scoring and alert tuning
    #[arg(long)]
    pub config: Option<String>,

    /// YAML or JSON file with extra reference table entries
    #[arg(long)]
    pub thresholds: Option<String>,
}

pub fn run_diagnose(args: DiagnoseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = build_request(&args)?;
    let output = engine::run_diagnostic(&request)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_summary(args: DiagnoseArgs) -> Result<String, Box<dyn std::error::Error>> {
    let request = build_request(&args)?;
    let output = engine::run_diagnostic(&request)?;
    Ok(output.result.summary)
}

fn build_request(args: &DiagnoseArgs) -> Result<DiagnosticInput, Box<dyn std::error::Error>> {
    let raw = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("provide calculator results with --input or on stdin".into());
    };

    let mut request = DiagnosticInput::from_json_value(raw)?;

    if let Some(ref sector) = args.sector {
        request.sector = Some(Sector::from(sector.as_str()));
    }
    if let Some(ref path) = args.config {
        let doc = input::file::read_document(path)
            .map_err(|e| format!("--config: {}", e))?;
        request.config = if doc.yaml {
            DiagnosticConfig::from_yaml_str(&doc.contents)?
        } else {
            DiagnosticConfig::from_json_str(&doc.contents)?
        };
    }
    if let Some(ref path) = args.thresholds {
        let doc = input::file::read_document(path)
            .map_err(|e| format!("--thresholds: {}", e))?;
        let entries = if doc.yaml {
            ReferenceTables::entries_from_yaml(&doc.contents)?
        } else {
            ReferenceTables::entries_from_json(&doc.contents)?
        };
        request.thresholds.extend(entries);
    }

    info!(
        results = request.metrics.len(),
        overrides = request.thresholds.len(),
        "diagnostic request loaded"
    );
    Ok(request)
}
