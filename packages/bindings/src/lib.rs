use napi::Result as NapiResult;
use napi_derive::napi;

use diagnostic_core::benchmark::{self, BenchmarkRequest, ThresholdQuery};
use diagnostic_core::engine::{self, DiagnosticInput};
use diagnostic_core::reference::ReferenceTables;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// Full diagnostic. Accepts a request object or a bare array of results.
#[napi]
pub fn run_diagnostic(input_json: String) -> NapiResult<String> {
    let input = DiagnosticInput::from_json_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_diagnostic(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Only the compiled summary text, for feeding a narrator directly.
#[napi]
pub fn diagnostic_summary(input_json: String) -> NapiResult<String> {
    let input = DiagnosticInput::from_json_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_diagnostic(&input).map_err(to_napi_error)?;
    Ok(output.result.summary)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_benchmark(input_json: String) -> NapiResult<String> {
    let request: BenchmarkRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = benchmark::run_benchmark(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Reference tables. `{}` lists every stored entry; `{"sector": "saas"}`
/// resolves the tables that sector would use.
#[napi]
pub fn lookup_thresholds(input_json: String) -> NapiResult<String> {
    let query: ThresholdQuery = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let entries = benchmark::lookup_thresholds(&ReferenceTables::builtin(), &query);
    serde_json::to_string(&entries).map_err(to_napi_error)
}
