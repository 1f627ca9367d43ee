use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use diagnostic_core::benchmark::{self, BenchmarkRequest, ThresholdQuery};
use diagnostic_core::reference::ReferenceTables;
use diagnostic_core::{CalculatorType, Sector};

use crate::input;

/// Arguments for a single-value benchmark
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BenchmarkArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Calculator type (dso, margin, burn-rate, cac-ltv, ebitda, working-capital, ...)
    #[arg(long)]
    pub metric: Option<String>,

    /// Metric value in its natural unit (days, %, months, x)
    #[arg(long)]
    pub value: Option<Decimal>,

    /// Sector (general, saas, retail, manufacturing, services, construction, hospitality)
    #[arg(long)]
    pub sector: Option<String>,

    /// Half-width of the median band, in percent
    #[arg(long)]
    pub median_band: Option<Decimal>,
}

/// Arguments for listing reference tables
#[derive(Args)]
pub struct ThresholdsArgs {
    /// Only this calculator type
    #[arg(long)]
    pub metric: Option<String>,

    /// Resolve the tables that apply to this sector
    #[arg(long)]
    pub sector: Option<String>,
}

pub fn run_benchmark(args: BenchmarkArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: BenchmarkRequest = if let Some(ref path) = args.input {
        serde_json::from_value(input::file::read_json_value(path)?)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let metric = args
            .metric
            .as_deref()
            .ok_or("--metric is required (or provide --input)")?;
        BenchmarkRequest {
            metric: metric.parse::<CalculatorType>()?,
            value: args
                .value
                .ok_or("--value is required (or provide --input)")?,
            sector: args
                .sector
                .as_deref()
                .map(Sector::from)
                .unwrap_or_default(),
            median_band_pct: args.median_band,
            thresholds: Vec::new(),
        }
    };

    let output = benchmark::run_benchmark(&request)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_thresholds(args: ThresholdsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let query = ThresholdQuery {
        metric: args
            .metric
            .as_deref()
            .map(str::parse::<CalculatorType>)
            .transpose()?,
        sector: args.sector.as_deref().map(Sector::from),
    };
    let entries = benchmark::lookup_thresholds(&ReferenceTables::builtin(), &query);
    Ok(serde_json::to_value(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_input_file_is_an_error() {
        let args = BenchmarkArgs {
            input: Some("/definitely/not/here.json".into()),
            metric: None,
            value: None,
            sector: None,
            median_band: None,
        };
        assert!(run_benchmark(args).is_err());
    }

    #[test]
    fn test_thresholds_rejects_unknown_metric() {
        let args = ThresholdsArgs {
            metric: Some("churn".into()),
            sector: None,
        };
        assert!(run_thresholds(args).is_err());
    }

    #[test]
    fn test_thresholds_for_sector() {
        let args = ThresholdsArgs {
            metric: Some("dso".into()),
            sector: Some("retail".into()),
        };
        let value = run_thresholds(args).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["sector"], "retail");
        assert_eq!(rows[0]["median"], dec!(15).to_string());
    }
}
