use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DiagnosticError;

/// Monetary amounts carried in calculator inputs.
pub type Money = Decimal;

/// Score points (pillar 0-25, composite 0-100).
pub type Points = Decimal;

/// Percentages expressed as percent (18 = 18%), as produced by the calculators.
pub type Percent = Decimal;

// ---------------------------------------------------------------------------
// Calculator kinds
// ---------------------------------------------------------------------------

/// The closed set of calculators whose results feed the diagnostic.
///
/// Unrecognised calculator names are kept as `Other` so that a payload with
/// newer calculator kinds still deserializes; every scoring and benchmark
/// lookup ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CalculatorType {
    Dso,
    Margin,
    BurnRate,
    CacLtv,
    BreakEven,
    Valuation,
    Ebitda,
    WorkingCapital,
    Other(String),
}

impl CalculatorType {
    /// Every known calculator, in the order used for coverage reporting.
    pub const KNOWN: [CalculatorType; 8] = [
        CalculatorType::Dso,
        CalculatorType::WorkingCapital,
        CalculatorType::BurnRate,
        CalculatorType::Margin,
        CalculatorType::Ebitda,
        CalculatorType::BreakEven,
        CalculatorType::CacLtv,
        CalculatorType::Valuation,
    ];

    pub fn key(&self) -> &str {
        match self {
            Self::Dso => "dso",
            Self::Margin => "margin",
            Self::BurnRate => "burn-rate",
            Self::CacLtv => "cac-ltv",
            Self::BreakEven => "break-even",
            Self::Valuation => "valuation",
            Self::Ebitda => "ebitda",
            Self::WorkingCapital => "working-capital",
            Self::Other(name) => name,
        }
    }

    /// Human label used in interpretation sentences and the summary.
    pub fn label(&self) -> &str {
        match self {
            Self::Dso => "DSO",
            Self::Margin => "Net margin",
            Self::BurnRate => "Cash runway",
            Self::CacLtv => "LTV/CAC ratio",
            Self::BreakEven => "Time to break-even",
            Self::Valuation => "Valuation multiple",
            Self::Ebitda => "EBITDA margin",
            Self::WorkingCapital => "Working-capital requirement",
            Self::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    fn from_normalized(key: &str) -> Option<Self> {
        let t = match key {
            "dso" => Self::Dso,
            "margin" | "net-margin" => Self::Margin,
            "burn-rate" | "runway" => Self::BurnRate,
            "cac-ltv" | "ltv-cac" => Self::CacLtv,
            "break-even" => Self::BreakEven,
            "valuation" => Self::Valuation,
            "ebitda" => Self::Ebitda,
            "working-capital" | "bfr" => Self::WorkingCapital,
            _ => return None,
        };
        Some(t)
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['_', ' '], "-")
}

impl From<String> for CalculatorType {
    fn from(raw: String) -> Self {
        Self::from_normalized(&normalize_key(&raw)).unwrap_or(Self::Other(raw))
    }
}

impl From<CalculatorType> for String {
    fn from(t: CalculatorType) -> Self {
        match t {
            CalculatorType::Other(name) => name,
            known => known.key().to_string(),
        }
    }
}

/// Strict parse: unlike deserialization, an unknown name is an error.
impl FromStr for CalculatorType {
    type Err = DiagnosticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_normalized(&normalize_key(s)).ok_or_else(|| DiagnosticError::InvalidInput {
            field: "metric".into(),
            reason: format!("Unknown calculator type '{s}'."),
        })
    }
}

impl fmt::Display for CalculatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Sectors
// ---------------------------------------------------------------------------

/// Business sector used to select reference tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sector {
    #[default]
    General,
    Saas,
    Retail,
    Manufacturing,
    Services,
    Construction,
    Hospitality,
    Other(String),
}

impl Sector {
    pub fn key(&self) -> &str {
        match self {
            Self::General => "general",
            Self::Saas => "saas",
            Self::Retail => "retail",
            Self::Manufacturing => "manufacturing",
            Self::Services => "services",
            Self::Construction => "construction",
            Self::Hospitality => "hospitality",
            Self::Other(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::General => "all sectors",
            Self::Saas => "SaaS",
            Self::Retail => "retail",
            Self::Manufacturing => "manufacturing",
            Self::Services => "professional services",
            Self::Construction => "construction",
            Self::Hospitality => "hospitality",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Sector {
    fn from(raw: String) -> Self {
        let key = normalize_key(&raw);
        match key.as_str() {
            "" | "general" => Self::General,
            "saas" | "software" => Self::Saas,
            "retail" | "commerce" => Self::Retail,
            "manufacturing" | "industry" => Self::Manufacturing,
            "services" | "consulting" => Self::Services,
            "construction" | "btp" => Self::Construction,
            "hospitality" | "horeca" | "restaurant" => Self::Hospitality,
            _ => Self::Other(key),
        }
    }
}

impl From<&str> for Sector {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Sector> for String {
    fn from(s: Sector) -> Self {
        match s {
            Sector::Other(name) => name,
            known => known.key().to_string(),
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Calculator output
// ---------------------------------------------------------------------------

/// One completed calculation, as handed over by a calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    #[serde(rename = "type")]
    pub calculator: CalculatorType,
    pub value: Decimal,
    /// Named figures the calculator derived `value` from (e.g. `revenue`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_at: Option<DateTime<Utc>>,
}

impl MetricResult {
    pub fn new(calculator: CalculatorType, value: Decimal) -> Self {
        Self {
            calculator,
            value,
            inputs: BTreeMap::new(),
            sector: None,
            computed_at: None,
        }
    }

    pub fn with_input(mut self, name: &str, value: Decimal) -> Self {
        self.inputs.insert(name.to_string(), value);
        self
    }

    pub fn with_sector(mut self, sector: impl Into<Sector>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_computed_at(mut self, at: DateTime<Utc>) -> Self {
        self.computed_at = Some(at);
        self
    }

    pub fn input(&self, name: &str) -> Option<Decimal> {
        self.inputs.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation. Carries no timings so that two runs over
/// the same input serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_calculator_type_aliases() {
        assert_eq!(CalculatorType::from("BFR".to_string()), CalculatorType::WorkingCapital);
        assert_eq!(CalculatorType::from("cac_ltv".to_string()), CalculatorType::CacLtv);
        assert_eq!(CalculatorType::from("Burn Rate".to_string()), CalculatorType::BurnRate);
    }

    #[test]
    fn test_unknown_calculator_is_preserved() {
        let t = CalculatorType::from("churn".to_string());
        assert_eq!(t, CalculatorType::Other("churn".into()));
        assert!(!t.is_known());
        assert_eq!(String::from(t), "churn");
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert!("churn".parse::<CalculatorType>().is_err());
        assert_eq!("dso".parse::<CalculatorType>().unwrap(), CalculatorType::Dso);
    }

    #[test]
    fn test_sector_parsing() {
        assert_eq!(Sector::from(""), Sector::General);
        assert_eq!(Sector::from("SaaS"), Sector::Saas);
        assert_eq!(Sector::from("horeca"), Sector::Hospitality);
        assert_eq!(Sector::from("biotech"), Sector::Other("biotech".into()));
        assert_eq!(Sector::from(" Biotech "), Sector::from("biotech"));
        assert_eq!(Sector::from("Green_Energy"), Sector::Other("green-energy".into()));
    }

    #[test]
    fn test_metric_result_deserializes_plain_strings() {
        let json = r#"{"type":"dso","value":42,"inputs":{"revenue":"1200000"},"sector":"retail"}"#;
        let m: MetricResult = serde_json::from_str(json).unwrap();
        assert_eq!(m.calculator, CalculatorType::Dso);
        assert_eq!(m.value, dec!(42));
        assert_eq!(m.input("revenue"), Some(dec!(1200000)));
        assert_eq!(m.sector, Some(Sector::Retail));
    }

    #[test]
    fn test_metric_result_with_unknown_type_deserializes() {
        let json = r#"{"type":"churn-rate","value":"3.5"}"#;
        let m: MetricResult = serde_json::from_str(json).unwrap();
        assert_eq!(m.calculator, CalculatorType::Other("churn-rate".into()));
        assert!(m.inputs.is_empty());
    }
}
