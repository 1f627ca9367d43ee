//! Tuning parameters for a diagnostic run.
//!
//! The risk-pillar penalties are heuristics, not accounting rules, so they are
//! exposed here instead of being hard-wired. Validation keeps the one ordering
//! the engine depends on: two co-occurring weaknesses must always cost more
//! than either one alone.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::benchmark::evaluator::DEFAULT_MEDIAN_BAND_PCT;
use crate::error::DiagnosticError;
use crate::scoring::pillars::PILLAR_MAX;
use crate::DiagnosticResult;

/// Thresholds and point deductions for the risk pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskTuning {
    /// DSO (days) above which receivables are a risk on their own.
    pub dso_ceiling: Decimal,
    pub dso_penalty: Decimal,
    /// Net margin (%) below which profitability is a risk on its own.
    pub margin_floor: Decimal,
    pub margin_penalty: Decimal,
    /// Runway (months) below which cash is a risk on its own.
    pub runway_floor: Decimal,
    pub runway_penalty: Decimal,
    /// Working-capital requirement (days) above which the cycle is a risk.
    pub working_capital_ceiling: Decimal,
    pub working_capital_penalty: Decimal,
    /// Slow collection on margins too thin to finance it.
    pub compound_dso: Decimal,
    pub compound_margin: Decimal,
    pub compound_dso_margin_penalty: Decimal,
    /// Short runway while barely profitable.
    pub compound_runway: Decimal,
    pub compound_runway_margin: Decimal,
    pub compound_runway_margin_penalty: Decimal,
}

impl Default for RiskTuning {
    fn default() -> Self {
        Self {
            dso_ceiling: dec!(60),
            dso_penalty: dec!(6),
            margin_floor: dec!(10),
            margin_penalty: dec!(6),
            runway_floor: dec!(6),
            runway_penalty: dec!(6),
            working_capital_ceiling: dec!(60),
            working_capital_penalty: dec!(4),
            compound_dso: dec!(60),
            compound_margin: dec!(20),
            compound_dso_margin_penalty: dec!(5),
            compound_runway: dec!(12),
            compound_runway_margin: dec!(10),
            compound_runway_margin_penalty: dec!(4),
        }
    }
}

impl RiskTuning {
    pub fn validate(&self) -> DiagnosticResult<()> {
        let penalties = [
            ("dso_penalty", self.dso_penalty),
            ("margin_penalty", self.margin_penalty),
            ("runway_penalty", self.runway_penalty),
            ("working_capital_penalty", self.working_capital_penalty),
        ];
        for (name, value) in penalties {
            if value < Decimal::ZERO {
                return Err(invalid(name, "Penalty must be non-negative."));
            }
        }

        let compounds = [
            ("compound_dso_margin_penalty", self.compound_dso_margin_penalty),
            ("compound_runway_margin_penalty", self.compound_runway_margin_penalty),
        ];
        for (name, value) in compounds {
            if value <= Decimal::ZERO {
                return Err(invalid(
                    name,
                    "Compound penalty must be strictly positive.",
                ));
            }
        }

        // Both single penalties plus the compound one must leave room above
        // zero, otherwise the floor would hide the compound deduction.
        let worst_pair = self
            .dso_penalty
            .checked_add(self.margin_penalty)
            .and_then(|sum| sum.checked_add(self.compound_dso_margin_penalty));
        if worst_pair.map_or(true, |sum| sum >= PILLAR_MAX) {
            return Err(invalid(
                "compound_dso_margin_penalty",
                "dso_penalty + margin_penalty + compound penalty must stay below 25.",
            ));
        }

        if self.runway_floor > self.compound_runway {
            return Err(invalid(
                "runway_floor",
                "Runway floor must not exceed the compound runway trigger.",
            ));
        }
        Ok(())
    }
}

fn invalid(parameter: &str, reason: &str) -> DiagnosticError {
    DiagnosticError::InvalidTuning {
        parameter: parameter.into(),
        reason: reason.into(),
    }
}

/// Everything a run can be tuned with. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticConfig {
    pub risk: RiskTuning,
    /// Completed calculators below which a coverage alert fires.
    pub coverage_threshold: usize,
    /// Currency code used when rendering monetary impacts.
    pub currency: String,
    /// Half-width of the benchmark "around median" band, in percent.
    pub median_band_pct: Decimal,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            risk: RiskTuning::default(),
            coverage_threshold: 3,
            currency: "EUR".to_string(),
            median_band_pct: DEFAULT_MEDIAN_BAND_PCT,
        }
    }
}

impl DiagnosticConfig {
    pub fn from_json_str(contents: &str) -> DiagnosticResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> DiagnosticResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DiagnosticResult<()> {
        self.risk.validate()?;
        if self.currency.trim().is_empty() {
            return Err(DiagnosticError::InvalidInput {
                field: "currency".into(),
                reason: "Currency code must not be empty.".into(),
            });
        }
        if self.median_band_pct < Decimal::ZERO || self.median_band_pct > dec!(50) {
            return Err(DiagnosticError::InvalidInput {
                field: "median_band_pct".into(),
                reason: "Must be in [0, 50].".into(),
            });
        }
        Ok(())
    }
}
