//! Pillar scoring.
//!
//! Four pillars of 25 points each:
//! 1. **Liquidity** -- DSO (10), working-capital requirement (10), runway (5).
//! 2. **Profitability** -- net margin (10), EBITDA margin (10), break-even (5).
//! 3. **Resilience** -- LTV/CAC (10), valuation multiple (10), break-even (5).
//! 4. **Risk** -- starts at 25 and loses points for weaknesses, with extra
//!    deductions when two weaknesses occur together.
//!
//! Each metric maps to a share of its allocation through a step function.
//! A pillar with some metrics missing is rescaled over the metrics that were
//! evaluated; a pillar with none is `None`, which is never the same as zero.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RiskTuning;
use crate::metrics::LatestMetrics;
use crate::types::{CalculatorType, Points};

pub const PILLAR_MAX: Points = dec!(25);

const LIQUIDITY: &[(CalculatorType, Points)] = &[
    (CalculatorType::Dso, dec!(10)),
    (CalculatorType::WorkingCapital, dec!(10)),
    (CalculatorType::BurnRate, dec!(5)),
];

const PROFITABILITY: &[(CalculatorType, Points)] = &[
    (CalculatorType::Margin, dec!(10)),
    (CalculatorType::Ebitda, dec!(10)),
    (CalculatorType::BreakEven, dec!(5)),
];

const RESILIENCE: &[(CalculatorType, Points)] = &[
    (CalculatorType::CacLtv, dec!(10)),
    (CalculatorType::Valuation, dec!(10)),
    (CalculatorType::BreakEven, dec!(5)),
];

/// Metrics whose presence makes the risk pillar scoreable.
const RISK_FEEDS: &[CalculatorType] = &[
    CalculatorType::Dso,
    CalculatorType::Margin,
    CalculatorType::WorkingCapital,
];

/// Runway only adjusts a risk pillar that is already scored.
const RISK_ADJUSTERS: &[CalculatorType] = &[CalculatorType::BurnRate];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pillar {
    Liquidity,
    Profitability,
    Resilience,
    Risk,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [
        Pillar::Liquidity,
        Pillar::Profitability,
        Pillar::Resilience,
        Pillar::Risk,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Liquidity => "Liquidity",
            Self::Profitability => "Profitability",
            Self::Resilience => "Resilience",
            Self::Risk => "Risk",
        }
    }

    /// Calculators feeding this pillar.
    pub fn feeds(self) -> Vec<CalculatorType> {
        match self {
            Self::Risk => RISK_FEEDS.iter().chain(RISK_ADJUSTERS).cloned().collect(),
            other => other.enablers(),
        }
    }

    /// Calculators any one of which is enough to score this pillar.
    pub fn enablers(self) -> Vec<CalculatorType> {
        match self {
            Self::Liquidity => LIQUIDITY.iter().map(|(t, _)| t.clone()).collect(),
            Self::Profitability => PROFITABILITY.iter().map(|(t, _)| t.clone()).collect(),
            Self::Resilience => RESILIENCE.iter().map(|(t, _)| t.clone()).collect(),
            Self::Risk => RISK_FEEDS.to_vec(),
        }
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Qualitative level shared by pillars and the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthLevel {
    Excellent,
    Good,
    Vigilance,
    ActionRequired,
    Incomplete,
}

impl HealthLevel {
    /// Classify a score expressed on a 0-100 basis.
    pub fn from_score(score: Option<Points>) -> Self {
        match score {
            None => Self::Incomplete,
            Some(s) if s >= dec!(75) => Self::Excellent,
            Some(s) if s >= dec!(55) => Self::Good,
            Some(s) if s >= dec!(35) => Self::Vigilance,
            Some(_) => Self::ActionRequired,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Vigilance => "vigilance",
            Self::ActionRequired => "action required",
            Self::Incomplete => "incomplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStatus {
    pub calculator: CalculatorType,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPenalty {
    pub reason: String,
    pub points: Points,
    pub compound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarScore {
    pub pillar: Pillar,
    /// 0-25, `None` when no feeding metric was supplied.
    pub score: Option<Points>,
    pub level: HealthLevel,
    pub metrics: Vec<MetricStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub penalties: Vec<RiskPenalty>,
}

impl PillarScore {
    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }

    fn new(pillar: Pillar, score: Option<Points>, metrics: Vec<MetricStatus>) -> Self {
        Self {
            pillar,
            score,
            level: HealthLevel::from_score(score.map(|s| s * dec!(4))),
            metrics,
            penalties: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Step functions
// ---------------------------------------------------------------------------

fn score_dso(days: Decimal) -> Decimal {
    if days <= dec!(30) {
        Decimal::ONE
    } else if days <= dec!(45) {
        dec!(0.7)
    } else if days <= dec!(60) {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

fn score_working_capital(days: Decimal) -> Decimal {
    if days <= Decimal::ZERO {
        Decimal::ONE
    } else if days <= dec!(30) {
        dec!(0.7)
    } else if days <= dec!(60) {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

fn score_runway(months: Decimal) -> Decimal {
    if months >= dec!(18) {
        Decimal::ONE
    } else if months >= dec!(12) {
        dec!(0.7)
    } else if months >= dec!(6) {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

fn score_margin(pct: Decimal) -> Decimal {
    if pct >= dec!(15) {
        Decimal::ONE
    } else if pct >= dec!(10) {
        dec!(0.7)
    } else if pct >= dec!(5) {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

fn score_ebitda(pct: Decimal) -> Decimal {
    if pct >= dec!(20) {
        Decimal::ONE
    } else if pct >= dec!(10) {
        dec!(0.7)
    } else if pct >= Decimal::ZERO {
        dec!(0.4)
    } else {
        Decimal::ZERO
    }
}

fn score_break_even(months: Decimal) -> Decimal {
    if months <= Decimal::ZERO {
        Decimal::ONE
    } else if months <= dec!(12) {
        dec!(0.7)
    } else if months <= dec!(24) {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

fn score_ltv_cac(ratio: Decimal) -> Decimal {
    if ratio >= dec!(3) {
        Decimal::ONE
    } else if ratio >= dec!(2) {
        dec!(0.7)
    } else if ratio >= Decimal::ONE {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

fn score_valuation(multiple: Decimal) -> Decimal {
    if multiple >= dec!(8) {
        Decimal::ONE
    } else if multiple >= dec!(5) {
        dec!(0.7)
    } else if multiple >= dec!(3) {
        dec!(0.4)
    } else {
        dec!(0.1)
    }
}

/// Share (0-1) of its allocation a metric earns. `None` for unknown types.
pub fn metric_fraction(calculator: &CalculatorType, value: Decimal) -> Option<Decimal> {
    let fraction = match calculator {
        CalculatorType::Dso => score_dso(value),
        CalculatorType::WorkingCapital => score_working_capital(value),
        CalculatorType::BurnRate => score_runway(value),
        CalculatorType::Margin => score_margin(value),
        CalculatorType::Ebitda => score_ebitda(value),
        CalculatorType::BreakEven => score_break_even(value),
        CalculatorType::CacLtv => score_ltv_cac(value),
        CalculatorType::Valuation => score_valuation(value),
        CalculatorType::Other(_) => return None,
    };
    Some(fraction)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score all four pillars, in `Pillar::ALL` order.
pub fn score_pillars(metrics: &LatestMetrics<'_>, tuning: &RiskTuning) -> Vec<PillarScore> {
    Pillar::ALL
        .iter()
        .map(|&p| score_pillar(p, metrics, tuning))
        .collect()
}

pub fn score_pillar(pillar: Pillar, metrics: &LatestMetrics<'_>, tuning: &RiskTuning) -> PillarScore {
    let scored = match pillar {
        Pillar::Liquidity => score_weighted(pillar, LIQUIDITY, metrics),
        Pillar::Profitability => score_weighted(pillar, PROFITABILITY, metrics),
        Pillar::Resilience => score_weighted(pillar, RESILIENCE, metrics),
        Pillar::Risk => score_risk(metrics, tuning),
    };
    debug!(pillar = %pillar, score = ?scored.score, "pillar scored");
    scored
}

fn score_weighted(
    pillar: Pillar,
    allocations: &[(CalculatorType, Points)],
    metrics: &LatestMetrics<'_>,
) -> PillarScore {
    let mut achieved = Decimal::ZERO;
    let mut possible = Decimal::ZERO;
    let mut statuses = Vec::with_capacity(allocations.len());

    for (calculator, points) in allocations {
        let value = metrics.value(calculator);
        if let Some(fraction) = value.and_then(|v| metric_fraction(calculator, v)) {
            achieved += *points * fraction;
            possible += *points;
        }
        statuses.push(MetricStatus {
            calculator: calculator.clone(),
            completed: value.is_some(),
        });
    }

    let score = if possible.is_zero() {
        None
    } else {
        Some(round_points(achieved / possible * PILLAR_MAX))
    };
    PillarScore::new(pillar, score, statuses)
}

fn score_risk(metrics: &LatestMetrics<'_>, t: &RiskTuning) -> PillarScore {
    let statuses: Vec<MetricStatus> = Pillar::Risk
        .feeds()
        .into_iter()
        .map(|c| MetricStatus {
            completed: metrics.contains(&c),
            calculator: c,
        })
        .collect();

    if !RISK_FEEDS.iter().any(|c| metrics.contains(c)) {
        return PillarScore::new(Pillar::Risk, None, statuses);
    }

    let dso = metrics.value(&CalculatorType::Dso);
    let margin = metrics.value(&CalculatorType::Margin);
    let runway = metrics.value(&CalculatorType::BurnRate);
    let working_capital = metrics.value(&CalculatorType::WorkingCapital);

    let mut penalties = Vec::new();
    let mut add = |reason: String, points: Decimal, compound: bool| {
        penalties.push(RiskPenalty {
            reason,
            points,
            compound,
        })
    };

    if let Some(d) = dso.filter(|d| *d > t.dso_ceiling) {
        add(format!("DSO {d} days above {}", t.dso_ceiling), t.dso_penalty, false);
    }
    if let Some(m) = margin.filter(|m| *m < t.margin_floor) {
        add(format!("Margin {m}% below {}%", t.margin_floor), t.margin_penalty, false);
    }
    if let Some(r) = runway.filter(|r| *r < t.runway_floor) {
        add(format!("Runway {r} months below {}", t.runway_floor), t.runway_penalty, false);
    }
    if let Some(w) = working_capital.filter(|w| *w > t.working_capital_ceiling) {
        add(
            format!("Working-capital requirement {w} days above {}", t.working_capital_ceiling),
            t.working_capital_penalty,
            false,
        );
    }
    if let (Some(d), Some(m)) = (dso, margin) {
        if d > t.compound_dso && m < t.compound_margin {
            add(
                format!("DSO {d} days combined with margin {m}%"),
                t.compound_dso_margin_penalty,
                true,
            );
        }
    }
    if let (Some(r), Some(m)) = (runway, margin) {
        if r < t.compound_runway && m < t.compound_runway_margin {
            add(
                format!("Runway {r} months combined with margin {m}%"),
                t.compound_runway_margin_penalty,
                true,
            );
        }
    }

    let deducted = penalties
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.points))
        .unwrap_or(Decimal::MAX);
    let score = (PILLAR_MAX - deducted).max(Decimal::ZERO);

    let mut pillar = PillarScore::new(Pillar::Risk, Some(round_points(score)), statuses);
    pillar.penalties = penalties;
    pillar
}

fn round_points(x: Decimal) -> Decimal {
    x.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricResult;

    fn risk_score(results: &[MetricResult]) -> Option<Decimal> {
        let latest = LatestMetrics::from_results(results);
        score_pillar(Pillar::Risk, &latest, &RiskTuning::default()).score
    }

    #[test]
    fn test_no_metrics_every_pillar_is_none() {
        let latest = LatestMetrics::from_results(&[]);
        for p in score_pillars(&latest, &RiskTuning::default()) {
            assert_eq!(p.score, None, "{} should be unscored", p.pillar);
            assert_eq!(p.level, HealthLevel::Incomplete);
            assert!(p.metrics.iter().all(|m| !m.completed));
        }
    }

    #[test]
    fn test_all_metrics_best_case_is_full_marks() {
        let results = vec![
            MetricResult::new(CalculatorType::Dso, dec!(20)),
            MetricResult::new(CalculatorType::WorkingCapital, dec!(-5)),
            MetricResult::new(CalculatorType::BurnRate, dec!(30)),
            MetricResult::new(CalculatorType::Margin, dec!(25)),
            MetricResult::new(CalculatorType::Ebitda, dec!(30)),
            MetricResult::new(CalculatorType::BreakEven, dec!(0)),
            MetricResult::new(CalculatorType::CacLtv, dec!(4)),
            MetricResult::new(CalculatorType::Valuation, dec!(10)),
        ];
        let latest = LatestMetrics::from_results(&results);
        for p in score_pillars(&latest, &RiskTuning::default()) {
            assert_eq!(p.score, Some(dec!(25)), "{}", p.pillar);
            assert_eq!(p.level, HealthLevel::Excellent);
        }
    }

    #[test]
    fn test_all_metrics_worst_case_is_bounded() {
        let results = vec![
            MetricResult::new(CalculatorType::Dso, dec!(200)),
            MetricResult::new(CalculatorType::WorkingCapital, dec!(200)),
            MetricResult::new(CalculatorType::BurnRate, dec!(1)),
            MetricResult::new(CalculatorType::Margin, dec!(-40)),
            MetricResult::new(CalculatorType::Ebitda, dec!(-30)),
            MetricResult::new(CalculatorType::BreakEven, dec!(60)),
            MetricResult::new(CalculatorType::CacLtv, dec!(0.2)),
            MetricResult::new(CalculatorType::Valuation, dec!(1)),
        ];
        let latest = LatestMetrics::from_results(&results);
        for p in score_pillars(&latest, &RiskTuning::default()) {
            let s = p.score.unwrap();
            assert!(s >= Decimal::ZERO && s <= PILLAR_MAX, "{} = {s}", p.pillar);
        }
        // 25 - (6 + 6 + 6 + 4 + 5 + 4) floors at zero
        assert_eq!(risk_score(&results), Some(Decimal::ZERO));
    }

    #[test]
    fn test_partial_pillar_rescaled() {
        // DSO 42 => 0.7 of 10 points; only DSO evaluated => 7/10 * 25 = 17.5
        let results = vec![MetricResult::new(CalculatorType::Dso, dec!(42))];
        let latest = LatestMetrics::from_results(&results);
        let p = score_pillar(Pillar::Liquidity, &latest, &RiskTuning::default());
        assert_eq!(p.score, Some(dec!(17.5)));
        assert_eq!(p.level, HealthLevel::Good);
        assert_eq!(
            p.metrics.iter().filter(|m| m.completed).count(),
            1
        );
    }

    #[test]
    fn test_weighted_mix() {
        // DSO 20 => 10/10, WCR 45 => 4/10, runway 9 => 2/5: 16/25
        let results = vec![
            MetricResult::new(CalculatorType::Dso, dec!(20)),
            MetricResult::new(CalculatorType::WorkingCapital, dec!(45)),
            MetricResult::new(CalculatorType::BurnRate, dec!(9)),
        ];
        let latest = LatestMetrics::from_results(&results);
        let p = score_pillar(Pillar::Liquidity, &latest, &RiskTuning::default());
        assert_eq!(p.score, Some(dec!(16)));
    }

    #[test]
    fn test_burn_rate_alone_scores_liquidity_only() {
        let results = vec![MetricResult::new(CalculatorType::BurnRate, dec!(9))];
        let latest = LatestMetrics::from_results(&results);
        let pillars = score_pillars(&latest, &RiskTuning::default());
        assert_eq!(pillars[0].score, Some(dec!(10)));
        assert!(pillars[1..].iter().all(|p| p.score.is_none()));
    }

    #[test]
    fn test_step_boundaries_inclusive() {
        assert_eq!(score_dso(dec!(30)), Decimal::ONE);
        assert_eq!(score_dso(dec!(45)), dec!(0.7));
        assert_eq!(score_dso(dec!(60)), dec!(0.4));
        assert_eq!(score_dso(dec!(60.1)), dec!(0.1));
        assert_eq!(score_margin(dec!(10)), dec!(0.7));
        assert_eq!(score_ebitda(dec!(-0.1)), Decimal::ZERO);
        assert_eq!(score_break_even(dec!(0)), Decimal::ONE);
    }

    #[test]
    fn test_unknown_type_has_no_fraction() {
        assert_eq!(metric_fraction(&CalculatorType::Other("x".into()), dec!(1)), None);
    }

    #[test]
    fn test_risk_clean_profile_is_full() {
        let results = vec![
            MetricResult::new(CalculatorType::Dso, dec!(40)),
            MetricResult::new(CalculatorType::Margin, dec!(25)),
        ];
        assert_eq!(risk_score(&results), Some(dec!(25)));
    }

    #[test]
    fn test_compound_penalty_lower_than_single() {
        let dso_only = vec![
            MetricResult::new(CalculatorType::Dso, dec!(70)),
            MetricResult::new(CalculatorType::Margin, dec!(25)),
        ];
        let both = vec![
            MetricResult::new(CalculatorType::Dso, dec!(70)),
            MetricResult::new(CalculatorType::Margin, dec!(18)),
        ];
        let single = risk_score(&dso_only).unwrap();
        let compound = risk_score(&both).unwrap();
        assert_eq!(single, dec!(19));
        assert_eq!(compound, dec!(14));
        assert!(compound < single);
    }

    #[test]
    fn test_two_weaknesses_lower_than_either_alone() {
        let dso_weak = vec![
            MetricResult::new(CalculatorType::Dso, dec!(70)),
            MetricResult::new(CalculatorType::Margin, dec!(25)),
        ];
        let margin_weak = vec![
            MetricResult::new(CalculatorType::Dso, dec!(40)),
            MetricResult::new(CalculatorType::Margin, dec!(5)),
        ];
        let both_weak = vec![
            MetricResult::new(CalculatorType::Dso, dec!(70)),
            MetricResult::new(CalculatorType::Margin, dec!(5)),
        ];
        let both = risk_score(&both_weak).unwrap();
        assert!(both < risk_score(&dso_weak).unwrap());
        assert!(both < risk_score(&margin_weak).unwrap());
        // 25 - 6 - 6 - 5
        assert_eq!(both, dec!(8));
    }

    #[test]
    fn test_runway_alone_does_not_score_risk() {
        let results = vec![MetricResult::new(CalculatorType::BurnRate, dec!(3))];
        assert_eq!(risk_score(&results), None);
    }

    #[test]
    fn test_oversized_penalties_floor_at_zero() {
        let tuning = RiskTuning {
            runway_penalty: Decimal::MAX,
            working_capital_penalty: Decimal::MAX,
            ..RiskTuning::default()
        };
        let results = vec![
            MetricResult::new(CalculatorType::WorkingCapital, dec!(200)),
            MetricResult::new(CalculatorType::BurnRate, dec!(1)),
        ];
        let latest = LatestMetrics::from_results(&results);
        let p = score_pillar(Pillar::Risk, &latest, &tuning);
        assert_eq!(p.score, Some(Decimal::ZERO));
    }

    #[test]
    fn test_risk_statuses_list_runway() {
        let results = vec![
            MetricResult::new(CalculatorType::Dso, dec!(40)),
            MetricResult::new(CalculatorType::BurnRate, dec!(3)),
        ];
        let latest = LatestMetrics::from_results(&results);
        let p = score_pillar(Pillar::Risk, &latest, &RiskTuning::default());
        let listed: Vec<(CalculatorType, bool)> = p
            .metrics
            .iter()
            .map(|m| (m.calculator.clone(), m.completed))
            .collect();
        assert_eq!(
            listed,
            vec![
                (CalculatorType::Dso, true),
                (CalculatorType::Margin, false),
                (CalculatorType::WorkingCapital, false),
                (CalculatorType::BurnRate, true),
            ]
        );
        assert_eq!(Pillar::Risk.feeds().len(), 4);
        assert_eq!(Pillar::Risk.enablers().len(), 3);

        let alone = LatestMetrics::from_results(&results[1..]);
        let p = score_pillar(Pillar::Risk, &alone, &RiskTuning::default());
        assert_eq!(p.score, None);
        assert_eq!(p.metrics.iter().filter(|m| m.completed).count(), 1);
    }

    #[test]
    fn test_runway_penalises_scored_risk_pillar() {
        let results = vec![
            MetricResult::new(CalculatorType::Margin, dec!(8)),
            MetricResult::new(CalculatorType::BurnRate, dec!(3)),
        ];
        let latest = LatestMetrics::from_results(&results);
        let p = score_pillar(Pillar::Risk, &latest, &RiskTuning::default());
        // 25 - margin 6 - runway 6 - compound 4
        assert_eq!(p.score, Some(dec!(9)));
        assert_eq!(p.penalties.len(), 3);
        assert_eq!(p.penalties.iter().filter(|x| x.compound).count(), 1);
    }
}
