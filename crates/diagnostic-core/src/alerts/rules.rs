//! The alert rule battery.
//!
//! Every rule runs on every diagnostic and emits at most one alert:
//! 1. **Single-metric** -- one calculator past a warning or critical line,
//!    with a monetary impact when the calculator supplied the inputs.
//! 2. **Compound** -- two weaknesses that only matter together.
//! 3. **Coverage** -- too few calculators, or pillars left without data.
//! 4. **Opportunity** -- one alert per benchmark in the top tier.
//!
//! Nothing is deduplicated. The result is stably ordered critical, warning,
//! info.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::impact::{self, format_money};
use super::{Alert, AlertLink, Severity};
use crate::benchmark::{BenchmarkLevel, BenchmarkResult};
use crate::config::DiagnosticConfig;
use crate::metrics::LatestMetrics;
use crate::scoring::{DiagnosticScore, Pillar};
use crate::types::CalculatorType;

const DSO_CRITICAL: Decimal = dec!(60);
const DSO_WARNING: Decimal = dec!(45);
const DSO_NORM: Decimal = dec!(45);

const MARGIN_CRITICAL: Decimal = dec!(10);
const MARGIN_WARNING: Decimal = dec!(15);

const RUNWAY_CRITICAL: Decimal = dec!(6);
const RUNWAY_WARNING: Decimal = dec!(12);
const RUNWAY_TARGET: Decimal = dec!(12);

const WORKING_CAPITAL_WARNING: Decimal = dec!(60);
const WORKING_CAPITAL_NORM: Decimal = dec!(30);

const LTV_CAC_CRITICAL: Decimal = dec!(1);
const LTV_CAC_WARNING: Decimal = dec!(3);

const BREAK_EVEN_WARNING: Decimal = dec!(24);

/// Everything the rules read. Nothing here is mutated.
pub struct AlertContext<'a> {
    pub metrics: &'a LatestMetrics<'a>,
    pub benchmarks: &'a [BenchmarkResult],
    pub score: &'a DiagnosticScore,
    pub config: &'a DiagnosticConfig,
}

type Rule = fn(&AlertContext<'_>) -> Option<Alert>;

const RULES: &[Rule] = &[
    dso_rule,
    margin_rule,
    runway_rule,
    working_capital_rule,
    ltv_cac_rule,
    ebitda_rule,
    break_even_rule,
    dso_margin_rule,
    runway_ebitda_rule,
    ltv_cac_runway_rule,
    coverage_rule,
    pillar_gap_rule,
];

/// Run the full battery and order the alerts by severity.
pub fn generate_alerts(ctx: &AlertContext<'_>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = RULES.iter().filter_map(|rule| rule(ctx)).collect();
    alerts.extend(ctx.benchmarks.iter().filter_map(opportunity));
    alerts.sort_by_key(|a| a.severity);

    debug!(
        total = alerts.len(),
        critical = alerts.iter().filter(|a| a.severity == Severity::Critical).count(),
        "alerts generated"
    );
    alerts
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn calculator_link(calculator: &CalculatorType) -> AlertLink {
    AlertLink {
        label: format!("{} calculator", calculator.label()),
        target: format!("/calculators/{}", calculator.key()),
    }
}

fn guide_link(label: &str, slug: &str) -> AlertLink {
    AlertLink {
        label: label.to_string(),
        target: format!("/guides/{slug}"),
    }
}

/// The pillar a calculator is primarily read under.
fn home_pillar(calculator: &CalculatorType) -> Option<Pillar> {
    match calculator {
        CalculatorType::Dso | CalculatorType::WorkingCapital | CalculatorType::BurnRate => {
            Some(Pillar::Liquidity)
        }
        CalculatorType::Margin | CalculatorType::Ebitda | CalculatorType::BreakEven => {
            Some(Pillar::Profitability)
        }
        CalculatorType::CacLtv | CalculatorType::Valuation => Some(Pillar::Resilience),
        CalculatorType::Other(_) => None,
    }
}

fn labels(calculators: &[CalculatorType]) -> String {
    calculators
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Single-metric rules
// ---------------------------------------------------------------------------

fn dso_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let m = ctx.metrics.get(&CalculatorType::Dso)?;
    let days = m.value;
    let severity = if days > DSO_CRITICAL {
        Severity::Critical
    } else if days > DSO_WARNING {
        Severity::Warning
    } else {
        return None;
    };

    let impact = impact::excess_days_cash(days, DSO_NORM, impact::revenue(m)).map(|cash| {
        format!(
            "{} of cash tied up in receivables beyond a {DSO_NORM}-day collection norm",
            format_money(cash, &ctx.config.currency)
        )
    });

    Some(Alert {
        severity,
        pillar: Some(Pillar::Liquidity),
        metric: Some(CalculatorType::Dso),
        title: format!("Customers take {} days to pay", days.normalize()),
        description: format!(
            "Receivables are collected after {} days on average, past the {} threshold of {} days.",
            days.normalize(),
            severity.label(),
            if severity == Severity::Critical { DSO_CRITICAL } else { DSO_WARNING }
        ),
        impact,
        action: "Shorten payment terms on new contracts, invoice on delivery and run a \
                 weekly dunning routine on invoices past due."
            .into(),
        links: vec![
            calculator_link(&CalculatorType::Dso),
            guide_link("Reducing customer payment delays", "reduce-dso"),
        ],
    })
}

fn margin_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let m = ctx.metrics.get(&CalculatorType::Margin)?;
    let pct = m.value;
    let severity = if pct < MARGIN_CRITICAL {
        Severity::Critical
    } else if pct < MARGIN_WARNING {
        Severity::Warning
    } else {
        return None;
    };

    let floor = if severity == Severity::Critical {
        MARGIN_CRITICAL
    } else {
        MARGIN_WARNING
    };
    let impact = impact::margin_shortfall(pct, floor, impact::revenue(m)).map(|gap| {
        format!(
            "{} of annual profit missing versus a {floor}% margin",
            format_money(gap, &ctx.config.currency)
        )
    });

    Some(Alert {
        severity,
        pillar: Some(Pillar::Profitability),
        metric: Some(CalculatorType::Margin),
        title: format!("Net margin of {}%", pct.normalize()),
        description: format!(
            "The business keeps {}% of revenue as profit, below the {floor}% floor needed to absorb \
             a downturn or fund growth.",
            pct.normalize()
        ),
        impact,
        action: "Review pricing on the lowest-margin offers first, then renegotiate the three \
                 largest purchasing lines."
            .into(),
        links: vec![
            calculator_link(&CalculatorType::Margin),
            guide_link("Pricing for margin", "pricing-for-margin"),
        ],
    })
}

fn runway_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let m = ctx.metrics.get(&CalculatorType::BurnRate)?;
    let months = m.value;
    let severity = if months < RUNWAY_CRITICAL {
        Severity::Critical
    } else if months < RUNWAY_WARNING {
        Severity::Warning
    } else {
        return None;
    };

    let impact = impact::runway_gap(months, RUNWAY_TARGET, impact::monthly_burn(m)).map(|gap| {
        format!(
            "{} of funding needed to restore {RUNWAY_TARGET} months of runway",
            format_money(gap, &ctx.config.currency)
        )
    });

    Some(Alert {
        severity,
        pillar: Some(Pillar::Liquidity),
        metric: Some(CalculatorType::BurnRate),
        title: format!("{} months of cash runway", months.normalize()),
        description: format!(
            "At the current burn the cash position lasts {} months; fundraising or credit lines \
             typically take six months to close.",
            months.normalize()
        ),
        impact,
        action: "Start financing discussions now and freeze non-essential spending until \
                 runway is back above twelve months."
            .into(),
        links: vec![calculator_link(&CalculatorType::BurnRate)],
    })
}

fn working_capital_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let m = ctx.metrics.get(&CalculatorType::WorkingCapital)?;
    let days = m.value;
    if days <= WORKING_CAPITAL_WARNING {
        return None;
    }

    let impact = impact::excess_days_cash(days, WORKING_CAPITAL_NORM, impact::revenue(m)).map(|cash| {
        format!(
            "{} absorbed by the operating cycle above a {WORKING_CAPITAL_NORM}-day requirement",
            format_money(cash, &ctx.config.currency)
        )
    });

    Some(Alert {
        severity: Severity::Warning,
        pillar: Some(Pillar::Liquidity),
        metric: Some(CalculatorType::WorkingCapital),
        title: format!("Working capital ties up {} days of revenue", days.normalize()),
        description: "Stock and receivables outweigh supplier credit; growth will consume \
                      cash faster than it generates it."
            .into(),
        impact,
        action: "Reduce slow-moving stock and align supplier payment terms with customer terms."
            .into(),
        links: vec![calculator_link(&CalculatorType::WorkingCapital)],
    })
}

fn ltv_cac_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let ratio = ctx.metrics.value(&CalculatorType::CacLtv)?;
    let severity = if ratio < LTV_CAC_CRITICAL {
        Severity::Critical
    } else if ratio < LTV_CAC_WARNING {
        Severity::Warning
    } else {
        return None;
    };

    Some(Alert {
        severity,
        pillar: Some(Pillar::Resilience),
        metric: Some(CalculatorType::CacLtv),
        title: format!("Customer lifetime value is {}x acquisition cost", ratio.normalize()),
        description: if severity == Severity::Critical {
            "Each new customer costs more to acquire than it will ever bring in.".into()
        } else {
            "Acquisition spend is recovered too slowly for growth to fund itself.".into()
        },
        impact: None,
        action: "Cut the most expensive acquisition channels and work on retention before \
                 scaling marketing spend."
            .into(),
        links: vec![calculator_link(&CalculatorType::CacLtv)],
    })
}

fn ebitda_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let m = ctx.metrics.get(&CalculatorType::Ebitda)?;
    if m.value >= Decimal::ZERO {
        return None;
    }

    let impact = impact::operating_loss(m.value, impact::revenue(m)).map(|loss| {
        format!(
            "{} of annual operating loss",
            format_money(loss, &ctx.config.currency)
        )
    });

    Some(Alert {
        severity: Severity::Critical,
        pillar: Some(Pillar::Profitability),
        metric: Some(CalculatorType::Ebitda),
        title: format!("Negative EBITDA margin ({}%)", m.value.normalize()),
        description: "Operations consume cash before any financing or investment cost.".into(),
        impact,
        action: "Identify the loss-making activities and set a dated plan to bring operating \
                 costs under revenue."
            .into(),
        links: vec![calculator_link(&CalculatorType::Ebitda)],
    })
}

fn break_even_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let months = ctx.metrics.value(&CalculatorType::BreakEven)?;
    if months <= BREAK_EVEN_WARNING {
        return None;
    }

    Some(Alert {
        severity: Severity::Warning,
        pillar: Some(Pillar::Profitability),
        metric: Some(CalculatorType::BreakEven),
        title: format!("Break-even is {} months away", months.normalize()),
        description: format!(
            "Reaching break-even takes more than {BREAK_EVEN_WARNING} months, which exposes the \
             business to every assumption going wrong."
        ),
        impact: None,
        action: "Rework the plan with lower fixed costs or a faster price ramp and check the \
                 financing covers the gap."
            .into(),
        links: vec![calculator_link(&CalculatorType::BreakEven)],
    })
}

// ---------------------------------------------------------------------------
// Compound rules
// ---------------------------------------------------------------------------

fn dso_margin_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let dso = ctx.metrics.get(&CalculatorType::Dso)?;
    let margin = ctx.metrics.value(&CalculatorType::Margin)?;
    let tuning = &ctx.config.risk;
    if !(dso.value > tuning.compound_dso && margin < tuning.compound_margin) {
        return None;
    }

    let impact = impact::excess_days_cash(dso.value, DSO_NORM, impact::revenue(dso)).map(|cash| {
        format!(
            "{} of receivables that a {}% margin cannot finance",
            format_money(cash, &ctx.config.currency),
            margin.normalize()
        )
    });

    Some(Alert {
        severity: Severity::Critical,
        pillar: Some(Pillar::Risk),
        metric: Some(CalculatorType::Dso),
        title: "Slow collection on thin margins".into(),
        description: format!(
            "Customers pay after {} days while the margin is {}%: the business finances its \
             customers with profit it does not have.",
            dso.value.normalize(),
            margin.normalize()
        ),
        impact,
        action: "Secure a receivables financing line and prioritise collection of the largest \
                 outstanding invoices."
            .into(),
        links: vec![
            calculator_link(&CalculatorType::Dso),
            calculator_link(&CalculatorType::Margin),
        ],
    })
}

fn runway_ebitda_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let runway = ctx.metrics.get(&CalculatorType::BurnRate)?;
    let ebitda = ctx.metrics.value(&CalculatorType::Ebitda)?;
    if !(runway.value < RUNWAY_WARNING && ebitda < Decimal::ZERO) {
        return None;
    }

    let impact = impact::runway_gap(runway.value, RUNWAY_TARGET, impact::monthly_burn(runway))
        .map(|gap| {
            format!(
                "{} needed before operations turn cash-positive",
                format_money(gap, &ctx.config.currency)
            )
        });

    Some(Alert {
        severity: Severity::Critical,
        pillar: Some(Pillar::Risk),
        metric: Some(CalculatorType::BurnRate),
        title: "Short runway with loss-making operations".into(),
        description: format!(
            "{} months of cash remain and operations lose money, so the runway will not extend \
             on its own.",
            runway.value.normalize()
        ),
        impact,
        action: "Combine a cost-reduction plan with an immediate financing round or bridge loan."
            .into(),
        links: vec![
            calculator_link(&CalculatorType::BurnRate),
            calculator_link(&CalculatorType::Ebitda),
        ],
    })
}

fn ltv_cac_runway_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let ratio = ctx.metrics.value(&CalculatorType::CacLtv)?;
    let runway = ctx.metrics.value(&CalculatorType::BurnRate)?;
    if !(ratio < LTV_CAC_WARNING && runway < RUNWAY_WARNING) {
        return None;
    }

    Some(Alert {
        severity: Severity::Warning,
        pillar: Some(Pillar::Resilience),
        metric: Some(CalculatorType::CacLtv),
        title: "Growth spending outpaces runway".into(),
        description: format!(
            "Acquisition pays back at {}x while only {} months of cash remain.",
            ratio.normalize(),
            runway.normalize()
        ),
        impact: None,
        action: "Shift budget from acquisition to retention until runway exceeds twelve months."
            .into(),
        links: vec![
            calculator_link(&CalculatorType::CacLtv),
            calculator_link(&CalculatorType::BurnRate),
        ],
    })
}

// ---------------------------------------------------------------------------
// Coverage rules
// ---------------------------------------------------------------------------

fn coverage_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    let completed = ctx.metrics.completed_count();
    if completed >= ctx.config.coverage_threshold {
        return None;
    }
    let missing = ctx.metrics.missing();
    let next: Vec<CalculatorType> = missing.iter().take(3).cloned().collect();

    Some(Alert {
        severity: Severity::Info,
        pillar: None,
        metric: None,
        title: format!(
            "Diagnostic based on {completed} of {} analyses",
            CalculatorType::KNOWN.len()
        ),
        description: "Too few calculations have been completed for the score to be reliable."
            .into(),
        impact: None,
        action: format!("Complete these analyses next: {}.", labels(&next)),
        links: next.iter().map(calculator_link).collect(),
    })
}

fn pillar_gap_rule(ctx: &AlertContext<'_>) -> Option<Alert> {
    if ctx.metrics.completed_count() < ctx.config.coverage_threshold {
        return None;
    }
    let unscored = ctx.score.unscored();
    if unscored.is_empty() {
        return None;
    }

    let mut needed: Vec<CalculatorType> = Vec::new();
    for pillar in &unscored {
        for feed in pillar.enablers() {
            if !ctx.metrics.contains(&feed) && !needed.contains(&feed) {
                needed.push(feed);
            }
        }
    }
    let names: Vec<&str> = unscored.iter().map(|p| p.label()).collect();

    Some(Alert {
        severity: Severity::Info,
        pillar: unscored.first().copied(),
        metric: None,
        title: format!("No data for: {}", names.join(", ")),
        description: format!(
            "The score is computed on {} of 4 pillars and rescaled; confidence is {}.",
            ctx.score.pillars_scored,
            ctx.score.confidence.label()
        ),
        impact: None,
        action: format!("Complete {} to cover every pillar.", labels(&needed)),
        links: needed.iter().map(calculator_link).collect(),
    })
}

// ---------------------------------------------------------------------------
// Opportunity alerts
// ---------------------------------------------------------------------------

fn opportunity(benchmark: &BenchmarkResult) -> Option<Alert> {
    if benchmark.level != BenchmarkLevel::Excellent {
        return None;
    }
    Some(Alert {
        severity: Severity::Info,
        pillar: home_pillar(&benchmark.metric),
        metric: Some(benchmark.metric.clone()),
        title: format!("{} among the best in the sector", benchmark.metric.label()),
        description: benchmark.interpretation.clone(),
        impact: None,
        action: "Use this strength as an argument with lenders, investors and acquirers, and \
                 protect the practices behind it."
            .into(),
        links: Vec::new(),
    })
}
