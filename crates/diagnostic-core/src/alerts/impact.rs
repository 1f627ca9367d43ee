//! Monetary impact estimates attached to alerts.
//!
//! Every estimate needs specific calculator inputs. When they are missing or
//! not positive, or the figure would overflow a `Decimal`, the estimate is
//! `None` and the alert simply carries no impact.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::types::{MetricResult, Money};

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Annual revenue from a result's inputs, if supplied and positive.
pub fn revenue(metric: &MetricResult) -> Option<Money> {
    metric
        .input("revenue")
        .or_else(|| metric.input("annual_revenue"))
        .filter(|r| *r > Decimal::ZERO)
}

/// Monthly net cash burn from a runway result's inputs.
pub fn monthly_burn(metric: &MetricResult) -> Option<Money> {
    metric
        .input("monthly_burn")
        .or_else(|| metric.input("burn"))
        .map(|b| b.abs())
        .filter(|b| *b > Decimal::ZERO)
}

/// Cash absorbed by `days` of revenue beyond `norm_days`.
pub fn excess_days_cash(days: Decimal, norm_days: Decimal, revenue: Option<Money>) -> Option<Money> {
    let revenue = revenue?;
    if days <= norm_days {
        return None;
    }
    days.checked_sub(norm_days)?
        .checked_mul(revenue)?
        .checked_div(DAYS_PER_YEAR)
}

/// Profit missing versus a margin floor (both in percent).
pub fn margin_shortfall(margin_pct: Decimal, floor_pct: Decimal, revenue: Option<Money>) -> Option<Money> {
    let revenue = revenue?;
    if margin_pct >= floor_pct {
        return None;
    }
    floor_pct
        .checked_sub(margin_pct)?
        .checked_div(dec!(100))?
        .checked_mul(revenue)
}

/// Funding needed to bring runway back to `target_months`.
pub fn runway_gap(runway_months: Decimal, target_months: Decimal, burn: Option<Money>) -> Option<Money> {
    let burn = burn?;
    if runway_months >= target_months {
        return None;
    }
    target_months
        .checked_sub(runway_months.max(Decimal::ZERO))?
        .checked_mul(burn)
}

/// Annual operating loss implied by a negative EBITDA margin.
pub fn operating_loss(ebitda_pct: Decimal, revenue: Option<Money>) -> Option<Money> {
    let revenue = revenue?;
    if ebitda_pct >= Decimal::ZERO {
        return None;
    }
    (-ebitda_pct).checked_div(dec!(100))?.checked_mul(revenue)
}

/// `EUR 49,315`: whole units, thousands separated by commas.
pub fn format_money(amount: Money, currency: &str) -> String {
    let rounded = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .abs()
        .normalize();
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < Decimal::ZERO && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{currency} {grouped}")
}
