//! Built-in sector reference tables.
//!
//! Values are hand-curated observations for small and mid-sized companies.
//! Every metric has a `general` row; sector rows exist only where the sector
//! departs materially from it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{CalculatorType, Sector};

use super::thresholds::{Direction, SectorThresholds, ThresholdEntry};

const DAYS: &str = "days";
const PERCENT: &str = "%";
const MONTHS: &str = "months";
const RATIO: &str = "x";

fn row(
    metric: CalculatorType,
    sector: Sector,
    breakpoints: [Decimal; 4],
    unit: &str,
    direction: Direction,
) -> ThresholdEntry {
    let [excellent, median, warning, critical] = breakpoints;
    ThresholdEntry {
        metric,
        sector,
        thresholds: SectorThresholds {
            excellent,
            median,
            warning,
            critical,
            unit: unit.to_string(),
            direction,
        },
    }
}

fn lower(metric: CalculatorType, sector: Sector, bp: [Decimal; 4], unit: &str) -> ThresholdEntry {
    row(metric, sector, bp, unit, Direction::LowerIsBetter)
}

fn higher(metric: CalculatorType, sector: Sector, bp: [Decimal; 4], unit: &str) -> ThresholdEntry {
    row(metric, sector, bp, unit, Direction::HigherIsBetter)
}

pub(crate) fn builtin_entries() -> Vec<ThresholdEntry> {
    use CalculatorType::*;

    vec![
        // DSO (days)
        lower(Dso, Sector::General, [dec!(30), dec!(45), dec!(60), dec!(90)], DAYS),
        lower(Dso, Sector::Saas, [dec!(25), dec!(40), dec!(60), dec!(90)], DAYS),
        lower(Dso, Sector::Retail, [dec!(5), dec!(15), dec!(30), dec!(45)], DAYS),
        lower(Dso, Sector::Manufacturing, [dec!(45), dec!(60), dec!(75), dec!(100)], DAYS),
        lower(Dso, Sector::Services, [dec!(30), dec!(50), dec!(70), dec!(100)], DAYS),
        lower(Dso, Sector::Construction, [dec!(45), dec!(60), dec!(90), dec!(120)], DAYS),
        lower(Dso, Sector::Hospitality, [dec!(3), dec!(10), dec!(20), dec!(30)], DAYS),
        // Net margin (%)
        higher(Margin, Sector::General, [dec!(12), dec!(6), dec!(2), dec!(0)], PERCENT),
        higher(Margin, Sector::Saas, [dec!(20), dec!(10), dec!(3), dec!(0)], PERCENT),
        higher(Margin, Sector::Retail, [dec!(5), dec!(2.5), dec!(1), dec!(0)], PERCENT),
        higher(Margin, Sector::Manufacturing, [dec!(10), dec!(5), dec!(2), dec!(0)], PERCENT),
        higher(Margin, Sector::Services, [dec!(15), dec!(8), dec!(3), dec!(0)], PERCENT),
        higher(Margin, Sector::Construction, [dec!(6), dec!(3), dec!(1), dec!(0)], PERCENT),
        higher(Margin, Sector::Hospitality, [dec!(8), dec!(4), dec!(1), dec!(0)], PERCENT),
        // EBITDA margin (%)
        higher(Ebitda, Sector::General, [dec!(20), dec!(12), dec!(5), dec!(0)], PERCENT),
        higher(Ebitda, Sector::Saas, [dec!(30), dec!(15), dec!(5), dec!(-10)], PERCENT),
        higher(Ebitda, Sector::Retail, [dec!(8), dec!(5), dec!(2), dec!(0)], PERCENT),
        higher(Ebitda, Sector::Manufacturing, [dec!(15), dec!(10), dec!(5), dec!(0)], PERCENT),
        higher(Ebitda, Sector::Hospitality, [dec!(15), dec!(10), dec!(5), dec!(0)], PERCENT),
        // Working-capital requirement (days of revenue)
        lower(WorkingCapital, Sector::General, [dec!(-10), dec!(30), dec!(60), dec!(90)], DAYS),
        lower(WorkingCapital, Sector::Saas, [dec!(-30), dec!(0), dec!(20), dec!(45)], DAYS),
        lower(WorkingCapital, Sector::Retail, [dec!(-20), dec!(0), dec!(20), dec!(45)], DAYS),
        lower(WorkingCapital, Sector::Manufacturing, [dec!(20), dec!(45), dec!(75), dec!(110)], DAYS),
        lower(WorkingCapital, Sector::Services, [dec!(10), dec!(30), dec!(50), dec!(80)], DAYS),
        lower(WorkingCapital, Sector::Construction, [dec!(0), dec!(25), dec!(50), dec!(80)], DAYS),
        lower(WorkingCapital, Sector::Hospitality, [dec!(-15), dec!(-5), dec!(10), dec!(25)], DAYS),
        // Cash runway (months)
        higher(BurnRate, Sector::General, [dec!(24), dec!(12), dec!(6), dec!(3)], MONTHS),
        higher(BurnRate, Sector::Saas, [dec!(24), dec!(18), dec!(9), dec!(4)], MONTHS),
        // LTV / CAC
        higher(CacLtv, Sector::General, [dec!(5), dec!(3), dec!(2), dec!(1)], RATIO),
        higher(CacLtv, Sector::Saas, [dec!(5), dec!(3), dec!(1.5), dec!(1)], RATIO),
    ]
}
