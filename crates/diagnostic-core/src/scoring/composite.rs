//! Composite diagnostic score.
//!
//! Sums the pillars that have data and rescales to a 100-point basis:
//! `total = round(sum / scored * 4)`. With all four pillars scored this is the
//! plain sum. Confidence reflects how many pillars contributed:
//! - 4 pillars: high
//! - 2-3 pillars: medium
//! - 0-1 pillar: low

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::pillars::{HealthLevel, Pillar, PillarScore};
use crate::types::Points;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_scored(pillars_scored: usize) -> Self {
        match pillars_scored {
            0 | 1 => Self::Low,
            2 | 3 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticScore {
    /// 0-100, `None` when no pillar has data.
    pub total: Option<Points>,
    pub level: HealthLevel,
    pub confidence: Confidence,
    pub pillars_scored: usize,
    pub pillars: Vec<PillarScore>,
}

impl DiagnosticScore {
    pub fn pillar(&self, pillar: Pillar) -> Option<&PillarScore> {
        self.pillars.iter().find(|p| p.pillar == pillar)
    }

    /// Pillars without any data.
    pub fn unscored(&self) -> Vec<Pillar> {
        self.pillars
            .iter()
            .filter(|p| !p.is_scored())
            .map(|p| p.pillar)
            .collect()
    }
}

/// Combine pillar scores into the composite.
pub fn aggregate(pillars: Vec<PillarScore>) -> DiagnosticScore {
    let scores: Vec<Points> = pillars.iter().filter_map(|p| p.score).collect();
    let pillars_scored = scores.len();

    let total = if scores.is_empty() {
        None
    } else {
        let sum: Decimal = scores.iter().copied().sum();
        let rescaled = sum / Decimal::from(pillars_scored as u64) * dec!(4);
        Some(rescaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    };

    DiagnosticScore {
        total,
        level: HealthLevel::from_score(total),
        confidence: Confidence::from_scored(pillars_scored),
        pillars_scored,
        pillars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pillar(p: Pillar, score: Option<Decimal>) -> PillarScore {
        PillarScore {
            pillar: p,
            score,
            level: HealthLevel::from_score(score.map(|s| s * dec!(4))),
            metrics: Vec::new(),
            penalties: Vec::new(),
        }
    }

    fn four(scores: [Option<Decimal>; 4]) -> Vec<PillarScore> {
        Pillar::ALL
            .iter()
            .zip(scores)
            .map(|(&p, s)| pillar(p, s))
            .collect()
    }

    #[test]
    fn test_no_pillars_is_incomplete() {
        let score = aggregate(four([None, None, None, None]));
        assert_eq!(score.total, None);
        assert_eq!(score.level, HealthLevel::Incomplete);
        assert_eq!(score.confidence, Confidence::Low);
        assert_eq!(score.unscored().len(), 4);
    }

    #[test]
    fn test_all_four_is_plain_sum() {
        let score = aggregate(four([
            Some(dec!(20)),
            Some(dec!(15)),
            Some(dec!(10)),
            Some(dec!(17.5)),
        ]));
        assert_eq!(score.total, Some(dec!(63)));
        assert_eq!(score.level, HealthLevel::Good);
        assert_eq!(score.confidence, Confidence::High);
    }

    #[test]
    fn test_single_pillar_rescaled_to_100() {
        let score = aggregate(four([Some(dec!(10)), None, None, None]));
        assert_eq!(score.total, Some(dec!(40)));
        assert_eq!(score.level, HealthLevel::Vigilance);
        assert_eq!(score.confidence, Confidence::Low);
    }

    #[test]
    fn test_two_pillars_medium_confidence() {
        // (20 + 19) / 2 * 4 = 78
        let score = aggregate(four([Some(dec!(20)), None, None, Some(dec!(19))]));
        assert_eq!(score.total, Some(dec!(78)));
        assert_eq!(score.level, HealthLevel::Excellent);
        assert_eq!(score.confidence, Confidence::Medium);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // (12.5 + 12.5 + 12.6) / 3 * 4 = 50.133.. => 50
        let score = aggregate(four([Some(dec!(12.5)), Some(dec!(12.5)), Some(dec!(12.6)), None]));
        assert_eq!(score.total, Some(dec!(50)));
        // 8.625 * 4 = 34.5 => 35
        let score = aggregate(four([Some(dec!(8.625)), None, None, None]));
        assert_eq!(score.total, Some(dec!(35)));
    }

    #[test]
    fn test_zero_pillar_is_not_null() {
        let score = aggregate(four([Some(Decimal::ZERO), None, None, None]));
        assert_eq!(score.total, Some(Decimal::ZERO));
        assert_eq!(score.level, HealthLevel::ActionRequired);
    }

    #[test]
    fn test_confidence_monotonic() {
        let mut previous = Confidence::Low;
        for n in 0..=4 {
            let c = Confidence::from_scored(n);
            assert!(c >= previous);
            previous = c;
        }
        assert_eq!(Confidence::from_scored(4), Confidence::High);
    }

    #[test]
    fn test_total_bounded_for_any_pillar_count() {
        for n in 1..=4 {
            let mut scores = [None; 4];
            for s in scores.iter_mut().take(n) {
                *s = Some(dec!(25));
            }
            let total = aggregate(four(scores)).total.unwrap();
            assert_eq!(total, dec!(100));
        }
    }
}
