//! Risk scoring
//!
//! Combines the heuristic flags and the threat-intel score into a bounded
//! 0-100 composite, then maps it to a discrete level by inclusive
//! thresholds. Score is monotonic non-decreasing in every contributing
//! flag. Threshold ordering (HIGH > MEDIUM) is validated at startup by
//! [`crate::config::Config::validate`].

use crate::config::ScoringConfig;
use crate::types::{DetectionFlags, RiskAssessment, RiskLevel, ThreatIntelMatch};

pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// score = clamp(0, 100, sum of fired weights + ti_score / 2)
    pub fn score(&self, flags: &DetectionFlags, intel: &ThreatIntelMatch) -> RiskAssessment {
        let w = &self.config.weights;
        let mut score: u32 = 0;

        if intel.matched {
            score += w.ti_match;
        }
        if flags.is_suspicious_port {
            score += w.suspicious_port;
        }
        if flags.is_big_transfer {
            score += w.big_transfer;
        }
        if flags.is_risky_extension {
            score += w.risky_extension;
        }
        score += intel.score as u32 / 2;

        let score = score.min(100) as u8;
        RiskAssessment {
            score,
            level: self.level(score),
        }
    }

    fn level(&self, score: u8) -> RiskLevel {
        if score >= self.config.high_threshold {
            RiskLevel::High
        } else if score >= self.config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> RiskScorer {
        RiskScorer::new(ScoringConfig::default())
    }

    fn all_flags() -> DetectionFlags {
        DetectionFlags {
            is_big_transfer: true,
            is_suspicious_port: true,
            is_risky_extension: true,
        }
    }

    fn ti_hit(score: u8) -> ThreatIntelMatch {
        ThreatIntelMatch {
            matched: true,
            label: "test".into(),
            score,
        }
    }

    #[test]
    fn three_flags_no_intel_scores_fifty_medium() {
        // 20 + 15 + 15 = 50 with the stock weights
        let risk = scorer().score(&all_flags(), &ThreatIntelMatch::default());
        assert_eq!(risk.score, 50);
        assert_eq!(risk.level, RiskLevel::Medium);
    }

    #[test]
    fn score_is_clamped_to_one_hundred() {
        // 50 + 50 + 45 would be 145
        let risk = scorer().score(&all_flags(), &ti_hit(90));
        assert_eq!(risk.score, 100);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn clean_flow_scores_zero_low() {
        let risk = scorer().score(&DetectionFlags::default(), &ThreatIntelMatch::default());
        assert_eq!(risk.score, 0);
        assert_eq!(risk.level, RiskLevel::Low);
    }

    #[test]
    fn level_thresholds_are_inclusive_lower_bounds() {
        let s = scorer();
        assert_eq!(s.level(70), RiskLevel::High);
        assert_eq!(s.level(69), RiskLevel::Medium);
        assert_eq!(s.level(40), RiskLevel::Medium);
        assert_eq!(s.level(39), RiskLevel::Low);
        assert_eq!(s.level(0), RiskLevel::Low);
        assert_eq!(s.level(100), RiskLevel::High);
    }

    #[test]
    fn ti_score_contributes_half_rounded_down() {
        let risk = scorer().score(&DetectionFlags::default(), &ti_hit(75));
        // 50 (ti_match weight) + 75/2 = 87
        assert_eq!(risk.score, 87);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn score_is_monotonic_in_each_flag() {
        let s = scorer();
        let base = s.score(&DetectionFlags::default(), &ThreatIntelMatch::default());
        for flags in [
            DetectionFlags { is_big_transfer: true, ..Default::default() },
            DetectionFlags { is_suspicious_port: true, ..Default::default() },
            DetectionFlags { is_risky_extension: true, ..Default::default() },
        ] {
            let scored = s.score(&flags, &ThreatIntelMatch::default());
            assert!(scored.score >= base.score);
        }
    }
}
