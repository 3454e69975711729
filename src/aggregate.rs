use std::fmt;

use serde::Serialize;

/// The five named suspicion scores, each already clamped to `[0, 1]` by
/// the analyzer that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSet {
    pub ela: f64,
    pub copy_move: f64,
    pub noise: f64,
    pub jpeg_artifacts: f64,
    pub edge_consistency: f64,
}

impl ScoreSet {
    pub fn mean(&self) -> f64 {
        (self.ela + self.copy_move + self.noise + self.jpeg_artifacts + self.edge_consistency)
            / 5.0
    }
}

/// Decision thresholds. The defaults are empirical, kept for behavioral
/// compatibility; they are tunables, not fundamental constants.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub forged: f64,
    pub high_confidence: f64,
    pub medium_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            forged: 0.6,
            high_confidence: 0.8,
            medium_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

/// One immutable verdict per invocation.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub scores: ScoreSet,
    pub overall_score: f64,
    pub is_likely_forged: bool,
    pub confidence: Confidence,
}

/// Combines the five independent scores. Pure and deterministic: identical
/// inputs always yield the identical report.
pub fn aggregate(scores: ScoreSet, thresholds: &Thresholds) -> AnalysisReport {
    let overall_score = scores.mean();

    let confidence = if overall_score > thresholds.high_confidence {
        Confidence::High
    } else if overall_score > thresholds.medium_confidence {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    AnalysisReport {
        scores,
        overall_score,
        is_likely_forged: overall_score > thresholds.forged,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: f64) -> ScoreSet {
        ScoreSet {
            ela: value,
            copy_move: value,
            noise: value,
            jpeg_artifacts: value,
            edge_consistency: value,
        }
    }

    #[test]
    fn overall_is_arithmetic_mean() {
        let scores = ScoreSet {
            ela: 0.1,
            copy_move: 0.2,
            noise: 0.3,
            jpeg_artifacts: 0.4,
            edge_consistency: 0.5,
        };
        let report = aggregate(scores, &Thresholds::default());

        assert!((report.overall_score - 0.3).abs() < 1e-12);
        assert!((report.overall_score - report.scores.mean()).abs() < 1e-12);
    }

    #[test]
    fn forged_threshold_is_strict() {
        let thresholds = Thresholds::default();

        assert!(!aggregate(uniform(0.6), &thresholds).is_likely_forged);
        assert!(aggregate(uniform(0.61), &thresholds).is_likely_forged);
    }

    #[test]
    fn confidence_tiers() {
        let thresholds = Thresholds::default();

        assert_eq!(aggregate(uniform(0.9), &thresholds).confidence, Confidence::High);
        assert_eq!(aggregate(uniform(0.8), &thresholds).confidence, Confidence::Medium);
        assert_eq!(aggregate(uniform(0.6), &thresholds).confidence, Confidence::Medium);
        assert_eq!(aggregate(uniform(0.5), &thresholds).confidence, Confidence::Low);
        assert_eq!(aggregate(uniform(0.0), &thresholds).confidence, Confidence::Low);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let scores = uniform(0.42);
        let thresholds = Thresholds::default();

        let first = aggregate(scores, &thresholds);
        let second = aggregate(scores, &thresholds);

        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.is_likely_forged, second.is_likely_forged);
        assert_eq!(first.confidence, second.confidence);
    }
}
