//! Synthesized analysis — deterministic-shape report drawn from fixed ranges.
//!
//! Every numeric range here is part of the component's contract: the overall
//! score lands in `OVERALL_SCORE_RANGE`, sub-scores stay within
//! `SUB_SCORE_JITTER` of the overall score (clamped to 0..=100), and the
//! sentiment split stays inside its per-channel bounds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::analysis::InterviewAnalyzer;
use crate::errors::AppError;
use crate::models::interview::{
    Interview, InterviewAnalysis, SentimentBreakdown, SpeechMetrics, SubMetric,
};

// ────────────────────────────────────────────────────────────────────────────
// Synthesis constants
// ────────────────────────────────────────────────────────────────────────────

pub const OVERALL_SCORE_RANGE: std::ops::RangeInclusive<i32> = 70..=94;
pub const SUB_SCORE_JITTER: i32 = 5;
pub const SENTIMENT_POSITIVE_RANGE: std::ops::Range<f64> = 0.60..0.90;
pub const SENTIMENT_NEUTRAL_RANGE: std::ops::Range<f64> = 0.20..0.40;
pub const SENTIMENT_NEGATIVE_RANGE: std::ops::Range<f64> = 0.05..0.20;
pub const AVG_RESPONSE_TIME_RANGE: std::ops::RangeInclusive<i64> = 5..=14;
pub const FILLER_WORDS_RANGE: std::ops::RangeInclusive<i64> = 5..=19;
/// Fraction of the scheduled slot the candidate is assumed to have spoken.
pub const SPEAKING_TIME_FRACTION: f64 = 0.6;

pub const EXCELLENT_THRESHOLD: f64 = 85.0;
pub const GOOD_THRESHOLD: f64 = 75.0;

const KEYWORDS: &[&str] = &["problem-solving", "communication", "teamwork"];

const STRENGTHS: &[&str] = &[
    "Good technical knowledge",
    "Clear communication",
    "Professional demeanor",
    "Problem-solving ability",
];

const WEAKNESSES: &[&str] = &[
    "Could provide more specific examples",
    "Time management in responses",
];

const RECOMMENDATIONS: &[&str] = &[
    "Practice STAR method for behavioral questions",
    "Work on providing more detailed technical explanations",
];

const EYE_CONTACT_FEEDBACK: &str = "Maintained good eye contact throughout the interview";
const BODY_LANGUAGE_FEEDBACK: &str = "Professional posture and gestures";
const SPEAKING_PACE_FEEDBACK: &str = "Clear and well-paced communication";

const SUMMARY: &str = "The candidate demonstrated good understanding of the role requirements \
     and communicated effectively throughout the interview.";

const DETAILED_FEEDBACK: &str = "Overall, the candidate performed well. Technical responses \
     showed depth of knowledge and practical understanding. Communication was clear and \
     professional.";

// ────────────────────────────────────────────────────────────────────────────
// Synthesis
// ────────────────────────────────────────────────────────────────────────────

/// Maps an overall score to the response-quality label.
pub fn quality_for(overall_score: f64) -> &'static str {
    if overall_score >= EXCELLENT_THRESHOLD {
        "excellent"
    } else if overall_score >= GOOD_THRESHOLD {
        "good"
    } else {
        "average"
    }
}

fn jittered(rng: &mut impl Rng, base: i32) -> f64 {
    (base + rng.gen_range(-SUB_SCORE_JITTER..SUB_SCORE_JITTER)).clamp(0, 100) as f64
}

fn sub_metric(rng: &mut impl Rng, base: i32, feedback: &str) -> SubMetric {
    SubMetric {
        score: jittered(rng, base),
        feedback: feedback.to_string(),
    }
}

/// Draws one synthesized report. Seedable through `rng` so tests can pin
/// the draw.
pub fn synthesize(
    rng: &mut impl Rng,
    duration_minutes: i32,
    now: DateTime<Utc>,
) -> InterviewAnalysis {
    let base = rng.gen_range(OVERALL_SCORE_RANGE);
    let overall_score = base as f64;

    InterviewAnalysis {
        overall_score,
        communication_score: jittered(rng, base),
        technical_score: jittered(rng, base),
        confidence_score: jittered(rng, base),
        sentiment: SentimentBreakdown {
            positive: rng.gen_range(SENTIMENT_POSITIVE_RANGE),
            neutral: rng.gen_range(SENTIMENT_NEUTRAL_RANGE),
            negative: rng.gen_range(SENTIMENT_NEGATIVE_RANGE),
        },
        keywords: KEYWORDS.iter().map(|s| s.to_string()).collect(),
        strengths: STRENGTHS.iter().map(|s| s.to_string()).collect(),
        weaknesses: WEAKNESSES.iter().map(|s| s.to_string()).collect(),
        recommendations: RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        eye_contact: sub_metric(rng, base, EYE_CONTACT_FEEDBACK),
        body_language: sub_metric(rng, base, BODY_LANGUAGE_FEEDBACK),
        speaking_pace: sub_metric(rng, base, SPEAKING_PACE_FEEDBACK),
        speech_metrics: SpeechMetrics {
            total_speaking_time_secs: f64::from(duration_minutes) * 60.0 * SPEAKING_TIME_FRACTION,
            avg_response_time_secs: rng.gen_range(AVG_RESPONSE_TIME_RANGE) as f64,
            filler_words_count: rng.gen_range(FILLER_WORDS_RANGE),
        },
        response_quality: quality_for(overall_score).to_string(),
        summary: SUMMARY.to_string(),
        detailed_feedback: DETAILED_FEEDBACK.to_string(),
        generated_at: now,
    }
}

/// Strategy that always synthesizes. The default.
pub struct SynthesizedAnalyzer;

#[async_trait]
impl InterviewAnalyzer for SynthesizedAnalyzer {
    async fn analyze(
        &self,
        interview: &Interview,
        _job_title: &str,
        _candidate_name: &str,
    ) -> Result<InterviewAnalysis, AppError> {
        Ok(synthesize(
            &mut rand::thread_rng(),
            interview.duration_minutes,
            Utc::now(),
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_overall_score_stays_in_range() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let report = synthesize(&mut rng, 30, Utc::now());
            assert!(
                OVERALL_SCORE_RANGE.contains(&(report.overall_score as i32)),
                "seed {seed}: overall {} out of range",
                report.overall_score
            );
        }
    }

    #[test]
    fn test_sub_scores_stay_within_jitter_of_overall() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let report = synthesize(&mut rng, 30, Utc::now());
            for sub in [
                report.communication_score,
                report.technical_score,
                report.confidence_score,
            ] {
                assert!(
                    (sub - report.overall_score).abs() <= f64::from(SUB_SCORE_JITTER),
                    "seed {seed}: sub {sub} strays more than {SUB_SCORE_JITTER} from {}",
                    report.overall_score
                );
                assert!((0.0..=100.0).contains(&sub));
            }
        }
    }

    #[test]
    fn test_sentiment_channels_stay_in_bounds() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let report = synthesize(&mut rng, 30, Utc::now());
            assert!(SENTIMENT_POSITIVE_RANGE.contains(&report.sentiment.positive));
            assert!(SENTIMENT_NEUTRAL_RANGE.contains(&report.sentiment.neutral));
            assert!(SENTIMENT_NEGATIVE_RANGE.contains(&report.sentiment.negative));
        }
    }

    #[test]
    fn test_speaking_time_is_fraction_of_slot() {
        let mut rng = StdRng::seed_from_u64(7);
        let report = synthesize(&mut rng, 45, Utc::now());
        assert_eq!(report.speech_metrics.total_speaking_time_secs, 45.0 * 60.0 * 0.6);
    }

    #[test]
    fn test_speech_metrics_ranges() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let report = synthesize(&mut rng, 30, Utc::now());
            let avg = report.speech_metrics.avg_response_time_secs as i64;
            assert!(AVG_RESPONSE_TIME_RANGE.contains(&avg));
            assert!(FILLER_WORDS_RANGE.contains(&report.speech_metrics.filler_words_count));
        }
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(quality_for(94.0), "excellent");
        assert_eq!(quality_for(85.0), "excellent");
        assert_eq!(quality_for(84.0), "good");
        assert_eq!(quality_for(75.0), "good");
        assert_eq!(quality_for(74.0), "average");
        assert_eq!(quality_for(70.0), "average");
    }

    #[test]
    fn test_quality_label_matches_overall() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let report = synthesize(&mut rng, 30, Utc::now());
            assert_eq!(report.response_quality, quality_for(report.overall_score));
        }
    }

    #[test]
    fn test_behavioral_sub_metrics_jitter_off_overall() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let report = synthesize(&mut rng, 30, Utc::now());
            for metric in [&report.eye_contact, &report.body_language, &report.speaking_pace] {
                assert!(
                    (metric.score - report.overall_score).abs() <= f64::from(SUB_SCORE_JITTER),
                    "seed {seed}: behavioral score {} strays from {}",
                    metric.score,
                    report.overall_score
                );
                assert!((0.0..=100.0).contains(&metric.score));
                assert!(!metric.feedback.is_empty());
            }
        }
    }

    #[test]
    fn test_report_serializes_behavioral_and_detailed_feedback() {
        let mut rng = StdRng::seed_from_u64(3);
        let report = synthesize(&mut rng, 30, Utc::now());
        let value = serde_json::to_value(&report).unwrap();
        for key in ["eye_contact", "body_language", "speaking_pace"] {
            assert!(value[key]["score"].is_number(), "{key} missing score");
            assert!(value[key]["feedback"].is_string(), "{key} missing feedback");
        }
        assert!(!report.detailed_feedback.is_empty());
        assert!(value["detailed_feedback"].is_string());
    }

    #[test]
    fn test_canned_lists_are_populated() {
        let mut rng = StdRng::seed_from_u64(1);
        let report = synthesize(&mut rng, 30, Utc::now());
        assert!(!report.keywords.is_empty());
        assert!(!report.strengths.is_empty());
        assert!(!report.weaknesses.is_empty());
        assert!(!report.recommendations.is_empty());
        assert!(!report.summary.is_empty());
    }
}
