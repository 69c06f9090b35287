//! Delegated analysis — asks the LLM for the report and maps its reply onto
//! the stored document shape. Any provider or parse failure falls back to
//! synthesis; report generation never surfaces a provider outage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::analysis::prompts::{interview_analysis_prompt, ANALYST_SYSTEM};
use crate::analysis::synthesis::{self, quality_for, SPEAKING_TIME_FRACTION};
use crate::analysis::InterviewAnalyzer;
use crate::errors::AppError;
use crate::llm_client::json_extract::extract_json;
use crate::llm_client::LlmClient;
use crate::models::interview::{
    Interview, InterviewAnalysis, SentimentBreakdown, SpeechMetrics, SubMetric,
};

const MAX_TOKENS: u32 = 1000;

/// Speech metrics the provider cannot observe are filled with fixed values.
const DELEGATED_AVG_RESPONSE_TIME_SECS: f64 = 8.0;
const DELEGATED_FILLER_WORDS_COUNT: i64 = 10;
const DELEGATED_KEYWORDS: &[&str] = &["problem-solving", "teamwork", "communication"];

// The provider never sees the candidate, so the behavioral observations are
// proxied off the scores it does report.
const EYE_CONTACT_FEEDBACK: &str = "Based on interview performance";
const BODY_LANGUAGE_FEEDBACK: &str = "Professional demeanor observed";
const SPEAKING_PACE_FEEDBACK: &str = "Clear communication";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DelegatedReply {
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    communication_score: f64,
    #[serde(default)]
    technical_score: f64,
    #[serde(default)]
    confidence_score: f64,
    sentiment_analysis: Option<SentimentReply>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    ai_summary: String,
    #[serde(default)]
    detailed_feedback: String,
}

#[derive(Debug, Deserialize)]
struct SentimentReply {
    #[serde(default)]
    positive: f64,
    #[serde(default)]
    neutral: f64,
    #[serde(default)]
    negative: f64,
}

/// Maps a parsed provider reply onto the stored document, clamping scores
/// and filling the metrics the provider cannot observe.
fn reply_into_analysis(
    reply: DelegatedReply,
    duration_minutes: i32,
    now: DateTime<Utc>,
) -> InterviewAnalysis {
    let overall_score = reply.overall_score.clamp(0.0, 100.0);
    let communication_score = reply.communication_score.clamp(0.0, 100.0);
    let confidence_score = reply.confidence_score.clamp(0.0, 100.0);
    let sentiment = reply
        .sentiment_analysis
        .map(|s| SentimentBreakdown {
            positive: s.positive,
            neutral: s.neutral,
            negative: s.negative,
        })
        .unwrap_or(SentimentBreakdown {
            positive: 0.0,
            neutral: 0.0,
            negative: 0.0,
        });

    InterviewAnalysis {
        overall_score,
        communication_score,
        technical_score: reply.technical_score.clamp(0.0, 100.0),
        confidence_score,
        sentiment,
        keywords: DELEGATED_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        strengths: reply.strengths,
        weaknesses: reply.weaknesses,
        recommendations: reply.recommendations,
        eye_contact: SubMetric {
            score: confidence_score,
            feedback: EYE_CONTACT_FEEDBACK.to_string(),
        },
        body_language: SubMetric {
            score: confidence_score,
            feedback: BODY_LANGUAGE_FEEDBACK.to_string(),
        },
        speaking_pace: SubMetric {
            score: communication_score,
            feedback: SPEAKING_PACE_FEEDBACK.to_string(),
        },
        speech_metrics: SpeechMetrics {
            total_speaking_time_secs: f64::from(duration_minutes) * 60.0 * SPEAKING_TIME_FRACTION,
            avg_response_time_secs: DELEGATED_AVG_RESPONSE_TIME_SECS,
            filler_words_count: DELEGATED_FILLER_WORDS_COUNT,
        },
        response_quality: quality_for(overall_score).to_string(),
        summary: reply.ai_summary,
        detailed_feedback: reply.detailed_feedback,
        generated_at: now,
    }
}

/// Strategy that delegates to the LLM, with synthesis as the fallback.
pub struct DelegatedAnalyzer {
    llm: LlmClient,
}

impl DelegatedAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl InterviewAnalyzer for DelegatedAnalyzer {
    async fn analyze(
        &self,
        interview: &Interview,
        job_title: &str,
        candidate_name: &str,
    ) -> Result<InterviewAnalysis, AppError> {
        let prompt = interview_analysis_prompt(interview, job_title, candidate_name);

        let reply = match self.llm.complete(ANALYST_SYSTEM, &prompt, MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Delegated analysis call failed ({e}), falling back to synthesis");
                return Ok(synthesis::synthesize(
                    &mut rand::thread_rng(),
                    interview.duration_minutes,
                    Utc::now(),
                ));
            }
        };

        match extract_json::<DelegatedReply>(&reply) {
            Ok(parsed) => Ok(reply_into_analysis(
                parsed,
                interview.duration_minutes,
                Utc::now(),
            )),
            Err(e) => {
                warn!("Delegated analysis reply unusable ({e}), falling back to synthesis");
                Ok(synthesis::synthesize(
                    &mut rand::thread_rng(),
                    interview.duration_minutes,
                    Utc::now(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reply() -> DelegatedReply {
        DelegatedReply {
            overall_score: 88.0,
            communication_score: 90.0,
            technical_score: 85.0,
            confidence_score: 86.0,
            sentiment_analysis: Some(SentimentReply {
                positive: 0.7,
                neutral: 0.2,
                negative: 0.1,
            }),
            strengths: vec!["Strong fundamentals".to_string()],
            weaknesses: vec!["Rushed answers".to_string()],
            recommendations: vec!["Slow down".to_string()],
            ai_summary: "Solid performance overall.".to_string(),
            detailed_feedback: "Strong technical depth with clear delivery.".to_string(),
        }
    }

    #[test]
    fn test_reply_maps_onto_document() {
        let now = Utc::now();
        let analysis = reply_into_analysis(make_reply(), 30, now);
        assert_eq!(analysis.overall_score, 88.0);
        assert_eq!(analysis.sentiment.positive, 0.7);
        assert_eq!(analysis.strengths, vec!["Strong fundamentals".to_string()]);
        assert_eq!(analysis.summary, "Solid performance overall.");
        assert_eq!(
            analysis.detailed_feedback,
            "Strong technical depth with clear delivery."
        );
        assert_eq!(analysis.generated_at, now);
    }

    #[test]
    fn test_behavioral_metrics_proxy_reported_scores() {
        let analysis = reply_into_analysis(make_reply(), 30, Utc::now());
        assert_eq!(analysis.eye_contact.score, analysis.confidence_score);
        assert_eq!(analysis.body_language.score, analysis.confidence_score);
        assert_eq!(analysis.speaking_pace.score, analysis.communication_score);
        assert!(!analysis.eye_contact.feedback.is_empty());
        assert!(!analysis.body_language.feedback.is_empty());
        assert!(!analysis.speaking_pace.feedback.is_empty());
    }

    #[test]
    fn test_scores_are_clamped() {
        let mut reply = make_reply();
        reply.overall_score = 140.0;
        reply.technical_score = -12.0;
        let analysis = reply_into_analysis(reply, 30, Utc::now());
        assert_eq!(analysis.overall_score, 100.0);
        assert_eq!(analysis.technical_score, 0.0);
    }

    #[test]
    fn test_unobservable_metrics_use_fixed_values() {
        let analysis = reply_into_analysis(make_reply(), 40, Utc::now());
        assert_eq!(analysis.speech_metrics.avg_response_time_secs, 8.0);
        assert_eq!(analysis.speech_metrics.filler_words_count, 10);
        assert_eq!(
            analysis.speech_metrics.total_speaking_time_secs,
            40.0 * 60.0 * 0.6
        );
        assert_eq!(analysis.keywords.len(), 3);
    }

    #[test]
    fn test_quality_label_follows_thresholds() {
        let mut reply = make_reply();
        reply.overall_score = 85.0;
        assert_eq!(
            reply_into_analysis(reply, 30, Utc::now()).response_quality,
            "excellent"
        );

        let mut reply = make_reply();
        reply.overall_score = 76.0;
        assert_eq!(
            reply_into_analysis(reply, 30, Utc::now()).response_quality,
            "good"
        );

        let mut reply = make_reply();
        reply.overall_score = 60.0;
        assert_eq!(
            reply_into_analysis(reply, 30, Utc::now()).response_quality,
            "average"
        );
    }

    #[test]
    fn test_missing_sentiment_defaults_to_zero() {
        let mut reply = make_reply();
        reply.sentiment_analysis = None;
        let analysis = reply_into_analysis(reply, 30, Utc::now());
        assert_eq!(analysis.sentiment.positive, 0.0);
        assert_eq!(analysis.sentiment.negative, 0.0);
    }
}
