use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Missed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::InProgress => "in-progress",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::Missed => "missed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_mode", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InterviewMode {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_result", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InterviewResult {
    Pending,
    Selected,
    Rejected,
    OnHold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub asked_at: DateTime<Utc>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub question_id: Option<String>,
    pub response: String,
    pub duration_secs: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub role: UserRole,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechMetrics {
    pub total_speaking_time_secs: f64,
    pub avg_response_time_secs: f64,
    pub filler_words_count: i64,
}

/// One scored behavioral observation (eye contact, body language, pace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubMetric {
    pub score: f64,
    pub feedback: String,
}

/// Structured performance report attached to a completed interview.
/// All top-level and sub-metric scores are on a 0..=100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewAnalysis {
    pub overall_score: f64,
    pub communication_score: f64,
    pub technical_score: f64,
    pub confidence_score: f64,
    pub sentiment: SentimentBreakdown,
    pub keywords: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub eye_contact: SubMetric,
    pub body_language: SubMetric,
    pub speaking_pace: SubMetric,
    pub speech_metrics: SpeechMetrics,
    pub response_quality: String,
    pub summary: String,
    pub detailed_feedback: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub recruiter_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub scheduled_time: String,
    pub duration_minutes: i32,
    pub mode: InterviewMode,
    pub status: InterviewStatus,
    pub room_id: Option<String>,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub questions: Json<Vec<InterviewQuestion>>,
    pub responses: Json<Vec<InterviewResponse>>,
    pub participants: Json<Vec<Participant>>,
    pub recording: Option<Json<Recording>>,
    pub analysis: Option<Json<InterviewAnalysis>>,
    pub recruiter_notes: Option<String>,
    pub result: InterviewResult,
    pub final_feedback: Option<String>,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
