use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::interview::InterviewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    Interview,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Supporting document attached to an application (transcript, portfolio,
/// certificate scan). The file itself lives in object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationAttachment {
    pub name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Interview scheduling details denormalized onto the application so students
/// see them without loading the interview row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewDetails {
    pub date: DateTime<Utc>,
    pub time: String,
    pub mode: InterviewMode,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub attachments: Json<Vec<ApplicationAttachment>>,
    pub interview_details: Option<Json<InterviewDetails>>,
    pub feedback: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
