use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Active,
    Closed,
    Draft,
    // Declared in the data model but no handler transitions into it;
    // reachable only by direct data correction, like interview `missed`.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
    Contract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salary {
    pub min: Option<i64>,
    pub max: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Eligibility {
    pub min_cgpa: Option<f64>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub year_of_study: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<Json<Salary>>,
    pub eligibility: Option<Json<Eligibility>>,
    pub application_deadline: DateTime<Utc>,
    pub positions: i32,
    pub status: JobStatus,
    pub is_approved: bool,
    pub applications_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact job shape embedded in application and interview listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: JobType,
    pub application_deadline: DateTime<Utc>,
}
