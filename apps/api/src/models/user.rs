use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Student,
    Recruiter,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Recruiter => "recruiter",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub roll_number: Option<String>,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub cgpa: Option<f64>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecruiterProfile {
    pub company_name: Option<String>,
    pub designation: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub company_logo: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    pub student_profile: Option<Json<StudentProfile>>,
    pub recruiter_profile: Option<Json<RecruiterProfile>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact user shape embedded in interview listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Student shape embedded in recruiter-facing application listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub student_profile: Option<Json<StudentProfile>>,
}

/// User shape returned to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    pub student_profile: Option<StudentProfile>,
    pub recruiter_profile: Option<RecruiterProfile>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        UserPublic {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            phone: u.phone,
            is_approved: u.is_approved,
            is_active: u.is_active,
            student_profile: u.student_profile.map(|p| p.0),
            recruiter_profile: u.recruiter_profile.map(|p| p.0),
            created_at: u.created_at,
        }
    }
}
