use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ── Builder document sections ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Links {
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub links: Links,
    pub professional_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub location: Option<String>,
    pub major: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cgpa: Option<f64>,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub role: Option<String>,
    pub url: Option<String>,
    pub github: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub name: String,
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
    #[serde(default)]
    pub languages: Vec<LanguageSkill>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub credential_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementEntry {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationEntry {
    pub title: String,
    pub publisher: Option<String>,
    pub date: Option<NaiveDate>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerEntry {
    pub organization: String,
    pub role: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

// ── ATS analysis stored on the resume ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub present: bool,
    pub importance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAiAnalysis {
    pub ats_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub keyword_matches: Vec<KeywordMatch>,
    pub overall_rating: String,
    pub last_analyzed: DateTime<Utc>,
}

/// One snapshot in the resume's version history. `data` is the full document
/// as it stood before the update that produced the next version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeVersion {
    pub version_number: i32,
    pub saved_at: DateTime<Utc>,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub personal_info: Json<PersonalInfo>,
    pub education: Json<Vec<EducationEntry>>,
    pub experience: Json<Vec<ExperienceEntry>>,
    pub skills: Json<SkillSet>,
    pub projects: Json<Vec<ProjectEntry>>,
    pub certifications: Json<Vec<CertificationEntry>>,
    pub achievements: Json<Vec<AchievementEntry>>,
    pub publications: Json<Vec<PublicationEntry>>,
    pub volunteer_work: Json<Vec<VolunteerEntry>>,
    pub template: String,
    pub version: i32,
    pub previous_versions: Json<Vec<ResumeVersion>>,
    pub ai_analysis: Option<Json<ResumeAiAnalysis>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Parser output (resume_analyses) ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedPersonalInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedSkills {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedExperience {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub skills_used: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedEducation {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub field: Option<String>,
    pub graduation_year: Option<String>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedCertification {
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedProject {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResumeAnalysis {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub career_path: Option<String>,
    pub industry_fit: Option<String>,
    pub experience_level: Option<String>,
    #[serde(default)]
    pub overall_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedKeywords {
    #[serde(default)]
    pub ats_friendly_keywords: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub ats_score: f64,
}

/// Structured document the parser extracts from an uploaded resume file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub personal_info: ParsedPersonalInfo,
    #[serde(default)]
    pub skills: ParsedSkills,
    #[serde(default)]
    pub experience: Vec<ParsedExperience>,
    #[serde(default)]
    pub education: Vec<ParsedEducation>,
    #[serde(default)]
    pub certifications: Vec<ParsedCertification>,
    #[serde(default)]
    pub projects: Vec<ParsedProject>,
    #[serde(default)]
    pub analysis: ParsedResumeAnalysis,
    #[serde(default)]
    pub keywords: ParsedKeywords,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeImprovement {
    pub section: Option<String>,
    pub current_issue: Option<String>,
    pub recommendation: Option<String>,
    pub priority: Option<String>,
    pub example: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: Option<String>,
    pub importance: Option<String>,
    pub learning_path: Option<String>,
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificationSuggestion {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub benefit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTarget {
    pub job_title: Option<String>,
    #[serde(default)]
    pub match_score: f64,
    pub why: Option<String>,
    pub preparation: Option<String>,
}

/// Personalized follow-up advice generated from a parsed resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeRecommendations {
    #[serde(default)]
    pub resume_improvements: Vec<ResumeImprovement>,
    #[serde(default)]
    pub skill_gaps: Vec<SkillGap>,
    #[serde(default)]
    pub certifications: Vec<CertificationSuggestion>,
    #[serde(default)]
    pub job_targets: Vec<JobTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeAnalysisRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub file_name: String,
    pub file_key: String,
    pub resume_text: String,
    pub parsed_data: Json<ParsedResume>,
    pub recommendations: Option<Json<ResumeRecommendations>>,
    pub created_at: DateTime<Utc>,
}
