use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::llm_client::json_extract::extract_json;
use crate::models::resume::{
    AchievementEntry, CertificationEntry, EducationEntry, ExperienceEntry, KeywordMatch,
    PersonalInfo, ProjectEntry, PublicationEntry, Resume, ResumeAiAnalysis, SkillSet,
    VolunteerEntry,
};
use crate::models::user::UserRole;
use crate::resumes::completeness::{self, CompletenessReport};
use crate::resumes::suggestions::{self, ResumeSuggestion};
use crate::resumes::versioning;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// CRUD
// ────────────────────────────────────────────────────────────────────────────

fn default_template() -> String {
    "professional".to_string()
}

/// Full editable document, used by both create and update. Update replaces
/// the stored document wholesale.
#[derive(Debug, Deserialize)]
pub struct ResumeDocument {
    pub title: String,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: SkillSet,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub certifications: Vec<CertificationEntry>,
    #[serde(default)]
    pub achievements: Vec<AchievementEntry>,
    #[serde(default)]
    pub publications: Vec<PublicationEntry>,
    #[serde(default)]
    pub volunteer_work: Vec<VolunteerEntry>,
    #[serde(default = "default_template")]
    pub template: String,
}

async fn load_own_resume(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<Resume, AppError> {
    sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// POST /api/v1/resumes
pub async fn create_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(doc): Json<ResumeDocument>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    user.require_role(UserRole::Student)?;

    if doc.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let resume = sqlx::query_as::<_, Resume>(
        r#"
        INSERT INTO resumes (user_id, title, personal_info, education, experience, skills,
                             projects, certifications, achievements, publications,
                             volunteer_work, template)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(user.id())
    .bind(doc.title.trim())
    .bind(SqlJson(doc.personal_info))
    .bind(SqlJson(doc.education))
    .bind(SqlJson(doc.experience))
    .bind(SqlJson(doc.skills))
    .bind(SqlJson(doc.projects))
    .bind(SqlJson(doc.certifications))
    .bind(SqlJson(doc.achievements))
    .bind(SqlJson(doc.publications))
    .bind(SqlJson(doc.volunteer_work))
    .bind(&doc.template)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/v1/resumes/mine
pub async fn list_my_resumes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Resume>>, AppError> {
    user.require_role(UserRole::Student)?;

    let resumes = sqlx::query_as::<_, Resume>(
        "SELECT * FROM resumes WHERE user_id = $1 AND is_active ORDER BY updated_at DESC",
    )
    .bind(user.id())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(resumes))
}

/// GET /api/v1/resumes/:id
pub async fn get_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Resume>, AppError> {
    let resume = sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    if resume.user_id != user.id() && user.role() != UserRole::Admin {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(resume))
}

/// PUT /api/v1/resumes/:id
///
/// The outgoing document is snapshotted into `previous_versions` before the
/// replacement lands, and the version counter moves up by one.
pub async fn update_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(doc): Json<ResumeDocument>,
) -> Result<Json<Resume>, AppError> {
    if doc.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let resume = load_own_resume(&state.db, id, user.id()).await?;

    let mut history = resume.previous_versions.0.clone();
    history.push(versioning::capture_version(&resume, Utc::now()));

    let resume = sqlx::query_as::<_, Resume>(
        r#"
        UPDATE resumes
        SET title = $1, personal_info = $2, education = $3, experience = $4, skills = $5,
            projects = $6, certifications = $7, achievements = $8, publications = $9,
            volunteer_work = $10, template = $11,
            version = version + 1, previous_versions = $12, updated_at = now()
        WHERE id = $13
        RETURNING *
        "#,
    )
    .bind(doc.title.trim())
    .bind(SqlJson(doc.personal_info))
    .bind(SqlJson(doc.education))
    .bind(SqlJson(doc.experience))
    .bind(SqlJson(doc.skills))
    .bind(SqlJson(doc.projects))
    .bind(SqlJson(doc.certifications))
    .bind(SqlJson(doc.achievements))
    .bind(SqlJson(doc.publications))
    .bind(SqlJson(doc.volunteer_work))
    .bind(&doc.template)
    .bind(SqlJson(history))
    .bind(resume.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(resume))
}

/// DELETE /api/v1/resumes/:id
pub async fn delete_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = sqlx::query(
        "UPDATE resumes SET is_active = FALSE, updated_at = now() WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user.id())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }

    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}

// ────────────────────────────────────────────────────────────────────────────
// Completeness and suggestions
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/:id/completeness
pub async fn resume_completeness(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompletenessReport>, AppError> {
    let resume = load_own_resume(&state.db, id, user.id()).await?;
    Ok(Json(completeness::compute(&resume)))
}

/// GET /api/v1/resumes/:id/suggestions
pub async fn resume_suggestions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ResumeSuggestion>>, AppError> {
    let resume = load_own_resume(&state.db, id, user.id()).await?;
    Ok(Json(suggestions::suggest(&resume)))
}

// ────────────────────────────────────────────────────────────────────────────
// ATS analysis
// ────────────────────────────────────────────────────────────────────────────

const ATS_SYSTEM: &str = "You are an expert ATS (Applicant Tracking System) and resume analyzer. \
                          Provide detailed, actionable feedback in JSON format.";
const ATS_MAX_TOKENS: u32 = 1500;

const ATS_KEYWORDS: [&str; 7] = ["javascript", "python", "react", "node", "sql", "aws", "git"];

const LOCAL_STRENGTHS: [&str; 3] = [
    "Clear structure and formatting",
    "Relevant technical skills listed",
    "Quantifiable achievements mentioned",
];
const LOCAL_WEAKNESSES: [&str; 3] = [
    "Could add more project details",
    "Missing some industry keywords",
    "Summary could be more impactful",
];
const LOCAL_SUGGESTIONS: [&str; 4] = [
    "Add metrics to quantify your achievements",
    "Include relevant certifications",
    "Optimize for ATS with industry keywords",
    "Add a professional summary at the top",
];

fn ats_prompt(document: &serde_json::Value, job_description: Option<&str>) -> String {
    let target = job_description
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Not provided - evaluate for general campus placement roles.");

    format!(
        r#"Analyze this resume for ATS (Applicant Tracking System) compatibility and overall quality.

Resume:
{document}

Target job description:
{target}

Return ONLY a valid JSON object with this exact structure:
{{"atsScore": <number 0-100>, "strengths": ["..."], "weaknesses": ["..."], "suggestions": ["..."], "keywordMatches": [{{"keyword": "...", "present": true, "importance": "high"}}], "overallRating": "excellent" | "good" | "average" | "needs-improvement"}}"#
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtsReply {
    ats_score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    keyword_matches: Vec<KeywordMatchReply>,
    overall_rating: String,
}

#[derive(Debug, Deserialize)]
struct KeywordMatchReply {
    keyword: String,
    #[serde(default)]
    present: bool,
    #[serde(default = "default_importance")]
    importance: String,
}

fn default_importance() -> String {
    "medium".to_string()
}

fn ats_reply_into_analysis(reply: AtsReply, now: DateTime<Utc>) -> ResumeAiAnalysis {
    ResumeAiAnalysis {
        ats_score: reply.ats_score.clamp(0.0, 100.0),
        strengths: reply.strengths,
        weaknesses: reply.weaknesses,
        suggestions: reply.suggestions,
        keyword_matches: reply
            .keyword_matches
            .into_iter()
            .map(|m| KeywordMatch {
                keyword: m.keyword,
                present: m.present,
                importance: m.importance,
            })
            .collect(),
        overall_rating: reply.overall_rating,
        last_analyzed: now,
    }
}

fn rating_for(score: f64) -> &'static str {
    if score >= 80.0 {
        "excellent"
    } else if score >= 60.0 {
        "good"
    } else if score >= 40.0 {
        "average"
    } else {
        "needs-improvement"
    }
}

/// Keyword-derived stand-in used when the provider is unavailable. Scores
/// from the share of stock keywords found in the document, plus jitter.
fn local_keyword_analysis(
    haystack: &str,
    rng: &mut impl Rng,
    now: DateTime<Utc>,
) -> ResumeAiAnalysis {
    let haystack = haystack.to_lowercase();

    let keyword_matches: Vec<KeywordMatch> = ATS_KEYWORDS
        .iter()
        .map(|k| KeywordMatch {
            keyword: k.to_string(),
            present: haystack.contains(k),
            importance: "high".to_string(),
        })
        .collect();

    let found = keyword_matches.iter().filter(|m| m.present).count();
    let base = (found as f64 / ATS_KEYWORDS.len() as f64) * 100.0;
    let ats_score = (base + rng.gen_range(0.0..20.0)).round().min(100.0);

    ResumeAiAnalysis {
        ats_score,
        strengths: LOCAL_STRENGTHS.iter().map(|s| s.to_string()).collect(),
        weaknesses: LOCAL_WEAKNESSES.iter().map(|s| s.to_string()).collect(),
        suggestions: LOCAL_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        keyword_matches,
        overall_rating: rating_for(ats_score).to_string(),
        last_analyzed: now,
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: ResumeAiAnalysis,
    pub completeness: CompletenessReport,
}

/// POST /api/v1/resumes/:id/analyze
///
/// Provider-backed ATS analysis with a local keyword fallback: the endpoint
/// answers even when the provider is down.
pub async fn analyze_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let resume = load_own_resume(&state.db, id, user.id()).await?;

    let document = versioning::document_json(&resume);
    let now = Utc::now();

    let provider_result = state
        .llm
        .complete(
            ATS_SYSTEM,
            &ats_prompt(&document, req.job_description.as_deref()),
            ATS_MAX_TOKENS,
        )
        .await;

    let analysis = match provider_result {
        Ok(reply) => match extract_json::<AtsReply>(&reply) {
            Ok(parsed) => ats_reply_into_analysis(parsed, now),
            Err(e) => {
                warn!("ATS reply unusable ({e}), using local keyword analysis");
                local_keyword_analysis(&document.to_string(), &mut thread_rng(), now)
            }
        },
        Err(e) => {
            warn!("ATS provider call failed ({e}), using local keyword analysis");
            local_keyword_analysis(&document.to_string(), &mut thread_rng(), now)
        }
    };

    sqlx::query("UPDATE resumes SET ai_analysis = $1, updated_at = now() WHERE id = $2")
        .bind(SqlJson(analysis.clone()))
        .bind(resume.id)
        .execute(&state.db)
        .await?;

    Ok(Json(AnalyzeResponse {
        completeness: completeness::compute(&resume),
        analysis,
    }))
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
    fn rating_thresholds() {
        assert_eq!(rating_for(80.0), "excellent");
        assert_eq!(rating_for(79.9), "good");
        assert_eq!(rating_for(60.0), "good");
        assert_eq!(rating_for(59.9), "average");
        assert_eq!(rating_for(40.0), "average");
        assert_eq!(rating_for(39.9), "needs-improvement");
    }

    #[test]
    fn local_analysis_flags_present_keywords() {
        let mut rng = StdRng::seed_from_u64(7);
        let analysis = local_keyword_analysis(
            "Built a React frontend with a Node backend on AWS",
            &mut rng,
            Utc::now(),
        );

        let present: Vec<&str> = analysis
            .keyword_matches
            .iter()
            .filter(|m| m.present)
            .map(|m| m.keyword.as_str())
            .collect();
        assert_eq!(present, vec!["react", "node", "aws"]);
    }

    #[test]
    fn local_score_is_capped_at_hundred() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let analysis = local_keyword_analysis(
                "javascript python react node sql aws git",
                &mut rng,
                Utc::now(),
            );
            assert_eq!(analysis.ats_score, 100.0);
        }
    }

    #[test]
    fn no_keywords_keeps_score_low() {
        let mut rng = StdRng::seed_from_u64(3);
        let analysis = local_keyword_analysis("plain prose resume", &mut rng, Utc::now());
        assert!(analysis.ats_score <= 20.0);
        assert_eq!(analysis.overall_rating, "needs-improvement");
    }

    #[test]
    fn rating_matches_score_in_local_analysis() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let analysis =
                local_keyword_analysis("python sql git react node", &mut rng, Utc::now());
            assert_eq!(analysis.overall_rating, rating_for(analysis.ats_score));
        }
    }

    #[test]
    fn provider_reply_maps_and_clamps() {
        let reply = AtsReply {
            ats_score: 132.0,
            strengths: vec!["Strong projects".to_string()],
            weaknesses: vec![],
            suggestions: vec![],
            keyword_matches: vec![KeywordMatchReply {
                keyword: "rust".to_string(),
                present: true,
                importance: "high".to_string(),
            }],
            overall_rating: "excellent".to_string(),
        };

        let analysis = ats_reply_into_analysis(reply, Utc::now());
        assert_eq!(analysis.ats_score, 100.0);
        assert_eq!(analysis.keyword_matches.len(), 1);
        assert!(analysis.keyword_matches[0].present);
    }
}
