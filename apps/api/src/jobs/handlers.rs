use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::job::{Eligibility, Job, JobStatus, JobType, Salary};
use crate::models::user::UserRole;
use crate::state::AppState;

const CATALOG_PAGE_SIZE: i64 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Catalog (public + student)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct JobCatalogFilter {
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub min_salary: Option<i64>,
}

/// Only `active` jobs that passed admin moderation are visible outside the
/// recruiter's own dashboard.
async fn search_visible_jobs(db: &PgPool, filter: &JobCatalogFilter) -> Result<Vec<Job>, AppError> {
    let search = filter.search.as_ref().map(|s| format!("%{s}%"));
    let location = filter.location.as_ref().map(|s| format!("%{s}%"));

    let jobs = sqlx::query_as::<_, Job>(
        r#"
        SELECT * FROM jobs
        WHERE status = 'active' AND is_approved = TRUE
          AND ($1::text IS NULL OR title ILIKE $1 OR company ILIKE $1 OR description ILIKE $1)
          AND ($2::text IS NULL OR location ILIKE $2)
          AND ($3::job_type IS NULL OR job_type = $3)
          AND ($4::bigint IS NULL OR (salary->>'min')::BIGINT >= $4)
        ORDER BY created_at DESC
        LIMIT $5
        "#,
    )
    .bind(search)
    .bind(location)
    .bind(filter.job_type)
    .bind(filter.min_salary)
    .bind(CATALOG_PAGE_SIZE)
    .fetch_all(db)
    .await?;

    Ok(jobs)
}

async fn visible_job_by_id(db: &PgPool, id: Uuid) -> Result<Job, AppError> {
    sqlx::query_as::<_, Job>(
        "SELECT * FROM jobs WHERE id = $1 AND status = 'active' AND is_approved = TRUE",
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// GET /api/v1/jobs
pub async fn list_public_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobCatalogFilter>,
) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(search_visible_jobs(&state.db, &filter).await?))
}

/// GET /api/v1/jobs/:id
pub async fn get_public_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(visible_job_by_id(&state.db, id).await?))
}

/// GET /api/v1/student/jobs
pub async fn list_student_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<JobCatalogFilter>,
) -> Result<Json<Vec<Job>>, AppError> {
    user.require_role(UserRole::Student)?;
    user.require_approved()?;

    Ok(Json(search_visible_jobs(&state.db, &filter).await?))
}

#[derive(Debug, Serialize)]
pub struct JobForStudent {
    #[serde(flatten)]
    pub job: Job,
    pub has_applied: bool,
}

/// GET /api/v1/student/jobs/:id
pub async fn get_student_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobForStudent>, AppError> {
    user.require_role(UserRole::Student)?;
    user.require_approved()?;

    let job = visible_job_by_id(&state.db, id).await?;

    let applied = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM applications WHERE job_id = $1 AND student_id = $2",
    )
    .bind(job.id)
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(JobForStudent {
        job,
        has_applied: applied > 0,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Recruiter CRUD
// ────────────────────────────────────────────────────────────────────────────

fn default_positions() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<Salary>,
    pub eligibility: Option<Eligibility>,
    pub application_deadline: DateTime<Utc>,
    #[serde(default = "default_positions")]
    pub positions: i32,
    pub status: Option<JobStatus>,
}

fn validate_new_job(req: &CreateJobRequest, now: DateTime<Utc>) -> Result<(), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if req.company.trim().is_empty() {
        return Err(AppError::Validation("Company is required".to_string()));
    }
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if req.location.trim().is_empty() {
        return Err(AppError::Validation("Location is required".to_string()));
    }
    if req.application_deadline <= now {
        return Err(AppError::Validation(
            "Application deadline must be in the future".to_string(),
        ));
    }
    if req.positions < 1 {
        return Err(AppError::Validation(
            "At least one position is required".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/recruiter/jobs
///
/// New postings always start unapproved; an admin must clear them before
/// they appear in the catalog.
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    validate_new_job(&req, Utc::now())?;

    let job = sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs (recruiter_id, title, company, description, requirements, skills,
                          location, job_type, salary, eligibility, application_deadline,
                          positions, status, is_approved)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, FALSE)
        RETURNING *
        "#,
    )
    .bind(user.id())
    .bind(req.title.trim())
    .bind(req.company.trim())
    .bind(&req.description)
    .bind(&req.requirements)
    .bind(&req.skills)
    .bind(req.location.trim())
    .bind(req.job_type)
    .bind(req.salary.map(SqlJson))
    .bind(req.eligibility.map(SqlJson))
    .bind(req.application_deadline)
    .bind(req.positions)
    .bind(req.status.unwrap_or(JobStatus::Active))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Debug, Deserialize)]
pub struct RecruiterJobFilter {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}

/// GET /api/v1/recruiter/jobs
pub async fn list_recruiter_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<RecruiterJobFilter>,
) -> Result<Json<Vec<Job>>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let search = filter.search.as_ref().map(|s| format!("%{s}%"));

    let jobs = sqlx::query_as::<_, Job>(
        r#"
        SELECT * FROM jobs
        WHERE recruiter_id = $1
          AND ($2::job_status IS NULL OR status = $2)
          AND ($3::text IS NULL OR title ILIKE $3 OR company ILIKE $3)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user.id())
    .bind(filter.status)
    .bind(search)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

async fn load_own_job(db: &PgPool, job_id: Uuid, recruiter_id: Uuid) -> Result<Job, AppError> {
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 AND recruiter_id = $2")
        .bind(job_id)
        .bind(recruiter_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// GET /api/v1/recruiter/jobs/:id
pub async fn get_recruiter_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    Ok(Json(load_own_job(&state.db, id, user.id()).await?))
}

/// Allow-list patch: only the fields named here can be changed by the
/// posting recruiter.
#[derive(Debug, Default, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<Salary>,
    pub eligibility: Option<Eligibility>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub positions: Option<i32>,
    pub status: Option<JobStatus>,
}

fn patch_touches_content(patch: &JobPatch) -> bool {
    patch.title.is_some()
        || patch.company.is_some()
        || patch.description.is_some()
        || patch.requirements.is_some()
        || patch.skills.is_some()
        || patch.location.is_some()
        || patch.job_type.is_some()
        || patch.salary.is_some()
        || patch.eligibility.is_some()
        || patch.application_deadline.is_some()
        || patch.positions.is_some()
        || patch.status.is_some()
}

fn apply_job_patch(job: &mut Job, patch: JobPatch) {
    if let Some(title) = patch.title {
        job.title = title;
    }
    if let Some(company) = patch.company {
        job.company = company;
    }
    if let Some(description) = patch.description {
        job.description = description;
    }
    if let Some(requirements) = patch.requirements {
        job.requirements = requirements;
    }
    if let Some(skills) = patch.skills {
        job.skills = skills;
    }
    if let Some(location) = patch.location {
        job.location = location;
    }
    if let Some(job_type) = patch.job_type {
        job.job_type = job_type;
    }
    if let Some(salary) = patch.salary {
        job.salary = Some(SqlJson(salary));
    }
    if let Some(eligibility) = patch.eligibility {
        job.eligibility = Some(SqlJson(eligibility));
    }
    if let Some(deadline) = patch.application_deadline {
        job.application_deadline = deadline;
    }
    if let Some(positions) = patch.positions {
        job.positions = positions;
    }
    if let Some(status) = patch.status {
        job.status = status;
    }
}

#[derive(Debug, Serialize)]
pub struct JobUpdateResponse {
    pub message: String,
    pub job: Job,
}

/// PATCH /api/v1/recruiter/jobs/:id
///
/// Every content change sends the posting back through admin moderation.
pub async fn update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<JobUpdateResponse>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    if !patch_touches_content(&patch) {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    let mut job = load_own_job(&state.db, id, user.id()).await?;
    apply_job_patch(&mut job, patch);

    let job = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET title = $1, company = $2, description = $3, requirements = $4, skills = $5,
            location = $6, job_type = $7, salary = $8, eligibility = $9,
            application_deadline = $10, positions = $11, status = $12,
            is_approved = FALSE, updated_at = now()
        WHERE id = $13
        RETURNING *
        "#,
    )
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.description)
    .bind(&job.requirements)
    .bind(&job.skills)
    .bind(&job.location)
    .bind(job.job_type)
    .bind(&job.salary)
    .bind(&job.eligibility)
    .bind(job.application_deadline)
    .bind(job.positions)
    .bind(job.status)
    .bind(job.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(JobUpdateResponse {
        message: "Job updated successfully. Pending admin approval.".to_string(),
        job,
    }))
}

/// POST /api/v1/recruiter/jobs/:id/close
///
/// Closing does not touch approval: a re-opened posting keeps its
/// moderation state.
pub async fn close_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let job = load_own_job(&state.db, id, user.id()).await?;

    let job = sqlx::query_as::<_, Job>(
        "UPDATE jobs SET status = 'closed', updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(job.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(job))
}

/// DELETE /api/v1/recruiter/jobs/:id
///
/// Applications go with the job, in the same transaction.
pub async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let job = load_own_job(&state.db, id, user.id()).await?;

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM applications WHERE job_id = $1")
        .bind(job.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(job.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

// ────────────────────────────────────────────────────────────────────────────
// Recruiter dashboard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecruiterJobCounts {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub pending_approval: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecruiterApplicationCounts {
    pub total_applications: i64,
    pub pending_applications: i64,
    pub shortlisted: i64,
    pub interview: i64,
    pub selected: i64,
}

#[derive(Debug, Serialize)]
pub struct RecruiterStats {
    #[serde(flatten)]
    pub jobs: RecruiterJobCounts,
    #[serde(flatten)]
    pub applications: RecruiterApplicationCounts,
    pub upcoming_interviews: i64,
}

/// GET /api/v1/recruiter/stats
pub async fn recruiter_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<RecruiterStats>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let jobs = sqlx::query_as::<_, RecruiterJobCounts>(
        r#"
        SELECT
            COUNT(*) AS total_jobs,
            COUNT(*) FILTER (WHERE status = 'active' AND is_approved) AS active_jobs,
            COUNT(*) FILTER (WHERE NOT is_approved) AS pending_approval
        FROM jobs
        WHERE recruiter_id = $1
        "#,
    )
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;

    let applications = sqlx::query_as::<_, RecruiterApplicationCounts>(
        r#"
        SELECT
            COUNT(*) AS total_applications,
            COUNT(*) FILTER (WHERE a.status = 'pending') AS pending_applications,
            COUNT(*) FILTER (WHERE a.status = 'shortlisted') AS shortlisted,
            COUNT(*) FILTER (WHERE a.status = 'interview') AS interview,
            COUNT(*) FILTER (WHERE a.status = 'selected') AS selected
        FROM applications a
        JOIN jobs j ON j.id = a.job_id
        WHERE j.recruiter_id = $1
        "#,
    )
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;

    let upcoming_interviews = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM interviews
        WHERE recruiter_id = $1 AND status = 'scheduled' AND scheduled_date > now()
        "#,
    )
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(RecruiterStats {
        jobs,
        applications,
        upcoming_interviews,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_request() -> CreateJobRequest {
        CreateJobRequest {
            title: "Backend Engineer".to_string(),
            company: "Acme Corp".to_string(),
            description: "Build and run our hiring platform".to_string(),
            requirements: vec!["Rust".to_string()],
            skills: vec!["postgres".to_string()],
            location: "Bengaluru".to_string(),
            job_type: JobType::FullTime,
            salary: None,
            eligibility: None,
            application_deadline: Utc::now() + Duration::days(14),
            positions: 2,
            status: None,
        }
    }

    fn make_job() -> Job {
        let req = make_request();
        Job {
            id: Uuid::new_v4(),
            recruiter_id: Uuid::new_v4(),
            title: req.title,
            company: req.company,
            description: req.description,
            requirements: req.requirements,
            skills: req.skills,
            location: req.location,
            job_type: req.job_type,
            salary: None,
            eligibility: None,
            application_deadline: req.application_deadline,
            positions: req.positions,
            status: JobStatus::Active,
            is_approved: true,
            applications_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn valid_posting_passes() {
        assert!(validate_new_job(&make_request(), Utc::now()).is_ok());
    }

    #[test]
    fn blank_title_rejected() {
        let mut req = make_request();
        req.title = "   ".to_string();
        assert!(matches!(
            validate_new_job(&req, Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn blank_company_rejected() {
        let mut req = make_request();
        req.company = String::new();
        assert!(matches!(
            validate_new_job(&req, Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn past_deadline_rejected() {
        let mut req = make_request();
        req.application_deadline = Utc::now() - Duration::days(1);
        assert!(matches!(
            validate_new_job(&req, Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn zero_positions_rejected() {
        let mut req = make_request();
        req.positions = 0;
        assert!(matches!(
            validate_new_job(&req, Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn patch_merges_only_supplied_fields() {
        let mut job = make_job();
        let original_company = job.company.clone();

        apply_job_patch(
            &mut job,
            JobPatch {
                title: Some("Platform Engineer".to_string()),
                positions: Some(5),
                ..JobPatch::default()
            },
        );

        assert_eq!(job.title, "Platform Engineer");
        assert_eq!(job.positions, 5);
        assert_eq!(job.company, original_company);
        assert_eq!(job.status, JobStatus::Active);
    }

    #[test]
    fn patch_can_move_status() {
        let mut job = make_job();
        apply_job_patch(
            &mut job,
            JobPatch {
                status: Some(JobStatus::Closed),
                ..JobPatch::default()
            },
        );
        assert_eq!(job.status, JobStatus::Closed);
    }

    #[test]
    fn empty_patch_touches_nothing() {
        assert!(!patch_touches_content(&JobPatch::default()));
        assert!(patch_touches_content(&JobPatch {
            location: Some("Remote".to_string()),
            ..JobPatch::default()
        }));
    }
}
