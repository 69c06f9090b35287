//! Application handlers: the student side (apply, list, withdraw, stats)
//! and the recruiter pipeline (list, status updates, bulk shortlist,
//! interview details).

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::applications::lifecycle::{can_transition, is_withdrawable};
use crate::auth::AuthUser;
use crate::errors::{is_unique_violation, AppError};
use crate::models::application::{
    Application, ApplicationAttachment, ApplicationStatus, InterviewDetails,
};
use crate::models::interview::InterviewMode;
use crate::models::job::{Job, JobStatus, JobSummary};
use crate::models::user::{StudentSummary, UserRole, UserSummary};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Shared lookups
// ────────────────────────────────────────────────────────────────────────────

pub(crate) async fn job_summaries_by_id(
    db: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, JobSummary>, AppError> {
    let jobs = sqlx::query_as::<_, JobSummary>(
        r#"
        SELECT id, title, company, location, job_type, application_deadline
        FROM jobs
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(db)
    .await?;

    Ok(jobs.into_iter().map(|j| (j.id, j)).collect())
}

pub(crate) async fn student_summaries_by_id(
    db: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, StudentSummary>, AppError> {
    let students = sqlx::query_as::<_, StudentSummary>(
        "SELECT id, name, email, student_profile FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(db)
    .await?;

    Ok(students.into_iter().map(|s| (s.id, s)).collect())
}

pub(crate) async fn user_summaries_by_id(
    db: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, UserSummary>, AppError> {
    let users =
        sqlx::query_as::<_, UserSummary>("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(db)
            .await?;

    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Loads an application and proves the caller's job ownership, in the
/// original order: missing id is 404, someone else's application is 403.
async fn load_owned_application(
    db: &PgPool,
    application_id: Uuid,
    recruiter_id: Uuid,
) -> Result<Application, AppError> {
    let application = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(application_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    let owns = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM jobs WHERE id = $1 AND recruiter_id = $2",
    )
    .bind(application.job_id)
    .bind(recruiter_id)
    .fetch_one(db)
    .await?;

    if owns == 0 {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(application)
}

// ────────────────────────────────────────────────────────────────────────────
// Student side
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<ApplicationAttachment>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
}

/// POST /api/v1/student/jobs/:id/apply
///
/// Creating the application and bumping the job's counter happen in one
/// transaction, so a failed insert never moves the counter.
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    user.require_role(UserRole::Student)?;

    let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if job.status != JobStatus::Active || !job.is_approved {
        return Err(AppError::InvalidState(
            "Job is not open for applications".to_string(),
        ));
    }

    let already = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM applications WHERE job_id = $1 AND student_id = $2",
    )
    .bind(job.id)
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;
    if already > 0 {
        return Err(AppError::Validation(
            "Already applied for this job".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (job_id, student_id, cover_letter, resume_url, attachments)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(user.id())
    .bind(&req.cover_letter)
    .bind(&req.resume_url)
    .bind(SqlJson(req.attachments))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation("Already applied for this job".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    sqlx::query(
        "UPDATE jobs SET applications_count = applications_count + 1, updated_at = now() WHERE id = $1",
    )
    .bind(job.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<ApplicationStatus>,
}

/// GET /api/v1/student/applications
pub async fn list_my_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<StatusFilter>,
) -> Result<Json<Vec<ApplicationWithJob>>, AppError> {
    user.require_role(UserRole::Student)?;

    let applications = sqlx::query_as::<_, Application>(
        r#"
        SELECT * FROM applications
        WHERE student_id = $1
          AND ($2::application_status IS NULL OR status = $2)
        ORDER BY applied_at DESC
        "#,
    )
    .bind(user.id())
    .bind(params.status)
    .fetch_all(&state.db)
    .await?;

    let job_ids: Vec<Uuid> = applications.iter().map(|a| a.job_id).collect();
    let jobs = job_summaries_by_id(&state.db, &job_ids).await?;

    let items = applications
        .into_iter()
        .map(|a| ApplicationWithJob {
            job: jobs.get(&a.job_id).cloned(),
            application: a,
        })
        .collect();

    Ok(Json(items))
}

/// GET /api/v1/student/applications/:id
pub async fn get_my_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationWithJob>, AppError> {
    user.require_role(UserRole::Student)?;

    let application = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE id = $1 AND student_id = $2",
    )
    .bind(id)
    .bind(user.id())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let jobs = job_summaries_by_id(&state.db, &[application.job_id]).await?;

    Ok(Json(ApplicationWithJob {
        job: jobs.get(&application.job_id).cloned(),
        application,
    }))
}

/// DELETE /api/v1/student/applications/:id
///
/// Withdrawal and the counter decrement share a transaction; the counter
/// never goes below zero.
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_role(UserRole::Student)?;

    let application = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE id = $1 AND student_id = $2",
    )
    .bind(id)
    .bind(user.id())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    if !is_withdrawable(application.status) {
        return Err(AppError::InvalidState(
            "Cannot withdraw processed application".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(application.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE jobs SET applications_count = GREATEST(applications_count - 1, 0), updated_at = now() WHERE id = $1",
    )
    .bind(application.job_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(json!({ "message": "Application withdrawn successfully" })))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StudentApplicationCounts {
    pub total_applications: i64,
    pub pending_applications: i64,
    pub shortlisted: i64,
    pub interview: i64,
    pub selected: i64,
}

#[derive(Debug, Serialize)]
pub struct StudentStats {
    #[serde(flatten)]
    pub counts: StudentApplicationCounts,
    pub upcoming_interviews: i64,
    pub available_jobs: i64,
}

/// GET /api/v1/student/stats
pub async fn student_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<StudentStats>, AppError> {
    user.require_role(UserRole::Student)?;

    let counts = sqlx::query_as::<_, StudentApplicationCounts>(
        r#"
        SELECT
            COUNT(*) AS total_applications,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending_applications,
            COUNT(*) FILTER (WHERE status = 'shortlisted') AS shortlisted,
            COUNT(*) FILTER (WHERE status = 'interview') AS interview,
            COUNT(*) FILTER (WHERE status = 'selected') AS selected
        FROM applications
        WHERE student_id = $1
        "#,
    )
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;

    let upcoming_interviews = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM interviews
        WHERE student_id = $1 AND status = 'scheduled' AND scheduled_date > now()
        "#,
    )
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;

    let available_jobs = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM jobs WHERE status = 'active' AND is_approved = TRUE",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(StudentStats {
        counts,
        upcoming_interviews,
        available_jobs,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Recruiter side
// ────────────────────────────────────────────────────────────────────────────

/// Application joined with its job and student context, the shape the
/// recruiter pipeline and admin reports read.
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
    pub student: Option<StudentSummary>,
}

pub(crate) async fn attach_details(
    db: &PgPool,
    applications: Vec<Application>,
) -> Result<Vec<ApplicationDetail>, AppError> {
    let job_ids: Vec<Uuid> = applications.iter().map(|a| a.job_id).collect();
    let student_ids: Vec<Uuid> = applications.iter().map(|a| a.student_id).collect();
    let jobs = job_summaries_by_id(db, &job_ids).await?;
    let students = student_summaries_by_id(db, &student_ids).await?;

    Ok(applications
        .into_iter()
        .map(|a| ApplicationDetail {
            job: jobs.get(&a.job_id).cloned(),
            student: students.get(&a.student_id).cloned(),
            application: a,
        })
        .collect())
}

/// GET /api/v1/recruiter/jobs/:id/applications
pub async fn list_job_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
    Query(params): Query<StatusFilter>,
) -> Result<Json<Vec<ApplicationDetail>>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let owns = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM jobs WHERE id = $1 AND recruiter_id = $2",
    )
    .bind(job_id)
    .bind(user.id())
    .fetch_one(&state.db)
    .await?;
    if owns == 0 {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let applications = sqlx::query_as::<_, Application>(
        r#"
        SELECT * FROM applications
        WHERE job_id = $1
          AND ($2::application_status IS NULL OR status = $2)
        ORDER BY applied_at DESC
        "#,
    )
    .bind(job_id)
    .bind(params.status)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(attach_details(&state.db, applications).await?))
}

#[derive(Debug, Deserialize)]
pub struct RecruiterApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub job_id: Option<Uuid>,
}

/// GET /api/v1/recruiter/applications
pub async fn list_recruiter_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<RecruiterApplicationFilter>,
) -> Result<Json<Vec<ApplicationDetail>>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let applications = sqlx::query_as::<_, Application>(
        r#"
        SELECT a.* FROM applications a
        JOIN jobs j ON j.id = a.job_id
        WHERE j.recruiter_id = $1
          AND ($2::application_status IS NULL OR a.status = $2)
          AND ($3::uuid IS NULL OR a.job_id = $3)
        ORDER BY a.applied_at DESC
        "#,
    )
    .bind(user.id())
    .bind(params.status)
    .bind(params.job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(attach_details(&state.db, applications).await?))
}

/// GET /api/v1/recruiter/applications/:id
pub async fn get_recruiter_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationDetail>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let application = load_owned_application(&state.db, id, user.id()).await?;

    let mut items = attach_details(&state.db, vec![application]).await?;
    Ok(Json(items.remove(0)))
}

/// Interview details accepted when a recruiter moves an application to
/// `interview` directly.
#[derive(Debug, Deserialize)]
pub struct InterviewDetailsPayload {
    pub date: DateTime<Utc>,
    pub time: String,
    pub mode: InterviewMode,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
}

impl From<InterviewDetailsPayload> for InterviewDetails {
    fn from(p: InterviewDetailsPayload) -> Self {
        InterviewDetails {
            date: p.date,
            time: p.time,
            mode: p.mode,
            location: p.location,
            meeting_link: p.meeting_link,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
    pub feedback: Option<String>,
    pub interview_details: Option<InterviewDetailsPayload>,
}

/// PATCH /api/v1/recruiter/applications/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Application>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let application = load_owned_application(&state.db, id, user.id()).await?;

    if !can_transition(application.status, req.status) {
        return Err(AppError::InvalidState(format!(
            "Cannot change status from '{}' to '{}'",
            application.status.as_str(),
            req.status.as_str()
        )));
    }

    let interview_details = if req.status == ApplicationStatus::Interview {
        let payload = req.interview_details.ok_or_else(|| {
            AppError::Validation(
                "Interview details are required to move an application to interview".to_string(),
            )
        })?;
        Some(SqlJson(InterviewDetails::from(payload)))
    } else {
        None
    };

    let updated = sqlx::query_as::<_, Application>(
        r#"
        UPDATE applications
        SET status = $1,
            feedback = COALESCE($2, feedback),
            interview_details = COALESCE($3, interview_details),
            updated_at = now()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(req.status)
    .bind(&req.feedback)
    .bind(&interview_details)
    .bind(application.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct BulkShortlistRequest {
    pub application_ids: Vec<Uuid>,
}

/// POST /api/v1/recruiter/applications/bulk-shortlist
///
/// Administrative override: moves every named application to `shortlisted`
/// regardless of its current state.
pub async fn bulk_shortlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<BulkShortlistRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let result = sqlx::query(
        "UPDATE applications SET status = 'shortlisted', updated_at = now() WHERE id = ANY($1)",
    )
    .bind(&req.application_ids)
    .execute(&state.db)
    .await?;

    Ok(Json(json!({
        "message": "Applications shortlisted",
        "modified": result.rows_affected()
    })))
}

/// PATCH /api/v1/recruiter/applications/:id/interview
///
/// Direct path of the `shortlisted → interview` transition: stamps the
/// detail snapshot and moves the status in one statement.
pub async fn set_interview_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<InterviewDetailsPayload>,
) -> Result<Json<Application>, AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let application = load_owned_application(&state.db, id, user.id()).await?;

    if !can_transition(application.status, ApplicationStatus::Interview) {
        return Err(AppError::InvalidState(format!(
            "Cannot change status from '{}' to 'interview'",
            application.status.as_str()
        )));
    }

    let updated = sqlx::query_as::<_, Application>(
        r#"
        UPDATE applications
        SET status = 'interview', interview_details = $1, updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(SqlJson(InterviewDetails::from(req)))
    .bind(application.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}
