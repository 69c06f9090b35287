use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::applications::handlers::{attach_details, user_summaries_by_id, ApplicationDetail};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::job::Job;
use crate::models::user::{User, UserPublic, UserRole, UserSummary};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Platform stats
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminUserCounts {
    pub total_students: i64,
    pub total_recruiters: i64,
    pub pending_approvals: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminJobCounts {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub pending_jobs: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminApplicationCounts {
    pub total_applications: i64,
    pub selections: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    #[serde(flatten)]
    pub users: AdminUserCounts,
    #[serde(flatten)]
    pub jobs: AdminJobCounts,
    #[serde(flatten)]
    pub applications: AdminApplicationCounts,
    pub total_interviews: i64,
}

/// GET /api/v1/admin/stats
pub async fn admin_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AdminStats>, AppError> {
    user.require_role(UserRole::Admin)?;

    let users = sqlx::query_as::<_, AdminUserCounts>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE role = 'student') AS total_students,
            COUNT(*) FILTER (WHERE role = 'recruiter') AS total_recruiters,
            COUNT(*) FILTER (WHERE role = 'recruiter' AND NOT is_approved) AS pending_approvals
        FROM users
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let jobs = sqlx::query_as::<_, AdminJobCounts>(
        r#"
        SELECT
            COUNT(*) AS total_jobs,
            COUNT(*) FILTER (WHERE status = 'active' AND is_approved) AS active_jobs,
            COUNT(*) FILTER (WHERE NOT is_approved) AS pending_jobs
        FROM jobs
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let applications = sqlx::query_as::<_, AdminApplicationCounts>(
        r#"
        SELECT
            COUNT(*) AS total_applications,
            COUNT(*) FILTER (WHERE status = 'selected') AS selections
        FROM applications
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let total_interviews = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM interviews")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(AdminStats {
        users,
        jobs,
        applications,
        total_interviews,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// User moderation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminUserFilter {
    pub role: Option<UserRole>,
    pub approved: Option<bool>,
    pub search: Option<String>,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<AdminUserFilter>,
) -> Result<Json<Vec<UserPublic>>, AppError> {
    user.require_role(UserRole::Admin)?;

    let search = filter.search.as_ref().map(|s| format!("%{s}%"));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE ($1::user_role IS NULL OR role = $1)
          AND ($2::boolean IS NULL OR is_approved = $2)
          AND ($3::text IS NULL OR name ILIKE $3 OR email ILIKE $3)
        ORDER BY created_at DESC
        "#,
    )
    .bind(filter.role)
    .bind(filter.approved)
    .bind(search)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

/// PATCH /api/v1/admin/users/:id/approval
pub async fn set_user_approval(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<UserPublic>, AppError> {
    user.require_role(UserRole::Admin)?;

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET is_approved = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(req.approved)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    Ok(Json(UserPublic::from(updated)))
}

#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    pub active: bool,
}

/// PATCH /api/v1/admin/users/:id/status
///
/// Deactivated accounts fail authentication on their next request.
pub async fn set_user_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ActivationRequest>,
) -> Result<Json<UserPublic>, AppError> {
    user.require_role(UserRole::Admin)?;

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET is_active = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(req.active)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    Ok(Json(UserPublic::from(updated)))
}

/// DELETE /api/v1/admin/users/:id
///
/// Hard delete; dependent rows go via foreign-key cascade.
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_role(UserRole::Admin)?;

    if id == user.id() {
        return Err(AppError::Validation(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

// ────────────────────────────────────────────────────────────────────────────
// Job moderation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JobForAdmin {
    #[serde(flatten)]
    pub job: Job,
    pub recruiter: Option<UserSummary>,
}

#[derive(Debug, Deserialize)]
pub struct AdminJobFilter {
    pub approved: Option<bool>,
}

/// GET /api/v1/admin/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<AdminJobFilter>,
) -> Result<Json<Vec<JobForAdmin>>, AppError> {
    user.require_role(UserRole::Admin)?;

    let jobs = sqlx::query_as::<_, Job>(
        r#"
        SELECT * FROM jobs
        WHERE ($1::boolean IS NULL OR is_approved = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(filter.approved)
    .fetch_all(&state.db)
    .await?;

    let recruiter_ids: Vec<Uuid> = jobs.iter().map(|j| j.recruiter_id).collect();
    let recruiters = user_summaries_by_id(&state.db, &recruiter_ids).await?;

    let items = jobs
        .into_iter()
        .map(|j| JobForAdmin {
            recruiter: recruiters.get(&j.recruiter_id).cloned(),
            job: j,
        })
        .collect();

    Ok(Json(items))
}

/// PATCH /api/v1/admin/jobs/:id/approval
///
/// Approving a draft job also activates it, so a freshly approved posting
/// is immediately visible in the catalog.
pub async fn set_job_approval(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<Job>, AppError> {
    user.require_role(UserRole::Admin)?;

    let job = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET is_approved = $1,
            status = CASE WHEN $1 AND status = 'draft' THEN 'active'::job_status ELSE status END,
            updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(req.approved)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(job))
}

/// DELETE /api/v1/admin/jobs/:id
pub async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_role(UserRole::Admin)?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM applications WHERE job_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

// ────────────────────────────────────────────────────────────────────────────
// Reports
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/reports/placements
pub async fn placement_report(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ApplicationDetail>>, AppError> {
    user.require_role(UserRole::Admin)?;

    let placements = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE status = 'selected' ORDER BY updated_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(attach_details(&state.db, placements).await?))
}
