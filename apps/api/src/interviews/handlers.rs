use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::synthesis;
use crate::applications::handlers::{job_summaries_by_id, user_summaries_by_id};
use crate::applications::lifecycle::{decision_write_back, is_schedulable};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::interviews::session;
use crate::models::application::{Application, InterviewDetails};
use crate::models::interview::{
    Interview, InterviewAnalysis, InterviewMode, InterviewQuestion, InterviewResponse,
    InterviewResult, InterviewStatus,
};
use crate::models::job::JobSummary;
use crate::models::user::{UserRole, UserSummary};
use crate::state::AppState;

const DEFAULT_DURATION_MINUTES: i32 = 30;

// ────────────────────────────────────────────────────────────────────────────
// Shared pieces
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct InterviewWithContext {
    #[serde(flatten)]
    pub interview: Interview,
    pub job: Option<JobSummary>,
    pub student: Option<UserSummary>,
    pub recruiter: Option<UserSummary>,
}

async fn load_interview(db: &PgPool, id: Uuid) -> Result<Interview, AppError> {
    sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

fn ensure_participant(interview: &Interview, user: &AuthUser) -> Result<(), AppError> {
    if user.id() == interview.student_id || user.id() == interview.recruiter_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".to_string()))
    }
}

fn require_recruiter_or_admin(user: &AuthUser) -> Result<(), AppError> {
    if matches!(user.role(), UserRole::Recruiter | UserRole::Admin) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This action requires the recruiter or admin role".to_string(),
        ))
    }
}

async fn attach_context(
    db: &PgPool,
    interviews: Vec<Interview>,
) -> Result<Vec<InterviewWithContext>, AppError> {
    let job_ids: Vec<Uuid> = interviews.iter().map(|i| i.job_id).collect();
    let user_ids: Vec<Uuid> = interviews
        .iter()
        .flat_map(|i| [i.student_id, i.recruiter_id])
        .collect();

    let jobs = job_summaries_by_id(db, &job_ids).await?;
    let users = user_summaries_by_id(db, &user_ids).await?;

    Ok(interviews
        .into_iter()
        .map(|i| InterviewWithContext {
            job: jobs.get(&i.job_id).cloned(),
            student: users.get(&i.student_id).cloned(),
            recruiter: users.get(&i.recruiter_id).cloned(),
            interview: i,
        })
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Scheduling
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub application_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub scheduled_time: String,
    pub duration_minutes: Option<i32>,
    pub mode: InterviewMode,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/v1/interviews/schedule
///
/// Creating the interview and moving the application to `interview` (with
/// its details snapshot) happen in one transaction. Online interviews get a
/// room id and meeting link minted here; offline interviews get neither.
pub async fn schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<Interview>), AppError> {
    user.require_role(UserRole::Recruiter)?;
    user.require_approved()?;

    let application =
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(req.application_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Application {} not found", req.application_id))
            })?;

    let job_owner = sqlx::query_scalar::<_, Uuid>("SELECT recruiter_id FROM jobs WHERE id = $1")
        .bind(application.job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", application.job_id)))?;

    if job_owner != user.id() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if !is_schedulable(application.status) {
        return Err(AppError::InvalidState(format!(
            "Cannot schedule an interview for a {} application",
            application.status.as_str()
        )));
    }

    let interview_id = Uuid::new_v4();
    let now = Utc::now();

    let (room_id, meeting_link) = match req.mode {
        InterviewMode::Online => {
            let room = session::mint_room_id(interview_id, now);
            let link = session::meeting_link(&state.config.frontend_url, &room);
            (Some(room), Some(link))
        }
        InterviewMode::Offline => (None, None),
    };

    let details = InterviewDetails {
        date: req.scheduled_date,
        time: req.scheduled_time.clone(),
        mode: req.mode,
        location: req.location.clone(),
        meeting_link: meeting_link.clone(),
        notes: req.notes.clone(),
    };

    let mut tx = state.db.begin().await?;

    let interview = sqlx::query_as::<_, Interview>(
        r#"
        INSERT INTO interviews (id, application_id, job_id, student_id, recruiter_id,
                                scheduled_date, scheduled_time, duration_minutes, mode,
                                room_id, meeting_link, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(interview_id)
    .bind(application.id)
    .bind(application.job_id)
    .bind(application.student_id)
    .bind(user.id())
    .bind(req.scheduled_date)
    .bind(&req.scheduled_time)
    .bind(req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))
    .bind(req.mode)
    .bind(&room_id)
    .bind(&meeting_link)
    .bind(&req.location)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE applications SET status = 'interview', interview_details = $1, updated_at = now() WHERE id = $2",
    )
    .bind(SqlJson(details))
    .bind(application.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(interview)))
}

// ────────────────────────────────────────────────────────────────────────────
// Views
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/interviews/mine
pub async fn list_my_interviews(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<InterviewWithContext>>, AppError> {
    let interviews = match user.role() {
        UserRole::Student => {
            sqlx::query_as::<_, Interview>(
                "SELECT * FROM interviews WHERE student_id = $1 ORDER BY scheduled_date DESC",
            )
            .bind(user.id())
            .fetch_all(&state.db)
            .await?
        }
        UserRole::Recruiter => {
            sqlx::query_as::<_, Interview>(
                "SELECT * FROM interviews WHERE recruiter_id = $1 ORDER BY scheduled_date DESC",
            )
            .bind(user.id())
            .fetch_all(&state.db)
            .await?
        }
        UserRole::Admin => {
            sqlx::query_as::<_, Interview>("SELECT * FROM interviews ORDER BY scheduled_date DESC")
                .fetch_all(&state.db)
                .await?
        }
    };

    Ok(Json(attach_context(&state.db, interviews).await?))
}

/// GET /api/v1/interviews/:id
pub async fn get_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewWithContext>, AppError> {
    let interview = load_interview(&state.db, id).await?;

    if user.role() != UserRole::Admin {
        ensure_participant(&interview, &user)?;
    }

    let mut items = attach_context(&state.db, vec![interview]).await?;
    Ok(Json(items.remove(0)))
}

/// GET /api/v1/interviews/room/:room_id
///
/// Open to any authenticated caller: the room page is reached by link.
pub async fn get_by_room(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<InterviewWithContext>, AppError> {
    let interview = sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE room_id = $1")
        .bind(&room_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview room {room_id} not found")))?;

    let mut items = attach_context(&state.db, vec![interview]).await?;
    Ok(Json(items.remove(0)))
}

// ────────────────────────────────────────────────────────────────────────────
// Live session
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews/:id/start
///
/// Not idempotent: every call appends a roster entry, so reconnects are
/// visible. The recording start stamp is write-once.
pub async fn start_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Interview>, AppError> {
    let interview = load_interview(&state.db, id).await?;
    ensure_participant(&interview, &user)?;

    let now = Utc::now();

    let mut recording = interview.recording.map(|j| j.0);
    session::stamp_recording_start(&mut recording, now);

    let mut roster = interview.participants.0;
    roster.push(session::open_roster_entry(user.id(), user.role(), now));

    let interview = sqlx::query_as::<_, Interview>(
        r#"
        UPDATE interviews
        SET status = 'in-progress', recording = $1, participants = $2, updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(recording.map(SqlJson))
    .bind(SqlJson(roster))
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

/// POST /api/v1/interviews/:id/end
///
/// Completes the session: stamps the recording end, closes the latest open
/// roster entry, and synthesizes an analysis when none exists yet.
pub async fn end_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Interview>, AppError> {
    let interview = load_interview(&state.db, id).await?;
    ensure_participant(&interview, &user)?;

    let now = Utc::now();

    let mut recording = interview.recording.map(|j| j.0);
    session::stamp_recording_end(&mut recording, now);

    let mut roster = interview.participants.0;
    session::close_latest_open(&mut roster, now);

    let analysis = match interview.analysis {
        Some(existing) => existing.0,
        None => synthesis::synthesize(&mut thread_rng(), interview.duration_minutes, now),
    };

    let interview = sqlx::query_as::<_, Interview>(
        r#"
        UPDATE interviews
        SET status = 'completed', recording = $1, participants = $2, analysis = $3,
            updated_at = now()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(recording.map(SqlJson))
    .bind(SqlJson(roster))
    .bind(SqlJson(analysis))
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

/// POST /api/v1/interviews/:id/cancel
pub async fn cancel_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Interview>, AppError> {
    user.require_role(UserRole::Recruiter)?;

    let interview = load_interview(&state.db, id).await?;
    if interview.recruiter_id != user.id() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if interview.status != InterviewStatus::Scheduled {
        return Err(AppError::InvalidState(format!(
            "Cannot cancel a {} interview",
            interview.status.as_str()
        )));
    }

    let interview = sqlx::query_as::<_, Interview>(
        "UPDATE interviews SET status = 'cancelled', updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

// ────────────────────────────────────────────────────────────────────────────
// Question and response capture
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    pub category: Option<String>,
}

/// POST /api/v1/interviews/:id/questions
///
/// Any recruiter may append; there is no per-interview ownership check and
/// no state guard, so questions can be prepared before the session starts.
pub async fn add_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<Interview>, AppError> {
    user.require_role(UserRole::Recruiter)?;

    if req.question.trim().is_empty() {
        return Err(AppError::Validation("Question text is required".to_string()));
    }

    let interview = load_interview(&state.db, id).await?;

    let mut questions = interview.questions.0;
    questions.push(InterviewQuestion {
        question: req.question,
        asked_at: Utc::now(),
        category: req.category,
    });

    let interview = sqlx::query_as::<_, Interview>(
        "UPDATE interviews SET questions = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(SqlJson(questions))
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

#[derive(Debug, Deserialize)]
pub struct ResponseRequest {
    pub question_id: Option<String>,
    pub response: String,
    pub duration_secs: Option<i64>,
    pub sentiment: Option<String>,
    pub score: Option<f64>,
}

/// POST /api/v1/interviews/:id/responses
pub async fn add_response(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ResponseRequest>,
) -> Result<Json<Interview>, AppError> {
    if req.response.trim().is_empty() {
        return Err(AppError::Validation("Response text is required".to_string()));
    }

    let interview = load_interview(&state.db, id).await?;

    let mut responses = interview.responses.0;
    responses.push(InterviewResponse {
        question_id: req.question_id,
        response: req.response,
        duration_secs: req.duration_secs,
        timestamp: Utc::now(),
        sentiment: req.sentiment,
        score: req.score,
    });

    let interview = sqlx::query_as::<_, Interview>(
        "UPDATE interviews SET responses = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(SqlJson(responses))
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

/// PUT /api/v1/interviews/:id/notes
///
/// Replaces the notes wholesale; there is no notes history.
pub async fn update_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<Interview>, AppError> {
    user.require_role(UserRole::Recruiter)?;

    let interview = load_interview(&state.db, id).await?;

    let interview = sqlx::query_as::<_, Interview>(
        "UPDATE interviews SET recruiter_notes = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(&req.notes)
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

// ────────────────────────────────────────────────────────────────────────────
// Decision
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub result: InterviewResult,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
}

fn validate_decision(result: InterviewResult, rating: Option<i32>) -> Result<(), AppError> {
    if result == InterviewResult::Pending {
        return Err(AppError::Validation(
            "Decision must be selected, rejected, or on-hold".to_string(),
        ));
    }
    if let Some(rating) = rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
    }
    Ok(())
}

/// POST /api/v1/interviews/:id/decision
///
/// Selection is only reachable through this write-back: a `selected` result
/// moves the application to `selected`, `rejected` to `rejected`, and
/// `on-hold` leaves it at `interview`. Feedback, when present, is copied
/// onto the application in the same transaction.
pub async fn submit_decision(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<Interview>, AppError> {
    user.require_role(UserRole::Recruiter)?;

    validate_decision(req.result, req.rating)?;

    let interview = load_interview(&state.db, id).await?;

    let mut tx = state.db.begin().await?;

    let updated = sqlx::query_as::<_, Interview>(
        r#"
        UPDATE interviews
        SET result = $1,
            final_feedback = COALESCE($2, final_feedback),
            rating = COALESCE($3, rating),
            updated_at = now()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(req.result)
    .bind(&req.feedback)
    .bind(req.rating)
    .bind(interview.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE applications
        SET status = COALESCE($1, status),
            feedback = COALESCE($2, feedback),
            updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(decision_write_back(req.result))
    .bind(&req.feedback)
    .bind(interview.application_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(updated))
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews/:id/analysis
///
/// Wholesale overwrite; partial analysis edits are not supported.
pub async fn submit_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(analysis): Json<InterviewAnalysis>,
) -> Result<Json<Interview>, AppError> {
    require_recruiter_or_admin(&user)?;

    let interview = load_interview(&state.db, id).await?;

    let interview = sqlx::query_as::<_, Interview>(
        "UPDATE interviews SET analysis = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(SqlJson(analysis))
    .bind(interview.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(interview))
}

/// POST /api/v1/interviews/:id/analysis/generate
///
/// Runs the configured strategy and stores the result.
pub async fn generate_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewAnalysis>, AppError> {
    require_recruiter_or_admin(&user)?;

    let interview = load_interview(&state.db, id).await?;

    let job_title = sqlx::query_scalar::<_, String>("SELECT title FROM jobs WHERE id = $1")
        .bind(interview.job_id)
        .fetch_one(&state.db)
        .await?;

    let candidate_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1")
        .bind(interview.student_id)
        .fetch_one(&state.db)
        .await?;

    let analysis = state
        .analyzer
        .analyze(&interview, &job_title, &candidate_name)
        .await?;

    sqlx::query("UPDATE interviews SET analysis = $1, updated_at = now() WHERE id = $2")
        .bind(SqlJson(analysis.clone()))
        .bind(interview.id)
        .execute(&state.db)
        .await?;

    Ok(Json(analysis))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_not_a_decision() {
        assert!(matches!(
            validate_decision(InterviewResult::Pending, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rating_bounds_enforced() {
        assert!(matches!(
            validate_decision(InterviewResult::Selected, Some(0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_decision(InterviewResult::Selected, Some(6)),
            Err(AppError::Validation(_))
        ));
        assert!(validate_decision(InterviewResult::Selected, Some(5)).is_ok());
    }

    #[test]
    fn on_hold_is_a_valid_decision() {
        assert!(validate_decision(InterviewResult::OnHold, None).is_ok());
    }
}
