use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::llm_client::json_extract::extract_json;
use crate::models::resume::{ParsedResume, ResumeAnalysisRecord, ResumeRecommendations};
use crate::models::user::UserRole;
use crate::parser::extract;
use crate::parser::prompts::{
    parse_prompt, recommendations_prompt, PARSER_SYSTEM, PARSE_MAX_TOKENS,
    RECOMMENDATIONS_MAX_TOKENS,
};
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub id: Uuid,
    pub parsed: ParsedResume,
    pub recommendations: ResumeRecommendations,
}

/// POST /api/v1/parser/resumes
///
/// Multipart upload, field `resume`. Two provider calls run in sequence:
/// the structured parse, then recommendations derived from it. Either
/// failing fails the whole request; nothing is stored on failure.
pub async fn parse_resume(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ParseResponse>), AppError> {
    user.require_role(UserRole::Student)?;

    let mut upload: Option<(String, String, Bytes)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("resume") {
            let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|e| {
                AppError::Validation(format!("Could not read the uploaded file: {e}"))
            })?;
            upload = Some((file_name, content_type, data));
            break;
        }
    }

    let (file_name, content_type, data) = upload
        .ok_or_else(|| AppError::Validation("A 'resume' file field is required".to_string()))?;

    extract::ensure_within_limit(data.len())?;
    let resume_text = extract::extract_text(&content_type, &data)?;

    let parse_reply = state
        .llm
        .complete(PARSER_SYSTEM, &parse_prompt(&resume_text), PARSE_MAX_TOKENS)
        .await?;
    let parsed: ParsedResume = extract_json(&parse_reply).map_err(|e| {
        AppError::Provider(format!(
            "Resume parsing failed: the provider reply was not usable JSON ({e})"
        ))
    })?;

    let recommendations_reply = state
        .llm
        .complete(
            PARSER_SYSTEM,
            &recommendations_prompt(&parsed),
            RECOMMENDATIONS_MAX_TOKENS,
        )
        .await?;
    let recommendations: ResumeRecommendations =
        extract_json(&recommendations_reply).map_err(|e| {
            AppError::Provider(format!(
                "Recommendation generation failed: the provider reply was not usable JSON ({e})"
            ))
        })?;

    let file_key = storage::upload_resume_file(
        &state.s3,
        &state.config.s3_bucket,
        user.id(),
        &file_name,
        &content_type,
        data,
    )
    .await?;

    let record = sqlx::query_as::<_, ResumeAnalysisRecord>(
        r#"
        INSERT INTO resume_analyses (student_id, file_name, file_key, resume_text,
                                     parsed_data, recommendations)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user.id())
    .bind(&file_name)
    .bind(&file_key)
    .bind(&resume_text)
    .bind(sqlx::types::Json(parsed.clone()))
    .bind(sqlx::types::Json(recommendations.clone()))
    .fetch_one(&state.db)
    .await?;

    info!("Parsed resume '{file_name}' into analysis {}", record.id);

    Ok((
        StatusCode::CREATED,
        Json(ParseResponse {
            id: record.id,
            parsed,
            recommendations,
        }),
    ))
}

/// GET /api/v1/parser/resumes
pub async fn list_parse_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ResumeAnalysisRecord>>, AppError> {
    user.require_role(UserRole::Student)?;

    let records = sqlx::query_as::<_, ResumeAnalysisRecord>(
        "SELECT * FROM resume_analyses WHERE student_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(records))
}

/// GET /api/v1/parser/resumes/:id
pub async fn get_parse_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeAnalysisRecord>, AppError> {
    let record = sqlx::query_as::<_, ResumeAnalysisRecord>(
        "SELECT * FROM resume_analyses WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Resume analysis {id} not found")))?;

    if record.student_id != user.id() && user.role() != UserRole::Admin {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(record))
}
