//! Registration, login, and profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;

use crate::auth::{mint_token, AuthUser};
use crate::errors::{is_unique_violation, AppError};
use crate::models::user::{RecruiterProfile, StudentProfile, User, UserPublic, UserRole};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserPublic,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if req.role == UserRole::Admin {
        return Err(AppError::Validation(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }
    Ok(())
}

/// Students can use the portal immediately; recruiters wait for admin
/// approval.
fn approved_on_signup(role: UserRole) -> bool {
    role == UserRole::Student
}

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

async fn check_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification failed: {e}")))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&req)?;

    let email = req.email.trim().to_lowercase();

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let password_hash = hash_password(req.password).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, role, phone, is_approved)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(req.role)
    .bind(&req.phone)
    .bind(approved_on_signup(req.role))
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    let token = mint_token(user.id, user.role, &state.config.jwt_secret)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let password_ok = check_password(req.password, user.password_hash.clone()).await?;
    if !password_ok {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    let token = mint_token(user.id, user.role, &state.config.jwt_secret)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

/// GET /api/v1/auth/me
pub async fn me(user: AuthUser) -> Json<UserPublic> {
    Json(user.0.into())
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentProfilePatch {
    pub roll_number: Option<String>,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub cgpa: Option<f64>,
    pub resume_url: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// `verified` is deliberately absent: only an admin flow may set it.
#[derive(Debug, Default, Deserialize)]
pub struct RecruiterProfilePatch {
    pub company_name: Option<String>,
    pub designation: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub company_logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub student_profile: Option<StudentProfilePatch>,
    pub recruiter_profile: Option<RecruiterProfilePatch>,
}

fn apply_student_patch(profile: &mut StudentProfile, patch: StudentProfilePatch) {
    if let Some(v) = patch.roll_number {
        profile.roll_number = Some(v);
    }
    if let Some(v) = patch.department {
        profile.department = Some(v);
    }
    if let Some(v) = patch.year {
        profile.year = Some(v);
    }
    if let Some(v) = patch.cgpa {
        profile.cgpa = Some(v);
    }
    if let Some(v) = patch.resume_url {
        profile.resume_url = Some(v);
    }
    if let Some(v) = patch.skills {
        profile.skills = v;
    }
}

fn apply_recruiter_patch(profile: &mut RecruiterProfile, patch: RecruiterProfilePatch) {
    if let Some(v) = patch.company_name {
        profile.company_name = Some(v);
    }
    if let Some(v) = patch.designation {
        profile.designation = Some(v);
    }
    if let Some(v) = patch.company_website {
        profile.company_website = Some(v);
    }
    if let Some(v) = patch.company_description {
        profile.company_description = Some(v);
    }
    if let Some(v) = patch.company_logo {
        profile.company_logo = Some(v);
    }
}

/// PATCH /api/v1/auth/profile
///
/// Allow-list patch: only named fields are applied, and a profile document
/// is only touched when it matches the caller's role.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<UserPublic>, AppError> {
    let AuthUser(user) = user;

    let name = match req.name {
        Some(n) if n.trim().is_empty() => {
            return Err(AppError::Validation("Name cannot be empty".to_string()))
        }
        Some(n) => n.trim().to_string(),
        None => user.name,
    };
    let phone = req.phone.or(user.phone);

    let student_profile = match (user.student_profile, req.student_profile) {
        (existing, Some(patch)) if user.role == UserRole::Student => {
            let mut profile = existing.map(|j| j.0).unwrap_or_default();
            apply_student_patch(&mut profile, patch);
            Some(SqlJson(profile))
        }
        (existing, _) => existing,
    };

    let recruiter_profile = match (user.recruiter_profile, req.recruiter_profile) {
        (existing, Some(patch)) if user.role == UserRole::Recruiter => {
            let mut profile = existing.map(|j| j.0).unwrap_or_default();
            apply_recruiter_patch(&mut profile, patch);
            Some(SqlJson(profile))
        }
        (existing, _) => existing,
    };

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = $1, phone = $2, student_profile = $3, recruiter_profile = $4,
            updated_at = now()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&phone)
    .bind(&student_profile)
    .bind(&recruiter_profile)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_register_request() -> RegisterRequest {
        RegisterRequest {
            name: "Asha Verma".to_string(),
            email: "asha@example.edu".to_string(),
            password: "hunter42".to_string(),
            role: UserRole::Student,
            phone: None,
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(validate_registration(&make_register_request()).is_ok());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut req = make_register_request();
        req.name = "   ".to_string();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_short_password_is_rejected() {
        let mut req = make_register_request();
        req.password = "abc".to_string();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let mut req = make_register_request();
        req.email = "not-an-email".to_string();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_admin_self_registration_is_rejected() {
        let mut req = make_register_request();
        req.role = UserRole::Admin;
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_students_are_approved_on_signup_recruiters_are_not() {
        assert!(approved_on_signup(UserRole::Student));
        assert!(!approved_on_signup(UserRole::Recruiter));
    }

    #[test]
    fn test_student_patch_merges_only_provided_fields() {
        let mut profile = StudentProfile {
            roll_number: Some("CS-101".to_string()),
            department: Some("CSE".to_string()),
            cgpa: Some(8.2),
            ..Default::default()
        };
        apply_student_patch(
            &mut profile,
            StudentProfilePatch {
                cgpa: Some(8.6),
                skills: Some(vec!["rust".to_string()]),
                ..Default::default()
            },
        );
        assert_eq!(profile.cgpa, Some(8.6));
        assert_eq!(profile.skills, vec!["rust".to_string()]);
        assert_eq!(profile.roll_number.as_deref(), Some("CS-101"));
        assert_eq!(profile.department.as_deref(), Some("CSE"));
    }

    #[test]
    fn test_recruiter_patch_never_touches_verified() {
        let mut profile = RecruiterProfile {
            verified: true,
            ..Default::default()
        };
        apply_recruiter_patch(
            &mut profile,
            RecruiterProfilePatch {
                company_name: Some("Acme Corp".to_string()),
                ..Default::default()
            },
        );
        assert!(profile.verified);
        assert_eq!(profile.company_name.as_deref(), Some("Acme Corp"));
    }
}
