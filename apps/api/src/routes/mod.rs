pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::admin::handlers as admin;
use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::chat::handlers as chat;
use crate::interviews::handlers as interviews;
use crate::jobs::handlers as jobs;
use crate::parser::handlers as parser;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

// Multipart uploads are capped at 5 MB of file content; leave headroom for
// the multipart framing itself.
const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/profile", patch(auth::update_profile))
        // Public job catalog
        .route("/api/v1/jobs", get(jobs::list_public_jobs))
        .route("/api/v1/jobs/:id", get(jobs::get_public_job))
        // Student
        .route("/api/v1/student/jobs", get(jobs::list_student_jobs))
        .route("/api/v1/student/jobs/:id", get(jobs::get_student_job))
        .route("/api/v1/student/jobs/:id/apply", post(applications::apply))
        .route(
            "/api/v1/student/applications",
            get(applications::list_my_applications),
        )
        .route(
            "/api/v1/student/applications/:id",
            get(applications::get_my_application).delete(applications::withdraw),
        )
        .route("/api/v1/student/stats", get(applications::student_stats))
        // Recruiter
        .route(
            "/api/v1/recruiter/jobs",
            post(jobs::create_job).get(jobs::list_recruiter_jobs),
        )
        .route(
            "/api/v1/recruiter/jobs/:id",
            get(jobs::get_recruiter_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/api/v1/recruiter/jobs/:id/close", post(jobs::close_job))
        .route(
            "/api/v1/recruiter/jobs/:id/applications",
            get(applications::list_job_applications),
        )
        .route(
            "/api/v1/recruiter/applications",
            get(applications::list_recruiter_applications),
        )
        .route(
            "/api/v1/recruiter/applications/bulk-shortlist",
            post(applications::bulk_shortlist),
        )
        .route(
            "/api/v1/recruiter/applications/:id",
            get(applications::get_recruiter_application),
        )
        .route(
            "/api/v1/recruiter/applications/:id/status",
            patch(applications::update_status),
        )
        .route(
            "/api/v1/recruiter/applications/:id/interview",
            patch(applications::set_interview_details),
        )
        .route("/api/v1/recruiter/stats", get(jobs::recruiter_stats))
        // Interviews
        .route("/api/v1/interviews/schedule", post(interviews::schedule))
        .route("/api/v1/interviews/mine", get(interviews::list_my_interviews))
        .route(
            "/api/v1/interviews/room/:room_id",
            get(interviews::get_by_room),
        )
        .route("/api/v1/interviews/:id", get(interviews::get_interview))
        .route(
            "/api/v1/interviews/:id/start",
            post(interviews::start_interview),
        )
        .route("/api/v1/interviews/:id/end", post(interviews::end_interview))
        .route(
            "/api/v1/interviews/:id/cancel",
            post(interviews::cancel_interview),
        )
        .route(
            "/api/v1/interviews/:id/questions",
            post(interviews::add_question),
        )
        .route(
            "/api/v1/interviews/:id/responses",
            post(interviews::add_response),
        )
        .route("/api/v1/interviews/:id/notes", put(interviews::update_notes))
        .route(
            "/api/v1/interviews/:id/decision",
            post(interviews::submit_decision),
        )
        .route(
            "/api/v1/interviews/:id/analysis",
            post(interviews::submit_analysis),
        )
        .route(
            "/api/v1/interviews/:id/analysis/generate",
            post(interviews::generate_analysis),
        )
        // Resume builder
        .route("/api/v1/resumes", post(resumes::create_resume))
        .route("/api/v1/resumes/mine", get(resumes::list_my_resumes))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::get_resume)
                .put(resumes::update_resume)
                .delete(resumes::delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/completeness",
            get(resumes::resume_completeness),
        )
        .route("/api/v1/resumes/:id/analyze", post(resumes::analyze_resume))
        .route(
            "/api/v1/resumes/:id/suggestions",
            get(resumes::resume_suggestions),
        )
        // Resume parser
        .route(
            "/api/v1/parser/resumes",
            post(parser::parse_resume).get(parser::list_parse_history),
        )
        .route("/api/v1/parser/resumes/:id", get(parser::get_parse_analysis))
        // Career chat
        .route("/api/v1/chat/messages", post(chat::send_message))
        .route("/api/v1/chat/conversations", get(chat::list_conversations))
        .route(
            "/api/v1/chat/conversations/:conversation_id",
            get(chat::get_conversation).delete(chat::delete_conversation),
        )
        // Admin
        .route("/api/v1/admin/stats", get(admin::admin_stats))
        .route("/api/v1/admin/users", get(admin::list_users))
        .route(
            "/api/v1/admin/users/:id/approval",
            patch(admin::set_user_approval),
        )
        .route(
            "/api/v1/admin/users/:id/status",
            patch(admin::set_user_status),
        )
        .route("/api/v1/admin/users/:id", delete(admin::delete_user))
        .route("/api/v1/admin/jobs", get(admin::list_jobs))
        .route(
            "/api/v1/admin/jobs/:id/approval",
            patch(admin::set_job_approval),
        )
        .route("/api/v1/admin/jobs/:id", delete(admin::delete_job))
        .route(
            "/api/v1/admin/reports/placements",
            get(admin::placement_report),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
