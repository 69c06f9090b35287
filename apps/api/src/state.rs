use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::analysis::InterviewAnalyzer;
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    /// Pluggable analysis strategy. Default: SynthesizedAnalyzer. Swap via
    /// ANALYSIS_STRATEGY.
    pub analyzer: Arc<dyn InterviewAnalyzer>,
}
