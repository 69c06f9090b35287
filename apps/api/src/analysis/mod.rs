//! Interview analysis generator — pluggable strategy producing the structured
//! performance report attached to a completed interview.
//!
//! Default: `SynthesizedAnalyzer` (pure-Rust, fixed numeric ranges, fully
//! testable). Alternative: `DelegatedAnalyzer` (LLM-backed; falls back to
//! synthesis when the provider fails, so report generation never surfaces a
//! provider outage to the caller).
//!
//! `AppState` holds an `Arc<dyn InterviewAnalyzer>`, selected at startup via
//! ANALYSIS_STRATEGY.

pub mod delegated;
pub mod prompts;
pub mod synthesis;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::interview::{Interview, InterviewAnalysis};

pub use delegated::DelegatedAnalyzer;
pub use synthesis::SynthesizedAnalyzer;

/// The analyzer trait. Implement this to swap report strategies without
/// touching the interview handlers.
///
/// Carried in `AppState` as `Arc<dyn InterviewAnalyzer>`.
#[async_trait]
pub trait InterviewAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        interview: &Interview,
        job_title: &str,
        candidate_name: &str,
    ) -> Result<InterviewAnalysis, AppError>;
}

/// Builds the analyzer named by ANALYSIS_STRATEGY.
/// Unknown values fall back to synthesis.
pub fn analyzer_from_config(strategy: &str, llm: LlmClient) -> Arc<dyn InterviewAnalyzer> {
    match strategy {
        "delegated" => Arc::new(DelegatedAnalyzer::new(llm)),
        "synthesized" => Arc::new(SynthesizedAnalyzer),
        other => {
            warn!("Unknown ANALYSIS_STRATEGY '{other}', using synthesized");
            Arc::new(SynthesizedAnalyzer)
        }
    }
}
