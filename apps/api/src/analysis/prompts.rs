//! Prompt builders for the delegated analysis strategy.

use crate::models::interview::Interview;

pub const ANALYST_SYSTEM: &str =
    "You are an expert interview analyst. Provide detailed performance analysis in JSON format.";

/// Builds the analysis prompt from the interview transcript metadata.
pub fn interview_analysis_prompt(
    interview: &Interview,
    job_title: &str,
    candidate_name: &str,
) -> String {
    let questions = if interview.questions.0.is_empty() {
        "None recorded".to_string()
    } else {
        interview
            .questions
            .0
            .iter()
            .map(|q| format!("- {}", q.question))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let notes = interview.recruiter_notes.as_deref().unwrap_or("No notes");

    format!(
        r#"Analyze this interview and provide detailed performance metrics.

Interview Details:
- Duration: {duration} minutes
- Questions Asked: {question_count}
- Job: {job_title}
- Candidate: {candidate_name}

Questions:
{questions}

Notes: {notes}

Provide JSON with:
{{
  "overallScore": <0-100>,
  "communicationScore": <0-100>,
  "technicalScore": <0-100>,
  "confidenceScore": <0-100>,
  "sentimentAnalysis": {{"positive": <0-1>, "neutral": <0-1>, "negative": <0-1>}},
  "strengths": [<3-5 strengths>],
  "weaknesses": [<2-3 weaknesses>],
  "recommendations": [<3-5 recommendations>],
  "aiSummary": "<brief summary>",
  "detailedFeedback": "<detailed feedback>"
}}"#,
        duration = interview.duration_minutes,
        question_count = interview.questions.0.len(),
    )
}
