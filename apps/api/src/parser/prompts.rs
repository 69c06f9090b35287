//! Prompts for the parser's two provider calls. Both demand bare JSON;
//! the extractor still copes with fenced or prose-wrapped replies.

use crate::models::resume::ParsedResume;

pub const PARSER_SYSTEM: &str = "You are an expert HR professional and resume analyst.";

pub const PARSE_MAX_TOKENS: u32 = 2000;
pub const RECOMMENDATIONS_MAX_TOKENS: u32 = 2000;

pub fn parse_prompt(resume_text: &str) -> String {
    format!(
        r#"Analyze this resume carefully and return ONLY a valid JSON response with NO markdown formatting, NO code blocks, NO extra text - JUST THE JSON.

Resume text:
{resume_text}

Return a JSON object with exactly this structure:
{{
  "personal_info": {{"name": "", "email": "", "phone": "", "location": "", "summary": ""}},
  "skills": {{"technical": [], "soft": [], "languages": [], "tools": []}},
  "experience": [{{"job_title": "", "company": "", "duration": "", "description": "", "skills_used": []}}],
  "education": [{{"degree": "", "institution": "", "field": "", "graduation_year": "", "grade": ""}}],
  "certifications": [{{"name": "", "issuer": "", "date": ""}}],
  "projects": [{{"title": "", "description": "", "technologies": []}}],
  "analysis": {{"strengths": [], "weaknesses": [], "suggestions": [], "career_path": "", "industry_fit": "", "experience_level": "", "overall_score": 0}},
  "keywords": {{"ats_friendly_keywords": [], "missing_keywords": [], "ats_score": 0}}
}}"#
    )
}

pub fn recommendations_prompt(parsed: &ParsedResume) -> String {
    let parsed_json =
        serde_json::to_string_pretty(parsed).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"Based on this resume analysis, provide detailed personalized recommendations. Return ONLY valid JSON with NO markdown, NO code blocks, NO extra text.

Resume analysis:
{parsed_json}

Return a JSON object with exactly this structure:
{{
  "resume_improvements": [{{"section": "", "current_issue": "", "recommendation": "", "priority": "high|medium|low", "example": ""}}],
  "skill_gaps": [{{"skill": "", "importance": "", "learning_path": "", "estimated_time": ""}}],
  "certifications": [{{"name": "", "provider": "", "benefit": ""}}],
  "job_targets": [{{"job_title": "", "match_score": 0, "why": "", "preparation": ""}}]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prompt_embeds_resume_text() {
        let prompt = parse_prompt("Asha Rao, Software Engineer");
        assert!(prompt.contains("Asha Rao, Software Engineer"));
        assert!(prompt.contains("\"personal_info\""));
        assert!(prompt.contains("JUST THE JSON"));
    }

    #[test]
    fn recommendations_prompt_embeds_parsed_document() {
        let mut parsed = ParsedResume::default();
        parsed.personal_info.name = Some("Asha Rao".to_string());

        let prompt = recommendations_prompt(&parsed);
        assert!(prompt.contains("Asha Rao"));
        assert!(prompt.contains("\"skill_gaps\""));
    }
}
