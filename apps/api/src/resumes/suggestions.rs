//! Local, deterministic improvement suggestions derived from the stored
//! document. No provider involvement.

use serde::Serialize;

use crate::models::resume::Resume;

const MIN_PROJECTS: usize = 2;

const SUMMARY_EXAMPLE: &str =
    "Results-driven software engineer with 3+ years of experience in full-stack development...";

#[derive(Debug, Serialize)]
pub struct ResumeSuggestion {
    pub section: &'static str,
    pub priority: &'static str,
    pub suggestion: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<&'static str>,
}

pub fn suggest(resume: &Resume) -> Vec<ResumeSuggestion> {
    let mut suggestions = Vec::new();

    let has_summary = resume
        .personal_info
        .0
        .professional_summary
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    if !has_summary {
        suggestions.push(ResumeSuggestion {
            section: "Professional Summary",
            priority: "high",
            suggestion: "Add a professional summary to introduce yourself",
            example: Some(SUMMARY_EXAMPLE),
        });
    }

    if resume.projects.0.len() < MIN_PROJECTS {
        suggestions.push(ResumeSuggestion {
            section: "Projects",
            priority: "high",
            suggestion: "Add at least 2-3 significant projects to showcase your practical skills",
            example: None,
        });
    }

    if resume.certifications.0.is_empty() {
        suggestions.push(ResumeSuggestion {
            section: "Certifications",
            priority: "medium",
            suggestion: "Add relevant certifications to boost credibility",
            example: None,
        });
    }

    if resume.experience.0.is_empty() {
        suggestions.push(ResumeSuggestion {
            section: "Experience",
            priority: "high",
            suggestion: "Add internships, part-time work, or volunteer experience",
            example: None,
        });
    }

    suggestions.push(ResumeSuggestion {
        section: "General",
        priority: "medium",
        suggestion: "Start bullet points with strong action verbs",
        example: None,
    });
    suggestions.push(ResumeSuggestion {
        section: "General",
        priority: "high",
        suggestion: "Quantify your achievements with numbers and metrics",
        example: None,
    });

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, PersonalInfo, ProjectEntry, SkillSet};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn make_resume() -> Resume {
        Resume {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "My Resume".to_string(),
            personal_info: Json(PersonalInfo::default()),
            education: Json(vec![]),
            experience: Json(vec![]),
            skills: Json(SkillSet::default()),
            projects: Json(vec![]),
            certifications: Json(vec![]),
            achievements: Json(vec![]),
            publications: Json(vec![]),
            volunteer_work: Json(vec![]),
            template: "professional".to_string(),
            version: 1,
            previous_versions: Json(vec![]),
            ai_analysis: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_project(title: &str) -> ProjectEntry {
        ProjectEntry {
            title: title.to_string(),
            description: None,
            technologies: vec![],
            role: None,
            url: None,
            github: None,
            highlights: vec![],
        }
    }

    #[test]
    fn empty_resume_gets_every_suggestion() {
        let suggestions = suggest(&make_resume());
        let sections: Vec<_> = suggestions.iter().map(|s| s.section).collect();

        assert_eq!(
            sections,
            vec![
                "Professional Summary",
                "Projects",
                "Certifications",
                "Experience",
                "General",
                "General"
            ]
        );
    }

    #[test]
    fn filled_sections_are_not_flagged() {
        let mut resume = make_resume();
        resume.personal_info = Json(PersonalInfo {
            professional_summary: Some("Engineer who ships.".to_string()),
            ..PersonalInfo::default()
        });
        resume.projects = Json(vec![make_project("One"), make_project("Two")]);
        resume.experience = Json(vec![ExperienceEntry {
            title: "Intern".to_string(),
            company: "Acme".to_string(),
            location: None,
            start_date: None,
            end_date: None,
            current: false,
            description: None,
            responsibilities: vec![],
            achievements: vec![],
        }]);

        let sections: Vec<_> = suggest(&resume).iter().map(|s| s.section).collect();
        assert_eq!(sections, vec!["Certifications", "General", "General"]);
    }

    #[test]
    fn single_project_still_counts_as_thin() {
        let mut resume = make_resume();
        resume.projects = Json(vec![make_project("Only one")]);

        assert!(suggest(&resume).iter().any(|s| s.section == "Projects"));
    }

    #[test]
    fn general_advice_is_always_present() {
        let suggestions = suggest(&make_resume());
        assert_eq!(
            suggestions.iter().filter(|s| s.section == "General").count(),
            2
        );
    }

    #[test]
    fn summary_suggestion_carries_an_example() {
        let suggestions = suggest(&make_resume());
        let summary = suggestions
            .iter()
            .find(|s| s.section == "Professional Summary")
            .expect("summary suggestion");
        assert!(summary.example.is_some());
    }
}
