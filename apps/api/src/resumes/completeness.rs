//! Weighted completeness scoring. Each section contributes a fixed share
//! of the percentage; the five core sections are also reported by name
//! when empty so the builder UI can point at them.

use serde::Serialize;

use crate::models::resume::Resume;

const PERSONAL_INFO_WEIGHT: u32 = 15;
const EDUCATION_WEIGHT: u32 = 20;
const EXPERIENCE_WEIGHT: u32 = 25;
const SKILLS_WEIGHT: u32 = 15;
const PROJECTS_WEIGHT: u32 = 15;
const CERTIFICATIONS_WEIGHT: u32 = 5;
const ACHIEVEMENTS_WEIGHT: u32 = 5;

#[derive(Debug, Serialize)]
pub struct CompletenessReport {
    pub percentage: u32,
    pub missing_sections: Vec<&'static str>,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

pub fn compute(resume: &Resume) -> CompletenessReport {
    let mut percentage = 0;
    let mut missing_sections = Vec::new();

    let personal = &resume.personal_info.0;
    if filled(&personal.first_name) && filled(&personal.email) {
        percentage += PERSONAL_INFO_WEIGHT;
    } else {
        missing_sections.push("Personal Information");
    }

    if resume.education.0.is_empty() {
        missing_sections.push("Education");
    } else {
        percentage += EDUCATION_WEIGHT;
    }

    if resume.experience.0.is_empty() {
        missing_sections.push("Work Experience");
    } else {
        percentage += EXPERIENCE_WEIGHT;
    }

    if resume.skills.0.technical.is_empty() {
        missing_sections.push("Skills");
    } else {
        percentage += SKILLS_WEIGHT;
    }

    if resume.projects.0.is_empty() {
        missing_sections.push("Projects");
    } else {
        percentage += PROJECTS_WEIGHT;
    }

    // Optional extras: they raise the score but are never flagged missing.
    if !resume.certifications.0.is_empty() {
        percentage += CERTIFICATIONS_WEIGHT;
    }
    if !resume.achievements.0.is_empty() {
        percentage += ACHIEVEMENTS_WEIGHT;
    }

    CompletenessReport {
        percentage,
        missing_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        AchievementEntry, CertificationEntry, EducationEntry, ExperienceEntry, PersonalInfo,
        ProjectEntry, SkillSet,
    };
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn make_empty_resume() -> Resume {
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

    fn make_full_resume() -> Resume {
        let mut resume = make_empty_resume();
        resume.personal_info = Json(PersonalInfo {
            first_name: Some("Asha".to_string()),
            email: Some("asha@example.com".to_string()),
            ..PersonalInfo::default()
        });
        resume.education = Json(vec![EducationEntry {
            degree: "B.Tech".to_string(),
            institution: "IIT Delhi".to_string(),
            location: None,
            major: Some("CSE".to_string()),
            start_date: None,
            end_date: None,
            cgpa: Some(8.9),
            achievements: vec![],
        }]);
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
        resume.skills = Json(SkillSet {
            technical: vec!["rust".to_string()],
            ..SkillSet::default()
        });
        resume.projects = Json(vec![ProjectEntry {
            title: "Portfolio".to_string(),
            description: None,
            technologies: vec![],
            role: None,
            url: None,
            github: None,
            highlights: vec![],
        }]);
        resume.certifications = Json(vec![CertificationEntry {
            name: "AWS CCP".to_string(),
            issuer: None,
            issue_date: None,
            expiry_date: None,
            credential_id: None,
            url: None,
        }]);
        resume.achievements = Json(vec![AchievementEntry {
            title: "Hackathon winner".to_string(),
            description: None,
            date: None,
            issuer: None,
        }]);
        resume
    }

    #[test]
    fn empty_resume_scores_zero() {
        let report = compute(&make_empty_resume());
        assert_eq!(report.percentage, 0);
        assert_eq!(
            report.missing_sections,
            vec![
                "Personal Information",
                "Education",
                "Work Experience",
                "Skills",
                "Projects"
            ]
        );
    }

    #[test]
    fn full_resume_scores_hundred() {
        let report = compute(&make_full_resume());
        assert_eq!(report.percentage, 100);
        assert!(report.missing_sections.is_empty());
    }

    #[test]
    fn partial_resume_scores_its_sections() {
        let mut resume = make_empty_resume();
        resume.personal_info = Json(PersonalInfo {
            first_name: Some("Asha".to_string()),
            email: Some("asha@example.com".to_string()),
            ..PersonalInfo::default()
        });
        resume.skills = Json(SkillSet {
            technical: vec!["rust".to_string()],
            ..SkillSet::default()
        });

        let report = compute(&resume);
        assert_eq!(report.percentage, 30);
        assert_eq!(
            report.missing_sections,
            vec!["Education", "Work Experience", "Projects"]
        );
    }

    #[test]
    fn blank_email_does_not_count_as_personal_info() {
        let mut resume = make_empty_resume();
        resume.personal_info = Json(PersonalInfo {
            first_name: Some("Asha".to_string()),
            email: Some("   ".to_string()),
            ..PersonalInfo::default()
        });

        let report = compute(&resume);
        assert!(report.missing_sections.contains(&"Personal Information"));
    }
}
