//! Version capture for resume updates: before a document is overwritten,
//! its full prior content is appended to `previous_versions`.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::resume::{Resume, ResumeVersion};

/// The editable document as one JSON value: what version snapshots store
/// and what the ATS prompt embeds.
pub fn document_json(resume: &Resume) -> Value {
    json!({
        "title": resume.title,
        "personal_info": resume.personal_info.0,
        "education": resume.education.0,
        "experience": resume.experience.0,
        "skills": resume.skills.0,
        "projects": resume.projects.0,
        "certifications": resume.certifications.0,
        "achievements": resume.achievements.0,
        "publications": resume.publications.0,
        "volunteer_work": resume.volunteer_work.0,
        "template": resume.template,
    })
}

/// Snapshots the document as it stands. The snapshot carries the version
/// number it had while live; the row's `version` is bumped by the update
/// that follows.
pub fn capture_version(resume: &Resume, at: DateTime<Utc>) -> ResumeVersion {
    ResumeVersion {
        version_number: resume.version,
        saved_at: at,
        data: document_json(resume),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{PersonalInfo, SkillSet};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn make_resume() -> Resume {
        Resume {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Software Engineer Resume".to_string(),
            personal_info: Json(PersonalInfo {
                first_name: Some("Asha".to_string()),
                email: Some("asha@example.com".to_string()),
                ..PersonalInfo::default()
            }),
            education: Json(vec![]),
            experience: Json(vec![]),
            skills: Json(SkillSet {
                technical: vec!["rust".to_string()],
                ..SkillSet::default()
            }),
            projects: Json(vec![]),
            certifications: Json(vec![]),
            achievements: Json(vec![]),
            publications: Json(vec![]),
            volunteer_work: Json(vec![]),
            template: "professional".to_string(),
            version: 3,
            previous_versions: Json(vec![]),
            ai_analysis: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_keeps_the_live_version_number() {
        let resume = make_resume();
        let snapshot = capture_version(&resume, Utc::now());
        assert_eq!(snapshot.version_number, 3);
    }

    #[test]
    fn snapshot_carries_the_full_document() {
        let resume = make_resume();
        let snapshot = capture_version(&resume, Utc::now());

        assert_eq!(
            snapshot.data["title"].as_str(),
            Some("Software Engineer Resume")
        );
        assert_eq!(
            snapshot.data["personal_info"]["first_name"].as_str(),
            Some("Asha")
        );
        assert_eq!(snapshot.data["skills"]["technical"][0].as_str(), Some("rust"));
        assert_eq!(snapshot.data["template"].as_str(), Some("professional"));
    }
}
