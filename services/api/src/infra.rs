use chrono::{DateTime, NaiveDateTime, Utc};
use internship_portal::config::WorkflowConfig;
use internship_portal::workflows::placement::{
    ActorRole, InMemoryApplicationRepository, InMemoryProfileSource, PlacementPorts,
    PlacementWorkflowService, RecordingPublisher, StaticRoleDirectory, StudentId,
    StudentProfile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const STAFF_ID: &str = "staff-001";
pub(crate) const INSTRUCTOR_ID: &str = "ci-001";
pub(crate) const COMMITTEE_ID: &str = "committee-001";
pub(crate) const SUPERVISOR_ID: &str = "supervisor-001";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service plus handles on the in-process adapters behind it.
pub(crate) struct Portal {
    pub(crate) service: Arc<PlacementWorkflowService>,
    pub(crate) repository: InMemoryApplicationRepository,
    pub(crate) publisher: RecordingPublisher,
}

/// Wire the workflow service against in-memory adapters seeded with demo reviewers and
/// student profiles.
pub(crate) fn build_portal(config: &WorkflowConfig) -> Portal {
    let repository = InMemoryApplicationRepository::default();
    let publisher = RecordingPublisher::default();
    let profiles = InMemoryProfileSource::default();
    for profile in seed_profiles() {
        profiles.upsert(profile);
    }

    let directory = StaticRoleDirectory::default()
        .with_member(STAFF_ID, ActorRole::Staff)
        .with_member(INSTRUCTOR_ID, ActorRole::CourseInstructor)
        .with_member(COMMITTEE_ID, ActorRole::Committee);

    let ports = PlacementPorts {
        repository: Arc::new(repository.clone()),
        directory: Arc::new(directory),
        profiles: Arc::new(profiles),
        publisher: Arc::new(publisher.clone()),
    };

    Portal {
        service: Arc::new(PlacementWorkflowService::new(ports, config.settings())),
        repository,
        publisher,
    }
}

fn seed_profiles() -> Vec<StudentProfile> {
    let complete = |id: &str, first: &str, last: &str, code: &str| StudentProfile {
        student_id: StudentId(id.to_string()),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        first_name_en: Some(first.to_string()),
        last_name_en: Some(last.to_string()),
        email: Some(format!("{}@student.example.edu", first.to_ascii_lowercase())),
        phone: Some("+66 2 555 0100".to_string()),
        student_code: Some(code.to_string()),
        faculty_id: Some("ENG".to_string()),
        department_id: Some("CPE".to_string()),
        curriculum_id: Some("CPE-2565".to_string()),
    };

    let mut sparse = complete("stu-003", "Krit", "Wongsa", "6510003");
    sparse.phone = None;
    sparse.first_name_en = None;
    sparse.last_name_en = None;

    vec![
        complete("stu-001", "Ploy", "Chaiyasit", "6510001"),
        complete("stu-002", "Arun", "Boonmee", "6510002"),
        sparse,
    ]
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM` (interpreted as UTC).
pub(crate) fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD HH:MM ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_portal_scores_profiles() {
        let portal = build_portal(&WorkflowConfig::default());

        let ready = portal
            .service
            .eligibility(&StudentId("stu-001".to_string()))
            .expect("report");
        assert!(ready.eligible);

        let sparse = portal
            .service
            .eligibility(&StudentId("stu-003".to_string()))
            .expect("report");
        assert!(!sparse.eligible);
        assert_eq!(sparse.completion_percent, 70);
    }

    #[test]
    fn parse_datetime_accepts_both_formats() {
        let rfc = parse_datetime("2025-07-01T09:30:00Z").expect("rfc3339 parses");
        let short = parse_datetime("2025-07-01 09:30").expect("short form parses");
        assert_eq!(rfc, short);
        assert!(parse_datetime("next tuesday").is_err());
    }
}
