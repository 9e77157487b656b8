use std::sync::{Arc, Barrier};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::placement::{
    ActionPayload, ActorId, ActorRole, Application, ApplicationId, ApplicationRepository,
    Appointment, DirectoryError, InMemoryApplicationRepository, InMemoryProfileSource,
    InternshipId, LifecycleStage, MutationSet, NotifyError, PlacementPorts, PlacementSettings,
    PlacementWorkflowService, RecordingPublisher, RepositoryError, RoleDirectory,
    StageAdvanced, StageEventPublisher, StaticRoleDirectory, StudentId, StudentProfile,
    Verdict, WorkflowAction, WorkflowEngine,
};

pub(super) const STAFF: &str = "staff-1";
pub(super) const INSTRUCTOR: &str = "instructor-1";
pub(super) const SUPERVISOR: &str = "sup-7";
pub(super) const COMMITTEE: &str = "committee-1";
pub(super) const STUDENT: &str = "stu-001";
pub(super) const INTERNSHIP: &str = "intern-42";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn actor(id: &str) -> ActorId {
    ActorId(id.to_string())
}

pub(super) fn student() -> StudentId {
    StudentId(STUDENT.to_string())
}

pub(super) fn internship() -> InternshipId {
    InternshipId(INTERNSHIP.to_string())
}

pub(super) fn appointment() -> Appointment {
    Appointment {
        date_time: now() + Duration::days(7),
        location: "Engineering Building, Room 301".to_string(),
        notes: Some("Bring transcript".to_string()),
    }
}

pub(super) fn complete_profile(student_id: &str) -> StudentProfile {
    StudentProfile {
        student_id: StudentId(student_id.to_string()),
        first_name: Some("Somchai".to_string()),
        last_name: Some("Rattanakul".to_string()),
        first_name_en: Some("Somchai".to_string()),
        last_name_en: Some("Rattanakul".to_string()),
        email: Some("somchai@example.edu".to_string()),
        phone: Some("+66 81 234 5678".to_string()),
        student_code: Some("6410001".to_string()),
        faculty_id: Some("ENG".to_string()),
        department_id: Some("CPE".to_string()),
        curriculum_id: Some("CPE-2564".to_string()),
    }
}

/// Profile with the last `blank` fields cleared.
pub(super) fn partial_profile(student_id: &str, blank: usize) -> StudentProfile {
    let mut profile = complete_profile(student_id);
    let slots = [
        &mut profile.curriculum_id,
        &mut profile.department_id,
        &mut profile.faculty_id,
        &mut profile.student_code,
        &mut profile.phone,
        &mut profile.email,
        &mut profile.last_name_en,
        &mut profile.first_name_en,
        &mut profile.last_name,
        &mut profile.first_name,
    ];
    for slot in slots.into_iter().take(blank) {
        *slot = None;
    }
    profile
}

pub(super) fn fresh_application() -> Application {
    WorkflowEngine::new().open(
        ApplicationId("app-test".to_string()),
        student(),
        internship(),
        now(),
    )
}

/// One happy-path step: the role, the action it takes, and the payload it sends.
pub(super) fn happy_path() -> Vec<(ActorRole, WorkflowAction, ActionPayload)> {
    vec![
        (ActorRole::Staff, WorkflowAction::Receive, ActionPayload::default()),
        (
            ActorRole::Staff,
            WorkflowAction::Review(Verdict::Approve),
            ActionPayload::default(),
        ),
        (
            ActorRole::CourseInstructor,
            WorkflowAction::Receive,
            ActionPayload::default(),
        ),
        (
            ActorRole::CourseInstructor,
            WorkflowAction::Review(Verdict::Approve),
            ActionPayload::with_supervisor(actor(SUPERVISOR)),
        ),
        (
            ActorRole::Supervisor,
            WorkflowAction::ReceiveAssignment,
            ActionPayload::default(),
        ),
        (
            ActorRole::Supervisor,
            WorkflowAction::ConfirmAssignment,
            ActionPayload::default(),
        ),
        (
            ActorRole::Supervisor,
            WorkflowAction::ScheduleAppointment,
            ActionPayload::with_appointment(appointment()),
        ),
        (
            ActorRole::Committee,
            WorkflowAction::Receive,
            ActionPayload::default(),
        ),
        (
            ActorRole::Committee,
            WorkflowAction::Review(Verdict::Approve),
            ActionPayload::default(),
        ),
    ]
}

/// Apply one engine decision to `application` as a repository would.
pub(super) fn step(
    application: &Application,
    role: ActorRole,
    action: WorkflowAction,
    payload: &ActionPayload,
) -> Application {
    let mutations = WorkflowEngine::new()
        .transition(application, role, action, payload, now())
        .expect("transition is legal");
    mutations.apply(application)
}

/// Drive a fresh record along the happy path until it reaches `stage`.
pub(super) fn application_at(stage: LifecycleStage) -> Application {
    let mut application = fresh_application();
    for (role, action, payload) in happy_path() {
        if application.lifecycle_stage == stage {
            break;
        }
        application = step(&application, role, action, &payload);
    }
    assert_eq!(application.lifecycle_stage, stage, "stage reachable on happy path");
    application
}

pub(super) struct Harness {
    pub(super) service: Arc<PlacementWorkflowService>,
    pub(super) repository: InMemoryApplicationRepository,
    pub(super) profiles: InMemoryProfileSource,
    pub(super) publisher: RecordingPublisher,
}

pub(super) fn directory() -> StaticRoleDirectory {
    StaticRoleDirectory::default()
        .with_member(STAFF, ActorRole::Staff)
        .with_member(INSTRUCTOR, ActorRole::CourseInstructor)
        .with_member(COMMITTEE, ActorRole::Committee)
}

pub(super) fn harness() -> Harness {
    harness_with(PlacementSettings::default())
}

pub(super) fn harness_with(settings: PlacementSettings) -> Harness {
    let repository = InMemoryApplicationRepository::default();
    let profiles = InMemoryProfileSource::default();
    let publisher = RecordingPublisher::default();
    profiles.upsert(complete_profile(STUDENT));

    let ports = PlacementPorts {
        repository: Arc::new(repository.clone()),
        directory: Arc::new(directory()),
        profiles: Arc::new(profiles.clone()),
        publisher: Arc::new(publisher.clone()),
    };

    Harness {
        service: Arc::new(PlacementWorkflowService::new(ports, settings)),
        repository,
        profiles,
        publisher,
    }
}

pub(super) fn service_with_ports(
    repository: Arc<dyn ApplicationRepository>,
    directory: Arc<dyn RoleDirectory>,
    publisher: Arc<dyn StageEventPublisher>,
) -> PlacementWorkflowService {
    let profiles = InMemoryProfileSource::default();
    profiles.upsert(complete_profile(STUDENT));
    PlacementWorkflowService::new(
        PlacementPorts {
            repository,
            directory,
            profiles: Arc::new(profiles),
            publisher,
        },
        PlacementSettings::default(),
    )
}

/// Submit and walk the application through the service until it reaches `stage`.
pub(super) fn submitted_to(harness: &Harness, stage: LifecycleStage) -> Application {
    let service = &harness.service;
    let mut application = service
        .submit(&student(), &internship())
        .expect("submission accepted");
    for (role, action, payload) in happy_path() {
        if application.lifecycle_stage == stage {
            break;
        }
        let acting = match role {
            ActorRole::Staff => STAFF,
            ActorRole::CourseInstructor => INSTRUCTOR,
            ActorRole::Supervisor => SUPERVISOR,
            ActorRole::Committee => COMMITTEE,
            ActorRole::Student => STUDENT,
        };
        application = service
            .act(role, &application.id, &actor(acting), action, &payload)
            .expect("happy path action accepted");
    }
    assert_eq!(application.lifecycle_stage, stage);
    application
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_mutations(&self, _mutations: &MutationSet) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_student(&self, _student_id: &StudentId) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn in_stages(
        &self,
        _stages: &[LifecycleStage],
        _limit: usize,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Holds every `insert` at a barrier so concurrent submissions reach the store together.
pub(super) struct GatedInserts {
    pub(super) inner: InMemoryApplicationRepository,
    pub(super) gate: Barrier,
}

impl GatedInserts {
    pub(super) fn new(inner: InMemoryApplicationRepository, callers: usize) -> Self {
        Self {
            inner,
            gate: Barrier::new(callers),
        }
    }
}

impl ApplicationRepository for GatedInserts {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.gate.wait();
        self.inner.insert(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn save_mutations(&self, mutations: &MutationSet) -> Result<Application, RepositoryError> {
        self.inner.save_mutations(mutations)
    }

    fn for_student(&self, student_id: &StudentId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_student(student_id)
    }

    fn in_stages(
        &self,
        stages: &[LifecycleStage],
        limit: usize,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.in_stages(stages, limit)
    }
}

/// Reads succeed from `inner`; every write of a mutation set fails with `failure`.
pub(super) struct RefusingWrites {
    pub(super) inner: InMemoryApplicationRepository,
    pub(super) failure: RepositoryError,
}

impl ApplicationRepository for RefusingWrites {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn save_mutations(&self, _mutations: &MutationSet) -> Result<Application, RepositoryError> {
        Err(self.failure.clone())
    }

    fn for_student(&self, student_id: &StudentId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_student(student_id)
    }

    fn in_stages(
        &self,
        stages: &[LifecycleStage],
        limit: usize,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.in_stages(stages, limit)
    }
}

pub(super) struct FailingPublisher;

impl StageEventPublisher for FailingPublisher {
    fn publish(&self, _event: StageAdvanced) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay refused".to_string()))
    }
}

pub(super) struct OfflineDirectory;

impl RoleDirectory for OfflineDirectory {
    fn holds_role(
        &self,
        _actor_id: &ActorId,
        _role: ActorRole,
        _application: &Application,
    ) -> Result<bool, DirectoryError> {
        Err(DirectoryError::Unavailable("ldap timeout".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}
