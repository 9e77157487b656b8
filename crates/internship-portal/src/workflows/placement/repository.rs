use serde::{Deserialize, Serialize};

use super::domain::{ActorId, ActorRole, Application, ApplicationId, LifecycleStage, StudentId};
use super::eligibility::StudentProfile;
use super::engine::MutationSet;

/// Storage abstraction for application records.
///
/// Implementations must apply a [`MutationSet`] in one write, isolated per application id,
/// and refuse it when the stored version no longer matches `expected_version`. `insert`
/// refuses a record when the student already holds an open application for the same
/// internship, checked in the same write that stores it.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn save_mutations(&self, mutations: &MutationSet) -> Result<Application, RepositoryError>;
    fn for_student(&self, student_id: &StudentId) -> Result<Vec<Application>, RepositoryError>;
    fn in_stages(
        &self,
        stages: &[LifecycleStage],
        limit: usize,
    ) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("student already has an open application for this internship")]
    OpenApplicationExists,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Answers whether an actor holds a reviewing role for an application.
pub trait RoleDirectory: Send + Sync {
    fn holds_role(
        &self,
        actor_id: &ActorId,
        role: ActorRole,
        application: &Application,
    ) -> Result<bool, DirectoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("role directory unavailable: {0}")]
    Unavailable(String),
}

/// Supplies student profile snapshots for the eligibility gate.
pub trait ProfileSource: Send + Sync {
    fn profile(&self, student_id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError>;
}

/// Outbound hand-off to whoever acts next (e-mail, in-app inbox...).
pub trait StageEventPublisher: Send + Sync {
    fn publish(&self, event: StageAdvanced) -> Result<(), NotifyError>;
}

/// Emitted after a transition is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAdvanced {
    pub application_id: ApplicationId,
    pub actor_role: ActorRole,
    pub from_stage: LifecycleStage,
    pub new_stage: LifecycleStage,
    pub next_actor_role: Option<ActorRole>,
}

impl From<&MutationSet> for StageAdvanced {
    fn from(mutations: &MutationSet) -> Self {
        Self {
            application_id: mutations.application_id.clone(),
            actor_role: mutations.actor_role,
            from_stage: mutations.from_stage,
            new_stage: mutations.to_stage,
            next_actor_role: mutations.next_actor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
