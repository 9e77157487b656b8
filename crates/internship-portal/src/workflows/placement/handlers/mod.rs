//! Per-role adapters around the workflow engine.
//!
//! Each handler authorizes the acting person, runs one read → decide → write cycle through
//! [`StageContext`], and translates failures into a stable [`ErrorKind`].

mod committee;
mod instructor;
mod staff;
mod student;
mod supervisor;

pub use committee::CommitteeHandler;
pub use instructor::CourseInstructorHandler;
pub use staff::StaffHandler;
pub use student::StudentHandler;
pub use supervisor::SupervisorHandler;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{ActorId, ActorRole, Application, ApplicationId};
use super::engine::{
    ActionPayload, MutationSet, Verdict, WorkflowAction, WorkflowEngine, WorkflowError,
};
use super::repository::{
    ApplicationRepository, DirectoryError, RepositoryError, RoleDirectory, StageAdvanced,
    StageEventPublisher,
};

/// Stable error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IllegalTransition,
    AlreadyActioned,
    MissingFeedback,
    InvalidPayload,
    Ineligible,
    Unauthorized,
    NotFound,
    PersistenceFailure,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::IllegalTransition => "illegal_transition",
            Self::AlreadyActioned => "already_actioned",
            Self::MissingFeedback => "missing_feedback",
            Self::InvalidPayload => "invalid_payload",
            Self::Ineligible => "ineligible",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::PersistenceFailure => "persistence_failure",
        }
    }

    pub const fn user_message(self) -> &'static str {
        match self {
            Self::IllegalTransition => "this action is not currently available",
            Self::AlreadyActioned => "already processed",
            Self::MissingFeedback => "feedback is required when rejecting",
            Self::InvalidPayload => "the submitted form is incomplete",
            Self::Ineligible => "the student profile is not complete enough to apply",
            Self::Unauthorized => "you are not permitted to act on this application",
            Self::NotFound => "application not found",
            Self::PersistenceFailure => "the change could not be saved, please retry",
        }
    }
}

/// Error raised at the stage-handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum StageHandlerError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("{actor} is not entitled to act as {role} on application {application_id}")]
    Unauthorized {
        actor: ActorId,
        role: ActorRole,
        application_id: ApplicationId,
    },
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("student is not eligible: {reason}")]
    Ineligible { reason: String },
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl StageHandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Workflow(WorkflowError::IllegalTransition { .. }) => ErrorKind::IllegalTransition,
            Self::Workflow(WorkflowError::AlreadyActioned { .. }) => ErrorKind::AlreadyActioned,
            Self::Workflow(WorkflowError::MissingFeedback { .. }) => ErrorKind::MissingFeedback,
            Self::Workflow(WorkflowError::InvalidPayload { .. }) => ErrorKind::InvalidPayload,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Ineligible { .. } => ErrorKind::Ineligible,
            Self::Persistence(_) | Self::Directory(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// Typed review input; converted into an engine action plus payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ReviewInput {
    Approve {
        #[serde(default)]
        notes: Option<String>,
    },
    Reject {
        feedback: String,
    },
}

impl ReviewInput {
    pub fn approve() -> Self {
        Self::Approve { notes: None }
    }

    pub fn reject(feedback: impl Into<String>) -> Self {
        Self::Reject {
            feedback: feedback.into(),
        }
    }

    pub(crate) fn into_action(self) -> (WorkflowAction, ActionPayload) {
        match self {
            Self::Approve { notes } => (
                WorkflowAction::Review(Verdict::Approve),
                ActionPayload {
                    feedback: notes,
                    ..ActionPayload::default()
                },
            ),
            Self::Reject { feedback } => (
                WorkflowAction::Review(Verdict::Reject),
                ActionPayload::with_feedback(feedback),
            ),
        }
    }
}

/// Shared ports plus the read → decide → write → notify cycle every handler runs.
pub struct StageContext {
    repository: Arc<dyn ApplicationRepository>,
    directory: Arc<dyn RoleDirectory>,
    publisher: Arc<dyn StageEventPublisher>,
    engine: WorkflowEngine,
}

impl StageContext {
    pub fn new(
        repository: Arc<dyn ApplicationRepository>,
        directory: Arc<dyn RoleDirectory>,
        publisher: Arc<dyn StageEventPublisher>,
    ) -> Self {
        Self {
            repository,
            directory,
            publisher,
            engine: WorkflowEngine::new(),
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn repository(&self) -> &Arc<dyn ApplicationRepository> {
        &self.repository
    }

    pub(crate) fn load(&self, id: &ApplicationId) -> Result<Application, StageHandlerError> {
        match self.repository.fetch(id) {
            Ok(Some(application)) => Ok(application),
            Ok(None) | Err(RepositoryError::NotFound) => {
                Err(StageHandlerError::NotFound(id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) fn deny(
        &self,
        actor: &ActorId,
        role: ActorRole,
        application: &Application,
    ) -> StageHandlerError {
        warn!(
            target: "security",
            actor = %actor,
            role = %role,
            application_id = %application.id,
            "rejected workflow action from unauthorized actor"
        );
        StageHandlerError::Unauthorized {
            actor: actor.clone(),
            role,
            application_id: application.id.clone(),
        }
    }

    /// Staff, course instructors, and committee members are vetted through the directory.
    pub(crate) fn authorize_member(
        &self,
        actor: &ActorId,
        role: ActorRole,
        application: &Application,
    ) -> Result<(), StageHandlerError> {
        if self.directory.holds_role(actor, role, application)? {
            Ok(())
        } else {
            Err(self.deny(actor, role, application))
        }
    }

    /// Run the engine against `application` and persist the result in one write.
    ///
    /// A failed write surfaces as a persistence failure and nothing is published; the caller
    /// retries the whole cycle.
    pub(crate) fn commit(
        &self,
        application: &Application,
        role: ActorRole,
        action: WorkflowAction,
        payload: &ActionPayload,
    ) -> Result<Application, StageHandlerError> {
        let mutations = self
            .engine
            .transition(application, role, action, payload, Utc::now())?;
        let updated = self.repository.save_mutations(&mutations)?;

        info!(
            application_id = %updated.id,
            role = %role,
            action = %action.kind(),
            from = %mutations.from_stage,
            to = %mutations.to_stage,
            "application advanced"
        );

        self.notify(&mutations);
        Ok(updated)
    }

    pub(crate) fn announce(&self, event: StageAdvanced) {
        let application_id = event.application_id.clone();
        if let Err(err) = self.publisher.publish(event) {
            warn!(%application_id, error = %err, "stage hand-off notification failed");
        }
    }

    fn notify(&self, mutations: &MutationSet) {
        self.announce(StageAdvanced::from(mutations));
    }
}
