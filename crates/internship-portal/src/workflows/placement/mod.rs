//! Internship placement approval pipeline.
//!
//! Layers, from the inside out:
//! - [`domain`]: the persisted application record and its invariants.
//! - [`engine`]: pure legality checks producing a [`MutationSet`] per transition.
//! - [`handlers`]: per-role authorization plus the read, decide, write cycle.
//! - [`projector`]: read-only status views derived from stored fields.
//! - [`service`] and [`router`]: the facade and its HTTP surface.

pub mod domain;
pub mod eligibility;
pub mod engine;
pub mod export;
pub mod handlers;
pub mod memory;
pub mod projector;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ActorId, ActorRole, Application, ApplicationId, Appointment, Decision, InternshipId,
    InvariantViolation, LifecycleStage, Progress, StageAudit, StudentId,
};
pub use eligibility::{
    EligibilityGate, EligibilityPolicy, EligibilityReport, ProfileField, StudentProfile,
};
pub use engine::{
    ActionKind, ActionPayload, FieldMutation, MutationSet, Verdict, WorkflowAction,
    WorkflowEngine, WorkflowError,
};
pub use export::{write_status_csv, ExportError};
pub use handlers::{
    CommitteeHandler, CourseInstructorHandler, ErrorKind, ReviewInput, StaffHandler,
    StageHandlerError, StudentHandler, SupervisorHandler,
};
pub use memory::{
    InMemoryApplicationRepository, InMemoryProfileSource, RecordingPublisher, StaticRoleDirectory,
};
pub use projector::{
    project, ActorStatusView, ActorSubStatus, ProjectorConfig, StatusProjector, WorkflowStatusView,
    WorkflowStep,
};
pub use repository::{
    ApplicationRepository, DirectoryError, NotifyError, ProfileSource, RepositoryError,
    RoleDirectory, StageAdvanced, StageEventPublisher,
};
pub use router::placement_router;
pub use service::{PlacementPorts, PlacementSettings, PlacementWorkflowService};
