use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ActorId, ActorRole, Application, ApplicationId, Appointment, Decision, InternshipId,
    LifecycleStage, StageAudit, StudentId,
};
use super::engine::table;

/// Scan order used to pick the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorConfig {
    pub priority: Vec<ActorRole>,
}

impl ProjectorConfig {
    pub const DEFAULT_PRIORITY: [ActorRole; 4] = [
        ActorRole::Committee,
        ActorRole::Supervisor,
        ActorRole::CourseInstructor,
        ActorRole::Staff,
    ];

    /// Drops duplicates and the student role; an empty result falls back to the default order.
    pub fn new(priority: Vec<ActorRole>) -> Self {
        let mut sanitized: Vec<ActorRole> = Vec::with_capacity(priority.len());
        for role in priority {
            if role != ActorRole::Student && !sanitized.contains(&role) {
                sanitized.push(role);
            }
        }
        if sanitized.is_empty() {
            return Self::default();
        }
        Self {
            priority: sanitized,
        }
    }
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            priority: Self::DEFAULT_PRIORITY.to_vec(),
        }
    }
}

/// Coarse label for where an application currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Submitted,
    Staff,
    CourseInstructor,
    Supervisor,
    Committee,
    Completed,
}

impl WorkflowStep {
    fn for_role(role: ActorRole) -> Self {
        match role {
            ActorRole::Student => Self::Submitted,
            ActorRole::Staff => Self::Staff,
            ActorRole::CourseInstructor => Self::CourseInstructor,
            ActorRole::Supervisor => Self::Supervisor,
            ActorRole::Committee => Self::Committee,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Staff => "Staff Review",
            Self::CourseInstructor => "Course Instructor Review",
            Self::Supervisor => "Supervisor Assignment",
            Self::Committee => "Committee Review",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorSubStatus {
    Waiting,
    Received,
    Approved,
    Rejected,
}

impl ActorSubStatus {
    fn from_audit(audit: &StageAudit) -> Self {
        match (audit.received, audit.decision) {
            (_, Some(Decision::Rejected)) => Self::Rejected,
            (_, Some(Decision::Approved)) => Self::Approved,
            (true, None) => Self::Received,
            (false, None) => Self::Waiting,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Received => "received",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorStatusView {
    pub role: ActorRole,
    pub role_label: &'static str,
    pub status: ActorSubStatus,
    pub status_label: &'static str,
    pub received_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Read-only aggregate shown to every actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStatusView {
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub lifecycle_stage: LifecycleStage,
    pub current_step: WorkflowStep,
    pub current_step_label: &'static str,
    pub next_actor: Option<ActorRole>,
    pub actors: Vec<ActorStatusView>,
    pub supervisor_id: Option<ActorId>,
    pub appointment: Option<Appointment>,
    pub is_completed: bool,
    pub is_rejected: bool,
    pub updated_at: DateTime<Utc>,
}

/// Derives [`WorkflowStatusView`] purely from persisted fields.
#[derive(Debug, Clone, Default)]
pub struct StatusProjector {
    config: ProjectorConfig,
}

impl StatusProjector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    pub fn project(&self, application: &Application) -> WorkflowStatusView {
        let is_completed = application.lifecycle_stage == LifecycleStage::Approved;
        let is_rejected =
            application.lifecycle_stage.is_rejected() || application.rejected_by().is_some();

        let current_step = self.current_step(application, is_completed);

        let actors = ActorRole::reviewers()
            .into_iter()
            .filter_map(|role| {
                application.audit(role).map(|audit| {
                    let status = ActorSubStatus::from_audit(audit);
                    ActorStatusView {
                        role,
                        role_label: role.display_name(),
                        status,
                        status_label: status.label(),
                        received_at: audit.received_at,
                        decided_at: audit.decided_at,
                        feedback: audit.feedback.clone(),
                    }
                })
            })
            .collect();

        WorkflowStatusView {
            application_id: application.id.clone(),
            student_id: application.student_id.clone(),
            internship_id: application.internship_id.clone(),
            lifecycle_stage: application.lifecycle_stage,
            current_step,
            current_step_label: current_step.label(),
            next_actor: table::next_actor(application.lifecycle_stage),
            actors,
            supervisor_id: application.supervisor_id.clone(),
            appointment: application.appointment.clone(),
            is_completed,
            is_rejected,
            updated_at: application.updated_at,
        }
    }

    /// Walks the priority order; the first actor holding custody anchors the step. An actor
    /// that has both received and ruled hands the step to the next actor in the pipeline.
    fn current_step(&self, application: &Application, is_completed: bool) -> WorkflowStep {
        if is_completed {
            return WorkflowStep::Completed;
        }

        if let Some(role) = self.config.priority.iter().copied().find(|role| {
            application
                .audit(*role)
                .map(StageAudit::is_rejected)
                .unwrap_or(false)
        }) {
            return WorkflowStep::for_role(role);
        }

        for role in self.config.priority.iter().copied() {
            let Some(audit) = application.audit(role) else {
                continue;
            };
            if !audit.received {
                continue;
            }
            if !is_settled(application, role, audit) {
                return WorkflowStep::for_role(role);
            }
            return next_in_pipeline(role)
                .map(WorkflowStep::for_role)
                .unwrap_or(WorkflowStep::Completed);
        }

        WorkflowStep::Submitted
    }
}

/// Convenience projection with the default scan order.
pub fn project(application: &Application) -> WorkflowStatusView {
    StatusProjector::default().project(application)
}

fn is_settled(application: &Application, role: ActorRole, audit: &StageAudit) -> bool {
    let ruled = audit.received && audit.decision.is_some();
    match role {
        ActorRole::Supervisor => ruled && application.appointment.is_some(),
        _ => ruled,
    }
}

fn next_in_pipeline(role: ActorRole) -> Option<ActorRole> {
    let reviewers = ActorRole::reviewers();
    reviewers
        .iter()
        .position(|candidate| *candidate == role)
        .and_then(|index| reviewers.get(index + 1).copied())
}
