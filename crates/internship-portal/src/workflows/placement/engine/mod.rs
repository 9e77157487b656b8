//! Pure decision logic for the placement approval workflow.
//!
//! The engine reads a stored [`Application`], checks the requested action against the
//! legality table, and returns the [`MutationSet`] the caller must persist. It performs no
//! I/O and never logs; callers supply the timestamp.

mod mutation;
pub mod table;

pub use mutation::{FieldMutation, MutationSet};
pub use table::TransitionRule;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    is_blank, normalized_text, ActorId, ActorRole, Application, ApplicationId, Appointment,
    Decision, InternshipId, LifecycleStage, Progress, StageAudit, StudentId,
};

/// Outcome requested by a reviewing actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
}

/// Closed set of workflow actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    Receive,
    Review(Verdict),
    ReceiveAssignment,
    ConfirmAssignment,
    ScheduleAppointment,
}

impl WorkflowAction {
    pub const fn kind(self) -> ActionKind {
        match self {
            Self::Submit => ActionKind::Submit,
            Self::Receive => ActionKind::Receive,
            Self::Review(_) => ActionKind::Review,
            Self::ReceiveAssignment => ActionKind::ReceiveAssignment,
            Self::ConfirmAssignment => ActionKind::ConfirmAssignment,
            Self::ScheduleAppointment => ActionKind::ScheduleAppointment,
        }
    }
}

/// Action identity without its verdict; the legality table is keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Submit,
    Receive,
    Review,
    ReceiveAssignment,
    ConfirmAssignment,
    ScheduleAppointment,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Receive => "receive",
            Self::Review => "review",
            Self::ReceiveAssignment => "receive_assignment",
            Self::ConfirmAssignment => "confirm_assignment",
            Self::ScheduleAppointment => "schedule_appointment",
        }
    }

    /// Whether `role` may ever issue this action.
    pub const fn permitted_for(self, role: ActorRole) -> bool {
        matches!(
            (role, self),
            (ActorRole::Student, Self::Submit)
                | (ActorRole::Staff, Self::Receive | Self::Review)
                | (ActorRole::CourseInstructor, Self::Receive | Self::Review)
                | (
                    ActorRole::Supervisor,
                    Self::ReceiveAssignment | Self::ConfirmAssignment | Self::ScheduleAppointment
                )
                | (ActorRole::Committee, Self::Receive | Self::Review)
        )
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Free-form inputs that accompany an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<ActorId>,
    #[serde(default)]
    pub appointment: Option<Appointment>,
}

impl ActionPayload {
    pub fn with_feedback(feedback: impl Into<String>) -> Self {
        Self {
            feedback: Some(feedback.into()),
            ..Self::default()
        }
    }

    pub fn with_supervisor(supervisor_id: ActorId) -> Self {
        Self {
            supervisor_id: Some(supervisor_id),
            ..Self::default()
        }
    }

    pub fn with_appointment(appointment: Appointment) -> Self {
        Self {
            appointment: Some(appointment),
            ..Self::default()
        }
    }
}

/// Business-rule failures raised by the engine. None of them mutate anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{role} cannot {action} while the application is {stage}")]
    IllegalTransition {
        role: ActorRole,
        action: ActionKind,
        stage: LifecycleStage,
    },
    #[error("{role} has already performed {action} on this application")]
    AlreadyActioned { role: ActorRole, action: ActionKind },
    #[error("{role} must provide feedback when rejecting")]
    MissingFeedback { role: ActorRole },
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },
}

/// Stateless transition engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowEngine;

impl WorkflowEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build the freshly submitted record for a student's application.
    pub fn open(
        &self,
        id: ApplicationId,
        student_id: StudentId,
        internship_id: InternshipId,
        now: DateTime<Utc>,
    ) -> Application {
        Application {
            id,
            student_id,
            internship_id,
            lifecycle_stage: LifecycleStage::Submitted,
            staff: StageAudit::default(),
            course_instructor: StageAudit::default(),
            supervisor: StageAudit::default(),
            committee: StageAudit::default(),
            supervisor_id: None,
            appointment: None,
            submitted_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Decide whether `role` may perform `action` and compute the resulting mutations.
    pub fn transition(
        &self,
        application: &Application,
        role: ActorRole,
        action: WorkflowAction,
        payload: &ActionPayload,
        now: DateTime<Utc>,
    ) -> Result<MutationSet, WorkflowError> {
        let kind = action.kind();
        if !kind.permitted_for(role) {
            return Err(WorkflowError::IllegalTransition {
                role,
                action: kind,
                stage: application.lifecycle_stage,
            });
        }

        validate_payload(role, action, payload)?;

        if kind == ActionKind::Submit {
            // The record exists, so the submission already happened.
            return Err(WorkflowError::AlreadyActioned { role, action: kind });
        }

        let rule = table::rule_for(role, kind).ok_or(WorkflowError::IllegalTransition {
            role,
            action: kind,
            stage: application.lifecycle_stage,
        })?;

        check_position(application, rule)?;

        let (to_stage, mutations) = plan(rule, action, payload, now);

        Ok(MutationSet {
            application_id: application.id.clone(),
            expected_version: application.version,
            actor_role: role,
            action,
            from_stage: application.lifecycle_stage,
            to_stage,
            occurred_at: now,
            mutations,
        })
    }

    /// Every `(role, action)` pair that is legal right now.
    pub fn available_actions(&self, application: &Application) -> Vec<(ActorRole, ActionKind)> {
        match application.progress() {
            Progress::Active(stage) => table::rule_from(stage)
                .map(|rule| vec![(rule.role, rule.action)])
                .unwrap_or_default(),
            Progress::Approved | Progress::Rejected { .. } => Vec::new(),
        }
    }
}

fn validate_payload(
    role: ActorRole,
    action: WorkflowAction,
    payload: &ActionPayload,
) -> Result<(), WorkflowError> {
    match action {
        WorkflowAction::Review(Verdict::Reject) => {
            if is_blank(payload.feedback.as_deref()) {
                return Err(WorkflowError::MissingFeedback { role });
            }
        }
        WorkflowAction::Review(Verdict::Approve) if role == ActorRole::CourseInstructor => {
            let missing = payload
                .supervisor_id
                .as_ref()
                .map(|id| id.0.trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(WorkflowError::InvalidPayload {
                    reason: "course instructor approval requires a supervisor".to_string(),
                });
            }
        }
        WorkflowAction::ScheduleAppointment => match &payload.appointment {
            Some(appointment) if !appointment.location.trim().is_empty() => {}
            Some(_) => {
                return Err(WorkflowError::InvalidPayload {
                    reason: "appointment location must not be empty".to_string(),
                })
            }
            None => {
                return Err(WorkflowError::InvalidPayload {
                    reason: "appointment details are required".to_string(),
                })
            }
        },
        _ => {}
    }
    Ok(())
}

fn check_position(application: &Application, rule: &TransitionRule) -> Result<(), WorkflowError> {
    let already = WorkflowError::AlreadyActioned {
        role: rule.role,
        action: rule.action,
    };
    let illegal = WorkflowError::IllegalTransition {
        role: rule.role,
        action: rule.action,
        stage: application.lifecycle_stage,
    };

    match application.progress() {
        Progress::Active(stage) if stage == rule.from => Ok(()),
        Progress::Active(stage) if stage.ordinal() > rule.from.ordinal() => Err(already),
        Progress::Active(_) => Err(illegal),
        Progress::Approved => Err(already),
        Progress::Rejected { by: Some(by) } => match table::review_stage(by) {
            Some(rejected_at) if rule.from.ordinal() <= rejected_at.ordinal() => Err(already),
            _ => Err(illegal),
        },
        Progress::Rejected { by: None } => Err(illegal),
    }
}

fn plan(
    rule: &TransitionRule,
    action: WorkflowAction,
    payload: &ActionPayload,
    now: DateTime<Utc>,
) -> (LifecycleStage, Vec<FieldMutation>) {
    let role = rule.role;
    let mut mutations = Vec::new();

    let to_stage = match action {
        WorkflowAction::Receive | WorkflowAction::ReceiveAssignment => {
            mutations.push(FieldMutation::Received { role, at: now });
            rule.to
        }
        WorkflowAction::Review(Verdict::Approve) => {
            mutations.push(FieldMutation::Decided {
                role,
                decision: Decision::Approved,
                feedback: normalized_text(payload.feedback.as_deref()),
                at: now,
            });
            if let Some(supervisor_id) = payload.supervisor_id.clone() {
                if role == ActorRole::CourseInstructor {
                    mutations.push(FieldMutation::SupervisorAssigned {
                        supervisor_id: ActorId(supervisor_id.0.trim().to_string()),
                    });
                }
            }
            rule.to
        }
        WorkflowAction::Review(Verdict::Reject) => {
            mutations.push(FieldMutation::Decided {
                role,
                decision: Decision::Rejected,
                feedback: normalized_text(payload.feedback.as_deref()),
                at: now,
            });
            rule.on_reject.unwrap_or(LifecycleStage::Rejected)
        }
        WorkflowAction::ConfirmAssignment => {
            mutations.push(FieldMutation::Decided {
                role,
                decision: Decision::Approved,
                feedback: normalized_text(payload.feedback.as_deref()),
                at: now,
            });
            rule.to
        }
        WorkflowAction::ScheduleAppointment => {
            if let Some(appointment) = payload.appointment.clone() {
                mutations.push(FieldMutation::AppointmentScheduled {
                    appointment: Appointment {
                        location: appointment.location.trim().to_string(),
                        notes: normalized_text(appointment.notes.as_deref()),
                        ..appointment
                    },
                });
            }
            rule.to
        }
        WorkflowAction::Submit => rule.to,
    };

    mutations.push(FieldMutation::Stage { stage: to_stage });
    (to_stage, mutations)
}
