//! Declarative legality table for reviewer actions.
//!
//! Every `(role, action)` pair appears once, keyed by the single stage it may start from.
//! Student submission is not listed: it creates the record rather than advancing one.

use super::ActionKind;
use crate::workflows::placement::domain::{ActorRole, LifecycleStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub role: ActorRole,
    pub action: ActionKind,
    pub from: LifecycleStage,
    pub to: LifecycleStage,
    /// Destination when the action is a rejecting review.
    pub on_reject: Option<LifecycleStage>,
}

const fn rule(
    role: ActorRole,
    action: ActionKind,
    from: LifecycleStage,
    to: LifecycleStage,
    on_reject: Option<LifecycleStage>,
) -> TransitionRule {
    TransitionRule {
        role,
        action,
        from,
        to,
        on_reject,
    }
}

pub static TRANSITIONS: [TransitionRule; 9] = [
    rule(
        ActorRole::Staff,
        ActionKind::Receive,
        LifecycleStage::Submitted,
        LifecycleStage::StaffReceived,
        None,
    ),
    rule(
        ActorRole::Staff,
        ActionKind::Review,
        LifecycleStage::StaffReceived,
        LifecycleStage::StaffReviewed,
        Some(LifecycleStage::Rejected),
    ),
    rule(
        ActorRole::CourseInstructor,
        ActionKind::Receive,
        LifecycleStage::StaffReviewed,
        LifecycleStage::CourseInstructorPending,
        None,
    ),
    // Approval passes through course_instructor_approved in the same write.
    rule(
        ActorRole::CourseInstructor,
        ActionKind::Review,
        LifecycleStage::CourseInstructorPending,
        LifecycleStage::SupervisorAssignmentPending,
        Some(LifecycleStage::CourseInstructorRejected),
    ),
    rule(
        ActorRole::Supervisor,
        ActionKind::ReceiveAssignment,
        LifecycleStage::SupervisorAssignmentPending,
        LifecycleStage::SupervisorReceived,
        None,
    ),
    rule(
        ActorRole::Supervisor,
        ActionKind::ConfirmAssignment,
        LifecycleStage::SupervisorReceived,
        LifecycleStage::SupervisorConfirmed,
        None,
    ),
    rule(
        ActorRole::Supervisor,
        ActionKind::ScheduleAppointment,
        LifecycleStage::SupervisorConfirmed,
        LifecycleStage::AppointmentScheduled,
        None,
    ),
    rule(
        ActorRole::Committee,
        ActionKind::Receive,
        LifecycleStage::AppointmentScheduled,
        LifecycleStage::CommitteeReceived,
        None,
    ),
    // Approval passes through committee_reviewed in the same write.
    rule(
        ActorRole::Committee,
        ActionKind::Review,
        LifecycleStage::CommitteeReceived,
        LifecycleStage::Approved,
        Some(LifecycleStage::Rejected),
    ),
];

pub fn rule_for(role: ActorRole, action: ActionKind) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .find(|rule| rule.role == role && rule.action == action)
}

pub fn rule_from(stage: LifecycleStage) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|rule| rule.from == stage)
}

/// Role expected to act next on a record sitting at `stage`.
pub fn next_actor(stage: LifecycleStage) -> Option<ActorRole> {
    rule_from(stage).map(|rule| rule.role)
}

/// Stage from which `role` issues its review, for reviewers that review.
pub fn review_stage(role: ActorRole) -> Option<LifecycleStage> {
    rule_for(role, ActionKind::Review)
        .or_else(|| rule_for(role, ActionKind::ConfirmAssignment))
        .map(|rule| rule.from)
}

/// Stages at which `role` is the next actor.
pub fn stages_awaiting(role: ActorRole) -> Vec<LifecycleStage> {
    TRANSITIONS
        .iter()
        .filter(|rule| rule.role == role)
        .map(|rule| rule.from)
        .collect()
}
