use super::common::*;
use crate::workflows::placement::{
    project, ActionPayload, ActorRole, ActorSubStatus, LifecycleStage, ProjectorConfig,
    StatusProjector, Verdict, WorkflowAction, WorkflowStep,
};

#[test]
fn fresh_submission_sits_with_submitted_step() {
    let view = project(&fresh_application());
    assert_eq!(view.current_step, WorkflowStep::Submitted);
    assert_eq!(view.current_step_label, "Submitted");
    assert_eq!(view.next_actor, Some(ActorRole::Staff));
    assert_eq!(view.actors.len(), 4);
    assert!(view
        .actors
        .iter()
        .all(|actor| actor.status == ActorSubStatus::Waiting));
    assert!(!view.is_completed);
    assert!(!view.is_rejected);
}

#[test]
fn step_follows_custody_through_the_pipeline() {
    let cases = [
        (LifecycleStage::StaffReceived, WorkflowStep::Staff),
        (LifecycleStage::StaffReviewed, WorkflowStep::CourseInstructor),
        (
            LifecycleStage::CourseInstructorPending,
            WorkflowStep::CourseInstructor,
        ),
        (
            LifecycleStage::SupervisorAssignmentPending,
            WorkflowStep::Supervisor,
        ),
        (LifecycleStage::SupervisorReceived, WorkflowStep::Supervisor),
        (LifecycleStage::SupervisorConfirmed, WorkflowStep::Supervisor),
        (LifecycleStage::AppointmentScheduled, WorkflowStep::Committee),
        (LifecycleStage::CommitteeReceived, WorkflowStep::Committee),
        (LifecycleStage::Approved, WorkflowStep::Completed),
    ];

    for (stage, expected) in cases {
        let view = project(&application_at(stage));
        assert_eq!(view.current_step, expected, "stage {stage}");
    }
}

#[test]
fn supervisor_receipt_shows_received_status() {
    let view = project(&application_at(LifecycleStage::SupervisorReceived));
    let supervisor = view
        .actors
        .iter()
        .find(|actor| actor.role == ActorRole::Supervisor)
        .expect("supervisor row present");
    assert_eq!(supervisor.status, ActorSubStatus::Received);
    assert_eq!(supervisor.status_label, "received");
    assert_eq!(view.supervisor_id, Some(actor(SUPERVISOR)));
}

#[test]
fn rejection_points_at_the_rejecting_actor() {
    let rejected = step(
        &application_at(LifecycleStage::CourseInstructorPending),
        ActorRole::CourseInstructor,
        WorkflowAction::Review(Verdict::Reject),
        &ActionPayload::with_feedback("Prerequisite course missing"),
    );

    let view = project(&rejected);
    assert_eq!(view.current_step, WorkflowStep::CourseInstructor);
    assert!(view.is_rejected);
    assert!(!view.is_completed);
    assert_eq!(view.next_actor, None);
    let instructor = view
        .actors
        .iter()
        .find(|actor| actor.role == ActorRole::CourseInstructor)
        .expect("instructor row present");
    assert_eq!(
        instructor.feedback.as_deref(),
        Some("Prerequisite course missing")
    );
}

#[test]
fn completed_view_marks_every_actor_approved() {
    let view = project(&application_at(LifecycleStage::Approved));
    assert!(view.is_completed);
    assert!(view
        .actors
        .iter()
        .all(|actor| actor.status == ActorSubStatus::Approved));
    assert!(view.appointment.is_some());
}

#[test]
fn projection_is_deterministic() {
    let application = application_at(LifecycleStage::AppointmentScheduled);
    assert_eq!(project(&application), project(&application));
}

#[test]
fn roles_left_out_of_priority_are_reached_by_hand_off() {
    let projector = StatusProjector::new(ProjectorConfig::new(vec![
        ActorRole::Supervisor,
        ActorRole::CourseInstructor,
        ActorRole::Staff,
    ]));

    let at_committee = application_at(LifecycleStage::CommitteeReceived);
    assert_eq!(
        projector.project(&at_committee).current_step,
        WorkflowStep::Committee
    );

    let at_staff = application_at(LifecycleStage::StaffReceived);
    assert_eq!(
        projector.project(&at_staff).current_step,
        WorkflowStep::Staff
    );
}

#[test]
fn projector_config_sanitizes_priority() {
    let config = ProjectorConfig::new(vec![
        ActorRole::Student,
        ActorRole::Staff,
        ActorRole::Staff,
        ActorRole::Committee,
    ]);
    assert_eq!(config.priority, vec![ActorRole::Staff, ActorRole::Committee]);

    assert_eq!(
        ProjectorConfig::new(vec![ActorRole::Student]),
        ProjectorConfig::default()
    );
}
