//! Property checks over random action sequences fed straight to the engine.

use proptest::prelude::*;

use super::common::*;
use crate::workflows::placement::{
    project, ActionKind, ActionPayload, ActorRole, Application, LifecycleStage, Verdict,
    WorkflowAction, WorkflowEngine, WorkflowError,
};

fn any_role() -> impl Strategy<Value = ActorRole> {
    prop_oneof![
        Just(ActorRole::Student),
        Just(ActorRole::Staff),
        Just(ActorRole::CourseInstructor),
        Just(ActorRole::Supervisor),
        Just(ActorRole::Committee),
    ]
}

fn any_action() -> impl Strategy<Value = WorkflowAction> {
    prop_oneof![
        Just(WorkflowAction::Submit),
        Just(WorkflowAction::Receive),
        Just(WorkflowAction::Review(Verdict::Approve)),
        Just(WorkflowAction::Review(Verdict::Reject)),
        Just(WorkflowAction::ReceiveAssignment),
        Just(WorkflowAction::ConfirmAssignment),
        Just(WorkflowAction::ScheduleAppointment),
    ]
}

/// Payload carrying everything any action could need, with optional feedback.
fn payload(with_feedback: bool) -> ActionPayload {
    ActionPayload {
        feedback: with_feedback.then(|| "Needs a signed consent form".to_string()),
        supervisor_id: Some(actor(SUPERVISOR)),
        appointment: Some(appointment()),
    }
}

/// Absent feedback or feedback made only of whitespace.
fn blank_feedback() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[ \t\r\n]{0,8}".prop_map(Some)]
}

fn any_attempt() -> impl Strategy<Value = (ActorRole, WorkflowAction, bool)> {
    (any_role(), any_action(), any::<bool>())
}

/// Either a random attempt or the next happy-path move, so runs get deep into the pipeline.
fn any_script() -> impl Strategy<Value = Vec<Option<(ActorRole, WorkflowAction, bool)>>> {
    prop::collection::vec(prop::option::weighted(0.5, any_attempt()), 1..30)
}

fn next_happy_move(
    application: &Application,
) -> Option<(ActorRole, WorkflowAction, ActionPayload)> {
    let engine = WorkflowEngine::new();
    happy_path().into_iter().find(|(role, action, payload)| {
        engine
            .transition(application, *role, *action, payload, now())
            .is_ok()
    })
}

proptest! {
    #[test]
    fn random_runs_preserve_record_invariants(script in any_script()) {
        let engine = WorkflowEngine::new();
        let mut application = fresh_application();

        for entry in script {
            let (role, action, attempt_payload) = match entry {
                Some((role, action, feedback)) => (role, action, payload(feedback)),
                None => match next_happy_move(&application) {
                    Some(next) => next,
                    None => continue,
                },
            };

            let before = application.clone();
            match engine.transition(&application, role, action, &attempt_payload, now()) {
                Ok(mutations) => {
                    prop_assert!(!before.lifecycle_stage.is_terminal());
                    prop_assert!(
                        mutations.to_stage.ordinal() > mutations.from_stage.ordinal(),
                        "{} -> {} is not forward",
                        mutations.from_stage,
                        mutations.to_stage
                    );
                    application = mutations.apply(&application);
                    prop_assert_eq!(application.version, before.version + 1);
                    prop_assert!(
                        application.check_invariants().is_empty(),
                        "violations after {:?}: {:?}",
                        action,
                        application.check_invariants()
                    );

                    let repeat = engine
                        .transition(&application, role, action, &attempt_payload, now())
                        .expect_err("repeating an accepted action is refused");
                    prop_assert!(
                        matches!(repeat, WorkflowError::AlreadyActioned { .. }),
                        "repeat gave {:?}",
                        repeat
                    );
                }
                Err(_) => prop_assert_eq!(&application, &before),
            }

            let view = project(&application);
            prop_assert!(
                !(view.is_completed && view.is_rejected),
                "{} is both completed and rejected",
                application.lifecycle_stage
            );
        }
    }

    #[test]
    fn blank_rejections_ask_for_feedback(role in any_role(), feedback in blank_feedback()) {
        let engine = WorkflowEngine::new();
        let blank = ActionPayload {
            feedback,
            ..payload(false)
        };
        for stage in [
            LifecycleStage::StaffReceived,
            LifecycleStage::CourseInstructorPending,
            LifecycleStage::CommitteeReceived,
        ] {
            let application = application_at(stage);
            let err = engine
                .transition(
                    &application,
                    role,
                    WorkflowAction::Review(Verdict::Reject),
                    &blank,
                    now(),
                )
                .expect_err("blank rejection refused");
            if ActionKind::Review.permitted_for(role) {
                prop_assert!(
                    matches!(err, WorkflowError::MissingFeedback { role: by } if by == role),
                    "{} at {} gave {:?}",
                    role,
                    stage,
                    err
                );
            } else {
                prop_assert!(
                    matches!(err, WorkflowError::IllegalTransition { .. }),
                    "{:?}",
                    err
                );
            }
        }
    }

    #[test]
    fn terminal_records_accept_nothing(
        attempts in prop::collection::vec(any_attempt(), 1..12),
        rejected in any::<bool>(),
    ) {
        let engine = WorkflowEngine::new();
        let terminal = if rejected {
            step(
                &application_at(LifecycleStage::CommitteeReceived),
                ActorRole::Committee,
                WorkflowAction::Review(Verdict::Reject),
                &ActionPayload::with_feedback("Placement withdrawn by host"),
            )
        } else {
            application_at(LifecycleStage::Approved)
        };
        prop_assert!(terminal.lifecycle_stage.is_terminal());

        for (role, action, feedback) in attempts {
            prop_assert!(engine
                .transition(&terminal, role, action, &payload(feedback), now())
                .is_err());
        }
    }
}
