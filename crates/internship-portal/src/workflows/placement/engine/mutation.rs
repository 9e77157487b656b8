use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{table, WorkflowAction};
use crate::workflows::placement::domain::{
    ActorId, ActorRole, Application, ApplicationId, Appointment, Decision, LifecycleStage,
};

/// A single field-level change produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldMutation {
    Received {
        role: ActorRole,
        at: DateTime<Utc>,
    },
    Decided {
        role: ActorRole,
        decision: Decision,
        feedback: Option<String>,
        at: DateTime<Utc>,
    },
    SupervisorAssigned {
        supervisor_id: ActorId,
    },
    AppointmentScheduled {
        appointment: Appointment,
    },
    Stage {
        stage: LifecycleStage,
    },
}

/// Everything one transition changes, persisted as a single atomic write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSet {
    pub application_id: ApplicationId,
    /// Version of the record the decision was computed against.
    pub expected_version: u64,
    pub actor_role: ActorRole,
    pub action: WorkflowAction,
    pub from_stage: LifecycleStage,
    pub to_stage: LifecycleStage,
    pub occurred_at: DateTime<Utc>,
    pub mutations: Vec<FieldMutation>,
}

impl MutationSet {
    pub fn next_actor(&self) -> Option<ActorRole> {
        table::next_actor(self.to_stage)
    }

    pub fn assigns_supervisor(&self) -> Option<&ActorId> {
        self.mutations.iter().find_map(|mutation| match mutation {
            FieldMutation::SupervisorAssigned { supervisor_id } => Some(supervisor_id),
            _ => None,
        })
    }

    /// Produce the post-transition record. Repositories call this inside their write.
    pub fn apply(&self, application: &Application) -> Application {
        let mut next = application.clone();

        for mutation in &self.mutations {
            match mutation {
                FieldMutation::Received { role, at } => {
                    if let Some(audit) = next.audit_mut(*role) {
                        audit.received = true;
                        audit.received_at = Some(*at);
                    }
                }
                FieldMutation::Decided {
                    role,
                    decision,
                    feedback,
                    at,
                } => {
                    if let Some(audit) = next.audit_mut(*role) {
                        audit.decision = Some(*decision);
                        audit.feedback = feedback.clone();
                        audit.decided_at = Some(*at);
                    }
                }
                FieldMutation::SupervisorAssigned { supervisor_id } => {
                    next.supervisor_id = Some(supervisor_id.clone());
                }
                FieldMutation::AppointmentScheduled { appointment } => {
                    next.appointment = Some(appointment.clone());
                }
                FieldMutation::Stage { stage } => {
                    next.lifecycle_stage = *stage;
                }
            }
        }

        next.updated_at = self.occurred_at;
        next.version = application.version + 1;
        next
    }
}
