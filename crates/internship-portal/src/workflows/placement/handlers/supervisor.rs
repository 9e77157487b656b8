use std::sync::Arc;

use super::{StageContext, StageHandlerError};
use crate::workflows::placement::domain::{
    ActorId, ActorRole, Application, ApplicationId, Appointment,
};
use crate::workflows::placement::engine::{ActionPayload, WorkflowAction};

/// Assigned supervisor: acknowledges the assignment, confirms it, then books the meeting.
pub struct SupervisorHandler {
    context: Arc<StageContext>,
}

impl SupervisorHandler {
    pub fn new(context: Arc<StageContext>) -> Self {
        Self { context }
    }

    pub fn receive_assignment(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
    ) -> Result<Application, StageHandlerError> {
        self.handle(
            application_id,
            actor_id,
            WorkflowAction::ReceiveAssignment,
            &ActionPayload::default(),
        )
    }

    pub fn confirm_assignment(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        notes: Option<String>,
    ) -> Result<Application, StageHandlerError> {
        let payload = ActionPayload {
            feedback: notes,
            ..ActionPayload::default()
        };
        self.handle(
            application_id,
            actor_id,
            WorkflowAction::ConfirmAssignment,
            &payload,
        )
    }

    pub fn schedule_appointment(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        appointment: Appointment,
    ) -> Result<Application, StageHandlerError> {
        self.handle(
            application_id,
            actor_id,
            WorkflowAction::ScheduleAppointment,
            &ActionPayload::with_appointment(appointment),
        )
    }

    /// Only the supervisor named on the record may act.
    pub fn handle(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        action: WorkflowAction,
        payload: &ActionPayload,
    ) -> Result<Application, StageHandlerError> {
        let application = self.context.load(application_id)?;
        if application.supervisor_id.as_ref() != Some(actor_id) {
            return Err(self
                .context
                .deny(actor_id, ActorRole::Supervisor, &application));
        }
        self.context
            .commit(&application, ActorRole::Supervisor, action, payload)
    }
}
