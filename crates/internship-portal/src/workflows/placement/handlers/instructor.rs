use std::sync::Arc;

use super::{StageContext, StageHandlerError};
use crate::workflows::placement::domain::{ActorId, ActorRole, Application, ApplicationId};
use crate::workflows::placement::engine::{ActionPayload, Verdict, WorkflowAction};

/// Course instructor review. Approval names the supervisor in the same write that advances
/// the stage.
pub struct CourseInstructorHandler {
    context: Arc<StageContext>,
}

impl CourseInstructorHandler {
    pub fn new(context: Arc<StageContext>) -> Self {
        Self { context }
    }

    pub fn receive(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
    ) -> Result<Application, StageHandlerError> {
        self.handle(
            application_id,
            actor_id,
            WorkflowAction::Receive,
            &ActionPayload::default(),
        )
    }

    pub fn approve(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        supervisor_id: ActorId,
        notes: Option<String>,
    ) -> Result<Application, StageHandlerError> {
        let payload = ActionPayload {
            feedback: notes,
            supervisor_id: Some(supervisor_id),
            appointment: None,
        };
        self.handle(
            application_id,
            actor_id,
            WorkflowAction::Review(Verdict::Approve),
            &payload,
        )
    }

    pub fn reject(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        feedback: impl Into<String>,
    ) -> Result<Application, StageHandlerError> {
        self.handle(
            application_id,
            actor_id,
            WorkflowAction::Review(Verdict::Reject),
            &ActionPayload::with_feedback(feedback),
        )
    }

    pub fn handle(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        action: WorkflowAction,
        payload: &ActionPayload,
    ) -> Result<Application, StageHandlerError> {
        let application = self.context.load(application_id)?;
        self.context
            .authorize_member(actor_id, ActorRole::CourseInstructor, &application)?;
        self.context
            .commit(&application, ActorRole::CourseInstructor, action, payload)
    }
}
