use std::sync::Arc;

use super::{ReviewInput, StageContext, StageHandlerError};
use crate::workflows::placement::domain::{ActorId, ActorRole, Application, ApplicationId};
use crate::workflows::placement::engine::{ActionPayload, WorkflowAction};

/// Final review committee.
pub struct CommitteeHandler {
    context: Arc<StageContext>,
}

impl CommitteeHandler {
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

    pub fn review(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        input: ReviewInput,
    ) -> Result<Application, StageHandlerError> {
        let (action, payload) = input.into_action();
        self.handle(application_id, actor_id, action, &payload)
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
            .authorize_member(actor_id, ActorRole::Committee, &application)?;
        self.context
            .commit(&application, ActorRole::Committee, action, payload)
    }
}
