use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{StageContext, StageHandlerError};
use crate::workflows::placement::domain::{
    ActorId, ActorRole, Application, ApplicationId, InternshipId, LifecycleStage, StudentId,
};
use crate::workflows::placement::eligibility::{EligibilityGate, EligibilityReport};
use crate::workflows::placement::engine::{
    table, ActionKind, ActionPayload, WorkflowAction, WorkflowError,
};
use crate::workflows::placement::repository::{ProfileSource, RepositoryError, StageAdvanced};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Creates applications after the eligibility gate passes.
pub struct StudentHandler {
    context: Arc<StageContext>,
    profiles: Arc<dyn ProfileSource>,
    gate: EligibilityGate,
}

impl StudentHandler {
    pub fn new(
        context: Arc<StageContext>,
        profiles: Arc<dyn ProfileSource>,
        gate: EligibilityGate,
    ) -> Self {
        Self {
            context,
            profiles,
            gate,
        }
    }

    pub fn check_eligibility(
        &self,
        student_id: &StudentId,
    ) -> Result<EligibilityReport, StageHandlerError> {
        let report = match self.profiles.profile(student_id)? {
            Some(profile) => self.gate.check_eligibility(&profile),
            None => EligibilityReport::missing_profile(student_id.clone(), self.gate.policy()),
        };
        Ok(report)
    }

    /// Submit a new application. One open application per student and internship.
    pub fn submit(
        &self,
        student_id: &StudentId,
        internship_id: &InternshipId,
    ) -> Result<Application, StageHandlerError> {
        let report = self.check_eligibility(student_id)?;
        if !report.eligible {
            return Err(StageHandlerError::Ineligible {
                reason: report
                    .reason
                    .unwrap_or_else(|| "profile incomplete".to_string()),
            });
        }

        let application = self.context.engine().open(
            next_application_id(),
            student_id.clone(),
            internship_id.clone(),
            Utc::now(),
        );
        let stored = match self.context.repository().insert(application) {
            Ok(stored) => stored,
            Err(RepositoryError::OpenApplicationExists) => {
                return Err(WorkflowError::AlreadyActioned {
                    role: ActorRole::Student,
                    action: ActionKind::Submit,
                }
                .into())
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            application_id = %stored.id,
            student_id = %stored.student_id,
            internship_id = %stored.internship_id,
            completion = report.completion_percent,
            "application submitted"
        );

        self.context.announce(StageAdvanced {
            application_id: stored.id.clone(),
            actor_role: ActorRole::Student,
            from_stage: LifecycleStage::Submitted,
            new_stage: LifecycleStage::Submitted,
            next_actor_role: table::next_actor(LifecycleStage::Submitted),
        });

        Ok(stored)
    }

    /// Generic entry point for actions on an existing application. Students own their record
    /// but every action they could take on it has already happened.
    pub fn handle(
        &self,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        action: WorkflowAction,
        payload: &ActionPayload,
    ) -> Result<Application, StageHandlerError> {
        let application = self.context.load(application_id)?;
        if application.student_id.0 != actor_id.0 {
            return Err(self
                .context
                .deny(actor_id, ActorRole::Student, &application));
        }
        self.context
            .commit(&application, ActorRole::Student, action, payload)
    }
}
