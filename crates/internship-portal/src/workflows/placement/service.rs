use std::sync::Arc;

use super::domain::{ActorId, ActorRole, Application, ApplicationId, InternshipId, StudentId};
use super::eligibility::{EligibilityGate, EligibilityPolicy, EligibilityReport};
use super::engine::{table, ActionKind, ActionPayload, WorkflowAction};
use super::handlers::{
    CommitteeHandler, CourseInstructorHandler, StaffHandler, StageContext, StageHandlerError,
    StudentHandler, SupervisorHandler,
};
use super::projector::{ProjectorConfig, StatusProjector, WorkflowStatusView};
use super::repository::{
    ApplicationRepository, ProfileSource, RoleDirectory, StageEventPublisher,
};

/// External collaborators the workflow consumes.
#[derive(Clone)]
pub struct PlacementPorts {
    pub repository: Arc<dyn ApplicationRepository>,
    pub directory: Arc<dyn RoleDirectory>,
    pub profiles: Arc<dyn ProfileSource>,
    pub publisher: Arc<dyn StageEventPublisher>,
}

/// Tunable constants: eligibility threshold and status scan order.
#[derive(Debug, Clone, Default)]
pub struct PlacementSettings {
    pub eligibility: EligibilityPolicy,
    pub projector: ProjectorConfig,
}

/// Facade composing the five stage handlers and the status projector.
pub struct PlacementWorkflowService {
    context: Arc<StageContext>,
    student: StudentHandler,
    staff: StaffHandler,
    course_instructor: CourseInstructorHandler,
    supervisor: SupervisorHandler,
    committee: CommitteeHandler,
    projector: StatusProjector,
}

impl PlacementWorkflowService {
    pub fn new(ports: PlacementPorts, settings: PlacementSettings) -> Self {
        let context = Arc::new(StageContext::new(
            ports.repository,
            ports.directory,
            ports.publisher,
        ));

        Self {
            student: StudentHandler::new(
                context.clone(),
                ports.profiles,
                EligibilityGate::new(settings.eligibility),
            ),
            staff: StaffHandler::new(context.clone()),
            course_instructor: CourseInstructorHandler::new(context.clone()),
            supervisor: SupervisorHandler::new(context.clone()),
            committee: CommitteeHandler::new(context.clone()),
            projector: StatusProjector::new(settings.projector),
            context,
        }
    }

    pub fn student(&self) -> &StudentHandler {
        &self.student
    }

    pub fn staff(&self) -> &StaffHandler {
        &self.staff
    }

    pub fn course_instructor(&self) -> &CourseInstructorHandler {
        &self.course_instructor
    }

    pub fn supervisor(&self) -> &SupervisorHandler {
        &self.supervisor
    }

    pub fn committee(&self) -> &CommitteeHandler {
        &self.committee
    }

    pub fn submit(
        &self,
        student_id: &StudentId,
        internship_id: &InternshipId,
    ) -> Result<Application, StageHandlerError> {
        self.student.submit(student_id, internship_id)
    }

    /// Route an action to the handler for `role`.
    pub fn act(
        &self,
        role: ActorRole,
        application_id: &ApplicationId,
        actor_id: &ActorId,
        action: WorkflowAction,
        payload: &ActionPayload,
    ) -> Result<Application, StageHandlerError> {
        match role {
            ActorRole::Student => self.student.handle(application_id, actor_id, action, payload),
            ActorRole::Staff => self.staff.handle(application_id, actor_id, action, payload),
            ActorRole::CourseInstructor => {
                self.course_instructor.handle(application_id, actor_id, action, payload)
            }
            ActorRole::Supervisor => {
                self.supervisor.handle(application_id, actor_id, action, payload)
            }
            ActorRole::Committee => {
                self.committee.handle(application_id, actor_id, action, payload)
            }
        }
    }

    pub fn get(&self, application_id: &ApplicationId) -> Result<Application, StageHandlerError> {
        self.context.load(application_id)
    }

    pub fn status(
        &self,
        application_id: &ApplicationId,
    ) -> Result<WorkflowStatusView, StageHandlerError> {
        let application = self.context.load(application_id)?;
        Ok(self.projector.project(&application))
    }

    pub fn project(&self, application: &Application) -> WorkflowStatusView {
        self.projector.project(application)
    }

    pub fn eligibility(
        &self,
        student_id: &StudentId,
    ) -> Result<EligibilityReport, StageHandlerError> {
        self.student.check_eligibility(student_id)
    }

    pub fn available_actions(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<(ActorRole, ActionKind)>, StageHandlerError> {
        let application = self.context.load(application_id)?;
        Ok(self.context.engine().available_actions(&application))
    }

    /// Applications currently waiting on `role`, oldest submission first.
    pub fn work_queue(
        &self,
        role: ActorRole,
        limit: usize,
    ) -> Result<Vec<WorkflowStatusView>, StageHandlerError> {
        let stages = table::stages_awaiting(role);
        if stages.is_empty() {
            return Ok(Vec::new());
        }
        let applications = self.context.repository().in_stages(&stages, limit)?;
        Ok(applications
            .iter()
            .map(|application| self.projector.project(application))
            .collect())
    }

    pub fn applications_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<WorkflowStatusView>, StageHandlerError> {
        let mut applications = self.context.repository().for_student(student_id)?;
        applications.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(applications
            .iter()
            .map(|application| self.projector.project(application))
            .collect())
    }
}
