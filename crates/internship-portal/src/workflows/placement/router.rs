use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ActorId, ActorRole, ApplicationId, Appointment, InternshipId, StudentId};
use super::engine::{ActionPayload, Verdict, WorkflowAction};
use super::handlers::{ErrorKind, StageHandlerError};
use super::service::PlacementWorkflowService;

const DEFAULT_QUEUE_LIMIT: usize = 50;

/// Router builder exposing HTTP endpoints for the placement workflow.
pub fn placement_router(service: Arc<PlacementWorkflowService>) -> Router {
    Router::new()
        .route("/api/v1/placements/applications", post(submit_handler))
        .route(
            "/api/v1/placements/applications/:application_id",
            get(status_handler),
        )
        .route(
            "/api/v1/placements/applications/:application_id/actions",
            post(action_handler),
        )
        .route(
            "/api/v1/placements/eligibility/:student_id",
            get(eligibility_handler),
        )
        .route("/api/v1/placements/queues/:role", get(queue_handler))
        .with_state(service)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub student_id: String,
    pub internship_id: String,
}

/// Flat action names accepted over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    Submit,
    Receive,
    Approve,
    Reject,
    ReceiveAssignment,
    ConfirmAssignment,
    ScheduleAppointment,
}

impl From<ActionName> for WorkflowAction {
    fn from(name: ActionName) -> Self {
        match name {
            ActionName::Submit => WorkflowAction::Submit,
            ActionName::Receive => WorkflowAction::Receive,
            ActionName::Approve => WorkflowAction::Review(Verdict::Approve),
            ActionName::Reject => WorkflowAction::Review(Verdict::Reject),
            ActionName::ReceiveAssignment => WorkflowAction::ReceiveAssignment,
            ActionName::ConfirmAssignment => WorkflowAction::ConfirmAssignment,
            ActionName::ScheduleAppointment => WorkflowAction::ScheduleAppointment,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub actor_id: String,
    pub role: ActorRole,
    pub action: ActionName,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    #[serde(default)]
    pub appointment: Option<Appointment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::IllegalTransition | ErrorKind::AlreadyActioned => StatusCode::CONFLICT,
        ErrorKind::MissingFeedback | ErrorKind::InvalidPayload | ErrorKind::Ineligible => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PersistenceFailure => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn error_response(error: StageHandlerError) -> Response {
    let kind = error.kind();
    let payload = json!({
        "error": kind.user_message(),
        "kind": kind.code(),
        "detail": error.to_string(),
    });
    (status_for(kind), axum::Json(payload)).into_response()
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<PlacementWorkflowService>>,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response {
    let student_id = StudentId(request.student_id);
    let internship_id = InternshipId(request.internship_id);
    match service.submit(&student_id, &internship_id) {
        Ok(application) => {
            let view = service.project(&application);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler(
    State(service): State<Arc<PlacementWorkflowService>>,
    Path(application_id): Path<String>,
) -> Response {
    match service.status(&ApplicationId(application_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn action_handler(
    State(service): State<Arc<PlacementWorkflowService>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ActionRequest>,
) -> Response {
    let payload = ActionPayload {
        feedback: request.feedback,
        supervisor_id: request.supervisor_id.map(ActorId),
        appointment: request.appointment,
    };
    let result = service.act(
        request.role,
        &ApplicationId(application_id),
        &ActorId(request.actor_id),
        request.action.into(),
        &payload,
    );
    match result {
        Ok(application) => {
            let view = service.project(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn eligibility_handler(
    State(service): State<Arc<PlacementWorkflowService>>,
    Path(student_id): Path<String>,
) -> Response {
    match service.eligibility(&StudentId(student_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler(
    State(service): State<Arc<PlacementWorkflowService>>,
    Path(role): Path<String>,
    Query(params): Query<QueueParams>,
) -> Response {
    let Some(role) = ActorRole::parse(&role) else {
        let payload = json!({ "error": format!("unknown role '{role}'") });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    };
    let limit = params.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.work_queue(role, limit) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}
