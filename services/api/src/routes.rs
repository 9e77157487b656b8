use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use internship_portal::workflows::placement::{placement_router, PlacementWorkflowService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_placement_routes(service: Arc<PlacementWorkflowService>) -> axum::Router {
    placement_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_portal, STAFF_ID};
    use axum::body::Body;
    use axum::http::Request;
    use internship_portal::config::WorkflowConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn placement_routes_are_mounted_next_to_probes() {
        let portal = build_portal(&WorkflowConfig::default());
        let router = with_placement_routes(portal.service.clone());

        let health = router
            .clone()
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(health.status(), StatusCode::OK);

        let submitted = router
            .clone()
            .oneshot(
                Request::post("/api/v1/placements/applications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "student_id": "stu-002", "internship_id": "posting-9" })
                            .to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(submitted.status(), StatusCode::CREATED);
        let application_id = body_json(submitted).await["application_id"]
            .as_str()
            .expect("id present")
            .to_string();

        let received = router
            .oneshot(
                Request::post(format!(
                    "/api/v1/placements/applications/{application_id}/actions"
                ))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "actor_id": STAFF_ID, "role": "staff", "action": "receive" })
                        .to_string(),
                ))
                .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(received.status(), StatusCode::OK);
        assert_eq!(body_json(received).await["current_step"], "staff");
    }

    #[tokio::test]
    async fn ineligible_student_is_refused_over_http() {
        let portal = build_portal(&WorkflowConfig::default());
        let response = with_placement_routes(portal.service)
            .oneshot(
                Request::post("/api/v1/placements/applications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "student_id": "stu-003", "internship_id": "posting-9" })
                            .to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
