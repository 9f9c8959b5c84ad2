//! Administrative HTTP API.
//!
//! ```text
//! POST   /api/workflows              create a workflow
//! GET    /api/workflows              list workflows
//! GET    /api/workflows/{id}         fetch one workflow
//! PUT    /api/workflows/{id}         replace a workflow (rules included)
//! DELETE /api/workflows/{id}         delete a workflow
//! PATCH  /api/workflows/{id}/toggle  flip ACTIVE/INACTIVE
//! POST   /api/events                 submit an event, bypassing the bus
//! ```
//!
//! The event-submission endpoint invokes the engine synchronously; the
//! engine is reentrant, so HTTP submissions and bus consumption can run
//! side by side.

mod dto;
mod error;
mod events;
mod workflows;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use eventide_server_application::{ChoreographyEngine, WorkflowService};

pub use dto::{WorkflowRequest, WorkflowResponse, WorkflowRuleRequest, WorkflowRuleResponse};
pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub workflows: Arc<WorkflowService>,
    pub engine: Arc<ChoreographyEngine>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/workflows",
            post(workflows::create).get(workflows::list),
        )
        .route(
            "/api/workflows/{id}",
            get(workflows::get_by_id)
                .put(workflows::update)
                .delete(workflows::delete),
        )
        .route("/api/workflows/{id}/toggle", patch(workflows::toggle))
        .route("/api/events", post(events::submit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use eventide_server_application::{
        ActionDispatcher, DedupPolicy, DeduplicationService, DlqPolicy, DlqService,
    };
    use eventide_server_infrastructure::http::ReqwestHttpClient;
    use eventide_server_infrastructure::kv::MemoryKvStore;
    use eventide_server_infrastructure::messaging::InMemoryEventBus;
    use eventide_server_infrastructure::repositories::InMemoryWorkflowRepository;

    fn test_router() -> (Router, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let repository = Arc::new(InMemoryWorkflowRepository::new());
        let http = Arc::new(ReqwestHttpClient::new(Duration::from_secs(1)).unwrap());
        let kv = Arc::new(MemoryKvStore::new());

        let engine = Arc::new(ChoreographyEngine::new(
            repository.clone(),
            ActionDispatcher::new(bus.clone(), http),
            DeduplicationService::new(kv, DedupPolicy::default()),
            DlqService::new(bus.clone(), DlqPolicy::default()),
        ));
        let workflows = Arc::new(WorkflowService::new(repository));

        (router(AppState { workflows, engine }), bus)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn workflow_body() -> Value {
        json!({
            "name": "Customer Onboarding",
            "eventType": "customer.created",
            "source": "user-service",
            "rules": [
                {
                    "priority": 1,
                    "condition": "payload.plan == 'enterprise'",
                    "actionType": "KAFKA",
                    "actionConfig": "{\"topic\": \"onboarding\"}"
                }
            ]
        })
    }

    #[tokio::test]
    async fn create_returns_201_with_the_stored_workflow() {
        let (app, _) = test_router();

        let response = app
            .oneshot(json_request(Method::POST, "/api/workflows", workflow_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Customer Onboarding");
        assert_eq!(body["status"], "ACTIVE");
        assert_eq!(body["rules"][0]["actionType"], "KAFKA");
        assert!(body["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn duplicate_selector_returns_409() {
        let (app, _) = test_router();

        let first = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/workflows", workflow_body()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(json_request(Method::POST, "/api/workflows", workflow_body()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn blank_name_returns_400() {
        let (app, _) = test_router();
        let mut body = workflow_body();
        body["name"] = json!("   ");

        let response = app
            .oneshot(json_request(Method::POST, "/api/workflows", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_missing_workflow_returns_404() {
        let (app, _) = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/workflows/00000000-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn toggle_flips_the_status() {
        let (app, _) = test_router();

        let created = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/workflows", workflow_body()))
            .await
            .unwrap();
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::PATCH)
                    .uri(format!("/api/workflows/{id}/toggle"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "INACTIVE");
    }

    #[tokio::test]
    async fn delete_returns_204_and_removes_the_workflow() {
        let (app, _) = test_router();

        let created = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/workflows", workflow_body()))
            .await
            .unwrap();
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let deleted = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/workflows/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let listed = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/workflows")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(listed).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn event_submission_runs_the_engine_synchronously() {
        let (app, bus) = test_router();

        app.clone()
            .oneshot(json_request(Method::POST, "/api/workflows", workflow_body()))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/events",
                json!({
                    "eventId": "e1",
                    "eventType": "customer.created",
                    "source": "user-service",
                    "payload": {"plan": "enterprise"},
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["eventId"], "e1");
        assert_eq!(bus.count_for("onboarding"), 1);
    }
}
