//! HTTP surface.
//!
//! Endpoints:
//! - `POST /webhook` - GitHub webhook deliveries (signature-verified)
//! - `POST /api/v1/jobs/{id}/status` - build executor's status callback
//! - `GET /api/v1/jobs/{id}` - job record, for observability
//! - `POST /api/v1/auth/installation-token` - stateless token-minting proxy
//! - `POST /api/v1/appstore/latest-build` - stateless App Store Connect proxy
//! - `GET /health` - liveness
//!
//! The router is generic over the store and the gateway factory so the
//! integration tests can run it against the in-memory store and a recording
//! fake gateway.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::github::GatewayFactory;
use crate::store::{JobStore, OrganizationStore, WorkflowStore};

pub mod appstore;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

/// Shared application state, passed to handlers via axum's `State`.
pub struct AppState<S, F> {
    inner: Arc<AppStateInner<S, F>>,
}

impl<S, F> Clone for AppState<S, F> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<S, F> {
    store: Arc<S>,
    factory: F,
    webhook_secret: Vec<u8>,
    app_id: Option<u64>,
    http: reqwest::Client,
}

impl<S, F> AppState<S, F> {
    pub fn new(
        store: Arc<S>,
        factory: F,
        webhook_secret: impl Into<Vec<u8>>,
        app_id: Option<u64>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                store,
                factory,
                webhook_secret: webhook_secret.into(),
                app_id,
                http: reqwest::Client::new(),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// The GitHub App id recorded on newly created jobs.
    pub fn app_id(&self) -> Option<u64> {
        self.inner.app_id
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}

/// Builds the axum router with every endpoint.
pub fn build_router<S, F>(state: AppState<S, F>) -> Router
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Send + Sync + 'static,
    F::Gateway: 'static,
{
    Router::new()
        .route("/webhook", post(webhook::webhook_handler::<S, F>))
        .route("/api/v1/jobs/{id}/status", post(jobs::update_status_handler::<S, F>))
        .route("/api/v1/jobs/{id}", get(jobs::get_job_handler::<S, F>))
        .route(
            "/api/v1/auth/installation-token",
            post(auth::installation_token_handler::<S, F>),
        )
        .route(
            "/api/v1/appstore/latest-build",
            post(appstore::latest_build_handler::<S, F>),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::store::MemoryStore;
    use crate::test_utils::{
        sample_organization, sample_workflow, FakeGateway, GatewayCall, REPO_URL,
    };
    use crate::types::{BuildJob, Platform};
    use crate::webhooks::{compute_signature, format_signature_header};

    const SECRET: &[u8] = b"test-secret";

    async fn test_state() -> (AppState<MemoryStore, FakeGateway>, Arc<MemoryStore>, FakeGateway)
    {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                vec![sample_workflow("wf-ios", Platform::Ios)],
                vec![sample_organization()],
            )
            .await;
        let gateway = FakeGateway::new();
        let state = AppState::new(Arc::clone(&store), gateway.clone(), SECRET, Some(42));
        (state, store, gateway)
    }

    fn pr_body() -> serde_json::Value {
        serde_json::json!({
            "action": "opened",
            "pull_request": {
                "number": 12,
                "head": { "sha": "a".repeat(40), "ref": "feature/x" },
                "base": { "sha": "b".repeat(40), "ref": "main" }
            },
            "repository": {
                "name": "app",
                "html_url": REPO_URL,
                "owner": { "login": "acme" }
            },
            "installation": { "id": 777 }
        })
    }

    fn signed_webhook_request(
        secret: &[u8],
        event_type: &str,
        body: &serde_json::Value,
    ) -> Request<Body> {
        let body_bytes = serde_json::to_vec(body).unwrap();
        let signature = format_signature_header(&compute_signature(&body_bytes, secret));
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", event_type)
            .header("x-github-delivery", "550e8400-e29b-41d4-a716-446655440000")
            .header("x-hub-signature-256", signature)
            .body(Body::from(body_bytes))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let (state, _, _) = test_state().await;
        let app = build_router(state);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_pull_request_webhook_creates_a_job() {
        let (state, store, gateway) = test_state().await;
        let app = build_router(state);

        let response = app
            .oneshot(signed_webhook_request(SECRET, "pull_request", &pr_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["created"].as_array().unwrap().len(), 1);

        assert!(gateway
            .calls()
            .iter()
            .any(|c| matches!(c, GatewayCall::CreateCheckRun { .. })));

        let job_id = crate::types::JobId::new(
            parsed["created"][0].as_str().unwrap(),
        );
        let job = store.get_job(&job_id).await.unwrap();
        assert_eq!(job.github.installation_id, 777);
    }

    #[tokio::test]
    async fn invalid_signature_returns_401() {
        let (state, _, gateway) = test_state().await;
        let app = build_router(state);

        let response = app
            .oneshot(signed_webhook_request(
                b"wrong-secret",
                "pull_request",
                &pr_body(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_event_header_returns_400() {
        let (state, _, _) = test_state().await;
        let app = build_router(state);

        let body_bytes = serde_json::to_vec(&pr_body()).unwrap();
        let signature = format_signature_header(&compute_signature(&body_bytes, SECRET));
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("x-github-delivery", "d-1")
            .header("x-hub-signature-256", signature)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_event_type_is_accepted_and_ignored() {
        let (state, _, gateway) = test_state().await;
        let app = build_router(state);

        let response = app
            .oneshot(signed_webhook_request(SECRET, "push", &pr_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn irrelevant_action_is_accepted_and_ignored() {
        let (state, _, gateway) = test_state().await;
        let app = build_router(state);

        let mut body = pr_body();
        body["action"] = serde_json::json!("closed");
        let response = app
            .oneshot(signed_webhook_request(SECRET, "pull_request", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn webhook_without_installation_fails() {
        let (state, _, _) = test_state().await;
        let app = build_router(state);

        let mut body = pr_body();
        body.as_object_mut().unwrap().remove("installation");
        let response = app
            .oneshot(signed_webhook_request(SECRET, "pull_request", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unregistered_repository_fails_the_delivery() {
        let store = Arc::new(MemoryStore::new());
        let gateway = FakeGateway::new();
        let state = AppState::new(Arc::clone(&store), gateway, SECRET, None);
        let app = build_router(state);

        let response = app
            .oneshot(signed_webhook_request(SECRET, "pull_request", &pr_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn status_callback_roundtrip() {
        let (state, store, _) = test_state().await;
        let app = build_router(state);

        let workflow = sample_workflow("wf-ios", Platform::Ios);
        let job = crate::test_utils::sample_job(&workflow);
        store.create_job(job.clone()).await.unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/jobs/{}/status", job.id))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"processing":true,"failure":false,"success":false}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/jobs/{}", job.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let fetched: BuildJob = serde_json::from_slice(&body).unwrap();
        assert!(fetched.status.processing);
    }

    #[tokio::test]
    async fn unknown_job_returns_404() {
        let (state, _, _) = test_state().await;
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/jobs/no-such-job")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
