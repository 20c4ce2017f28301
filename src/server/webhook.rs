//! Webhook endpoint handler.
//!
//! Verifies the delivery signature before any parsing, parses the payload,
//! and runs the job-creation path inline. Failures map to error statuses so
//! the sender's redelivery machinery sees them; ignorable deliveries (unknown
//! event types, irrelevant actions) succeed without side effects.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::github::GatewayFactory;
use crate::registry::RegistryError;
use crate::store::{JobStore, OrganizationStore, WorkflowStore};
use crate::sync::{handle_pull_request, TriggerError};
use crate::types::DeliveryId;
use crate::webhooks::{parse_webhook, verify_signature, GitHubEvent, ParseError};

use super::AppState;

const HEADER_EVENT: &str = "x-github-event";
const HEADER_DELIVERY: &str = "x-github-delivery";
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Parse(_) => StatusCode::BAD_REQUEST,
            // The app is not installed, or nothing is registered for the
            // repository: redelivering the same payload cannot succeed.
            WebhookError::Trigger(TriggerError::MissingInstallation) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WebhookError::Trigger(TriggerError::Registry(RegistryError::NoWorkflows {
                ..
            })) => StatusCode::UNPROCESSABLE_ENTITY,
            WebhookError::Trigger(TriggerError::GitHub(_)) => StatusCode::BAD_GATEWAY,
            WebhookError::Trigger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// `POST /webhook`
pub async fn webhook_handler<S, F>(
    State(state): State<AppState<S, F>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError>
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Send + Sync + 'static,
{
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = DeliveryId::new(get_header(&headers, HEADER_DELIVERY)?);
    let signature_header = get_header(&headers, HEADER_SIGNATURE)?;

    debug!(%delivery_id, %event_type, "received webhook");

    // Verify before any parsing; unauthenticated bodies are never
    // deserialized.
    if !verify_signature(&body, &signature_header, state.webhook_secret()) {
        warn!(%delivery_id, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let event = match parse_webhook(&event_type, &body)? {
        Some(event) => event,
        None => {
            debug!(%delivery_id, %event_type, "ignoring event");
            return Ok((StatusCode::OK, "ignored").into_response());
        }
    };

    match event {
        GitHubEvent::PullRequest(pr_event) => {
            let created =
                handle_pull_request(state.store(), state.factory(), state.app_id(), &pr_event)
                    .await?;
            info!(
                %delivery_id,
                pr = %pr_event.pr_number,
                action = pr_event.action.as_str(),
                created = created.len(),
                "processed pull request event"
            );
            Ok(Json(serde_json::json!({ "created": created })).into_response())
        }
    }
}

fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
