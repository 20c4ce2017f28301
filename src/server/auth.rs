//! Stateless installation-token proxy.
//!
//! Mints a GitHub App installation access token from submitted credentials.
//! Nothing is persisted: the app JWT is built per request and the upstream
//! response is forwarded as-is. Tokens never touch the store (job records do
//! not carry credentials).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::github::GatewayFactory;
use crate::store::{JobStore, OrganizationStore, WorkflowStore};

use super::AppState;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("build-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
pub struct InstallationTokenRequest {
    pub app_id: u64,
    /// RSA private key, PEM.
    pub private_key: String,
    pub installation_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallationTokenResponse {
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Error)]
pub enum AuthProxyError {
    #[error("invalid app credentials: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned HTTP {status}")]
    Upstream { status: u16 },
}

impl IntoResponse for AuthProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthProxyError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            AuthProxyError::Http(_) | AuthProxyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Serialize)]
struct AppJwtClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// Builds the short-lived app JWT GitHub expects for app-level calls.
///
/// Issued-at is backdated a minute to absorb clock skew; the expiry stays
/// inside GitHub's ten-minute ceiling.
fn app_jwt(app_id: u64, private_key_pem: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = AppJwtClaims {
        iat: now - 60,
        exp: now + 9 * 60,
        iss: app_id.to_string(),
    };
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?;
    encode(&Header::new(Algorithm::RS256), &claims, &key)
}

/// `POST /api/v1/auth/installation-token`
pub async fn installation_token_handler<S, F>(
    State(state): State<AppState<S, F>>,
    Json(request): Json<InstallationTokenRequest>,
) -> Result<Json<InstallationTokenResponse>, AuthProxyError>
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Send + Sync + 'static,
{
    let jwt = app_jwt(request.app_id, &request.private_key)?;

    let url = format!(
        "{GITHUB_API}/app/installations/{}/access_tokens",
        request.installation_id
    );
    let response = state
        .http()
        .post(&url)
        .bearer_auth(jwt)
        .header("accept", "application/vnd.github+json")
        .header("user-agent", USER_AGENT)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        warn!(
            installation_id = request.installation_id,
            status, "installation token request rejected"
        );
        return Err(AuthProxyError::Upstream { status });
    }

    let token: InstallationTokenResponse = response.json().await?;
    Ok(Json(token))
}
