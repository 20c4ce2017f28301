//! Stateless App Store Connect proxy.
//!
//! Looks up the latest uploaded build version for a bundle id. The caller
//! submits its own API key; the handler signs an ES256 JWT with it, resolves
//! the app by bundle id, and reads the most recently uploaded build.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::github::GatewayFactory;
use crate::store::{JobStore, OrganizationStore, WorkflowStore};

use super::AppState;

const APPSTORE_API: &str = "https://api.appstoreconnect.apple.com";

#[derive(Debug, Deserialize)]
pub struct LatestBuildRequest {
    /// API key id (the `kid` header of the signed JWT).
    pub key_id: String,
    pub issuer_id: String,
    /// EC private key (P-8 PEM).
    pub private_key: String,
    pub bundle_id: String,
}

#[derive(Debug, Serialize)]
pub struct LatestBuildResponse {
    /// `None` when the app exists but has no uploaded builds yet.
    pub latest_build: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppStoreProxyError {
    #[error("invalid App Store Connect key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("App Store Connect request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("App Store Connect returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("no app found for bundle id {bundle_id}")]
    AppNotFound { bundle_id: String },
}

impl IntoResponse for AppStoreProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppStoreProxyError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            AppStoreProxyError::AppNotFound { .. } => StatusCode::NOT_FOUND,
            AppStoreProxyError::Http(_) | AppStoreProxyError::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Serialize)]
struct ConnectClaims {
    iss: String,
    iat: i64,
    exp: i64,
    aud: &'static str,
}

fn connect_jwt(
    key_id: &str,
    issuer_id: &str,
    private_key_pem: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = ConnectClaims {
        iss: issuer_id.to_string(),
        iat: now,
        exp: now + 20 * 60,
        aud: "appstoreconnect-v1",
    };
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(key_id.to_string());
    let key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())?;
    encode(&header, &claims, &key)
}

#[derive(Deserialize)]
struct ResourceList {
    data: Vec<Resource>,
}

#[derive(Deserialize)]
struct Resource {
    id: String,
    #[serde(default)]
    attributes: serde_json::Value,
}

/// `POST /api/v1/appstore/latest-build`
pub async fn latest_build_handler<S, F>(
    State(state): State<AppState<S, F>>,
    Json(request): Json<LatestBuildRequest>,
) -> Result<Json<LatestBuildResponse>, AppStoreProxyError>
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Send + Sync + 'static,
{
    let jwt = connect_jwt(&request.key_id, &request.issuer_id, &request.private_key)?;

    let apps: ResourceList = get_json(
        &state,
        &jwt,
        &format!(
            "{APPSTORE_API}/v1/apps?filter%5BbundleId%5D={}",
            request.bundle_id
        ),
    )
    .await?;
    let app = apps
        .data
        .into_iter()
        .next()
        .ok_or_else(|| AppStoreProxyError::AppNotFound {
            bundle_id: request.bundle_id.clone(),
        })?;

    let builds: ResourceList = get_json(
        &state,
        &jwt,
        &format!(
            "{APPSTORE_API}/v1/builds?filter%5Bapp%5D={}&sort=-uploadedDate&limit=1",
            app.id
        ),
    )
    .await?;

    let latest_build = builds
        .data
        .first()
        .and_then(|b| b.attributes.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(Json(LatestBuildResponse { latest_build }))
}

async fn get_json<S, F, T: serde::de::DeserializeOwned>(
    state: &AppState<S, F>,
    jwt: &str,
    url: &str,
) -> Result<T, AppStoreProxyError> {
    let response = state.http().get(url).bearer_auth(jwt).send().await?;
    if !response.status().is_success() {
        return Err(AppStoreProxyError::Upstream {
            status: response.status().as_u16(),
        });
    }
    Ok(response.json().await?)
}
