// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appwrite REST transport shared by the database, account and function
//! clients.
//!
//! Handles:
//! - Project / platform headers on every request
//! - Carrying the current session secret
//! - Mapping non-success responses to `AppError::Backend`

use crate::config::Config;
use crate::error::AppError;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const SESSION_HEADER: &str = "X-Appwrite-Session";

/// Low-level Appwrite client. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    origin: String,
    session: Arc<RwLock<Option<String>>>,
}

impl AppwriteClient {
    /// Create a client for the configured project.
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(&config.endpoint, &config.project_id, &config.platform)
    }

    /// Create a client against an explicit endpoint (used by tests).
    pub fn with_endpoint(endpoint: &str, project_id: &str, platform: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            origin: format!("appwrite-android://{}", platform),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Replace the session secret sent with subsequent requests.
    pub async fn set_session(&self, secret: Option<String>) {
        *self.session.write().await = secret;
    }

    pub async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Name of the cookie carrying the session secret.
    pub fn session_cookie_name(&self) -> String {
        format!("a_session_{}", self.project_id.to_lowercase())
    }

    /// Start a request with the project headers and current session attached.
    pub async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(PROJECT_HEADER, &self.project_id)
            .header(reqwest::header::ORIGIN, &self.origin);

        if let Some(secret) = self.session.read().await.as_deref() {
            builder = builder.header(SESSION_HEADER, secret);
        }
        builder
    }

    /// Send a request and fail on non-success status.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Request failed: {}", e)))?;
        check_response(response).await
    }

    /// Send a request and parse the JSON body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, AppError> {
        let response = self.execute(builder).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON parse error: {}", e)))
    }
}

/// Appwrite error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// Check response status and return error if not successful.
async fn check_response(response: Response) -> Result<Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if !parsed.message.is_empty() => {
            if parsed.kind.is_empty() {
                parsed.message
            } else {
                format!("{} ({})", parsed.message, parsed.kind)
            }
        }
        _ => body,
    };

    tracing::debug!(status, message = %message, "Backend request failed");
    Err(AppError::backend(status, message))
}

/// Extract a cookie value from `Set-Cookie` headers.
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name && !value.is_empty()).then(|| value.trim().to_string())
        })
}
