// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Serverless function execution.

use crate::client::AppwriteClient;
use crate::error::AppError;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Result of a synchronous function execution.
#[derive(Debug, Clone, Deserialize)]
pub struct Execution {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    /// Raw body returned by the function
    #[serde(rename = "responseBody", alias = "response", default)]
    pub response_body: String,
}

/// Runs hosted serverless functions.
#[async_trait::async_trait]
pub trait FunctionRunner: Send + Sync {
    async fn execute(&self, function_id: &str, body: &str) -> Result<Execution, AppError>;
}

/// Function runner backed by the Appwrite functions API.
#[derive(Clone)]
pub struct AppwriteFunctions {
    client: AppwriteClient,
}

impl AppwriteFunctions {
    pub fn new(client: AppwriteClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FunctionRunner for AppwriteFunctions {
    async fn execute(&self, function_id: &str, body: &str) -> Result<Execution, AppError> {
        let path = format!(
            "/functions/{}/executions",
            urlencoding::encode(function_id)
        );
        let request = self
            .client
            .request(Method::POST, &path)
            .await
            .json(&json!({ "body": body, "async": false }));

        let execution: Execution = self.client.execute_json(request).await?;
        tracing::debug!(function_id, execution_id = %execution.id, status = %execution.status, "Function executed");
        Ok(execution)
    }
}

/// Function runner that answers every call with a fixed body and records the
/// payloads it was given.
#[derive(Clone, Default)]
pub struct StaticFunctionRunner {
    response_body: String,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticFunctionRunner {
    pub fn new(response_body: &str) -> Self {
        Self {
            response_body: response_body.to_string(),
            calls: Arc::default(),
        }
    }

    /// `(function_id, body)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl FunctionRunner for StaticFunctionRunner {
    async fn execute(&self, function_id: &str, body: &str) -> Result<Execution, AppError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((function_id.to_string(), body.to_string()));
        }
        Ok(Execution {
            id: uuid::Uuid::new_v4().simple().to_string(),
            status: "completed".to_string(),
            response_body: self.response_body.clone(),
        })
    }
}
