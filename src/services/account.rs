// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: signup, login, logout, profile settings and deletion.

use crate::db::{Database, Stored};
use crate::error::{AppError, Operation, Result};
use crate::models::{Session, UserProfile};
use crate::services::forms::{parse_whole_number, SignUpForm};
use crate::services::{FunctionRunner, SessionStore};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Body returned by the account-deletion function.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeletionOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Account and profile operations for the current user.
#[derive(Clone)]
pub struct AccountService {
    sessions: Arc<dyn SessionStore>,
    functions: Arc<dyn FunctionRunner>,
    db: Database,
    delete_function_id: String,
}

impl AccountService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        functions: Arc<dyn FunctionRunner>,
        db: Database,
        delete_function_id: &str,
    ) -> Self {
        Self {
            sessions,
            functions,
            db,
            delete_function_id: delete_function_id.to_string(),
        }
    }

    /// Create an account and its profile document.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Stored<UserProfile>> {
        form.validate()?;

        let account = self
            .sessions
            .create_account(&form.email, &form.password, &form.username)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Account creation failed"))?;

        let profile = UserProfile::new(&account.id, &form.email, &form.username);
        let stored = self
            .db
            .create_profile(&profile)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error creating user document"))?;

        tracing::info!(account_id = %account.id, "User signed up");
        Ok(stored)
    }

    /// Log in, reusing the current session when one exists.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        // A failed lookup is treated as "no session"
        if let Ok(Some(existing)) = self.sessions.current_session().await {
            tracing::info!(session_id = %existing.id, "User is already logged in");
            return Ok(existing);
        }

        self.sessions
            .create_email_session(email, password)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error during sign-in");
                match e.status() {
                    Some(401) => AppError::InvalidCredentials,
                    Some(404) => AppError::UserNotFound,
                    _ => e,
                }
            })
    }

    pub async fn logout(&self) -> Result<()> {
        self.sessions
            .delete_current_session()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error during logout");
                e.during(Operation::Logout)
            })?;
        tracing::info!("User logged out successfully");
        Ok(())
    }

    /// ID of the logged-in account.
    pub async fn current_user_id(&self) -> Result<String> {
        Ok(self.sessions.current_account().await?.id)
    }

    /// Profile document of the logged-in user.
    pub async fn profile(&self) -> Result<Stored<UserProfile>> {
        let account_id = self.current_user_id().await?;
        self.db
            .find_profile(&account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User document not found.".to_string()))
    }

    /// Update body weight from the settings form.
    pub async fn update_weight(&self, input: &str) -> Result<u32> {
        let weight = parse_whole_number(input, "Weight")?;
        let profile = self.profile().await?;

        self.db.update_profile_weight(&profile.id, weight).await?;
        tracing::info!(profile_id = %profile.id, weight, "Weight updated");
        Ok(weight)
    }

    /// Delete the account through the serverless function.
    ///
    /// An unparseable body is a hard failure. A body reporting
    /// `success: false` is returned as [`AppError::AccountDeletion`].
    pub async fn delete_account(&self) -> Result<DeletionOutcome> {
        let account = self.sessions.current_account().await?;
        let payload = serde_json::json!({ "userId": account.id }).to_string();

        let execution = self
            .functions
            .execute(&self.delete_function_id, &payload)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error deleting account"))?;

        let outcome: DeletionOutcome =
            serde_json::from_str(&execution.response_body).map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %execution.response_body,
                    "Error parsing deletion response"
                );
                AppError::Internal(anyhow::anyhow!(
                    "Invalid response format from cloud function."
                ))
            })?;

        if !outcome.success {
            let message = outcome
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::error!(message = %message, "Error deleting account");
            return Err(AppError::AccountDeletion(message));
        }

        tracing::info!(account_id = %account.id, "Account and related data deleted successfully");
        Ok(outcome)
    }
}
