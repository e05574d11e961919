// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent user-facing messages.

use crate::peripheral::LinkError;
use std::fmt;

/// User actions whose failures are reported with a fixed alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateRecording,
    CreateGoal,
    DeleteGoal,
    Logout,
}

impl Operation {
    pub fn alert(self) -> &'static str {
        match self {
            Operation::CreateRecording => "Failed to create recording. Please try again.",
            Operation::CreateGoal => "Failed to create goal. Please try again.",
            Operation::DeleteGoal => "Failed to delete goal. Please try again.",
            Operation::Logout => "Failed to log out. Please try again.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::CreateRecording => "create recording",
            Operation::CreateGoal => "create goal",
            Operation::DeleteGoal => "delete goal",
            Operation::Logout => "log out",
        })
    }
}

/// Application error type shared by the backend clients and services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Non-success response from the hosted backend.
    #[error("Backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(String),

    /// The account-deletion function answered, but reported a failure.
    #[error("Account deletion rejected: {0}")]
    AccountDeletion(String),

    /// A user action failed after its input was accepted.
    #[error("Failed to {operation}: {source}")]
    Failed {
        operation: Operation,
        source: Box<AppError>,
    },

    #[error("Peripheral error: {0}")]
    Peripheral(#[from] LinkError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const UNEXPECTED_MESSAGE: &'static str =
        "An unexpected error occurred. Please try again later.";

    /// Build a backend error from an HTTP status and response body.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        AppError::Backend {
            status,
            message: message.into(),
        }
    }

    /// Attach the action that failed, so the user sees its alert.
    ///
    /// Input errors keep their own message and are returned unchanged.
    pub fn during(self, operation: Operation) -> Self {
        match self {
            AppError::BadRequest(_) | AppError::Failed { .. } => self,
            source => AppError::Failed {
                operation,
                source: Box::new(source),
            },
        }
    }

    /// HTTP status reported by the backend, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Failed { source, .. } => source.status(),
            AppError::Backend { status, .. } => Some(*status),
            AppError::Unauthorized | AppError::InvalidCredentials => Some(401),
            AppError::UserNotFound | AppError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Fixed alert text shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => {
                "Invalid email or password. Please try again.".to_string()
            }
            AppError::UserNotFound => "User not found. Please sign up first.".to_string(),
            AppError::Unauthorized => "Please log in to continue.".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Failed { operation, .. } => operation.alert().to_string(),
            AppError::AccountDeletion(_) => {
                "Failed to delete account. Please try again.".to_string()
            }
            _ => Self::UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    /// Surface the first field message, the way a form shows one alert.
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid input.".to_string());
        AppError::BadRequest(message)
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, AppError>;
