// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: who is the current user.
//!
//! Wraps the hosted identity service (account creation, email/password
//! sessions, current-session lookup and deletion).

use crate::client::{cookie_value, AppwriteClient};
use crate::error::AppError;
use crate::models::{Account, Session};
use dashmap::DashMap;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Hosted identity / session service.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// The active session, if any.
    async fn current_session(&self) -> Result<Option<Session>, AppError>;

    /// Log in with email and password.
    async fn create_email_session(&self, email: &str, password: &str)
        -> Result<Session, AppError>;

    /// Log out of the active session.
    async fn delete_current_session(&self) -> Result<(), AppError>;

    /// Register a new account (does not log in).
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AppError>;

    /// Account behind the active session.
    async fn current_account(&self) -> Result<Account, AppError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Appwrite implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Session store backed by the Appwrite account API.
#[derive(Clone)]
pub struct AppwriteAccount {
    client: AppwriteClient,
}

impl AppwriteAccount {
    pub fn new(client: AppwriteClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SessionStore for AppwriteAccount {
    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        if !self.client.has_session().await {
            return Ok(None);
        }

        let request = self
            .client
            .request(Method::GET, "/account/sessions/current")
            .await;

        match self.client.execute_json(request).await {
            Ok(session) => Ok(Some(session)),
            Err(AppError::Backend { status: 401, .. }) | Err(AppError::Backend { status: 404, .. }) => {
                // Stale secret, forget it
                self.client.set_session(None).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_email_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let request = self
            .client
            .request(Method::POST, "/account/sessions/email")
            .await
            .json(&json!({ "email": email, "password": password }));

        let response = self.client.execute(request).await?;
        let cookie_secret = cookie_value(&response, &self.client.session_cookie_name());
        let session: Session = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON parse error: {}", e)))?;

        let secret = Some(session.secret.clone())
            .filter(|s| !s.is_empty())
            .or(cookie_secret);
        if secret.is_none() {
            tracing::warn!(session_id = %session.id, "Session created without a usable secret");
        }
        self.client.set_session(secret).await;

        tracing::info!(user_id = %session.user_id, "Session created");
        Ok(session)
    }

    async fn delete_current_session(&self) -> Result<(), AppError> {
        let request = self
            .client
            .request(Method::DELETE, "/account/sessions/current")
            .await;

        self.client.execute(request).await?;
        self.client.set_session(None).await;
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AppError> {
        let request = self.client.request(Method::POST, "/account").await.json(&json!({
            "userId": "unique()",
            "email": email,
            "password": password,
            "name": name,
        }));

        self.client.execute_json(request).await
    }

    async fn current_account(&self) -> Result<Account, AppError> {
        let request = self.client.request(Method::GET, "/account").await;
        match self.client.execute_json(request).await {
            Err(AppError::Backend { status: 401, .. }) => Err(AppError::Unauthorized),
            other => other,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory implementation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Credentials {
    account: Account,
    password: String,
}

/// In-process session store with the same error behaviour as the backend.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    accounts: Arc<DashMap<String, Credentials>>,
    current: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one registered account already logged in.
    pub async fn logged_in(email: &str, password: &str) -> Result<(Self, Account), AppError> {
        let store = Self::new();
        let account = store.create_account(email, password, "test").await?;
        store.create_email_session(email, password).await?;
        Ok((store, account))
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.current.read().await.clone())
    }

    async fn create_email_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let credentials = self
            .accounts
            .get(email)
            .map(|c| c.clone())
            .ok_or_else(|| AppError::backend(404, "User not found"))?;

        if credentials.password != password {
            return Err(AppError::backend(401, "Invalid credentials"));
        }

        let session = Session {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id: credentials.account.id.clone(),
            secret: uuid::Uuid::new_v4().simple().to_string(),
            expire: String::new(),
        };
        *self.current.write().await = Some(session.clone());
        Ok(session)
    }

    async fn delete_current_session(&self) -> Result<(), AppError> {
        match self.current.write().await.take() {
            Some(_) => Ok(()),
            None => Err(AppError::backend(401, "No active session")),
        }
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AppError> {
        if self.accounts.contains_key(email) {
            return Err(AppError::backend(409, "Account already exists"));
        }

        let account = Account {
            id: uuid::Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        self.accounts.insert(
            email.to_string(),
            Credentials {
                account: account.clone(),
                password: password.to_string(),
            },
        );
        Ok(account)
    }

    async fn current_account(&self) -> Result<Account, AppError> {
        let session = self
            .current
            .read()
            .await
            .clone()
            .ok_or(AppError::Unauthorized)?;

        self.accounts
            .iter()
            .find(|entry| entry.account.id == session.user_id)
            .map(|entry| entry.account.clone())
            .ok_or(AppError::Unauthorized)
    }
}
