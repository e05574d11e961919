// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout-Tracker: record strength workouts with a BLE wearable
//!
//! This crate provides the client core of the workout tracker: the wearable
//! link, the recording controller, workout/goal storage on Appwrite and the
//! history and home-screen aggregation.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod peripheral;
pub mod services;
pub mod time_utils;

use client::AppwriteClient;
use config::Config;
use db::{AppwriteDb, Database, DocumentStore};
use services::{
    AccountService, AppwriteAccount, AppwriteFunctions, FunctionRunner, GoalService,
    HistoryService, RecordingUploader, SessionStore,
};
use std::sync::Arc;

/// Application root: owns the backend handles and the services built on them.
#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub db: Database,
    pub sessions: Arc<dyn SessionStore>,
    pub accounts: AccountService,
    pub goals: GoalService,
    pub recordings: RecordingUploader,
    pub history: HistoryService,
}

impl App {
    /// Wire the services over the given backends.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        sessions: Arc<dyn SessionStore>,
        functions: Arc<dyn FunctionRunner>,
    ) -> Self {
        let db = Database::new(store, config.collections.clone());

        let accounts = AccountService::new(
            Arc::clone(&sessions),
            functions,
            db.clone(),
            &config.delete_account_function_id,
        );
        let goals = GoalService::new(Arc::clone(&sessions), db.clone());
        let recordings =
            RecordingUploader::new(Arc::clone(&sessions), db.clone(), config.workout_window);
        let history = HistoryService::new(Arc::clone(&sessions), db.clone());

        Self {
            config,
            db,
            sessions,
            accounts,
            goals,
            recordings,
            history,
        }
    }

    /// Wire the services over the hosted Appwrite backend.
    pub fn connect(config: Config) -> Self {
        let client = AppwriteClient::new(&config);
        let store = Arc::new(AppwriteDb::new(client.clone(), &config.database_id));
        let sessions = Arc::new(AppwriteAccount::new(client.clone()));
        let functions = Arc::new(AppwriteFunctions::new(client));

        tracing::info!(
            endpoint = %config.endpoint,
            project = %config.project_id,
            "Appwrite client initialized"
        );
        Self::new(config, store, sessions, functions)
    }
}
