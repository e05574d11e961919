// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed operations over the document store.
//!
//! Provides high-level operations for:
//! - User profiles (weight, active goal pointer)
//! - Goals (rep targets and accumulated progress)
//! - Workouts (session grouping)
//! - Sets (individual recordings)

use crate::config::Collections;
use crate::db::{fields, DocumentStore, Query, Stored};
use crate::error::AppError;
use crate::models::{Goal, UserProfile, Workout, WorkoutSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Page size used when reading whole collections.
const PAGE_SIZE: u32 = 100;

/// Typed database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    // ─── Generic Helpers ─────────────────────────────────────────

    async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Stored<T>>, AppError> {
        self.store
            .list_documents(collection, queries)
            .await?
            .documents
            .into_iter()
            .map(Stored::from_value)
            .collect()
    }

    /// List every matching document, paging with limit/offset.
    async fn list_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Stored<T>>, AppError> {
        let mut results = Vec::new();
        let mut offset = 0;

        loop {
            let mut page_queries = queries.to_vec();
            page_queries.push(Query::limit(PAGE_SIZE));
            page_queries.push(Query::offset(offset));

            let page: Vec<Stored<T>> = self.list(collection, &page_queries).await?;
            let fetched = page.len() as u32;
            results.extend(page);

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(results)
    }

    async fn first<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Option<Stored<T>>, AppError> {
        let mut queries = queries.to_vec();
        queries.push(Query::limit(1));
        Ok(self.list(collection, &queries).await?.into_iter().next())
    }

    async fn create<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        data: &T,
    ) -> Result<Stored<T>, AppError> {
        let value = serde_json::to_value(data)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Serialize failed: {}", e)))?;
        let created = self.store.create_document(collection, value).await?;
        Stored::from_value(created)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), AppError> {
        self.store.update_document(collection, id, patch).await?;
        Ok(())
    }

    // ─── User Profile Operations ─────────────────────────────────

    /// Find the profile owned by a backend account.
    pub async fn find_profile(
        &self,
        account_id: &str,
    ) -> Result<Option<Stored<UserProfile>>, AppError> {
        self.first(
            &self.collections.users,
            &[Query::equal("accountId", account_id)],
        )
        .await
    }

    pub async fn create_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<Stored<UserProfile>, AppError> {
        self.create(&self.collections.users, profile).await
    }

    pub async fn update_profile_weight(
        &self,
        profile_id: &str,
        weight: u32,
    ) -> Result<(), AppError> {
        self.update(&self.collections.users, profile_id, json!({ "weight": weight }))
            .await
    }

    /// Point the profile at a goal, or clear the pointer.
    pub async fn set_active_goal(
        &self,
        profile_id: &str,
        goal_id: Option<&str>,
    ) -> Result<(), AppError> {
        self.update(
            &self.collections.users,
            profile_id,
            json!({ "active_goal_id": goal_id }),
        )
        .await
    }

    // ─── Goal Operations ─────────────────────────────────────────

    pub async fn create_goal(&self, goal: &Goal) -> Result<Stored<Goal>, AppError> {
        self.create(&self.collections.goals, goal).await
    }

    pub async fn get_goal(&self, goal_id: &str) -> Result<Option<Stored<Goal>>, AppError> {
        self.store
            .get_document(&self.collections.goals, goal_id)
            .await?
            .map(Stored::from_value)
            .transpose()
    }

    /// All goals owned by a user.
    pub async fn list_goals(&self, user_id: &str) -> Result<Vec<Stored<Goal>>, AppError> {
        self.list_all(&self.collections.goals, &[Query::equal("user_id", user_id)])
            .await
    }

    /// Most recently created goal; ties on `createdAt` go to the larger ID.
    pub async fn latest_goal(&self, user_id: &str) -> Result<Option<Stored<Goal>>, AppError> {
        self.first(
            &self.collections.goals,
            &[
                Query::equal("user_id", user_id),
                Query::order_desc("createdAt"),
                Query::order_desc(fields::ID),
            ],
        )
        .await
    }

    pub async fn set_goal_reps(&self, goal_id: &str, current_rep: u32) -> Result<(), AppError> {
        self.update(
            &self.collections.goals,
            goal_id,
            json!({ "current_rep": current_rep }),
        )
        .await
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<(), AppError> {
        self.store
            .delete_document(&self.collections.goals, goal_id)
            .await
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// The user's workout with the latest `date`.
    pub async fn latest_workout(
        &self,
        user_id: &str,
    ) -> Result<Option<Stored<Workout>>, AppError> {
        self.first(
            &self.collections.workouts,
            &[Query::equal("user_id", user_id), Query::order_desc("date")],
        )
        .await
    }

    pub async fn create_workout(&self, workout: &Workout) -> Result<Stored<Workout>, AppError> {
        self.create(&self.collections.workouts, workout).await
    }

    /// Workouts of a user, newest first, optionally only those dated at or
    /// after `since` (ISO 8601).
    pub async fn list_workouts(
        &self,
        user_id: &str,
        since: Option<&str>,
    ) -> Result<Vec<Stored<Workout>>, AppError> {
        let mut queries = vec![Query::equal("user_id", user_id)];
        if let Some(since) = since {
            queries.push(Query::greater_than_equal("date", since));
        }
        queries.push(Query::order_desc("date"));

        self.list_all(&self.collections.workouts, &queries).await
    }

    // ─── Set Operations ──────────────────────────────────────────

    pub async fn create_set(&self, set: &WorkoutSet) -> Result<Stored<WorkoutSet>, AppError> {
        self.create(&self.collections.sets, set).await
    }

    pub async fn list_sets(&self, workout_id: &str) -> Result<Vec<Stored<WorkoutSet>>, AppError> {
        self.list_all(
            &self.collections.sets,
            &[Query::equal("workout_id", workout_id)],
        )
        .await
    }
}
