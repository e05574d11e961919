// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! History and home-screen aggregation.

use crate::db::Database;
use crate::error::Result;
use crate::models::history::build_history;
use crate::models::{HomeSnapshot, WeeklySnapshot, WorkoutSummary, WorkoutWithSets};
use crate::services::goals::active_goal;
use crate::services::SessionStore;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Maximum concurrent set queries while loading workouts.
const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Read-side views over the user's workouts.
#[derive(Clone)]
pub struct HistoryService {
    sessions: Arc<dyn SessionStore>,
    db: Database,
}

impl HistoryService {
    pub fn new(sessions: Arc<dyn SessionStore>, db: Database) -> Self {
        Self { sessions, db }
    }

    /// Load the user's workouts with their sets, newest first.
    ///
    /// Workouts whose date cannot be parsed are skipped.
    pub async fn load_workouts(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<WorkoutWithSets>> {
        let since = since.map(format_utc_rfc3339);
        let workouts = self.db.list_workouts(user_id, since.as_deref()).await?;
        tracing::debug!(user_id, count = workouts.len(), "Loaded workouts");

        let db = &self.db;
        let loaded: Vec<Option<WorkoutWithSets>> = stream::iter(workouts)
            .map(|workout| async move {
                let Some(date) = parse_utc_rfc3339(&workout.date) else {
                    tracing::warn!(workout_id = %workout.id, date = %workout.date, "Skipping workout with bad date");
                    return Ok(None);
                };
                let sets = db
                    .list_sets(&workout.id)
                    .await?
                    .into_iter()
                    .map(|s| s.data)
                    .collect();
                Ok::<_, crate::error::AppError>(Some(WorkoutWithSets {
                    workout_id: workout.id.clone(),
                    date,
                    sets,
                }))
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .try_collect()
            .await?;

        Ok(loaded.into_iter().flatten().collect())
    }

    /// Workout history with per-exercise calories at the user's weight.
    pub async fn history(&self) -> Result<Vec<WorkoutSummary>> {
        let user_id = self.sessions.current_account().await?.id;
        let weight_kg = match self.db.find_profile(&user_id).await? {
            Some(profile) => f64::from(profile.weight),
            None => {
                tracing::warn!(user_id = %user_id, "No profile document, using default weight");
                f64::from(crate::models::user::DEFAULT_WEIGHT_KG)
            }
        };

        let workouts = self
            .load_workouts(&user_id, None)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error fetching workouts or sets"))?;

        Ok(build_history(&workouts, weight_kg))
    }

    /// Seven-day totals ending at `now`.
    pub async fn weekly_snapshot_at(&self, now: DateTime<Utc>) -> Result<WeeklySnapshot> {
        let user_id = self.sessions.current_account().await?.id;
        let cutoff = now - chrono::Duration::days(crate::models::stats::SNAPSHOT_DAYS);
        let workouts = self.load_workouts(&user_id, Some(cutoff)).await?;
        Ok(WeeklySnapshot::from_workouts(&workouts, now))
    }

    /// Home screen: active goal progress plus the weekly snapshot.
    pub async fn home(&self) -> Result<HomeSnapshot> {
        self.home_at(Utc::now()).await
    }

    pub async fn home_at(&self, now: DateTime<Utc>) -> Result<HomeSnapshot> {
        let user_id = self.sessions.current_account().await?.id;
        let current_goal = active_goal(&self.db, &user_id)
            .await?
            .map(|goal| goal.progress());
        let week = self.weekly_snapshot_at(now).await?;

        Ok(HomeSnapshot { current_goal, week })
    }
}
