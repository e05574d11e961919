// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recording upload.
//!
//! Handles the core workflow:
//! 1. Resolve the current user
//! 2. Reuse the latest workout if it started within the window, else create one
//! 3. Store the set
//! 4. Add the reps to the active goal when the exercise matches

use crate::db::{Database, Stored};
use crate::error::{Operation, Result};
use crate::models::{Workout, WorkoutSet};
use crate::services::goals::active_goal;
use crate::services::SessionStore;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Uploads finished recordings.
#[derive(Clone)]
pub struct RecordingUploader {
    sessions: Arc<dyn SessionStore>,
    db: Database,
    workout_window: Duration,
}

/// What an upload wrote.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub set: Stored<WorkoutSet>,
    /// Whether a new workout document was created for this set
    pub workout_created: bool,
    /// Goal that received the reps, if any
    pub goal_updated: Option<String>,
}

impl RecordingUploader {
    pub fn new(sessions: Arc<dyn SessionStore>, db: Database, workout_window: Duration) -> Self {
        Self {
            sessions,
            db,
            workout_window,
        }
    }

    /// Upload a recording made now.
    pub async fn upload_recording(
        &self,
        average_heart_rate: f64,
        exercise: &str,
        reps: u32,
        elapsed_seconds: Option<u32>,
    ) -> Result<UploadResult> {
        self.upload_recording_at(average_heart_rate, exercise, reps, elapsed_seconds, Utc::now())
            .await
    }

    /// Upload a recording as of `now`.
    pub async fn upload_recording_at(
        &self,
        average_heart_rate: f64,
        exercise: &str,
        reps: u32,
        elapsed_seconds: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<UploadResult> {
        tracing::info!(
            exercise,
            average_heart_rate,
            reps,
            elapsed_seconds,
            "Uploading recording"
        );

        let result = self
            .upload_inner(average_heart_rate, exercise, reps, elapsed_seconds, now)
            .await;

        result.map_err(|e| {
            tracing::error!(error = %e, "Error creating recording");
            e.during(Operation::CreateRecording)
        })
    }

    async fn upload_inner(
        &self,
        average_heart_rate: f64,
        exercise: &str,
        reps: u32,
        elapsed_seconds: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<UploadResult> {
        let user_id = self.sessions.current_account().await?.id;

        // 1. Pick the workout
        let (workout_id, workout_created) = match self.reusable_workout(&user_id, now).await? {
            Some(id) => (id, false),
            None => {
                let workout = Workout {
                    user_id: user_id.clone(),
                    date: format_utc_rfc3339(now),
                };
                let created = self.db.create_workout(&workout).await?;
                tracing::debug!(workout_id = %created.id, "Started new workout");
                (created.id, true)
            }
        };

        // 2. Store the set
        let set = WorkoutSet {
            exercise: exercise.to_string(),
            reps,
            avg_heart_rate: truncate_heart_rate(average_heart_rate),
            workout_id,
            elapsed_seconds,
        };
        let stored = self.db.create_set(&set).await?;
        tracing::info!(set_id = %stored.id, workout_id = %set.workout_id, "Recording created successfully");

        // 3. Credit the active goal
        let mut goal_updated = None;
        if let Some(goal) = active_goal(&self.db, &user_id).await? {
            if goal.exercise == exercise {
                let updated = goal.current_rep.saturating_add(reps);
                self.db.set_goal_reps(&goal.id, updated).await?;
                tracing::debug!(goal_id = %goal.id, current_rep = updated, "Goal progress updated");
                goal_updated = Some(goal.id.clone());
            }
        }

        Ok(UploadResult {
            set: stored,
            workout_created,
            goal_updated,
        })
    }

    /// ID of the latest workout if it started less than the window before `now`.
    async fn reusable_workout(&self, user_id: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(latest) = self.db.latest_workout(user_id).await? else {
            return Ok(None);
        };

        let Some(started) = parse_utc_rfc3339(&latest.date) else {
            tracing::warn!(workout_id = %latest.id, date = %latest.date, "Unparseable workout date");
            return Ok(None);
        };

        Ok((now - started < self.workout_window).then(|| latest.id.clone()))
    }
}

/// Stored heart rates are whole bpm; fractions are dropped.
fn truncate_heart_rate(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u32
    } else {
        0
    }
}
