// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Goal management and active-goal resolution.

use crate::db::{Database, Stored};
use crate::error::{AppError, Operation, Result};
use crate::models::{Goal, GoalProgress, NewGoal};
use crate::services::forms::parse_whole_number;
use crate::services::SessionStore;
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;
use validator::Validate;

/// Resolve the goal that receives reps from new recordings.
///
/// Follows the profile's `active_goal_id` when it points at an existing goal
/// of this user, otherwise falls back to the most recently created goal.
pub async fn active_goal(db: &Database, account_id: &str) -> Result<Option<Stored<Goal>>> {
    if let Some(profile) = db.find_profile(account_id).await? {
        if let Some(goal_id) = profile.active_goal_id.as_deref() {
            match db.get_goal(goal_id).await? {
                Some(goal) if goal.user_id == account_id => return Ok(Some(goal)),
                _ => tracing::warn!(goal_id, "Active goal pointer is stale, using latest goal"),
            }
        }
    }

    db.latest_goal(account_id).await
}

/// Goals of the logged-in user.
#[derive(Clone)]
pub struct GoalService {
    sessions: Arc<dyn SessionStore>,
    db: Database,
}

impl GoalService {
    pub fn new(sessions: Arc<dyn SessionStore>, db: Database) -> Self {
        Self { sessions, db }
    }

    /// Create a goal with zero progress and make it the active goal.
    ///
    /// Marking the goal active is best-effort; [`active_goal`] falls back to
    /// the newest goal.
    pub async fn create_goal(&self, new_goal: &NewGoal) -> Result<Stored<Goal>> {
        new_goal.validate()?;
        tracing::info!(exercise = %new_goal.exercise, reps_goal = new_goal.reps_goal, "Creating goal");

        let user_id = self
            .sessions
            .current_account()
            .await
            .map_err(|e| e.during(Operation::CreateGoal))?
            .id;
        let goal = Goal {
            exercise: new_goal.exercise.clone(),
            reps_goal: new_goal.reps_goal,
            current_rep: 0,
            user_id: user_id.clone(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        let stored = self.db.create_goal(&goal).await.map_err(|e| {
            tracing::error!(error = %e, "Error creating goal");
            e.during(Operation::CreateGoal)
        })?;

        if let Err(e) = self.point_active_goal(&user_id, Some(&stored.id)).await {
            tracing::warn!(error = %e, goal_id = %stored.id, "Failed to mark goal active");
        }

        tracing::info!(goal_id = %stored.id, "Goal created successfully");
        Ok(stored)
    }

    /// Create a goal from the form's text fields.
    pub async fn create_goal_from_input(
        &self,
        exercise: &str,
        reps_goal: &str,
    ) -> Result<Stored<Goal>> {
        let new_goal = NewGoal {
            exercise: exercise.trim().to_string(),
            reps_goal: parse_whole_number(reps_goal, "Goal")?,
        };
        self.create_goal(&new_goal).await
    }

    async fn point_active_goal(&self, user_id: &str, goal_id: Option<&str>) -> Result<()> {
        match self.db.find_profile(user_id).await? {
            Some(profile) => self.db.set_active_goal(&profile.id, goal_id).await,
            None => {
                tracing::warn!(user_id, "No profile document, active goal not updated");
                Ok(())
            }
        }
    }

    /// All goals of the current user.
    pub async fn list_goals(&self) -> Result<Vec<Stored<Goal>>> {
        let user_id = self.sessions.current_account().await?.id;
        self.db.list_goals(&user_id).await
    }

    /// Goals with clamped progress, keyed by goal ID.
    pub async fn list_progress(&self) -> Result<Vec<(String, GoalProgress)>> {
        Ok(self
            .list_goals()
            .await?
            .into_iter()
            .map(|goal| {
                let progress = goal.progress();
                (goal.id, progress)
            })
            .collect())
    }

    /// The goal new recordings count towards.
    pub async fn active_goal(&self) -> Result<Option<Stored<Goal>>> {
        let user_id = self.sessions.current_account().await?.id;
        active_goal(&self.db, &user_id).await
    }

    /// Delete one goal, clearing the active pointer if it referenced it.
    pub async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        if goal_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Goal ID is required to delete a goal.".to_string(),
            ));
        }

        let user_id = self
            .sessions
            .current_account()
            .await
            .map_err(|e| e.during(Operation::DeleteGoal))?
            .id;
        self.db.delete_goal(goal_id).await.map_err(|e| {
            tracing::error!(error = %e, goal_id, "Error deleting goal");
            e.during(Operation::DeleteGoal)
        })?;

        // Best-effort, like marking it active
        match self.db.find_profile(&user_id).await {
            Ok(Some(profile)) if profile.active_goal_id.as_deref() == Some(goal_id) => {
                if let Err(e) = self.db.set_active_goal(&profile.id, None).await {
                    tracing::warn!(error = %e, goal_id, "Failed to clear active goal");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, goal_id, "Failed to load profile after goal deletion"),
        }

        tracing::info!(goal_id, "Goal deleted successfully");
        Ok(())
    }
}
