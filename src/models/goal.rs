// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rep goal model and progress computation.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Rep goal stored in the `goals` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub exercise: String,
    pub reps_goal: u32,
    /// Reps accumulated from recordings; may exceed `reps_goal`
    pub current_rep: u32,
    pub user_id: String,
    /// Creation time (ISO 8601)
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Goal {
    /// Progress as shown in the goals list.
    pub fn progress(&self) -> GoalProgress {
        GoalProgress::new(&self.exercise, self.current_rep, self.reps_goal)
    }
}

/// Goal form input.
#[derive(Debug, Clone, Validate)]
pub struct NewGoal {
    #[validate(length(min = 1, max = 64, message = "Exercise is required."))]
    pub exercise: String,
    #[validate(range(min = 1, message = "Goal must be at least one rep."))]
    pub reps_goal: u32,
}

/// Clamped goal progress for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct GoalProgress {
    pub exercise: String,
    /// `min(current_rep, reps_goal)`
    pub displayed_current_rep: u32,
    pub reps_goal: u32,
    /// Percentage in `[0, 100]`
    pub percent: f64,
}

impl GoalProgress {
    pub fn new(exercise: &str, current_rep: u32, reps_goal: u32) -> Self {
        Self {
            exercise: exercise.to_string(),
            displayed_current_rep: current_rep.min(reps_goal),
            reps_goal,
            percent: progress_percent(current_rep, reps_goal),
        }
    }
}

/// `min(current / goal * 100, 100)`. A zero goal counts as complete.
pub fn progress_percent(current_rep: u32, reps_goal: u32) -> f64 {
    if reps_goal == 0 {
        return 100.0;
    }
    (f64::from(current_rep) / f64::from(reps_goal) * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(current: u32, target: u32) -> Goal {
        Goal {
            exercise: "squat".to_string(),
            reps_goal: target,
            current_rep: current,
            user_id: "user-1".to_string(),
            created_at: "2024-12-01T10:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_progress_partial() {
        let progress = goal(25, 100).progress();
        assert_eq!(progress.displayed_current_rep, 25);
        assert_eq!(progress.percent, 25.0);
    }

    #[test]
    fn test_progress_clamped_when_exceeded() {
        let progress = goal(130, 100).progress();
        assert_eq!(progress.displayed_current_rep, 100);
        assert_eq!(progress.percent, 100.0);
    }

    #[test]
    fn test_zero_goal_is_complete() {
        assert_eq!(progress_percent(0, 0), 100.0);
    }

    #[test]
    fn test_new_goal_validation() {
        let ok = NewGoal {
            exercise: "bench press".to_string(),
            reps_goal: 50,
        };
        assert!(ok.validate().is_ok());

        let empty = NewGoal {
            exercise: String::new(),
            reps_goal: 0,
        };
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("exercise"));
        assert!(errors.field_errors().contains_key("reps_goal"));
    }
}
