// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod goal;
pub mod history;
pub mod stats;
pub mod user;
pub mod workout;

pub use goal::{Goal, GoalProgress, NewGoal};
pub use history::{ExerciseSummary, WorkoutSummary, WorkoutWithSets};
pub use stats::{HomeSnapshot, WeeklySnapshot};
pub use user::{Account, Session, UserProfile};
pub use workout::{Workout, WorkoutSet};
