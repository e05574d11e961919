//! Weekly snapshot aggregate for the home screen.
//!
//! Computed on the client from the last seven days of workouts, the same way
//! the history screen groups sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::history::{round_one_decimal, WorkoutWithSets};
use crate::models::{GoalProgress, WorkoutSet};

/// Length of the rolling window summarized on the home screen.
pub const SNAPSHOT_DAYS: i64 = 7;

/// Rolling seven-day totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct WeeklySnapshot {
    // ─── Totals ──────────────────────────────────────────────────
    #[serde(default)]
    pub total_reps: u32,
    #[serde(default)]
    pub total_sets: u32,
    #[serde(default)]
    pub workouts: u32,

    // ─── Heart Rate ──────────────────────────────────────────────
    /// Mean of set heart rates, one decimal; `None` without sets
    #[serde(default)]
    pub average_heart_rate: Option<f64>,
    #[serde(skip)]
    heart_rate_sum: f64,

    // ─── By Exercise ─────────────────────────────────────────────
    #[serde(default)]
    pub reps_by_exercise: BTreeMap<String, u32>,
}

impl WeeklySnapshot {
    /// Fold one set into the totals.
    pub fn add_set(&mut self, set: &WorkoutSet) {
        self.total_reps = self.total_reps.saturating_add(set.reps);
        self.total_sets = self.total_sets.saturating_add(1);
        self.heart_rate_sum += f64::from(set.avg_heart_rate);
        self.average_heart_rate = Some(round_one_decimal(
            self.heart_rate_sum / f64::from(self.total_sets),
        ));

        let reps = self
            .reps_by_exercise
            .entry(set.exercise.clone())
            .or_insert(0);
        *reps = reps.saturating_add(set.reps);
    }

    /// Aggregate the workouts dated within the last seven days of `now`.
    pub fn from_workouts(workouts: &[WorkoutWithSets], now: chrono::DateTime<chrono::Utc>) -> Self {
        let cutoff = now - chrono::Duration::days(SNAPSHOT_DAYS);
        let mut snapshot = Self::default();

        for workout in workouts.iter().filter(|w| w.date >= cutoff && w.date <= now) {
            snapshot.workouts += 1;
            for set in &workout.sets {
                snapshot.add_set(set);
            }
        }

        snapshot
    }
}

/// Everything the home screen shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct HomeSnapshot {
    pub current_goal: Option<GoalProgress>,
    pub week: WeeklySnapshot,
}
