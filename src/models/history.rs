// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout history aggregation and calorie estimates.

use crate::models::WorkoutSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// MET used for exercises missing from [`MET_VALUES`].
pub const DEFAULT_MET: f64 = 5.0;

/// Metabolic equivalents per exercise (lowercase names).
pub const MET_VALUES: &[(&str, f64)] = &[
    ("bench press", 6.0),
    ("squat", 5.0),
    ("deadlift", 6.0),
    ("overhead press", 5.0),
    ("bicep curl", 3.5),
    ("pull up", 8.0),
    ("push up", 3.8),
];

/// MET value for an exercise, case-insensitive.
pub fn met_for(exercise: &str) -> f64 {
    let key = exercise.trim().to_lowercase();
    MET_VALUES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, met)| *met)
        .unwrap_or(DEFAULT_MET)
}

/// Estimated calories: `MET * weight_kg * 3.5 / 200 * minutes`.
pub fn calculate_calories(exercise: &str, weight_kg: f64, minutes: f64) -> f64 {
    met_for(exercise) * weight_kg * 3.5 / 200.0 * minutes
}

/// A workout together with its sets, as loaded from the store.
#[derive(Debug, Clone)]
pub struct WorkoutWithSets {
    pub workout_id: String,
    pub date: DateTime<Utc>,
    pub sets: Vec<WorkoutSet>,
}

/// Per-exercise totals within one workout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct ExerciseSummary {
    pub exercise: String,
    pub reps: u32,
    pub elapsed_seconds: u32,
    pub calories: f64,
}

/// One row of the history screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct WorkoutSummary {
    pub workout_id: String,
    pub date: String,
    /// In order of first appearance
    pub exercises: Vec<ExerciseSummary>,
    /// Mean of the sets' average heart rates, one decimal; `None` without sets
    pub average_heart_rate: Option<f64>,
    pub total_calories: f64,
}

impl WorkoutSummary {
    /// Heart rate as displayed ("N/A" when there are no sets).
    pub fn average_heart_rate_label(&self) -> String {
        match self.average_heart_rate {
            Some(avg) => format!("{:.1}", avg),
            None => "N/A".to_string(),
        }
    }
}

/// Round to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the sets' heart rates, rounded; `None` for no sets.
pub fn mean_heart_rate(sets: &[WorkoutSet]) -> Option<f64> {
    if sets.is_empty() {
        return None;
    }
    let total: f64 = sets.iter().map(|s| f64::from(s.avg_heart_rate)).sum();
    Some(round_one_decimal(total / sets.len() as f64))
}

/// Group sets by exercise, summing reps and elapsed time.
pub fn group_by_exercise(sets: &[WorkoutSet], weight_kg: f64) -> Vec<ExerciseSummary> {
    let mut grouped: Vec<ExerciseSummary> = Vec::new();

    for set in sets {
        let elapsed = set.elapsed_seconds.unwrap_or(0);
        match grouped.iter_mut().find(|e| e.exercise == set.exercise) {
            Some(existing) => {
                existing.reps = existing.reps.saturating_add(set.reps);
                existing.elapsed_seconds = existing.elapsed_seconds.saturating_add(elapsed);
            }
            None => grouped.push(ExerciseSummary {
                exercise: set.exercise.clone(),
                reps: set.reps,
                elapsed_seconds: elapsed,
                calories: 0.0,
            }),
        }
    }

    for entry in &mut grouped {
        let minutes = f64::from(entry.elapsed_seconds) / 60.0;
        entry.calories = calculate_calories(&entry.exercise, weight_kg, minutes);
    }

    grouped
}

/// Summarize one workout.
pub fn summarize_workout(workout: &WorkoutWithSets, weight_kg: f64) -> WorkoutSummary {
    let exercises = group_by_exercise(&workout.sets, weight_kg);
    let total_calories = exercises.iter().map(|e| e.calories).sum();

    WorkoutSummary {
        workout_id: workout.workout_id.clone(),
        date: crate::time_utils::format_utc_rfc3339(workout.date),
        exercises,
        average_heart_rate: mean_heart_rate(&workout.sets),
        total_calories,
    }
}

/// Summarize all workouts, newest first.
pub fn build_history(workouts: &[WorkoutWithSets], weight_kg: f64) -> Vec<WorkoutSummary> {
    let mut ordered: Vec<&WorkoutWithSets> = workouts.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));

    ordered
        .into_iter()
        .map(|w| summarize_workout(w, weight_kg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn set(exercise: &str, reps: u32, avghr: u32, elapsed: Option<u32>) -> WorkoutSet {
        WorkoutSet {
            exercise: exercise.to_string(),
            reps,
            avg_heart_rate: avghr,
            workout_id: "w1".to_string(),
            elapsed_seconds: elapsed,
        }
    }

    #[test]
    fn test_grouping_saturates_reps() {
        let sets = vec![
            set("squat", u32::MAX, 100, Some(u32::MAX)),
            set("squat", 3, 100, Some(60)),
        ];
        let grouped = group_by_exercise(&sets, 75.0);

        assert_eq!(grouped[0].reps, u32::MAX);
        assert_eq!(grouped[0].elapsed_seconds, u32::MAX);
    }

    #[test]
    fn test_calories_for_bench_press() {
        let calories = calculate_calories("bench press", 75.0, 10.0);
        assert!((calories - 78.75).abs() < 1e-9);
    }

    #[test]
    fn test_unlisted_exercise_uses_default_met() {
        assert_eq!(met_for("kettlebell swing"), DEFAULT_MET);
        assert_eq!(met_for("Bench Press"), 6.0);
    }

    #[test]
    fn test_duplicate_exercises_are_summed() {
        let workout = WorkoutWithSets {
            workout_id: "w1".to_string(),
            date: Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap(),
            sets: vec![
                set("bench press", 5, 100, None),
                set("bench press", 3, 120, None),
            ],
        };

        let summary = summarize_workout(&workout, 75.0);

        assert_eq!(summary.exercises.len(), 1);
        assert_eq!(summary.exercises[0].exercise, "bench press");
        assert_eq!(summary.exercises[0].reps, 8);
        assert_eq!(summary.average_heart_rate, Some(110.0));
        assert_eq!(summary.average_heart_rate_label(), "110.0");
    }

    #[test]
    fn test_empty_workout_has_no_heart_rate() {
        let workout = WorkoutWithSets {
            workout_id: "w1".to_string(),
            date: Utc::now(),
            sets: vec![],
        };
        let summary = summarize_workout(&workout, 75.0);
        assert_eq!(summary.average_heart_rate, None);
        assert_eq!(summary.average_heart_rate_label(), "N/A");
        assert!(summary.exercises.is_empty());
    }

    #[test]
    fn test_mean_is_rounded_to_one_decimal() {
        let sets = vec![set("squat", 1, 100, None), set("squat", 1, 101, None), set("squat", 1, 101, None)];
        assert_eq!(mean_heart_rate(&sets), Some(100.7));
    }

    #[test]
    fn test_elapsed_time_drives_calories() {
        let sets = vec![
            set("bench press", 5, 100, Some(300)),
            set("bench press", 5, 100, Some(300)),
            set("squat", 5, 100, None),
        ];
        let grouped = group_by_exercise(&sets, 75.0);

        assert_eq!(grouped[0].elapsed_seconds, 600);
        assert!((grouped[0].calories - 78.75).abs() < 1e-9);
        assert_eq!(grouped[1].calories, 0.0);
    }

    #[test]
    fn test_history_sorted_newest_first() {
        let older = WorkoutWithSets {
            workout_id: "old".to_string(),
            date: Utc.with_ymd_and_hms(2024, 11, 1, 10, 0, 0).unwrap(),
            sets: vec![],
        };
        let newer = WorkoutWithSets {
            workout_id: "new".to_string(),
            date: Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap(),
            sets: vec![],
        };

        let history = build_history(&[older, newer], 75.0);
        let ids: Vec<_> = history.iter().map(|h| h.workout_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
