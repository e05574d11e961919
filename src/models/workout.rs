// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout and set models for storage.

use serde::{Deserialize, Serialize};

/// Workout record in the `workouts` collection.
///
/// Groups the sets recorded in one session. Created implicitly by the upload
/// path, never deleted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub user_id: String,
    /// Start date/time (ISO 8601)
    pub date: String,
}

/// A recorded set in the `sets` collection. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub exercise: String,
    #[serde(rename = "rep_count")]
    pub reps: u32,
    /// Average heart rate over the recording (bpm, truncated)
    #[serde(rename = "avghr")]
    pub avg_heart_rate: u32,
    pub workout_id: String,
    /// Seconds spent on the set, when known
    #[serde(rename = "elapsedTime", default)]
    pub elapsed_seconds: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_uses_stored_field_names() {
        let set = WorkoutSet {
            exercise: "deadlift".to_string(),
            reps: 9,
            avg_heart_rate: 101,
            workout_id: "w1".to_string(),
            elapsed_seconds: None,
        };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["rep_count"], 9);
        assert_eq!(json["avghr"], 101);
        assert!(json["elapsedTime"].is_null());
    }

    #[test]
    fn test_set_without_elapsed_time_parses() {
        let set: WorkoutSet = serde_json::from_str(
            r#"{"exercise":"squat","rep_count":5,"avghr":90,"workout_id":"w"}"#,
        )
        .unwrap();
        assert_eq!(set.elapsed_seconds, None);
    }
}
