// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Utc};
use std::sync::Arc;
use workout_tracker::config::Config;
use workout_tracker::db::MemoryDb;
use workout_tracker::models::{Account, UserProfile};
use workout_tracker::services::{MemorySessionStore, StaticFunctionRunner};
use workout_tracker::time_utils::format_utc_rfc3339;
use workout_tracker::App;

pub const TEST_EMAIL: &str = "lifter@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";

/// An app wired to in-memory backends, with handles to inspect them.
#[allow(dead_code)]
pub struct TestApp {
    pub app: App,
    pub memory: MemoryDb,
    pub sessions: MemorySessionStore,
    pub functions: StaticFunctionRunner,
}

/// Create a test app with offline in-memory dependencies and no session.
#[allow(dead_code)]
pub fn create_test_app(deletion_response: &str) -> TestApp {
    build_test_app(MemorySessionStore::new(), deletion_response)
}

#[allow(dead_code)]
fn build_test_app(sessions: MemorySessionStore, deletion_response: &str) -> TestApp {
    let memory = MemoryDb::new();
    let functions = StaticFunctionRunner::new(deletion_response);

    let app = App::new(
        Config::default(),
        Arc::new(memory.clone()),
        Arc::new(sessions.clone()),
        Arc::new(functions.clone()),
    );

    TestApp {
        app,
        memory,
        sessions,
        functions,
    }
}

/// Create a test app with a registered, logged-in user and profile.
#[allow(dead_code)]
pub async fn logged_in_app() -> (TestApp, Account) {
    let (sessions, account) = MemorySessionStore::logged_in(TEST_EMAIL, TEST_PASSWORD)
        .await
        .unwrap();
    let test_app = build_test_app(sessions, r#"{"success":true}"#);
    test_app
        .app
        .db
        .create_profile(&UserProfile::new(&account.id, TEST_EMAIL, "lifter"))
        .await
        .unwrap();

    (test_app, account)
}

/// Insert a workout document with a fixed start date.
#[allow(dead_code)]
pub fn seed_workout(memory: &MemoryDb, user_id: &str, id: &str, date: DateTime<Utc>) {
    let date = format_utc_rfc3339(date);
    memory.insert_raw(
        &Config::default().collections.workouts,
        serde_json::json!({
            "$id": id,
            "$createdAt": date,
            "$updatedAt": date,
            "user_id": user_id,
            "date": date,
        }),
    );
}

/// Insert a set document.
#[allow(dead_code)]
pub fn seed_set(memory: &MemoryDb, workout_id: &str, exercise: &str, reps: u32, avghr: u32) {
    memory.insert_raw(
        &Config::default().collections.sets,
        serde_json::json!({
            "$id": uuid::Uuid::new_v4().simple().to_string(),
            "$createdAt": "2026-01-01T00:00:00.000Z",
            "exercise": exercise,
            "rep_count": reps,
            "avghr": avghr,
            "workout_id": workout_id,
        }),
    );
}

/// Insert a goal document with explicit creation time.
#[allow(dead_code)]
pub fn seed_goal(
    memory: &MemoryDb,
    user_id: &str,
    id: &str,
    exercise: &str,
    reps_goal: u32,
    current_rep: u32,
    created_at: DateTime<Utc>,
) {
    let created_at = format_utc_rfc3339(created_at);
    memory.insert_raw(
        &Config::default().collections.goals,
        serde_json::json!({
            "$id": id,
            "$createdAt": created_at,
            "exercise": exercise,
            "reps_goal": reps_goal,
            "current_rep": current_rep,
            "user_id": user_id,
            "createdAt": created_at,
        }),
    );
}
