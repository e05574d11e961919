//! Application configuration loaded from environment variables.
//!
//! Every value has a default matching the hosted project the mobile app ships
//! with, so a bare environment still talks to the production backend.

use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
const DEFAULT_PLATFORM: &str = "com.tsm.workout";
const DEFAULT_PROJECT_ID: &str = "674bb1a1001f9f5dc434";
const DEFAULT_DATABASE_ID: &str = "674cb1fa0017efe23138";
const DEFAULT_USER_COLLECTION_ID: &str = "674cb278002e8af8ae5c";
const DEFAULT_GOAL_COLLECTION_ID: &str = "674cb2a10020270cd316";
const DEFAULT_WORKOUT_COLLECTION_ID: &str = "674cbdba000e1ece18ae";
const DEFAULT_SET_COLLECTION_ID: &str = "674cbe2000109e9f72eb";
const DEFAULT_DELETE_ACCOUNT_FUNCTION_ID: &str = "6754b2fc000ef1a0c649";

/// Advertised name of the wearable we pair with.
pub const DEFAULT_PERIPHERAL_NAME: &str = "WorkoutTracker";
/// How long a scan may run before giving up.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;
/// Sets recorded within this many minutes of the latest workout join it.
pub const DEFAULT_WORKOUT_WINDOW_MINUTES: i64 = 120;

/// Collection identifiers inside the hosted database.
#[derive(Debug, Clone)]
pub struct Collections {
    pub users: String,
    pub goals: String,
    pub workouts: String,
    pub sets: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Backend ---
    /// Appwrite REST endpoint (including the `/v1` suffix)
    pub endpoint: String,
    /// Appwrite project ID
    pub project_id: String,
    /// Platform / bundle identifier sent with every request
    pub platform: String,
    /// Database holding the four collections
    pub database_id: String,
    pub collections: Collections,
    /// Serverless function that deletes an account and its data
    pub delete_account_function_id: String,

    // --- Recording ---
    /// Exact advertised name of the BLE peripheral
    pub peripheral_name: String,
    pub scan_timeout: Duration,
    /// Window within which a new set reuses the latest workout
    pub workout_window: chrono::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            collections: Collections {
                users: DEFAULT_USER_COLLECTION_ID.to_string(),
                goals: DEFAULT_GOAL_COLLECTION_ID.to_string(),
                workouts: DEFAULT_WORKOUT_COLLECTION_ID.to_string(),
                sets: DEFAULT_SET_COLLECTION_ID.to_string(),
            },
            delete_account_function_id: DEFAULT_DELETE_ACCOUNT_FUNCTION_ID.to_string(),
            peripheral_name: DEFAULT_PERIPHERAL_NAME.to_string(),
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
            workout_window: chrono::Duration::minutes(DEFAULT_WORKOUT_WINDOW_MINUTES),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            endpoint: var_or("APPWRITE_ENDPOINT", &defaults.endpoint)
                .trim_end_matches('/')
                .to_string(),
            project_id: var_or("APPWRITE_PROJECT_ID", &defaults.project_id),
            platform: var_or("APPWRITE_PLATFORM", &defaults.platform),
            database_id: var_or("APPWRITE_DATABASE_ID", &defaults.database_id),
            collections: Collections {
                users: var_or("USER_COLLECTION_ID", &defaults.collections.users),
                goals: var_or("GOAL_COLLECTION_ID", &defaults.collections.goals),
                workouts: var_or("WORKOUT_COLLECTION_ID", &defaults.collections.workouts),
                sets: var_or("SET_COLLECTION_ID", &defaults.collections.sets),
            },
            delete_account_function_id: var_or(
                "DELETE_ACCOUNT_FUNCTION_ID",
                &defaults.delete_account_function_id,
            ),
            peripheral_name: var_or("PERIPHERAL_NAME", &defaults.peripheral_name),
            scan_timeout: Duration::from_secs(parse_var(
                "BLE_SCAN_TIMEOUT_SECS",
                DEFAULT_SCAN_TIMEOUT_SECS,
            )?),
            workout_window: chrono::Duration::minutes(parse_var(
                "WORKOUT_WINDOW_MINUTES",
                DEFAULT_WORKOUT_WINDOW_MINUTES,
            )?),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("APPWRITE_ENDPOINT", "http://localhost:8080/v1/");
        env::set_var("PERIPHERAL_NAME", "TestBand");
        env::set_var("WORKOUT_WINDOW_MINUTES", "90");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.endpoint, "http://localhost:8080/v1");
        assert_eq!(config.peripheral_name, "TestBand");
        assert_eq!(config.workout_window, chrono::Duration::minutes(90));
        assert_eq!(config.scan_timeout, Duration::from_secs(10));

        env::remove_var("APPWRITE_ENDPOINT");
        env::remove_var("PERIPHERAL_NAME");
        env::remove_var("WORKOUT_WINDOW_MINUTES");
    }

    #[test]
    fn test_defaults_match_shipped_project() {
        let config = Config::default();
        assert_eq!(config.workout_window, chrono::Duration::hours(2));
        assert_eq!(config.collections.sets, DEFAULT_SET_COLLECTION_ID);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        env::set_var("WORKOUT_TRACKER_TEST_NUMBER", "ten");
        let err = parse_var::<u64>("WORKOUT_TRACKER_TEST_NUMBER", 10).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("WORKOUT_TRACKER_TEST_NUMBER", _)));
    }
}
