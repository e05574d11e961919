//! User profile model for storage.

use serde::{Deserialize, Serialize};

/// Body weight assigned to new profiles until the user sets one.
pub const DEFAULT_WEIGHT_KG: u32 = 75;

/// User profile stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Backend account ID this profile belongs to
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub email: String,
    pub username: String,
    /// Body weight in kilograms (only used for calorie estimates)
    pub weight: u32,
    /// Goal that receives reps from new recordings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_goal_id: Option<String>,
}

impl UserProfile {
    /// Profile created at signup.
    pub fn new(account_id: &str, email: &str, username: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            weight: DEFAULT_WEIGHT_KG,
            active_goal_id: None,
        }
    }
}

/// Authenticated backend account (not a stored document).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Login session returned by the session store.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Session secret, when the backend hands it out in the body
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub expire: String,
}
