use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(display_name: &str, email: &str, password_hash: &str) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            disabled: false,
            created_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
impl User {
    pub fn test_user(display_name: &str, email: &str) -> Self {
        User::new(display_name, email, "$argon2id$test-hash")
    }

    pub fn test_user_simple(display_name: &str) -> Self {
        User::test_user(
            display_name,
            &format!("{}@example.com", display_name.to_lowercase()),
        )
    }
}
