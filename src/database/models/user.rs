use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub normalized_email: String,
    pub first_name: String,
    pub last_name: String,
    pub izaro_code: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// Fields for a user row that has not been inserted yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub izaro_code: String,
    pub password_hash: String,
}

/// Mutable profile fields of an existing user
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub izaro_code: String,
}

/// Profile and role membership changes applied to one user as a unit
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub profile: Option<UserProfile>,
    pub add_roles: Vec<String>,
    pub remove_roles: Vec<String>,
    /// Role that must keep at least one holder once the update lands
    pub protected_role: Option<String>,
}

impl UserUpdate {
    /// The protected role, when this update takes it away
    pub fn removed_protected_role(&self) -> Option<&str> {
        let protected = self.protected_role.as_deref()?;
        let key = normalize_key(protected);
        self.remove_roles
            .iter()
            .any(|r| normalize_key(r) == key)
            .then_some(protected)
    }

    pub fn changes_roles(&self) -> bool {
        !self.add_roles.is_empty() || !self.remove_roles.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Applied(User),
    /// Nothing was written: the user is the only holder of the protected role
    LastHolder,
}

/// Lookup key used for emails and role names
pub fn normalize_key(value: &str) -> String {
    value.trim().to_uppercase()
}
