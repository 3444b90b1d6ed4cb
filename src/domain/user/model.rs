use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::role::Role;
use crate::infrastructure::crypto::password;

use super::UpdateUserRequest;

/// User model
///
/// `password_hash` is always a bcrypt hash, never plaintext.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: Option<Uuid>,
    /// Loaded role, populated by repository reads
    pub role: Option<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        full_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            full_name: full_name.into(),
            username: username.into(),
            email: email.into(),
            password_hash,
            role_id: None,
            role: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check a candidate password against the stored hash.
    pub fn verify_password(&self, plain: &str) -> bool {
        password::verify_password(plain, &self.password_hash).unwrap_or(false)
    }

    /// Merge the supplied fields of an (already normalized) update.
    /// The new password must be hashed by the caller.
    pub fn apply_update(&mut self, update: UpdateUserRequest, new_password_hash: Option<String>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(full_name) = update.full_name {
            self.full_name = full_name;
        }
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(hash) = new_password_hash {
            self.password_hash = hash;
        }
        if let Some(role_id) = update.role_id {
            if self.role_id != Some(role_id) {
                self.role = None;
            }
            self.role_id = Some(role_id);
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
    }
}

/// User response projection (no password)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
