//! User account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered customer (or administrator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. API responses use [`UserView`], which omits it.
    pub password_hash: String,
    /// VIP customers get the option's vip_price when one is set
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash,
            is_vip: false,
            is_admin: false,
            created_at: Utc::now(),
        }
    }
}

/// Public view of a user, safe to return from the API
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_vip: bool,
    pub is_admin: bool,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            is_vip: u.is_vip,
            is_admin: u.is_admin,
        }
    }
}
