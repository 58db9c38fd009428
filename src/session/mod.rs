/// Sessions and the identities they resolve to
///
/// A session stores who is logged in and nothing else. Everything a client
/// sees about itself is looked up from the account directory on each
/// request, so admin edits take effect immediately.

mod manager;

pub use manager::{AuthOutcome, SessionManager};

use crate::{
    access::Subject,
    account::{Account, Role},
    element::Element,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fixed id of the synthesised superuser identity
pub const SUPERUSER_ID: &str = "admin-001";

/// Who a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Principal {
    Superuser,
    Account(String),
}

/// Persisted under `session_<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub principal: Principal,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Same instant as the token's `exp`
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Live view of the logged-in principal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub selected_element: Option<Element>,
    pub rank: Option<String>,
    pub last_extra_access_timestamp: i64,
    pub extra_accessed_element_id: Option<Element>,
    pub created_at: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
    pub is_superuser: bool,
}

impl Identity {
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            role: account.role,
            selected_element: account.selected_element,
            rank: account.rank.clone(),
            last_extra_access_timestamp: account.last_extra_access_timestamp,
            extra_accessed_element_id: account.extra_accessed_element_id,
            created_at: account.created_at,
            last_online: account.last_online,
            is_superuser: false,
        }
    }

    pub fn superuser(email: &str, session: &SessionRecord) -> Self {
        Self {
            id: SUPERUSER_ID.to_string(),
            email: email.to_string(),
            role: Role::Admin,
            selected_element: None,
            rank: Some("Admin".to_string()),
            last_extra_access_timestamp: 0,
            extra_accessed_element_id: None,
            created_at: session.created_at,
            last_online: session.last_seen,
            is_superuser: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Directory id, `None` for the superuser
    pub fn account_id(&self) -> Option<&str> {
        if self.is_superuser {
            None
        } else {
            Some(&self.id)
        }
    }

    pub fn subject(&self) -> Subject {
        Subject {
            is_admin: self.is_admin(),
            primary: self.selected_element,
            last_bonus_ms: self.last_extra_access_timestamp,
            bonus_element: self.extra_accessed_element_id,
        }
    }
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
    pub confirm_password: String,
}

/// Bearer token claims
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    /// Session id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}
