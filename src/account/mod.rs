/// Account management
///
/// Accounts are rows of the `users` document. The directory owns every
/// mutation of that document.

mod directory;
pub mod password;

pub use directory::{AccountDirectory, ElementSelection};

use crate::{access::Subject, element::Element, error::AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Registered account as persisted under `users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string
    pub password: String,
    #[serde(default)]
    pub role: Role,
    /// Primary element, set once by the selection flow
    #[serde(default)]
    pub selected_element: Option<Element>,
    #[serde(default)]
    pub rank: Option<String>,
    /// Epoch milliseconds of the latest bonus grant, 0 if never granted
    #[serde(default)]
    pub last_extra_access_timestamp: i64,
    #[serde(default)]
    pub extra_accessed_element_id: Option<Element>,
    pub created_at: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
}

impl Account {
    /// New `user` account with no element and no bonus history
    pub fn new(email: &str, password: &str, now: DateTime<Utc>) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password: password::hash_password(password)?,
            role: Role::User,
            selected_element: None,
            rank: None,
            last_extra_access_timestamp: 0,
            extra_accessed_element_id: None,
            created_at: now,
            last_online: now,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn subject(&self) -> Subject {
        Subject {
            is_admin: self.is_admin(),
            primary: self.selected_element,
            last_bonus_ms: self.last_extra_access_timestamp,
            bonus_element: self.extra_accessed_element_id,
        }
    }

    /// Public projection, without the credential
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            selected_element: self.selected_element,
            rank: self.rank.clone(),
            last_extra_access_timestamp: self.last_extra_access_timestamp,
            extra_accessed_element_id: self.extra_accessed_element_id,
            created_at: self.created_at,
            last_online: self.last_online,
        }
    }
}

/// Account fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub selected_element: Option<Element>,
    pub rank: Option<String>,
    pub last_extra_access_timestamp: i64,
    pub extra_accessed_element_id: Option<Element>,
    pub created_at: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
}

/// Admin edit of an account; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    pub email: Option<String>,
    /// Plain text, hashed before it is stored
    pub password: Option<String>,
    pub role: Option<Role>,
    pub selected_element: Option<Element>,
}

/// Counters shown on the admin panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub total_users: usize,
    pub admins: usize,
    pub without_element: usize,
    pub per_element: Vec<ElementCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCount {
    pub element: Element,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_defaults() {
        let now = Utc::now();
        let account = Account::new("a@x.com", "pw1", now).unwrap();

        assert_eq!(account.role, Role::User);
        assert!(account.selected_element.is_none());
        assert_eq!(account.last_extra_access_timestamp, 0);
        assert!(account.extra_accessed_element_id.is_none());
        assert_eq!(account.created_at, now);
        assert!(password::verify_password("pw1", &account.password));
    }

    #[test]
    fn test_persisted_shape_is_camel_case() {
        let account = Account::new("a@x.com", "pw1", Utc::now()).unwrap();
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["lastExtraAccessTimestamp"], 0);
        assert!(json.get("selectedElement").is_some());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_view_hides_password() {
        let account = Account::new("a@x.com", "pw1", Utc::now()).unwrap();
        let json = serde_json::to_value(account.view()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@x.com");
    }
}
