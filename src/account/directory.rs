/// Account directory over the `users` document
use crate::{
    access::{self, AccessDecision, GrantReason},
    account::{password, Account, AccountPatch, DirectoryStats, ElementCount, Role},
    element::{Element, ElementRef},
    error::{AppError, AppResult},
    store::{keys, Store},
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Result of the one-time element selection
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSelection {
    /// The element was stored just now
    Selected(Account),
    /// The account already had an element; nothing changed
    AlreadySelected(Account),
}

impl ElementSelection {
    pub fn account(&self) -> &Account {
        match self {
            ElementSelection::Selected(a) | ElementSelection::AlreadySelected(a) => a,
        }
    }
}

/// Account directory service
///
/// Every mutation is a read-modify-write of the whole `users` document,
/// serialised by `write_lock`.
pub struct AccountDirectory {
    store: Store,
    write_lock: Mutex<()>,
    unique_emails: bool,
}

impl AccountDirectory {
    pub fn new(store: Store, unique_emails: bool) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            unique_emails,
        }
    }

    /// All accounts in insertion order
    pub async fn list(&self) -> AppResult<Vec<Account>> {
        Ok(self
            .store
            .get_json::<Vec<Account>>(keys::USERS)
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Account>> {
        Ok(self.list().await?.into_iter().find(|a| a.id == id))
    }

    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.list().await?.len())
    }

    /// Linear scan; exact email match, then password check. First match wins.
    pub async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<Option<Account>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|a| a.email == email)
            .find(|a| password::verify_password(password, &a.password)))
    }

    /// Append a new account
    pub async fn insert(&self, account: Account) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;

        if self.unique_emails && accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        tracing::debug!("inserting account {}", account.id);
        accounts.push(account);
        self.save(&accounts).await
    }

    /// Replace the row with the same id; returns false if there was none
    pub async fn update(&self, account: Account) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;

        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(slot) => {
                *slot = account;
                self.save(&accounts).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the row with `id`; returns false if there was none
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;
        let before = accounts.len();
        accounts.retain(|a| a.id != id);

        if accounts.len() == before {
            return Ok(false);
        }

        tracing::info!("deleted account {}", id);
        self.save(&accounts).await?;
        Ok(true)
    }

    pub async fn promote_to_admin(&self, id: &str) -> AppResult<Option<Account>> {
        self.modify(id, |a| a.role = Role::Admin).await
    }

    /// Write a free-text rank label; `None` clears it
    pub async fn assign_rank(&self, id: &str, rank: Option<String>) -> AppResult<Option<Account>> {
        self.modify(id, move |a| a.rank = rank).await
    }

    /// One-time element choice
    ///
    /// The first call stores the element, labels the account with the
    /// element's name as rank and clears bonus state. Later calls change
    /// nothing.
    pub async fn select_element(
        &self,
        id: &str,
        element: Element,
    ) -> AppResult<Option<ElementSelection>> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        if account.selected_element.is_some() {
            return Ok(Some(ElementSelection::AlreadySelected(account.clone())));
        }

        account.selected_element = Some(element);
        account.rank = Some(element.name().to_string());
        account.last_extra_access_timestamp = 0;
        account.extra_accessed_element_id = None;
        let selected = account.clone();

        self.save(&accounts).await?;
        Ok(Some(ElementSelection::Selected(selected)))
    }

    /// Record a confirmed daily bonus grant
    ///
    /// Access is evaluated again against the stored row while the write lock
    /// is held. The grant is written only if `element` is still a bonus
    /// candidate; otherwise the fresh decision is returned and nothing
    /// changes.
    pub async fn record_bonus_grant(
        &self,
        id: &str,
        element: Element,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessDecision>> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        let decision = access::evaluate(&account.subject(), ElementRef::Element(element), now);
        if !matches!(decision, AccessDecision::ConfirmationRequired { .. }) {
            return Ok(Some(decision));
        }

        account.last_extra_access_timestamp = now.timestamp_millis();
        account.extra_accessed_element_id = Some(element);
        self.save(&accounts).await?;

        Ok(Some(AccessDecision::Granted {
            via: GrantReason::Bonus,
        }))
    }

    pub async fn touch_last_online(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Account>> {
        self.modify(id, move |a| a.last_online = now).await
    }

    /// Admin edit form
    pub async fn apply_patch(&self, id: &str, patch: AccountPatch) -> AppResult<Option<Account>> {
        let password_hash = match patch.password.as_deref() {
            Some("") => return Err(AppError::Validation("Password cannot be empty".to_string())),
            Some(plain) => Some(password::hash_password(plain)?),
            None => None,
        };

        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;

        if let Some(email) = patch.email.as_deref() {
            if email.is_empty() {
                return Err(AppError::Validation("Email cannot be empty".to_string()));
            }
            if self.unique_emails && accounts.iter().any(|a| a.id != id && a.email == email) {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(hash) = password_hash {
            account.password = hash;
        }
        if let Some(role) = patch.role {
            account.role = role;
        }
        if let Some(element) = patch.selected_element {
            account.selected_element = Some(element);
        }
        let updated = account.clone();

        self.save(&accounts).await?;
        Ok(Some(updated))
    }

    pub async fn stats(&self) -> AppResult<DirectoryStats> {
        let accounts = self.list().await?;

        let per_element = Element::ALL
            .into_iter()
            .map(|element| ElementCount {
                element,
                count: accounts
                    .iter()
                    .filter(|a| a.selected_element == Some(element))
                    .count(),
            })
            .collect();

        Ok(DirectoryStats {
            total_users: accounts.len(),
            admins: accounts.iter().filter(|a| a.is_admin()).count(),
            without_element: accounts
                .iter()
                .filter(|a| a.selected_element.is_none())
                .count(),
            per_element,
        })
    }

    async fn modify<F>(&self, id: &str, f: F) -> AppResult<Option<Account>>
    where
        F: FnOnce(&mut Account),
    {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.list().await?;

        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        f(account);
        let updated = account.clone();

        self.save(&accounts).await?;
        Ok(Some(updated))
    }

    async fn save(&self, accounts: &[Account]) -> AppResult<()> {
        self.store.set_json(keys::USERS, accounts).await
    }
}
