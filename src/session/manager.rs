/// Session manager: login, registration, logout and token resolution
use crate::{
    access::Route,
    account::{Account, AccountDirectory, ElementSelection},
    config::AuthConfig,
    element::Element,
    error::{AppError, AppResult},
    session::{Claims, Identity, LoginRequest, Principal, RegisterRequest, SessionRecord},
    store::{keys, Store},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const LOGIN_FAILED: &str = "Login info is wrong";

/// Returned by login and registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub token: String,
    pub identity: Identity,
    /// Where the client goes next
    pub next: Route,
    #[serde(skip)]
    pub session: SessionRecord,
}

/// Session manager service
pub struct SessionManager {
    store: Store,
    directory: Arc<AccountDirectory>,
    auth: AuthConfig,
    unique_emails: bool,
}

impl SessionManager {
    pub fn new(
        store: Store,
        directory: Arc<AccountDirectory>,
        auth: AuthConfig,
        unique_emails: bool,
    ) -> Self {
        Self {
            store,
            directory,
            auth,
            unique_emails,
        }
    }

    /// Check the superuser, then the directory
    ///
    /// Failure never says whether the email exists.
    pub async fn login(&self, request: &LoginRequest, now: DateTime<Utc>) -> AppResult<AuthOutcome> {
        if request.email == self.auth.superuser_email
            && request.password == self.auth.superuser_password
        {
            let session = self.create_session(Principal::Superuser, now).await?;
            let identity = Identity::superuser(&self.auth.superuser_email, &session);
            crate::metrics::record_login("superuser");
            tracing::info!("superuser logged in, session {}", session.id);
            return self.outcome(session, identity, Route::Home);
        }

        let Some(account) = self
            .directory
            .find_by_credentials(&request.email, &request.password)
            .await?
        else {
            crate::metrics::record_login("failure");
            tracing::debug!("login rejected for {}", request.email);
            return Err(AppError::Authentication(LOGIN_FAILED.to_string()));
        };

        let account = self
            .directory
            .touch_last_online(&account.id, now)
            .await?
            .unwrap_or(account);
        let session = self
            .create_session(Principal::Account(account.id.clone()), now)
            .await?;
        crate::metrics::record_login("success");
        tracing::info!("account {} logged in, session {}", account.id, session.id);

        let next = next_route(&account);
        self.outcome(session, Identity::from_account(&account), next)
    }

    /// Create an account and log it in
    pub async fn register(
        &self,
        request: &RegisterRequest,
        now: DateTime<Utc>,
    ) -> AppResult<AuthOutcome> {
        if request.password != request.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.unique_emails && request.email == self.auth.superuser_email {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let account = Account::new(&request.email, &request.password, now)?;
        self.directory.insert(account.clone()).await?;
        crate::metrics::record_registration();
        crate::metrics::set_accounts(self.directory.count().await?);
        tracing::info!("registered account {}", account.id);

        let session = self
            .create_session(Principal::Account(account.id.clone()), now)
            .await?;
        self.outcome(session, Identity::from_account(&account), Route::ElementSelection)
    }

    /// Remove the session; the account is untouched
    pub async fn logout(&self, session: &SessionRecord) -> AppResult<()> {
        self.end_session(&session.id).await?;
        tracing::info!("session {} logged out", session.id);
        Ok(())
    }

    /// Verify a bearer token and load its live identity
    pub async fn authenticate(&self, token: &str) -> AppResult<(SessionRecord, Identity)> {
        self.authenticate_at(token, Utc::now()).await
    }

    /// Verify a bearer token at `now`
    ///
    /// A session that has expired, or whose account no longer exists, is
    /// removed before the request is rejected.
    pub async fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(SessionRecord, Identity)> {
        let claims = self.verify_token(token)?;
        let session = self
            .load_session(&keys::session(&claims.sub))
            .await?
            .ok_or_else(|| AppError::Authentication("Session has ended".to_string()))?;

        if session.is_expired(now) || claims.exp <= now.timestamp() {
            self.end_session(&session.id).await?;
            tracing::debug!("session {} expired", session.id);
            return Err(AppError::Authentication("Token has expired".to_string()));
        }

        match self.resolve(&session).await {
            Ok(identity) => Ok((session, identity)),
            Err(err @ AppError::Authentication(_)) => {
                self.end_session(&session.id).await?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Live identity of a session
    pub async fn resolve(&self, session: &SessionRecord) -> AppResult<Identity> {
        match &session.principal {
            Principal::Superuser => Ok(Identity::superuser(&self.auth.superuser_email, session)),
            Principal::Account(id) => self
                .directory
                .get(id)
                .await?
                .map(|account| Identity::from_account(&account))
                .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string())),
        }
    }

    /// Heartbeat from the home view
    ///
    /// Accounts get `lastOnline` bumped in the directory. The superuser has
    /// no row, so the session's `lastSeen` carries it instead.
    pub async fn refresh_last_online(
        &self,
        session: &SessionRecord,
        now: DateTime<Utc>,
    ) -> AppResult<Identity> {
        match &session.principal {
            Principal::Superuser => {
                let mut refreshed = session.clone();
                refreshed.last_seen = now;
                self.save_session(&refreshed).await?;
                Ok(Identity::superuser(&self.auth.superuser_email, &refreshed))
            }
            Principal::Account(id) => self
                .directory
                .touch_last_online(id, now)
                .await?
                .map(|account| Identity::from_account(&account))
                .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string())),
        }
    }

    /// One-time element choice for the logged-in account
    ///
    /// Admins have no primary element; for them and for repeated calls
    /// nothing changes and the client is routed home.
    pub async fn select_element(
        &self,
        identity: &Identity,
        element: Element,
    ) -> AppResult<(Identity, Route)> {
        let Some(id) = identity.account_id().filter(|_| !identity.is_admin()) else {
            return Ok((identity.clone(), Route::Home));
        };

        let selection = self
            .directory
            .select_element(id, element)
            .await?
            .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))?;

        if let ElementSelection::Selected(account) = &selection {
            tracing::info!("account {} selected {}", account.id, element);
        }
        Ok((Identity::from_account(selection.account()), Route::Home))
    }

    /// Live sessions, sweeping dead rows on the way
    pub async fn active_sessions(&self) -> AppResult<usize> {
        self.sweep_sessions(Utc::now()).await
    }

    /// Remove sessions that expired before `now` or whose account is gone
    ///
    /// Returns the number of sessions left.
    pub async fn sweep_sessions(&self, now: DateTime<Utc>) -> AppResult<usize> {
        // Keys before accounts: a session is only written after its account
        let session_keys = self.store.keys_with_prefix(keys::SESSION_PREFIX).await?;
        let accounts: HashSet<String> = self
            .directory
            .list()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let mut live = 0;
        for key in session_keys {
            let Some(session) = self.load_session(&key).await? else {
                continue;
            };
            let orphaned = matches!(
                &session.principal,
                Principal::Account(id) if !accounts.contains(id)
            );
            if session.is_expired(now) || orphaned {
                self.store.remove(&key).await?;
                tracing::debug!("swept session {}", session.id);
            } else {
                live += 1;
            }
        }
        Ok(live)
    }

    /// End every session of one account; returns how many were removed
    pub async fn end_sessions_for(&self, account_id: &str) -> AppResult<usize> {
        let mut ended = 0;
        for key in self.store.keys_with_prefix(keys::SESSION_PREFIX).await? {
            let Some(session) = self.load_session(&key).await? else {
                continue;
            };
            if matches!(&session.principal, Principal::Account(id) if id == account_id) {
                self.store.remove(&key).await?;
                ended += 1;
            }
        }
        crate::metrics::set_active_sessions(self.active_sessions().await?);
        tracing::info!("ended {} sessions of account {}", ended, account_id);
        Ok(ended)
    }

    async fn create_session(
        &self,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> AppResult<SessionRecord> {
        let session = SessionRecord {
            id: Uuid::new_v4().to_string(),
            principal,
            created_at: now,
            last_seen: now,
            expires_at: now + Duration::hours(self.auth.session_ttl_hours),
        };
        self.save_session(&session).await?;
        crate::metrics::set_active_sessions(self.sweep_sessions(now).await?);
        Ok(session)
    }

    async fn end_session(&self, id: &str) -> AppResult<()> {
        self.store.remove(&keys::session(id)).await?;
        crate::metrics::set_active_sessions(self.active_sessions().await?);
        Ok(())
    }

    /// Unreadable rows are dropped and read as absent
    async fn load_session(&self, key: &str) -> AppResult<Option<SessionRecord>> {
        match self.store.get_json::<SessionRecord>(key).await {
            Err(AppError::Serialization(e)) => {
                tracing::warn!("dropping unreadable session {}: {}", key, e);
                self.store.remove(key).await?;
                Ok(None)
            }
            other => other,
        }
    }

    async fn save_session(&self, session: &SessionRecord) -> AppResult<()> {
        self.store.set_json(&keys::session(&session.id), session).await
    }

    fn outcome(
        &self,
        session: SessionRecord,
        identity: Identity,
        next: Route,
    ) -> AppResult<AuthOutcome> {
        let token = self.issue_token(&session)?;
        Ok(AuthOutcome {
            token,
            identity,
            next,
            session,
        })
    }

    fn issue_token(&self, session: &SessionRecord) -> AppResult<String> {
        let claims = Claims {
            sub: session.id.clone(),
            iat: session.created_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.auth.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(format!("Failed to generate token: {}", e)))
    }

    /// Signature check only; expiry is judged against the session row so
    /// that an expired row can be found and removed
    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let decoding_key = DecodingKey::from_secret(self.auth.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("token verification failed: {}", e);
                AppError::Authentication("Invalid token".to_string())
            })
    }
}

fn next_route(account: &Account) -> Route {
    if account.selected_element.is_none() && !account.is_admin() {
        Route::ElementSelection
    } else {
        Route::Home
    }
}
