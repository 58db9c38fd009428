/// Authentication extractors
use crate::{
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::AppError,
    session::{Identity, SessionRecord},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - resolves the bearer token to a live identity
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: SessionRecord,
    pub identity: Identity,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let (session, identity) = state.sessions.authenticate(&token).await?;

        Ok(AuthContext { session, identity })
    }
}

/// Optional authenticated context - does not fail if no auth provided
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub auth: Option<AuthContext>,
}

#[async_trait]
impl FromRequestParts<AppContext> for OptionalAuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = match extract_bearer_token(&parts.headers) {
            Some(token) => match state.sessions.authenticate(&token).await {
                Ok((session, identity)) => Some(AuthContext { session, identity }),
                Err(e) => {
                    tracing::debug!("ignoring unusable token: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(OptionalAuthContext { auth })
    }
}

/// Admin authentication context - requires the admin role
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub session: SessionRecord,
    pub identity: Identity,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let AuthContext { session, identity } =
            AuthContext::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            tracing::warn!("AdminAuthContext: {} is not an admin", identity.id);
            return Err(AppError::forbidden("Admin role required"));
        }

        Ok(AdminAuthContext { session, identity })
    }
}
