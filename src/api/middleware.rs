/// Request helpers shared by the handlers
use axum::http::HeaderMap;
use serde::Deserialize;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// `?confirm=true` on destructive operations
#[derive(Debug, Default, Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    pub confirm: bool,
}

impl Confirmation {
    pub fn require(&self, action: &str) -> crate::error::AppResult<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(crate::error::AppError::ConfirmationRequired(format!(
                "{} must be confirmed with confirm=true",
                action
            )))
        }
    }
}
