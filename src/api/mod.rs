/// API routes and handlers
pub mod admin;
pub mod elements;
pub mod gallery;
pub mod health;
pub mod home;
pub mod middleware;
pub mod ranks;
pub mod session;

use crate::{
    access::{Navigation, Route, RouteGuard},
    context::AppContext,
    error::{AppError, AppResult},
    session::Identity,
};
use axum::Router;
use chrono::Utc;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(session::routes())
        .merge(home::routes())
        .merge(elements::routes())
        .merge(gallery::routes())
        .merge(admin::routes())
        .merge(ranks::routes())
}

/// Run the route guard for an authenticated request and turn anything but
/// `Allow` into an error carrying the redirect
pub(crate) fn guard(route: Route, identity: &Identity) -> AppResult<()> {
    match RouteGuard::check(route, Some(&identity.subject()), Utc::now()) {
        Navigation::Allow => Ok(()),
        Navigation::Redirect { to, alert } => Err(AppError::Authorization {
            message: alert.unwrap_or_else(|| format!("{} is not available", route)),
            redirect: Some(to.to_string()),
        }),
        Navigation::NotFound { back } => Err(AppError::Authorization {
            message: format!("{} does not exist", route),
            redirect: Some(back.to_string()),
        }),
    }
}
