/// Login, registration and logout endpoints
use crate::{
    auth::AuthContext,
    error::AppResult,
    session::{AuthOutcome, LoginRequest, RegisterRequest},
    AppContext,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;

/// Build session routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthOutcome>)> {
    let outcome = ctx.sessions.register(&req, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthOutcome>> {
    let outcome = ctx.sessions.login(&req, Utc::now()).await?;
    Ok(Json(outcome))
}

async fn logout(State(ctx): State<AppContext>, auth: AuthContext) -> AppResult<StatusCode> {
    ctx.sessions.logout(&auth.session).await?;
    Ok(StatusCode::NO_CONTENT)
}
