/// Admin panel endpoints for account management
use crate::{
    account::{AccountPatch, AccountView, DirectoryStats},
    api::middleware::Confirmation,
    auth::AdminAuthContext,
    error::{AppError, AppResult},
    AppContext,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build admin API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:id", put(edit_user).delete(delete_user))
        .route("/api/admin/users/:id/promote", post(promote_user))
        .route("/api/admin/users/:id/rank", put(assign_rank))
}

#[derive(Serialize)]
struct UsersResponse {
    users: Vec<AccountView>,
    stats: DirectoryStats,
}

fn account_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Account not found: {}", id))
}

async fn list_users(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
) -> AppResult<Json<UsersResponse>> {
    let users = ctx
        .directory
        .list()
        .await?
        .iter()
        .map(|a| a.view())
        .collect();
    let stats = ctx.directory.stats().await?;
    Ok(Json(UsersResponse { users, stats }))
}

async fn edit_user(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    Json(patch): Json<AccountPatch>,
) -> AppResult<Json<AccountView>> {
    let account = ctx
        .directory
        .apply_patch(&id, patch)
        .await?
        .ok_or_else(|| account_not_found(&id))?;
    tracing::info!("{} edited account {}", auth.identity.id, id);
    Ok(Json(account.view()))
}

async fn delete_user(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    Query(confirmation): Query<Confirmation>,
) -> AppResult<Json<serde_json::Value>> {
    confirmation.require("Account deletion")?;
    if !ctx.directory.delete(&id).await? {
        return Err(account_not_found(&id));
    }
    ctx.sessions.end_sessions_for(&id).await?;
    crate::metrics::set_accounts(ctx.directory.count().await?);
    tracing::info!("{} deleted account {}", auth.identity.id, id);
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn promote_user(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
) -> AppResult<Json<AccountView>> {
    let account = ctx
        .directory
        .promote_to_admin(&id)
        .await?
        .ok_or_else(|| account_not_found(&id))?;
    tracing::info!("{} promoted account {} to admin", auth.identity.id, id);
    Ok(Json(account.view()))
}

#[derive(Deserialize)]
struct RankRequest {
    rank: Option<String>,
}

async fn assign_rank(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path(id): Path<String>,
    Json(req): Json<RankRequest>,
) -> AppResult<Json<AccountView>> {
    let rank = req
        .rank
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let account = ctx
        .directory
        .assign_rank(&id, rank)
        .await?
        .ok_or_else(|| account_not_found(&id))?;
    Ok(Json(account.view()))
}
