/// Rank catalog endpoints
use crate::{
    auth::AdminAuthContext,
    element::Element,
    error::{AppError, AppResult},
    ranks::Rank,
    AppContext,
};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

/// Build rank routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/ranks", get(list_ranks))
        .route("/api/ranks/:id", put(update_rank))
}

async fn list_ranks(State(ctx): State<AppContext>, _auth: AdminAuthContext) -> Json<Vec<Rank>> {
    Json(ctx.ranks.list().await)
}

#[derive(Deserialize)]
struct RankDescription {
    description: String,
}

async fn update_rank(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path(id): Path<String>,
    Json(req): Json<RankDescription>,
) -> AppResult<Json<Rank>> {
    let id: Element = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("Rank not found: {}", id)))?;
    Ok(Json(ctx.ranks.update_description(id, &req.description).await?))
}
