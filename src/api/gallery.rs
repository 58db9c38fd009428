/// Gallery endpoints for both tiers
///
/// Listing follows the route guard. Every mutation requires an admin.
use crate::{
    access::Route,
    api::{guard, middleware::Confirmation},
    auth::{AdminAuthContext, AuthContext},
    element::{Element, ElementRef, ForbiddenElement},
    error::AppResult,
    gallery::Image,
    AppContext,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

/// Build gallery routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/elements/:id/images",
            get(list_element_images).post(add_element_image),
        )
        .route(
            "/api/elements/:id/images/:image",
            put(update_element_image).delete(delete_element_image),
        )
        .route(
            "/api/forbidden/:id/images",
            get(list_forbidden_images).post(add_forbidden_image),
        )
        .route(
            "/api/forbidden/:id/images/:image",
            put(update_forbidden_image).delete(delete_forbidden_image),
        )
}

#[derive(Deserialize)]
struct UploadQuery {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct CaptionRequest {
    description: String,
}

fn element_target(id: &str) -> AppResult<(ElementRef, Route)> {
    let element: Element = id.parse()?;
    Ok((ElementRef::Element(element), Route::Element(element)))
}

fn forbidden_target(id: &str) -> AppResult<(ElementRef, Route)> {
    let element: ForbiddenElement = id.parse()?;
    Ok((
        ElementRef::Forbidden(element),
        Route::ForbiddenElement(element),
    ))
}

async fn list_images(
    ctx: &AppContext,
    auth: &AuthContext,
    (target, route): (ElementRef, Route),
) -> AppResult<Json<Vec<Image>>> {
    guard(route, &auth.identity)?;
    Ok(Json(ctx.gallery.list(target).await?))
}

async fn add_image(
    ctx: &AppContext,
    auth: &AdminAuthContext,
    target: ElementRef,
    query: UploadQuery,
    headers: &HeaderMap,
    body: &[u8],
) -> AppResult<(StatusCode, Json<Image>)> {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let image = ctx
        .gallery
        .add(target, &query.description, body, declared)
        .await?;
    tracing::debug!("{} uploaded image {}", auth.identity.id, image.id);
    Ok((StatusCode::CREATED, Json(image)))
}

async fn list_element_images(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Image>>> {
    list_images(&ctx, &auth, element_target(&id)?).await
}

async fn add_element_image(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Image>)> {
    let (target, _) = element_target(&id)?;
    add_image(&ctx, &auth, target, query, &headers, &body).await
}

async fn update_element_image(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path((id, image)): Path<(String, i64)>,
    Json(req): Json<CaptionRequest>,
) -> AppResult<Json<Image>> {
    let (target, _) = element_target(&id)?;
    Ok(Json(ctx.gallery.update(target, image, &req.description).await?))
}

async fn delete_element_image(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path((id, image)): Path<(String, i64)>,
    Query(confirmation): Query<Confirmation>,
) -> AppResult<Json<Image>> {
    let (target, _) = element_target(&id)?;
    confirmation.require("Image deletion")?;
    Ok(Json(ctx.gallery.delete(target, image).await?))
}

async fn list_forbidden_images(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Image>>> {
    list_images(&ctx, &auth, forbidden_target(&id)?).await
}

async fn add_forbidden_image(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Image>)> {
    let (target, _) = forbidden_target(&id)?;
    add_image(&ctx, &auth, target, query, &headers, &body).await
}

async fn update_forbidden_image(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path((id, image)): Path<(String, i64)>,
    Json(req): Json<CaptionRequest>,
) -> AppResult<Json<Image>> {
    let (target, _) = forbidden_target(&id)?;
    Ok(Json(ctx.gallery.update(target, image, &req.description).await?))
}

async fn delete_forbidden_image(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
    Path((id, image)): Path<(String, i64)>,
    Query(confirmation): Query<Confirmation>,
) -> AppResult<Json<Image>> {
    let (target, _) = forbidden_target(&id)?;
    confirmation.require("Image deletion")?;
    Ok(Json(ctx.gallery.delete(target, image).await?))
}
