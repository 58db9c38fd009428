/// Element access endpoints and the forbidden landing
use crate::{
    access::{self, AccessDecision, ElementAccessView, Route},
    auth::{AdminAuthContext, AuthContext},
    element::{Element, ElementRef, ForbiddenElement},
    error::AppResult,
    AppContext,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Build element routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/elements", get(list_elements))
        .route("/api/elements/:id/access", post(request_access))
        .route("/api/forbidden", get(forbidden_landing))
}

async fn list_elements(auth: AuthContext) -> Json<Vec<ElementAccessView>> {
    Json(access::summary(&auth.identity.subject(), Utc::now()))
}

#[derive(Debug, Default, Deserialize)]
struct AccessRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct AccessResponse {
    route: Route,
    #[serde(flatten)]
    decision: AccessDecision,
}

/// Ask to open an element gallery
///
/// A bonus candidate answers `confirmation_required` until the request is
/// repeated with `{"confirm": true}`, which spends the daily access.
async fn request_access(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    body: Option<Json<AccessRequest>>,
) -> AppResult<Json<AccessResponse>> {
    let element: Element = id.parse()?;
    let confirm = body.map(|Json(req)| req.confirm).unwrap_or_default();

    let decision = ctx
        .access
        .request(
            auth.identity.account_id(),
            &auth.identity.subject(),
            ElementRef::Element(element),
            confirm,
            Utc::now(),
        )
        .await?;

    Ok(Json(AccessResponse {
        route: Route::Element(element),
        decision,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForbiddenEntry {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    image_count: usize,
}

async fn forbidden_landing(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
) -> AppResult<Json<Vec<ForbiddenEntry>>> {
    let mut entries = Vec::with_capacity(ForbiddenElement::ALL.len());
    for element in ForbiddenElement::ALL {
        let images = ctx.gallery.list(ElementRef::Forbidden(element)).await?;
        entries.push(ForbiddenEntry {
            id: element.as_str(),
            name: element.name(),
            icon: element.icon(),
            description: element.description(),
            image_count: images.len(),
        });
    }
    Ok(Json(entries))
}
