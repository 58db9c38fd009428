/// Home view, element selection and navigation checks
use crate::{
    access::{self, ElementAccessView, Navigation, Route, RouteGuard},
    auth::{AuthContext, OptionalAuthContext},
    element::Element,
    error::AppResult,
    session::Identity,
    AppContext,
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Build home routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/element-selection", post(select_element))
        .route("/api/navigate", get(navigate))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HomeResponse {
    identity: Identity,
    elements: Vec<ElementAccessView>,
    /// Only present for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    forbidden_landing: Option<Route>,
}

/// Heartbeat plus everything the home view renders
async fn home(State(ctx): State<AppContext>, auth: AuthContext) -> AppResult<Json<HomeResponse>> {
    let now = Utc::now();
    let identity = ctx.sessions.refresh_last_online(&auth.session, now).await?;
    let elements = access::summary(&identity.subject(), now);
    let forbidden_landing = identity.is_admin().then_some(Route::ForbiddenLanding);

    Ok(Json(HomeResponse {
        identity,
        elements,
        forbidden_landing,
    }))
}

#[derive(Deserialize)]
struct SelectElementRequest {
    element: Element,
}

#[derive(Serialize)]
struct SelectElementResponse {
    identity: Identity,
    next: Route,
}

async fn select_element(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<SelectElementRequest>,
) -> AppResult<Json<SelectElementResponse>> {
    let (identity, next) = ctx
        .sessions
        .select_element(&auth.identity, req.element)
        .await?;
    Ok(Json(SelectElementResponse { identity, next }))
}

#[derive(Deserialize)]
struct NavigateQuery {
    route: String,
}

/// Guard decision for a logical route
async fn navigate(
    auth: OptionalAuthContext,
    Query(query): Query<NavigateQuery>,
) -> Json<Navigation> {
    let subject = auth.auth.map(|a| a.identity.subject());
    Json(RouteGuard::navigate(&query.route, subject.as_ref(), Utc::now()))
}
