use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        orders::OrderList,
        partner::{ImportSummary, PartnerStateRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Shop,
    response::{ApiResponse, Empty},
    services::partner_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/partner/update", post(import_catalog))
        .route("/partner/state", get(partner_state).post(set_partner_state))
        .route("/partner/orders", get(partner_orders))
}

#[utoipa::path(
    post,
    path = "/api/v1/partner/update",
    request_body(content = String, content_type = "application/x-yaml", description = "Price list feed, YAML or JSON"),
    responses(
        (status = 200, description = "Catalog replaced. Listings absent from the feed are deleted along with every order line referencing them, placed orders included", body = ApiResponse<ImportSummary>),
        (status = 400, description = "Malformed feed"),
        (status = 403, description = "Only for shops")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn import_catalog(
    State(state): State<AppState>,
    user: AuthUser,
    body: String,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    let resp = partner_service::import_catalog(&state, &user, &body).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/partner/state",
    responses(
        (status = 200, description = "The caller's shop", body = ApiResponse<Shop>),
        (status = 403, description = "Only for shops"),
        (status = 404, description = "No shop imported yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn partner_state(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = partner_service::partner_state(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/partner/state",
    request_body = PartnerStateRequest,
    responses(
        (status = 200, description = "State changed", body = ApiResponse<Empty>),
        (status = 400, description = "Missing or unreadable state"),
        (status = 403, description = "Only for shops")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn set_partner_state(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PartnerStateRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = partner_service::set_partner_state(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/partner/orders",
    responses(
        (status = 200, description = "Orders holding the shop's listings, other shops' lines omitted", body = ApiResponse<OrderList>),
        (status = 403, description = "Only for shops")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn partner_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = partner_service::partner_orders(&state, &user).await?;
    Ok(Json(resp))
}
