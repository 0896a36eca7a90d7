use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::{
        ItemsRequest,
        basket::{ItemsCreated, ItemsDeleted, ItemsUpdated},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::basket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/basket",
        get(view_basket)
            .post(add_items)
            .put(update_items)
            .delete(remove_items),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/basket",
    responses(
        (status = 200, description = "The caller's basket with lines and totals", body = ApiResponse<Order>),
        (status = 403, description = "Log in required")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn view_basket(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = basket_service::view_basket(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/basket",
    request_body = ItemsRequest,
    responses(
        (status = 200, description = "All lines added", body = ApiResponse<ItemsCreated>),
        (status = 400, description = "Batch stopped; Data still holds objects_created", body = ApiResponse<ItemsCreated>)
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn add_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ItemsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemsCreated>>)> {
    let resp = basket_service::add_items(&state, &user, payload).await?;
    let status = if resp.status {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/v1/basket",
    request_body = ItemsRequest,
    responses(
        (status = 200, description = "Quantities changed", body = ApiResponse<ItemsUpdated>)
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn update_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ItemsRequest>,
) -> AppResult<Json<ApiResponse<ItemsUpdated>>> {
    let resp = basket_service::update_items(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/basket",
    request_body = ItemsRequest,
    responses(
        (status = 200, description = "Lines deleted", body = ApiResponse<ItemsDeleted>),
        (status = 400, description = "No numeric id given")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn remove_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ItemsRequest>,
) -> AppResult<Json<ApiResponse<ItemsDeleted>>> {
    let resp = basket_service::remove_items(&state, &user, payload).await?;
    Ok(Json(resp))
}
