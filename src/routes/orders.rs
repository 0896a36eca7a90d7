use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::{OrderList, PlaceOrderRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Empty},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/order", get(list_orders).post(place_order))
}

#[utoipa::path(
    get,
    path = "/api/v1/order",
    responses(
        (status = 200, description = "Placed orders, newest first", body = ApiResponse<OrderList>),
        (status = 403, description = "Log in required")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Basket placed as a new order", body = ApiResponse<Empty>),
        (status = 400, description = "Missing arguments, unknown contact, empty basket or integrity error"),
        (status = 404, description = "Unknown or foreign order"),
        (status = 409, description = "Order already placed")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}
