use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::catalog::{CategoryList, ListingList, ShopList},
    error::AppResult,
    response::ApiResponse,
    routes::params::{Pagination, ProductQuery},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shops", get(list_shops))
        .route("/categories", get(list_categories))
        .route("/products", get(list_products))
}

#[utoipa::path(
    get,
    path = "/api/v1/shops",
    params(Pagination),
    responses(
        (status = 200, description = "Shops", body = ApiResponse<ShopList>)
    ),
    tag = "Catalog"
)]
pub async fn list_shops(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ShopList>>> {
    let resp = catalog_service::list_shops(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(Pagination),
    responses(
        (status = 200, description = "Categories by name", body = ApiResponse<CategoryList>)
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = catalog_service::list_categories(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Listings of shops accepting orders", body = ApiResponse<ListingList>)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = catalog_service::list_products(&state, query).await?;
    Ok(Json(resp))
}
