use axum::Router;

use crate::state::AppState;

pub mod basket;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod partner;
pub mod user;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(user::router())
        .merge(basket::router())
        .merge(orders::router())
        .merge(partner::router())
        .merge(catalog::router())
}
