use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Category, Listing, Shop};

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopList {
    pub items: Vec<Shop>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingList {
    pub items: Vec<Listing>,
}
