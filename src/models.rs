use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{orders::OrderStatus, users::UserType};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub is_active: bool,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    pub id: i32,
    pub city: String,
    pub street: String,
    pub house: String,
    pub apartment: String,
    pub e_mail: String,
    pub phone: String,
    pub work_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Shop {
    pub id: i32,
    pub name: String,
    pub url: Option<String>,
    pub state: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductParameter {
    pub parameter: String,
    pub value: String,
}

/// A shop's offer of a product, as shown in the catalog and inside orders.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: i32,
    pub external_id: i64,
    pub model: String,
    pub product: Product,
    pub shop: i32,
    pub shop_name: String,
    pub quantity: i32,
    pub price: i64,
    pub price_rrc: i64,
    pub product_parameters: Vec<ProductParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub product_info: Listing,
    pub quantity: i32,
    /// `quantity × price`, computed when read.
    pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub contact: Option<Contact>,
    pub ordered_items: Vec<OrderItem>,
    pub total_quantity: i64,
    pub total_sum: i64,
}
