use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::loose::strict_int;

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsCreated {
    pub objects_created: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsUpdated {
    pub objects_updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsDeleted {
    pub objects_deleted: u64,
}

/// One `{product_info, quantity}` entry of an add-to-basket call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLine {
    pub product_info: i32,
    pub quantity: i32,
}

impl NewLine {
    pub fn parse(entry: &Value) -> Result<Self, String> {
        let product_info = entry
            .get("product_info")
            .and_then(strict_int)
            .ok_or_else(|| "product_info must be an integer".to_string())?;
        let quantity = entry
            .get("quantity")
            .and_then(strict_int)
            .filter(|q| *q > 0)
            .ok_or_else(|| "quantity must be a positive integer".to_string())?;
        Ok(Self {
            product_info,
            quantity,
        })
    }
}

/// One `{id, quantity}` entry of a basket update. Entries without integer
/// values, or with a quantity below one, yield `None` and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    pub id: i32,
    pub quantity: i32,
}

impl QuantityChange {
    pub fn parse(entry: &Value) -> Option<Self> {
        let id = entry.get("id").and_then(strict_int)?;
        let quantity = entry.get("quantity").and_then(strict_int).filter(|q| *q > 0)?;
        Some(Self { id, quantity })
    }
}
