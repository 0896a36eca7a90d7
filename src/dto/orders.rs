use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{Required, loose::numeric_id};
use crate::{error::AppResult, models::Order};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[schema(value_type = Object)]
    pub id: Option<Value>,
    #[schema(value_type = Object)]
    pub contact: Option<Value>,
}

impl PlaceOrderRequest {
    /// Both ids must be numeric; anything else counts as missing.
    pub fn validate(&self) -> AppResult<(i32, i32)> {
        let mut required = Required::default();
        let order_id = required.value("id", self.id.as_ref().and_then(numeric_id));
        let contact_id = required.value("contact", self.contact.as_ref().and_then(numeric_id));
        required.finish()?;
        Ok((order_id.unwrap_or_default(), contact_id.unwrap_or_default()))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn digit_strings_are_accepted_as_ids() {
        let request = PlaceOrderRequest {
            id: Some(json!("12")),
            contact: Some(json!(3)),
        };
        assert_eq!(request.validate().unwrap(), (12, 3));
    }

    #[test]
    fn non_numeric_order_id_is_missing() {
        let request = PlaceOrderRequest {
            id: Some(json!("12a")),
            contact: None,
        };
        match request.validate() {
            Err(AppError::MissingArguments(fields)) => assert_eq!(fields, vec!["id", "contact"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
