use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Response envelope: `{"Status": bool, "Message", "Data", "Meta", "Errors"}`.
/// Absent parts are omitted.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[serde(rename = "Status")]
    pub status: bool,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Data", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(rename = "Meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(rename = "Errors", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub errors: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
            meta,
            errors: None,
        }
    }

    /// A failed call that still reports what it managed to do before failing.
    pub fn partial(message: impl Into<String>, data: T, errors: serde_json::Value) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: Some(data),
            meta: None,
            errors: Some(errors),
        }
    }
}

/// Payload-free success body.
#[derive(Debug, Serialize, ToSchema)]
pub struct Empty {}

impl ApiResponse<Empty> {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
            meta: None,
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>, errors: serde_json::Value) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
            meta: None,
            errors: Some(errors),
        }
    }
}
