//! Request and response bodies, and the checks that turn loosely shaped
//! request JSON into typed values.

pub mod auth;
pub mod basket;
pub mod catalog;
pub mod contacts;
pub mod loose;
pub mod orders;
pub mod partner;

use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// `{"items": ...}` bodies shared by the basket and contact endpoints. The
/// expected shape of `items` depends on the operation.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ItemsRequest {
    #[schema(value_type = Object)]
    pub items: Option<Value>,
}

/// Collects the names of absent required fields so they can be reported
/// together.
#[derive(Debug, Default)]
pub struct Required(Vec<&'static str>);

impl Required {
    /// A non-blank string, returned untrimmed.
    pub fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => {
                self.0.push(name);
                String::new()
            }
        }
    }

    pub fn value<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0.push(name);
        }
        value
    }

    pub fn finish(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingArguments(self.0))
        }
    }
}
