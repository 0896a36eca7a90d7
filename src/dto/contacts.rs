use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{Required, loose::numeric_id};
use crate::{
    error::{AppError, AppResult},
    models::Contact,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub apartment: Option<String>,
    pub e_mail: Option<String>,
    pub phone: Option<String>,
    pub work_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub city: String,
    pub street: String,
    pub house: String,
    pub apartment: String,
    pub e_mail: String,
    pub phone: String,
    pub work_phone: String,
}

impl ContactRequest {
    pub fn validate(self) -> AppResult<NewContact> {
        let mut required = Required::default();
        let city = required.text("city", self.city);
        let phone = required.text("phone", self.phone);
        required.finish()?;
        Ok(NewContact {
            city,
            street: self.street.unwrap_or_default(),
            house: self.house.unwrap_or_default(),
            apartment: self.apartment.unwrap_or_default(),
            e_mail: self.e_mail.unwrap_or_default(),
            phone,
            work_phone: self.work_phone.unwrap_or_default(),
        })
    }

    /// Required fields may be left out of an edit but not blanked.
    pub fn validate_edit(&self) -> AppResult<()> {
        let blank: Vec<&'static str> = [("city", &self.city), ("phone", &self.phone)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_some_and(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect();
        if blank.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingArguments(blank))
        }
    }
}

/// Edit of an existing contact; only the given fields change.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateContactRequest {
    #[schema(value_type = Object)]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub fields: ContactRequest,
}

impl UpdateContactRequest {
    pub fn contact_id(&self) -> AppResult<i32> {
        let mut required = Required::default();
        let id = required.value("id", self.id.as_ref().and_then(numeric_id));
        required.finish()?;
        Ok(id.unwrap_or_default())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactList {
    pub items: Vec<Contact>,
}
