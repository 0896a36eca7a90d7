use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Required;
use crate::{
    entity::users::UserType,
    error::{AppError, AppResult},
};

const MIN_PASSWORD_LEN: usize = 8;
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "12345678", "123456789", "qwerty123", "qwertyuiop", "11111111",
    "iloveyou", "admin123", "letmein1",
];

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<UserType>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub company: String,
    pub position: String,
    pub user_type: UserType,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<NewAccount> {
        let mut required = Required::default();
        let first_name = required.text("first_name", self.first_name);
        let last_name = required.text("last_name", self.last_name);
        let email = required.text("email", self.email);
        let password = required.text("password", self.password);
        let company = required.text("company", self.company);
        let position = required.text("position", self.position);
        required.finish()?;

        validate_password(&password)?;
        let email = normalize_email(&email)?;

        Ok(NewAccount {
            first_name,
            last_name,
            email,
            password,
            company,
            position,
            user_type: self.user_type.unwrap_or(UserType::Buyer),
        })
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct ConfirmAccountRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(rename = "Token")]
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub user_type: UserType,
    pub exp: usize,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct PasswordResetConfirmRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateDetailsRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub password: Option<String>,
}

/// Django-style strength rules: a minimum length, not purely numeric, not a
/// well known password.
pub fn validate_password(password: &str) -> AppResult<()> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        problems.push("This password is too common.".to_string());
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::field("password", problems))
    }
}

/// Lower-cases the domain part and checks the overall `local@domain.tld`
/// shape.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    let invalid = || AppError::field("email", vec!["Enter a valid email address.".into()]);
    let (local, domain) = email.rsplit_once('@').ok_or_else(invalid)?;
    let domain_ok = domain
        .split('.')
        .all(|label| !label.is_empty() && !label.contains(char::is_whitespace))
        && domain.contains('.');
    if local.is_empty() || local.contains(char::is_whitespace) || local.contains('@') || !domain_ok
    {
        return Err(invalid());
    }
    Ok(format!("{local}@{}", domain.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Ivan".into()),
            last_name: Some("Petrov".into()),
            email: Some("Ivan@Example.COM".into()),
            password: Some("correct-horse-42".into()),
            company: Some("Acme".into()),
            position: Some("Buyer".into()),
            user_type: None,
        }
    }

    #[test]
    fn registration_defaults_to_buyer_and_normalizes_email() {
        let account = full_request().validate().unwrap();
        assert_eq!(account.user_type, UserType::Buyer);
        assert_eq!(account.email, "Ivan@example.com");
    }

    #[test]
    fn registration_lists_missing_fields() {
        let request = RegisterRequest {
            company: None,
            position: None,
            ..full_request()
        };
        match request.validate() {
            Err(AppError::MissingArguments(fields)) => {
                assert_eq!(fields, vec!["company", "position"])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn weak_passwords_are_rejected_per_field() {
        assert!(validate_password("1234").is_err());
        assert!(validate_password("987654321").is_err());
        assert!(validate_password("Password1").is_err());
        assert!(validate_password("tangerine-sky").is_ok());
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["plain", "@example.com", "a@b", "a b@example.com", "a@.com"] {
            assert!(normalize_email(email).is_err(), "{email} should be invalid");
        }
    }
}
