use axum::{extract::FromRequestParts, http::header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    dto::auth::Claims, entity::users::UserType, error::AppError, state::{AppState, AuthSettings},
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub user_type: UserType,
}

pub fn ensure_type(user: &AuthUser, user_type: UserType) -> Result<(), AppError> {
    if user.user_type != user_type {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

pub fn ensure_shop(user: &AuthUser) -> Result<(), AppError> {
    ensure_type(user, UserType::Shop)
}

pub fn issue_token(settings: &AuthSettings, user_id: i32, user_type: UserType) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        user_type,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationRequired)?;

    let user_id = decoded
        .claims
        .sub
        .parse::<i32>()
        .map_err(|_| AppError::AuthenticationRequired)?;

    Ok(AuthUser {
        user_id,
        user_type: decoded.claims.user_type,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::AuthenticationRequired)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AppError::AuthenticationRequired)?;

        verify_token(&state.auth, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings::new("test-secret", 24)
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let token = issue_token(&settings(), 7, UserType::Shop).unwrap();
        let user = verify_token(&settings(), &token).unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.user_type, UserType::Shop);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&AuthSettings::new("other", 24), 7, UserType::Buyer).unwrap();
        assert!(matches!(
            verify_token(&settings(), &token),
            Err(AppError::AuthenticationRequired)
        ));
    }

    #[test]
    fn buyers_are_not_partners() {
        let buyer = AuthUser {
            user_id: 1,
            user_type: UserType::Buyer,
        };
        assert!(matches!(ensure_shop(&buyer), Err(AppError::PermissionDenied)));
    }
}
