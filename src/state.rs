use sea_orm::DatabaseConnection;

use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub notifier: Notifier,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_reset_ttl_hours: i64,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>, password_reset_ttl_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 24,
            password_reset_ttl_hours,
        }
    }
}
