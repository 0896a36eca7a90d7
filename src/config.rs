use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub mail: MailConfig,
    pub password_reset_ttl_hours: i64,
}

/// Outgoing mail settings. Without `SMTP_HOST` mail is only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub order_delay: Duration,
    pub max_attempts: u32,
    pub shutdown_grace: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = database_url()?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            mail: MailConfig::from_env(),
            password_reset_ttl_hours: parse_or("PASSWORD_RESET_TTL_HOURS", 24),
        })
    }
}

/// `DATABASE_URL` on its own, for tools that need nothing else.
pub fn database_url() -> anyhow::Result<String> {
    env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            smtp_port: parse_or("SMTP_PORT", 587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_address: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "shop-orders <noreply@localhost>".to_string()),
            order_delay: Duration::from_secs(parse_or("ORDER_NOTIFICATION_DELAY_SECS", 300)),
            max_attempts: parse_or("MAIL_MAX_ATTEMPTS", 3_u32).max(1),
            shutdown_grace: Duration::from_secs(parse_or("MAIL_SHUTDOWN_GRACE_SECS", 30)),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this crate that touches the process environment.
    #[test]
    fn database_url_does_not_need_the_jwt_secret() {
        unsafe {
            env::set_var("DATABASE_URL", "sqlite::memory:");
            env::remove_var("JWT_SECRET");
        }
        assert_eq!(database_url().unwrap(), "sqlite::memory:");
        assert!(AppConfig::from_env().is_err());
    }
}
