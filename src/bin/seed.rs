use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};

use shop_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Users,
        users::{ActiveModel as UserActive, Column as UserCol, UserType},
    },
    middleware::auth::AuthUser,
    notify::Notifier,
    services::{auth_service::hash_password, partner_service},
    state::{AppState, AuthSettings},
};

const FEED_PATH: &str = "data/shop1.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shop_orders_api=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    // Seeding sends no mail; the receiver is dropped right away.
    let (notifier, _) = Notifier::channel();
    let state = AppState {
        orm,
        notifier,
        auth: AuthSettings::new(config.jwt_secret.clone(), config.password_reset_ttl_hours),
    };

    let shop_id = ensure_user(&state, "shop@example.com", "shop-password", UserType::Shop).await?;
    let buyer_id =
        ensure_user(&state, "buyer@example.com", "buyer-password", UserType::Buyer).await?;

    let feed = std::fs::read_to_string(FEED_PATH)?;
    let partner = AuthUser {
        user_id: shop_id,
        user_type: UserType::Shop,
    };
    let summary = partner_service::import_catalog(&state, &partner, &feed)
        .await
        .map_err(|e| anyhow::anyhow!("catalog import failed: {e}"))?;

    if let Some(summary) = summary.data {
        tracing::info!(
            shop_user = shop_id,
            buyer = buyer_id,
            shop_id = summary.shop_id,
            listings = summary.listings,
            "seed completed"
        );
    }
    Ok(())
}

/// Active account with the given credentials, created if missing.
async fn ensure_user(
    state: &AppState,
    email: &str,
    password: &str,
    user_type: UserType,
) -> anyhow::Result<i32> {
    let existing = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?;
    if let Some(user) = existing {
        return Ok(user.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: NotSet,
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set("Demo".into()),
        last_name: Set(format!("{user_type:?}")),
        company: Set(Some("Demo Co".into())),
        position: Set(Some("Manager".into())),
        user_type: Set(user_type),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}
