#![allow(dead_code)]

use std::path::PathBuf;

use axum::{Router, routing::get};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use tokio::sync::mpsc::UnboundedReceiver;

use shop_orders_api::{
    db::{create_orm_conn, run_migrations},
    entity::{
        contacts::ActiveModel as ContactActive,
        users::{ActiveModel as UserActive, UserType},
    },
    middleware::auth::AuthUser,
    notify::{Notification, Notifier},
    routes::{create_api_router, health},
    services::{auth_service::hash_password, partner_service},
    state::{AppState, AuthSettings},
};

pub const JWT_SECRET: &str = "integration-secret";

pub struct TestApp {
    pub state: AppState,
    /// Everything services enqueued for mailing.
    pub mail: UnboundedReceiver<Notification>,
    db_file: Option<PathBuf>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(path) = self.db_file.take() {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }
}

impl TestApp {
    pub fn sent_mail(&mut self) -> Vec<Notification> {
        let mut sent = Vec::new();
        while let Ok(notification) = self.mail.try_recv() {
            sent.push(notification);
        }
        sent
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health::health_check))
            .nest("/api/v1", create_api_router())
            .with_state(self.state.clone())
    }
}

pub async fn setup() -> anyhow::Result<TestApp> {
    start("sqlite::memory:", None).await
}

/// File-backed database with a real connection pool, for tests where
/// requests must run on separate connections.
pub async fn setup_pooled() -> anyhow::Result<TestApp> {
    let path = std::env::temp_dir().join(format!("shop-orders-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    start(&url, Some(path)).await
}

async fn start(url: &str, db_file: Option<PathBuf>) -> anyhow::Result<TestApp> {
    let orm = create_orm_conn(url).await?;
    run_migrations(&orm).await?;
    let (notifier, mail) = Notifier::channel();
    let state = AppState {
        orm,
        notifier,
        auth: AuthSettings::new(JWT_SECRET, 24),
    };
    Ok(TestApp {
        state,
        mail,
        db_file,
    })
}

/// An already confirmed account.
pub async fn create_user(
    state: &AppState,
    email: &str,
    password: &str,
    user_type: UserType,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: NotSet,
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        first_name: Set("Test".into()),
        last_name: Set("User".into()),
        company: Set(Some("Acme".into())),
        position: Set(Some("QA".into())),
        user_type: Set(user_type),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        user_type,
    })
}

pub async fn buyer(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    create_user(state, email, "buyer-password", UserType::Buyer).await
}

pub async fn partner(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    create_user(state, email, "partner-password", UserType::Shop).await
}

pub async fn create_contact(state: &AppState, user: &AuthUser) -> anyhow::Result<i32> {
    let contact = ContactActive {
        id: NotSet,
        user_id: Set(user.user_id),
        city: Set("Moscow".into()),
        street: Set("Tverskaya".into()),
        house: Set("1".into()),
        apartment: Set("10".into()),
        e_mail: Set(String::new()),
        phone: Set("+70000000000".into()),
        work_phone: Set(String::new()),
    }
    .insert(&state.orm)
    .await?;
    Ok(contact.id)
}

/// A one-category feed; goods are `(external id, name, price)`.
pub fn feed(shop: &str, goods: &[(i64, &str, i64)]) -> String {
    let mut yaml = format!("shop: {shop}\ncategories:\n  - id: 1\n    name: Phones\ngoods:\n");
    if goods.is_empty() {
        yaml.push_str("  []\n");
    }
    for (id, name, price) in goods {
        yaml.push_str(&format!(
            "  - id: {id}\n    category: 1\n    model: m-{id}\n    name: {name}\n    price: {price}\n    price_rrc: {}\n    quantity: 10\n    parameters:\n      Color: black\n      \"Memory (GB)\": 128\n",
            price + 100
        ));
    }
    yaml
}

/// Import `goods` for `partner` and return the created listing ids, in feed
/// order.
pub async fn import(
    state: &AppState,
    partner: &AuthUser,
    shop: &str,
    goods: &[(i64, &str, i64)],
) -> anyhow::Result<Vec<i32>> {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
    use shop_orders_api::entity::{ProductInfos, product_infos::Column as InfoCol};

    let resp = partner_service::import_catalog(state, partner, &feed(shop, goods)).await?;
    let shop_id = resp.data.map(|s| s.shop_id).unwrap_or_default();
    let listings = ProductInfos::find()
        .filter(InfoCol::ShopId.eq(shop_id))
        .order_by_asc(InfoCol::Id)
        .all(&state.orm)
        .await?;
    Ok(goods
        .iter()
        .filter_map(|(id, _, _)| listings.iter().find(|l| l.external_id == *id).map(|l| l.id))
        .collect())
}
