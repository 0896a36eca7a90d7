use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

use crate::entity::{
    AuditLogs, Categories, ConfirmEmailTokens, Contacts, OrderItems, Orders, Parameters,
    PasswordResetTokens, ProductInfos, ProductParameters, Products, ShopCategories, Shops, Users,
};

/// Indexes that the entity derives cannot express. The partial index keeps a
/// single basket per user.
const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_orders_one_basket_per_user ON orders (user_id) WHERE status = 'basket'",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_order_items_order_listing ON order_items (order_id, product_info_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_product_infos_listing ON product_infos (product_id, shop_id, external_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_product_parameters_pair ON product_parameters (product_info_id, parameter_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_products_name_category ON products (name, category_id)",
    "CREATE INDEX IF NOT EXISTS ix_orders_user_status ON orders (user_id, status)",
];

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        // every pooled connection would otherwise see its own empty database
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Create every table (parents first) and the extra indexes. Safe to run on
/// an already migrated database.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    create_table(conn, Users).await?;
    create_table(conn, ConfirmEmailTokens).await?;
    create_table(conn, PasswordResetTokens).await?;
    create_table(conn, Contacts).await?;
    create_table(conn, Shops).await?;
    create_table(conn, Categories).await?;
    create_table(conn, ShopCategories).await?;
    create_table(conn, Products).await?;
    create_table(conn, ProductInfos).await?;
    create_table(conn, Parameters).await?;
    create_table(conn, ProductParameters).await?;
    create_table(conn, Orders).await?;
    create_table(conn, OrderItems).await?;
    create_table(conn, AuditLogs).await?;

    for index in INDEXES {
        conn.execute_unprepared(index).await?;
    }

    tracing::debug!(indexes = INDEXES.len(), "schema is up to date");
    Ok(())
}

async fn create_table<E: EntityTrait>(conn: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = conn.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();
    conn.execute(backend.build(&statement)).await?;
    Ok(())
}
