use shop_orders_api::{
    config,
    db::{create_orm_conn, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let orm = create_orm_conn(&config::database_url()?).await?;
    run_migrations(&orm).await?;
    tracing::info!("migrations applied");
    Ok(())
}
