mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use shop_orders_api::{
    dto::ItemsRequest,
    entity::{
        OrderItems, Orders,
        orders::{Column as OrderCol, OrderStatus},
    },
    error::AppError,
    services::basket_service,
};

fn items(value: serde_json::Value) -> ItemsRequest {
    ItemsRequest { items: Some(value) }
}

#[tokio::test]
async fn add_view_and_totals() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let shop = common::partner(state, "shop@example.com").await?;
    let listings = common::import(state, &shop, "Store", &[(1, "Phone A", 1000), (2, "Phone B", 250)]).await?;
    let user = common::buyer(state, "buyer@example.com").await?;

    let resp = basket_service::add_items(
        state,
        &user,
        items(json!([
            { "product_info": listings[0], "quantity": 2 },
            { "product_info": listings[1], "quantity": 3 },
        ])),
    )
    .await?;
    assert!(resp.status);
    assert_eq!(resp.data.map(|d| d.objects_created), Some(2));

    let basket = basket_service::view_basket(state, &user).await?.data.expect("basket");
    assert_eq!(basket.status, OrderStatus::Basket);
    assert_eq!(basket.ordered_items.len(), 2);
    assert_eq!(basket.total_quantity, 5);
    assert_eq!(basket.total_sum, 2 * 1000 + 3 * 250);
    let line = &basket.ordered_items[0];
    assert_eq!(line.product_info.product.name, "Phone A");
    assert_eq!(line.product_info.product.category, "Phones");
    assert_eq!(line.product_info.shop_name, "Store");
    assert_eq!(line.product_info.product_parameters.len(), 2);
    assert_eq!(line.total_amount, 2000);
    Ok(())
}

#[tokio::test]
async fn items_may_arrive_as_a_json_string() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let shop = common::partner(state, "shop@example.com").await?;
    let listings = common::import(state, &shop, "Store", &[(1, "Phone A", 1000)]).await?;
    let user = common::buyer(state, "buyer@example.com").await?;

    let raw = format!(r#"[{{"product_info": {}, "quantity": 1}}]"#, listings[0]);
    let resp = basket_service::add_items(state, &user, items(json!(raw))).await?;
    assert_eq!(resp.data.map(|d| d.objects_created), Some(1));
    Ok(())
}

#[tokio::test]
async fn failing_item_stops_the_batch_but_keeps_earlier_lines() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let shop = common::partner(state, "shop@example.com").await?;
    let listings = common::import(state, &shop, "Store", &[(1, "Phone A", 1000), (2, "Phone B", 500)]).await?;
    let user = common::buyer(state, "buyer@example.com").await?;

    // second entry duplicates the first line, third is never reached
    let resp = basket_service::add_items(
        state,
        &user,
        items(json!([
            { "product_info": listings[0], "quantity": 1 },
            { "product_info": listings[0], "quantity": 4 },
            { "product_info": listings[1], "quantity": 1 },
        ])),
    )
    .await?;
    assert!(!resp.status);
    assert_eq!(resp.data.as_ref().map(|d| d.objects_created), Some(1));
    assert!(resp.errors.is_some());
    assert_eq!(OrderItems::find().count(&state.orm).await?, 1);

    let resp = basket_service::add_items(
        state,
        &user,
        items(json!([{ "product_info": 9999, "quantity": 1 }])),
    )
    .await?;
    assert!(!resp.status);
    assert_eq!(resp.data.map(|d| d.objects_created), Some(0));

    let resp = basket_service::add_items(
        state,
        &user,
        items(json!([{ "product_info": listings[1], "quantity": 0 }])),
    )
    .await?;
    assert!(!resp.status);
    Ok(())
}

#[tokio::test]
async fn malformed_items_payloads_are_rejected() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let user = common::buyer(state, "buyer@example.com").await?;

    let missing = basket_service::add_items(state, &user, ItemsRequest { items: None }).await;
    assert!(matches!(missing, Err(AppError::MissingArguments(_))));

    let garbage = basket_service::add_items(state, &user, items(json!("not json"))).await;
    assert!(matches!(garbage, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn update_skips_entries_without_integer_values() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let shop = common::partner(state, "shop@example.com").await?;
    let listings = common::import(state, &shop, "Store", &[(1, "Phone A", 1000), (2, "Phone B", 500)]).await?;
    let user = common::buyer(state, "buyer@example.com").await?;
    basket_service::add_items(
        state,
        &user,
        items(json!([
            { "product_info": listings[0], "quantity": 1 },
            { "product_info": listings[1], "quantity": 1 },
        ])),
    )
    .await?;
    let basket = basket_service::view_basket(state, &user).await?.data.expect("basket");
    let (first, second) = (basket.ordered_items[0].id, basket.ordered_items[1].id);

    let resp = basket_service::update_items(
        state,
        &user,
        items(json!([
            { "id": first, "quantity": 5 },
            { "id": second, "quantity": "7" },
            { "id": second, "quantity": 2.5 },
            { "id": "x", "quantity": 3 },
        ])),
    )
    .await?;
    assert_eq!(resp.data.map(|d| d.objects_updated), Some(1));

    let basket = basket_service::view_basket(state, &user).await?.data.expect("basket");
    assert_eq!(basket.ordered_items[0].quantity, 5);
    assert_eq!(basket.ordered_items[1].quantity, 1);
    Ok(())
}

#[tokio::test]
async fn remove_never_touches_another_users_basket() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let shop = common::partner(state, "shop@example.com").await?;
    let listings = common::import(state, &shop, "Store", &[(1, "Phone A", 1000)]).await?;
    let alice = common::buyer(state, "alice@example.com").await?;
    let bob = common::buyer(state, "bob@example.com").await?;

    for user in [&alice, &bob] {
        basket_service::add_items(
            state,
            user,
            items(json!([{ "product_info": listings[0], "quantity": 1 }])),
        )
        .await?;
    }
    let bobs = basket_service::view_basket(state, &bob).await?.data.expect("basket");
    let bobs_line = bobs.ordered_items[0].id;

    let resp = basket_service::remove_items(state, &alice, items(json!(bobs_line.to_string()))).await?;
    assert_eq!(resp.data.map(|d| d.objects_deleted), Some(0));
    assert_eq!(OrderItems::find().count(&state.orm).await?, 2);

    let alices = basket_service::view_basket(state, &alice).await?.data.expect("basket");
    let csv = format!("{},abc", alices.ordered_items[0].id);
    let resp = basket_service::remove_items(state, &alice, items(json!(csv))).await?;
    assert_eq!(resp.data.map(|d| d.objects_deleted), Some(1));

    let nothing_numeric = basket_service::remove_items(state, &alice, items(json!("a,b"))).await;
    assert!(matches!(nothing_numeric, Err(AppError::MissingArguments(_))));
    Ok(())
}

#[tokio::test]
async fn concurrent_first_use_yields_a_single_basket() -> anyhow::Result<()> {
    let app = common::setup_pooled().await?;
    let state = &app.state;
    let user = common::buyer(state, "buyer@example.com").await?;

    let (a, b) = tokio::join!(
        basket_service::view_basket(state, &user),
        basket_service::view_basket(state, &user),
    );
    let (a, b) = (a?.data.expect("basket"), b?.data.expect("basket"));
    assert_eq!(a.id, b.id);

    let baskets = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Basket))
        .count(&state.orm)
        .await?;
    assert_eq!(baskets, 1);
    Ok(())
}
