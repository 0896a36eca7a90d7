use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    Set, SqlErr, sea_query::Expr,
};

use crate::{
    audit,
    dto::{
        ItemsRequest,
        basket::{ItemsCreated, ItemsDeleted, ItemsUpdated, NewLine, QuantityChange},
        loose::{id_list, json_array},
    },
    entity::{
        OrderItems, Orders, ProductInfos,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{self, ActiveModel as OrderActive, Column as OrderCol, OrderStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    services::order_service::{assemble_orders, items_of},
    state::AppState,
};

async fn find_basket<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<Option<orders::Model>> {
    Ok(Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Basket))
        .one(conn)
        .await?)
}

/// The user's basket, created on first use. A concurrent creation loses on
/// the one-basket-per-user index and reads the winner's row instead.
pub(crate) async fn basket_for<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<orders::Model> {
    if let Some(basket) = find_basket(conn, user_id).await? {
        return Ok(basket);
    }

    let created = OrderActive {
        id: NotSet,
        user_id: Set(user_id),
        status: Set(OrderStatus::Basket),
        contact_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await;

    match created {
        Ok(basket) => Ok(basket),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            tracing::debug!(user_id, "basket created concurrently, re-reading");
            find_basket(conn, user_id).await?.ok_or(AppError::NotFound)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn view_basket(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Order>> {
    let basket = basket_for(&state.orm, user.user_id).await?;
    let items = items_of(&state.orm, vec![basket.id]).await?;
    let basket = assemble_orders(&state.orm, vec![basket], items)
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Ok", basket, Some(Meta::empty())))
}

async fn insert_line<C: ConnectionTrait>(conn: &C, basket_id: i32, line: NewLine) -> AppResult<()> {
    let listing = ProductInfos::find_by_id(line.product_info).one(conn).await?;
    if listing.is_none() {
        return Err(AppError::BadRequest(format!(
            "Product info {} does not exist",
            line.product_info
        )));
    }

    OrderItemActive {
        id: NotSet,
        order_id: Set(basket_id),
        product_info_id: Set(line.product_info),
        quantity: Set(line.quantity),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Adds lines one by one. The first bad entry stops the batch; lines added
/// before it stay and are reported in `objects_created`.
pub async fn add_items(
    state: &AppState,
    user: &AuthUser,
    payload: ItemsRequest,
) -> AppResult<ApiResponse<ItemsCreated>> {
    let raw = payload.items.ok_or(AppError::MissingArguments(vec!["items"]))?;
    let entries = json_array(&raw)?;
    let basket = basket_for(&state.orm, user.user_id).await?;

    let mut objects_created = 0u64;
    for entry in &entries {
        let outcome = match NewLine::parse(entry) {
            Ok(line) => insert_line(&state.orm, basket.id, line).await,
            Err(msg) => Err(AppError::BadRequest(msg)),
        };
        match outcome {
            Ok(()) => objects_created += 1,
            Err(AppError::BadRequest(msg) | AppError::Integrity(msg)) => {
                tracing::warn!(
                    user_id = user.user_id,
                    objects_created,
                    error = %msg,
                    "basket batch stopped"
                );
                return Ok(ApiResponse::partial(
                    "Basket partially updated",
                    ItemsCreated { objects_created },
                    serde_json::json!(msg),
                ));
            }
            Err(err) => return Err(err),
        }
    }

    audit::record(
        state,
        Some(user.user_id),
        "basket_add",
        "order_items",
        serde_json::json!({ "order_id": basket.id, "objects_created": objects_created }),
    )
    .await;

    Ok(ApiResponse::success(
        "Items added",
        ItemsCreated { objects_created },
        None,
    ))
}

/// Changes quantities of basket lines. Malformed entries are skipped.
pub async fn update_items(
    state: &AppState,
    user: &AuthUser,
    payload: ItemsRequest,
) -> AppResult<ApiResponse<ItemsUpdated>> {
    let raw = payload.items.ok_or(AppError::MissingArguments(vec!["items"]))?;
    let entries = json_array(&raw)?;
    let basket = basket_for(&state.orm, user.user_id).await?;

    let mut objects_updated = 0u64;
    for change in entries.iter().filter_map(QuantityChange::parse) {
        let result = OrderItems::update_many()
            .col_expr(OrderItemCol::Quantity, Expr::value(change.quantity))
            .filter(OrderItemCol::Id.eq(change.id))
            .filter(OrderItemCol::OrderId.eq(basket.id))
            .exec(&state.orm)
            .await?;
        objects_updated += result.rows_affected;
    }

    Ok(ApiResponse::success(
        "Items updated",
        ItemsUpdated { objects_updated },
        None,
    ))
}

/// Deletes the listed lines of the caller's basket; other ids match nothing.
pub async fn remove_items(
    state: &AppState,
    user: &AuthUser,
    payload: ItemsRequest,
) -> AppResult<ApiResponse<ItemsDeleted>> {
    let ids = payload.items.as_ref().map(id_list).unwrap_or_default();
    if ids.is_empty() {
        return Err(AppError::MissingArguments(vec!["items"]));
    }
    let basket = basket_for(&state.orm, user.user_id).await?;

    let result = OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(basket.id))
        .filter(OrderItemCol::Id.is_in(ids))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Items deleted",
        ItemsDeleted {
            objects_deleted: result.rows_affected,
        },
        None,
    ))
}
