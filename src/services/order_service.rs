use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

use crate::{
    audit,
    dto::orders::{OrderList, PlaceOrderRequest},
    entity::{
        Contacts, OrderItems, Orders, Users,
        contacts::Column as ContactCol,
        order_items::{self, Column as OrderItemCol},
        orders::{self, Column as OrderCol, OrderStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Contact, Order, OrderItem},
    notify::Notification,
    response::{ApiResponse, Empty, Meta},
    services::{
        account_service::contact_from_entity,
        catalog_service::{load_listings, unique_ids},
    },
    state::AppState,
};

/// Attach lines, listings, contact and totals to orders. Lines whose order is
/// not among `orders` are dropped, so callers control which lines show.
pub(crate) async fn assemble_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<orders::Model>,
    items: Vec<order_items::Model>,
) -> AppResult<Vec<Order>> {
    let listings = load_listings(conn, &unique_ids(items.iter().map(|i| i.product_info_id))).await?;

    let contact_ids = unique_ids(orders.iter().filter_map(|o| o.contact_id));
    let contacts: HashMap<i32, Contact> = if contact_ids.is_empty() {
        HashMap::new()
    } else {
        Contacts::find()
            .filter(ContactCol::Id.is_in(contact_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, contact_from_entity(c)))
            .collect()
    };

    let mut lines: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in items {
        let Some(listing) = listings.get(&item.product_info_id) else {
            continue;
        };
        lines.entry(item.order_id).or_default().push(OrderItem {
            id: item.id,
            total_amount: listing.price * i64::from(item.quantity),
            product_info: listing.clone(),
            quantity: item.quantity,
        });
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let ordered_items = lines.remove(&order.id).unwrap_or_default();
            let total_quantity = ordered_items.iter().map(|i| i64::from(i.quantity)).sum();
            let total_sum = ordered_items.iter().map(|i| i.total_amount).sum();
            Order {
                id: order.id,
                status: order.status,
                created_at: order.created_at.with_timezone(&Utc),
                contact: order.contact_id.and_then(|id| contacts.get(&id).cloned()),
                ordered_items,
                total_quantity,
                total_sum,
            }
        })
        .collect())
}

pub(crate) async fn items_of<C: ConnectionTrait>(
    conn: &C,
    order_ids: Vec<i32>,
) -> AppResult<Vec<order_items::Model>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?)
}

/// Placed orders of the caller, newest first.
pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .filter(OrderCol::Status.ne(OrderStatus::Basket))
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    let items = items_of(&state.orm, orders.iter().map(|o| o.id).collect()).await?;
    let items = assemble_orders(&state.orm, orders, items).await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Why a basket could not be placed.
async fn unplaceable(state: &AppState, user: &AuthUser, order_id: i32) -> AppResult<AppError> {
    let order = Orders::find_by_id(order_id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    Ok(match order {
        None => AppError::NotFound,
        Some(o) if o.status != OrderStatus::Basket => {
            AppError::Conflict("Order has already been placed".into())
        }
        Some(_) => AppError::BadRequest("Basket is empty".into()),
    })
}

/// Turn the caller's basket into a new order. The status change is a single
/// conditional update, so of two concurrent placements exactly one wins.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Empty>> {
    let (order_id, contact_id) = payload.validate()?;

    let contact = Contacts::find_by_id(contact_id)
        .filter(ContactCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if contact.is_none() {
        return Err(AppError::BadRequest("Unknown contact".into()));
    }

    let lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    if lines == 0 {
        return Err(unplaceable(state, user, order_id).await?);
    }

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::New))
        .col_expr(OrderCol::ContactId, Expr::value(Some(contact_id)))
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::UserId.eq(user.user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Basket))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(unplaceable(state, user, order_id).await?);
    }

    match Users::find_by_id(user.user_id).one(&state.orm).await? {
        Some(buyer) => state.notifier.notify(Notification::OrderPlaced {
            email: buyer.email,
            order_id,
        }),
        None => tracing::warn!(user_id = user.user_id, "order placed by unknown user"),
    }

    audit::record(
        state,
        Some(user.user_id),
        "order_placed",
        "orders",
        serde_json::json!({ "order_id": order_id, "contact_id": contact_id }),
    )
    .await;
    tracing::info!(user_id = user.user_id, order_id, "order placed");

    Ok(ApiResponse::ok("Order placed"))
}
