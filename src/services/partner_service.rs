use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, sea_query::Expr,
};

use crate::{
    audit,
    dto::{
        Required,
        loose::truthy,
        orders::OrderList,
        partner::{CatalogFeed, ImportSummary, PartnerStateRequest, parameter_text},
    },
    entity::{
        Categories, OrderItems, Orders, Parameters, ProductInfos, ProductParameters, Products,
        ShopCategories, Shops,
        categories::ActiveModel as CategoryActive,
        order_items::{self, Column as OrderItemCol},
        orders::{Column as OrderCol, OrderStatus},
        parameters::{ActiveModel as ParameterActive, Column as ParameterCol},
        product_infos::{ActiveModel as ProductInfoActive, Column as InfoCol},
        product_parameters::{ActiveModel as ProductParameterActive, Column as ProductParamCol},
        products::{ActiveModel as ProductActive, Column as ProductCol},
        shop_categories::ActiveModel as ShopCategoryActive,
        shops::{self, ActiveModel as ShopActive, Column as ShopCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_shop},
    models::Shop,
    response::{ApiResponse, Empty, Meta},
    services::{
        catalog_service::{shop_from_entity, unique_ids},
        order_service::assemble_orders,
    },
    state::AppState,
};

async fn shop_of(state: &AppState, user: &AuthUser) -> AppResult<Option<shops::Model>> {
    Ok(Shops::find()
        .filter(ShopCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?)
}

pub async fn partner_state(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Shop>> {
    ensure_shop(user)?;
    let shop = shop_of(state, user).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Ok",
        shop_from_entity(shop),
        Some(Meta::empty()),
    ))
}

/// Switch whether the caller's shop accepts orders.
pub async fn set_partner_state(
    state: &AppState,
    user: &AuthUser,
    payload: PartnerStateRequest,
) -> AppResult<ApiResponse<Empty>> {
    ensure_shop(user)?;
    let mut required = Required::default();
    let raw = required.value("state", payload.state);
    required.finish()?;
    let accepting = raw
        .as_ref()
        .and_then(truthy)
        .ok_or_else(|| AppError::BadRequest("Invalid state value".into()))?;

    let result = Shops::update_many()
        .col_expr(ShopCol::State, Expr::value(accepting))
        .filter(ShopCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = user.user_id, accepting, "partner state changed");
    Ok(ApiResponse::ok("State updated"))
}

/// Placed orders holding the caller's listings, restricted to those lines.
pub async fn partner_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    ensure_shop(user)?;
    let Some(shop) = shop_of(state, user).await? else {
        return Ok(ApiResponse::success(
            "Ok",
            OrderList { items: Vec::new() },
            Some(Meta::new(1, 0, 0)),
        ));
    };

    let items: Vec<order_items::Model> = OrderItems::find()
        .join(
            sea_orm::JoinType::InnerJoin,
            order_items::Relation::ProductInfos.def(),
        )
        .join(
            sea_orm::JoinType::InnerJoin,
            order_items::Relation::Orders.def(),
        )
        .filter(InfoCol::ShopId.eq(shop.id))
        .filter(OrderCol::Status.ne(OrderStatus::Basket))
        .order_by_asc(OrderItemCol::Id)
        .all(&state.orm)
        .await?;

    let order_ids = unique_ids(items.iter().map(|i| i.order_id));
    let orders = if order_ids.is_empty() {
        Vec::new()
    } else {
        Orders::find()
            .filter(OrderCol::Id.is_in(order_ids))
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::Id)
            .all(&state.orm)
            .await?
    };

    let items = assemble_orders(&state.orm, orders, items).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Replace the caller's catalog with the feed in one transaction.
///
/// Listings missing from the feed are deleted, and with them every order line
/// that references them, in baskets and in placed orders alike. Totals of
/// those placed orders shrink accordingly.
pub async fn import_catalog(
    state: &AppState,
    user: &AuthUser,
    raw: &str,
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_shop(user)?;
    let feed = CatalogFeed::parse(raw)?;

    let txn = state.orm.begin().await?;
    let summary = apply_feed(&txn, user.user_id, &feed).await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "catalog_import",
        "product_infos",
        serde_json::json!({
            "shop_id": summary.shop_id,
            "listings": summary.listings,
            "removed_listings": summary.removed_listings,
        }),
    )
    .await;
    tracing::info!(
        user_id = user.user_id,
        shop_id = summary.shop_id,
        listings = summary.listings,
        removed = summary.removed_listings,
        "catalog imported"
    );

    Ok(ApiResponse::success("Catalog imported", summary, None))
}

async fn apply_feed(
    txn: &DatabaseTransaction,
    user_id: i32,
    feed: &CatalogFeed,
) -> AppResult<ImportSummary> {
    let shop = match Shops::find()
        .filter(ShopCol::UserId.eq(user_id))
        .one(txn)
        .await?
    {
        Some(existing) => {
            let mut active: ShopActive = existing.into();
            active.name = Set(feed.shop.clone());
            if feed.url.is_some() {
                active.url = Set(feed.url.clone());
            }
            active.update(txn).await?
        }
        None => {
            ShopActive {
                id: NotSet,
                name: Set(feed.shop.clone()),
                url: Set(feed.url.clone()),
                user_id: Set(Some(user_id)),
                state: Set(true),
            }
            .insert(txn)
            .await?
        }
    };

    for category in &feed.categories {
        match Categories::find_by_id(category.id).one(txn).await? {
            Some(existing) if existing.name == category.name => {}
            Some(existing) => {
                let mut active: CategoryActive = existing.into();
                active.name = Set(category.name.clone());
                active.update(txn).await?;
            }
            None => {
                Categories::insert(CategoryActive {
                    id: Set(category.id),
                    name: Set(category.name.clone()),
                })
                .exec_without_returning(txn)
                .await?;
            }
        }

        let linked = ShopCategories::find_by_id((shop.id, category.id))
            .one(txn)
            .await?;
        if linked.is_none() {
            ShopCategories::insert(ShopCategoryActive {
                shop_id: Set(shop.id),
                category_id: Set(category.id),
            })
            .exec_without_returning(txn)
            .await?;
        }
    }

    let existing = ProductInfos::find()
        .filter(InfoCol::ShopId.eq(shop.id))
        .all(txn)
        .await?;

    let mut products: HashMap<(String, i32), i32> = HashMap::new();
    let mut parameters: HashMap<String, i32> = HashMap::new();
    let mut kept: HashSet<i32> = HashSet::new();

    for good in &feed.goods {
        let key = (good.name.clone(), good.category);
        let product_id = match products.get(&key) {
            Some(id) => *id,
            None => {
                let id = product_id_for(txn, &good.name, good.category).await?;
                products.insert(key, id);
                id
            }
        };

        let listing = match existing
            .iter()
            .find(|l| l.product_id == product_id && l.external_id == good.id)
        {
            Some(found) => {
                let mut active: ProductInfoActive = found.clone().into();
                active.model = Set(good.model.clone());
                active.quantity = Set(good.quantity);
                active.price = Set(good.price);
                active.price_rrc = Set(good.price_rrc);
                active.update(txn).await?
            }
            None => {
                ProductInfoActive {
                    id: NotSet,
                    product_id: Set(product_id),
                    shop_id: Set(shop.id),
                    external_id: Set(good.id),
                    model: Set(good.model.clone()),
                    quantity: Set(good.quantity),
                    price: Set(good.price),
                    price_rrc: Set(good.price_rrc),
                }
                .insert(txn)
                .await?
            }
        };
        kept.insert(listing.id);

        ProductParameters::delete_many()
            .filter(ProductParamCol::ProductInfoId.eq(listing.id))
            .exec(txn)
            .await?;
        for (name, value) in &good.parameters {
            let parameter_id = match parameters.get(name) {
                Some(id) => *id,
                None => {
                    let id = parameter_id_for(txn, name).await?;
                    parameters.insert(name.clone(), id);
                    id
                }
            };
            ProductParameters::insert(ProductParameterActive {
                id: NotSet,
                product_info_id: Set(listing.id),
                parameter_id: Set(parameter_id),
                value: Set(parameter_text(value)),
            })
            .exec(txn)
            .await?;
        }
    }

    let stale: Vec<i32> = existing
        .iter()
        .map(|l| l.id)
        .filter(|id| !kept.contains(id))
        .collect();
    let removed_listings = if stale.is_empty() {
        0
    } else {
        ProductInfos::delete_many()
            .filter(InfoCol::Id.is_in(stale))
            .exec(txn)
            .await?
            .rows_affected
    };

    Ok(ImportSummary {
        shop_id: shop.id,
        categories: feed.categories.len() as u64,
        products: products.len() as u64,
        listings: kept.len() as u64,
        removed_listings,
    })
}

async fn product_id_for(txn: &DatabaseTransaction, name: &str, category_id: i32) -> AppResult<i32> {
    let found = Products::find()
        .select_only()
        .column(ProductCol::Id)
        .filter(ProductCol::Name.eq(name))
        .filter(ProductCol::CategoryId.eq(category_id))
        .into_tuple::<i32>()
        .one(txn)
        .await?;
    if let Some(id) = found {
        return Ok(id);
    }
    let product = ProductActive {
        id: NotSet,
        name: Set(name.to_string()),
        category_id: Set(category_id),
    }
    .insert(txn)
    .await?;
    Ok(product.id)
}

async fn parameter_id_for(txn: &DatabaseTransaction, name: &str) -> AppResult<i32> {
    let found = Parameters::find()
        .select_only()
        .column(ParameterCol::Id)
        .filter(ParameterCol::Name.eq(name))
        .into_tuple::<i32>()
        .one(txn)
        .await?;
    if let Some(id) = found {
        return Ok(id);
    }
    let parameter = ParameterActive {
        id: NotSet,
        name: Set(name.to_string()),
    }
    .insert(txn)
    .await?;
    Ok(parameter.id)
}

