use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};

use crate::{
    dto::catalog::{CategoryList, ListingList, ShopList},
    entity::{
        Categories, Parameters, ProductInfos, ProductParameters, Products, Shops,
        categories::Column as CategoryCol,
        product_infos::{self, Column as InfoCol},
        product_parameters::Column as ProductParamCol,
        products::{self, Column as ProductCol},
        shops::{self, Column as ShopCol},
    },
    error::AppResult,
    models::{Category, Listing, Product, ProductParameter, Shop},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery},
    state::AppState,
};

pub(crate) fn unique_ids(ids: impl IntoIterator<Item = i32>) -> Vec<i32> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

pub(crate) fn shop_from_entity(shop: shops::Model) -> Shop {
    Shop {
        id: shop.id,
        name: shop.name,
        url: shop.url,
        state: shop.state,
    }
}

pub async fn list_shops(state: &AppState, pagination: Pagination) -> AppResult<ApiResponse<ShopList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Shops::find().order_by_asc(ShopCol::Name).order_by_asc(ShopCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(shop_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ShopList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .order_by_asc(CategoryCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| Category {
            id: c.id,
            name: c.name,
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        CategoryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Listings of shops that currently accept orders.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ListingList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = ProductInfos::find()
        .join(
            sea_orm::JoinType::InnerJoin,
            product_infos::Relation::Shops.def(),
        )
        .filter(ShopCol::State.eq(true));
    if let Some(shop_id) = query.shop_id {
        finder = finder.filter(InfoCol::ShopId.eq(shop_id));
    }
    if let Some(category_id) = query.category_id {
        finder = finder
            .join(
                sea_orm::JoinType::InnerJoin,
                product_infos::Relation::Products.def(),
            )
            .filter(ProductCol::CategoryId.eq(category_id));
    }
    let finder = finder
        .order_by_asc(InfoCol::ProductId)
        .order_by_asc(InfoCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let infos = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = build_listings(&state.orm, infos).await?;

    Ok(ApiResponse::success(
        "Ok",
        ListingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Listings by id, with product, category, shop and parameters resolved.
pub(crate) async fn load_listings<C: ConnectionTrait>(
    conn: &C,
    ids: &[i32],
) -> AppResult<HashMap<i32, Listing>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let infos = ProductInfos::find()
        .filter(InfoCol::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    Ok(build_listings(conn, infos)
        .await?
        .into_iter()
        .map(|listing| (listing.id, listing))
        .collect())
}

async fn build_listings<C: ConnectionTrait>(
    conn: &C,
    infos: Vec<product_infos::Model>,
) -> AppResult<Vec<Listing>> {
    if infos.is_empty() {
        return Ok(Vec::new());
    }

    let products: HashMap<i32, products::Model> = Products::find()
        .filter(ProductCol::Id.is_in(unique_ids(infos.iter().map(|i| i.product_id))))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let categories: HashMap<i32, String> = Categories::find()
        .filter(CategoryCol::Id.is_in(unique_ids(products.values().map(|p| p.category_id))))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let shops: HashMap<i32, String> = Shops::find()
        .filter(ShopCol::Id.is_in(unique_ids(infos.iter().map(|i| i.shop_id))))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let mut parameters: HashMap<i32, Vec<ProductParameter>> = HashMap::new();
    let rows = ProductParameters::find()
        .find_also_related(Parameters)
        .filter(ProductParamCol::ProductInfoId.is_in(infos.iter().map(|i| i.id)))
        .order_by_asc(ProductParamCol::Id)
        .all(conn)
        .await?;
    for (value, parameter) in rows {
        let Some(parameter) = parameter else { continue };
        parameters
            .entry(value.product_info_id)
            .or_default()
            .push(ProductParameter {
                parameter: parameter.name,
                value: value.value,
            });
    }

    Ok(infos
        .into_iter()
        .map(|info| {
            let product = match products.get(&info.product_id) {
                Some(p) => Product {
                    name: p.name.clone(),
                    category: categories.get(&p.category_id).cloned().unwrap_or_default(),
                },
                None => Product {
                    name: String::new(),
                    category: String::new(),
                },
            };
            Listing {
                id: info.id,
                external_id: info.external_id,
                model: info.model,
                product,
                shop: info.shop_id,
                shop_name: shops.get(&info.shop_id).cloned().unwrap_or_default(),
                quantity: info.quantity,
                price: info.price,
                price_rrc: info.price_rrc,
                product_parameters: parameters.remove(&info.id).unwrap_or_default(),
            }
        })
        .collect())
}
