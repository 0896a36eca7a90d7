use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        ItemsRequest,
        auth::{
            ConfirmAccountRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
            PasswordResetRequest, RegisterRequest, UpdateDetailsRequest,
        },
        basket::{ItemsCreated, ItemsDeleted, ItemsUpdated},
        catalog::{CategoryList, ListingList, ShopList},
        contacts::{ContactList, ContactRequest, UpdateContactRequest},
        orders::{OrderList, PlaceOrderRequest},
        partner::{ImportSummary, PartnerStateRequest},
    },
    entity::{orders::OrderStatus, users::UserType},
    models::{Category, Contact, Listing, Order, OrderItem, Product, ProductParameter, Shop, User},
    response::{ApiResponse, Empty, Meta},
    routes::{basket, catalog, health, orders, params, partner, user},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        user::register,
        user::confirm,
        user::login,
        user::password_reset,
        user::password_reset_confirm,
        user::details,
        user::update_details,
        user::list_contacts,
        user::create_contact,
        user::update_contact,
        user::delete_contacts,
        basket::view_basket,
        basket::add_items,
        basket::update_items,
        basket::remove_items,
        orders::list_orders,
        orders::place_order,
        partner::import_catalog,
        partner::partner_state,
        partner::set_partner_state,
        partner::partner_orders,
        catalog::list_shops,
        catalog::list_categories,
        catalog::list_products
    ),
    components(
        schemas(
            User,
            UserType,
            Contact,
            Shop,
            Category,
            Product,
            ProductParameter,
            Listing,
            Order,
            OrderItem,
            OrderStatus,
            Empty,
            ItemsRequest,
            ItemsCreated,
            ItemsUpdated,
            ItemsDeleted,
            RegisterRequest,
            ConfirmAccountRequest,
            LoginRequest,
            LoginResponse,
            PasswordResetRequest,
            PasswordResetConfirmRequest,
            UpdateDetailsRequest,
            ContactRequest,
            UpdateContactRequest,
            ContactList,
            PlaceOrderRequest,
            OrderList,
            PartnerStateRequest,
            ImportSummary,
            ShopList,
            CategoryList,
            ListingList,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<ListingList>,
            ApiResponse<ImportSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "User", description = "Accounts, login and contacts"),
        (name = "Basket", description = "Basket endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Partner", description = "Shop-only endpoints"),
        (name = "Catalog", description = "Public catalog browsing"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
