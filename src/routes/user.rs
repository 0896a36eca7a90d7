use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{
        ItemsRequest,
        auth::{
            ConfirmAccountRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
            PasswordResetRequest, RegisterRequest, UpdateDetailsRequest,
        },
        basket::ItemsDeleted,
        contacts::{ContactList, ContactRequest, UpdateContactRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Contact, User},
    response::{ApiResponse, Empty},
    services::{account_service, auth_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/register/confirm", post(confirm))
        .route("/user/login", post(login))
        .route("/user/password_reset", post(password_reset))
        .route("/user/password_reset/confirm", post(password_reset_confirm))
        .route("/user/details", get(details).post(update_details))
        .route(
            "/user/contact",
            get(list_contacts)
                .post(create_contact)
                .put(update_contact)
                .delete(delete_contacts),
        )
}

#[utoipa::path(
    post,
    path = "/api/v1/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, confirmation token mailed", body = ApiResponse<Empty>),
        (status = 400, description = "Missing arguments")
    ),
    tag = "User"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/register/confirm",
    request_body = ConfirmAccountRequest,
    responses(
        (status = 200, description = "Account activated, or Status=false on a bad token", body = ApiResponse<Empty>),
        (status = 400, description = "Missing arguments")
    ),
    tag = "User"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmAccountRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = auth_service::confirm_account(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = ApiResponse<LoginResponse>),
        (status = 403, description = "Could not authorize")
    ),
    tag = "User"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/password_reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset token mailed when the account exists", body = ApiResponse<Empty>)
    ),
    tag = "User"
)]
pub async fn password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = auth_service::request_password_reset(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/password_reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed, or Status=false", body = ApiResponse<Empty>)
    ),
    tag = "User"
)]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let resp = auth_service::confirm_password_reset(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/details",
    responses(
        (status = 200, description = "Profile with contacts", body = ApiResponse<User>),
        (status = 403, description = "Log in required")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn details(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = account_service::get_details(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/details",
    request_body = UpdateDetailsRequest,
    responses(
        (status = 201, description = "Profile updated", body = ApiResponse<Empty>),
        (status = 200, description = "Validation failed, Status=false"),
        (status = 403, description = "Log in required")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_details(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateDetailsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Empty>>)> {
    let resp = account_service::update_details(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/contact",
    responses(
        (status = 200, description = "Contacts of the caller", body = ApiResponse<ContactList>)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = account_service::list_contacts(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Contact created", body = ApiResponse<Contact>),
        (status = 400, description = "Missing arguments")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = account_service::create_contact(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/contact",
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ApiResponse<Contact>),
        (status = 404, description = "Unknown or foreign contact")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = account_service::update_contact(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user/contact",
    request_body = ItemsRequest,
    responses(
        (status = 200, description = "Contacts deleted", body = ApiResponse<ItemsDeleted>),
        (status = 400, description = "No numeric id given")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ItemsRequest>,
) -> AppResult<Json<ApiResponse<ItemsDeleted>>> {
    let resp = account_service::delete_contacts(&state, &user, payload).await?;
    Ok(Json(resp))
}
