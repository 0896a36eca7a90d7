use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Required,
        auth::{
            ConfirmAccountRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
            PasswordResetRequest, RegisterRequest, normalize_email, validate_password,
        },
    },
    entity::{
        confirm_email_tokens::{
            ActiveModel as ConfirmTokenActive, Column as ConfirmTokenCol,
            Entity as ConfirmEmailTokens,
        },
        password_reset_tokens::{
            ActiveModel as ResetTokenActive, Column as ResetTokenCol, Entity as PasswordResetTokens,
        },
        users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::issue_token,
    notify::Notification,
    response::{ApiResponse, Empty, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn password_matches(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn new_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Create an inactive account and mail it a confirmation token.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Empty>> {
    let account = payload.validate()?;

    let exist = Users::find()
        .select_only()
        .column(UserCol::Id)
        .filter(UserCol::Email.eq(account.email.as_str()))
        .into_tuple::<i32>()
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::field(
            "email",
            vec!["User with this email already exists.".into()],
        ));
    }

    let password_hash = hash_password(&account.password)?;
    let user = UserActive {
        id: NotSet,
        email: Set(account.email),
        password_hash: Set(password_hash),
        first_name: Set(account.first_name),
        last_name: Set(account.last_name),
        company: Set(Some(account.company)),
        position: Set(Some(account.position)),
        user_type: Set(account.user_type),
        is_active: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let token = confirmation_token_for(state, user.id).await?;
    state.notifier.notify(Notification::ConfirmEmail {
        email: user.email.clone(),
        token,
    });

    audit::record(
        state,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "type": user.user_type }),
    )
    .await;
    tracing::info!(user_id = user.id, "user registered");

    Ok(ApiResponse::ok("User created, confirmation sent"))
}

/// Reuse the pending confirmation token of a user, or create one.
async fn confirmation_token_for(state: &AppState, user_id: i32) -> AppResult<String> {
    let existing = ConfirmEmailTokens::find()
        .filter(ConfirmTokenCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?;
    if let Some(token) = existing {
        return Ok(token.key);
    }

    let token = ConfirmTokenActive {
        id: NotSet,
        user_id: Set(user_id),
        key: Set(new_key()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(token.key)
}

pub async fn confirm_account(
    state: &AppState,
    payload: ConfirmAccountRequest,
) -> AppResult<ApiResponse<Empty>> {
    let mut required = Required::default();
    let email = required.text("email", payload.email);
    let key = required.text("token", payload.token);
    required.finish()?;
    let email = normalize_email(&email).unwrap_or(email);

    let found = ConfirmEmailTokens::find()
        .find_also_related(Users)
        .filter(UserCol::Email.eq(email.as_str()))
        .filter(ConfirmTokenCol::Key.eq(key.as_str()))
        .one(&state.orm)
        .await?;

    let Some((token, Some(user))) = found else {
        return Err(AppError::Validation(serde_json::json!(
            "Invalid token or email"
        )));
    };

    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.is_active = Set(true);
    active.update(&state.orm).await?;
    token.delete(&state.orm).await?;

    tracing::info!(user_id, "account confirmed");
    Ok(ApiResponse::ok("Account confirmed"))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let mut required = Required::default();
    let email = required.text("email", payload.email);
    let password = required.text("password", payload.password);
    required.finish()?;
    let email = normalize_email(&email).unwrap_or(email);

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::InvalidCredentials),
    };

    if !password_matches(&password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.auth, user.id, user.user_type)?;

    audit::record(
        state,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse { token },
        Some(Meta::empty()),
    ))
}

/// Always answers the same way, whether or not the address is known.
pub async fn request_password_reset(
    state: &AppState,
    payload: PasswordResetRequest,
) -> AppResult<ApiResponse<Empty>> {
    let mut required = Required::default();
    let email = required.text("email", payload.email);
    required.finish()?;
    let email = normalize_email(&email).unwrap_or(email);

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .filter(UserCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;

    if let Some(user) = user {
        let token = ResetTokenActive {
            id: NotSet,
            user_id: Set(user.id),
            key: Set(new_key()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await?;

        state.notifier.notify(Notification::PasswordReset {
            email: user.email.clone(),
            token: token.key,
        });
        audit::record(
            state,
            Some(user.id),
            "password_reset_requested",
            "users",
            serde_json::json!({ "user_id": user.id }),
        )
        .await;
    } else {
        tracing::debug!("password reset requested for unknown or inactive email");
    }

    Ok(ApiResponse::ok("If the account exists, a reset token was sent"))
}

pub async fn confirm_password_reset(
    state: &AppState,
    payload: PasswordResetConfirmRequest,
) -> AppResult<ApiResponse<Empty>> {
    let mut required = Required::default();
    let key = required.text("token", payload.token);
    let password = required.text("password", payload.password);
    required.finish()?;
    validate_password(&password)?;

    let invalid = || AppError::Validation(serde_json::json!("Invalid or expired token"));
    let token = PasswordResetTokens::find()
        .filter(ResetTokenCol::Key.eq(key.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let expires_at = token.created_at + Duration::hours(state.auth.password_reset_ttl_hours);
    if expires_at < Utc::now() {
        token.delete(&state.orm).await?;
        return Err(invalid());
    }

    let user: users::Model = Users::find_by_id(token.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(&password)?);
    active.update(&state.orm).await?;

    PasswordResetTokens::delete_many()
        .filter(ResetTokenCol::UserId.eq(user_id))
        .exec(&state.orm)
        .await?;

    audit::record(
        state,
        Some(user_id),
        "password_reset",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::ok("Password updated"))
}
