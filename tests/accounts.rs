mod common;

use serde_json::json;

use shop_orders_api::{
    dto::{
        ItemsRequest,
        auth::{
            ConfirmAccountRequest, LoginRequest, PasswordResetConfirmRequest,
            PasswordResetRequest, RegisterRequest, UpdateDetailsRequest,
        },
        contacts::{ContactRequest, UpdateContactRequest},
    },
    entity::users::UserType,
    error::AppError,
    middleware::auth::verify_token,
    notify::Notification,
    services::{account_service, auth_service},
};

fn registration(email: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: Some("Anna".into()),
        last_name: Some("Smirnova".into()),
        email: Some(email.into()),
        password: Some("violet-harbour-9".into()),
        company: Some("Acme".into()),
        position: Some("Purchaser".into()),
        user_type: Some(UserType::Shop),
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.into()),
        password: Some(password.into()),
    }
}

#[tokio::test]
async fn register_confirm_and_login() -> anyhow::Result<()> {
    let mut app = common::setup().await?;
    let state = app.state.clone();

    auth_service::register_user(&state, registration("anna@example.com")).await?;

    // inactive until confirmed
    let early = auth_service::login_user(&state, login("anna@example.com", "violet-harbour-9")).await;
    assert!(matches!(early, Err(AppError::InvalidCredentials)));

    let token = match app.sent_mail().as_slice() {
        [Notification::ConfirmEmail { email, token }] => {
            assert_eq!(email, "anna@example.com");
            token.clone()
        }
        other => panic!("unexpected mail {other:?}"),
    };

    let wrong = auth_service::confirm_account(
        &state,
        ConfirmAccountRequest {
            email: Some("anna@example.com".into()),
            token: Some("nope".into()),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Validation(_))));

    auth_service::confirm_account(
        &state,
        ConfirmAccountRequest {
            email: Some("anna@example.com".into()),
            token: Some(token.clone()),
        },
    )
    .await?;

    // tokens are single use
    let reused = auth_service::confirm_account(
        &state,
        ConfirmAccountRequest {
            email: Some("anna@example.com".into()),
            token: Some(token),
        },
    )
    .await;
    assert!(matches!(reused, Err(AppError::Validation(_))));

    let resp = auth_service::login_user(&state, login("anna@example.com", "violet-harbour-9")).await?;
    let bearer = resp.data.expect("token").token;
    let user = verify_token(&state.auth, &bearer)?;
    assert_eq!(user.user_type, UserType::Shop);

    let bad = auth_service::login_user(&state, login("anna@example.com", "wrong-password")).await;
    assert!(matches!(bad, Err(AppError::InvalidCredentials)));
    Ok(())
}

#[tokio::test]
async fn registration_rejects_duplicates_and_weak_passwords() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    auth_service::register_user(state, registration("anna@example.com")).await?;

    let duplicate = auth_service::register_user(state, registration("anna@EXAMPLE.com")).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));

    let weak = RegisterRequest {
        password: Some("12345".into()),
        ..registration("other@example.com")
    };
    assert!(matches!(
        auth_service::register_user(state, weak).await,
        Err(AppError::Validation(_))
    ));
    Ok(())
}

#[tokio::test]
async fn password_reset_round_trip() -> anyhow::Result<()> {
    let mut app = common::setup().await?;
    let state = app.state.clone();
    common::buyer(&state, "buyer@example.com").await?;

    auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: Some("nobody@example.com".into()),
        },
    )
    .await?;
    assert!(app.sent_mail().is_empty());

    auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: Some("buyer@example.com".into()),
        },
    )
    .await?;
    let token = match app.sent_mail().as_slice() {
        [Notification::PasswordReset { token, .. }] => token.clone(),
        other => panic!("unexpected mail {other:?}"),
    };

    auth_service::confirm_password_reset(
        &state,
        PasswordResetConfirmRequest {
            token: Some(token.clone()),
            password: Some("brand-new-secret".into()),
        },
    )
    .await?;

    auth_service::login_user(&state, login("buyer@example.com", "brand-new-secret")).await?;
    let old = auth_service::login_user(&state, login("buyer@example.com", "buyer-password")).await;
    assert!(matches!(old, Err(AppError::InvalidCredentials)));

    let reused = auth_service::confirm_password_reset(
        &state,
        PasswordResetConfirmRequest {
            token: Some(token),
            password: Some("another-secret".into()),
        },
    )
    .await;
    assert!(matches!(reused, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn details_and_contacts() -> anyhow::Result<()> {
    let app = common::setup().await?;
    let state = &app.state;
    let user = common::buyer(state, "buyer@example.com").await?;
    common::buyer(state, "taken@example.com").await?;

    account_service::update_details(
        state,
        &user,
        UpdateDetailsRequest {
            first_name: Some("Boris".into()),
            ..Default::default()
        },
    )
    .await?;

    let taken = account_service::update_details(
        state,
        &user,
        UpdateDetailsRequest {
            email: Some("taken@example.com".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(taken, Err(AppError::Validation(_))));

    let missing_phone = account_service::create_contact(
        state,
        &user,
        ContactRequest {
            city: Some("Kazan".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(missing_phone, Err(AppError::MissingArguments(_))));

    let contact = account_service::create_contact(
        state,
        &user,
        ContactRequest {
            city: Some("Kazan".into()),
            phone: Some("+7 900 000 00 00".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("contact");

    let updated = account_service::update_contact(
        state,
        &user,
        UpdateContactRequest {
            id: Some(json!(contact.id.to_string())),
            fields: ContactRequest {
                street: Some("Baumana".into()),
                ..Default::default()
            },
        },
    )
    .await?
    .data
    .expect("contact");
    assert_eq!(updated.street, "Baumana");
    assert_eq!(updated.city, "Kazan");

    let blanked = account_service::update_contact(
        state,
        &user,
        UpdateContactRequest {
            id: Some(json!(contact.id)),
            fields: ContactRequest {
                city: Some(String::new()),
                phone: Some("  ".into()),
                ..Default::default()
            },
        },
    )
    .await;
    assert!(matches!(blanked, Err(AppError::MissingArguments(_))));

    let details = account_service::get_details(state, &user).await?.data.expect("user");
    assert_eq!(details.first_name, "Boris");
    assert_eq!(details.contacts.len(), 1);
    assert_eq!(details.contacts[0].city, "Kazan");
    assert_eq!(details.contacts[0].phone, "+7 900 000 00 00");

    let stranger = common::buyer(state, "stranger@example.com").await?;
    let foreign = account_service::update_contact(
        state,
        &stranger,
        UpdateContactRequest {
            id: Some(json!(contact.id)),
            fields: ContactRequest::default(),
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::NotFound)));

    let deleted = account_service::delete_contacts(
        state,
        &user,
        ItemsRequest {
            items: Some(json!([contact.id])),
        },
    )
    .await?;
    assert_eq!(deleted.data.map(|d| d.objects_deleted), Some(1));
    Ok(())
}
