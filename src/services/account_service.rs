use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    audit,
    dto::{
        ItemsRequest,
        auth::{UpdateDetailsRequest, normalize_email, validate_password},
        basket::ItemsDeleted,
        contacts::{ContactList, ContactRequest, UpdateContactRequest},
        loose::id_list,
    },
    entity::{
        Contacts, Users,
        contacts::{self, ActiveModel as ContactActive, Column as ContactCol},
        users::{ActiveModel as UserActive, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Contact, User},
    response::{ApiResponse, Empty, Meta},
    services::auth_service::hash_password,
    state::AppState,
};

pub(crate) fn contact_from_entity(contact: contacts::Model) -> Contact {
    Contact {
        id: contact.id,
        city: contact.city,
        street: contact.street,
        house: contact.house,
        apartment: contact.apartment,
        e_mail: contact.e_mail,
        phone: contact.phone,
        work_phone: contact.work_phone,
    }
}

async fn user_contacts(state: &AppState, user_id: i32) -> AppResult<Vec<Contact>> {
    Ok(Contacts::find()
        .filter(ContactCol::UserId.eq(user_id))
        .order_by_asc(ContactCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(contact_from_entity)
        .collect())
}

pub async fn get_details(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = User {
        id: account.id,
        email: account.email,
        first_name: account.first_name,
        last_name: account.last_name,
        company: account.company,
        position: account.position,
        user_type: account.user_type,
        is_active: account.is_active,
        contacts: user_contacts(state, user.user_id).await?,
    };
    Ok(ApiResponse::success("Ok", data, Some(Meta::empty())))
}

/// Partial profile update; the password is validated and re-hashed when given.
pub async fn update_details(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateDetailsRequest,
) -> AppResult<ApiResponse<Empty>> {
    if let Some(password) = payload.password.as_deref() {
        validate_password(password)?;
    }
    let email = payload.email.as_deref().map(normalize_email).transpose()?;

    if let Some(email) = email.as_deref() {
        let taken = Users::find()
            .filter(UserCol::Email.eq(email))
            .filter(UserCol::Id.ne(user.user_id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::field(
                "email",
                vec!["User with this email already exists.".into()],
            ));
        }
    }

    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = account.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(company) = payload.company {
        active.company = Set(Some(company));
    }
    if let Some(position) = payload.position {
        active.position = Set(Some(position));
    }
    if let Some(password) = payload.password {
        active.password_hash = Set(hash_password(&password)?);
    }
    if active.is_changed() {
        active.update(&state.orm).await?;
    }

    audit::record(
        state,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::ok("Details updated"))
}

pub async fn list_contacts(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ContactList>> {
    let items = user_contacts(state, user.user_id).await?;
    Ok(ApiResponse::success("Ok", ContactList { items }, Some(Meta::empty())))
}

pub async fn create_contact(
    state: &AppState,
    user: &AuthUser,
    payload: ContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let contact = payload.validate()?;
    let created = ContactActive {
        id: NotSet,
        user_id: Set(user.user_id),
        city: Set(contact.city),
        street: Set(contact.street),
        house: Set(contact.house),
        apartment: Set(contact.apartment),
        e_mail: Set(contact.e_mail),
        phone: Set(contact.phone),
        work_phone: Set(contact.work_phone),
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(user_id = user.user_id, contact_id = created.id, "contact created");
    Ok(ApiResponse::success(
        "Contact created",
        contact_from_entity(created),
        None,
    ))
}

pub async fn update_contact(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    let contact_id = payload.contact_id()?;
    payload.fields.validate_edit()?;
    let existing = Contacts::find_by_id(contact_id)
        .filter(ContactCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let fields = payload.fields;
    let mut active: ContactActive = existing.into();
    let columns = [
        (&mut active.city, fields.city),
        (&mut active.street, fields.street),
        (&mut active.house, fields.house),
        (&mut active.apartment, fields.apartment),
        (&mut active.e_mail, fields.e_mail),
        (&mut active.phone, fields.phone),
        (&mut active.work_phone, fields.work_phone),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            *column = Set(value);
        }
    }

    let updated = if active.is_changed() {
        active.update(&state.orm).await?
    } else {
        Contacts::find_by_id(contact_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?
    };

    Ok(ApiResponse::success(
        "Contact updated",
        contact_from_entity(updated),
        None,
    ))
}

/// Deletes the listed contacts of the caller; other ids match nothing.
pub async fn delete_contacts(
    state: &AppState,
    user: &AuthUser,
    payload: ItemsRequest,
) -> AppResult<ApiResponse<ItemsDeleted>> {
    let ids = payload.items.as_ref().map(id_list).unwrap_or_default();
    if ids.is_empty() {
        return Err(AppError::MissingArguments(vec!["items"]));
    }

    let result = Contacts::delete_many()
        .filter(ContactCol::UserId.eq(user.user_id))
        .filter(ContactCol::Id.is_in(ids))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Contacts deleted",
        ItemsDeleted {
            objects_deleted: result.rows_affected,
        },
        None,
    ))
}
