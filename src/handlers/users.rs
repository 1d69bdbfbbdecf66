use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::Value as JsonValue;

use crate::{
    api::AppState,
    error::AppError,
    handlers::{JsonBody, body_object, fetch_item, new_item, notify, update_item},
    models::{
        item::{FieldDiff, IndexQuery, Item, ScanFilter},
        notification::{NotificationEvent, NotificationType, Topic},
        response::Envelope,
        validation::{optional_str, require_str, validate_topic_name},
    },
};

const EMAIL_INDEX: &str = "email-index";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/login", post(login))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Passwords are stored but never returned.
fn public_user(mut user: Item) -> Item {
    user.remove("password");
    user
}

async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<Item>>, AppError> {
    let users: Vec<Item> = state
        .store
        .scan(&state.tables.users, None)
        .await?
        .into_iter()
        .map(public_user)
        .collect();
    let count = users.len();

    Ok(Envelope::success(StatusCode::OK, "All Users", users).with_count(count))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Envelope<Item>, AppError> {
    let user = fetch_item(&state, &state.tables.users, &id, "User").await?;

    Ok(Envelope::success(
        StatusCode::OK,
        format!("Data for {}", id),
        public_user(user),
    ))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let fields = body_object(payload)?;

    require_str(&fields, "password", "Password is required")?;
    let email = require_str(&fields, "email", "Email is required")?.to_string();
    let first_name = require_str(&fields, "firstName", "First name is required")?.to_string();

    // The first name names the user's topic, so it must be checked before the write.
    validate_topic_name(&Topic::name_for(&first_name)).map_err(|_| {
        AppError::Validation(
            "First name may only contain letters, digits, hyphens and underscores".to_string(),
        )
    })?;

    let user = new_item(fields);
    state.store.put(&state.tables.users, user.clone()).await?;

    notify(
        &state,
        NotificationEvent::new(NotificationType::Signup, email, first_name),
    )
    .await?;

    Ok(Envelope::success(
        StatusCode::CREATED,
        "New User Created",
        public_user(user),
    ))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let diff = FieldDiff::from_object(body_object(payload)?)?;
    let user = update_item(&state, &state.tables.users, &id, &diff, "User").await?;

    Ok(Envelope::success(
        StatusCode::OK,
        format!("Updated User {}", id),
        public_user(user),
    ))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&state.tables.users, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let credentials = body_object(payload)?;
    let missing = "Email and Password are required";
    let email = require_str(&credentials, "email", missing)?;
    let password = require_str(&credentials, "password", missing)?;

    let query = IndexQuery::new(EMAIL_INDEX, ScanFilter::equals("email", email));
    let user = state
        .store
        .query(&state.tables.users, &query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation(INVALID_CREDENTIALS.to_string()))?;

    if optional_str(&user, "password") != Some(password) {
        return Err(AppError::Validation(INVALID_CREDENTIALS.to_string()));
    }

    if let Some(first_name) = optional_str(&user, "firstName") {
        notify(
            &state,
            NotificationEvent::new(NotificationType::Login, email, first_name),
        )
        .await?;
    }

    let mut profile = Item::new();
    for field in ["id", "email", "address", "firstName"] {
        profile.insert(
            field.to_string(),
            user.get(field).cloned().unwrap_or(JsonValue::Null),
        );
    }
    profile.insert(
        "type".to_string(),
        optional_str(&user, "type").unwrap_or("customer").into(),
    );

    Ok(Envelope::success(StatusCode::OK, "User logged in", profile))
}
