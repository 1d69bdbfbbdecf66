//! CRUD handlers for users, products and orders, plus file uploads.

use axum::{Json, extract::rejection::JsonRejection};
use chrono::{SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::{
    api::AppState,
    error::AppError,
    models::{
        item::{FieldDiff, ID_FIELD, Item},
        notification::{DispatchReceipt, NotificationEvent},
    },
};

pub mod orders;
pub mod products;
pub mod uploads;
pub mod users;

pub type JsonBody = Result<Json<JsonValue>, JsonRejection>;

pub fn body_object(payload: JsonBody) -> Result<Item, AppError> {
    let Json(value) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    match value {
        JsonValue::Object(object) => Ok(object),
        _ => Err(AppError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Assigns a fresh `id` and `createdAt`, overriding any supplied by the client.
pub fn new_item(mut fields: Item) -> Item {
    fields.insert(ID_FIELD.to_string(), Uuid::new_v4().to_string().into());
    fields.insert(
        "createdAt".to_string(),
        Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .into(),
    );
    fields
}

pub async fn fetch_item(
    state: &AppState,
    table: &str,
    id: &str,
    entity: &str,
) -> Result<Item, AppError> {
    state
        .store
        .get(table, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", entity, id)))
}

pub async fn update_item(
    state: &AppState,
    table: &str,
    id: &str,
    diff: &FieldDiff,
    entity: &str,
) -> Result<Item, AppError> {
    state
        .store
        .update(table, id, diff)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", entity, id)))
}

/// Notifications are a side effect of the primary write. Unless configured
/// as fatal, a failed dispatch is logged and the request still succeeds.
pub async fn notify(
    state: &AppState,
    event: NotificationEvent,
) -> Result<Option<DispatchReceipt>, AppError> {
    match state.dispatcher.dispatch(&event).await {
        Ok(receipt) => Ok(Some(receipt)),
        Err(e) if state.notification_failure_fatal => Err(e),
        Err(e) => {
            warn!(
                notification_type = %event.notification_type,
                error = %e,
                "Notification failed, primary operation unaffected"
            );
            Ok(None)
        }
    }
}
