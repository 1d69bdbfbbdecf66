use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::AppError,
    handlers::{JsonBody, body_object, fetch_item, new_item, notify, update_item},
    models::{
        item::{FieldDiff, Item, ScanFilter},
        notification::{NotificationEvent, NotificationType},
        response::Envelope,
        validation::optional_str,
    },
};

const STATUS_FIELD: &str = "orderStatus";
const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub order_status: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/{id}",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

/// Orders only notify when they carry both the customer's e-mail and first name.
fn order_event(order: &Item, kind: NotificationType) -> Option<NotificationEvent> {
    let email = optional_str(order, "customerEmail")?;
    let first_name = optional_str(order, "customerFirstName")?;

    Some(NotificationEvent::new(kind, email, first_name))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OrderFilter>,
) -> Result<Envelope<Vec<Item>>, AppError> {
    let status_filter = filter
        .order_status
        .map(|status| ScanFilter::equals(STATUS_FIELD, status));
    let orders = state
        .store
        .scan(&state.tables.orders, status_filter.as_ref())
        .await?;
    let count = orders.len();

    Ok(Envelope::success(StatusCode::OK, "All Orders", orders).with_count(count))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Envelope<Item>, AppError> {
    let order = fetch_item(&state, &state.tables.orders, &id, "Order").await?;

    Ok(Envelope::success(
        StatusCode::OK,
        format!("Data for {}", id),
        order,
    ))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let mut fields = body_object(payload)?;
    fields
        .entry(STATUS_FIELD.to_string())
        .or_insert_with(|| DEFAULT_STATUS.into());

    let order = new_item(fields);
    state.store.put(&state.tables.orders, order.clone()).await?;

    if let Some(event) = order_event(&order, NotificationType::OrderPlaced) {
        notify(&state, event).await?;
    }

    Ok(Envelope::success(
        StatusCode::CREATED,
        "Created new order",
        order,
    ))
}

async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let diff = FieldDiff::from_object(body_object(payload)?)?;
    let previous = fetch_item(&state, &state.tables.orders, &id, "Order").await?;
    let order = update_item(&state, &state.tables.orders, &id, &diff, "Order").await?;

    let status_changed = diff
        .get(STATUS_FIELD)
        .is_some_and(|status| previous.get(STATUS_FIELD) != Some(status));

    if status_changed {
        if let Some(event) = order_event(&order, NotificationType::OrderStatusUpdated) {
            notify(&state, event).await?;
        }
    }

    Ok(Envelope::success(
        StatusCode::OK,
        format!("Updated order {}", id),
        order,
    ))
}

async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&state.tables.orders, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
