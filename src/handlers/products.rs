use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    api::AppState,
    error::AppError,
    handlers::{JsonBody, body_object, fetch_item, new_item, update_item},
    models::{
        item::{FieldDiff, Item},
        response::Envelope,
    },
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<Item>>, AppError> {
    let products = state.store.scan(&state.tables.products, None).await?;
    let count = products.len();

    Ok(Envelope::success(StatusCode::OK, "All Products", products).with_count(count))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Envelope<Item>, AppError> {
    let product = fetch_item(&state, &state.tables.products, &id, "Product").await?;

    Ok(Envelope::success(
        StatusCode::OK,
        format!("Data for {}", id),
        product,
    ))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let product = new_item(body_object(payload)?);
    state
        .store
        .put(&state.tables.products, product.clone())
        .await?;

    Ok(Envelope::success(
        StatusCode::CREATED,
        "Created new product",
        product,
    ))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Envelope<Item>, AppError> {
    let diff = FieldDiff::from_object(body_object(payload)?)?;
    let product = update_item(&state, &state.tables.products, &id, &diff, "Product").await?;

    Ok(Envelope::success(
        StatusCode::OK,
        format!("Updated product {}", id),
        product,
    ))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&state.tables.products, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
