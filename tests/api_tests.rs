use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use storefront_service::clients::KeyValueStore;

use crate::common::{Harness, send};

fn signup_body() -> serde_json::Value {
    json!({
        "email": "a@x.com",
        "password": "hunter2",
        "firstName": "Ana",
        "address": "1 Main St"
    })
}

/// Test: Signup stores the user, hides the password and queues a delayed welcome
#[tokio::test]
async fn test_signup_creates_user_and_queues_welcome() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);

    let (status, body) = send(&app, Method::POST, "/api/users", Some(signup_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["code"], 201);
    assert_eq!(body["message"], "New User Created");
    assert_eq!(body["data"]["email"], "a@x.com");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"]["id"].is_string());
    assert!(body["data"]["createdAt"].is_string());

    assert_eq!(harness.store.len("UsersTable").await, 1);

    let messages = harness.queue.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].attributes.notification_type, "Signup");
    assert_eq!(messages[0].delay_seconds, 40);

    Ok(())
}

/// Test: A first name that cannot name a topic is rejected before the user is stored
#[tokio::test]
async fn test_signup_rejects_unusable_first_name_before_storing() -> Result<()> {
    for fatal in [true, false] {
        let harness = Harness::new();
        let app = harness.app(fatal);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({ "email": "a@x.com", "password": "p", "firstName": "Ana Maria" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "fatal={}", fatal);
        assert_eq!(
            body["message"],
            "First name may only contain letters, digits, hyphens and underscores"
        );
        assert_eq!(harness.store.len("UsersTable").await, 0, "fatal={}", fatal);
        assert!(harness.log.calls().is_empty());
    }

    Ok(())
}

/// Test: Signup without a password is rejected and nothing is stored
#[tokio::test]
async fn test_signup_requires_password() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "email": "a@x.com", "firstName": "Ana" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Password is required");
    assert_eq!(body["data"], json!({}));
    assert_eq!(harness.store.len("UsersTable").await, 0);
    assert!(harness.log.calls().is_empty());

    Ok(())
}

/// Test: Login returns the public profile and queues an immediate alert
#[tokio::test]
async fn test_login_returns_profile_and_queues_alert() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);
    send(&app, Method::POST, "/api/users", Some(signup_body())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        Some(json!({ "email": "a@x.com", "password": "hunter2" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User logged in");
    assert_eq!(body["data"]["firstName"], "Ana");
    assert_eq!(body["data"]["address"], "1 Main St");
    assert_eq!(body["data"]["type"], "customer");
    assert!(body["data"].get("password").is_none());

    let messages = harness.queue.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].attributes.notification_type, "Login");
    assert_eq!(messages[1].delay_seconds, 0);
    assert_eq!(messages[0].attributes.topic_arn, messages[1].attributes.topic_arn);

    Ok(())
}

/// Test: Wrong credentials are rejected with the same message as an unknown e-mail
#[tokio::test]
async fn test_login_rejects_bad_credentials() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);
    send(&app, Method::POST, "/api/users", Some(signup_body())).await;

    let (wrong_password, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        Some(json!({ "email": "a@x.com", "password": "nope" })),
    )
    .await;
    assert_eq!(wrong_password, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password");

    let (unknown_email, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        Some(json!({ "email": "b@x.com", "password": "hunter2" })),
    )
    .await;
    assert_eq!(unknown_email, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password");

    Ok(())
}

/// Test: A failed notification is logged and the primary write still succeeds
#[tokio::test]
async fn test_notification_failure_is_not_fatal_by_default() -> Result<()> {
    let harness = Harness::new();
    harness.queue.set_unavailable(true);
    let app = harness.app(false);

    let (status, _) = send(&app, Method::POST, "/api/users", Some(signup_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(harness.store.len("UsersTable").await, 1);

    Ok(())
}

/// Test: Login succeeds even when the user's topic was never provisioned
#[tokio::test]
async fn test_login_without_topic_is_not_fatal_by_default() -> Result<()> {
    let harness = Harness::new();
    let mut user = serde_json::Map::new();
    user.insert("id".to_string(), json!("u-1"));
    user.insert("email".to_string(), json!("a@x.com"));
    user.insert("password".to_string(), json!("hunter2"));
    user.insert("firstName".to_string(), json!("Ana"));
    harness.store.put("UsersTable", user).await?;
    let app = harness.app(false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        Some(json!({ "email": "a@x.com", "password": "hunter2" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "u-1");
    assert!(harness.queue.messages().is_empty());

    Ok(())
}

/// Test: With fatal notifications a dispatch failure fails the request with a sanitized message
#[tokio::test]
async fn test_notification_failure_is_fatal_when_configured() -> Result<()> {
    let harness = Harness::new();
    harness.queue.set_unavailable(true);
    let app = harness.app(true);

    let (status, body) = send(&app, Method::POST, "/api/users", Some(signup_body())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Service temporarily unavailable");
    // The user write is not rolled back.
    assert_eq!(harness.store.len("UsersTable").await, 1);

    Ok(())
}

/// Test: Missing users are 404 and deleting twice still answers 204
#[tokio::test]
async fn test_user_not_found_and_idempotent_delete() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);

    let (status, body) = send(&app, Method::GET, "/api/users/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User with id missing not found");

    let (_, created) = send(&app, Method::POST, "/api/users", Some(signup_body())).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/users/{}", id);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Data for {}", id));

    let (first, _) = send(&app, Method::DELETE, &uri, None).await;
    let (second, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

/// Test: Updates apply a field diff and refuse to touch the id
#[tokio::test]
async fn test_product_updates_apply_field_diff() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "name": "Lamp", "price": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/products/{}", id);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "price": 25 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Updated product {}", id));
    assert_eq!(body["data"]["price"], 25);
    assert_eq!(body["data"]["name"], "Lamp");

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "id": "other" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "price = :p": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/products/missing",
        Some(json!({ "price": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

/// Test: Orders notify on placement and on an actual status change only
#[tokio::test]
async fn test_order_lifecycle_notifications() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);
    send(&app, Method::POST, "/api/users", Some(signup_body())).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({
            "customerEmail": "a@x.com",
            "customerFirstName": "Ana",
            "items": ["lamp"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["orderStatus"], "pending");
    let uri = format!("/api/orders/{}", created["data"]["id"].as_str().unwrap());

    send(&app, Method::PATCH, &uri, Some(json!({ "orderStatus": "shipped" }))).await;
    send(&app, Method::PATCH, &uri, Some(json!({ "orderStatus": "shipped" }))).await;
    send(&app, Method::PATCH, &uri, Some(json!({ "note": "leave at door" }))).await;

    let kinds: Vec<String> = harness
        .queue
        .messages()
        .into_iter()
        .map(|m| m.attributes.notification_type)
        .collect();
    assert_eq!(kinds, vec!["Signup", "OrderPlaced", "OrderStatusUpdated"]);

    Ok(())
}

/// Test: Orders can be filtered by status and the envelope reports the count
#[tokio::test]
async fn test_orders_filter_by_status() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);

    for status in ["pending", "shipped", "shipped"] {
        send(
            &app,
            Method::POST,
            "/api/orders",
            Some(json!({ "orderStatus": status })),
        )
        .await;
    }

    let (status, body) = send(&app, Method::GET, "/api/orders?orderStatus=shipped", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All Orders");
    assert_eq!(body["meta"]["count"], 2);

    let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
    assert_eq!(body["meta"]["count"], 3);
    assert!(harness.queue.messages().is_empty(), "Orders without a customer do not notify");

    Ok(())
}

/// Test: Malformed bodies, unknown routes and store outages map to envelope errors
#[tokio::test]
async fn test_error_envelopes() -> Result<()> {
    let harness = Harness::new();
    let app = harness.app(false);

    let (status, body) = send(&app, Method::POST, "/api/products", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Request body must be a JSON object");

    let (status, body) = send(&app, Method::GET, "/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Unsupported route");

    harness.store.set_unavailable(true);
    let (status, body) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Service temporarily unavailable");
    assert_eq!(body["code"], 503);

    Ok(())
}
