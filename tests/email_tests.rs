use anyhow::Result;
use serde_json::json;
use storefront_service::clients::email::EmailClient;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

use crate::common::fast_retry_config;

const SENDER: &str = "noreply@shop.test";

fn client(server: &MockServer, max_attempts: u32) -> Result<EmailClient> {
    EmailClient::from_parts(
        &server.uri(),
        "test-key",
        SENDER,
        fast_retry_config(max_attempts),
    )
}

/// Test: Accepted messages return the gateway's message id
#[tokio::test]
async fn test_send_email_returns_gateway_id() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "from": SENDER,
            "to": "a@x.com",
            "subject": "Login Alert",
            "text": "You have successfully logged in!"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "id": "msg-42" })))
        .expect(1)
        .mount(&server)
        .await;

    let message_id = client(&server, 3)?
        .send_email("a@x.com", "Login Alert", "You have successfully logged in!")
        .await?;

    assert_eq!(message_id, "msg-42");

    Ok(())
}

/// Test: Gateway errors are retried until the gateway recovers
#[tokio::test]
async fn test_gateway_errors_are_retried() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg-7" })))
        .expect(1)
        .mount(&server)
        .await;

    let message_id = client(&server, 3)?
        .send_email("a@x.com", "Order Confirmation", "Your order has been placed!")
        .await?;

    assert_eq!(message_id, "msg-7");

    Ok(())
}

/// Test: A gateway that keeps rejecting fails after every attempt is used
#[tokio::test]
async fn test_persistent_rejection_fails() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad recipient"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 3)?
        .send_email("not-an-address", "Login Alert", "You have successfully logged in!")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("422"), "unexpected error: {}", message);
    assert!(message.contains("bad recipient"), "unexpected error: {}", message);

    Ok(())
}

/// Test: A success without an id still yields a usable message id
#[tokio::test]
async fn test_missing_gateway_id_is_generated() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let message_id = client(&server, 1)?
        .send_email("a@x.com", "Login Alert", "You have successfully logged in!")
        .await?;

    assert!(uuid::Uuid::parse_str(&message_id).is_ok());

    Ok(())
}
