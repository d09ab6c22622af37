use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[tokio::test]
async fn welcome_email_is_sent_to_new_users() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app
        .post_welcome_email(serde_json::json!({
            "email": "new@example.com",
            "name": "Frank",
            "intro": "Glad to have you."
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sent"], true);

    let received_requests = test_app.email_server.received_requests().await.unwrap();
    let email: serde_json::Value = serde_json::from_slice(&received_requests[0].body).unwrap();
    let html = email["content"][1]["value"].as_str().unwrap();
    assert!(html.contains("Welcome to Stockify, Frank!"));
    assert!(html.contains("unsubscribe here"));
    assert!(email["headers"]["List-Unsubscribe"].is_string());
}

#[tokio::test]
async fn welcome_email_is_not_sent_to_suppressed_addresses() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .get_unsubscribe_api(&[("email", "gone@example.com")])
        .await
        .error_for_status()
        .unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let response = test_app
        .post_welcome_email(serde_json::json!({
            "email": "Gone@Example.com",
            "name": "Gone"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sent"], false);
}

#[tokio::test]
async fn welcome_email_returns_400_when_body_is_invalid() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({ "email": "not-an-email", "name": "Frank" }),
            "invalid email",
        ),
        (
            serde_json::json!({ "email": "frank@example.com", "name": "  " }),
            "blank name",
        ),
        (serde_json::json!({ "name": "Frank" }), "missing email"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_welcome_email(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn welcome_email_returns_500_when_the_mail_api_fails() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app
        .post_welcome_email(serde_json::json!({
            "email": "new@example.com",
            "name": "Frank"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
}
