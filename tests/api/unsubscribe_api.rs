use claim::assert_some;
use sqlx::Executor;
use watchlist_newsletter::domain::{SuppressionScope, SuppressionSource};
use watchlist_newsletter::suppression::{get_suppression, is_email_suppressed};

use crate::helpers::TestApp;

#[tokio::test]
async fn unsubscribing_with_a_signed_token_suppresses_the_email() {
    let test_app = TestApp::spawn_app().await;
    let token = test_app.token_codec.sign("user@example.com");

    let response = test_app.get_unsubscribe_api(&[("token", &token)]).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Unsubscribed");
    assert!(is_email_suppressed(&test_app.db_pool, "user@example.com")
        .await
        .unwrap());
    let record = get_suppression(&test_app.db_pool, "user@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.source, SuppressionSource::Api);
    assert_eq!(record.scope, SuppressionScope::All);
    assert_eq!(record.reason, "");
}

#[tokio::test]
async fn unsubscribing_with_a_raw_email_suppresses_it_with_api_source() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .get_unsubscribe_api(&[("email", "foo@bar.com")])
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let record = get_suppression(&test_app.db_pool, "foo@bar.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.source, SuppressionSource::Api);
}

#[tokio::test]
async fn suppression_is_case_insensitive() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .get_unsubscribe_api(&[("email", "  A@B.com ")])
        .await
        .error_for_status()
        .unwrap();

    assert!(is_email_suppressed(&test_app.db_pool, "a@b.com").await.unwrap());
    assert!(is_email_suppressed(&test_app.db_pool, "A@B.COM").await.unwrap());
    assert_some!(get_suppression(&test_app.db_pool, "a@b.com").await.unwrap());
}

#[tokio::test]
async fn unsubscribing_twice_keeps_a_single_record() {
    let test_app = TestApp::spawn_app().await;
    let token = test_app.token_codec.sign("Repeat@Example.com");

    test_app
        .get_unsubscribe_api(&[("email", "repeat@example.com")])
        .await
        .error_for_status()
        .unwrap();
    test_app
        .post_unsubscribe_api(&[("token", &token)], None, "")
        .await
        .error_for_status()
        .unwrap();

    assert_eq!(test_app.count_suppressions().await, 1);
    let record = get_suppression(&test_app.db_pool, "repeat@example.com")
        .await
        .unwrap()
        .unwrap();
    // Metadata reflects the latest call.
    assert_eq!(record.source, SuppressionSource::ListUnsubscribe);
}

#[tokio::test]
async fn tokens_stay_valid_after_use() {
    let test_app = TestApp::spawn_app().await;
    let token = test_app.token_codec.sign("user@example.com");

    for _ in 0..2 {
        let response = test_app.get_unsubscribe_api(&[("token", &token)]).await;

        assert_eq!(response.status().as_u16(), 200);
    }

    assert_eq!(test_app.count_suppressions().await, 1);
}

#[tokio::test]
async fn invalid_token_is_rejected_with_400_even_when_an_email_is_given() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .get_unsubscribe_api(&[("token", "garbage"), ("email", "foo@bar.com")])
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid token");
    assert_eq!(test_app.count_suppressions().await, 0);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let test_app = TestApp::spawn_app().await;
    let forged = watchlist_newsletter::unsubscribe_token::TokenCodec::new(secrecy::Secret::new(
        String::from("dev-secret"),
    ))
    .sign("user@example.com");

    let response = test_app.get_unsubscribe_api(&[("token", &forged)]).await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(test_app.count_suppressions().await, 0);
}

#[tokio::test]
async fn unsubscribing_without_token_or_email_returns_400() {
    let test_app = TestApp::spawn_app().await;
    let test_cases: Vec<(Vec<(&str, &str)>, &str)> = vec![
        (vec![], "no parameters"),
        (vec![("token", "")], "empty token"),
        (vec![("email", "   ")], "blank email"),
    ];

    for (query, description) in test_cases {
        let response = test_app.get_unsubscribe_api(&query).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when the request had {}",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Token or email is required");
    }
}

#[tokio::test]
async fn one_click_post_with_token_in_query_unsubscribes() {
    let test_app = TestApp::spawn_app().await;
    let token = test_app.token_codec.sign("user@example.com");

    let response = test_app
        .post_unsubscribe_api(
            &[("token", &token)],
            Some("application/x-www-form-urlencoded"),
            "List-Unsubscribe=One-Click",
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), "OK");
    let record = get_suppression(&test_app.db_pool, "user@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.source, SuppressionSource::ListUnsubscribe);
}

#[tokio::test]
async fn one_click_post_reads_the_token_from_a_json_body() {
    let test_app = TestApp::spawn_app().await;
    let token = test_app.token_codec.sign("json@example.com");
    let body = serde_json::json!({ "token": token }).to_string();

    let response = test_app
        .post_unsubscribe_api(&[], Some("application/json"), &body)
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(is_email_suppressed(&test_app.db_pool, "json@example.com")
        .await
        .unwrap());
}

#[tokio::test]
async fn one_click_post_with_raw_email_uses_api_source() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_unsubscribe_api(
            &[],
            Some("application/x-www-form-urlencoded"),
            "email=Form%40Example.com",
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
    let record = get_suppression(&test_app.db_pool, "form@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.source, SuppressionSource::Api);
}

#[tokio::test]
async fn one_click_post_with_invalid_form_token_returns_400() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_unsubscribe_api(
            &[],
            Some("application/x-www-form-urlencoded"),
            "token=garbage",
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await.unwrap(), "Invalid token");
    assert_eq!(test_app.count_suppressions().await, 0);
}

#[tokio::test]
async fn one_click_post_without_identifiers_returns_400() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.post_unsubscribe_api(&[], None, "").await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await.unwrap(), "Bad Request");
}

#[tokio::test]
async fn store_failure_returns_a_generic_500() {
    let test_app = TestApp::spawn_app().await;
    // Sabotage the database
    test_app
        .db_pool
        .execute("ALTER TABLE email_suppressions DROP COLUMN reason;")
        .await
        .unwrap();

    let response = test_app
        .get_unsubscribe_api(&[("email", "foo@bar.com")])
        .await;

    assert_eq!(response.status().as_u16(), 500);
    let body = response.text().await.unwrap();
    assert!(!body.contains("reason"));
    assert!(body.contains("Something went wrong"));
}

#[tokio::test]
async fn repeated_query_keys_use_the_first_value() {
    let test_app = TestApp::spawn_app().await;
    let token = test_app.token_codec.sign("first@example.com");

    let response = test_app
        .get_unsubscribe_api(&[("token", &token), ("token", "not-a-token")])
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(is_email_suppressed(&test_app.db_pool, "first@example.com")
        .await
        .unwrap());
}

#[tokio::test]
async fn repeated_invalid_token_still_answers_with_json() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .get_unsubscribe_api(&[("token", "bad"), ("token", "worse")])
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid token");
}
