use watchlist_newsletter::domain::{NormalizedEmail, SuppressionScope, SuppressionSource};
use watchlist_newsletter::suppression::{get_suppression, suppress_email};

use crate::helpers::TestApp;

#[tokio::test]
async fn suppressing_again_overwrites_every_field() {
    let test_app = TestApp::spawn_app().await;
    let email = NormalizedEmail::parse("Trader@Example.com").unwrap();

    suppress_email(
        &test_app.db_pool,
        &email,
        SuppressionSource::Manual,
        "asked support",
        SuppressionScope::Newsletter,
    )
    .await
    .unwrap();
    let first = get_suppression(&test_app.db_pool, "trader@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.source, SuppressionSource::Manual);
    assert_eq!(first.reason, "asked support");
    assert_eq!(first.scope, SuppressionScope::Newsletter);

    suppress_email(
        &test_app.db_pool,
        &email,
        SuppressionSource::ListUnsubscribe,
        "one-click",
        SuppressionScope::All,
    )
    .await
    .unwrap();
    let second = get_suppression(&test_app.db_pool, "trader@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(test_app.count_suppressions().await, 1);
    assert_eq!(second.email.as_ref(), "trader@example.com");
    assert_eq!(second.source, SuppressionSource::ListUnsubscribe);
    assert_eq!(second.reason, "one-click");
    assert_eq!(second.scope, SuppressionScope::All);
    assert!(second.unsubscribed_at >= first.unsubscribed_at);
}
