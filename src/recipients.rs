use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashSet;

use crate::domain::{Recipient, RecipientEmail, RegisteredUser};
use crate::suppression::fetch_suppressed_emails;

/// Users that may receive the news summary: complete profile, valid address,
/// and not present in the suppression table.
#[tracing::instrument(name = "Get newsletter recipients", skip(db_pool))]
pub async fn get_newsletter_recipients(db_pool: &PgPool) -> Result<Vec<Recipient>, sqlx::Error> {
    // Loaded once up front instead of one lookup per user.
    let suppressed = fetch_suppressed_emails(db_pool).await?;
    let users = get_registered_users(db_pool).await?;

    Ok(filter_recipients(users, &suppressed))
}

#[tracing::instrument(name = "Get registered users with an email", skip(db_pool))]
pub async fn get_registered_users(db_pool: &PgPool) -> Result<Vec<RegisteredUser>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT id, email, name
        FROM users
        WHERE email IS NOT NULL
        "#,
    )
    .map(|row: PgRow| RegisteredUser {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
    })
    .fetch_all(db_pool)
    .await
}

/// Drops users without an email or a display name, and users whose lowercased
/// email is in `suppressed`.
pub fn filter_recipients(
    users: Vec<RegisteredUser>,
    suppressed: &HashSet<String>,
) -> Vec<Recipient> {
    users
        .into_iter()
        .filter_map(|user| {
            let email = user.email.filter(|email| !email.trim().is_empty())?;
            let name = user.name.filter(|name| !name.trim().is_empty())?;

            if suppressed.contains(&email.trim().to_lowercase()) {
                return None;
            }

            match RecipientEmail::parse(email) {
                Ok(email) => Some(Recipient {
                    id: user.id,
                    email,
                    name,
                }),
                Err(err) => {
                    tracing::warn!(
                        user_id = %user.id,
                        "Skipping user with an invalid email: {}",
                        err
                    );
                    None
                }
            }
        })
        .collect()
}
