use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashSet;

use crate::domain::{NormalizedEmail, SuppressionRecord, SuppressionScope, SuppressionSource};

/// Marks `email` as not to be emailed again.
///
/// Upserts on the normalized address: calling it twice keeps a single row
/// whose metadata reflects the latest call.
#[tracing::instrument(
    name = "Suppress an email address",
    skip(db_pool, reason),
    fields(
        email = %email,
        source = %source.as_ref(),
        scope = %scope.as_ref()
    )
)]
pub async fn suppress_email(
    db_pool: &PgPool,
    email: &NormalizedEmail,
    source: SuppressionSource,
    reason: &str,
    scope: SuppressionScope,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO email_suppressions (email, unsubscribed_at, reason, source, scope)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
        SET unsubscribed_at = EXCLUDED.unsubscribed_at,
            reason = EXCLUDED.reason,
            source = EXCLUDED.source,
            scope = EXCLUDED.scope
        "#,
    )
    .bind(email.as_ref())
    .bind(Utc::now())
    .bind(reason)
    .bind(source.as_ref())
    .bind(scope.as_ref())
    .execute(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })?;

    Ok(())
}

#[tracing::instrument(name = "Check if an email address is suppressed", skip(db_pool))]
pub async fn is_email_suppressed(db_pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let email = match NormalizedEmail::parse(email) {
        Ok(email) => email,
        Err(_) => return Ok(false),
    };

    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM email_suppressions WHERE email = $1)")
        .bind(email.as_ref())
        .fetch_one(db_pool)
        .await?;

    row.try_get(0)
}

#[tracing::instrument(name = "Fetch a suppression record", skip(db_pool))]
pub async fn get_suppression(
    db_pool: &PgPool,
    email: &str,
) -> Result<Option<SuppressionRecord>, sqlx::Error> {
    let email = match NormalizedEmail::parse(email) {
        Ok(email) => email,
        Err(_) => return Ok(None),
    };

    let row = sqlx::query(
        r#"
        SELECT email, unsubscribed_at, reason, source, scope
        FROM email_suppressions
        WHERE email = $1
        "#,
    )
    .bind(email.as_ref())
    .fetch_optional(db_pool)
    .await?;

    row.map(|row| parse_record(&row)).transpose()
}

/// Every suppressed address, lowercased, for filtering a whole mailing in one query.
#[tracing::instrument(name = "Fetch all suppressed email addresses", skip(db_pool))]
pub async fn fetch_suppressed_emails(db_pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
    let emails = sqlx::query("SELECT email FROM email_suppressions")
        .map(|row: PgRow| row.get::<String, _>("email").to_lowercase())
        .fetch_all(db_pool)
        .await?;

    Ok(emails.into_iter().collect())
}

fn parse_record(row: &PgRow) -> Result<SuppressionRecord, sqlx::Error> {
    let decode_error = |err: String| sqlx::Error::Decode(err.into());
    let email: String = row.try_get("email")?;
    let unsubscribed_at: DateTime<Utc> = row.try_get("unsubscribed_at")?;

    Ok(SuppressionRecord {
        email: NormalizedEmail::parse(&email).map_err(decode_error)?,
        unsubscribed_at,
        reason: row.try_get("reason")?,
        source: SuppressionSource::parse(row.try_get("source")?).map_err(decode_error)?,
        scope: SuppressionScope::parse(row.try_get("scope")?).map_err(decode_error)?,
    })
}
