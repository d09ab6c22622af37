use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::mail_dispatch::MailDispatcher;
use crate::recipients::get_newsletter_recipients;

#[derive(Deserialize, Debug)]
pub struct NewsSummary {
    /// Shown in the subject; defaults to today's date.
    pub date: Option<String>,
    pub content: NewsletterContent,
}

#[derive(Deserialize, Debug)]
pub struct NewsletterContent {
    pub html: String,
}

#[derive(serde::Serialize)]
struct PublishNewsletterResponse {
    sent: usize,
    failed: usize,
}

#[tracing::instrument(
    name = "Publishing the news summary to all recipients",
    skip(body, db_pool, mail_dispatcher),
    fields(date = ?body.date)
)]
pub async fn publish_newsletter(
    body: web::Json<NewsSummary>,
    db_pool: web::Data<PgPool>,
    mail_dispatcher: web::Data<MailDispatcher>,
) -> Result<HttpResponse, PublishNewsletterError> {
    let recipients = get_newsletter_recipients(&db_pool).await?;
    let date = body
        .date
        .clone()
        .unwrap_or_else(|| Utc::now().format("%B %-d, %Y").to_string());
    let mut sent = 0;
    let mut failed = 0;

    // One failing address must not stop the rest of the mailing.
    for recipient in &recipients {
        match mail_dispatcher
            .send_news_summary_email(recipient, &date, &body.content.html)
            .await
        {
            Ok(()) => sent += 1,
            Err(err) => {
                failed += 1;
                tracing::error!(
                    user_id = %recipient.id,
                    "Failed to send the news summary: {:?}",
                    err
                );
            }
        }
    }

    tracing::info!(sent, failed, "News summary published");

    Ok(HttpResponse::Ok().json(PublishNewsletterResponse { sent, failed }))
}

#[derive(thiserror::Error)]
pub enum PublishNewsletterError {
    #[error("Failed to get recipients from the database.")]
    GetRecipientsError(#[from] sqlx::Error),
}

impl std::fmt::Debug for PublishNewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for PublishNewsletterError {
    fn status_code(&self) -> StatusCode {
        match self {
            PublishNewsletterError::GetRecipientsError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
