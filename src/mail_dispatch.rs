//! Outgoing mail with unsubscribe links and RFC 8058 headers.
use askama::Template;
use sqlx::PgPool;
use std::collections::BTreeMap;

use crate::domain::{Recipient, RecipientEmail};
use crate::email_client::{EmailClient, OutgoingEmail};
use crate::email_templates::{NewsSummaryEmailTemplate, WelcomeEmailTemplate};
use crate::suppression::is_email_suppressed;
use crate::unsubscribe_token::TokenCodec;

pub const LIST_UNSUBSCRIBE: &str = "List-Unsubscribe";
pub const LIST_UNSUBSCRIBE_POST: &str = "List-Unsubscribe-Post";
pub const ONE_CLICK: &str = "List-Unsubscribe=One-Click";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeLinks {
    /// Human facing page, used in the footer.
    pub page_url: String,
    /// Endpoint mail clients POST to.
    pub one_click_url: String,
}

#[derive(Debug, Clone)]
pub struct UnsubscribeLinkBuilder {
    base_url: String,
    token_codec: TokenCodec,
}

impl UnsubscribeLinkBuilder {
    pub fn new(base_url: &str, token_codec: TokenCodec) -> UnsubscribeLinkBuilder {
        UnsubscribeLinkBuilder {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_codec,
        }
    }

    /// Signs `email` once and points both links at it. Tokens only contain
    /// URL-safe characters, so they go into the query string as is.
    pub fn links_for(&self, email: &str) -> UnsubscribeLinks {
        let token = self.token_codec.sign(email);

        UnsubscribeLinks {
            page_url: format!("{}/unsubscribe?token={}", self.base_url, token),
            one_click_url: format!("{}/unsubscribe-api?token={}", self.base_url, token),
        }
    }
}

/// `List-Unsubscribe` and `List-Unsubscribe-Post` so mail clients can
/// unsubscribe without rendering the message.
pub fn unsubscribe_headers(links: &UnsubscribeLinks, mailto: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            String::from(LIST_UNSUBSCRIBE),
            format!(
                "<{}>, <mailto:{}?subject=unsubscribe>",
                links.one_click_url, mailto
            ),
        ),
        (String::from(LIST_UNSUBSCRIBE_POST), String::from(ONE_CLICK)),
    ])
}

/// Inserts the footer before the first `</body>`, or appends it when there is none.
pub fn append_unsubscribe_footer(html: &str, page_url: &str) -> String {
    let footer = format!(
        r#"<p style="margin-top:24px;font-size:12px;color:#9ca3af;">If you no longer wish to receive emails, <a href="{}">unsubscribe here</a>.</p>"#,
        page_url
    );

    if html.contains("</body>") {
        html.replacen("</body>", &format!("{}</body>", footer), 1)
    } else {
        format!("{}<hr/>{}", html, footer)
    }
}

pub fn append_unsubscribe_text(text: &str, page_url: &str) -> String {
    format!(
        "{}\n\nTo unsubscribe from future emails, visit: {}",
        text, page_url
    )
}

pub struct MailDispatcher {
    email_client: EmailClient,
    links: UnsubscribeLinkBuilder,
}

impl MailDispatcher {
    pub fn new(email_client: EmailClient, links: UnsubscribeLinkBuilder) -> MailDispatcher {
        MailDispatcher {
            email_client,
            links,
        }
    }

    /// Wraps rendered content with the footer and unsubscribe headers for `recipient`.
    pub fn compose(
        &self,
        recipient: RecipientEmail,
        subject: String,
        html_content: &str,
        text_content: &str,
    ) -> OutgoingEmail {
        let links = self.links.links_for(recipient.as_ref());

        OutgoingEmail {
            subject,
            html_content: append_unsubscribe_footer(html_content, &links.page_url),
            text_content: append_unsubscribe_text(text_content, &links.page_url),
            headers: unsubscribe_headers(&links, self.email_client.sender().as_ref()),
            recipient,
        }
    }

    /// Sends the welcome email unless the address is suppressed.
    /// Returns whether an email went out.
    #[tracing::instrument(
        name = "Send a welcome email",
        skip(self, db_pool, intro),
        fields(recipient = %recipient.as_ref())
    )]
    pub async fn send_welcome_email(
        &self,
        db_pool: &PgPool,
        recipient: RecipientEmail,
        name: &str,
        intro: &str,
    ) -> Result<bool, DispatchError> {
        if is_email_suppressed(db_pool, recipient.as_ref()).await? {
            tracing::info!("Skipping welcome email to a suppressed address");
            return Ok(false);
        }

        let html = WelcomeEmailTemplate { name, intro }.render()?;
        let email = self.compose(
            recipient,
            String::from("Welcome to Stockify - your stock market toolkit is ready!"),
            &html,
            "Thanks for joining Stockify",
        );

        self.email_client.send_email(&email).await?;

        Ok(true)
    }

    /// Sends the news summary to one recipient. Callers get recipients from
    /// [`crate::recipients::get_newsletter_recipients`], which already
    /// dropped suppressed addresses.
    #[tracing::instrument(
        name = "Send a news summary email",
        skip(self, recipient, news_content),
        fields(recipient = %recipient.email.as_ref())
    )]
    pub async fn send_news_summary_email(
        &self,
        recipient: &Recipient,
        date: &str,
        news_content: &str,
    ) -> Result<(), DispatchError> {
        let html = NewsSummaryEmailTemplate { date, news_content }.render()?;
        let email = self.compose(
            recipient.email.clone(),
            format!("Market News Summary Today - {}", date),
            &html,
            "Today's market news summary from Stockify",
        );

        self.email_client.send_email(&email).await?;

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("Failed to check the suppression list.")]
    SuppressionLookup(#[from] sqlx::Error),
    #[error("Failed to render the email.")]
    Render(#[from] askama::Error),
    #[error("Failed to send the email.")]
    Send(#[from] reqwest::Error),
}
