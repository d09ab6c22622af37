use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::collections::BTreeMap;
use std::time;

use crate::domain::recipient_email::RecipientEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: RecipientEmail,
    api_key: Secret<String>,
}

/// A fully rendered message, ready for the mail API.
#[derive(Debug)]
pub struct OutgoingEmail {
    pub recipient: RecipientEmail,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
    /// Extra transport headers, e.g. `List-Unsubscribe`.
    pub headers: BTreeMap<String, String>,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody {
    personalizations: Vec<SengridPersonalization>,
    from: SengridEmail,
    subject: String,
    content: Vec<SengridContent>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
}

#[derive(serde::Serialize)]
struct SengridEmail {
    email: String,
}

#[derive(serde::Serialize)]
struct SengridPersonalization {
    to: Vec<SengridEmail>,
}

#[derive(serde::Serialize)]
struct SengridContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: RecipientEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        })
    }

    pub fn sender(&self) -> &RecipientEmail {
        &self.sender
    }

    #[tracing::instrument(
        name = "Send an email through the mail API",
        skip(self, email),
        fields(
            recipient = %email.recipient.as_ref(),
            subject = %email.subject
        )
    )]
    pub async fn send_email(&self, email: &OutgoingEmail) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/send", self.base_url);
        // The mail API wants text/plain before text/html.
        let body = SendEmailBody {
            from: SengridEmail {
                email: String::from(self.sender.as_ref()),
            },
            personalizations: vec![SengridPersonalization {
                to: vec![SengridEmail {
                    email: String::from(email.recipient.as_ref()),
                }],
            }],
            subject: email.subject.clone(),
            content: vec![
                SengridContent {
                    content_type: String::from("text/plain"),
                    value: email.text_content.clone(),
                },
                SengridContent {
                    content_type: String::from("text/html"),
                    value: email.html_content.clone(),
                },
            ],
            headers: email.headers.clone(),
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}
