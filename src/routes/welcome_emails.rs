use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::RecipientEmail;
use crate::mail_dispatch::{DispatchError, MailDispatcher};

const DEFAULT_INTRO: &str =
    "Thanks for joining! You now have the tools to track markets and make smarter moves.";

/// Sent by the auth provider once a user finishes signing up.
#[derive(Deserialize, Debug)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub intro: Option<String>,
}

#[derive(serde::Serialize)]
struct WelcomeEmailResponse {
    sent: bool,
}

#[tracing::instrument(
    name = "Send a welcome email handler",
    skip(body, db_pool, mail_dispatcher),
    fields(user_email = %body.email)
)]
pub async fn handle_welcome_email(
    body: web::Json<NewUser>,
    db_pool: web::Data<PgPool>,
    mail_dispatcher: web::Data<MailDispatcher>,
) -> Result<HttpResponse, WelcomeEmailError> {
    let body = body.into_inner();
    let email = RecipientEmail::parse(body.email).map_err(WelcomeEmailError::ValidationError)?;
    let name = body.name.trim();

    if name.is_empty() {
        return Err(WelcomeEmailError::ValidationError(String::from(
            "name cannot be empty",
        )));
    }

    let intro = body.intro.as_deref().unwrap_or(DEFAULT_INTRO);
    let sent = mail_dispatcher
        .send_welcome_email(&db_pool, email, name, intro)
        .await?;

    Ok(HttpResponse::Ok().json(WelcomeEmailResponse { sent }))
}

#[derive(thiserror::Error)]
pub enum WelcomeEmailError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to send the welcome email.")]
    DispatchError(#[from] DispatchError),
}

impl std::fmt::Debug for WelcomeEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)?;

        if let Some(source) = std::error::Error::source(self) {
            write!(f, "\n\t({})", source)?;
        }

        Ok(())
    }
}

impl ResponseError for WelcomeEmailError {
    fn status_code(&self) -> StatusCode {
        match self {
            WelcomeEmailError::ValidationError(_) => StatusCode::BAD_REQUEST,
            WelcomeEmailError::DispatchError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
