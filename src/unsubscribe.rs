//! Turns a token or a raw email into a single suppression write.
//!
//! The token path proves the caller received an email from us. The raw email
//! path proves nothing: anyone who knows an address can suppress it. It exists
//! for people whose link no longer works and is accepted as a known
//! deliverability risk.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::{NormalizedEmail, SuppressionScope, SuppressionSource};
use crate::suppression::suppress_email;
use crate::unsubscribe_token::TokenCodec;

/// Identifiers a caller may send. Empty values count as absent.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct UnsubscribeParameters {
    pub token: Option<String>,
    pub email: Option<String>,
}

impl UnsubscribeParameters {
    pub fn token(&self) -> Option<&str> {
        non_blank(&self.token)
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    pub fn is_complete(&self) -> bool {
        self.token().is_some() && self.email().is_some()
    }

    /// Fills whatever is missing here from `fallback`; present values are kept.
    pub fn or(self, fallback: UnsubscribeParameters) -> UnsubscribeParameters {
        let UnsubscribeParameters { token, email } = self;
        let token = if non_blank(&token).is_some() {
            token
        } else {
            fallback.token().map(String::from)
        };
        let email = if non_blank(&email).is_some() {
            email
        } else {
            fallback.email().map(String::from)
        };

        UnsubscribeParameters { token, email }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed { email: NormalizedEmail },
    InvalidToken,
    MissingIdentifier,
}

impl UnsubscribeOutcome {
    pub fn is_unsubscribed(&self) -> bool {
        matches!(self, UnsubscribeOutcome::Unsubscribed { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            UnsubscribeOutcome::Unsubscribed { .. } => "Unsubscribed",
            UnsubscribeOutcome::InvalidToken => "Invalid token",
            UnsubscribeOutcome::MissingIdentifier => "Token or email is required",
        }
    }
}

/// Suppresses the address identified by `parameters`.
///
/// A token always takes priority over an email, even an invalid one: a bad
/// token is reported as [`UnsubscribeOutcome::InvalidToken`] and nothing is
/// written. `token_source` is recorded for token writes, raw emails are always
/// recorded as [`SuppressionSource::Api`].
#[tracing::instrument(
    name = "Unsubscribe an email address",
    skip(db_pool, token_codec, parameters),
    fields(
        has_token = parameters.token().is_some(),
        has_email = parameters.email().is_some()
    )
)]
pub async fn unsubscribe(
    db_pool: &PgPool,
    token_codec: &TokenCodec,
    parameters: &UnsubscribeParameters,
    token_source: SuppressionSource,
) -> Result<UnsubscribeOutcome, UnsubscribeError> {
    let (email, source) = match (parameters.token(), parameters.email()) {
        (Some(token), _) => {
            let email = token_codec
                .verify(token)
                .and_then(|email| NormalizedEmail::parse(&email).ok());

            match email {
                Some(email) => (email, token_source),
                None => {
                    tracing::info!("Rejected an invalid unsubscribe token");
                    return Ok(UnsubscribeOutcome::InvalidToken);
                }
            }
        }
        (None, Some(email)) => match NormalizedEmail::parse(email) {
            Ok(email) => (email, SuppressionSource::Api),
            Err(_) => return Ok(UnsubscribeOutcome::MissingIdentifier),
        },
        (None, None) => return Ok(UnsubscribeOutcome::MissingIdentifier),
    };

    suppress_email(db_pool, &email, source, "", SuppressionScope::All).await?;

    Ok(UnsubscribeOutcome::Unsubscribed { email })
}

#[derive(thiserror::Error)]
pub enum UnsubscribeError {
    #[error("Failed to store the suppression.")]
    StoreError(#[from] sqlx::Error),
}

impl std::fmt::Debug for UnsubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;

        if let Some(source) = std::error::Error::source(self) {
            write!(f, "\nCaused by:\n\t{}", source)?;
        }

        Ok(())
    }
}

impl ResponseError for UnsubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            UnsubscribeError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // The cause only goes to the logs.
    fn error_response(&self) -> HttpResponse {
        tracing::error!("Unsubscribe failed: {:?}", self);

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": "Something went wrong"
        }))
    }
}
