use actix_web::{http::header::ContentType, web, HttpRequest, HttpResponse};
use askama::Template;
use sqlx::PgPool;

use crate::domain::SuppressionSource;
use crate::routes::parse_parameters;
use crate::unsubscribe::{unsubscribe, UnsubscribeOutcome, UnsubscribeParameters};
use crate::unsubscribe_token::TokenCodec;

#[derive(Template, Default)]
#[template(path = "unsubscribe_page.html")]
pub struct UnsubscribePageTemplate {
    /// Set once the address is suppressed.
    pub email: Option<String>,
    pub invalid_token: bool,
    pub failed: bool,
}

impl UnsubscribePageTemplate {
    fn from_outcome(outcome: UnsubscribeOutcome) -> UnsubscribePageTemplate {
        match outcome {
            UnsubscribeOutcome::Unsubscribed { email } => UnsubscribePageTemplate {
                email: Some(email.to_string()),
                ..Default::default()
            },
            UnsubscribeOutcome::InvalidToken => UnsubscribePageTemplate {
                invalid_token: true,
                ..Default::default()
            },
            UnsubscribeOutcome::MissingIdentifier => UnsubscribePageTemplate::default(),
        }
    }
}

/// `GET /unsubscribe`, the page linked from every email footer.
///
/// A valid token unsubscribes straight away. An invalid or missing token shows
/// a form that submits a raw email to the API instead.
#[tracing::instrument(
    name = "Render the unsubscribe page",
    skip(request, db_pool, token_codec)
)]
pub async fn handle_unsubscribe_page(
    request: HttpRequest,
    db_pool: web::Data<PgPool>,
    token_codec: web::Data<TokenCodec>,
) -> HttpResponse {
    // Only a token is honoured here, raw emails go through the form.
    let parameters = UnsubscribeParameters {
        token: parse_parameters(request.query_string()).token,
        email: None,
    };

    let outcome = unsubscribe(
        &db_pool,
        &token_codec,
        &parameters,
        SuppressionSource::Link,
    )
    .await;

    let (mut response, template) = match outcome {
        Ok(outcome) => (
            HttpResponse::Ok(),
            UnsubscribePageTemplate::from_outcome(outcome),
        ),
        Err(err) => {
            tracing::error!("Failed to unsubscribe from the page: {:?}", err);
            (
                HttpResponse::InternalServerError(),
                UnsubscribePageTemplate {
                    failed: true,
                    ..Default::default()
                },
            )
        }
    };

    match template.render() {
        Ok(html) => response.content_type(ContentType::html()).body(html),
        Err(err) => {
            tracing::error!("Failed to render the unsubscribe page: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}
