use actix_web::{
    http::header::CONTENT_TYPE,
    web::{self, Query},
    HttpRequest, HttpResponse,
};
use sqlx::PgPool;

use crate::domain::SuppressionSource;
use crate::unsubscribe::{
    unsubscribe, UnsubscribeError, UnsubscribeOutcome, UnsubscribeParameters,
};
use crate::unsubscribe_token::TokenCodec;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(serde::Serialize)]
struct UnsubscribeResponse {
    success: bool,
    message: &'static str,
}

/// `GET /unsubscribe-api?token=..` or `?email=..`, answered with JSON.
#[tracing::instrument(
    name = "Unsubscribe through the API",
    skip(request, db_pool, token_codec)
)]
pub async fn handle_unsubscribe(
    request: HttpRequest,
    db_pool: web::Data<PgPool>,
    token_codec: web::Data<TokenCodec>,
) -> Result<HttpResponse, UnsubscribeError> {
    let parameters = parse_parameters(request.query_string());
    let outcome = unsubscribe(
        &db_pool,
        &token_codec,
        &parameters,
        SuppressionSource::Api,
    )
    .await?;
    let body = UnsubscribeResponse {
        success: outcome.is_unsubscribed(),
        message: outcome.message(),
    };

    if outcome.is_unsubscribed() {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::BadRequest().json(body))
    }
}

/// `POST /unsubscribe-api`, the RFC 8058 one-click endpoint.
///
/// Mail clients usually POST `List-Unsubscribe=One-Click` with the token in
/// the URL, so the query string is read first and the body only fills gaps.
#[tracing::instrument(
    name = "One-click unsubscribe",
    skip(request, body, db_pool, token_codec)
)]
pub async fn handle_one_click_unsubscribe(
    request: HttpRequest,
    body: web::Bytes,
    db_pool: web::Data<PgPool>,
    token_codec: web::Data<TokenCodec>,
) -> Result<HttpResponse, UnsubscribeError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let parameters = extract_parameters(request.query_string(), content_type, &body);

    let outcome = unsubscribe(
        &db_pool,
        &token_codec,
        &parameters,
        SuppressionSource::ListUnsubscribe,
    )
    .await?;

    let response = match outcome {
        UnsubscribeOutcome::Unsubscribed { .. } => {
            HttpResponse::Ok().content_type(TEXT_PLAIN).body("OK")
        }
        UnsubscribeOutcome::InvalidToken => HttpResponse::BadRequest()
            .content_type(TEXT_PLAIN)
            .body("Invalid token"),
        UnsubscribeOutcome::MissingIdentifier => HttpResponse::BadRequest()
            .content_type(TEXT_PLAIN)
            .body("Bad Request"),
    };

    Ok(response)
}

/// Reads `token` and `email` from a URL-encoded string. A repeated key keeps
/// its first value, anything unparseable counts as absent.
pub fn parse_parameters(encoded: &str) -> UnsubscribeParameters {
    let pairs = Query::<Vec<(String, String)>>::from_query(encoded)
        .map(Query::into_inner)
        .unwrap_or_default();
    let first = |key: &str| {
        pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    };

    UnsubscribeParameters {
        token: first("token"),
        email: first("email"),
    }
}

/// Query string first; when it lacks a token or an email, a JSON or
/// form-encoded body (picked by content type) fills the missing values.
/// Unparseable bodies are treated as empty.
pub fn extract_parameters(
    query_string: &str,
    content_type: &str,
    body: &[u8],
) -> UnsubscribeParameters {
    let parameters = parse_parameters(query_string);

    if parameters.is_complete() {
        return parameters;
    }

    let fallback = if content_type.contains("application/json") {
        serde_json::from_slice::<UnsubscribeParameters>(body).unwrap_or_default()
    } else if content_type.contains("application/x-www-form-urlencoded") {
        std::str::from_utf8(body)
            .map(parse_parameters)
            .unwrap_or_default()
    } else {
        UnsubscribeParameters::default()
    };

    parameters.or(fallback)
}
