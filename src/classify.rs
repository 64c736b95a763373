// Response classification.
//
// Turns one finished HTTP exchange into either the parsed JSON body or an
// `ApiError`. The rules are evaluated in a fixed order and the first match
// wins; a connection that never completed is handled separately by
// `connection_failed`.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::token::configure_hint;

pub const CONNECT_FAILED: &str = "unable to connect to the API server";
pub const BAD_FORMAT: &str = "bad response format received from server";
pub const FORBIDDEN: &str = "You are not authorized to access this resource.";

/// What the classifier needs to know about a completed exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Exchange {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Exchange {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }
}

/// Message for a 401: the server did not accept the token.
pub fn token_rejected() -> String {
    format!(
        "The API token failed validation. Please generate a new one and run '{}'.",
        configure_hint()
    )
}

/// The outcome of an exchange that could not be established at all.
pub fn connection_failed() -> ApiError {
    ApiError::server(CONNECT_FAILED)
}

/// Classify a completed exchange.
///
/// `recheck_token` runs when the server answers 404: this API reports some
/// invalid tokens as "not found", so the token is re-examined before the
/// status is treated as an ordinary client error.
///
/// Note that status 400 itself matches none of the status rules (the client
/// rule is `> 400`) and therefore succeeds when the body is JSON.
pub fn classify<F>(exchange: &Exchange, recheck_token: F) -> ApiResult<Value>
where
    F: FnOnce() -> ApiResult<()>,
{
    let status = exchange.status;

    if status >= 500 {
        return Err(ApiError::server(format!(
            "An unrecoverable error has occurred on the server (status: {})",
            status
        )));
    }
    if status == 404 {
        recheck_token()?;
    }
    match status {
        401 => return Err(ApiError::client(token_rejected())),
        403 => return Err(ApiError::client(FORBIDDEN)),
        s if s > 400 => {
            return Err(ApiError::client(format!(
                "An unexpected error has occurred (status: {})",
                s
            )))
        }
        _ => {}
    }

    if !is_json_media_type(exchange.content_type.as_deref()) {
        return Err(ApiError::server(BAD_FORMAT));
    }
    parse_body(&exchange.body)
}

/// `application/json`, `application/vnd.api+json; charset=utf-8`, ...
pub fn is_json_media_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type.ends_with("json")
}

fn parse_body(body: &[u8]) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "response body is not valid JSON");
        ApiError::server(BAD_FORMAT)
    })
}
