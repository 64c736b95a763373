// Token guard: no request leaves the process with a missing, undecodable
// or expired bearer token.
//
// The token is a JWT in compact form. Only the `exp` claim is consulted and
// the signature is never verified: the server remains the authority, this
// check exists to give the user a useful message before a doomed call.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Name the binary is installed under; used in every "re-run configure" hint.
pub const PROGRAM_NAME: &str = "flight-cu";

/// The hint shown whenever the user needs to supply a (new) token.
pub fn configure_hint() -> String {
    format!("{} configure", PROGRAM_NAME)
}

/// Claims decoded from the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Claims {
    /// Expiry in seconds since the epoch, when the token carries one.
    pub exp: Option<i64>,
}

/// Decode the claims of a compact JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.trim().split('.');
    let (header, payload, _signature) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return None,
        };

    // header must at least be a JSON object to count as a JWT
    decode_segment(header)?;
    let payload = decode_segment(payload)?;

    let exp = match payload.get("exp") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_i64()?),
    };
    Some(Claims { exp })
}

fn decode_segment(segment: &str) -> Option<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Seconds since the epoch, as compared against `exp`.
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Check the token against the current wall clock.
pub fn check_token(token: &str) -> ApiResult<()> {
    check_token_at(token, now_epoch())
}

/// Check the token as if the current time were `now`.
///
/// A token whose `exp` equals `now` is still accepted; only `exp < now`
/// counts as expired. Tokens without an `exp` claim are accepted as well.
pub fn check_token_at(token: &str, now: i64) -> ApiResult<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::client(format!(
            "No API token has been configured. Please run '{}' to set one.",
            configure_hint()
        )));
    }

    let claims = decode_claims(token).ok_or_else(|| {
        ApiError::client(format!(
            "The API token could not be decoded. Please regenerate it and run '{}'.",
            configure_hint()
        ))
    })?;

    match claims.exp {
        Some(exp) if exp < now => {
            tracing::debug!(exp, now, "token expired");
            Err(ApiError::client(format!(
                "The API token has expired. Please generate a new one and run '{}'.",
                configure_hint()
            )))
        }
        _ => Ok(()),
    }
}

/// Mask a stored token for display: 24 `*` plus its last 8 characters.
///
/// Returns `None` for an empty token so prompts can skip the default.
pub fn mask_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let stars = "*".repeat(24);
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 8 {
        return Some(stars);
    }
    let tail: String = chars[chars.len() - 8..].iter().collect();
    Some(format!("{}{}", stars, tail))
}
