// API client module: a small blocking HTTP client for the compute unit
// service. Every call goes through the same path: token pre-flight, send,
// then classification of whatever came back.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::classify::{classify, connection_failed, Exchange, BAD_FORMAT};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::token::{check_token, PROGRAM_NAME};

pub const BALANCE_PATH: &str = "/compute-balance";
pub const CONSUME_PATH: &str = "/compute-balance/consume";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client holding the reqwest client, the base URL of the service
/// and the bearer token. Built once per process.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
    debug: bool,
}

/// Reply of `GET /compute-balance`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub compute_unit_balance: Number,
}

/// A debit against the balance.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    pub amount: u64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_reason: Option<String>,
}

#[derive(Serialize)]
struct ConsumeRequest<'a> {
    consumption: &'a Consumption,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ConsumeResponse {
    compute_unit_balance: Option<Number>,
    #[serde(default)]
    credits_were_required: bool,
    error: Option<String>,
}

/// Result of a successful spend.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendOutcome {
    pub balance: Number,
    pub credits_were_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendWarning {
    /// The service allocated credits to cover the spend.
    CreditsAllocated,
    /// The balance went negative without credits covering it.
    NoFunds,
}

impl SpendWarning {
    pub fn message(self) -> &'static str {
        match self {
            SpendWarning::CreditsAllocated => {
                "Your compute unit balance was insufficient; service credits have been allocated to cover this spend."
            }
            SpendWarning::NoFunds => {
                "You have no available funds; your compute unit balance is now negative."
            }
        }
    }
}

impl SpendOutcome {
    pub fn warning(&self) -> Option<SpendWarning> {
        if self.credits_were_required {
            Some(SpendWarning::CreditsAllocated)
        } else if self.balance.as_f64().map_or(false, |b| b < 0.0) {
            Some(SpendWarning::NoFunds)
        } else {
            None
        }
    }
}

impl ApiClient {
    /// Build the client from resolved configuration values.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = format!("{}/{}", PROGRAM_NAME, env!("CARGO_PKG_VERSION"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
            debug: config.debug,
        })
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET `path` and return the parsed JSON body.
    pub fn get(&self, path: &str) -> ApiResult<Value> {
        let url = self.url(path);
        tracing::debug!(method = "GET", %url, "sending request");
        self.execute(self.client.get(&url))
    }

    /// POST `body` as JSON to `path` and return the parsed JSON body.
    pub fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let url = self.url(path);
        tracing::debug!(method = "POST", %url, "sending request");
        if self.debug {
            if let Ok(json) = serde_json::to_string(body) {
                tracing::debug!(body = %json, "request body");
            }
        }
        self.execute(self.client.post(&url).json(body))
    }

    fn execute(&self, request: RequestBuilder) -> ApiResult<Value> {
        check_token(&self.token)?;
        tracing::debug!(authorization = "Bearer [REDACTED]", "token accepted");

        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        tracing::debug!(status, content_type = ?content_type, "received response");

        let body = response.bytes().map_err(transport_error)?.to_vec();
        if self.debug {
            tracing::debug!(body = %String::from_utf8_lossy(&body), "response body");
        }

        let exchange = Exchange::new(status, content_type.as_deref(), body);
        classify(&exchange, || check_token(&self.token))
    }

    /// Current compute unit balance.
    pub fn balance(&self) -> ApiResult<Balance> {
        let body = self.get(BALANCE_PATH)?;
        serde_json::from_value(body).map_err(|_| ApiError::server(BAD_FORMAT))
    }

    /// Debit compute units. An `error` in an otherwise successful reply is
    /// reported as a client error.
    pub fn spend(&self, consumption: &Consumption) -> ApiResult<SpendOutcome> {
        let body = self.post(CONSUME_PATH, &ConsumeRequest { consumption })?;
        let reply: ConsumeResponse =
            serde_json::from_value(body).map_err(|_| ApiError::server(BAD_FORMAT))?;

        if let Some(error) = reply.error {
            return Err(ApiError::Client(error));
        }
        let balance = reply
            .compute_unit_balance
            .ok_or_else(|| ApiError::server(BAD_FORMAT))?;
        Ok(SpendOutcome {
            balance,
            credits_were_required: reply.credits_were_required,
        })
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    tracing::debug!(error = %err, "transport failure");
    if err.is_connect() {
        connection_failed()
    } else {
        ApiError::server(format!("Request to the API server failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(&ClientConfig {
            base_url: base_url.to_string(),
            token: String::new(),
            debug: false,
        })
        .expect("build client")
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let api = client("http://localhost:3001/api/");
        assert_eq!(
            api.url(BALANCE_PATH),
            "http://localhost:3001/api/compute-balance"
        );
        assert_eq!(
            api.url("compute-balance"),
            "http://localhost:3001/api/compute-balance"
        );
    }

    #[test]
    fn empty_token_fails_before_sending() {
        // nothing listens on port 9; a sent request would be a connect error
        let api = client("http://127.0.0.1:9");
        let err = api.get(BALANCE_PATH).unwrap_err();
        assert!(err.is_client());
        assert!(err.message().contains("flight-cu configure"));
    }

    #[test]
    fn consume_request_omits_missing_private_reason() {
        let consumption = Consumption {
            amount: 10,
            reason: "test".into(),
            private_reason: None,
        };
        let body = serde_json::to_value(ConsumeRequest {
            consumption: &consumption,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "consumption": { "amount": 10, "reason": "test" } })
        );
    }

    #[test]
    fn consume_request_includes_private_reason() {
        let consumption = Consumption {
            amount: 1,
            reason: "job".into(),
            private_reason: Some("internal".into()),
        };
        let body = serde_json::to_value(ConsumeRequest {
            consumption: &consumption,
        })
        .unwrap();
        assert_eq!(body["consumption"]["private_reason"], "internal");
    }

    #[test]
    fn spend_warnings() {
        let outcome = |balance: i64, credits| SpendOutcome {
            balance: Number::from(balance),
            credits_were_required: credits,
        };
        assert_eq!(outcome(5, true).warning(), Some(SpendWarning::CreditsAllocated));
        assert_eq!(outcome(-3, true).warning(), Some(SpendWarning::CreditsAllocated));
        assert_eq!(outcome(-3, false).warning(), Some(SpendWarning::NoFunds));
        assert_eq!(outcome(0, false).warning(), None);
        assert_eq!(outcome(7, false).warning(), None);
    }
}
