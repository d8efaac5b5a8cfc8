use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{header, StatusCode};

use crate::{
    decode::{build_jsonrpc_request, classify_rpc_error, decode_jsonrpc_response},
    transport::Transport,
    Result, Translation, TranslationRequest, TranslatorError,
};

/// Public JSON-RPC endpoint of the web translator.
pub const DEFAULT_JSONRPC_URL: &str = "https://www2.deepl.com/jsonrpc";

/// Transport that posts `LMT_handle_jobs` calls to the JSON-RPC endpoint.
pub struct JsonRpcTransport {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl fmt::Debug for JsonRpcTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Default for JsonRpcTransport {
    fn default() -> Self {
        Self::new(DEFAULT_JSONRPC_URL)
    }
}

impl JsonRpcTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Uses a preconfigured `reqwest` client (proxy, user agent, ...).
    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(initial_request_id()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn dispatch(
        &self,
        request: &TranslationRequest,
        timeout: Duration,
    ) -> Result<Translation> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = build_jsonrpc_request(request, id);

        #[cfg(feature = "tracing")]
        tracing::debug!(id, endpoint = %self.endpoint, "sending LMT_handle_jobs request");

        let response = self
            .http
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|err| map_send_error(err, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| map_send_error(err, timeout))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limit_from_body(&body));
        }
        if !status.is_success() {
            return Err(TranslatorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_jsonrpc_response(&body)
    }
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> TranslatorError {
    if err.is_timeout() {
        TranslatorError::Timeout(timeout)
    } else {
        TranslatorError::Http(err)
    }
}

/// A 429 is a rate limit whatever the body says; keep its details when it
/// carries a JSON-RPC error payload.
fn rate_limit_from_body(body: &str) -> TranslatorError {
    let (code, message) = serde_json::from_str::<crate::wire::JsonRpcResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .map(|error| (error.code, error.message))
        .unwrap_or((None, None));

    match classify_rpc_error(code, message) {
        TranslatorError::Service { code, message } => TranslatorError::RateLimited { code, message },
        other => other,
    }
}

// The service expects ids that do not repeat across sessions.
fn initial_request_id() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();
    (millis % 100_000) * 10_000
}

#[cfg(test)]
mod tests {
    use super::{rate_limit_from_body, JsonRpcTransport, DEFAULT_JSONRPC_URL};
    use crate::TranslatorError;

    #[test]
    fn default_targets_public_endpoint() {
        let transport = JsonRpcTransport::default();
        assert_eq!(transport.endpoint(), DEFAULT_JSONRPC_URL);
        assert!(format!("{transport:?}").contains("jsonrpc"));
    }

    #[test]
    fn status_429_is_always_a_rate_limit() {
        assert!(matches!(
            rate_limit_from_body("slow down"),
            TranslatorError::RateLimited {
                code: None,
                message: None
            }
        ));
        assert!(matches!(
            rate_limit_from_body(r#"{"error":{"code":1042911,"message":"Quota"}}"#),
            TranslatorError::RateLimited {
                code: Some(1042911),
                ..
            }
        ));
    }
}
