//! HTTP transport to the Tiny ERP v2 API.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{codec, ErpError};
use crate::server::metrics;

/// Longest upstream error body kept in an [`ErpError::Status`] message.
const MAX_ERROR_BODY_LENGTH: usize = 512;

/// Upstream error body as text, cut to [`MAX_ERROR_BODY_LENGTH`] bytes on a char boundary.
fn truncate_error_body(body: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(body).into_owned();
    if text.len() > MAX_ERROR_BODY_LENGTH {
        let cut = (0..=MAX_ERROR_BODY_LENGTH)
            .rev()
            .find(|i| text.is_char_boundary(*i))
            .unwrap_or(0);
        text.truncate(cut);
    }
    text
}

/// Sends one form-encoded POST to an ERP endpoint and decodes the JSON reply.
///
/// `form` is the complete field list, credential and format included, in the
/// order it goes on the wire.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn post_form(&self, endpoint: &str, form: Vec<(String, String)>)
        -> Result<Value, ErpError>;
}

/// reqwest-backed transport. No retries: every call maps to exactly one POST.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://api.tiny.com.br/api2"
    /// * `timeout_sec` - Per-request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}.php", self.base_url, endpoint)
    }

    async fn send(&self, endpoint: &str, form: &[(String, String)]) -> Result<Value, ErpError> {
        let response = self
            .client
            .post(self.endpoint_url(endpoint))
            .form(form)
            .send()
            .await
            .map_err(|source| ErpError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ErpError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(ErpError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        codec::decode_response(endpoint, &body)
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn post_form(
        &self,
        endpoint: &str,
        form: Vec<(String, String)>,
    ) -> Result<Value, ErpError> {
        debug!(
            "POST {} with fields [{}]",
            self.endpoint_url(endpoint),
            form.iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let start = Instant::now();
        let result = self.send(endpoint, &form).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_upstream_request(endpoint, outcome, start.elapsed());

        result
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        let transport = HttpTransport::new("https://api.tiny.com.br/api2/", 5).unwrap();
        assert_eq!(
            transport.endpoint_url("pedido.obter"),
            "https://api.tiny.com.br/api2/pedido.obter.php"
        );
    }

    #[test]
    fn test_error_body_truncation_keeps_utf8_intact() {
        let two_byte = "é".repeat(600);
        let text = truncate_error_body(two_byte.as_bytes());
        assert_eq!(text.len(), 512);
        assert!(text.chars().all(|c| c == 'é'));

        // 3-byte chars: 512 is not a boundary, so the cut falls back to 510.
        let three_byte = "€".repeat(300);
        let text = truncate_error_body(three_byte.as_bytes());
        assert_eq!(text.len(), 510);
        assert_eq!(text.chars().count(), 170);

        assert_eq!(truncate_error_body(b"Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let transport = HttpTransport::new("http://127.0.0.1:1", 2).unwrap();
        let result = transport
            .post_form("info", vec![("token".to_string(), "t".to_string())])
            .await;
        match result {
            Err(ErpError::Transport { endpoint, .. }) => assert_eq!(endpoint, "info"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
