// Node API HTTP client
//
// Wraps `reqwest::Client` with basic auth, URL construction against a
// node's management address, cancellation, and uniform non-2xx handling.
// Endpoint bindings (deployment, certs, system) are inherent methods in
// sibling modules so this file stays focused on transport mechanics.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::unwrap_envelope;
use crate::transport::{DEFAULT_OPERATION_TIMEOUT, DEFAULT_TIMEOUT, TransportConfig};

/// JSON pointers where the appliance puts a human-readable error message.
/// OpenAPI endpoints use `message` / `response.message`, the legacy ERS
/// endpoints use `ERSResponse.messages[0].title`.
const ERROR_MESSAGE_POINTERS: &[&str] = &[
    "/message",
    "/response/message",
    "/error/message",
    "/ERSResponse/messages/0/title",
];

/// A successful (2xx) response, fully read.
///
/// Returned by the `*_raw` helpers when the caller needs the status or
/// headers, or when the body is not JSON (certificate export bundles).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Decode the body as JSON, unwrapping the `{"response": ...}` envelope
    /// when present.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let deser_err = |e: serde_json::Error| {
            let body = String::from_utf8_lossy(&self.body).into_owned();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        };
        let value: serde_json::Value = serde_json::from_slice(&self.body).map_err(deser_err)?;
        unwrap_envelope(value).map_err(deser_err)
    }
}

/// HTTP client for one node's REST API.
///
/// Every request authenticates with HTTP basic auth using the credentials
/// the client was built with, and races against the client's cancellation
/// token. GET requests use the transport's read timeout; POST and PUT use
/// the longer operation timeout because they may change cluster state.
pub struct NodeClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    read_timeout: Duration,
    operation_timeout: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl NodeClient {
    /// Create a client for the node at `base_url` from a `TransportConfig`.
    ///
    /// `base_url` is the node's management root, e.g. `https://10.0.0.5`.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
            read_timeout: transport.timeout,
            operation_timeout: transport.operation_timeout,
            cancel: CancellationToken::new(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` and default timeouts.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username: username.into(),
            password,
            read_timeout: DEFAULT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future requests when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Host part of the base URL, for diagnostics.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or("<unknown host>")
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}{path}`. `path` must start with `/`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Build `{base}{collection}/{item}` with `item` encoded as a single
    /// path segment, so `/` and spaces in a hostname cannot change the route.
    pub(crate) fn item_url(&self, collection: &str, item: &str) -> Result<Url, Error> {
        let mut url = self.url(collection)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(item);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET, returning the raw response.
    pub async fn get_raw(&self, path: &str) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        self.get_url(url).await
    }

    /// GET one item of a collection, e.g. `/api/v1/deployment/node/{hostname}`.
    pub(crate) async fn get_item<T: DeserializeOwned>(
        &self,
        collection: &str,
        item: &str,
    ) -> Result<T, Error> {
        let url = self.item_url(collection, item)?;
        self.get_url(url).await?.json()
    }

    async fn get_url(&self, url: Url) -> Result<RawResponse, Error> {
        self.send(self.http.get(url), self.read_timeout).await
    }

    /// POST a JSON body, returning the raw response.
    pub async fn post_raw(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        self.send(self.http.post(url).json(body), self.operation_timeout)
            .await
    }

    /// POST without a body.
    pub async fn post_empty(&self, path: &str) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        self.send(self.http.post(url), self.operation_timeout).await
    }

    /// PUT a JSON body, returning the raw response.
    pub async fn put(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        self.send(self.http.put(url).json(body), self.operation_timeout)
            .await
    }

    /// Authenticate, send, and read the full body. Non-2xx responses become
    /// `Error::Api` carrying status, parsed message, and raw body.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<RawResponse, Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = builder
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .build()?;
        let method = request.method().to_string();
        let url = request.url().to_string();
        debug!("{method} {url}");

        let resp = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            resp = self.http.execute(request) => resp.map_err(|e| transport_error(e, timeout))?,
        };

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            body = resp.bytes() => body.map_err(|e| transport_error(e, timeout))?,
        };
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body).into_owned();
            return Err(Error::Api {
                method,
                url,
                status: status.as_u16(),
                message: parse_error_message(&text),
                body: text,
            });
        }

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        Error::Transport(err)
    }
}

/// Pull a human-readable message out of one of the appliance's error shapes.
fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ERROR_MESSAGE_POINTERS
        .iter()
        .find_map(|ptr| value.pointer(ptr).and_then(serde_json::Value::as_str))
        .map(String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> NodeClient {
        NodeClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            "admin",
            SecretString::from("pw".to_string()),
        )
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let c = client("https://10.0.0.1/proxy/");
        let url = c.url("/api/v1/deployment/primary").unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.1/proxy/api/v1/deployment/primary");
    }

    #[test]
    fn item_is_a_single_path_segment() {
        let c = client("https://10.0.0.1");
        let url = c.item_url("/api/v1/deployment/node", "ise-1").unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.1/api/v1/deployment/node/ise-1");

        let url = c.item_url("/api/v1/deployment/node", "a b/c").unwrap();
        assert_eq!(url.path(), "/api/v1/deployment/node/a%20b%2Fc");
    }

    #[test]
    fn item_url_keeps_base_path_prefix() {
        let c = client("https://10.0.0.1/proxy/");
        let url = c.item_url("/api/v1/certs/system-certificate", "ise-2").unwrap();
        assert_eq!(url.path(), "/proxy/api/v1/certs/system-certificate/ise-2");
    }

    #[test]
    fn error_message_shapes() {
        assert_eq!(
            parse_error_message(r#"{"message":"bad"}"#).as_deref(),
            Some("bad")
        );
        assert_eq!(
            parse_error_message(r#"{"response":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            parse_error_message(r#"{"ERSResponse":{"messages":[{"title":"ers"}]}}"#).as_deref(),
            Some("ers")
        );
        assert_eq!(parse_error_message("<html>502</html>"), None);
    }

    #[test]
    fn debug_hides_password() {
        let text = format!("{:?}", client("https://10.0.0.1"));
        assert!(!text.contains("pw"), "{text}");
        assert!(text.contains("admin"));
    }
}
