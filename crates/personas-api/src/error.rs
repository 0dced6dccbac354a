use thiserror::Error;

/// Top-level error type for the `personas-api` crate.
///
/// Covers every failure mode of a single node API call: transport, TLS,
/// non-2xx responses, and body decoding. `personas-core` wraps these with
/// the operation being attempted before they reach users.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The caller cancelled the request before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// The node answered with a non-2xx status. Both the parsed error
    /// message (when the body has a known error shape) and the raw body
    /// are kept for diagnostics.
    #[error("{method} {url} failed (HTTP {status}): {}", .message.as_deref().unwrap_or(body_preview(.body)))]
    Api {
        method: String,
        url: String,
        status: u16,
        message: Option<String>,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

fn body_preview(body: &str) -> &str {
    if body.is_empty() {
        return "<empty body>";
    }
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

impl Error {
    /// HTTP status code, if the node answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this error is an HTTP-status failure from the node
    /// (as opposed to a transport, TLS, or decoding failure).
    pub fn is_http_status(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Returns `true` if the node rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: Option<&str>, body: &str) -> Error {
        Error::Api {
            method: "POST".into(),
            url: "https://10.0.0.1/api/v1/deployment/node".into(),
            status,
            message: message.map(String::from),
            body: body.into(),
        }
    }

    #[test]
    fn api_error_prefers_parsed_message() {
        let err = api(400, Some("Node already registered"), "{\"raw\":true}");
        let text = err.to_string();
        assert!(text.contains("HTTP 400"), "{text}");
        assert!(text.contains("Node already registered"), "{text}");
    }

    #[test]
    fn api_error_falls_back_to_body() {
        let err = api(500, None, "internal failure");
        assert!(err.to_string().ends_with("internal failure"));

        let empty = api(500, None, "");
        assert!(empty.to_string().ends_with("<empty body>"));
    }

    #[test]
    fn gateway_errors_are_transient() {
        assert!(api(503, None, "").is_transient());
        assert!(api(504, None, "").is_transient());
        assert!(!api(500, None, "").is_transient());
        assert!(!api(400, None, "").is_transient());
        assert!(Error::Timeout { timeout_secs: 5 }.is_transient());
        assert!(!Error::Cancelled.is_transient());
    }

    #[test]
    fn unauthorized_detection() {
        assert!(api(401, None, "").is_unauthorized());
        assert!(api(403, None, "").is_unauthorized());
        assert!(!api(404, None, "").is_unauthorized());
    }
}
