// ── Core error types ──
//
// User-facing errors from personas-core. Every remote failure names the
// endpoint that was being called and the host it was sent to, so an
// operator can map it back to one call of the workflow.

use std::fmt;

use thiserror::Error;

use crate::certificate::BundleError;

/// One remote call of the node lifecycle API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetNodeDetails,
    AppServerProbe,
    GetSystemCertificates,
    ExportCertificate,
    ImportTrustedCertificate,
    RegisterNode,
    UpdateNode,
    PromoteToPrimary,
}

impl Operation {
    pub fn method(self) -> &'static str {
        match self {
            Self::GetNodeDetails | Self::AppServerProbe | Self::GetSystemCertificates => "GET",
            Self::ExportCertificate
            | Self::ImportTrustedCertificate
            | Self::RegisterNode
            | Self::PromoteToPrimary => "POST",
            Self::UpdateNode => "PUT",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::GetNodeDetails => "/api/v1/deployment/node/{hostname}",
            Self::AppServerProbe => "/ers/config/op/systemconfig/iseversion",
            Self::GetSystemCertificates => "/api/v1/certs/system-certificate/{hostname}",
            Self::ExportCertificate => "/api/v1/certs/system-certificate/export",
            Self::ImportTrustedCertificate => "/api/v1/certs/trusted-certificate/import",
            Self::RegisterNode | Self::UpdateNode => "/api/v1/deployment/node",
            Self::PromoteToPrimary => "/api/v1/deployment/primary",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::GetNodeDetails => "get node deployment info",
            Self::AppServerProbe => "application server liveness check",
            Self::GetSystemCertificates => "get system certificates",
            Self::ExportCertificate => "export certificate",
            Self::ImportTrustedCertificate => "import trusted certificate",
            Self::RegisterNode => "register node",
            Self::UpdateNode => "update node roles/services",
            Self::PromoteToPrimary => "promote to primary",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.description(), self.method(), self.path())
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote call failures ─────────────────────────────────────────
    #[error("{operation} on {host} failed: {source}")]
    Remote {
        operation: Operation,
        host: String,
        #[source]
        source: personas_api::Error,
    },

    /// A remote failure whose message is the API error's own text. The
    /// operation and host are still attached for callers.
    #[error("{source}")]
    Passthrough {
        operation: Operation,
        host: String,
        #[source]
        source: personas_api::Error,
    },

    #[error("Could not update node to PRIMARY")]
    PromotionFailed {
        hostname: String,
        #[source]
        source: personas_api::Error,
    },

    // ── Preconditions ────────────────────────────────────────────────
    #[error("Node {hostname} is not standalone (already part of a deployment)")]
    NotStandalone { hostname: String },

    #[error("Application server on node {hostname} is not running: {reason}")]
    AppServerNotRunning { hostname: String, reason: String },

    #[error("Primary node {hostname} is not ready to accept registrations: {reason}")]
    PrimaryNotReady { hostname: String, reason: String },

    // ── Certificates ─────────────────────────────────────────────────
    #[error("Node {hostname} has no system certificate named '{friendly_name}'")]
    CertificateNotFound {
        hostname: String,
        friendly_name: &'static str,
    },

    #[error("Invalid certificate bundle exported by node {hostname}: {source}")]
    CertificateBundle {
        hostname: String,
        #[source]
        source: BundleError,
    },

    // ── Node definition ──────────────────────────────────────────────
    #[error("Node '{node}' is missing required field '{field}'")]
    MissingField { node: String, field: &'static str },

    #[error("Invalid management address '{address}' for node '{node}': {reason}")]
    InvalidAddress {
        node: String,
        address: String,
        reason: String,
    },

    // ── Client construction ──────────────────────────────────────────
    #[error("TLS error: {message}")]
    Tls { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap an API error with the operation and host it came from.
    ///
    /// Cancellation is reported as [`CoreError::Cancelled`] regardless of
    /// which call was interrupted.
    pub(crate) fn remote(
        operation: Operation,
        host: impl Into<String>,
        source: personas_api::Error,
    ) -> Self {
        match source {
            personas_api::Error::Cancelled => Self::Cancelled,
            source => Self::Remote {
                operation,
                host: host.into(),
                source,
            },
        }
    }

    /// The underlying API error, if this failure came from a remote call.
    pub fn api_error(&self) -> Option<&personas_api::Error> {
        match self {
            Self::Remote { source, .. }
            | Self::Passthrough { source, .. }
            | Self::PromotionFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// HTTP status returned by the node, if any.
    pub fn status(&self) -> Option<u16> {
        self.api_error().and_then(personas_api::Error::status)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
            || matches!(self.api_error(), Some(personas_api::Error::Cancelled))
    }

    pub fn is_timeout(&self) -> bool {
        match self.api_error() {
            Some(personas_api::Error::Timeout { .. }) => true,
            Some(personas_api::Error::Transport(e)) => e.is_timeout(),
            _ => false,
        }
    }

    pub fn is_connection_failure(&self) -> bool {
        match self.api_error() {
            Some(personas_api::Error::Transport(e)) => e.is_connect(),
            Some(personas_api::Error::Tls(_)) => true,
            _ => matches!(self, Self::Tls { .. }),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.api_error()
            .is_some_and(personas_api::Error::is_unauthorized)
    }
}

// ── Conversion from client construction errors ──────────────────────

impl From<personas_api::Error> for CoreError {
    fn from(err: personas_api::Error) -> Self {
        match err {
            personas_api::Error::Cancelled => Self::Cancelled,
            personas_api::Error::Tls(message) => Self::Tls { message },
            personas_api::Error::InvalidUrl(e) => Self::Internal(format!("invalid URL: {e}")),
            other => Self::Internal(format!("HTTP client setup failed: {other}")),
        }
    }
}
