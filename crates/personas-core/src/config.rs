// ── Runtime cluster configuration ──
//
// These types describe *how* to talk to appliance nodes. They carry
// connection tuning but never touch disk. The CLI (or any other embedder)
// constructs a `ClusterConfig` and hands it to a `Session`.

use std::path::PathBuf;
use std::time::Duration;

use personas_api::{TlsMode, TransportConfig};

use crate::retry::RetryPolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Needed while a node still presents its
    /// self-signed bootstrap certificate.
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Settings shared by every call of one workflow run.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// TLS verification for nodes that don't override it.
    pub tls: TlsVerification,
    /// Timeout for read-only probes.
    pub timeout: Duration,
    /// Timeout for calls that change cluster state (register, promote,
    /// persona update, certificate import). These can run for minutes.
    pub operation_timeout: Duration,
    /// Retry policy for idempotent probes. Mutations are never retried.
    pub retry: RetryPolicy,
    /// Treat a missing default self-signed certificate as an error in the
    /// export-certs workflow instead of a no-op.
    pub require_default_certificate: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
            require_default_certificate: true,
        }
    }
}

impl ClusterConfig {
    /// Transport settings for a node, honouring its TLS override.
    pub(crate) fn transport(&self, tls_override: Option<&TlsVerification>) -> TransportConfig {
        TransportConfig {
            tls: tls_override.unwrap_or(&self.tls).into(),
            timeout: self.timeout,
            operation_timeout: self.operation_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_override_wins() {
        let config = ClusterConfig::default();
        let transport = config.transport(Some(&TlsVerification::DangerAcceptInvalid));
        assert_eq!(transport.tls, TlsMode::DangerAcceptInvalid);

        let transport = config.transport(None);
        assert_eq!(transport.tls, TlsMode::System);
        assert_eq!(transport.operation_timeout, Duration::from_secs(600));
    }
}
