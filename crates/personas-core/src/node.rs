// ── Node entity ──
//
// One appliance instance of a multi-node deployment. A `Node` is a plain
// value: building one never touches the network. State probes live in
// `queries.rs`, state-changing calls in `mutations.rs`.

use std::collections::BTreeSet;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::TlsVerification;
use crate::error::CoreError;

/// An appliance node addressed by the workflows.
#[derive(Clone)]
pub struct Node {
    /// Local identifier (profile name). Only used in messages.
    pub name: String,
    /// Management address: bare host[:port], bracketed IPv6, or an
    /// absolute `http(s)://` URL.
    pub ip: String,
    /// Cluster hostname. Used as the path key of per-node endpoints.
    pub hostname: String,
    /// Fully qualified domain name. Required to register the node.
    pub fqdn: Option<String>,
    pub username: String,
    pub password: SecretString,
    pub roles: BTreeSet<String>,
    pub services: BTreeSet<String>,
    /// Per-node TLS override. `None` uses the session default.
    pub tls: Option<TlsVerification>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("ip", &self.ip)
            .field("hostname", &self.hostname)
            .field("fqdn", &self.fqdn)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("services", &self.services)
            .field("tls", &self.tls)
            .finish()
    }
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        ip: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            hostname: hostname.into(),
            fqdn: None,
            username: username.into(),
            password,
            roles: BTreeSet::new(),
            services: BTreeSet::new(),
            tls: None,
        }
    }

    #[must_use]
    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Label used in log lines and error messages.
    pub fn display_name(&self) -> &str {
        if self.hostname.is_empty() {
            &self.name
        } else {
            &self.hostname
        }
    }

    /// Check the fields every operation on this node's own API needs.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ip.trim().is_empty() {
            return Err(self.missing("ip"));
        }
        if self.hostname.trim().is_empty() {
            return Err(self.missing("hostname"));
        }
        Ok(())
    }

    /// The FQDN, required when registering the node into a deployment.
    pub(crate) fn require_fqdn(&self) -> Result<&str, CoreError> {
        match self.fqdn.as_deref().map(str::trim) {
            Some(fqdn) if !fqdn.is_empty() => Ok(fqdn),
            _ => Err(self.missing("fqdn")),
        }
    }

    /// API base URL derived from the management address.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        let address = self.ip.trim();
        if address.is_empty() {
            return Err(self.missing("ip"));
        }

        let candidate = if address.contains("://") {
            address.to_owned()
        } else {
            format!("https://{address}")
        };

        let url = Url::parse(&candidate).map_err(|e| self.invalid_address(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(self.invalid_address(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(self.invalid_address("no host".into()));
        }
        Ok(url)
    }

    pub(crate) fn roles_vec(&self) -> Vec<String> {
        self.roles.iter().cloned().collect()
    }

    pub(crate) fn services_vec(&self) -> Vec<String> {
        self.services.iter().cloned().collect()
    }

    pub(crate) fn password_plain(&self) -> &str {
        self.password.expose_secret()
    }

    fn missing(&self, field: &'static str) -> CoreError {
        CoreError::MissingField {
            node: self.name.clone(),
            field,
        }
    }

    fn invalid_address(&self, reason: String) -> CoreError {
        CoreError::InvalidAddress {
            node: self.name.clone(),
            address: self.ip.clone(),
            reason,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(ip: &str) -> Node {
        Node::new("ise-1", ip, "ise-1", "admin", SecretString::from("secret"))
    }

    #[test]
    fn bare_address_defaults_to_https() {
        let url = node("10.0.0.5").base_url().unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.5/");

        let url = node("ise-1.example.com:8443").base_url().unwrap();
        assert_eq!(url.port(), Some(8443));
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn bracketed_ipv6_is_accepted() {
        let url = node("[fd00::5]").base_url().unwrap();
        assert_eq!(url.host_str(), Some("[fd00::5]"));
    }

    #[test]
    fn explicit_url_is_used_verbatim() {
        let url = node("http://127.0.0.1:9060").base_url().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9060/");
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        assert!(matches!(
            node("ftp://10.0.0.5").base_url(),
            Err(CoreError::InvalidAddress { .. })
        ));
        assert!(matches!(
            node("   ").base_url(),
            Err(CoreError::MissingField { field: "ip", .. })
        ));
    }

    #[test]
    fn validate_requires_ip_and_hostname() {
        assert!(node("10.0.0.5").validate().is_ok());

        let mut n = node("10.0.0.5");
        n.hostname = String::new();
        match n.validate() {
            Err(CoreError::MissingField { node, field }) => {
                assert_eq!(node, "ise-1");
                assert_eq!(field, "hostname");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }

        assert!(matches!(
            node("").validate(),
            Err(CoreError::MissingField { field: "ip", .. })
        ));
    }

    #[test]
    fn fqdn_is_required_for_registration() {
        assert!(matches!(
            node("10.0.0.5").require_fqdn(),
            Err(CoreError::MissingField { field: "fqdn", .. })
        ));
        let n = node("10.0.0.5").with_fqdn("ise-1.example.com");
        assert_eq!(n.require_fqdn().unwrap(), "ise-1.example.com");
    }

    #[test]
    fn debug_redacts_password() {
        let text = format!("{:?}", node("10.0.0.5"));
        assert!(!text.contains("secret"), "{text}");
        assert!(text.contains("[REDACTED]"));
    }

    #[test]
    fn roles_and_services_are_deduplicated_sets() {
        let n = node("10.0.0.5")
            .with_roles(["SecondaryAdmin", "SecondaryAdmin"])
            .with_services(["Session", "Profiler"]);
        assert_eq!(n.roles_vec(), vec!["SecondaryAdmin"]);
        assert_eq!(n.services_vec(), vec!["Profiler", "Session"]);
    }
}
