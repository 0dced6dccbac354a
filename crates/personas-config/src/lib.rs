//! Node profiles for the `personas` CLI.
//!
//! TOML node profiles, layered loading (defaults, file, `PERSONAS_`
//! environment), credential resolution (env, keyring, plaintext), and
//! translation into `personas_core::Node` / `ClusterConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use personas_core::{ClusterConfig, CoreError, Node, RetryPolicy, TlsVerification};

/// Keyring service name under which node passwords are stored.
pub const KEYRING_SERVICE: &str = "personas";

/// Accepted range for both timeouts, in seconds.
const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

/// Range the appliance documents for cluster-changing calls.
const RECOMMENDED_OPERATION_TIMEOUT: std::ops::RangeInclusive<u64> = 60..=600;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for node '{node}'")]
    NoCredentials { node: String },

    #[error("node '{name}' not found in configuration")]
    UnknownNode { name: String, available: String },

    #[error("no primary node given and no default_primary configured")]
    NoPrimary,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Node used as `--primary` when the flag is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_primary: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named node profiles.
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Probe timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Timeout for register/promote/update/import calls, in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Retries after the first attempt for read-only probes.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_true")]
    pub require_default_certificate: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            operation_timeout: default_operation_timeout(),
            insecure: false,
            retries: default_retries(),
            require_default_certificate: true,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_operation_timeout() -> u64 {
    600
}
fn default_retries() -> u32 {
    2
}
fn default_true() -> bool {
    true
}

/// A named appliance node.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeProfile {
    /// Management address: host[:port], `[v6]`, or an `http(s)://` URL.
    pub ip: String,

    /// Cluster hostname.
    pub hostname: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password (prefer keyring or `password_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub services: Vec<String>,

    /// Path to a CA certificate used to verify this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override the global insecure setting for this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
}

fn default_username() -> String {
    "admin".into()
}

impl Config {
    /// Look up a node profile by name.
    pub fn node(&self, name: &str) -> Result<&NodeProfile, ConfigError> {
        self.nodes.get(name).ok_or_else(|| ConfigError::UnknownNode {
            name: name.into(),
            available: self.node_names(),
        })
    }

    /// Comma-separated profile names, or `(none)`.
    pub fn node_names(&self) -> String {
        if self.nodes.is_empty() {
            "(none)".into()
        } else {
            self.nodes.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }

    /// The primary to use: the explicit name, else `default_primary`.
    pub fn primary_name(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        explicit
            .map(String::from)
            .or_else(|| self.default_primary.clone())
            .ok_or(ConfigError::NoPrimary)
    }

    /// Check value ranges and required node fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_timeout("defaults.timeout", self.defaults.timeout)?;
        check_timeout("defaults.operation_timeout", self.defaults.operation_timeout)?;
        if !RECOMMENDED_OPERATION_TIMEOUT.contains(&self.defaults.operation_timeout) {
            warn!(
                operation_timeout = self.defaults.operation_timeout,
                "operation timeout outside the recommended 60-600s range"
            );
        }

        for (name, profile) in &self.nodes {
            if profile.ip.trim().is_empty() {
                return Err(missing(name, "ip"));
            }
            if profile.hostname.trim().is_empty() {
                return Err(missing(name, "hostname"));
            }
        }
        Ok(())
    }
}

fn check_timeout(field: &str, secs: u64) -> Result<(), ConfigError> {
    if TIMEOUT_RANGE.contains(&secs) {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("{secs}s is outside the allowed 1-3600s range"),
        })
    }
}

fn missing(node: &str, field: &str) -> ConfigError {
    ConfigError::Validation {
        field: format!("nodes.{node}.{field}"),
        reason: "must not be empty".into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "personas", "personas").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("personas");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PERSONAS_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(node_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{node_name}/password"))
}

/// Resolve a node's password: `password_env`, then keyring, then plaintext.
pub fn resolve_password(profile: &NodeProfile, node_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
        debug!(node = node_name, env = %env_name, "password env var not set");
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(node_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        node: node_name.into(),
    })
}

/// Store a node's password in the system keyring.
pub fn store_password(node_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(node_name)?.set_password(password)?;
    Ok(())
}

// ── Translation into core types ─────────────────────────────────────

/// Build a `Node` from a profile, resolving its password.
///
/// `insecure` forces certificate validation off for this node regardless
/// of the profile.
pub fn node_from_profile(
    profile: &NodeProfile,
    node_name: &str,
    insecure: bool,
) -> Result<Node, ConfigError> {
    let password = resolve_password(profile, node_name)?;

    let mut node = Node::new(
        node_name,
        profile.ip.clone(),
        profile.hostname.clone(),
        profile.username.clone(),
        password,
    )
    .with_roles(profile.roles.iter().cloned())
    .with_services(profile.services.iter().cloned());

    if let Some(ref fqdn) = profile.fqdn {
        node = node.with_fqdn(fqdn.clone());
    }

    if insecure || profile.insecure.unwrap_or(false) {
        node = node.with_tls(TlsVerification::DangerAcceptInvalid);
    } else if let Some(ref ca_path) = profile.ca_cert {
        node = node.with_tls(TlsVerification::CustomCa(ca_path.clone()));
    } else if profile.insecure == Some(false) {
        node = node.with_tls(TlsVerification::SystemDefaults);
    }

    node.validate().map_err(|e| match e {
        CoreError::MissingField { field, .. } => missing(node_name, field),
        other => ConfigError::Validation {
            field: format!("nodes.{node_name}"),
            reason: other.to_string(),
        },
    })?;
    Ok(node)
}

/// Translate `[defaults]` into the core's runtime settings.
pub fn cluster_config(defaults: &Defaults) -> Result<ClusterConfig, ConfigError> {
    check_timeout("timeout", defaults.timeout)?;
    check_timeout("operation_timeout", defaults.operation_timeout)?;

    let tls = if defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ClusterConfig {
        tls,
        timeout: Duration::from_secs(defaults.timeout),
        operation_timeout: Duration::from_secs(defaults.operation_timeout),
        retry: RetryPolicy {
            max_attempts: defaults.retries.saturating_add(1),
            ..RetryPolicy::default()
        },
        require_default_certificate: defaults.require_default_certificate,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"
default_primary = "ise-1"

[defaults]
timeout = 20
operation_timeout = 300
retries = 4

[nodes.ise-1]
ip = "10.0.0.1"
hostname = "ise-1"
fqdn = "ise-1.example.com"
password = "primary-pw"
roles = ["PrimaryAdmin"]

[nodes.ise-2]
ip = "10.0.0.2"
hostname = "ise-2"
username = "operator"
password = "node-pw"
roles = ["SecondaryAdmin"]
services = ["Session", "Profiler"]
ca_cert = "/etc/ssl/ise-ca.pem"
"#;

    #[test]
    fn loads_profiles_and_defaults() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();

        assert_eq!(config.default_primary.as_deref(), Some("ise-1"));
        assert_eq!(config.defaults.timeout, 20);
        assert_eq!(config.defaults.retries, 4);
        assert!(config.defaults.require_default_certificate);
        assert_eq!(config.node_names(), "ise-1, ise-2");

        let ise2 = config.node("ise-2").unwrap();
        assert_eq!(ise2.username, "operator");
        assert_eq!(ise2.services, vec!["Session", "Profiler"]);
        assert_eq!(config.node("ise-1").unwrap().username, "admin");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.nodes.is_empty());
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.defaults.operation_timeout, 600);
        assert_eq!(config.node_names(), "(none)");
    }

    #[test]
    fn rejects_out_of_range_timeout() {
        let file = write_config("[defaults]\ntimeout = 0\n");
        match load_config_from(file.path()) {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "defaults.timeout"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_node_without_hostname() {
        let file = write_config("[nodes.bad]\nip = \"10.0.0.9\"\nhostname = \"\"\n");
        match load_config_from(file.path()) {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "nodes.bad.hostname"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn unknown_node_lists_available() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();
        match config.node("ise-9") {
            Err(ConfigError::UnknownNode { name, available }) => {
                assert_eq!(name, "ise-9");
                assert_eq!(available, "ise-1, ise-2");
            }
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn primary_name_prefers_explicit() {
        let mut config = Config::default();
        assert!(matches!(config.primary_name(None), Err(ConfigError::NoPrimary)));
        config.default_primary = Some("ise-1".into());
        assert_eq!(config.primary_name(None).unwrap(), "ise-1");
        assert_eq!(config.primary_name(Some("ise-3")).unwrap(), "ise-3");
    }

    #[test]
    fn password_env_takes_precedence() {
        let profile = NodeProfile {
            password_env: Some("PATH".into()),
            password: Some("plaintext".into()),
            ..NodeProfile::default()
        };
        let resolved = resolve_password(&profile, "personas-test-env-node").unwrap();
        assert_eq!(resolved.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn unset_password_env_falls_back_to_plaintext() {
        let profile = NodeProfile {
            password_env: Some("PERSONAS_TEST_SURELY_UNSET_PASSWORD".into()),
            password: Some("plaintext".into()),
            ..NodeProfile::default()
        };
        let resolved = resolve_password(&profile, "personas-test-plain-node").unwrap();
        assert_eq!(resolved.expose_secret(), "plaintext");
    }

    #[test]
    fn missing_credentials_error() {
        let profile = NodeProfile::default();
        match resolve_password(&profile, "personas-test-no-creds") {
            Err(ConfigError::NoCredentials { node }) => assert_eq!(node, "personas-test-no-creds"),
            other => panic!("expected NoCredentials, got {other:?}"),
        }
    }

    #[test]
    fn profile_translates_into_node() {
        let file = write_config(SAMPLE);
        let config = load_config_from(file.path()).unwrap();

        let node = node_from_profile(config.node("ise-2").unwrap(), "ise-2", false).unwrap();
        assert_eq!(node.hostname, "ise-2");
        assert_eq!(node.username, "operator");
        assert_eq!(node.password.expose_secret(), "node-pw");
        assert!(node.services.contains("Profiler"));
        assert_eq!(
            node.tls,
            Some(TlsVerification::CustomCa("/etc/ssl/ise-ca.pem".into()))
        );

        let forced = node_from_profile(config.node("ise-2").unwrap(), "ise-2", true).unwrap();
        assert_eq!(forced.tls, Some(TlsVerification::DangerAcceptInvalid));

        let primary = node_from_profile(config.node("ise-1").unwrap(), "ise-1", false).unwrap();
        assert_eq!(primary.fqdn.as_deref(), Some("ise-1.example.com"));
        assert_eq!(primary.tls, None);
    }

    #[test]
    fn defaults_translate_into_cluster_config() {
        let defaults = Defaults {
            timeout: 10,
            operation_timeout: 120,
            insecure: true,
            retries: 0,
            require_default_certificate: false,
        };
        let cluster = cluster_config(&defaults).unwrap();
        assert_eq!(cluster.timeout, Duration::from_secs(10));
        assert_eq!(cluster.operation_timeout, Duration::from_secs(120));
        assert_eq!(cluster.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cluster.retry.max_attempts, 1);
        assert!(!cluster.require_default_certificate);
    }

    #[test]
    fn save_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config {
            default_primary: Some("ise-1".into()),
            ..Config::default()
        };
        config.nodes.insert(
            "ise-1".into(),
            NodeProfile {
                ip: "10.0.0.1".into(),
                hostname: "ise-1".into(),
                username: "admin".into(),
                password_env: Some("ISE1_PASSWORD".into()),
                roles: vec!["PrimaryAdmin".into()],
                ..NodeProfile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[nodes.ise-1]"), "{text}");
        assert!(!text.contains("password ="), "{text}");

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.node("ise-1").unwrap().password_env.as_deref(), Some("ISE1_PASSWORD"));
    }
}
