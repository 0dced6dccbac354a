//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and a category-specific exit code.

use miette::Diagnostic;
use thiserror::Error;

use personas_config::ConfigError;
use personas_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PRECONDITION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {host}: {message}")]
    #[diagnostic(
        code(personas::connection_failed),
        help(
            "Check that the node is reachable on its management address.\n\
             Verify the `ip` field of the node profile: personas nodes show <node>"
        )
    )]
    ConnectionFailed { host: String, message: String },

    #[error("TLS error: {message}")]
    #[diagnostic(
        code(personas::tls_error),
        help(
            "Nodes present a self-signed certificate until one is installed.\n\
             Use --insecure (-k) to accept it, or configure ca_cert in the node profile."
        )
    )]
    TlsError { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(personas::timeout),
        help("Increase --timeout (probes) or --operation-timeout (register, promote, update).")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed on {host}")]
    #[diagnostic(
        code(personas::auth_failed),
        help(
            "Verify the node's username and password.\n\
             Run: personas nodes set-password <node>"
        )
    )]
    AuthFailed { host: String },

    #[error("No credentials configured for node '{node}'")]
    #[diagnostic(
        code(personas::no_credentials),
        help(
            "Set password_env in the node profile, or store a password with:\n\
             personas nodes set-password {node}"
        )
    )]
    NoCredentials { node: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Node '{name}' not found in configuration")]
    #[diagnostic(
        code(personas::node_not_found),
        help(
            "Available nodes: {available}\n\
             Add one with: personas nodes add <name> --ip <address> --hostname <hostname>"
        )
    )]
    NodeNotFound { name: String, available: String },

    #[error("Node {hostname} has no system certificate named '{friendly_name}'")]
    #[diagnostic(
        code(personas::certificate_not_found),
        help("Pass --allow-missing-certificate to treat this as a no-op.")
    )]
    CertificateNotFound {
        hostname: String,
        friendly_name: String,
    },

    // ── Preconditions ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(personas::precondition))]
    Precondition { message: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Could not update node to PRIMARY")]
    #[diagnostic(code(personas::promotion_failed), help("Node {hostname} answered: {detail}"))]
    PromotionFailed { hostname: String, detail: String },

    #[error("{message}")]
    #[diagnostic(code(personas::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    #[error("Operation cancelled")]
    #[diagnostic(code(personas::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(personas::validation))]
    Validation { field: String, reason: String },

    #[error("No primary node specified")]
    #[diagnostic(
        code(personas::no_primary),
        help(
            "Pass --primary <node>, or set a default with: personas nodes use <node>"
        )
    )]
    NoPrimary,

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(personas::config))]
    Config(Box<figment::Error>),

    #[error("{message}")]
    #[diagnostic(code(personas::keyring))]
    Keyring { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Cluster-changing operation '{action}' requires confirmation")]
    #[diagnostic(
        code(personas::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Aborted")]
    #[diagnostic(code(personas::aborted))]
    Aborted,

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render output: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NodeNotFound { .. } | Self::CertificateNotFound { .. } => exit_code::NOT_FOUND,
            Self::ApiError {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::Precondition { .. } => exit_code::PRECONDITION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Cancelled => exit_code::CANCELLED,
            Self::Validation { .. } | Self::NoPrimary | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_cancelled() {
            return Self::Cancelled;
        }
        if err.is_timeout() {
            return Self::Timeout {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::PromotionFailed { hostname, source } => Self::PromotionFailed {
                hostname,
                detail: source.to_string(),
            },

            CoreError::NotStandalone { .. }
            | CoreError::AppServerNotRunning { .. }
            | CoreError::PrimaryNotReady { .. } => Self::Precondition {
                message: err.to_string(),
            },

            CoreError::CertificateNotFound {
                hostname,
                friendly_name,
            } => Self::CertificateNotFound {
                hostname,
                friendly_name: friendly_name.into(),
            },

            CoreError::MissingField { node, field } => Self::Validation {
                field: format!("nodes.{node}.{field}"),
                reason: "must not be empty".into(),
            },

            CoreError::InvalidAddress {
                node,
                address,
                reason,
            } => Self::Validation {
                field: format!("nodes.{node}.ip"),
                reason: format!("'{address}': {reason}"),
            },

            CoreError::Tls { message } => Self::TlsError { message },

            CoreError::Remote { ref host, .. } | CoreError::Passthrough { ref host, .. }
                if err.is_unauthorized() =>
            {
                Self::AuthFailed { host: host.clone() }
            }

            CoreError::Remote { ref host, .. } | CoreError::Passthrough { ref host, .. }
                if err.is_connection_failure() =>
            {
                Self::ConnectionFailed {
                    host: host.clone(),
                    message: err.to_string(),
                }
            }

            other => Self::ApiError {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { node } => Self::NoCredentials { node },
            ConfigError::UnknownNode { name, available } => Self::NodeNotFound { name, available },
            ConfigError::NoPrimary => Self::NoPrimary,
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
            ConfigError::Keyring(e) => Self::Keyring {
                message: format!("keyring error: {e}"),
            },
            ConfigError::Serialization(e) => Self::Internal(format!("failed to write config: {e}")),
        }
    }
}
