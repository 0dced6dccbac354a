//! CLI configuration: thin wrapper around `personas_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--config,
//! --insecure, --ca-cert, timeouts, retries).

use std::path::PathBuf;
use std::time::Duration;

use personas_core::{ClusterConfig, Node, RetryPolicy, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use personas_config::{Config, NodeProfile};

/// The config file this invocation reads and writes.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(personas_config::config_path)
}

/// Load the config file selected by `--config` (or the default path).
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(personas_config::load_config_from(&config_file(global))?)
}

/// Write `cfg` back to the selected config file.
pub fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    Ok(personas_config::save_config_to(cfg, &config_file(global))?)
}

/// Build a `Node` from its profile, applying TLS flag overrides.
pub fn resolve_node(cfg: &Config, name: &str, global: &GlobalOpts) -> Result<Node, CliError> {
    let profile = cfg.node(name)?;
    let mut node = personas_config::node_from_profile(profile, name, global.insecure)?;
    if !global.insecure {
        if let Some(ref ca) = global.ca_cert {
            node = node.with_tls(TlsVerification::CustomCa(ca.clone()));
        }
    }
    Ok(node)
}

/// Translate `[defaults]` + global flags into the core's runtime settings.
///
/// Flags take priority over config values.
pub fn cluster_config(cfg: &Config, global: &GlobalOpts) -> Result<ClusterConfig, CliError> {
    let mut cluster = personas_config::cluster_config(&cfg.defaults)?;

    if global.insecure {
        cluster.tls = TlsVerification::DangerAcceptInvalid;
    } else if let Some(ref ca) = global.ca_cert {
        cluster.tls = TlsVerification::CustomCa(ca.clone());
    }

    if let Some(secs) = global.timeout {
        cluster.timeout = flag_timeout("--timeout", secs)?;
    }
    if let Some(secs) = global.operation_timeout {
        cluster.operation_timeout = flag_timeout("--operation-timeout", secs)?;
    }
    if let Some(retries) = global.retries {
        cluster.retry = RetryPolicy {
            max_attempts: retries.saturating_add(1),
            ..cluster.retry
        };
    }
    Ok(cluster)
}

fn flag_timeout(flag: &str, secs: u64) -> Result<Duration, CliError> {
    if (1..=3600).contains(&secs) {
        Ok(Duration::from_secs(secs))
    } else {
        Err(CliError::Validation {
            field: flag.into(),
            reason: format!("{secs}s is outside the allowed 1-3600s range"),
        })
    }
}
