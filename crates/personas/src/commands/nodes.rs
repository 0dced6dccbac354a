//! Node profile handlers.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{AddNodeArgs, GlobalOpts, NodesArgs, NodesCommand};
use crate::config::{self, Config, NodeProfile};
use crate::error::CliError;
use crate::output;

// ── Display types ───────────────────────────────────────────────────

/// A node profile without its secret.
#[derive(Debug, Serialize)]
struct NodeSummary {
    name: String,
    ip: String,
    hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fqdn: Option<String>,
    username: String,
    roles: Vec<String>,
    services: Vec<String>,
    password_source: String,
    default_primary: bool,
}

impl NodeSummary {
    fn new(name: &str, profile: &NodeProfile, cfg: &Config) -> Self {
        Self {
            name: name.into(),
            ip: profile.ip.clone(),
            hostname: profile.hostname.clone(),
            fqdn: profile.fqdn.clone(),
            username: profile.username.clone(),
            roles: profile.roles.clone(),
            services: profile.services.clone(),
            password_source: password_source(profile),
            default_primary: cfg.default_primary.as_deref() == Some(name),
        }
    }
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    ip: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Roles")]
    roles: String,
    #[tabled(rename = "Services")]
    services: String,
    #[tabled(rename = "Primary")]
    primary: String,
}

fn row(n: &NodeSummary) -> NodeRow {
    NodeRow {
        name: n.name.clone(),
        ip: n.ip.clone(),
        hostname: n.hostname.clone(),
        roles: n.roles.join(", "),
        services: n.services.join(", "),
        primary: if n.default_primary { "*".into() } else { String::new() },
    }
}

/// Where the password will come from, without resolving it.
fn password_source(profile: &NodeProfile) -> String {
    if let Some(ref var) = profile.password_env {
        format!("env:{var}")
    } else if profile.password.is_some() {
        "plaintext".into()
    } else {
        "keyring".into()
    }
}

fn detail(n: &NodeSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:        {}", n.name);
    let _ = writeln!(out, "Address:     {}", n.ip);
    let _ = writeln!(out, "Hostname:    {}", n.hostname);
    let _ = writeln!(out, "FQDN:        {}", n.fqdn.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Username:    {}", n.username);
    let _ = writeln!(out, "Password:    {}", n.password_source);
    let _ = writeln!(out, "Roles:       {}", n.roles.join(", "));
    let _ = writeln!(out, "Services:    {}", n.services.join(", "));
    let _ = write!(out, "Primary:     {}", n.default_primary);
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: NodesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;

    match args.command {
        NodesCommand::List => {
            let nodes: Vec<NodeSummary> = cfg
                .nodes
                .iter()
                .map(|(name, profile)| NodeSummary::new(name, profile, &cfg))
                .collect();
            let out = output::render_list(&global.output, &nodes, row, |n| n.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Show { name } => {
            let summary = NodeSummary::new(&name, cfg.node(&name)?, &cfg);
            let out = output::render_single(&global.output, &summary, detail, |n| n.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Add(add) => {
            let name = add.name.clone();
            let replaced = cfg.nodes.insert(name.clone(), profile_from_args(add)).is_some();
            cfg.validate()?;
            config::save(&cfg, global)?;
            if !global.quiet {
                let verb = if replaced { "updated" } else { "added" };
                eprintln!(
                    "✓ Node '{name}' {verb} in {}",
                    config::config_file(global).display()
                );
            }
            Ok(())
        }

        NodesCommand::Use { name } => {
            cfg.node(&name)?;
            cfg.default_primary = Some(name.clone());
            config::save(&cfg, global)?;
            if !global.quiet {
                eprintln!("✓ Default primary set to '{name}'");
            }
            Ok(())
        }

        NodesCommand::SetPassword { name } => {
            cfg.node(&name)?;
            let password = dialoguer::Password::new()
                .with_prompt(format!("Password for {name}"))
                .interact()
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "cannot be empty".into(),
                });
            }
            personas_config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("✓ Password for '{name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

fn profile_from_args(add: AddNodeArgs) -> NodeProfile {
    NodeProfile {
        ip: add.ip,
        hostname: add.hostname,
        fqdn: add.fqdn,
        username: add.username,
        password: None,
        password_env: add.password_env,
        roles: add.roles,
        services: add.services,
        ca_cert: add.ca_cert,
        insecure: add.node_insecure.then_some(true),
    }
}
