//! Clap derive structures for the `personas` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// personas -- bootstrap and promote appliance cluster nodes
#[derive(Debug, Parser)]
#[command(
    name = "personas",
    version,
    about = "Bootstrap appliance cluster personas from the command line",
    long_about = "Drives the node lifecycle of a multi-node appliance deployment:\n\
        standalone checks, registration to a primary, certificate exchange,\n\
        promotion to primary, and role/service updates.\n\n\
        Nodes are defined as named profiles in the config file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "PERSONAS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PERSONAS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates (self-signed bootstrap certificates)
    #[arg(long, short = 'k', env = "PERSONAS_INSECURE", global = true)]
    pub insecure: bool,

    /// CA certificate used to verify every node
    #[arg(long, global = true, value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Probe timeout in seconds (overrides config)
    #[arg(long, env = "PERSONAS_TIMEOUT", global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Timeout for register/promote/update/import calls in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub operation_timeout: Option<u64>,

    /// Retries for read-only probes on transient failures
    #[arg(long, global = true)]
    pub retries: Option<u32>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify a node is standalone and its application server is running
    #[command(alias = "check")]
    CheckStandalone(NodeArg),

    /// Register a node into the deployment of a primary
    Register(PrimaryArgs),

    /// Import a node's self-signed certificate into the primary's trusted store
    ExportCerts(ExportCertsArgs),

    /// Promote a node to primary
    Promote(NodeArg),

    /// Replace a node's roles and services
    UpdateRoles(UpdateRolesArgs),

    /// Manage node profiles
    #[command(alias = "n")]
    Nodes(NodesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WORKFLOWS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NodeArg {
    /// Node profile name
    pub node: String,
}

#[derive(Debug, Args)]
pub struct PrimaryArgs {
    /// Node profile name
    pub node: String,

    /// Primary node profile (defaults to `default_primary`)
    #[arg(long, short = 'P')]
    pub primary: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportCertsArgs {
    #[command(flatten)]
    pub target: PrimaryArgs,

    /// Succeed without importing when the node has no default self-signed certificate
    #[arg(long)]
    pub allow_missing_certificate: bool,
}

#[derive(Debug, Args)]
pub struct UpdateRolesArgs {
    /// Node profile name
    pub node: String,

    /// Desired role (repeatable; replaces the profile's roles)
    #[arg(long = "role", short = 'r', value_name = "ROLE")]
    pub roles: Vec<String>,

    /// Desired service (repeatable; replaces the profile's services)
    #[arg(long = "service", short = 's', value_name = "SERVICE")]
    pub services: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NODES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List configured nodes
    #[command(alias = "ls")]
    List,

    /// Show one node profile
    Show {
        /// Node profile name
        name: String,
    },

    /// Add or replace a node profile
    Add(AddNodeArgs),

    /// Set the default primary node
    Use {
        /// Node profile name
        name: String,
    },

    /// Store a node's password in the system keyring
    SetPassword {
        /// Node profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct AddNodeArgs {
    /// Profile name
    pub name: String,

    /// Management address (host[:port] or URL)
    #[arg(long)]
    pub ip: String,

    /// Cluster hostname
    #[arg(long)]
    pub hostname: String,

    /// Fully qualified domain name (needed to register the node)
    #[arg(long)]
    pub fqdn: Option<String>,

    /// Admin username
    #[arg(long, default_value = "admin")]
    pub username: String,

    /// Environment variable holding the password
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Role (repeatable)
    #[arg(long = "role", value_name = "ROLE")]
    pub roles: Vec<String>,

    /// Service (repeatable)
    #[arg(long = "service", value_name = "SERVICE")]
    pub services: Vec<String>,

    /// CA certificate for this node
    #[arg(long = "node-ca-cert", value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate validation for this node
    #[arg(long = "node-insecure")]
    pub node_insecure: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_roles_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "personas",
            "update-roles",
            "ise-2",
            "--role",
            "SecondaryAdmin",
            "-s",
            "Session",
            "-s",
            "Profiler",
        ])
        .unwrap();
        match cli.command {
            Command::UpdateRoles(args) => {
                assert_eq!(args.roles, vec!["SecondaryAdmin"]);
                assert_eq!(args.services, vec!["Session", "Profiler"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
