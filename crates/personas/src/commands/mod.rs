//! Command dispatch: bridges CLI args -> core workflows -> output formatting.

pub mod nodes;
pub mod util;
pub mod workflows;

use personas_core::Session;
use tokio_util::sync::CancellationToken;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a workflow command to its handler.
pub async fn dispatch(
    cmd: Command,
    global: &GlobalOpts,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let mut cluster = config::cluster_config(&cfg, global)?;
    if let Command::ExportCerts(ref args) = cmd {
        if args.allow_missing_certificate {
            cluster.require_default_certificate = false;
        }
    }
    let session = Session::new(cluster).with_cancellation(cancel);

    match cmd {
        Command::CheckStandalone(args) => {
            workflows::check_standalone(args, &cfg, &session, global).await
        }
        Command::Register(args) => workflows::register(args, &cfg, &session, global).await,
        Command::ExportCerts(args) => workflows::export_certs(args, &cfg, &session, global).await,
        Command::Promote(args) => workflows::promote(args, &cfg, &session, global).await,
        Command::UpdateRoles(args) => workflows::update_roles(args, &cfg, &session, global).await,
        Command::Nodes(_) | Command::Completions(_) => Err(CliError::Internal(
            "command is handled before workflow dispatch".into(),
        )),
    }
}
