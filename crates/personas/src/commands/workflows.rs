//! Workflow command handlers.
//!
//! Each handler resolves node profiles into `Node` values, runs one
//! `personas_core::workflow` entry point, and renders its report.

use std::fmt::Write as _;

use personas_core::{Session, WorkflowReport, workflow};

use crate::cli::{ExportCertsArgs, GlobalOpts, NodeArg, PrimaryArgs, UpdateRolesArgs};
use crate::commands::util;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

fn render_report(report: &WorkflowReport, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, report, detail, |r| r.message.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(report: &WorkflowReport) -> String {
    let mut out = String::new();
    let mark = if report.changed { "✓" } else { "•" };
    let _ = writeln!(out, "{mark} {}", report.message);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Workflow:  {}", report.workflow);
    let _ = writeln!(out, "  Node:      {}", report.node);
    if let Some(ref primary) = report.primary {
        let _ = writeln!(out, "  Primary:   {primary}");
    }
    let _ = write!(out, "  Changed:   {}", report.changed);
    out
}

pub async fn check_standalone(
    args: NodeArg,
    cfg: &Config,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let node = config::resolve_node(cfg, &args.node, global)?;
    let report = util::with_spinner(
        format!("Checking {}", node.display_name()),
        global.quiet,
        workflow::check_standalone(&node, session),
    )
    .await?;
    render_report(&report, global)
}

pub async fn register(
    args: PrimaryArgs,
    cfg: &Config,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let node = config::resolve_node(cfg, &args.node, global)?;
    let primary_name = cfg.primary_name(args.primary.as_deref())?;
    let primary = config::resolve_node(cfg, &primary_name, global)?;

    util::confirm(
        &format!(
            "Register {} into the deployment of {}?",
            node.display_name(),
            primary.display_name()
        ),
        "register",
        global.yes,
    )?;

    let report = util::with_spinner(
        format!("Registering {} to {}", node.display_name(), primary.display_name()),
        global.quiet,
        workflow::register_node(&node, &primary, session),
    )
    .await?;
    render_report(&report, global)
}

pub async fn export_certs(
    args: ExportCertsArgs,
    cfg: &Config,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let node = config::resolve_node(cfg, &args.target.node, global)?;
    let primary_name = cfg.primary_name(args.target.primary.as_deref())?;
    let primary = config::resolve_node(cfg, &primary_name, global)?;

    let report = util::with_spinner(
        format!(
            "Importing certificate of {} into {}",
            node.display_name(),
            primary.display_name()
        ),
        global.quiet,
        workflow::export_certificates(&node, &primary, session),
    )
    .await?;
    render_report(&report, global)
}

pub async fn promote(
    args: NodeArg,
    cfg: &Config,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let node = config::resolve_node(cfg, &args.node, global)?;

    util::confirm(
        &format!("Promote {} to PRIMARY?", node.display_name()),
        "promote",
        global.yes,
    )?;

    let report = util::with_spinner(
        format!("Promoting {}", node.display_name()),
        global.quiet,
        workflow::promote_primary(&node, session),
    )
    .await?;
    render_report(&report, global)
}

pub async fn update_roles(
    args: UpdateRolesArgs,
    cfg: &Config,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut node = config::resolve_node(cfg, &args.node, global)?;
    if !args.roles.is_empty() {
        node = node.with_roles(args.roles);
    }
    if !args.services.is_empty() {
        node = node.with_services(args.services);
    }

    util::confirm(
        &format!(
            "Replace roles/services of {} with [{}] / [{}]?",
            node.display_name(),
            node.roles.iter().cloned().collect::<Vec<_>>().join(", "),
            node.services.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
        "update-roles",
        global.yes,
    )?;

    let report = util::with_spinner(
        format!("Updating {}", node.display_name()),
        global.quiet,
        workflow::update_roles_services(&node, session),
    )
    .await?;
    render_report(&report, global)
}
