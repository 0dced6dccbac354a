//! Orchestration entry points.
//!
//! Each workflow takes freshly built [`Node`] values, runs a fixed sequence
//! of node operations, and returns a [`WorkflowReport`] or the first
//! [`CoreError`]. Nothing is shared between invocations.
//!
//! Deployment state moves `STANDALONE -> register -> SECONDARY -> promote
//! -> PRIMARY`; roles and services may be updated from any joined state.

use serde::Serialize;
use strum::Display;
use tracing::info;

use crate::certificate::CertificateImport;
use crate::error::CoreError;
use crate::node::Node;
use crate::session::Session;

/// The orchestration workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Workflow {
    CheckStandalone,
    RegisterNode,
    ExportCertificates,
    PromotePrimary,
    UpdateRolesServices,
}

/// Result of a successful workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub workflow: Workflow,
    /// Hostname of the node the workflow acted on.
    pub node: String,
    /// Hostname of the primary, for workflows that involve one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    /// Whether the workflow changed cluster state.
    pub changed: bool,
    pub message: String,
}

impl WorkflowReport {
    fn new(workflow: Workflow, node: &Node, changed: bool, message: String) -> Self {
        Self {
            workflow,
            node: node.display_name().to_owned(),
            primary: None,
            changed,
            message,
        }
    }

    fn with_primary(mut self, primary: &Node) -> Self {
        self.primary = Some(primary.display_name().to_owned());
        self
    }
}

/// Ensure `node` has not joined a deployment and its application server
/// is up.
pub async fn check_standalone(node: &Node, session: &Session) -> Result<WorkflowReport, CoreError> {
    info!(node = node.display_name(), "checking node is standalone");

    if !node.is_standalone(session).await? {
        return Err(CoreError::NotStandalone {
            hostname: node.hostname.clone(),
        });
    }

    // Any probe failure means the server is not serving; the cause is kept
    // in the message.
    match node.app_server_is_running(session).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(CoreError::AppServerNotRunning {
                hostname: node.hostname.clone(),
                reason: "probe reported not running".into(),
            });
        }
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            return Err(CoreError::AppServerNotRunning {
                hostname: node.hostname.clone(),
                reason: e.to_string(),
            });
        }
    }

    Ok(WorkflowReport::new(
        Workflow::CheckStandalone,
        node,
        false,
        format!(
            "Node {} is standalone and its application server is running",
            node.hostname
        ),
    ))
}

/// Register `node` into the deployment `primary` belongs to.
///
/// The primary's application server must answer first; otherwise the
/// registration call is never made.
pub async fn register_node(
    node: &Node,
    primary: &Node,
    session: &Session,
) -> Result<WorkflowReport, CoreError> {
    info!(
        node = node.display_name(),
        primary = primary.display_name(),
        "registering node"
    );
    node.validate()?;
    node.require_fqdn()?;

    match primary.app_server_is_running(session).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(CoreError::PrimaryNotReady {
                hostname: primary.display_name().to_owned(),
                reason: "application server is not running".into(),
            });
        }
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            return Err(CoreError::PrimaryNotReady {
                hostname: primary.display_name().to_owned(),
                reason: e.to_string(),
            });
        }
    }

    node.register_to_primary(primary, session).await?;

    Ok(WorkflowReport::new(
        Workflow::RegisterNode,
        node,
        true,
        format!(
            "Node {} registered to primary {}",
            node.hostname,
            primary.display_name()
        ),
    )
    .with_primary(primary))
}

/// Copy `node`'s self-signed certificate into `primary`'s trusted store.
pub async fn export_certificates(
    node: &Node,
    primary: &Node,
    session: &Session,
) -> Result<WorkflowReport, CoreError> {
    info!(
        node = node.display_name(),
        primary = primary.display_name(),
        "exporting certificate to primary"
    );

    let report = match node.import_certificate_into_primary(primary, session).await? {
        CertificateImport::Imported {
            certificate_id,
            trusted_name,
        } => WorkflowReport::new(
            Workflow::ExportCertificates,
            node,
            true,
            format!(
                "Certificate {certificate_id} of node {} imported into primary {} as '{trusted_name}'",
                node.hostname,
                primary.display_name()
            ),
        ),
        CertificateImport::CertificateNotFound if session.config().require_default_certificate => {
            return Err(CoreError::CertificateNotFound {
                hostname: node.hostname.clone(),
                friendly_name: crate::certificate::DEFAULT_CERTIFICATE_FRIENDLY_NAME,
            });
        }
        CertificateImport::CertificateNotFound => WorkflowReport::new(
            Workflow::ExportCertificates,
            node,
            false,
            format!(
                "Node {} has no default self-signed certificate; nothing imported",
                node.hostname
            ),
        ),
    };
    Ok(report.with_primary(primary))
}

/// Promote `node` to primary.
pub async fn promote_primary(node: &Node, session: &Session) -> Result<WorkflowReport, CoreError> {
    info!(node = node.display_name(), "promoting node to primary");
    node.promote_to_primary(session).await?;
    Ok(WorkflowReport::new(
        Workflow::PromotePrimary,
        node,
        true,
        format!("Node {} promoted to PRIMARY", node.hostname),
    ))
}

/// Apply `node`'s desired roles and services.
pub async fn update_roles_services(
    node: &Node,
    session: &Session,
) -> Result<WorkflowReport, CoreError> {
    info!(node = node.display_name(), "updating roles and services");
    node.update_roles_services(session).await?;
    Ok(WorkflowReport::new(
        Workflow::UpdateRolesServices,
        node,
        true,
        format!(
            "Node {} updated: roles [{}], services [{}]",
            node.hostname,
            join(&node.roles),
            join(&node.services)
        ),
    ))
}

fn join(set: &std::collections::BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn workflow_names_are_kebab_case() {
        assert_eq!(Workflow::CheckStandalone.to_string(), "check-standalone");
        assert_eq!(Workflow::UpdateRolesServices.to_string(), "update-roles-services");
        assert_eq!(
            serde_json::to_value(Workflow::ExportCertificates).unwrap(),
            serde_json::json!("export-certificates")
        );
    }
}
