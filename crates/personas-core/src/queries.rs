// Node state queries
//
// Read-only probes against a node's own API. All of them are idempotent
// and go through the session's retry policy.

use personas_api::models::DeploymentNode;
use tracing::debug;

use crate::certificate::find_default_certificate_id;
use crate::error::{CoreError, Operation};
use crate::node::Node;
use crate::retry::with_retry;
use crate::session::Session;

/// Role token marking a node that has not joined a deployment yet.
const STANDALONE_ROLE: &str = "standalone";

/// Whether any role is the standalone marker, ignoring case.
pub(crate) fn roles_contain_standalone<S: AsRef<str>>(roles: &[S]) -> bool {
    roles
        .iter()
        .any(|role| role.as_ref().eq_ignore_ascii_case(STANDALONE_ROLE))
}

impl Node {
    /// Fetch this node's deployment record.
    ///
    /// `GET /api/v1/deployment/node/{hostname}`
    pub async fn deployment_details(&self, session: &Session) -> Result<DeploymentNode, CoreError> {
        self.validate()?;
        let client = session.client_for(self)?;
        let operation = Operation::GetNodeDetails;
        with_retry(&session.config().retry, session.cancel_token(), operation, || {
            client.get_deployment_node(&self.hostname)
        })
        .await
        .map_err(|e| CoreError::remote(operation, client.host(), e))
    }

    /// Whether the node still reports the `STANDALONE` role.
    ///
    /// A node with no roles at all is not standalone. Lookup failures are
    /// returned as errors rather than folded into `false`.
    pub async fn is_standalone(&self, session: &Session) -> Result<bool, CoreError> {
        let details = self.deployment_details(session).await?;
        let standalone = roles_contain_standalone(&details.roles);
        debug!(node = self.display_name(), roles = ?details.roles, standalone, "standalone check");
        Ok(standalone)
    }

    /// Whether the node's application server answers.
    ///
    /// Any 2xx from the version endpoint counts as running; the payload is
    /// not inspected. Every failure is an error.
    pub async fn app_server_is_running(&self, session: &Session) -> Result<bool, CoreError> {
        let base_url = self.base_url()?;
        let client = session.client_for(self)?;
        let operation = Operation::AppServerProbe;
        with_retry(&session.config().retry, session.cancel_token(), operation, || {
            client.get_version()
        })
        .await
        .map_err(|e| CoreError::remote(operation, client.host(), e))?;
        debug!(node = self.display_name(), %base_url, "application server is running");
        Ok(true)
    }

    /// Id of the node's default self-signed server certificate, if any.
    ///
    /// `GET /api/v1/certs/system-certificate/{hostname}`
    pub async fn default_certificate_id(
        &self,
        session: &Session,
    ) -> Result<Option<String>, CoreError> {
        self.validate()?;
        let client = session.client_for(self)?;
        let operation = Operation::GetSystemCertificates;
        let certificates =
            with_retry(&session.config().retry, session.cancel_token(), operation, || {
                client.list_system_certificates(&self.hostname)
            })
            .await
            .map_err(|e| CoreError::remote(operation, client.host(), e))?;

        let id = find_default_certificate_id(&certificates).map(String::from);
        debug!(
            node = self.display_name(),
            certificates = certificates.len(),
            found = id.is_some(),
            "default certificate lookup"
        );
        Ok(id)
    }
}
