// ── Workflow session ──
//
// Carries what every call of one workflow run shares: transport tuning,
// retry policy, and the cancellation token. Clients are built per target
// node and dropped when the call returns; no connection or credential is
// cached across runs.

use personas_api::NodeClient;
use tokio_util::sync::CancellationToken;

use crate::config::ClusterConfig;
use crate::error::CoreError;
use crate::node::Node;

/// Shared context for one workflow run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: ClusterConfig,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token (e.g. cancelled on Ctrl-C).
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Build a client addressed at `target`, authenticating as
    /// `credentials`.
    ///
    /// These differ only for registration, which is sent to the primary
    /// but authenticated as the joining node.
    pub(crate) fn client(&self, target: &Node, credentials: &Node) -> Result<NodeClient, CoreError> {
        let base_url = target.base_url()?;
        let transport = self.config.transport(target.tls.as_ref());
        let client = NodeClient::new(
            base_url,
            credentials.username.clone(),
            credentials.password.clone(),
            &transport,
        )?;
        Ok(client.with_cancellation(self.cancel.clone()))
    }

    /// Client for `node`'s own API with its own credentials.
    pub(crate) fn client_for(&self, node: &Node) -> Result<NodeClient, CoreError> {
        self.client(node, node)
    }
}
