// Deployment endpoints
//
// Node registration, persona updates, and primary promotion.

use tracing::debug;

use crate::client::NodeClient;
use crate::error::Error;
use crate::models::{DeploymentNode, RegisterNodeRequest, UpdateNodeRequest};

const DEPLOYMENT_NODE_PATH: &str = "/api/v1/deployment/node";
const DEPLOYMENT_PRIMARY_PATH: &str = "/api/v1/deployment/primary";

impl NodeClient {
    /// Get a node's deployment details (roles, services, status).
    ///
    /// `GET /api/v1/deployment/node/{hostname}`
    pub async fn get_deployment_node(&self, hostname: &str) -> Result<DeploymentNode, Error> {
        debug!(hostname, "fetching deployment node");
        self.get_item(DEPLOYMENT_NODE_PATH, hostname).await
    }

    /// Register a node into the deployment this client's node is primary of.
    ///
    /// `POST /api/v1/deployment/node`
    pub async fn register_node(&self, request: &RegisterNodeRequest) -> Result<(), Error> {
        debug!(fqdn = %request.fqdn, roles = ?request.roles, "registering node");
        self.post_raw(DEPLOYMENT_NODE_PATH, request).await?;
        Ok(())
    }

    /// Replace the roles and services of this client's node.
    ///
    /// `PUT /api/v1/deployment/node`
    pub async fn update_deployment_node(&self, request: &UpdateNodeRequest) -> Result<(), Error> {
        debug!(roles = ?request.roles, services = ?request.services, "updating node persona");
        self.put(DEPLOYMENT_NODE_PATH, request).await?;
        Ok(())
    }

    /// Promote this client's node to primary.
    ///
    /// `POST /api/v1/deployment/primary` with an empty body.
    pub async fn promote_to_primary(&self) -> Result<(), Error> {
        debug!("promoting node to primary");
        self.post_empty(DEPLOYMENT_PRIMARY_PATH).await?;
        Ok(())
    }
}
