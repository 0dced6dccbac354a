// Legacy ERS system endpoints

use tracing::debug;

use crate::client::NodeClient;
use crate::error::Error;

const VERSION_PATH: &str = "/ers/config/op/systemconfig/iseversion";

impl NodeClient {
    /// Probe the application server through the ERS version endpoint.
    ///
    /// `GET /ers/config/op/systemconfig/iseversion`
    ///
    /// Only the status matters: any 2xx means the application server is up.
    /// The payload is returned loosely typed because its shape varies by
    /// release.
    pub async fn get_version(&self) -> Result<serde_json::Value, Error> {
        debug!("probing application server");
        let resp = self.get_raw(VERSION_PATH).await?;
        Ok(serde_json::from_slice(&resp.body).unwrap_or(serde_json::Value::Null))
    }
}
