// Certificate endpoints
//
// System certificate listing/export on the joining node, trusted
// certificate import on the primary.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::client::NodeClient;
use crate::error::Error;
use crate::models::{
    ExportSystemCertificateRequest, ImportTrustedCertificateRequest,
    ImportTrustedCertificateResponse, SystemCertificate,
};

const SYSTEM_CERTIFICATE_PATH: &str = "/api/v1/certs/system-certificate";
const SYSTEM_CERTIFICATE_EXPORT_PATH: &str = "/api/v1/certs/system-certificate/export";
const TRUSTED_CERTIFICATE_IMPORT_PATH: &str = "/api/v1/certs/trusted-certificate/import";

impl NodeClient {
    /// List the system certificates installed on a node.
    ///
    /// `GET /api/v1/certs/system-certificate/{hostname}`
    pub async fn list_system_certificates(
        &self,
        hostname: &str,
    ) -> Result<Vec<SystemCertificate>, Error> {
        debug!(hostname, "listing system certificates");
        self.get_item(SYSTEM_CERTIFICATE_PATH, hostname).await
    }

    /// Export a system certificate. The node answers with a ZIP archive.
    ///
    /// `POST /api/v1/certs/system-certificate/export`
    pub async fn export_system_certificate(
        &self,
        request: &ExportSystemCertificateRequest,
    ) -> Result<Bytes, Error> {
        debug!(id = %request.id, export = %request.export, "exporting system certificate");
        let resp = self
            .post_raw(SYSTEM_CERTIFICATE_EXPORT_PATH, request)
            .await?;
        debug!(
            status = resp.status.as_u16(),
            content_type = ?resp.headers.get(CONTENT_TYPE),
            bytes = resp.body.len(),
            "certificate bundle received"
        );
        Ok(resp.body)
    }

    /// Import a certificate into this node's trusted store.
    ///
    /// `POST /api/v1/certs/trusted-certificate/import`
    pub async fn import_trusted_certificate(
        &self,
        request: &ImportTrustedCertificateRequest,
    ) -> Result<ImportTrustedCertificateResponse, Error> {
        debug!(name = %request.name, "importing trusted certificate");
        let resp = self
            .post_raw(TRUSTED_CERTIFICATE_IMPORT_PATH, request)
            .await?;
        if resp.body.is_empty() {
            return Ok(ImportTrustedCertificateResponse::default());
        }
        // The import already happened; an unexpected body shape is not a failure.
        Ok(resp.json().unwrap_or_default())
    }
}
