// Node mutation operations
//
// Calls that change cluster state. None of them are retried: registering
// or promoting a node that already transitioned fails, so a blind resend
// would turn a slow success into an error.

use personas_api::models::{
    ExportSystemCertificateRequest, ImportTrustedCertificateRequest, RegisterNodeRequest,
    UpdateNodeRequest,
};
use tracing::{debug, info};

use crate::certificate::{CertificateImport, decode_utf8, extract_pem, trusted_certificate_name};
use crate::error::{CoreError, Operation};
use crate::node::Node;
use crate::session::Session;

impl Node {
    /// Register this node into the deployment `primary` belongs to.
    ///
    /// The request goes to the primary's address but authenticates with
    /// this node's credentials.
    ///
    /// `POST /api/v1/deployment/node`
    pub async fn register_to_primary(
        &self,
        primary: &Node,
        session: &Session,
    ) -> Result<(), CoreError> {
        self.validate()?;
        let fqdn = self.require_fqdn()?;
        let client = session.client(primary, self)?;

        let request = RegisterNodeRequest {
            fqdn: fqdn.to_owned(),
            user_name: self.username.clone(),
            password: self.password_plain().to_owned(),
            allow_cert_import: true,
            roles: self.roles_vec(),
            services: self.services_vec(),
        };

        client
            .register_node(&request)
            .await
            .map_err(|e| CoreError::remote(Operation::RegisterNode, client.host(), e))?;
        info!(node = self.display_name(), primary = primary.display_name(), "node registered");
        Ok(())
    }

    /// Replace this node's roles and services with the desired sets.
    ///
    /// `PUT /api/v1/deployment/node`
    pub async fn update_roles_services(&self, session: &Session) -> Result<(), CoreError> {
        self.validate()?;
        let client = session.client_for(self)?;

        let request = UpdateNodeRequest {
            roles: self.roles_vec(),
            services: self.services_vec(),
        };

        client
            .update_deployment_node(&request)
            .await
            .map_err(|e| CoreError::remote(Operation::UpdateNode, client.host(), e))?;
        info!(
            node = self.display_name(),
            roles = ?request.roles,
            services = ?request.services,
            "roles and services updated"
        );
        Ok(())
    }

    /// Export this node's default self-signed certificate and import it
    /// into `primary`'s trusted store.
    ///
    /// Stops at the first failing step. Nothing is rolled back.
    pub async fn import_certificate_into_primary(
        &self,
        primary: &Node,
        session: &Session,
    ) -> Result<CertificateImport, CoreError> {
        let Some(certificate_id) = self.default_certificate_id(session).await? else {
            debug!(node = self.display_name(), "no default self-signed certificate");
            return Ok(CertificateImport::CertificateNotFound);
        };

        let node_client = session.client_for(self)?;
        let bundle = node_client
            .export_system_certificate(&ExportSystemCertificateRequest::certificate_only(
                certificate_id.clone(),
            ))
            .await
            .map_err(|e| CoreError::remote(Operation::ExportCertificate, node_client.host(), e))?;
        debug!(
            node = self.display_name(),
            bytes = bundle.len(),
            "certificate bundle exported"
        );

        let pem = extract_pem(&bundle).map_err(|source| CoreError::CertificateBundle {
            hostname: self.hostname.clone(),
            source,
        })?;
        let data = decode_utf8(&pem);

        let trusted_name = trusted_certificate_name(&self.hostname);
        let primary_client = session.client_for(primary)?;
        let response = primary_client
            .import_trusted_certificate(&ImportTrustedCertificateRequest::cluster_peer(
                trusted_name.clone(),
                data,
            ))
            .await
            .map_err(|e| {
                CoreError::remote(Operation::ImportTrustedCertificate, primary_client.host(), e)
            })?;

        info!(
            node = self.display_name(),
            primary = primary.display_name(),
            certificate_id = %certificate_id,
            trusted_name = %trusted_name,
            imported_id = response.id.as_deref().unwrap_or("-"),
            "certificate imported into primary"
        );
        Ok(CertificateImport::Imported {
            certificate_id,
            trusted_name,
        })
    }

    /// Promote this node to primary.
    ///
    /// An HTTP-status failure becomes [`CoreError::PromotionFailed`]; any
    /// other failure (connection, timeout, TLS) is returned as is.
    ///
    /// `POST /api/v1/deployment/primary`
    pub async fn promote_to_primary(&self, session: &Session) -> Result<(), CoreError> {
        self.validate()?;
        let client = session.client_for(self)?;

        match client.promote_to_primary().await {
            Ok(()) => {
                info!(node = self.display_name(), "node promoted to primary");
                Ok(())
            }
            Err(source) if source.is_http_status() => Err(CoreError::PromotionFailed {
                hostname: self.hostname.clone(),
                source,
            }),
            Err(personas_api::Error::Cancelled) => Err(CoreError::Cancelled),
            Err(source) => Err(CoreError::Passthrough {
                operation: Operation::PromoteToPrimary,
                host: client.host().to_owned(),
                source,
            }),
        }
    }
}
