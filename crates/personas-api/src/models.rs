// Request and response shapes for the node lifecycle endpoints.
//
// Field names follow the appliance's OpenAPI (camelCase). Only the fields
// the bootstrap workflow reads or writes are modelled; everything else the
// node returns is kept in `extra` where it is useful for diagnostics.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Export mode requested from the system-certificate export endpoint.
pub const EXPORT_CERTIFICATE_ONLY: &str = "CERTIFICATE";

/// OpenAPI responses wrap their payload as `{"response": ..., "version": ...}`.
#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub response: T,
    #[serde(default)]
    pub version: Option<String>,
}

/// Unwrap the `response` member, or accept the payload bare.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, serde_json::Error> {
    match value {
        serde_json::Value::Object(ref map) if map.contains_key("response") => {
            serde_json::from_value::<ResponseEnvelope<T>>(value).map(|env| env.response)
        }
        other => serde_json::from_value(other),
    }
}

// ── Deployment ──────────────────────────────────────────────────────

/// A node as reported by `GET /api/v1/deployment/node/{hostname}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentNode {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub node_status: Option<String>,
}

/// Body of `POST /api/v1/deployment/node` (issued against the primary).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeRequest {
    pub fqdn: String,
    pub user_name: String,
    pub password: String,
    pub allow_cert_import: bool,
    pub roles: Vec<String>,
    pub services: Vec<String>,
}

/// Body of `PUT /api/v1/deployment/node`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNodeRequest {
    pub roles: Vec<String>,
    pub services: Vec<String>,
}

// ── Certificates ────────────────────────────────────────────────────

/// One entry of `GET /api/v1/certs/system-certificate/{hostname}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCertificate {
    pub id: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub issued_to: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub used_by: Option<String>,
}

/// Body of `POST /api/v1/certs/system-certificate/export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSystemCertificateRequest {
    pub id: String,
    pub export: String,
}

impl ExportSystemCertificateRequest {
    /// Export the public certificate only (no private key, no password).
    pub fn certificate_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            export: EXPORT_CERTIFICATE_ONLY.into(),
        }
    }
}

/// Body of `POST /api/v1/certs/trusted-certificate/import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ImportTrustedCertificateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: String,
    #[serde(rename = "allowBasicConstraintCAFalse")]
    pub allow_basic_constraint_ca_false: bool,
    pub allow_out_of_date_cert: bool,
    #[serde(rename = "allowSHA1Certificates")]
    pub allow_sha1_certificates: bool,
    pub trust_for_certificate_based_admin_auth: bool,
    pub trust_for_cisco_services_auth: bool,
    pub trust_for_client_auth: bool,
    pub trust_for_ise_auth: bool,
    pub validate_certificate_extensions: bool,
}

impl ImportTrustedCertificateRequest {
    /// Trust settings used when a joining node's self-signed certificate is
    /// added to the primary's trusted store.
    pub fn cluster_peer(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            data: data.into(),
            allow_basic_constraint_ca_false: true,
            allow_out_of_date_cert: false,
            allow_sha1_certificates: true,
            trust_for_certificate_based_admin_auth: true,
            trust_for_cisco_services_auth: true,
            trust_for_client_auth: true,
            trust_for_ise_auth: true,
            validate_certificate_extensions: true,
        }
    }
}

/// Result of a trusted-certificate import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportTrustedCertificateResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
