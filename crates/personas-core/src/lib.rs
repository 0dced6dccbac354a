//! Cluster persona workflows on top of `personas-api`.
//!
//! This crate owns the node lifecycle logic of a multi-node appliance
//! deployment:
//!
//! - **[`Node`]**: one appliance instance: management address, cluster
//!   hostname, credentials, and desired roles/services. State probes
//!   ([`Node::is_standalone`], [`Node::app_server_is_running`],
//!   [`Node::default_certificate_id`]) and mutations
//!   ([`Node::register_to_primary`], [`Node::update_roles_services`],
//!   [`Node::import_certificate_into_primary`], [`Node::promote_to_primary`])
//!   are inherent async methods.
//!
//! - **[`Session`]**: transport settings, retry policy, and cancellation
//!   shared by every call of one workflow run. Builds a fresh HTTP client
//!   per target node; nothing is cached between runs.
//!
//! - **[`workflow`]**: the orchestration entry points (check-standalone,
//!   register, export-certs, promote, update-roles) that sequence node
//!   operations and turn failures into named [`CoreError`] variants.

pub mod certificate;
pub mod config;
pub mod error;
pub mod node;
pub mod retry;
pub mod session;
pub mod workflow;

mod mutations;
mod queries;

// ── Primary re-exports ──────────────────────────────────────────────
pub use certificate::{CertificateImport, DEFAULT_CERTIFICATE_FRIENDLY_NAME, decode_utf8};
pub use config::{ClusterConfig, TlsVerification};
pub use error::{CoreError, Operation};
pub use node::Node;
pub use retry::RetryPolicy;
pub use session::Session;
pub use workflow::{Workflow, WorkflowReport};
