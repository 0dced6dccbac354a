//! Async client for one appliance node's deployment and certificate API.
//!
//! - **[`NodeClient`]**: basic-auth HTTP client bound to a single node's
//!   management address. Wraps `reqwest` with JSON bodies, per-request
//!   timeouts, cancellation, and uniform error-on-non-2xx semantics.
//!
//! - **[`TransportConfig`]**: TLS mode and timeouts shared by every client
//!   built for a workflow. Certificate validation is strict unless the caller
//!   explicitly asks for [`TlsMode::DangerAcceptInvalid`].
//!
//! - **[`models`]**: request/response shapes for the endpoints the cluster
//!   bootstrap workflow consumes.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod certs;
mod deployment;
mod system;

pub use client::{NodeClient, RawResponse};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
