//! Trace Webhook - mutating admission webhook for Pod trace context injection
//!
//! Every Pod admitted through this webhook leaves with a span context embedded
//! in its annotations, so that components acting on the Pod later (kubelet,
//! controllers, sidecars) can attach their own spans to a single trace that
//! starts at Pod creation.
//!
//! # Architecture
//!
//! ```text
//! HTTPS POST /mutate
//!     → webhook::pod (decode AdmissionReview envelope, always answer)
//!     → webhook::pod::mutate_pod (decode Pod or deny, idempotence check)
//!     → trace (mint + encode span context)
//!     → patch (JSON Patch for metadata.annotations)
//!     → webhook::review (AdmissionResponse with a base64 patch)
//! ```
//!
//! # Modules
//!
//! - [`config`] - YAML configuration and sampling rate validation
//! - [`trace`] - Span context minting and the OpenCensus binary/base64 codec
//! - [`patch`] - JSON Patch construction for Pod annotations
//! - [`webhook`] - Admission wire format, handler and Pod mutation logic
//! - [`server`] - HTTPS server bootstrap and graceful shutdown
//! - [`error`] - Error types for the webhook

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod patch;
pub mod server;
pub mod trace;
pub mod webhook;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// Annotation key under which the embedded span context is stored
///
/// Presence of a non-empty value under this key is what makes mutation
/// idempotent: the webhook never overwrites it.
pub const TRACE_ANNOTATION_KEY: &str = "trace.kubernetes.io/context";

/// Default location of the configuration mount in the webhook Deployment
pub const DEFAULT_CONFIG_PATH: &str = "/etc/webhook/config/config.yaml";

/// Default TLS certificate path
pub const DEFAULT_CERT_PATH: &str = "/etc/webhook/certs/cert.pem";

/// Default TLS private key path
pub const DEFAULT_KEY_PATH: &str = "/etc/webhook/certs/key.pem";

/// Default HTTPS port for the webhook server
pub const DEFAULT_WEBHOOK_PORT: u16 = 443;

/// Path the API server posts Pod admission reviews to
pub const MUTATE_PATH: &str = "/mutate";
