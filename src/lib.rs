//! Keel - dependent-field resolution and validation engine for cluster manifests
//!
//! Keel composes a validated configuration manifest for provisioning a
//! Kubernetes cluster. A user picks high-level choices (image source,
//! Kubernetes version, container runtime, CNI plugin, IP stack) and Keel
//! resolves the dependent component versions, computes which fields are
//! visible and required under the current choices, and validates every field
//! against network and naming format rules before the manifest can be
//! submitted.
//!
//! # Architecture
//!
//! Keel is a headless engine: it renders nothing and fetches nothing itself.
//! It talks to the outside world through two narrow seams:
//! - A [`catalog::CatalogProvider`] supplies version catalogs, registry
//!   hosts, backup points, and saved templates
//! - A [`wizard::FormSink`] receives field values, visibility, and
//!   requiredness, and reports raw values back
//!
//! # Modules
//!
//! - [`validate`] - Pure format predicates (IP, domain, CIDR, host:port)
//! - [`catalog`] - Version catalog model and component resolution
//! - [`selection`] - High-level selection state and its transition events
//! - [`schema`] - Field schema and the dependency rule engine
//! - [`dispatch`] - Per-field validation dispatch and submit checks
//! - [`wizard`] - Orchestrator wiring selections, catalogs, and the form
//! - [`error`] - Error types for the engine

#![deny(missing_docs)]

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod schema;
pub mod selection;
pub mod validate;
pub mod wizard;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================
// These constants define the version cutovers and seed values used throughout
// Keel. Centralizing them here keeps the rule engine, the wizard seeds, and
// test fixtures consistent.

/// Kubernetes version from which containerd is the derived container runtime
///
/// Below this version the derived runtime is docker.
pub const CONTAINERD_DEFAULT_SINCE: &str = "1.20.0";

/// Kubernetes version from which docker is withdrawn from the runtime options
pub const DOCKER_WITHDRAWN_SINCE: &str = "1.24.0";

/// Cluster DNS domain seeded into a fresh manifest
pub const DEFAULT_DNS_DOMAIN: &str = "cluster.local";

/// Pod network MTU seeded into a fresh manifest
pub const DEFAULT_MTU: i64 = 1440;

/// Lowest pod network MTU a manifest may carry
pub const MIN_MTU: i64 = 576;

/// Highest pod network MTU a manifest may carry
pub const MAX_MTU: i64 = 1460;
