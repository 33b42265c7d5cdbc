//! End-to-end tests for the manifest wizard
//!
//! These tests tell the story of how an operator assembles a cluster
//! provisioning manifest: picking versions, watching dependent fields
//! follow, and submitting the result.
//!
//! # Test Organization
//!
//! Tests are organized by the story they tell:
//!
//! - `manifest_sessions`: Stories about fresh sessions - version cutovers,
//!   dual-stack networking, registry seeding, and catalog outages
//!
//! - `template_sessions`: Stories about saving and resuming sessions
//!   through templates, including round-trips and catalog drift
//!
//! # Running These Tests
//!
//! ```bash
//! cargo test --test wizard_flow
//! ```

mod helpers;
mod manifest_sessions;
mod template_sessions;
