//! Error types for the Keel engine

use thiserror::Error;

/// Main error type for Keel operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A field value failed a format or consistency check
    #[error("validation error: {0}")]
    Validation(String),

    /// A required selection has no catalog options to offer
    #[error("catalog empty: {0}")]
    CatalogEmpty(String),

    /// Catalog provider fetch error
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Template load or decode error
    #[error("template error: {0}")]
    Template(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a catalog-empty error with the given message
    pub fn catalog_empty(msg: impl Into<String>) -> Self {
        Self::CatalogEmpty(msg.into())
    }

    /// Create a catalog error with the given message
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a template error with the given message
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }
}
