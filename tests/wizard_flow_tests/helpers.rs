//! Shared fixtures for wizard flow tests

use std::collections::BTreeMap;

use async_trait::async_trait;

use keel::catalog::{
    CatalogProvider, Catalogs, ComponentRelease, TemplateRecord, VersionControl, VersionEntry,
};
use keel::selection::ImageSource;
use keel::{Error, Result};

// =============================================================================
// Catalog Fixtures
// =============================================================================

fn release(name: &str, version: &str, is_default: bool) -> ComponentRelease {
    ComponentRelease {
        name: name.to_string(),
        version: version.to_string(),
        is_default,
    }
}

/// A version entry offering docker, containerd, and calico releases with one
/// marked default per family
pub fn catalog_entry(version: &str) -> VersionEntry {
    VersionEntry {
        version: version.to_string(),
        version_control: VersionControl {
            cri: vec![
                release("docker", "19.03.12", false),
                release("docker", "20.10.0", true),
                release("containerd", "1.6.4", true),
                release("containerd", "1.5.9", false),
            ],
            cni: vec![
                release("calico", "v3.21.2", true),
                release("calico", "v3.22.0", false),
            ],
        },
        archs: vec!["amd64".to_string()],
    }
}

/// The catalogs [`FixtureProvider::stocked`] serves, for direct
/// [`keel::wizard::Wizard::restore`] construction
pub fn stocked_catalogs() -> Catalogs {
    Catalogs {
        online: vec![catalog_entry("1.23.6"), catalog_entry("1.25.0")],
        offline: vec![
            catalog_entry("1.19.8"),
            catalog_entry("1.23.6"),
            catalog_entry("1.25.0"),
        ],
        registries: vec!["harbor.corp.example".to_string()],
        backup_points: vec!["nfs-daily".to_string(), "s3-weekly".to_string()],
    }
}

// =============================================================================
// Fixture Providers
// =============================================================================

/// In-memory provider serving fixed catalogs and templates
pub struct FixtureProvider {
    online: Vec<VersionEntry>,
    offline: Vec<VersionEntry>,
    registries: Vec<String>,
    backup_points: Vec<String>,
    templates: BTreeMap<String, TemplateRecord>,
}

impl FixtureProvider {
    /// Provider stocked with versions on both sides of the runtime cutovers
    pub fn stocked() -> Self {
        let catalogs = stocked_catalogs();
        Self {
            online: catalogs.online,
            offline: catalogs.offline,
            registries: catalogs.registries,
            backup_points: catalogs.backup_points,
            templates: BTreeMap::new(),
        }
    }

    /// Add a saved template the provider will serve by id
    pub fn with_template(mut self, id: &str, record: TemplateRecord) -> Self {
        self.templates.insert(id.to_string(), record);
        self
    }
}

#[async_trait]
impl CatalogProvider for FixtureProvider {
    async fn kubernetes_versions(&self, source: ImageSource) -> Result<Vec<VersionEntry>> {
        Ok(match source {
            ImageSource::Online => self.online.clone(),
            ImageSource::Offline => self.offline.clone(),
        })
    }

    async fn registry_hosts(&self) -> Result<Vec<String>> {
        Ok(self.registries.clone())
    }

    async fn backup_points(&self) -> Result<Vec<String>> {
        Ok(self.backup_points.clone())
    }

    async fn template(&self, id: &str) -> Result<TemplateRecord> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| Error::template(format!("no template with id {id}")))
    }
}

/// Provider whose backing endpoint is down
pub struct FailingProvider;

#[async_trait]
impl CatalogProvider for FailingProvider {
    async fn kubernetes_versions(&self, _source: ImageSource) -> Result<Vec<VersionEntry>> {
        Err(Error::catalog("catalog endpoint unreachable"))
    }

    async fn registry_hosts(&self) -> Result<Vec<String>> {
        Err(Error::catalog("catalog endpoint unreachable"))
    }

    async fn backup_points(&self) -> Result<Vec<String>> {
        Err(Error::catalog("catalog endpoint unreachable"))
    }

    async fn template(&self, _id: &str) -> Result<TemplateRecord> {
        Err(Error::catalog("catalog endpoint unreachable"))
    }
}
