//! Version catalog model and component resolution
//!
//! Catalogs arrive from a [`CatalogProvider`] as a list of offered
//! Kubernetes versions, each carrying the container runtime and CNI plugin
//! releases compatible with it. [`ResolvedComponents`] partitions one
//! entry's lists by component family and extracts each family's marked
//! default.
//!
//! Resolution never invents a default: a family with zero or several
//! `default: true` releases resolves to no default at all, and the user must
//! pick explicitly.

use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dispatch::FieldValue;
use crate::selection::ImageSource;
use crate::{Error, Result};

/// One installable release of a versioned component (runtime or CNI plugin)
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ComponentRelease {
    /// Component family name, e.g. "containerd" or "calico"
    pub name: String,

    /// Release version string, e.g. "1.6.4"
    pub version: String,

    /// Whether the catalog marks this release as its family's default
    #[serde(default, rename = "default")]
    pub is_default: bool,
}

/// Per-version component compatibility lists
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct VersionControl {
    /// Compatible container runtime releases
    #[serde(default)]
    pub cri: Vec<ComponentRelease>,

    /// Compatible CNI plugin releases
    #[serde(default)]
    pub cni: Vec<ComponentRelease>,
}

/// One offered Kubernetes version with its compatible component releases
///
/// Immutable once fetched. A malformed entry (missing `version_control`)
/// deserializes with empty lists and resolves to empty option sets.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct VersionEntry {
    /// Kubernetes version string, e.g. "1.23.6"
    pub version: String,

    /// Component compatibility lists for this version
    #[serde(default)]
    pub version_control: VersionControl,

    /// CPU architectures this version is published for
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archs: Vec<String>,
}

/// Component options and defaults resolved for one Kubernetes version
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedComponents {
    /// Offered docker releases
    pub docker: Vec<ComponentRelease>,

    /// The unique catalog-marked docker default, if exactly one is marked
    pub docker_default: Option<ComponentRelease>,

    /// Offered containerd releases
    pub containerd: Vec<ComponentRelease>,

    /// The unique catalog-marked containerd default, if exactly one is marked
    pub containerd_default: Option<ComponentRelease>,

    /// Offered calico releases
    pub calico: Vec<ComponentRelease>,

    /// The unique catalog-marked calico default, if exactly one is marked
    pub calico_default: Option<ComponentRelease>,
}

impl ResolvedComponents {
    /// Partition an entry's compatibility lists by component family and pick
    /// each family's marked default
    pub fn resolve(entry: &VersionEntry) -> Self {
        let docker = releases_for(&entry.version_control.cri, "docker");
        let containerd = releases_for(&entry.version_control.cri, "containerd");
        let calico = releases_for(&entry.version_control.cni, "calico");

        let docker_default = marked_default(&docker, "docker", &entry.version);
        let containerd_default = marked_default(&containerd, "containerd", &entry.version);
        let calico_default = marked_default(&calico, "calico", &entry.version);

        Self {
            docker,
            docker_default,
            containerd,
            containerd_default,
            calico,
            calico_default,
        }
    }

    /// Version strings offered for the docker select
    pub fn docker_versions(&self) -> Vec<String> {
        version_strings(&self.docker)
    }

    /// Version strings offered for the containerd select
    pub fn containerd_versions(&self) -> Vec<String> {
        version_strings(&self.containerd)
    }

    /// Version strings offered for the calico select
    pub fn calico_versions(&self) -> Vec<String> {
        version_strings(&self.calico)
    }
}

fn releases_for(list: &[ComponentRelease], family: &str) -> Vec<ComponentRelease> {
    list.iter()
        .filter(|release| release.name == family)
        .cloned()
        .collect()
}

fn marked_default(
    family: &[ComponentRelease],
    label: &str,
    kubernetes_version: &str,
) -> Option<ComponentRelease> {
    let mut marked = family.iter().filter(|release| release.is_default);
    let first = marked.next()?.clone();
    if marked.next().is_some() {
        warn!(
            component = label,
            kubernetes_version,
            "catalog marks several default releases, resolving to none"
        );
        return None;
    }
    Some(first)
}

fn version_strings(list: &[ComponentRelease]) -> Vec<String> {
    list.iter().map(|release| release.version.clone()).collect()
}

/// A saved wizard session: display name, description, and raw field values
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct TemplateRecord {
    /// Template display name
    #[serde(rename = "templateName")]
    pub name: String,

    /// Free-form description
    #[serde(rename = "templateDescription", default)]
    pub description: String,

    /// Raw field values keyed by field name
    #[serde(rename = "flatData", default)]
    pub flat_data: BTreeMap<String, FieldValue>,
}

impl TemplateRecord {
    /// Decode a template record from its stored JSON form
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::template(format!("failed to decode template record: {e}")))
    }

    /// Encode this record to its stored JSON form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::template(format!("failed to encode template record: {e}")))
    }
}

/// Read-only source of version catalogs, registry hosts, backup points, and
/// saved templates
///
/// This trait abstracts the backing store so the engine can run against an
/// API client, a file fixture, or a mock.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Kubernetes versions offered for the given image source
    async fn kubernetes_versions(&self, source: ImageSource) -> Result<Vec<VersionEntry>>;

    /// Known registry hosts offered as local-registry suggestions
    async fn registry_hosts(&self) -> Result<Vec<String>>;

    /// Names of the configured backup points
    async fn backup_points(&self) -> Result<Vec<String>>;

    /// Load a saved template by id
    async fn template(&self, id: &str) -> Result<TemplateRecord>;
}

/// Fetched catalog data the wizard works from
///
/// A failed fetch leaves the caller free to continue with
/// [`Catalogs::default`]: every option list is empty, which blocks
/// submission instead of fabricating choices.
#[derive(Clone, Debug, Default)]
pub struct Catalogs {
    /// Kubernetes versions available from public registries
    pub online: Vec<VersionEntry>,

    /// Kubernetes versions available from the local package mirror
    pub offline: Vec<VersionEntry>,

    /// Registry host suggestions
    pub registries: Vec<String>,

    /// Backup point names
    pub backup_points: Vec<String>,
}

impl Catalogs {
    /// Fetch every catalog once from the provider
    pub async fn fetch<P: CatalogProvider + ?Sized>(provider: &P) -> Result<Self> {
        let online = provider.kubernetes_versions(ImageSource::Online).await?;
        let offline = provider.kubernetes_versions(ImageSource::Offline).await?;
        let registries = provider.registry_hosts().await?;
        let backup_points = provider.backup_points().await?;

        info!(
            online = online.len(),
            offline = offline.len(),
            registries = registries.len(),
            backup_points = backup_points.len(),
            "fetched provisioning catalogs"
        );

        Ok(Self {
            online,
            offline,
            registries,
            backup_points,
        })
    }

    /// Version entries for the given image source
    pub fn versions(&self, source: &ImageSource) -> &[VersionEntry] {
        match source {
            ImageSource::Online => &self.online,
            ImageSource::Offline => &self.offline,
        }
    }

    /// Find a version entry by its version string
    pub fn entry(&self, source: &ImageSource, version: &str) -> Option<&VersionEntry> {
        self.versions(source)
            .iter()
            .find(|entry| entry.version == version)
    }
}
