//! Wizard orchestration: selections in, form state out
//!
//! [`Wizard`] owns the selection state and the fetched catalogs. Every
//! selection event runs the same loop: mutate the state, re-resolve
//! component versions if the Kubernetes version moved, push dependent
//! values into the form sink, then push visibility and requiredness for
//! every field. Values land before visibility so a field never becomes
//! visible while still holding a stale dependent value.
//!
//! The engine renders nothing. [`FormSink`] is the seam a renderer (or a
//! headless caller via [`MemoryForm`]) sits behind.

use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogProvider, Catalogs, ResolvedComponents, TemplateRecord, VersionEntry};
use crate::dispatch::{check_field, FieldValue};
use crate::schema::{self, CatalogOptions, FieldDescriptor, FieldId};
use crate::selection::{ContainerRuntime, SelectionEvent, SelectionState};
use crate::validate;
use crate::Result;

/// Receiving end of the wizard's pushes: values, visibility, requiredness
///
/// A renderer implements this over its form state; tests and headless
/// callers use [`MemoryForm`]. The sink is the authority on raw values, so
/// [`FormSink::value`] must report back whatever was last set, including
/// edits made outside the wizard.
#[cfg_attr(test, automock)]
pub trait FormSink {
    /// Record a field's value
    fn set_value(&mut self, field: FieldId, value: FieldValue);

    /// Show or hide a field
    fn set_visibility(&mut self, field: FieldId, visible: bool);

    /// Mark a field required or optional
    fn set_required(&mut self, field: FieldId, required: bool);

    /// Read a field's current value back
    fn value(&self, field: FieldId) -> Option<FieldValue>;
}

/// Map-backed [`FormSink`] for tests and headless manifest assembly
///
/// Before the first recompute nothing is visible or required.
#[derive(Clone, Debug, Default)]
pub struct MemoryForm {
    values: BTreeMap<FieldId, FieldValue>,
    visibility: BTreeMap<FieldId, bool>,
    requiredness: BTreeMap<FieldId, bool>,
}

impl MemoryForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded values keyed by field
    pub fn values(&self) -> &BTreeMap<FieldId, FieldValue> {
        &self.values
    }

    /// Whether the field is currently shown
    pub fn is_visible(&self, field: FieldId) -> bool {
        self.visibility.get(&field).copied().unwrap_or(false)
    }

    /// Whether the field is currently required
    pub fn is_required(&self, field: FieldId) -> bool {
        self.requiredness.get(&field).copied().unwrap_or(false)
    }
}

impl FormSink for MemoryForm {
    fn set_value(&mut self, field: FieldId, value: FieldValue) {
        self.values.insert(field, value);
    }

    fn set_visibility(&mut self, field: FieldId, visible: bool) {
        self.visibility.insert(field, visible);
    }

    fn set_required(&mut self, field: FieldId, required: bool) {
        self.requiredness.insert(field, required);
    }

    fn value(&self, field: FieldId) -> Option<FieldValue> {
        self.values.get(&field).cloned()
    }
}

/// The manifest wizard: selection state, catalogs, and the form they drive
#[derive(Debug)]
pub struct Wizard<S: FormSink> {
    state: SelectionState,
    catalogs: Catalogs,
    resolved: ResolvedComponents,
    sink: S,
}

impl<S: FormSink> Wizard<S> {
    /// Start a fresh manifest session over already-fetched catalogs
    ///
    /// Picks the first offered Kubernetes version of the active image
    /// source (none if the catalog is empty), derives the runtime from it,
    /// seeds every scalar default the sink does not yet hold, and pushes
    /// the initial visibility pass.
    pub fn new(catalogs: Catalogs, sink: S) -> Self {
        let mut wizard = Self {
            state: SelectionState::default(),
            catalogs,
            resolved: ResolvedComponents::default(),
            sink,
        };
        let first = wizard
            .active_versions()
            .first()
            .map(|entry| entry.version.clone());
        if let Some(version) = first {
            wizard.set_version_internal(&version);
        }
        wizard.seed_defaults();
        wizard.recompute();
        wizard
    }

    /// Resume a session from a saved template over already-fetched catalogs
    ///
    /// Template values win over seeds: defaults fill only the fields the
    /// template left empty, and the resolver's version defaults are not
    /// re-pushed. A runtime the template saved but the saved Kubernetes
    /// version no longer offers is forced back to containerd.
    pub fn restore(catalogs: Catalogs, record: TemplateRecord, sink: S) -> Self {
        let mut state = SelectionState::default();
        state.absorb_flat_data(&record.flat_data);
        state.runtime =
            schema::clamp_runtime(state.kubernetes_version.as_deref(), state.runtime.clone());

        let mut wizard = Self {
            state,
            catalogs,
            resolved: ResolvedComponents::default(),
            sink,
        };
        wizard.resolved = wizard
            .state
            .kubernetes_version
            .as_deref()
            .and_then(|version| wizard.catalogs.entry(&wizard.state.image_source, version))
            .map(ResolvedComponents::resolve)
            .unwrap_or_default();

        for (key, value) in &record.flat_data {
            match FieldId::from_name(key) {
                Some(field) => wizard.sink.set_value(field, value.clone()),
                None => warn!(
                    field = key.as_str(),
                    "template carries an unknown field, skipping"
                ),
            }
        }
        wizard
            .sink
            .set_value(FieldId::TemplateName, FieldValue::text(&record.name));
        if !record.description.is_empty() {
            wizard.sink.set_value(
                FieldId::TemplateDescription,
                FieldValue::text(&record.description),
            );
        }
        // The clamp above may have corrected the template's runtime
        wizard.sink.set_value(
            FieldId::ContainerRuntime,
            FieldValue::text(wizard.state.runtime.to_string()),
        );

        wizard.seed_defaults();
        wizard.recompute();
        wizard
    }

    /// Fetch the catalogs and start a fresh session
    pub async fn bootstrap<P: CatalogProvider + ?Sized>(provider: &P, sink: S) -> Result<Self> {
        let catalogs = Catalogs::fetch(provider).await?;
        Ok(Self::new(catalogs, sink))
    }

    /// Fetch the catalogs, load the template, and resume its session
    pub async fn from_template<P: CatalogProvider + ?Sized>(
        provider: &P,
        id: &str,
        sink: S,
    ) -> Result<Self> {
        let catalogs = Catalogs::fetch(provider).await?;
        let record = provider.template(id).await?;
        Ok(Self::restore(catalogs, record, sink))
    }

    /// Apply one selection change and recompute everything that hangs off it
    pub fn apply(&mut self, event: SelectionEvent) {
        debug!(?event, "applying selection event");
        match event {
            SelectionEvent::ImageSourceChanged(source) => {
                self.state.image_source = source;
                self.sink.set_value(
                    FieldId::ImageSource,
                    FieldValue::Flag(self.state.image_source.is_offline()),
                );
                let first = self
                    .active_versions()
                    .first()
                    .map(|entry| entry.version.clone());
                match first {
                    Some(version) => self.set_version_internal(&version),
                    None => {
                        self.state.kubernetes_version = None;
                        self.resolved = ResolvedComponents::default();
                        self.sink
                            .set_value(FieldId::KubernetesVersion, FieldValue::text(""));
                        self.push_component_versions();
                    }
                }
            }
            SelectionEvent::KubernetesVersionChanged(version) => {
                self.set_version_internal(&version);
            }
            SelectionEvent::RuntimeChanged(runtime) => {
                // Headless callers can ask for anything; the offered set
                // still rules.
                self.state.runtime =
                    schema::clamp_runtime(self.state.kubernetes_version.as_deref(), runtime);
                self.sink.set_value(
                    FieldId::ContainerRuntime,
                    FieldValue::text(self.state.runtime.to_string()),
                );
                if self.state.image_source.is_offline() {
                    self.seed_registry();
                }
            }
            SelectionEvent::CniChanged(cni) => {
                self.state.cni = cni;
                self.sink
                    .set_value(FieldId::CniType, FieldValue::text(self.state.cni.to_string()));
            }
            SelectionEvent::CalicoModeChanged(mode) => {
                self.state.calico_mode = mode;
                self.sink.set_value(
                    FieldId::CalicoMode,
                    FieldValue::text(self.state.calico_mode.to_string()),
                );
            }
            SelectionEvent::IpFamilyChanged(family) => {
                self.state.ip_family = family;
                self.sink.set_value(
                    FieldId::IpFamily,
                    FieldValue::text(self.state.ip_family.to_string()),
                );
            }
            SelectionEvent::UnderlayV4Changed(mode) => {
                self.state.underlay_v4 = mode;
                self.sink.set_value(
                    FieldId::UnderlayV4,
                    FieldValue::text(self.state.underlay_v4.to_string()),
                );
            }
            SelectionEvent::UnderlayV6Changed(mode) => {
                self.state.underlay_v6 = mode;
                self.sink.set_value(
                    FieldId::UnderlayV6,
                    FieldValue::text(self.state.underlay_v6.to_string()),
                );
            }
            SelectionEvent::LocalRegistryChanged(value) => {
                self.sink
                    .set_value(FieldId::LocalRegistry, FieldValue::text(&value));
                self.seed_registry();
            }
        }
        self.recompute();
    }

    /// Validate the whole form and collect the manifest values
    ///
    /// Walks the fields in form order and returns the first failure.
    /// On success the map holds every visible non-empty value keyed by its
    /// wire name; hidden fields never leak in, whatever they hold.
    pub fn submit(&self) -> Result<BTreeMap<String, FieldValue>> {
        let descriptors = self.descriptors();
        for descriptor in &descriptors {
            let value = self.sink.value(descriptor.id);
            check_field(descriptor, value.as_ref())?;
        }

        let mut manifest = BTreeMap::new();
        for descriptor in &descriptors {
            if !descriptor.visible {
                continue;
            }
            if let Some(value) = self.sink.value(descriptor.id) {
                if !value.is_empty() {
                    manifest.insert(descriptor.id.name().to_string(), value);
                }
            }
        }
        info!(fields = manifest.len(), "manifest validated for submission");
        Ok(manifest)
    }

    /// Current descriptors for every field, in form order
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        schema::compute_field_descriptors(&self.state, &self.resolved, &self.catalog_options())
    }

    /// The current selection snapshot
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Component versions resolved for the current Kubernetes version
    pub fn resolved(&self) -> &ResolvedComponents {
        &self.resolved
    }

    /// Read access to the form sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Write access to the form sink, for recording field edits
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Select a Kubernetes version: derive the runtime, re-resolve the
    /// component versions, push the dependent values, reseed the registry.
    fn set_version_internal(&mut self, version: &str) {
        self.state.kubernetes_version = Some(version.to_string());
        self.state.runtime = schema::derived_runtime(Some(version));
        debug!(
            version,
            runtime = %self.state.runtime,
            "derived runtime for kubernetes version"
        );

        let resolved = self
            .catalogs
            .entry(&self.state.image_source, version)
            .map(ResolvedComponents::resolve)
            .unwrap_or_default();
        self.resolved = resolved;

        self.sink
            .set_value(FieldId::KubernetesVersion, FieldValue::text(version));
        self.sink.set_value(
            FieldId::ContainerRuntime,
            FieldValue::text(self.state.runtime.to_string()),
        );
        self.push_component_versions();
        self.seed_registry();
    }

    /// Push the resolved component defaults into the version selects,
    /// clearing any select whose family resolved without a default.
    fn push_component_versions(&mut self) {
        let docker = default_version(&self.resolved.docker_default);
        let containerd = default_version(&self.resolved.containerd_default);
        let calico = default_version(&self.resolved.calico_default);

        self.sink
            .set_value(FieldId::DockerVersion, FieldValue::Text(docker));
        self.sink
            .set_value(FieldId::ContainerdVersion, FieldValue::Text(containerd));
        self.sink
            .set_value(FieldId::CalicoVersion, FieldValue::Text(calico));
    }

    /// Copy an acceptable local-registry value into the active runtime's
    /// insecure-registry list as its sole entry. Values failing the gate
    /// leave the list untouched.
    fn seed_registry(&mut self) {
        let Some(value) = self.sink.value(FieldId::LocalRegistry) else {
            return;
        };
        let Some(text) = value.as_text().map(str::trim) else {
            return;
        };
        if text.is_empty() || !validate::is_registry_host(text) {
            return;
        }
        let target = match self.state.runtime {
            ContainerRuntime::Docker => FieldId::DockerInsecureRegistry,
            ContainerRuntime::Containerd => FieldId::ContainerdInsecureRegistry,
        };
        debug!(registry = text, field = target.name(), "seeding insecure registry list");
        self.sink
            .set_value(target, FieldValue::Items(vec![text.to_string()]));
    }

    /// Push each descriptor default the sink holds no value for yet
    fn seed_defaults(&mut self) {
        for descriptor in self.descriptors() {
            if let Some(default) = descriptor.default {
                if self.sink.value(descriptor.id).is_none() {
                    self.sink.set_value(descriptor.id, default);
                }
            }
        }
    }

    /// Push visibility and effective requiredness for every field
    fn recompute(&mut self) {
        let descriptors = self.descriptors();
        let visible = descriptors.iter().filter(|d| d.visible).count();
        let required = descriptors
            .iter()
            .filter(|d| d.visible && d.required)
            .count();
        for descriptor in &descriptors {
            self.sink.set_visibility(descriptor.id, descriptor.visible);
            self.sink
                .set_required(descriptor.id, descriptor.visible && descriptor.required);
        }
        debug!(visible, required, "recomputed field descriptors");
    }

    fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            kubernetes_versions: self
                .active_versions()
                .iter()
                .map(|entry| entry.version.clone())
                .collect(),
            registries: self.catalogs.registries.clone(),
            backup_points: self.catalogs.backup_points.clone(),
        }
    }

    fn active_versions(&self) -> &[VersionEntry] {
        self.catalogs.versions(&self.state.image_source)
    }
}

fn default_version(release: &Option<crate::catalog::ComponentRelease>) -> String {
    release
        .as_ref()
        .map(|release| release.version.clone())
        .unwrap_or_default()
}
