//! High-level selection state and its transition events
//!
//! A manifest session is driven by a handful of coarse choices (image
//! source, Kubernetes version, runtime, CNI, IP stack, underlay modes).
//! [`SelectionState`] owns those choices; the wizard mutates it only through
//! [`SelectionEvent`]s so every dependent recomputation happens in one place.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dispatch::FieldValue;
use crate::schema::FieldId;

/// Where cluster component images are pulled from
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Pull from public registries
    Online,
    /// Pull from the local package mirror (default)
    #[default]
    Offline,
}

impl ImageSource {
    /// Returns true for the offline source
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }

    /// Build a source from the manifest's `offline` flag
    pub fn from_offline(offline: bool) -> Self {
        if offline {
            Self::Offline
        } else {
            Self::Online
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Supported container runtimes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    /// Docker Engine, only offered below the withdrawal cutover
    Docker,
    /// containerd (default)
    #[default]
    Containerd,
}

impl ContainerRuntime {
    /// Returns true if this is a valid runtime string
    pub fn is_valid(s: &str) -> bool {
        matches!(s.to_lowercase().as_str(), "docker" | "containerd")
    }
}

impl std::str::FromStr for ContainerRuntime {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "containerd" => Ok(Self::Containerd),
            _ => Err(crate::Error::validation(format!(
                "invalid container runtime: {s}, expected one of: docker, containerd"
            ))),
        }
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Containerd => write!(f, "containerd"),
        }
    }
}

/// Supported CNI plugins
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum CniPlugin {
    /// Calico (default, and currently the only dependency-tracked plugin)
    #[default]
    Calico,
}

impl std::str::FromStr for CniPlugin {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calico" => Ok(Self::Calico),
            _ => Err(crate::Error::validation(format!(
                "invalid cni plugin: {s}, expected one of: calico"
            ))),
        }
    }
}

impl std::fmt::Display for CniPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calico => write!(f, "calico"),
        }
    }
}

/// Calico pod network mode
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum CalicoMode {
    /// Encapsulated overlay networking (default)
    #[default]
    #[serde(rename = "Overlay")]
    Overlay,
    /// Direct routing via BGP
    #[serde(rename = "BGP")]
    Bgp,
}

impl std::str::FromStr for CalicoMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overlay" => Ok(Self::Overlay),
            "bgp" => Ok(Self::Bgp),
            _ => Err(crate::Error::validation(format!(
                "invalid calico mode: {s}, expected one of: Overlay, BGP"
            ))),
        }
    }
}

impl std::fmt::Display for CalicoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overlay => write!(f, "Overlay"),
            Self::Bgp => write!(f, "BGP"),
        }
    }
}

/// IP stack the pod network runs
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum IpFamily {
    /// Single-stack IPv4 (default)
    #[default]
    #[serde(rename = "IPv4")]
    IPv4,
    /// Dual-stack IPv4 plus IPv6
    #[serde(rename = "IPv4+IPv6")]
    DualStack,
}

impl IpFamily {
    /// Returns true when the IPv6 half of the manifest applies
    pub fn is_dual_stack(&self) -> bool {
        matches!(self, Self::DualStack)
    }
}

impl std::str::FromStr for IpFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ipv4" => Ok(Self::IPv4),
            "ipv4+ipv6" => Ok(Self::DualStack),
            _ => Err(crate::Error::validation(format!(
                "invalid ip family: {s}, expected one of: IPv4, IPv4+IPv6"
            ))),
        }
    }
}

impl std::fmt::Display for IpFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IPv4 => write!(f, "IPv4"),
            Self::DualStack => write!(f, "IPv4+IPv6"),
        }
    }
}

/// How calico picks the node interface carrying the pod network
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnderlayMode {
    /// Use the first valid interface found (default); no autodetection input
    #[default]
    FirstFound,
    /// Use the interface that can reach a probe target (IP or domain)
    CanReach,
    /// Match interfaces by name pattern
    Interface,
    /// Match interfaces by address range
    Cidr,
}

impl UnderlayMode {
    /// Returns true when the autodetection input is hidden and exempt
    pub fn hides_autodetection(&self) -> bool {
        matches!(self, Self::FirstFound)
    }

    /// Returns true when the autodetection input is a reachability probe
    /// target and therefore format-checked as IP-or-domain
    pub fn is_probe(&self) -> bool {
        matches!(self, Self::CanReach)
    }
}

impl std::str::FromStr for UnderlayMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-found" => Ok(Self::FirstFound),
            "can-reach" => Ok(Self::CanReach),
            "interface" => Ok(Self::Interface),
            "cidr" => Ok(Self::Cidr),
            _ => Err(crate::Error::validation(format!(
                "invalid underlay mode: {s}, expected one of: first-found, can-reach, interface, cidr"
            ))),
        }
    }
}

impl std::fmt::Display for UnderlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstFound => write!(f, "first-found"),
            Self::CanReach => write!(f, "can-reach"),
            Self::Interface => write!(f, "interface"),
            Self::Cidr => write!(f, "cidr"),
        }
    }
}

/// The coarse choices every dependent field hangs off
///
/// Owned by the wizard and mutated only through [`SelectionEvent`]s, so a
/// recomputation pass always sees a consistent snapshot.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    /// Where component images come from
    pub image_source: ImageSource,

    /// Selected Kubernetes version, if the catalog offered one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    /// Selected container runtime
    pub runtime: ContainerRuntime,

    /// Selected CNI plugin
    pub cni: CniPlugin,

    /// Calico network mode
    pub calico_mode: CalicoMode,

    /// Single or dual IP stack
    pub ip_family: IpFamily,

    /// IPv4 underlay interface selection mode
    pub underlay_v4: UnderlayMode,

    /// IPv6 underlay interface selection mode
    pub underlay_v6: UnderlayMode,
}

impl SelectionState {
    /// Load the selection-backed fields out of a template's flat data
    ///
    /// Unrecognized or wrongly-typed values are logged and skipped so a
    /// stale template still loads the rest of its fields.
    pub fn absorb_flat_data(&mut self, flat: &BTreeMap<String, FieldValue>) {
        if let Some(value) = flat.get(FieldId::ImageSource.name()) {
            match value.as_flag() {
                Some(offline) => self.image_source = ImageSource::from_offline(offline),
                None => warn!(
                    field = FieldId::ImageSource.name(),
                    "ignoring non-boolean image source in template data"
                ),
            }
        }

        if let Some(value) = flat.get(FieldId::KubernetesVersion.name()) {
            match value.as_text() {
                Some(text) => {
                    self.kubernetes_version = (!text.is_empty()).then(|| text.to_string());
                }
                None => warn!(
                    field = FieldId::KubernetesVersion.name(),
                    "ignoring non-text kubernetes version in template data"
                ),
            }
        }

        if let Some(runtime) = absorb_parsed::<ContainerRuntime>(flat, FieldId::ContainerRuntime) {
            self.runtime = runtime;
        }
        if let Some(cni) = absorb_parsed::<CniPlugin>(flat, FieldId::CniType) {
            self.cni = cni;
        }
        if let Some(mode) = absorb_parsed::<CalicoMode>(flat, FieldId::CalicoMode) {
            self.calico_mode = mode;
        }
        if let Some(family) = absorb_parsed::<IpFamily>(flat, FieldId::IpFamily) {
            self.ip_family = family;
        }
        if let Some(mode) = absorb_parsed::<UnderlayMode>(flat, FieldId::UnderlayV4) {
            self.underlay_v4 = mode;
        }
        if let Some(mode) = absorb_parsed::<UnderlayMode>(flat, FieldId::UnderlayV6) {
            self.underlay_v6 = mode;
        }
    }
}

fn absorb_parsed<T: std::str::FromStr<Err = crate::Error>>(
    flat: &BTreeMap<String, FieldValue>,
    field: FieldId,
) -> Option<T> {
    let value = flat.get(field.name())?;
    let Some(text) = value.as_text() else {
        warn!(
            field = field.name(),
            "ignoring non-text selection value in template data"
        );
        return None;
    };
    if text.is_empty() {
        return None;
    }
    match text.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(
                field = field.name(),
                %err,
                "ignoring unrecognized selection value in template data"
            );
            None
        }
    }
}

/// A user edit to one of the high-level selections
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    /// The image source radio was toggled
    ImageSourceChanged(ImageSource),
    /// A different Kubernetes version was picked
    KubernetesVersionChanged(String),
    /// The container runtime select was switched
    RuntimeChanged(ContainerRuntime),
    /// The CNI plugin select was switched
    CniChanged(CniPlugin),
    /// The calico mode select was switched
    CalicoModeChanged(CalicoMode),
    /// The IP family radio was toggled
    IpFamilyChanged(IpFamily),
    /// The IPv4 underlay mode select was switched
    UnderlayV4Changed(UnderlayMode),
    /// The IPv6 underlay mode select was switched
    UnderlayV6Changed(UnderlayMode),
    /// The local registry input was edited
    LocalRegistryChanged(String),
}
