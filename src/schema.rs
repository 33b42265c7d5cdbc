//! Field schema and the dependency rule engine
//!
//! [`compute_field_descriptors`] is the single place where selections turn
//! into field state. It is a pure function over the selection snapshot, the
//! resolved component versions, and the catalog option lists, so every
//! recomputation is cheap and order-independent.
//!
//! Rules apply in a documented precedence; later rules may override the
//! defaults earlier ones produce:
//!
//! 1. Runtime cutover: from 1.20.0 the derived runtime is containerd, and
//!    from 1.24.0 docker is withdrawn from the offered options
//! 2. Runtime-dependent visibility: exactly one runtime's field set shows
//! 3. CNI-dependent visibility: calico fields show only for calico
//! 4. Dual-stack visibility: V6 fields show only for the dual IP stack
//! 5. Underlay requiredness: `first-found` hides and exempts the
//!    autodetection input; `can-reach` binds an IP-or-domain check to it
//! 6. Default propagation: version selects carry the resolver's marked
//!    defaults so the wizard can push them with the matching visibility
//!
//! Hidden fields are never validated and never block submission.

use tracing::warn;

use crate::catalog::ResolvedComponents;
use crate::dispatch::FieldValue;
use crate::selection::{
    CalicoMode, CniPlugin, ContainerRuntime, IpFamily, SelectionState, UnderlayMode,
};

// Seeds for a fresh manifest. Version selects get their defaults from the
// catalog resolver instead.
const DEFAULT_ETCD_DATA_DIR: &str = "/var/lib/etcd";
const DEFAULT_KUBELET_DATA_DIR: &str = "/var/lib/kubelet";
const DEFAULT_DOCKER_ROOT_DIR: &str = "/var/lib/docker";
const DEFAULT_CONTAINERD_ROOT_DIR: &str = "/var/lib/containerd";
const DEFAULT_WORKER_NODE_VIP: &str = "169.254.169.100";
const DEFAULT_POD_CIDR_V4: &str = "172.25.0.0/24";
const DEFAULT_SERVICE_CIDR_V4: &str = "10.96.0.0/16";
const DEFAULT_POD_CIDR_V6: &str = "fd05::/120";
const DEFAULT_SERVICE_CIDR_V6: &str = "fd03::/112";
const DEFAULT_PROXY_MODE: &str = "ipvs";

/// Identity of every field a manifest session carries, in form order
///
/// The wire key of each field (see [`FieldId::name`]) is load-bearing:
/// template flat data and the form sink are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    /// Template display name
    TemplateName,
    /// Template description
    TemplateDescription,
    /// Online/offline image source toggle
    ImageSource,
    /// Registry for the cluster's own component images
    LocalRegistry,
    /// Kubernetes version select
    KubernetesVersion,
    /// etcd data directory
    EtcdDataDir,
    /// kubelet data directory
    KubeletDataDir,
    /// Extra API server certificate SANs
    CertSans,
    /// Container runtime select
    ContainerRuntime,
    /// Docker release select
    DockerVersion,
    /// Docker data root directory
    DockerRootDir,
    /// Docker insecure registry list
    DockerInsecureRegistry,
    /// containerd release select
    ContainerdVersion,
    /// containerd data root directory
    ContainerdRootDir,
    /// containerd registry mirror list
    ContainerdInsecureRegistry,
    /// Cluster DNS domain
    DnsDomain,
    /// Worker-to-control-plane load balancing VIP
    WorkerNodeVip,
    /// CNI plugin select
    CniType,
    /// Calico release select
    CalicoVersion,
    /// Calico network mode select
    CalicoMode,
    /// kube-proxy mode radio
    ProxyMode,
    /// Calico IPAM toggle
    EnableIpam,
    /// Single or dual IP stack radio
    IpFamily,
    /// IPv4 underlay interface selection mode
    UnderlayV4,
    /// IPv4 interface autodetection input
    AutodetectionV4,
    /// Pod IPv4 CIDR block
    PodCidrV4,
    /// Service IPv4 CIDR block
    ServiceCidrV4,
    /// Pod IPv6 CIDR block
    PodCidrV6,
    /// IPv6 underlay interface selection mode
    UnderlayV6,
    /// IPv6 interface autodetection input
    AutodetectionV6,
    /// Service IPv6 CIDR block
    ServiceCidrV6,
    /// Pod network MTU
    Mtu,
    /// Cluster description
    Description,
    /// Floating IP for end-user access
    ExternalIp,
    /// Backup point select
    BackupPoint,
    /// Cluster label key/value pairs
    Labels,
}

impl FieldId {
    /// Every field in form order
    pub const ALL: [FieldId; 36] = [
        FieldId::TemplateName,
        FieldId::TemplateDescription,
        FieldId::ImageSource,
        FieldId::LocalRegistry,
        FieldId::KubernetesVersion,
        FieldId::EtcdDataDir,
        FieldId::KubeletDataDir,
        FieldId::CertSans,
        FieldId::ContainerRuntime,
        FieldId::DockerVersion,
        FieldId::DockerRootDir,
        FieldId::DockerInsecureRegistry,
        FieldId::ContainerdVersion,
        FieldId::ContainerdRootDir,
        FieldId::ContainerdInsecureRegistry,
        FieldId::DnsDomain,
        FieldId::WorkerNodeVip,
        FieldId::CniType,
        FieldId::CalicoVersion,
        FieldId::CalicoMode,
        FieldId::ProxyMode,
        FieldId::EnableIpam,
        FieldId::IpFamily,
        FieldId::UnderlayV4,
        FieldId::AutodetectionV4,
        FieldId::PodCidrV4,
        FieldId::ServiceCidrV4,
        FieldId::PodCidrV6,
        FieldId::UnderlayV6,
        FieldId::AutodetectionV6,
        FieldId::ServiceCidrV6,
        FieldId::Mtu,
        FieldId::Description,
        FieldId::ExternalIp,
        FieldId::BackupPoint,
        FieldId::Labels,
    ];

    /// The field's wire key in template flat data and the form sink
    pub fn name(&self) -> &'static str {
        match self {
            FieldId::TemplateName => "templateName",
            FieldId::TemplateDescription => "templateDescription",
            FieldId::ImageSource => "offline",
            FieldId::LocalRegistry => "localRegistry",
            FieldId::KubernetesVersion => "kubernetesVersion",
            FieldId::EtcdDataDir => "etcdDataDir",
            FieldId::KubeletDataDir => "kubeletDataDir",
            FieldId::CertSans => "certSANs",
            FieldId::ContainerRuntime => "containerRuntimeType",
            FieldId::DockerVersion => "dockerVersion",
            FieldId::DockerRootDir => "dockerRootDir",
            FieldId::DockerInsecureRegistry => "dockerInsecureRegistry",
            FieldId::ContainerdVersion => "containerdVersion",
            FieldId::ContainerdRootDir => "containerdRootDir",
            FieldId::ContainerdInsecureRegistry => "containerdInsecureRegistry",
            FieldId::DnsDomain => "dnsDomain",
            FieldId::WorkerNodeVip => "workerNodeVip",
            FieldId::CniType => "cniType",
            FieldId::CalicoVersion => "calicoVersion",
            FieldId::CalicoMode => "calicoMode",
            FieldId::ProxyMode => "proxyMode",
            FieldId::EnableIpam => "IPManger",
            FieldId::IpFamily => "IPVersion",
            FieldId::UnderlayV4 => "pod_network_underlay",
            FieldId::AutodetectionV4 => "IPv4AutoDetection",
            FieldId::PodCidrV4 => "podIPv4CIDR",
            FieldId::ServiceCidrV4 => "serviceSubnet",
            FieldId::PodCidrV6 => "podIPv6CIDR",
            FieldId::UnderlayV6 => "pod_network_underlay_v6",
            FieldId::AutodetectionV6 => "IPv6AutoDetection",
            FieldId::ServiceCidrV6 => "serviceSubnetV6",
            FieldId::Mtu => "mtu",
            FieldId::Description => "description",
            FieldId::ExternalIp => "externalIP",
            FieldId::BackupPoint => "backupPoint",
            FieldId::Labels => "labels",
        }
    }

    /// Look a field up by its wire key
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|id| id.name() == name).copied()
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Format checks a field value can be bound to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldCheck {
    /// No format constraint
    None,
    /// Subdomain-safe resource name; all-numeric names rejected
    Name,
    /// Fully qualified domain name
    Domain,
    /// IPv4 address
    Ipv4,
    /// Exact IPv4 CIDR block
    CidrV4,
    /// Exact IPv6 CIDR block
    CidrV6,
    /// Dotted three-component release version (`X.Y.Z`)
    ReleaseVersion,
    /// Single registry host: domain, IPv4, or host:port
    RegistryHost,
    /// List of registry hosts, each checked independently
    RegistryList,
    /// List of IPv4-or-domain entries, each checked independently
    IpOrDomainList,
    /// IPv4 address or domain (reachability probe target)
    IpOrDomainV4,
    /// IPv6 address or domain (reachability probe target)
    IpOrDomainV6,
    /// Key/value rows where each row is all-or-nothing
    LabelPairs,
    /// Integer within the closed range
    IntRange(i64, i64),
}

/// Everything the renderer needs to know about one field right now
///
/// Descriptors are ephemeral: recomputed on every selection change and
/// never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Field identity
    pub id: FieldId,

    /// Whether the field participates in rendering and validation
    pub visible: bool,

    /// Whether an empty value blocks submission (only while visible)
    pub required: bool,

    /// Offered choices for select-like fields; `None` for free inputs
    pub options: Option<Vec<String>>,

    /// Engine-chosen default: a static seed for scalar fields, the
    /// resolver's marked default for version selects
    pub default: Option<FieldValue>,

    /// Format check bound to the field
    pub check: FieldCheck,
}

/// The catalog-driven option lists the rule engine folds into descriptors
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogOptions {
    /// Kubernetes versions offered for the active image source
    pub kubernetes_versions: Vec<String>,

    /// Registry host suggestions
    pub registries: Vec<String>,

    /// Backup point names
    pub backup_points: Vec<String>,
}

/// Runtimes offered for a Kubernetes version
///
/// Docker is withdrawn (not hidden) from 1.24.0; an unparseable version is
/// treated as below every cutover.
pub fn runtime_options(version: Option<&str>) -> Vec<ContainerRuntime> {
    if version.is_some_and(|v| version_at_least(v, crate::DOCKER_WITHDRAWN_SINCE)) {
        vec![ContainerRuntime::Containerd]
    } else {
        vec![ContainerRuntime::Docker, ContainerRuntime::Containerd]
    }
}

/// The runtime a Kubernetes version selects by itself
///
/// Containerd from 1.20.0, docker below it. With no version to judge by
/// (empty catalog) the modern default wins.
pub fn derived_runtime(version: Option<&str>) -> ContainerRuntime {
    match version {
        Some(v) if version_at_least(v, crate::CONTAINERD_DEFAULT_SINCE) => {
            ContainerRuntime::Containerd
        }
        Some(_) => ContainerRuntime::Docker,
        None => ContainerRuntime::Containerd,
    }
}

/// Force a runtime selection back into the offered set
///
/// Docker past its withdrawal cutover becomes containerd; everything else
/// passes through.
pub fn clamp_runtime(version: Option<&str>, runtime: ContainerRuntime) -> ContainerRuntime {
    if runtime == ContainerRuntime::Docker
        && version.is_some_and(|v| version_at_least(v, crate::DOCKER_WITHDRAWN_SINCE))
    {
        return ContainerRuntime::Containerd;
    }
    runtime
}

fn version_at_least(version: &str, threshold: &str) -> bool {
    let trimmed = version.trim_start_matches(['v', 'V']);
    let Ok(version) = semver::Version::parse(trimmed) else {
        warn!(
            version = trimmed,
            "unparseable kubernetes version, treating as below every cutover"
        );
        return false;
    };
    match semver::Version::parse(threshold) {
        Ok(threshold) => version >= threshold,
        Err(_) => false,
    }
}

/// Compute the full descriptor set for the current selections
///
/// Returns every field in form order, hidden ones included, so callers can
/// push visibility flips without diffing.
pub fn compute_field_descriptors(
    state: &SelectionState,
    resolved: &ResolvedComponents,
    catalogs: &CatalogOptions,
) -> Vec<FieldDescriptor> {
    let version = state.kubernetes_version.as_deref();
    let is_docker = state.runtime == ContainerRuntime::Docker;
    let is_calico = state.cni == CniPlugin::Calico;
    let is_dual = state.ip_family.is_dual_stack();

    let offered_runtimes: Vec<String> = runtime_options(version)
        .iter()
        .map(ToString::to_string)
        .collect();
    let underlay_modes: Vec<String> = [
        UnderlayMode::FirstFound,
        UnderlayMode::CanReach,
        UnderlayMode::Interface,
        UnderlayMode::Cidr,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();

    let autodetect_v4_visible = is_calico && !state.underlay_v4.hides_autodetection();
    let autodetect_v4_check = if state.underlay_v4.is_probe() {
        FieldCheck::IpOrDomainV4
    } else {
        FieldCheck::None
    };
    let autodetect_v6_visible = is_calico && is_dual && !state.underlay_v6.hides_autodetection();
    let autodetect_v6_check = if state.underlay_v6.is_probe() {
        FieldCheck::IpOrDomainV6
    } else {
        FieldCheck::None
    };

    vec![
        FieldDescriptor {
            required: true,
            check: FieldCheck::Name,
            ..field(FieldId::TemplateName)
        },
        field(FieldId::TemplateDescription),
        FieldDescriptor {
            required: true,
            default: Some(FieldValue::Flag(true)),
            ..field(FieldId::ImageSource)
        },
        FieldDescriptor {
            options: Some(catalogs.registries.clone()),
            check: FieldCheck::RegistryHost,
            ..field(FieldId::LocalRegistry)
        },
        FieldDescriptor {
            required: true,
            // First of the active list, unlike the component selects below
            default: catalogs.kubernetes_versions.first().map(FieldValue::text),
            options: Some(catalogs.kubernetes_versions.clone()),
            ..field(FieldId::KubernetesVersion)
        },
        FieldDescriptor {
            default: text_default(DEFAULT_ETCD_DATA_DIR),
            ..field(FieldId::EtcdDataDir)
        },
        FieldDescriptor {
            default: text_default(DEFAULT_KUBELET_DATA_DIR),
            ..field(FieldId::KubeletDataDir)
        },
        FieldDescriptor {
            check: FieldCheck::IpOrDomainList,
            ..field(FieldId::CertSans)
        },
        FieldDescriptor {
            required: true,
            options: Some(offered_runtimes),
            default: Some(FieldValue::text(derived_runtime(version).to_string())),
            ..field(FieldId::ContainerRuntime)
        },
        FieldDescriptor {
            visible: is_docker,
            options: Some(resolved.docker_versions()),
            default: resolved
                .docker_default
                .as_ref()
                .map(|r| FieldValue::text(&r.version)),
            check: FieldCheck::ReleaseVersion,
            ..field(FieldId::DockerVersion)
        },
        FieldDescriptor {
            visible: is_docker,
            default: text_default(DEFAULT_DOCKER_ROOT_DIR),
            ..field(FieldId::DockerRootDir)
        },
        FieldDescriptor {
            visible: is_docker,
            check: FieldCheck::RegistryList,
            ..field(FieldId::DockerInsecureRegistry)
        },
        FieldDescriptor {
            visible: !is_docker,
            required: true,
            options: Some(resolved.containerd_versions()),
            default: resolved
                .containerd_default
                .as_ref()
                .map(|r| FieldValue::text(&r.version)),
            ..field(FieldId::ContainerdVersion)
        },
        FieldDescriptor {
            visible: !is_docker,
            default: text_default(DEFAULT_CONTAINERD_ROOT_DIR),
            ..field(FieldId::ContainerdRootDir)
        },
        FieldDescriptor {
            visible: !is_docker,
            check: FieldCheck::RegistryList,
            ..field(FieldId::ContainerdInsecureRegistry)
        },
        FieldDescriptor {
            required: true,
            default: text_default(crate::DEFAULT_DNS_DOMAIN),
            check: FieldCheck::Domain,
            ..field(FieldId::DnsDomain)
        },
        FieldDescriptor {
            default: text_default(DEFAULT_WORKER_NODE_VIP),
            check: FieldCheck::Ipv4,
            ..field(FieldId::WorkerNodeVip)
        },
        FieldDescriptor {
            required: true,
            options: Some(vec![CniPlugin::Calico.to_string()]),
            default: Some(FieldValue::text(CniPlugin::Calico.to_string())),
            ..field(FieldId::CniType)
        },
        FieldDescriptor {
            visible: is_calico,
            required: true,
            options: Some(resolved.calico_versions()),
            default: resolved
                .calico_default
                .as_ref()
                .map(|r| FieldValue::text(&r.version)),
            ..field(FieldId::CalicoVersion)
        },
        FieldDescriptor {
            visible: is_calico,
            required: true,
            options: Some(vec![
                CalicoMode::Overlay.to_string(),
                CalicoMode::Bgp.to_string(),
            ]),
            default: Some(FieldValue::text(CalicoMode::Overlay.to_string())),
            ..field(FieldId::CalicoMode)
        },
        FieldDescriptor {
            options: Some(vec![DEFAULT_PROXY_MODE.to_string(), "iptables".to_string()]),
            default: text_default(DEFAULT_PROXY_MODE),
            ..field(FieldId::ProxyMode)
        },
        FieldDescriptor {
            default: Some(FieldValue::Flag(true)),
            ..field(FieldId::EnableIpam)
        },
        FieldDescriptor {
            options: Some(vec![
                IpFamily::IPv4.to_string(),
                IpFamily::DualStack.to_string(),
            ]),
            default: Some(FieldValue::text(IpFamily::IPv4.to_string())),
            ..field(FieldId::IpFamily)
        },
        FieldDescriptor {
            visible: is_calico,
            required: true,
            options: Some(underlay_modes.clone()),
            default: Some(FieldValue::text(UnderlayMode::FirstFound.to_string())),
            ..field(FieldId::UnderlayV4)
        },
        FieldDescriptor {
            visible: autodetect_v4_visible,
            required: true,
            check: autodetect_v4_check,
            ..field(FieldId::AutodetectionV4)
        },
        FieldDescriptor {
            required: true,
            default: text_default(DEFAULT_POD_CIDR_V4),
            check: FieldCheck::CidrV4,
            ..field(FieldId::PodCidrV4)
        },
        FieldDescriptor {
            required: true,
            default: text_default(DEFAULT_SERVICE_CIDR_V4),
            check: FieldCheck::CidrV4,
            ..field(FieldId::ServiceCidrV4)
        },
        FieldDescriptor {
            visible: is_dual,
            required: true,
            default: text_default(DEFAULT_POD_CIDR_V6),
            check: FieldCheck::CidrV6,
            ..field(FieldId::PodCidrV6)
        },
        FieldDescriptor {
            visible: is_calico && is_dual,
            required: true,
            options: Some(underlay_modes),
            default: Some(FieldValue::text(UnderlayMode::FirstFound.to_string())),
            ..field(FieldId::UnderlayV6)
        },
        FieldDescriptor {
            visible: autodetect_v6_visible,
            required: true,
            check: autodetect_v6_check,
            ..field(FieldId::AutodetectionV6)
        },
        FieldDescriptor {
            visible: is_dual,
            required: true,
            default: text_default(DEFAULT_SERVICE_CIDR_V6),
            check: FieldCheck::CidrV6,
            ..field(FieldId::ServiceCidrV6)
        },
        FieldDescriptor {
            default: Some(FieldValue::Number(crate::DEFAULT_MTU)),
            check: FieldCheck::IntRange(crate::MIN_MTU, crate::MAX_MTU),
            ..field(FieldId::Mtu)
        },
        field(FieldId::Description),
        FieldDescriptor {
            check: FieldCheck::Ipv4,
            ..field(FieldId::ExternalIp)
        },
        FieldDescriptor {
            options: Some(catalogs.backup_points.clone()),
            ..field(FieldId::BackupPoint)
        },
        FieldDescriptor {
            check: FieldCheck::LabelPairs,
            ..field(FieldId::Labels)
        },
    ]
}

fn field(id: FieldId) -> FieldDescriptor {
    FieldDescriptor {
        id,
        visible: true,
        required: false,
        options: None,
        default: None,
        check: FieldCheck::None,
    }
}

fn text_default(s: &str) -> Option<FieldValue> {
    Some(FieldValue::text(s))
}
