//! Fresh-session stories: cutovers, dual stack, seeding, outages
//!
//! These tests walk a session the way an operator would: bootstrap against
//! a provider, click through selections, fix what validation flags, submit.

use keel::catalog::Catalogs;
use keel::dispatch::FieldValue;
use keel::schema::FieldId;
use keel::selection::{ContainerRuntime, IpFamily, SelectionEvent, UnderlayMode};
use keel::wizard::{FormSink, MemoryForm, Wizard};
use keel::Error;

use super::helpers::{FailingProvider, FixtureProvider};

// =============================================================================
// Version Cutover Stories
// =============================================================================

/// Story: operator walks the Kubernetes version across both cutovers
///
/// The offline catalog opens on 1.19.8, where docker is the derived runtime.
/// Moving to 1.23.6 derives containerd but still lets the operator switch
/// back to docker. Moving to 1.25.0 withdraws docker entirely: the forced
/// selection is containerd and asking for docker is refused.
///
/// Expected behavior:
/// - Each version change re-derives the runtime and flips the field sets
/// - Below 1.24.0 a manual docker selection sticks
/// - From 1.24.0 docker is out of the option set and cannot be selected
#[tokio::test]
async fn story_operator_walks_versions_across_both_cutovers() {
    let provider = FixtureProvider::stocked();
    let mut wizard = Wizard::bootstrap(&provider, MemoryForm::new())
        .await
        .expect("bootstrap against a stocked provider");

    // The first offline version predates the containerd cutover
    assert_eq!(wizard.state().kubernetes_version.as_deref(), Some("1.19.8"));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Docker);
    assert!(wizard.sink().is_visible(FieldId::DockerVersion));
    assert!(!wizard.sink().is_visible(FieldId::ContainerdVersion));

    // Between the cutovers containerd is derived but docker is still offered
    wizard.apply(SelectionEvent::KubernetesVersionChanged("1.23.6".to_string()));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Containerd);
    wizard.apply(SelectionEvent::RuntimeChanged(ContainerRuntime::Docker));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Docker);

    // Past the withdrawal the runtime is containerd and stays that way
    wizard.apply(SelectionEvent::KubernetesVersionChanged("1.25.0".to_string()));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Containerd);
    wizard.apply(SelectionEvent::RuntimeChanged(ContainerRuntime::Docker));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Containerd);

    wizard
        .sink_mut()
        .set_value(FieldId::TemplateName, FieldValue::text("prod-west"));
    let manifest = wizard.submit().expect("a complete manifest");

    assert_eq!(
        manifest.get("kubernetesVersion"),
        Some(&FieldValue::text("1.25.0"))
    );
    assert_eq!(
        manifest.get("containerRuntimeType"),
        Some(&FieldValue::text("containerd"))
    );
    assert_eq!(
        manifest.get("containerdVersion"),
        Some(&FieldValue::text("1.6.4"))
    );
    assert_eq!(
        manifest.get("calicoVersion"),
        Some(&FieldValue::text("v3.21.2"))
    );
    assert!(!manifest.contains_key("dockerVersion"));
    assert!(!manifest.contains_key("dockerRootDir"));
}

// =============================================================================
// Dual-Stack Networking Stories
// =============================================================================

/// Story: dual-stack with a reachability probe demands a target
///
/// Turning on the dual stack reveals the V6 half of the form. Setting the
/// V6 underlay to `can-reach` requires a probe target, and validation names
/// exactly that field until the operator supplies one.
///
/// Expected behavior:
/// - Submission fails naming the V6 autodetection input
/// - After supplying an IPv6 target, the manifest carries the full V6 set
#[tokio::test]
async fn story_dual_stack_probe_requires_a_reachable_target() {
    let provider = FixtureProvider::stocked();
    let mut wizard = Wizard::bootstrap(&provider, MemoryForm::new())
        .await
        .expect("bootstrap against a stocked provider");
    wizard
        .sink_mut()
        .set_value(FieldId::TemplateName, FieldValue::text("edge"));

    wizard.apply(SelectionEvent::IpFamilyChanged(IpFamily::DualStack));
    wizard.apply(SelectionEvent::UnderlayV6Changed(UnderlayMode::CanReach));

    let failure = wizard.submit().expect_err("probe target is missing");
    assert!(failure.to_string().contains("IPv6AutoDetection"));

    wizard
        .sink_mut()
        .set_value(FieldId::AutodetectionV6, FieldValue::text("fd00::1"));
    let manifest = wizard.submit().expect("a complete dual-stack manifest");

    assert_eq!(
        manifest.get("podIPv6CIDR"),
        Some(&FieldValue::text("fd05::/120"))
    );
    assert_eq!(
        manifest.get("serviceSubnetV6"),
        Some(&FieldValue::text("fd03::/112"))
    );
    assert_eq!(
        manifest.get("pod_network_underlay_v6"),
        Some(&FieldValue::text("can-reach"))
    );
    assert_eq!(
        manifest.get("IPv6AutoDetection"),
        Some(&FieldValue::text("fd00::1"))
    );
}

// =============================================================================
// Registry Seeding Stories
// =============================================================================

/// Story: the local registry follows the manifest wherever the runtime goes
///
/// An operator deploying from a private registry types it once. The wizard
/// mirrors it into the insecure-registry list of whichever runtime is
/// active, and re-mirrors it when a version change forces a runtime flip.
#[tokio::test]
async fn story_local_registry_seeds_the_active_runtime_list() {
    let provider = FixtureProvider::stocked();
    let mut wizard = Wizard::bootstrap(&provider, MemoryForm::new())
        .await
        .expect("bootstrap against a stocked provider");

    // 1.19.8 derives docker, so the seed lands in the docker list
    wizard.apply(SelectionEvent::LocalRegistryChanged(
        "192.168.10.10:5000".to_string(),
    ));
    assert_eq!(
        wizard.sink().value(FieldId::DockerInsecureRegistry),
        Some(FieldValue::Items(vec!["192.168.10.10:5000".to_string()]))
    );

    // The forced flip to containerd carries the registry along
    wizard.apply(SelectionEvent::KubernetesVersionChanged("1.25.0".to_string()));
    assert_eq!(
        wizard.sink().value(FieldId::ContainerdInsecureRegistry),
        Some(FieldValue::Items(vec!["192.168.10.10:5000".to_string()]))
    );

    wizard
        .sink_mut()
        .set_value(FieldId::TemplateName, FieldValue::text("air-gapped"));
    let manifest = wizard.submit().expect("a complete manifest");

    assert_eq!(
        manifest.get("localRegistry"),
        Some(&FieldValue::text("192.168.10.10:5000"))
    );
    assert_eq!(
        manifest.get("containerdInsecureRegistry"),
        Some(&FieldValue::Items(vec!["192.168.10.10:5000".to_string()]))
    );
    // The docker list exists in the sink but its fields are hidden now
    assert!(!manifest.contains_key("dockerInsecureRegistry"));
}

// =============================================================================
// Catalog Outage Stories
// =============================================================================

/// Story: a catalog outage blocks submission without breaking the session
///
/// When the provider is down the bootstrap fails loudly. An application may
/// still open the wizard over empty catalogs; every edit works, but
/// submission points at the starved select rather than pretending options
/// exist.
#[tokio::test]
async fn story_catalog_outage_blocks_submission_not_the_session() {
    let failure = Wizard::bootstrap(&FailingProvider, MemoryForm::new())
        .await
        .expect_err("provider is down");
    assert!(matches!(failure, Error::Catalog(_)));

    let mut wizard = Wizard::new(Catalogs::default(), MemoryForm::new());
    wizard
        .sink_mut()
        .set_value(FieldId::TemplateName, FieldValue::text("hopeful"));
    wizard.apply(SelectionEvent::IpFamilyChanged(IpFamily::DualStack));
    assert!(wizard.sink().is_visible(FieldId::PodCidrV6));

    let failure = wizard.submit().expect_err("no versions to offer");
    assert!(matches!(failure, Error::CatalogEmpty(_)));
    assert!(failure.to_string().contains("kubernetesVersion"));
}
