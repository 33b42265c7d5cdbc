//! Template stories: save, resume, and survive catalog drift
//!
//! A template is a submitted manifest plus its display name, stored as flat
//! data. These tests resume sessions from that stored form and check that
//! what the operator saved is what the operator gets back.

use std::collections::BTreeMap;

use keel::catalog::TemplateRecord;
use keel::dispatch::{FieldValue, LabelPair};
use keel::schema::FieldId;
use keel::selection::{ContainerRuntime, ImageSource};
use keel::wizard::{FormSink, MemoryForm, Wizard};
use keel::Error;

use super::helpers::{stocked_catalogs, FixtureProvider};

// =============================================================================
// Template Fixtures
// =============================================================================

/// A template saved from a 1.23.6 docker session, with a few hand edits the
/// operator made along the way
fn saved_template() -> TemplateRecord {
    let mut flat_data = BTreeMap::new();
    flat_data.insert("offline".to_string(), FieldValue::Flag(true));
    flat_data.insert("kubernetesVersion".to_string(), FieldValue::text("1.23.6"));
    flat_data.insert(
        "containerRuntimeType".to_string(),
        FieldValue::text("docker"),
    );
    flat_data.insert("dockerVersion".to_string(), FieldValue::text("19.03.12"));
    flat_data.insert(
        "localRegistry".to_string(),
        FieldValue::text("harbor.corp.example"),
    );
    flat_data.insert(
        "dockerInsecureRegistry".to_string(),
        FieldValue::Items(vec!["harbor.corp.example".to_string()]),
    );
    flat_data.insert("mtu".to_string(), FieldValue::Number(1400));
    flat_data.insert(
        "labels".to_string(),
        FieldValue::Pairs(vec![LabelPair::new("tier", "prod")]),
    );
    TemplateRecord {
        name: "prod-east".to_string(),
        description: "east coast production profile".to_string(),
        flat_data,
    }
}

// =============================================================================
// Resume Stories
// =============================================================================

/// Story: a saved template resumes exactly where it left off
///
/// The operator saved a 1.23.6 docker session with a hand-picked docker
/// release. Resuming restores every selection, shows the docker field set,
/// and keeps the saved release instead of the catalog's marked default.
#[tokio::test]
async fn story_saved_template_resumes_where_it_left_off() {
    let provider = FixtureProvider::stocked().with_template("prod-east", saved_template());

    let missing = Wizard::from_template(&provider, "prod-west", MemoryForm::new())
        .await
        .expect_err("provider only knows prod-east");
    assert!(matches!(missing, Error::Template(_)));

    let wizard = Wizard::from_template(&provider, "prod-east", MemoryForm::new())
        .await
        .expect("resume the saved session");

    assert_eq!(wizard.state().image_source, ImageSource::Offline);
    assert_eq!(wizard.state().kubernetes_version.as_deref(), Some("1.23.6"));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Docker);

    assert_eq!(
        wizard.sink().value(FieldId::TemplateName),
        Some(FieldValue::text("prod-east"))
    );
    assert_eq!(
        wizard.sink().value(FieldId::TemplateDescription),
        Some(FieldValue::text("east coast production profile"))
    );
    // The saved release wins over the catalog's marked default (20.10.0)
    assert_eq!(
        wizard.sink().value(FieldId::DockerVersion),
        Some(FieldValue::text("19.03.12"))
    );
    assert!(wizard.sink().is_visible(FieldId::DockerVersion));
    assert!(!wizard.sink().is_visible(FieldId::ContainerdVersion));

    let manifest = wizard.submit().expect("the resumed session submits as-is");
    assert_eq!(
        manifest.get("dockerVersion"),
        Some(&FieldValue::text("19.03.12"))
    );
    assert_eq!(manifest.get("mtu"), Some(&FieldValue::Number(1400)));
    assert_eq!(
        manifest.get("labels"),
        Some(&FieldValue::Pairs(vec![LabelPair::new("tier", "prod")]))
    );
    assert!(!manifest.contains_key("containerdVersion"));
}

/// Story: submit, re-save, resume, submit again, get the same manifest
///
/// A manifest stored as a template and resumed must survive the round trip
/// unchanged: restoring never clobbers a saved value, and seeding only fills
/// fields the template left absent.
#[tokio::test]
async fn story_template_round_trip_is_idempotent() {
    let provider = FixtureProvider::stocked().with_template("prod-east", saved_template());
    let first = Wizard::from_template(&provider, "prod-east", MemoryForm::new())
        .await
        .expect("resume the saved session");
    let manifest = first.submit().expect("first submission");

    let resaved = TemplateRecord {
        name: "prod-east".to_string(),
        description: "east coast production profile".to_string(),
        flat_data: manifest.clone(),
    };
    let second = Wizard::restore(stocked_catalogs(), resaved, MemoryForm::new());

    assert_eq!(second.submit().expect("second submission"), manifest);
    assert_eq!(second.descriptors(), first.descriptors());
}

// =============================================================================
// Catalog Drift Stories
// =============================================================================

/// Story: the catalog moved on, the saved values stay put
///
/// The template was saved against 1.22.0, which the catalog no longer
/// offers. Resolution comes back empty, so the version selects are starved,
/// but the saved releases are values rather than options and submission
/// still goes through.
#[tokio::test]
async fn story_catalog_drift_leaves_saved_values_intact() {
    let mut record = saved_template();
    record
        .flat_data
        .insert("kubernetesVersion".to_string(), FieldValue::text("1.22.0"));
    record
        .flat_data
        .insert("dockerVersion".to_string(), FieldValue::text("19.03.10"));
    record
        .flat_data
        .insert("calicoVersion".to_string(), FieldValue::text("v3.20.0"));
    let provider = FixtureProvider::stocked().with_template("prod-east", record);

    let wizard = Wizard::from_template(&provider, "prod-east", MemoryForm::new())
        .await
        .expect("resume the drifted session");

    // 1.22.0 still predates the docker withdrawal, so the runtime stands
    assert_eq!(wizard.state().kubernetes_version.as_deref(), Some("1.22.0"));
    assert_eq!(wizard.state().runtime, ContainerRuntime::Docker);

    let descriptors = wizard.descriptors();
    let docker_select = descriptors
        .iter()
        .find(|descriptor| descriptor.id == FieldId::DockerVersion)
        .expect("docker select is described");
    assert_eq!(docker_select.options, Some(vec![]));
    let version_select = descriptors
        .iter()
        .find(|descriptor| descriptor.id == FieldId::KubernetesVersion)
        .expect("version select is described");
    assert_eq!(
        version_select.options,
        Some(vec![
            "1.19.8".to_string(),
            "1.23.6".to_string(),
            "1.25.0".to_string()
        ])
    );

    let manifest = wizard.submit().expect("saved values carry the session");
    assert_eq!(
        manifest.get("kubernetesVersion"),
        Some(&FieldValue::text("1.22.0"))
    );
    assert_eq!(
        manifest.get("dockerVersion"),
        Some(&FieldValue::text("19.03.10"))
    );
    assert_eq!(
        manifest.get("calicoVersion"),
        Some(&FieldValue::text("v3.20.0"))
    );
}
