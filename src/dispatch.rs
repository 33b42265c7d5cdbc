//! Field value model and the validation dispatcher
//!
//! [`check_field`] is the one entry point: given a field's descriptor and
//! its current value it decides pass or fail. Hidden fields always pass,
//! empty optional fields always pass, and everything else routes through
//! the format check the descriptor carries.
//!
//! Failure messages lead with the field's wire key so callers can map them
//! straight back onto the form.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{FieldCheck, FieldDescriptor};
use crate::validate;
use crate::{Error, Result};

/// A single field's value as stored in the form and in template flat data
///
/// Untagged on the wire: flat data holds plain JSON scalars and arrays, so
/// the shape alone picks the variant.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean toggle
    Flag(bool),
    /// Whole number
    Number(i64),
    /// Free text or a single select choice
    Text(String),
    /// List of strings
    Items(Vec<String>),
    /// Key/value label rows
    Pairs(Vec<LabelPair>),
}

impl FieldValue {
    /// Build a text value
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// The text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The toggle state, if this is a flag value
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// True when the value carries nothing worth validating or submitting
    ///
    /// Blank text, lists of blank entries, and label lists of fully blank
    /// rows all count as empty. Flags and numbers never do.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Flag(_) | FieldValue::Number(_) => false,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Items(items) => items.iter().all(|item| item.trim().is_empty()),
            FieldValue::Pairs(pairs) => pairs.iter().all(LabelPair::is_blank),
        }
    }
}

/// One key/value row in a label list
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct LabelPair {
    /// Label key
    #[serde(default)]
    pub key: String,

    /// Label value
    #[serde(default)]
    pub value: String,
}

impl LabelPair {
    /// Build a row from a key and a value
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        LabelPair {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when both sides of the row are blank
    pub fn is_blank(&self) -> bool {
        self.key.trim().is_empty() && self.value.trim().is_empty()
    }
}

/// Validate one field's current value against its descriptor
///
/// Hidden fields always pass regardless of value. Visible empty fields pass
/// unless required; a required select whose option list came back empty
/// reports the catalog gap instead of blaming the operator.
pub fn check_field(descriptor: &FieldDescriptor, value: Option<&FieldValue>) -> Result<()> {
    if !descriptor.visible {
        return Ok(());
    }
    match value {
        Some(value) if !value.is_empty() => check_value(descriptor, value),
        _ if descriptor.required => Err(required_failure(descriptor)),
        _ => Ok(()),
    }
}

fn required_failure(descriptor: &FieldDescriptor) -> Error {
    match &descriptor.options {
        Some(options) if options.is_empty() => {
            Error::catalog_empty(format!("{}: select has no choices", descriptor.id))
        }
        _ => Error::validation(format!("{}: a value is required", descriptor.id)),
    }
}

fn check_value(descriptor: &FieldDescriptor, value: &FieldValue) -> Result<()> {
    let field = descriptor.id.name();
    match &descriptor.check {
        FieldCheck::None => Ok(()),
        FieldCheck::Name => {
            let text = text_of(field, value)?;
            if validate::is_all_numeric(text) {
                return fail(field, "names cannot be all digits");
            }
            if !validate::is_subdomain(text) {
                return fail(field, "not a valid resource name");
            }
            Ok(())
        }
        FieldCheck::Domain => {
            if validate::is_domain(text_of(field, value)?) {
                Ok(())
            } else {
                fail(field, "not a fully qualified domain name")
            }
        }
        FieldCheck::Ipv4 => {
            if validate::is_ipv4(text_of(field, value)?) {
                Ok(())
            } else {
                fail(field, "not an IPv4 address")
            }
        }
        FieldCheck::CidrV4 => {
            if validate::is_cidr_v4(text_of(field, value)?) {
                Ok(())
            } else {
                fail(field, "not an IPv4 CIDR block")
            }
        }
        FieldCheck::CidrV6 => {
            if validate::is_cidr_v6(text_of(field, value)?) {
                Ok(())
            } else {
                fail(field, "not an IPv6 CIDR block")
            }
        }
        FieldCheck::ReleaseVersion => {
            if validate::is_release_version(text_of(field, value)?) {
                Ok(())
            } else {
                fail(field, "not an X.Y.Z release version")
            }
        }
        FieldCheck::RegistryHost => {
            if validate::is_registry_host(text_of(field, value)?) {
                Ok(())
            } else {
                fail(field, "not a registry host")
            }
        }
        FieldCheck::RegistryList => {
            for entry in items_of(field, value)? {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                if !validate::is_registry_host(entry) {
                    return fail(field, &format!("{entry:?} is not a registry host"));
                }
            }
            Ok(())
        }
        FieldCheck::IpOrDomainList => {
            for entry in items_of(field, value)? {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                if !validate::is_ipv4(entry) && !validate::is_domain(entry) {
                    return fail(
                        field,
                        &format!("{entry:?} is neither an IPv4 address nor a domain"),
                    );
                }
            }
            Ok(())
        }
        FieldCheck::IpOrDomainV4 => {
            let text = text_of(field, value)?;
            if validate::is_ipv4(text) || validate::is_domain(text) {
                Ok(())
            } else {
                fail(field, "not an IPv4 address or domain")
            }
        }
        FieldCheck::IpOrDomainV6 => {
            let text = text_of(field, value)?;
            if validate::is_ipv6(text) || validate::is_domain(text) {
                Ok(())
            } else {
                fail(field, "not an IPv6 address or domain")
            }
        }
        FieldCheck::LabelPairs => {
            for pair in pairs_of(field, value)? {
                if pair.is_blank() {
                    continue;
                }
                if pair.key.trim().is_empty() || pair.value.trim().is_empty() {
                    return fail(field, "label rows need both a key and a value");
                }
            }
            Ok(())
        }
        FieldCheck::IntRange(lo, hi) => {
            let number = number_of(field, value)?;
            if number < *lo || number > *hi {
                return fail(field, &format!("must be between {lo} and {hi}"));
            }
            Ok(())
        }
    }
}

fn text_of<'a>(field: &str, value: &'a FieldValue) -> Result<&'a str> {
    match value {
        FieldValue::Text(text) => Ok(text.trim()),
        _ => Err(kind_failure(field, "text")),
    }
}

fn items_of<'a>(field: &str, value: &'a FieldValue) -> Result<&'a [String]> {
    match value {
        FieldValue::Items(items) => Ok(items),
        _ => Err(kind_failure(field, "a list")),
    }
}

fn pairs_of<'a>(field: &str, value: &'a FieldValue) -> Result<&'a [LabelPair]> {
    match value {
        FieldValue::Pairs(pairs) => Ok(pairs),
        _ => Err(kind_failure(field, "key/value rows")),
    }
}

fn number_of(field: &str, value: &FieldValue) -> Result<i64> {
    match value {
        FieldValue::Number(number) => Ok(*number),
        FieldValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("{field}: not a whole number"))),
        _ => Err(kind_failure(field, "a number")),
    }
}

fn kind_failure(field: &str, wanted: &str) -> Error {
    Error::validation(format!("{field}: expected {wanted}"))
}

fn fail(field: &str, reason: &str) -> Result<()> {
    Err(Error::validation(format!("{field}: {reason}")))
}
