// src/models/attribute.rs
//! Disclosed attribute data model.
//!
//! A successful verification yields an [`AttributeList`]: an ordered list of
//! disclosure groups, each holding the attributes disclosed for that group.
//! The gateway flattens this into a plain identifier → value mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fully qualified attribute identifier.
///
/// Dotted name such as `irma-demo.MijnOverheid.fullName.firstname`
/// (scheme, issuer, credential type, attribute).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AttributeIdentifier(pub String);

impl AttributeIdentifier {
    /// Builds an identifier from a credential type identifier and an attribute name.
    pub fn new(credential_type: &str, attribute: &str) -> Self {
        AttributeIdentifier(format!("{}.{}", credential_type, attribute))
    }
}

impl fmt::Display for AttributeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributeIdentifier {
    fn from(value: &str) -> Self {
        AttributeIdentifier(value.to_string())
    }
}

/// A single attribute as reported by verification.
///
/// `raw_value` is `None` when the attribute was disclosed but carries no
/// value (the holder's credential left it empty).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DisclosedAttribute {
    pub identifier: AttributeIdentifier,
    #[serde(default)]
    pub raw_value: Option<String>,
}

impl DisclosedAttribute {
    pub fn new(identifier: impl Into<AttributeIdentifier>, raw_value: Option<&str>) -> Self {
        DisclosedAttribute {
            identifier: identifier.into(),
            raw_value: raw_value.map(str::to_string),
        }
    }
}

/// One disclosure group: the attributes satisfying one part of a disclosure.
pub type DisclosureGroup = Vec<DisclosedAttribute>;

/// Verified attributes, grouped by disclosure.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct AttributeList {
    groups: Vec<DisclosureGroup>,
}

impl AttributeList {
    pub fn new(groups: Vec<DisclosureGroup>) -> Self {
        AttributeList { groups }
    }

    pub fn groups(&self) -> &[DisclosureGroup] {
        &self.groups
    }

    /// Total number of attributes across all groups.
    pub fn attribute_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Flattens the groups into an identifier → raw value mapping.
    ///
    /// # Behavior
    /// - Attributes without a raw value are omitted entirely
    /// - Groups are walked in order; a repeated identifier keeps the last value
    /// - The result is ordered by identifier, so its JSON encoding is stable
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut mapped = BTreeMap::new();
        for group in &self.groups {
            for attribute in group {
                if let Some(value) = &attribute.raw_value {
                    mapped.insert(attribute.identifier.0.clone(), value.clone());
                }
            }
        }
        mapped
    }
}
