//! Directed relationships between model elements.

use crate::element::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle into the model's relationship arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RelationshipId(pub u32);

/// A directed edge between two elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: ElementId,
    pub destination: ElementId,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub perspectives: BTreeMap<String, String>,
    /// For implied relationships, the leaf-level relationship this edge was
    /// synthesised from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<RelationshipId>,
}

impl Relationship {
    pub fn add_tags(&mut self, tags: &str) {
        for tag in tags.split(',') {
            let tag = tag.trim();
            if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_string());
            }
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
