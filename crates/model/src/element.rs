//! Model elements: people, systems, containers, components, deployment
//! topology. Elements live in the model arena and reference their parent by
//! [`ElementId`] rather than by pointer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle into the model's element arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(pub u32);

/// Whether an element sits inside or outside the enterprise boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Unspecified,
    Internal,
    External,
}

/// An HTTP health check attached to a software system or container instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub url: String,
    /// Polling interval in seconds.
    pub interval: u32,
    /// Timeout in milliseconds.
    pub timeout: u32,
}

impl HealthCheck {
    pub const DEFAULT_INTERVAL: u32 = 60;
    pub const DEFAULT_TIMEOUT: u32 = 0;
}

/// The structural kind of an element, with per-kind payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Person {
        location: Location,
    },
    SoftwareSystem {
        location: Location,
    },
    Container,
    Component,
    CustomElement {
        /// Free-form metadata shown under the element name.
        metadata: Option<String>,
    },
    /// A named visual/organisational grouping. Materialised as a
    /// pseudo-element so groups can be registered and referenced; member
    /// elements record the group name in [`Element::group`].
    Group,
    /// A named deployment environment ("Development", "Live", ...).
    /// Materialised as a pseudo-element so hierarchical identifier lookup
    /// can prefix deployment node keys with the environment key.
    DeploymentEnvironment,
    DeploymentGroup {
        environment: String,
    },
    DeploymentNode {
        environment: String,
        instances: String,
    },
    InfrastructureNode {
        environment: String,
    },
    SoftwareSystemInstance {
        of: ElementId,
        environment: String,
        instance: u32,
        deployment_groups: Vec<String>,
        health_checks: Vec<HealthCheck>,
    },
    ContainerInstance {
        of: ElementId,
        environment: String,
        instance: u32,
        deployment_groups: Vec<String>,
        health_checks: Vec<HealthCheck>,
    },
}

impl ElementKind {
    /// The default tag set applied when an element of this kind is created.
    pub fn default_tags(&self) -> Vec<String> {
        let tags: &[&str] = match self {
            ElementKind::Person { .. } => &["Element", "Person"],
            ElementKind::SoftwareSystem { .. } => &["Element", "Software System"],
            ElementKind::Container => &["Element", "Container"],
            ElementKind::Component => &["Element", "Component"],
            ElementKind::CustomElement { .. } => &["Element"],
            ElementKind::Group => &["Group"],
            ElementKind::DeploymentEnvironment | ElementKind::DeploymentGroup { .. } => &[],
            ElementKind::DeploymentNode { .. } => &["Element", "Deployment Node"],
            ElementKind::InfrastructureNode { .. } => &["Element", "Infrastructure Node"],
            ElementKind::SoftwareSystemInstance { .. } => &["Software System Instance"],
            ElementKind::ContainerInstance { .. } => &["Container Instance"],
        };
        tags.iter().map(|t| t.to_string()).collect()
    }

    /// Kind prefix used in canonical names, e.g. `SoftwareSystem://`.
    pub fn canonical_prefix(&self) -> &'static str {
        match self {
            ElementKind::Person { .. } => "Person",
            ElementKind::SoftwareSystem { .. } => "SoftwareSystem",
            ElementKind::Container => "Container",
            ElementKind::Component => "Component",
            ElementKind::CustomElement { .. } => "Custom",
            ElementKind::Group => "Group",
            ElementKind::DeploymentEnvironment => "DeploymentEnvironment",
            ElementKind::DeploymentGroup { .. } => "DeploymentGroup",
            ElementKind::DeploymentNode { .. } => "DeploymentNode",
            ElementKind::InfrastructureNode { .. } => "InfrastructureNode",
            ElementKind::SoftwareSystemInstance { .. } => "SoftwareSystemInstance",
            ElementKind::ContainerInstance { .. } => "ContainerInstance",
        }
    }

    /// People, software systems, containers and components participate in
    /// implied relationship synthesis; deployment elements do not.
    pub fn is_static_structure(&self) -> bool {
        matches!(
            self,
            ElementKind::Person { .. }
                | ElementKind::SoftwareSystem { .. }
                | ElementKind::Container
                | ElementKind::Component
        )
    }
}

/// A node in the model: common fields plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    pub kind: ElementKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Name of the enclosing `group`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub perspectives: BTreeMap<String, String>,
}

impl Element {
    /// Append comma-separated tags, skipping duplicates and blanks.
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

    pub fn location(&self) -> Location {
        match self.kind {
            ElementKind::Person { location } | ElementKind::SoftwareSystem { location } => location,
            _ => Location::Unspecified,
        }
    }

    pub fn set_location(&mut self, new: Location) {
        match &mut self.kind {
            ElementKind::Person { location } | ElementKind::SoftwareSystem { location } => {
                *location = new
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Element {
        let kind = ElementKind::Person {
            location: Location::Unspecified,
        };
        Element {
            id: ElementId(0),
            parent: None,
            tags: kind.default_tags(),
            kind,
            name: "User".to_string(),
            description: None,
            technology: None,
            url: None,
            group: None,
            properties: BTreeMap::new(),
            perspectives: BTreeMap::new(),
        }
    }

    #[test]
    fn default_tags_applied_in_order() {
        let p = person();
        assert_eq!(p.tags, vec!["Element", "Person"]);
    }

    #[test]
    fn add_tags_splits_trims_and_dedups() {
        let mut p = person();
        p.add_tags(" Customer , Person,  ,VIP");
        assert_eq!(p.tags, vec!["Element", "Person", "Customer", "VIP"]);
    }

    #[test]
    fn has_tag_is_case_insensitive() {
        let p = person();
        assert!(p.has_tag("person"));
        assert!(!p.has_tag("robot"));
    }
}
