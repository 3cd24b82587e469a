//! The workspace root: model + views + configuration.

use crate::model::Model;
use crate::views::ViewSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    ReadWrite,
    ReadOnly,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "write" => Some(Role::ReadWrite),
            "read" => Some(Role::ReadOnly),
            _ => None,
        }
    }
}

/// Workspace configuration: users and their roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub users: BTreeMap<String, Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Branding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

/// Per-entity display name overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Terminology {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure_node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// The root container of a parsed architecture description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    pub description: String,
    pub model: Model,
    pub views: ViewSet,
    #[serde(default)]
    pub configuration: Configuration,
    /// The DSL source this workspace was parsed from, re-attached by the
    /// parser on access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsl: Option<String>,
}

impl Workspace {
    pub fn new(name: &str, description: &str) -> Self {
        Workspace {
            name: name.to_string(),
            description: description.to_string(),
            ..Workspace::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Workspace> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Location;

    #[test]
    fn workspace_round_trips_through_json() {
        let mut ws = Workspace::new("Name", "Description");
        ws.model
            .add_person("User", Some("A user"), Location::Unspecified, None)
            .unwrap();
        let json = ws.to_json().unwrap();
        let back = Workspace::from_json(&json).unwrap();
        assert_eq!(back.name, "Name");
        assert_eq!(back.model.elements().count(), 1);
        assert!(back.model.find_person("User").is_some());
    }
}
