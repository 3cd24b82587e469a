//! The identifier register: two disjoint, case-insensitive mappings from
//! identifiers to elements and relationships.

use crate::error::ParseError;
use blueprint_model::{ElementId, ElementKind, Model, RelationshipId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use uuid::Uuid;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$").unwrap()
});

/// How element identifiers are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierScope {
    /// Identifiers are used exactly as written.
    #[default]
    Flat,
    /// The effective key of an element is the dotted path of its parents'
    /// identifiers plus the local identifier. Relationships stay flat.
    Hierarchical,
}

#[derive(Debug, Default)]
pub struct IdentifiersRegister {
    scope: IdentifierScope,
    elements: HashMap<String, ElementId>,
    relationships: HashMap<String, RelationshipId>,
}

impl IdentifiersRegister {
    pub fn identifier_scope(&self) -> IdentifierScope {
        self.scope
    }

    pub fn set_identifier_scope(&mut self, scope: IdentifierScope) {
        self.scope = scope;
    }

    pub fn element(&self, identifier: &str) -> Option<ElementId> {
        self.elements.get(&identifier.to_lowercase()).copied()
    }

    pub fn relationship(&self, identifier: &str) -> Option<RelationshipId> {
        self.relationships.get(&identifier.to_lowercase()).copied()
    }

    pub fn element_identifiers(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn relationship_identifiers(&self) -> impl Iterator<Item = &str> {
        self.relationships.keys().map(String::as_str)
    }

    /// The key an element was registered under, if any.
    pub fn find_element_identifier(&self, element: ElementId) -> Option<&str> {
        self.elements
            .iter()
            .find(|(_, e)| **e == element)
            .map(|(k, _)| k.as_str())
    }

    pub fn validate_identifier_name(identifier: &str) -> Result<(), ParseError> {
        if IDENTIFIER_PATTERN.is_match(identifier) {
            Ok(())
        } else {
            Err(ParseError::new(
                "Identifiers can only contain the following characters: a-zA-Z_0-9",
            ))
        }
    }

    /// Register an element, synthesising a UUID key when no identifier was
    /// given so the element stays reachable. Returns the effective key.
    pub fn register_element(
        &mut self,
        identifier: Option<&str>,
        element: ElementId,
        model: &Model,
    ) -> Result<String, ParseError> {
        let mut key = match identifier {
            Some(id) if !id.is_empty() => id.to_lowercase(),
            _ => Uuid::new_v4().to_string(),
        };

        if self.scope == IdentifierScope::Hierarchical {
            key = self.hierarchical_key(&key, element, model);
        }

        // an element may be registered at most once
        for (existing_key, existing) in &self.elements {
            if *existing == element && *existing_key != key {
                if UUID_PATTERN.is_match(existing_key) {
                    return Err(ParseError::new(format!(
                        "Please assign an identifier to \"{}\" before using it with !ref",
                        model.canonical_name(element)
                    )));
                }
                return Err(ParseError::new(format!(
                    "The element is already registered with an identifier of \"{}\"",
                    existing_key
                )));
            }
        }

        let existing_element = self.elements.get(&key).copied();
        let existing_relationship = self.relationships.get(&key).copied();
        match (existing_element, existing_relationship) {
            (None, None) => {
                self.elements.insert(key.clone(), element);
                Ok(key)
            }
            (Some(existing), _) if existing == element => Ok(key),
            _ => Err(ParseError::new(format!(
                "The identifier \"{}\" is already in use",
                key
            ))),
        }
    }

    pub fn register_relationship(
        &mut self,
        identifier: Option<&str>,
        relationship: RelationshipId,
    ) -> Result<String, ParseError> {
        let key = match identifier {
            Some(id) if !id.is_empty() => id.to_lowercase(),
            _ => Uuid::new_v4().to_string(),
        };

        let existing_element = self.elements.get(&key).copied();
        let existing_relationship = self.relationships.get(&key).copied();
        match (existing_element, existing_relationship) {
            (None, None) => {
                self.relationships.insert(key.clone(), relationship);
                Ok(key)
            }
            (_, Some(existing)) if existing == relationship => Ok(key),
            _ => Err(ParseError::new(format!(
                "The identifier \"{}\" is already in use",
                key
            ))),
        }
    }

    /// Prefix with the parent's registered key; deployment nodes with no
    /// element parent are prefixed by their environment's key instead (the
    /// environment is registered as a pseudo-element).
    fn hierarchical_key(&self, identifier: &str, element: ElementId, model: &Model) -> String {
        let e = model.element(element);
        if let Some(parent) = e.parent {
            if let Some(parent_key) = self.find_element_identifier(parent) {
                return format!("{}.{}", parent_key, identifier);
            }
            return identifier.to_string();
        }
        if let ElementKind::DeploymentNode { environment, .. } = &e.kind {
            let env = model
                .elements()
                .find(|x| x.kind == ElementKind::DeploymentEnvironment && x.name == *environment)
                .map(|x| x.id);
            if let Some(env_key) = env.and_then(|id| self.find_element_identifier(id)) {
                return format!("{}.{}", env_key, identifier);
            }
        }
        identifier.to_string()
    }

    /// Merge another register into this one (used when an extended
    /// workspace's base file publishes identifiers).
    pub fn copy_from(&mut self, other: &IdentifiersRegister) {
        for (k, v) in &other.elements {
            self.elements.entry(k.clone()).or_insert(*v);
        }
        for (k, v) in &other.relationships {
            self.relationships.entry(k.clone()).or_insert(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_model::Location;

    fn model_with_person() -> (Model, ElementId) {
        let mut model = Model::default();
        let id = model
            .add_person("User", None, Location::Unspecified, None)
            .unwrap();
        (model, id)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let (model, person) = model_with_person();
        let mut register = IdentifiersRegister::default();
        register.register_element(Some("FOO"), person, &model).unwrap();
        assert_eq!(register.element("foo"), Some(person));
        assert_eq!(register.element("FOO"), Some(person));
    }

    #[test]
    fn absent_identifier_synthesises_a_uuid() {
        let (model, person) = model_with_person();
        let mut register = IdentifiersRegister::default();
        let key = register.register_element(None, person, &model).unwrap();
        assert!(UUID_PATTERN.is_match(&key));
        assert_eq!(register.element(&key), Some(person));
    }

    #[test]
    fn registering_same_element_twice_with_different_keys_fails() {
        let (model, person) = model_with_person();
        let mut register = IdentifiersRegister::default();
        register.register_element(Some("a"), person, &model).unwrap();
        let err = register
            .register_element(Some("b"), person, &model)
            .unwrap_err();
        assert!(err.message.contains("already registered"));
    }

    #[test]
    fn uuid_registered_element_suggests_naming_before_ref() {
        let (model, person) = model_with_person();
        let mut register = IdentifiersRegister::default();
        register.register_element(None, person, &model).unwrap();
        let err = register
            .register_element(Some("u"), person, &model)
            .unwrap_err();
        assert!(err.message.contains("before using it with !ref"), "{}", err);
    }

    #[test]
    fn identifier_collision_across_maps_fails() {
        let mut model = Model::default();
        let a = model
            .add_person("A", None, Location::Unspecified, None)
            .unwrap();
        let b = model
            .add_person("B", None, Location::Unspecified, None)
            .unwrap();
        let r = model.add_relationship(a, b, "Uses", None, None).unwrap();

        let mut register = IdentifiersRegister::default();
        register.register_relationship(Some("x"), r).unwrap();
        let err = register.register_element(Some("x"), a, &model).unwrap_err();
        assert!(err.message.contains("already in use"));
    }

    #[test]
    fn hierarchical_keys_follow_the_parent_chain() {
        let mut model = Model::default();
        let sys = model
            .add_software_system("S", None, Location::Unspecified, None)
            .unwrap();
        let web = model.add_container(sys, "W", None, None, None).unwrap();

        let mut register = IdentifiersRegister::default();
        register.set_identifier_scope(IdentifierScope::Hierarchical);
        register.register_element(Some("ss"), sys, &model).unwrap();
        register.register_element(Some("web"), web, &model).unwrap();
        assert_eq!(register.element("ss"), Some(sys));
        assert_eq!(register.element("ss.web"), Some(web));
    }

    #[test]
    fn deployment_nodes_are_prefixed_by_their_environment() {
        let mut model = Model::default();
        let env = model.add_deployment_environment("Live");
        let node = model.add_deployment_node(None, "Live", "Server", None, None, None);
        let inner = model.add_deployment_node(Some(node), "Live", "Docker", None, None, None);

        let mut register = IdentifiersRegister::default();
        register.set_identifier_scope(IdentifierScope::Hierarchical);
        register.register_element(Some("live"), env, &model).unwrap();
        register.register_element(Some("node1"), node, &model).unwrap();
        register.register_element(Some("node2"), inner, &model).unwrap();
        assert_eq!(register.element("live.node1"), Some(node));
        assert_eq!(register.element("live.node1.node2"), Some(inner));
    }

    #[test]
    fn invalid_identifier_names_are_rejected() {
        assert!(IdentifiersRegister::validate_identifier_name("ok_1").is_ok());
        assert!(IdentifiersRegister::validate_identifier_name("not-ok").is_err());
        assert!(IdentifiersRegister::validate_identifier_name("no spaces").is_err());
    }
}
