//! The model arena: element and relationship storage plus the builder API
//! the DSL parser drives.

use crate::element::{Element, ElementId, ElementKind, HealthCheck, Location};
use crate::error::ModelError;
use crate::relationship::{Relationship, RelationshipId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for synthesising ancestor-level relationships from leaf-level
/// ones. Installed via `!impliedRelationships`; last declaration wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImpliedRelationships {
    #[default]
    DoNotCreate,
    /// Create an implied relationship between two ancestors unless any
    /// relationship already exists between them.
    CreateUnlessAnyExist,
}

/// The collection of people, systems, containers, components, deployment
/// topology, and relationships.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,
    #[serde(default)]
    pub implied_relationships: ImpliedRelationships,
}

impl Model {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0 as usize]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0 as usize]
    }

    pub fn relationship(&self, id: RelationshipId) -> &Relationship {
        &self.relationships[id.0 as usize]
    }

    pub fn relationship_mut(&mut self, id: RelationshipId) -> &mut Relationship {
        &mut self.relationships[id.0 as usize]
    }

    /// Walk from an element up to the model root, excluding the element
    /// itself.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cur = self.element(id).parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.element(p).parent;
        }
        out
    }

    pub fn children(&self, id: ElementId) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.parent == Some(id))
    }

    // ── Element creation ─────────────────────────────────────────────

    fn push_element(
        &mut self,
        parent: Option<ElementId>,
        kind: ElementKind,
        name: &str,
        description: Option<&str>,
        technology: Option<&str>,
        group: Option<&str>,
    ) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        let tags = kind.default_tags();
        self.elements.push(Element {
            id,
            parent,
            kind,
            name: name.to_string(),
            description: description.map(str::to_owned),
            technology: technology.map(str::to_owned),
            tags,
            url: None,
            group: group.map(str::to_owned),
            properties: BTreeMap::new(),
            perspectives: BTreeMap::new(),
        });
        id
    }

    pub fn add_person(
        &mut self,
        name: &str,
        description: Option<&str>,
        location: Location,
        group: Option<&str>,
    ) -> Result<ElementId, ModelError> {
        if self.find_person(name).is_some() {
            return Err(ModelError::DuplicatePerson(name.to_string()));
        }
        Ok(self.push_element(
            None,
            ElementKind::Person { location },
            name,
            description,
            None,
            group,
        ))
    }

    pub fn add_software_system(
        &mut self,
        name: &str,
        description: Option<&str>,
        location: Location,
        group: Option<&str>,
    ) -> Result<ElementId, ModelError> {
        if self.find_software_system(name).is_some() {
            return Err(ModelError::DuplicateSoftwareSystem(name.to_string()));
        }
        Ok(self.push_element(
            None,
            ElementKind::SoftwareSystem { location },
            name,
            description,
            None,
            group,
        ))
    }

    pub fn add_container(
        &mut self,
        system: ElementId,
        name: &str,
        description: Option<&str>,
        technology: Option<&str>,
        group: Option<&str>,
    ) -> Result<ElementId, ModelError> {
        if self
            .children(system)
            .any(|e| e.kind == ElementKind::Container && e.name == name)
        {
            let owner = self.element(system).name.clone();
            return Err(ModelError::DuplicateContainer(name.to_string(), owner));
        }
        Ok(self.push_element(
            Some(system),
            ElementKind::Container,
            name,
            description,
            technology,
            group,
        ))
    }

    pub fn add_component(
        &mut self,
        container: ElementId,
        name: &str,
        description: Option<&str>,
        technology: Option<&str>,
        group: Option<&str>,
    ) -> Result<ElementId, ModelError> {
        if self
            .children(container)
            .any(|e| e.kind == ElementKind::Component && e.name == name)
        {
            let owner = self.element(container).name.clone();
            return Err(ModelError::DuplicateComponent(name.to_string(), owner));
        }
        Ok(self.push_element(
            Some(container),
            ElementKind::Component,
            name,
            description,
            technology,
            group,
        ))
    }

    pub fn add_custom_element(
        &mut self,
        name: &str,
        metadata: Option<&str>,
        description: Option<&str>,
        group: Option<&str>,
    ) -> ElementId {
        self.push_element(
            None,
            ElementKind::CustomElement {
                metadata: metadata.map(str::to_owned),
            },
            name,
            description,
            None,
            group,
        )
    }

    /// Groups are pseudo-elements; member elements record the group name,
    /// and the group itself can carry an identifier.
    pub fn add_group(&mut self, parent: Option<ElementId>, name: &str) -> ElementId {
        self.push_element(parent, ElementKind::Group, name, None, None, None)
    }

    /// Deployment environments are registered as pseudo-elements so the
    /// identifier register can key them; re-entering an environment reuses
    /// the existing one.
    pub fn add_deployment_environment(&mut self, name: &str) -> ElementId {
        if let Some(e) = self
            .elements
            .iter()
            .find(|e| e.kind == ElementKind::DeploymentEnvironment && e.name == name)
        {
            return e.id;
        }
        self.push_element(None, ElementKind::DeploymentEnvironment, name, None, None, None)
    }

    pub fn add_deployment_group(&mut self, environment: &str, name: &str) -> ElementId {
        self.push_element(
            None,
            ElementKind::DeploymentGroup {
                environment: environment.to_string(),
            },
            name,
            None,
            None,
            None,
        )
    }

    pub fn add_deployment_node(
        &mut self,
        parent: Option<ElementId>,
        environment: &str,
        name: &str,
        description: Option<&str>,
        technology: Option<&str>,
        instances: Option<&str>,
    ) -> ElementId {
        self.push_element(
            parent,
            ElementKind::DeploymentNode {
                environment: environment.to_string(),
                instances: instances.unwrap_or("1").to_string(),
            },
            name,
            description,
            technology,
            None,
        )
    }

    pub fn add_infrastructure_node(
        &mut self,
        parent: ElementId,
        environment: &str,
        name: &str,
        description: Option<&str>,
        technology: Option<&str>,
    ) -> ElementId {
        self.push_element(
            Some(parent),
            ElementKind::InfrastructureNode {
                environment: environment.to_string(),
            },
            name,
            description,
            technology,
            None,
        )
    }

    pub fn add_software_system_instance(
        &mut self,
        node: ElementId,
        of: ElementId,
        environment: &str,
        deployment_groups: Vec<String>,
    ) -> Result<ElementId, ModelError> {
        if !matches!(self.element(of).kind, ElementKind::SoftwareSystem { .. }) {
            return Err(ModelError::NotInstantiable(self.element(of).name.clone()));
        }
        let instance = self.next_instance_number(of, environment);
        let name = self.element(of).name.clone();
        Ok(self.push_element(
            Some(node),
            ElementKind::SoftwareSystemInstance {
                of,
                environment: environment.to_string(),
                instance,
                deployment_groups,
                health_checks: Vec::new(),
            },
            &name,
            None,
            None,
            None,
        ))
    }

    pub fn add_container_instance(
        &mut self,
        node: ElementId,
        of: ElementId,
        environment: &str,
        deployment_groups: Vec<String>,
    ) -> Result<ElementId, ModelError> {
        if self.element(of).kind != ElementKind::Container {
            return Err(ModelError::NotInstantiable(self.element(of).name.clone()));
        }
        let instance = self.next_instance_number(of, environment);
        let name = self.element(of).name.clone();
        Ok(self.push_element(
            Some(node),
            ElementKind::ContainerInstance {
                of,
                environment: environment.to_string(),
                instance,
                deployment_groups,
                health_checks: Vec::new(),
            },
            &name,
            None,
            None,
            None,
        ))
    }

    fn next_instance_number(&self, of: ElementId, environment: &str) -> u32 {
        let existing = self
            .elements
            .iter()
            .filter(|e| match &e.kind {
                ElementKind::SoftwareSystemInstance {
                    of: o, environment: env, ..
                }
                | ElementKind::ContainerInstance {
                    of: o, environment: env, ..
                } => *o == of && env == environment,
                _ => false,
            })
            .count();
        existing as u32 + 1
    }

    pub fn add_health_check(&mut self, instance: ElementId, check: HealthCheck) {
        if let ElementKind::SoftwareSystemInstance { health_checks, .. }
        | ElementKind::ContainerInstance { health_checks, .. } =
            &mut self.elements[instance.0 as usize].kind
        {
            health_checks.push(check);
        }
    }

    // ── Relationships ────────────────────────────────────────────────

    /// Add a relationship, synthesising implied ancestor-level edges when
    /// the installed strategy asks for them.
    pub fn add_relationship(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: &str,
        technology: Option<&str>,
        tags: Option<&str>,
    ) -> Result<RelationshipId, ModelError> {
        let id = self.push_relationship(source, destination, description, technology, tags, None);
        if self.implied_relationships == ImpliedRelationships::CreateUnlessAnyExist {
            self.create_implied_relationships(id);
        }
        Ok(id)
    }

    fn push_relationship(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: &str,
        technology: Option<&str>,
        tags: Option<&str>,
        linked_to: Option<RelationshipId>,
    ) -> RelationshipId {
        let id = RelationshipId(self.relationships.len() as u32);
        let mut relationship = Relationship {
            id,
            source,
            destination,
            description: description.to_string(),
            technology: technology.map(str::to_owned),
            tags: vec!["Relationship".to_string()],
            url: None,
            properties: BTreeMap::new(),
            perspectives: BTreeMap::new(),
            linked_to,
        };
        if let Some(tags) = tags {
            relationship.add_tags(tags);
        }
        self.relationships.push(relationship);
        id
    }

    /// For every (source ancestor-or-self, destination ancestor-or-self)
    /// pair of static-structure elements other than the original pair,
    /// create an implied edge unless any relationship already exists
    /// between the two, or one contains the other.
    fn create_implied_relationships(&mut self, leaf: RelationshipId) {
        let (source, destination, description, technology) = {
            let r = self.relationship(leaf);
            (
                r.source,
                r.destination,
                r.description.clone(),
                r.technology.clone(),
            )
        };
        if !self.element(source).kind.is_static_structure()
            || !self.element(destination).kind.is_static_structure()
        {
            return;
        }

        let mut sources = vec![source];
        sources.extend(self.ancestors(source));
        let mut destinations = vec![destination];
        destinations.extend(self.ancestors(destination));

        for &s in &sources {
            for &d in &destinations {
                if (s, d) == (source, destination) || s == d {
                    continue;
                }
                if self.ancestors(s).contains(&d) || self.ancestors(d).contains(&s) {
                    continue;
                }
                if self.has_relationship_between(s, d) {
                    continue;
                }
                self.push_relationship(
                    s,
                    d,
                    &description,
                    technology.as_deref(),
                    None,
                    Some(leaf),
                );
            }
        }
    }

    pub fn has_relationship_between(&self, source: ElementId, destination: ElementId) -> bool {
        self.relationships
            .iter()
            .any(|r| r.source == source && r.destination == destination)
    }

    pub fn relationships_involving(
        &self,
        id: ElementId,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.source == id || r.destination == id)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn find_person(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|e| matches!(e.kind, ElementKind::Person { .. }) && e.name == name)
            .map(|e| e.id)
    }

    pub fn find_software_system(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|e| matches!(e.kind, ElementKind::SoftwareSystem { .. }) && e.name == name)
            .map(|e| e.id)
    }

    /// Canonical name, e.g. `Container://Internet Banking System/Web App`.
    pub fn canonical_name(&self, id: ElementId) -> String {
        let element = self.element(id);
        let mut path = vec![element.name.clone()];
        for ancestor in self.ancestors(id) {
            path.push(self.element(ancestor).name.clone());
        }
        path.reverse();
        format!("{}://{}", element.kind.canonical_prefix(), path.join("/"))
    }

    /// Resolve a canonical-name expression produced by [`Self::canonical_name`].
    pub fn find_by_canonical_name(&self, expression: &str) -> Option<ElementId> {
        let (prefix, path) = expression.split_once("://")?;
        self.elements
            .iter()
            .find(|e| {
                e.kind.canonical_prefix().eq_ignore_ascii_case(prefix)
                    && self.canonical_path(e.id) == path
            })
            .map(|e| e.id)
    }

    fn canonical_path(&self, id: ElementId) -> String {
        let mut path = vec![self.element(id).name.clone()];
        for ancestor in self.ancestors(id) {
            path.push(self.element(ancestor).name.clone());
        }
        path.reverse();
        path.join("/")
    }

    /// When an enterprise has been declared, people and systems that were
    /// not explicitly placed inside it are assumed to be external.
    pub fn apply_enterprise_boundary(&mut self) {
        if self.enterprise.is_none() {
            return;
        }
        for element in &mut self.elements {
            if matches!(
                element.kind,
                ElementKind::Person { .. } | ElementKind::SoftwareSystem { .. }
            ) && element.location() != Location::Internal
            {
                element.set_location(Location::External);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_person_rejected() {
        let mut model = Model::default();
        model
            .add_person("User", None, Location::Unspecified, None)
            .unwrap();
        let err = model
            .add_person("User", None, Location::Unspecified, None)
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicatePerson("User".to_string()));
    }

    #[test]
    fn canonical_names_walk_the_parent_chain() {
        let mut model = Model::default();
        let sys = model
            .add_software_system("Internet Banking System", None, Location::Unspecified, None)
            .unwrap();
        let web = model
            .add_container(sys, "Web App", None, None, None)
            .unwrap();
        assert_eq!(
            model.canonical_name(web),
            "Container://Internet Banking System/Web App"
        );
        assert_eq!(
            model.find_by_canonical_name("Container://Internet Banking System/Web App"),
            Some(web)
        );
        assert_eq!(
            model.find_by_canonical_name("SoftwareSystem://Internet Banking System"),
            Some(sys)
        );
    }

    #[test]
    fn implied_relationships_created_unless_any_exist() {
        let mut model = Model::default();
        model.implied_relationships = ImpliedRelationships::CreateUnlessAnyExist;
        let s1 = model
            .add_software_system("A", None, Location::Unspecified, None)
            .unwrap();
        let c1 = model.add_container(s1, "A1", None, None, None).unwrap();
        let s2 = model
            .add_software_system("B", None, Location::Unspecified, None)
            .unwrap();
        let c2 = model.add_container(s2, "B1", None, None, None).unwrap();

        model.add_relationship(c1, c2, "Uses", None, None).unwrap();

        // c1->b, a->c2, a->b are implied alongside the explicit c1->c2.
        assert_eq!(model.relationships().count(), 4);
        assert!(model.has_relationship_between(s1, s2));
        assert!(model.has_relationship_between(c1, s2));
        assert!(model.has_relationship_between(s1, c2));
        let implied = model
            .relationships()
            .find(|r| r.source == s1 && r.destination == s2)
            .unwrap();
        assert_eq!(implied.description, "Uses");
        assert!(implied.linked_to.is_some());
    }

    #[test]
    fn implied_synthesis_skipped_when_edge_exists() {
        let mut model = Model::default();
        model.implied_relationships = ImpliedRelationships::CreateUnlessAnyExist;
        let s1 = model
            .add_software_system("A", None, Location::Unspecified, None)
            .unwrap();
        let c1 = model.add_container(s1, "A1", None, None, None).unwrap();
        let s2 = model
            .add_software_system("B", None, Location::Unspecified, None)
            .unwrap();

        model.add_relationship(s1, s2, "Existing", None, None).unwrap();
        model.add_relationship(c1, s2, "Uses", None, None).unwrap();

        let between: Vec<_> = model
            .relationships()
            .filter(|r| r.source == s1 && r.destination == s2)
            .collect();
        assert_eq!(between.len(), 1);
        assert_eq!(between[0].description, "Existing");
    }

    #[test]
    fn instance_numbers_count_per_environment() {
        let mut model = Model::default();
        let sys = model
            .add_software_system("S", None, Location::Unspecified, None)
            .unwrap();
        model.add_deployment_environment("Live");
        let node = model.add_deployment_node(None, "Live", "Server", None, None, None);
        let i1 = model
            .add_software_system_instance(node, sys, "Live", Vec::new())
            .unwrap();
        let i2 = model
            .add_software_system_instance(node, sys, "Live", Vec::new())
            .unwrap();
        let n = |id: ElementId| match &model.element(id).kind {
            ElementKind::SoftwareSystemInstance { instance, .. } => *instance,
            _ => panic!("not an instance"),
        };
        assert_eq!(n(i1), 1);
        assert_eq!(n(i2), 2);
    }

    #[test]
    fn enterprise_boundary_marks_unplaced_elements_external() {
        let mut model = Model::default();
        let internal = model
            .add_person("Staff", None, Location::Internal, None)
            .unwrap();
        let unplaced = model
            .add_person("Customer", None, Location::Unspecified, None)
            .unwrap();
        model.enterprise = Some("Acme".to_string());
        model.apply_enterprise_boundary();
        assert_eq!(model.element(internal).location(), Location::Internal);
        assert_eq!(model.element(unplaced).location(), Location::External);
    }
}
