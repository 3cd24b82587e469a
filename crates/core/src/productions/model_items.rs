//! Productions creating and mutating model elements: people, systems,
//! containers, components, custom elements, groups, deployment topology,
//! and the shared model-item mutators (tags, url, properties, ...).

use crate::context::{Frame, ModelItemRef};
use crate::error::ParseError;
use crate::parser::DslParser;
use crate::tokens::Tokens;
use blueprint_model::{ElementId, ElementKind, HealthCheck, Location};
use std::path::Path;

fn optional(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty())
}

impl DslParser {
    fn node_environment(&self, node: ElementId) -> Option<String> {
        match &self.workspace.as_ref()?.model.element(node).kind {
            ElementKind::DeploymentNode { environment, .. } => Some(environment.clone()),
            _ => None,
        }
    }

    fn finish_element(
        &mut self,
        element: ElementId,
        frame: Option<Frame>,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        if let Some(frame) = frame {
            self.push(frame);
        }
        self.register_element_id(identifier, element)?;
        self.listener
            .on_parsed_model_element(file, line_number, identifier, element);
        Ok(true)
    }

    fn apply_tags(&mut self, element: ElementId, tags: Option<&str>) -> Result<(), ParseError> {
        if let Some(tags) = optional(tags) {
            let tags = tags.to_string();
            self.ws_mut()?.model.element_mut(element).add_tags(&tags);
        }
        Ok(())
    }

    pub(crate) fn parse_person(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: person <name> [description] [tags]"))?
            .to_string();
        let description = optional(t.get(2)).map(str::to_owned);
        let location = if matches!(self.top(), Some(Frame::Enterprise { .. })) {
            Location::Internal
        } else {
            Location::Unspecified
        };
        let group = self.top().and_then(Frame::group).map(str::to_owned);

        let element =
            self.ws_mut()?
                .model
                .add_person(&name, description.as_deref(), location, group.as_deref())?;
        self.apply_tags(element, t.get(3))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::Person { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_software_system(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| {
                ParseError::new("Expected: softwareSystem <name> [description] [tags]")
            })?
            .to_string();
        let description = optional(t.get(2)).map(str::to_owned);
        let location = if matches!(self.top(), Some(Frame::Enterprise { .. })) {
            Location::Internal
        } else {
            Location::Unspecified
        };
        let group = self.top().and_then(Frame::group).map(str::to_owned);

        let element = self.ws_mut()?.model.add_software_system(
            &name,
            description.as_deref(),
            location,
            group.as_deref(),
        )?;
        self.apply_tags(element, t.get(3))?;

        let frame = tokens.starts_context().then_some(Frame::SoftwareSystem {
            element,
            group: None,
        });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_container(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| {
                ParseError::new("Expected: container <name> [description] [technology] [tags]")
            })?
            .to_string();
        let description = optional(t.get(2)).map(str::to_owned);
        let technology = optional(t.get(3)).map(str::to_owned);
        let (system, group) = match self.top() {
            Some(Frame::SoftwareSystem { element, group }) => (*element, group.clone()),
            _ => return Err(ParseError::new("Unexpected tokens")),
        };

        let element = self.ws_mut()?.model.add_container(
            system,
            &name,
            description.as_deref(),
            technology.as_deref(),
            group.as_deref(),
        )?;
        self.apply_tags(element, t.get(4))?;

        let frame = tokens.starts_context().then_some(Frame::Container {
            element,
            group: None,
        });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_component(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| {
                ParseError::new("Expected: component <name> [description] [technology] [tags]")
            })?
            .to_string();
        let description = optional(t.get(2)).map(str::to_owned);
        let technology = optional(t.get(3)).map(str::to_owned);
        let (container, group) = match self.top() {
            Some(Frame::Container { element, group }) => (*element, group.clone()),
            _ => return Err(ParseError::new("Unexpected tokens")),
        };

        let element = self.ws_mut()?.model.add_component(
            container,
            &name,
            description.as_deref(),
            technology.as_deref(),
            group.as_deref(),
        )?;
        self.apply_tags(element, t.get(4))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::Component { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_custom_element(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| {
                ParseError::new("Expected: element <name> [metadata] [description] [tags]")
            })?
            .to_string();
        let metadata = optional(t.get(2)).map(str::to_owned);
        let description = optional(t.get(3)).map(str::to_owned);
        let group = self.top().and_then(Frame::group).map(str::to_owned);

        let element = self.ws_mut()?.model.add_custom_element(
            &name,
            metadata.as_deref(),
            description.as_deref(),
            group.as_deref(),
        );
        self.apply_tags(element, t.get(4))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::CustomElement { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_group(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: group <name> {"))?
            .to_string();

        let frame = match self.top() {
            Some(Frame::Model { .. }) => Frame::Model {
                group: Some(name.clone()),
            },
            Some(Frame::Enterprise { .. }) => Frame::Enterprise {
                group: Some(name.clone()),
            },
            Some(Frame::SoftwareSystem { element, .. }) => Frame::SoftwareSystem {
                element: *element,
                group: Some(name.clone()),
            },
            Some(Frame::Container { element, .. }) => Frame::Container {
                element: *element,
                group: Some(name.clone()),
            },
            _ => return Err(ParseError::new("Unexpected tokens")),
        };

        let parent = self.top().and_then(Frame::element);
        let element = self.ws_mut()?.model.add_group(parent, &name);
        self.finish_element(element, Some(frame), identifier, file, line_number)
    }

    pub(crate) fn parse_enterprise(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: enterprise <name> {"))?
            .to_string();
        let ws = self.ws_mut()?;
        if ws.model.enterprise.is_some() {
            return Err(ParseError::new("An enterprise has already been defined"));
        }
        ws.model.enterprise = Some(name);
        self.push(Frame::Enterprise { group: None });
        Ok(true)
    }

    // ── Deployment topology ──────────────────────────────────────────

    pub(crate) fn parse_deployment_environment(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        _file: &Path,
        _line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: deploymentEnvironment <name> {"))?
            .to_string();
        let element = self.ws_mut()?.model.add_deployment_environment(&name);
        // re-entering an environment reuses the pseudo-element; only claim
        // a key for it once
        if identifier.is_some() || self.register.find_element_identifier(element).is_none() {
            self.register_element_id(identifier, element)?;
        }
        self.push(Frame::DeploymentEnvironment { environment: name });
        Ok(true)
    }

    pub(crate) fn parse_deployment_group(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        _file: &Path,
        _line_number: u32,
    ) -> Result<bool, ParseError> {
        let name = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: deploymentGroup <name>"))?
            .to_string();
        let environment = match self.top() {
            Some(Frame::DeploymentEnvironment { environment }) => environment.clone(),
            _ => return Err(ParseError::new("Unexpected tokens")),
        };
        let element = self.ws_mut()?.model.add_deployment_group(&environment, &name);
        self.register_element_id(identifier, element)?;
        Ok(true)
    }

    pub(crate) fn parse_deployment_node(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| {
                ParseError::new(
                    "Expected: deploymentNode <name> [description] [technology] [tags] [instances]",
                )
            })?
            .to_string();
        let description = optional(t.get(2)).map(str::to_owned);
        let technology = optional(t.get(3)).map(str::to_owned);
        let instances = optional(t.get(5)).map(str::to_owned);

        let (parent, environment) = match self.top() {
            Some(Frame::DeploymentEnvironment { environment }) => (None, environment.clone()),
            Some(Frame::DeploymentNode { element }) => (Some(*element), String::new()),
            _ => return Err(ParseError::new("Unexpected tokens")),
        };
        let environment = match parent {
            Some(parent) => self
                .node_environment(parent)
                .ok_or_else(|| ParseError::new("Unexpected tokens"))?,
            None => environment,
        };

        let element = self.ws_mut()?.model.add_deployment_node(
            parent,
            &environment,
            &name,
            description.as_deref(),
            technology.as_deref(),
            instances.as_deref(),
        );
        self.apply_tags(element, t.get(4))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::DeploymentNode { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_infrastructure_node(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| {
                ParseError::new(
                    "Expected: infrastructureNode <name> [description] [technology] [tags]",
                )
            })?
            .to_string();
        let description = optional(t.get(2)).map(str::to_owned);
        let technology = optional(t.get(3)).map(str::to_owned);

        let parent = match self.top() {
            Some(Frame::DeploymentNode { element }) => *element,
            _ => return Err(ParseError::new("Unexpected tokens")),
        };
        let environment = self
            .node_environment(parent)
            .ok_or_else(|| ParseError::new("Unexpected tokens"))?;

        let element = self.ws_mut()?.model.add_infrastructure_node(
            parent,
            &environment,
            &name,
            description.as_deref(),
            technology.as_deref(),
        );
        self.apply_tags(element, t.get(4))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::InfrastructureNode { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    /// Split a `deploymentGroups|tags` argument: if every comma-separated
    /// part resolves to a registered deployment group, it names groups.
    fn deployment_groups_or_tags(&self, token: Option<&str>) -> (Vec<String>, Option<String>) {
        let Some(token) = optional(token) else {
            return (Vec::new(), None);
        };
        let ws = match &self.workspace {
            Some(ws) => ws,
            None => return (Vec::new(), Some(token.to_string())),
        };
        let mut groups = Vec::new();
        for part in token.split(',') {
            let part = part.trim();
            match self.register.element(part) {
                Some(id)
                    if matches!(ws.model.element(id).kind, ElementKind::DeploymentGroup { .. }) =>
                {
                    groups.push(ws.model.element(id).name.clone());
                }
                _ => return (Vec::new(), Some(token.to_string())),
            }
        }
        (groups, None)
    }

    pub(crate) fn parse_software_system_instance(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t.get(1).ok_or_else(|| {
            ParseError::new(
                "Expected: softwareSystemInstance <identifier> [deploymentGroups] [tags]",
            )
        })?;
        let of = self
            .register
            .element(target)
            .ok_or_else(|| {
                ParseError::new(format!("The software system \"{}\" does not exist", target))
            })?;

        let node = match self.top() {
            Some(Frame::DeploymentNode { element }) => *element,
            _ => return Err(ParseError::new("Unexpected tokens")),
        };
        let environment = self
            .node_environment(node)
            .ok_or_else(|| ParseError::new("Unexpected tokens"))?;

        let (groups, tags) = self.deployment_groups_or_tags(t.get(2));
        let element =
            self.ws_mut()?
                .model
                .add_software_system_instance(node, of, &environment, groups)?;
        self.apply_tags(element, tags.as_deref())?;
        self.apply_tags(element, t.get(3))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::SoftwareSystemInstance { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_container_instance(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t.get(1).ok_or_else(|| {
            ParseError::new("Expected: containerInstance <identifier> [deploymentGroups] [tags]")
        })?;
        let of = self.register.element(target).ok_or_else(|| {
            ParseError::new(format!("The container \"{}\" does not exist", target))
        })?;

        let node = match self.top() {
            Some(Frame::DeploymentNode { element }) => *element,
            _ => return Err(ParseError::new("Unexpected tokens")),
        };
        let environment = self
            .node_environment(node)
            .ok_or_else(|| ParseError::new("Unexpected tokens"))?;

        let (groups, tags) = self.deployment_groups_or_tags(t.get(2));
        let element = self
            .ws_mut()?
            .model
            .add_container_instance(node, of, &environment, groups)?;
        self.apply_tags(element, tags.as_deref())?;
        self.apply_tags(element, t.get(3))?;

        let frame = tokens
            .starts_context()
            .then_some(Frame::ContainerInstance { element });
        self.finish_element(element, frame, identifier, file, line_number)
    }

    pub(crate) fn parse_health_check(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let usage = "Expected: healthCheck <name> <url> [interval] [timeout]";
        let name = tokens.get(1).ok_or_else(|| ParseError::new(usage))?.to_string();
        let url = tokens.get(2).ok_or_else(|| ParseError::new(usage))?.to_string();
        let interval = match optional(tokens.get(3)) {
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| ParseError::new("The interval must be a positive integer"))?,
            None => HealthCheck::DEFAULT_INTERVAL,
        };
        let timeout = match optional(tokens.get(4)) {
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| ParseError::new("The timeout must be a positive integer"))?,
            None => HealthCheck::DEFAULT_TIMEOUT,
        };

        let instance = match self.top() {
            Some(Frame::SoftwareSystemInstance { element })
            | Some(Frame::ContainerInstance { element }) => *element,
            _ => return Err(ParseError::new("Unexpected tokens")),
        };
        self.ws_mut()?.model.add_health_check(
            instance,
            HealthCheck {
                name,
                url,
                interval,
                timeout,
            },
        );
        Ok(true)
    }

    // ── Shared model item mutators ───────────────────────────────────

    pub(crate) fn parse_tags(
        &mut self,
        item: ModelItemRef,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        if tokens.size() < 2 {
            return Err(ParseError::new("Expected: tags <tags> [tags]"));
        }
        let tags: Vec<String> = tokens.iter().skip(1).map(str::to_owned).collect();
        let ws = self.ws_mut()?;
        for tag in tags {
            match item {
                ModelItemRef::Element(id) => ws.model.element_mut(id).add_tags(&tag),
                ModelItemRef::Relationship(id) => ws.model.relationship_mut(id).add_tags(&tag),
            }
        }
        Ok(true)
    }

    pub(crate) fn parse_url(
        &mut self,
        item: ModelItemRef,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let url = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: url <url>"))?
            .to_string();
        let ws = self.ws_mut()?;
        match item {
            ModelItemRef::Element(id) => ws.model.element_mut(id).url = Some(url),
            ModelItemRef::Relationship(id) => ws.model.relationship_mut(id).url = Some(url),
        }
        Ok(true)
    }

    pub(crate) fn parse_item_description(
        &mut self,
        item: ModelItemRef,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let description = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: description <description>"))?
            .to_string();
        let ws = self.ws_mut()?;
        match item {
            ModelItemRef::Element(id) => {
                ws.model.element_mut(id).description = Some(description)
            }
            ModelItemRef::Relationship(id) => {
                ws.model.relationship_mut(id).description = description
            }
        }
        Ok(true)
    }

    pub(crate) fn parse_item_technology(
        &mut self,
        item: ModelItemRef,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let technology = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: technology <technology>"))?
            .to_string();
        let ws = self.ws_mut()?;
        match item {
            ModelItemRef::Element(id) => {
                ws.model.element_mut(id).technology = Some(technology)
            }
            ModelItemRef::Relationship(id) => {
                ws.model.relationship_mut(id).technology = Some(technology)
            }
        }
        Ok(true)
    }

    pub(crate) fn parse_property(
        &mut self,
        item: ModelItemRef,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        if tokens.size() != 2 {
            return Err(ParseError::new("Expected: <name> <value>"));
        }
        let name = tokens.get_or_empty(0).to_string();
        let value = tokens.get_or_empty(1).to_string();
        let ws = self.ws_mut()?;
        match item {
            ModelItemRef::Element(id) => {
                ws.model.element_mut(id).properties.insert(name, value);
            }
            ModelItemRef::Relationship(id) => {
                ws.model.relationship_mut(id).properties.insert(name, value);
            }
        }
        Ok(true)
    }

    pub(crate) fn parse_perspective(
        &mut self,
        item: ModelItemRef,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        if tokens.size() != 2 {
            return Err(ParseError::new("Expected: <name> <description>"));
        }
        let name = tokens.get_or_empty(0).to_string();
        let description = tokens.get_or_empty(1).to_string();
        let ws = self.ws_mut()?;
        match item {
            ModelItemRef::Element(id) => {
                ws.model.element_mut(id).perspectives.insert(name, description);
            }
            ModelItemRef::Relationship(id) => {
                ws.model
                    .relationship_mut(id)
                    .perspectives
                    .insert(name, description);
            }
        }
        Ok(true)
    }

    // ── !ref ─────────────────────────────────────────────────────────

    pub(crate) fn parse_ref(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: !ref <identifier|canonical name>"))?;

        let element = match self.register.element(target) {
            Some(id) => Some(id),
            None if target.contains("://") => self
                .workspace
                .as_ref()
                .and_then(|ws| ws.model.find_by_canonical_name(target)),
            None => None,
        };
        let element = element.ok_or_else(|| {
            ParseError::new(format!(
                "An element referenced by \"{}\" could not be found",
                target
            ))
        })?;

        if tokens.starts_context() {
            let kind = match &self.workspace {
                Some(ws) => ws.model.element(element).kind.clone(),
                None => return Err(ParseError::new("No workspace has been defined")),
            };
            let frame = match kind {
                ElementKind::Person { .. } => Some(Frame::Person { element }),
                ElementKind::SoftwareSystem { .. } => Some(Frame::SoftwareSystem {
                    element,
                    group: None,
                }),
                ElementKind::Container => Some(Frame::Container {
                    element,
                    group: None,
                }),
                ElementKind::Component => Some(Frame::Component { element }),
                ElementKind::CustomElement { .. } => Some(Frame::CustomElement { element }),
                ElementKind::DeploymentNode { .. } => Some(Frame::DeploymentNode { element }),
                ElementKind::InfrastructureNode { .. } => {
                    Some(Frame::InfrastructureNode { element })
                }
                ElementKind::SoftwareSystemInstance { .. } => {
                    Some(Frame::SoftwareSystemInstance { element })
                }
                ElementKind::ContainerInstance { .. } => {
                    Some(Frame::ContainerInstance { element })
                }
                _ => None,
            };
            if let Some(frame) = frame {
                self.push(frame);
            }
        }

        if identifier.is_some() {
            self.register_element_id(identifier, element)?;
        }
        Ok(true)
    }
}
