//! View productions: view openers, include/exclude content expressions,
//! automatic layout, animations, titles, themes, and filtered views.

use crate::context::Frame;
use crate::error::ParseError;
use crate::parser::DslParser;
use crate::tokens::{Tokens, RELATIONSHIP_TOKEN};
use blueprint_model::{
    AnimationStep, AutoLayout, ElementId, ElementKind, FilterMode, FilteredView, Model,
    RankDirection, View, ViewKind,
};
use std::collections::HashSet;
use std::path::Path;

fn optional(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty())
}

// ── View content expressions ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Any,
    Tag(String),
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq)]
enum ViewExpr {
    All,
    Identifier(String),
    ElementTag(String),
    RelationshipTag(String),
    Relationship {
        source: Selector,
        destination: Selector,
    },
}

fn selector(s: &str) -> Selector {
    let s = s.trim();
    if s == "*" {
        Selector::Any
    } else if let Some(tag) = s.strip_prefix("element.tag==") {
        Selector::Tag(tag.to_string())
    } else {
        Selector::Identifier(s.to_string())
    }
}

fn is_plain_operand(s: &str) -> bool {
    s == "*"
        || (!s.is_empty()
            && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.'))
}

/// A single include/exclude argument token.
fn expression(arg: &str) -> ViewExpr {
    if arg == "*" {
        return ViewExpr::All;
    }
    if let Some((lhs, rhs)) = arg.split_once("->") {
        return ViewExpr::Relationship {
            source: selector(lhs),
            destination: selector(rhs),
        };
    }
    if let Some(tag) = arg.strip_prefix("element.tag==") {
        return ViewExpr::ElementTag(tag.to_string());
    }
    if let Some(tag) = arg.strip_prefix("relationship.tag==") {
        return ViewExpr::RelationshipTag(tag.to_string());
    }
    ViewExpr::Identifier(arg.to_string())
}

fn expressions(args: &[String]) -> Result<Vec<ViewExpr>, ParseError> {
    // an unquoted relationship form must be exactly `lhs -> rhs` with plain
    // operands; anything else with a bare arrow is malformed
    if args.iter().any(|a| a == RELATIONSHIP_TOKEN) {
        if args.len() == 3
            && args[1] == RELATIONSHIP_TOKEN
            && is_plain_operand(&args[0])
            && is_plain_operand(&args[2])
        {
            return Ok(vec![ViewExpr::Relationship {
                source: selector(&args[0]),
                destination: selector(&args[2]),
            }]);
        }
        return Err(ParseError::new("Unexpected tokens"));
    }
    Ok(args.iter().map(|a| expression(a)).collect())
}

fn selector_matches(model: &Model, selector: &Selector, element: ElementId) -> bool {
    match selector {
        Selector::Any => true,
        Selector::Tag(tag) => model.element(element).has_tag(tag),
        // identifier selectors are resolved against the register before
        // evaluation; unresolved ones match nothing
        Selector::Identifier(_) => false,
    }
}

// ── View population helpers ──────────────────────────────────────────

/// Add an element plus the relationships connecting it to elements already
/// on the view.
fn add_element_with_relationships(model: &Model, view: &mut View, element: ElementId) {
    view.add_element(element);
    for r in model.relationships() {
        if (r.source == element && view.contains_element(r.destination))
            || (r.destination == element && view.contains_element(r.source))
        {
            view.add_relationship(r.id);
        }
    }
}

fn add_with_ancestors(model: &Model, view: &mut View, element: ElementId) {
    for ancestor in model.ancestors(element) {
        add_element_with_relationships(model, view, ancestor);
    }
    add_element_with_relationships(model, view, element);
}

fn add_default_elements(model: &Model, view: &mut View) {
    match view.kind.clone() {
        ViewKind::Custom => {
            for e in model.elements() {
                if matches!(e.kind, ElementKind::CustomElement { .. }) {
                    add_element_with_relationships(model, view, e.id);
                }
            }
        }
        ViewKind::SystemLandscape => {
            for e in model.elements() {
                if matches!(
                    e.kind,
                    ElementKind::Person { .. } | ElementKind::SoftwareSystem { .. }
                ) {
                    add_element_with_relationships(model, view, e.id);
                }
            }
        }
        ViewKind::SystemContext { software_system } => {
            add_element_with_relationships(model, view, software_system);
            for r in model.relationships() {
                let other = if r.source == software_system {
                    Some(r.destination)
                } else if r.destination == software_system {
                    Some(r.source)
                } else {
                    None
                };
                if let Some(other) = other {
                    if matches!(
                        model.element(other).kind,
                        ElementKind::Person { .. } | ElementKind::SoftwareSystem { .. }
                    ) {
                        add_element_with_relationships(model, view, other);
                    }
                }
            }
        }
        ViewKind::Container { software_system } => {
            let containers: Vec<ElementId> = model
                .children(software_system)
                .filter(|e| e.kind == ElementKind::Container)
                .map(|e| e.id)
                .collect();
            for c in &containers {
                add_element_with_relationships(model, view, *c);
            }
            for r in model.relationships() {
                for c in &containers {
                    let other = if r.source == *c {
                        Some(r.destination)
                    } else if r.destination == *c {
                        Some(r.source)
                    } else {
                        None
                    };
                    if let Some(other) = other {
                        let external = match model.element(other).kind {
                            ElementKind::Person { .. } | ElementKind::SoftwareSystem { .. } => {
                                other != software_system
                            }
                            ElementKind::Container => {
                                model.element(other).parent != Some(software_system)
                            }
                            _ => false,
                        };
                        if external {
                            add_element_with_relationships(model, view, other);
                        }
                    }
                }
            }
        }
        ViewKind::Component { container } => {
            let components: Vec<ElementId> = model
                .children(container)
                .filter(|e| e.kind == ElementKind::Component)
                .map(|e| e.id)
                .collect();
            for c in &components {
                add_element_with_relationships(model, view, *c);
            }
            for r in model.relationships() {
                for c in &components {
                    let other = if r.source == *c {
                        Some(r.destination)
                    } else if r.destination == *c {
                        Some(r.source)
                    } else {
                        None
                    };
                    if let Some(other) = other {
                        let external = match model.element(other).kind {
                            ElementKind::Person { .. } | ElementKind::SoftwareSystem { .. } => true,
                            ElementKind::Container => other != container,
                            ElementKind::Component => {
                                model.element(other).parent != Some(container)
                            }
                            _ => false,
                        };
                        if external {
                            add_element_with_relationships(model, view, other);
                        }
                    }
                }
            }
        }
        ViewKind::Deployment { scope, environment } => {
            add_default_deployment_elements(model, view, scope, &environment);
        }
        ViewKind::Dynamic { .. } => {}
    }
}

fn element_environment(kind: &ElementKind) -> Option<&str> {
    match kind {
        ElementKind::DeploymentNode { environment, .. }
        | ElementKind::InfrastructureNode { environment }
        | ElementKind::SoftwareSystemInstance { environment, .. }
        | ElementKind::ContainerInstance { environment, .. } => Some(environment),
        _ => None,
    }
}

fn add_default_deployment_elements(
    model: &Model,
    view: &mut View,
    scope: Option<ElementId>,
    environment: &str,
) {
    let mut keep: HashSet<ElementId> = HashSet::new();
    for e in model.elements() {
        if element_environment(&e.kind) != Some(environment) {
            continue;
        }
        match (&e.kind, scope) {
            (
                ElementKind::SoftwareSystemInstance { of, .. }
                | ElementKind::ContainerInstance { of, .. },
                Some(s),
            ) => {
                if *of == s || model.ancestors(*of).contains(&s) {
                    keep.insert(e.id);
                    keep.extend(model.ancestors(e.id));
                }
            }
            (_, None) => {
                keep.insert(e.id);
                keep.extend(model.ancestors(e.id));
            }
            _ => {}
        }
    }
    if scope.is_some() {
        // infrastructure nodes ride along with their kept parent nodes
        let kept: Vec<ElementId> = keep.iter().copied().collect();
        for e in model.elements() {
            if matches!(e.kind, ElementKind::InfrastructureNode { .. })
                && element_environment(&e.kind) == Some(environment)
                && e.parent.is_some_and(|p| kept.contains(&p))
            {
                keep.insert(e.id);
            }
        }
    }
    let mut ids: Vec<ElementId> = keep.into_iter().collect();
    ids.sort();
    for id in ids {
        add_element_with_relationships(model, view, id);
    }
}

fn remove_element_from_view(model: &Model, view: &mut View, element: ElementId) {
    view.remove_element(element);
    view.relationships.retain(|rv| {
        let r = model.relationship(rv.relationship);
        r.source != element && r.destination != element
    });
}

// ── Productions ──────────────────────────────────────────────────────

impl DslParser {
    fn generated_view_key(&self, prefix: &str) -> String {
        let n = self
            .workspace
            .as_ref()
            .map(|ws| ws.views.views.len() + ws.views.filtered.len())
            .unwrap_or(0)
            + 1;
        format!("{}-{:03}", prefix, n)
    }

    fn create_view(
        &mut self,
        key: Option<&str>,
        default_prefix: &str,
        kind: ViewKind,
        description: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let key = match optional(key) {
            Some(k) => k.to_string(),
            None => self.generated_view_key(default_prefix),
        };
        let description = description.map(str::to_owned);
        let index = self
            .ws_mut()?
            .views
            .add_view(&key, kind, description.as_deref())?;
        self.push(Frame::View { index });
        self.listener.on_parsed_view(file, line_number, &key);
        Ok(true)
    }

    fn resolve_software_system(&self, token: &str) -> Result<ElementId, ParseError> {
        let resolved = self.register.element(token).filter(|id| {
            self.workspace
                .as_ref()
                .is_some_and(|ws| matches!(ws.model.element(*id).kind, ElementKind::SoftwareSystem { .. }))
        });
        resolved.ok_or_else(|| {
            ParseError::new(format!("The software system \"{}\" does not exist", token))
        })
    }

    fn resolve_container(&self, token: &str) -> Result<ElementId, ParseError> {
        let resolved = self.register.element(token).filter(|id| {
            self.workspace
                .as_ref()
                .is_some_and(|ws| ws.model.element(*id).kind == ElementKind::Container)
        });
        resolved
            .ok_or_else(|| ParseError::new(format!("The container \"{}\" does not exist", token)))
    }

    pub(crate) fn parse_custom_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        self.create_view(
            t.get(1),
            "Custom",
            ViewKind::Custom,
            optional(t.get(3)),
            file,
            line_number,
        )?;
        if let Some(title) = optional(t.get(2)) {
            let title = title.to_string();
            if let Some(Frame::View { index }) = self.top().cloned() {
                self.ws_mut()?.views.views[index].title = Some(title);
            }
        }
        Ok(true)
    }

    pub(crate) fn parse_system_landscape_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        self.create_view(
            t.get(1),
            "SystemLandscape",
            ViewKind::SystemLandscape,
            optional(t.get(2)),
            file,
            line_number,
        )
    }

    pub(crate) fn parse_system_context_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t.get(1).ok_or_else(|| {
            ParseError::new(
                "Expected: systemContext <software system identifier> [key] [description]",
            )
        })?;
        let software_system = self.resolve_software_system(target)?;
        self.create_view(
            t.get(2),
            "SystemContext",
            ViewKind::SystemContext { software_system },
            optional(t.get(3)),
            file,
            line_number,
        )
    }

    pub(crate) fn parse_container_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t.get(1).ok_or_else(|| {
            ParseError::new("Expected: container <software system identifier> [key] [description]")
        })?;
        let software_system = self.resolve_software_system(target)?;
        self.create_view(
            t.get(2),
            "Container",
            ViewKind::Container { software_system },
            optional(t.get(3)),
            file,
            line_number,
        )
    }

    pub(crate) fn parse_component_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t.get(1).ok_or_else(|| {
            ParseError::new("Expected: component <container identifier> [key] [description]")
        })?;
        let container = self.resolve_container(target)?;
        self.create_view(
            t.get(2),
            "Component",
            ViewKind::Component { container },
            optional(t.get(3)),
            file,
            line_number,
        )
    }

    pub(crate) fn parse_dynamic_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let target = t.get(1).ok_or_else(|| {
            ParseError::new(
                "Expected: dynamic <*|software system identifier|container identifier> [key] [description]",
            )
        })?;
        let scope = if target == "*" {
            None
        } else {
            let element = self.register.element(target).filter(|id| {
                self.workspace.as_ref().is_some_and(|ws| {
                    matches!(
                        ws.model.element(*id).kind,
                        ElementKind::SoftwareSystem { .. } | ElementKind::Container
                    )
                })
            });
            Some(element.ok_or_else(|| {
                ParseError::new(format!(
                    "The software system or container \"{}\" does not exist",
                    target
                ))
            })?)
        };
        self.create_view(
            t.get(2),
            "Dynamic",
            ViewKind::Dynamic { scope },
            optional(t.get(3)),
            file,
            line_number,
        )
    }

    pub(crate) fn parse_deployment_view(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let usage =
            "Expected: deployment <*|software system identifier> <environment> [key] [description]";
        let t = tokens.without_context_start();
        let scope_token = t.get(1).ok_or_else(|| ParseError::new(usage))?;
        let environment_token = t.get(2).ok_or_else(|| ParseError::new(usage))?.to_string();

        let scope = if scope_token == "*" {
            None
        } else {
            Some(self.resolve_software_system(scope_token)?)
        };
        // the environment may be an identifier of a deployment environment,
        // or a literal environment name
        let environment = match self.register.element(&environment_token) {
            Some(id)
                if self.workspace.as_ref().is_some_and(|ws| {
                    ws.model.element(id).kind == ElementKind::DeploymentEnvironment
                }) =>
            {
                match &self.workspace {
                    Some(ws) => ws.model.element(id).name.clone(),
                    None => environment_token.clone(),
                }
            }
            _ => environment_token.clone(),
        };
        self.create_view(
            t.get(3),
            "Deployment",
            ViewKind::Deployment { scope, environment },
            optional(t.get(4)),
            file,
            line_number,
        )
    }

    pub(crate) fn parse_filtered_view(
        &mut self,
        tokens: &Tokens,
        _file: &Path,
        _line_number: u32,
    ) -> Result<bool, ParseError> {
        let usage = "Expected: filtered <baseKey> <include|exclude> <tags> [key] [description]";
        let base_key = tokens
            .get(1)
            .ok_or_else(|| ParseError::new(usage))?
            .to_string();
        let mode = match tokens.get(2) {
            Some(m) if m.eq_ignore_ascii_case("include") => FilterMode::Include,
            Some(m) if m.eq_ignore_ascii_case("exclude") => FilterMode::Exclude,
            Some(_) => return Err(ParseError::new("Filter mode should be include or exclude")),
            None => return Err(ParseError::new(usage)),
        };
        let tags: Vec<String> = tokens
            .get(3)
            .ok_or_else(|| ParseError::new(usage))?
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let key = match optional(tokens.get(4)) {
            Some(k) => k.to_string(),
            None => self.generated_view_key("Filtered"),
        };
        let description = optional(tokens.get(5)).map(str::to_owned);

        self.ws_mut()?.views.add_filtered_view(FilteredView {
            key,
            base_key,
            mode,
            tags,
            description,
        })?;
        Ok(true)
    }

    // ── View content ─────────────────────────────────────────────────

    pub(crate) fn parse_view_include(
        &mut self,
        index: usize,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let args: Vec<String> = tokens.iter().skip(1).map(str::to_owned).collect();
        if args.is_empty() {
            return Err(ParseError::new(
                "Expected: include <*|identifier|expression> [identifier|expression...]",
            ));
        }
        for expr in expressions(&args)? {
            self.apply_include(index, expr)?;
        }
        Ok(true)
    }

    pub(crate) fn parse_view_exclude(
        &mut self,
        index: usize,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let args: Vec<String> = tokens.iter().skip(1).map(str::to_owned).collect();
        if args.is_empty() {
            return Err(ParseError::new(
                "Expected: exclude <*|identifier|expression> [identifier|expression...]",
            ));
        }
        for expr in expressions(&args)? {
            self.apply_exclude(index, expr)?;
        }
        Ok(true)
    }

    fn apply_include(&mut self, index: usize, expr: ViewExpr) -> Result<(), ParseError> {
        match expr {
            ViewExpr::All => {
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                add_default_elements(model, view);
                Ok(())
            }
            ViewExpr::Identifier(id) => self.include_identifier(index, &id),
            ViewExpr::ElementTag(tag) => {
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                let matching: Vec<ElementId> = model
                    .elements()
                    .filter(|e| e.has_tag(&tag))
                    .map(|e| e.id)
                    .collect();
                for id in matching {
                    add_element_with_relationships(model, view, id);
                }
                Ok(())
            }
            ViewExpr::RelationshipTag(tag) => {
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                for r in model.relationships() {
                    if r.has_tag(&tag)
                        && view.contains_element(r.source)
                        && view.contains_element(r.destination)
                    {
                        view.add_relationship(r.id);
                    }
                }
                Ok(())
            }
            ViewExpr::Relationship {
                source,
                destination,
            } => {
                let source = self.resolve_selector_to_concrete(source)?;
                let destination = self.resolve_selector_to_concrete(destination)?;
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                for r in model.relationships() {
                    let src_ok = match &source {
                        Concrete::Element(e) => r.source == *e,
                        Concrete::Selector(s) => selector_matches(model, s, r.source),
                    };
                    let dst_ok = match &destination {
                        Concrete::Element(e) => r.destination == *e,
                        Concrete::Selector(s) => selector_matches(model, s, r.destination),
                    };
                    if src_ok
                        && dst_ok
                        && view.contains_element(r.source)
                        && view.contains_element(r.destination)
                    {
                        view.add_relationship(r.id);
                    }
                }
                Ok(())
            }
        }
    }

    fn apply_exclude(&mut self, index: usize, expr: ViewExpr) -> Result<(), ParseError> {
        match expr {
            ViewExpr::All => {
                let ws = self.ws_mut()?;
                let view = &mut ws.views.views[index];
                view.elements.clear();
                view.relationships.clear();
                Ok(())
            }
            ViewExpr::Identifier(id) => {
                if let Some(element) = self.register.element(&id) {
                    let ws = self.ws_mut()?;
                    let model = &ws.model;
                    let view = &mut ws.views.views[index];
                    remove_element_from_view(model, view, element);
                    return Ok(());
                }
                if let Some(relationship) = self.register.relationship(&id) {
                    let ws = self.ws_mut()?;
                    ws.views.views[index].remove_relationship(relationship);
                    return Ok(());
                }
                Err(ParseError::new(format!(
                    "The element/relationship \"{}\" does not exist",
                    id
                )))
            }
            ViewExpr::ElementTag(tag) => {
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                let matching: Vec<ElementId> = view
                    .elements
                    .iter()
                    .copied()
                    .filter(|id| model.element(*id).has_tag(&tag))
                    .collect();
                for id in matching {
                    remove_element_from_view(model, view, id);
                }
                Ok(())
            }
            ViewExpr::RelationshipTag(tag) => {
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                view.relationships
                    .retain(|rv| !model.relationship(rv.relationship).has_tag(&tag));
                Ok(())
            }
            ViewExpr::Relationship {
                source,
                destination,
            } => {
                let source = self.resolve_selector_to_concrete(source)?;
                let destination = self.resolve_selector_to_concrete(destination)?;
                let ws = self.ws_mut()?;
                let model = &ws.model;
                let view = &mut ws.views.views[index];
                view.relationships.retain(|rv| {
                    let r = model.relationship(rv.relationship);
                    let src_ok = match &source {
                        Concrete::Element(e) => r.source == *e,
                        Concrete::Selector(s) => selector_matches(model, s, r.source),
                    };
                    let dst_ok = match &destination {
                        Concrete::Element(e) => r.destination == *e,
                        Concrete::Selector(s) => selector_matches(model, s, r.destination),
                    };
                    !(src_ok && dst_ok)
                });
                Ok(())
            }
        }
    }

    fn resolve_selector_to_concrete(&self, s: Selector) -> Result<Concrete, ParseError> {
        match s {
            Selector::Identifier(id) => match self.register.element(&id) {
                Some(element) => Ok(Concrete::Element(element)),
                None => Err(ParseError::new(format!(
                    "The element \"{}\" does not exist",
                    id
                ))),
            },
            other => Ok(Concrete::Selector(other)),
        }
    }

    fn include_identifier(&mut self, index: usize, id: &str) -> Result<(), ParseError> {
        if let Some(element) = self.register.element(id) {
            let ws = self.ws_mut()?;
            let model = &ws.model;
            let view = &mut ws.views.views[index];
            if let ViewKind::Deployment { environment, .. } = view.kind.clone() {
                include_in_deployment_view(model, view, element, &environment);
            } else {
                add_element_with_relationships(model, view, element);
            }
            return Ok(());
        }
        if let Some(relationship) = self.register.relationship(id) {
            let ws = self.ws_mut()?;
            let model = &ws.model;
            let view = &mut ws.views.views[index];
            let (source, destination) = {
                let r = model.relationship(relationship);
                (r.source, r.destination)
            };
            view.add_element(source);
            view.add_element(destination);
            view.add_relationship(relationship);
            return Ok(());
        }
        Err(ParseError::new(format!(
            "The element/relationship \"{}\" does not exist",
            id
        )))
    }

    // ── Layout, animation, title, themes ─────────────────────────────

    pub(crate) fn parse_auto_layout(
        &mut self,
        index: usize,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let mut layout = AutoLayout::default();
        if let Some(direction) = optional(tokens.get(1)) {
            layout.rank_direction = match direction.to_lowercase().as_str() {
                "tb" => RankDirection::TopBottom,
                "bt" => RankDirection::BottomTop,
                "lr" => RankDirection::LeftRight,
                "rl" => RankDirection::RightLeft,
                _ => return Err(ParseError::new("Valid directions are: tb|bt|lr|rl")),
            };
        }
        if let Some(sep) = optional(tokens.get(2)) {
            layout.rank_separation = sep
                .parse::<u32>()
                .map_err(|_| ParseError::new("The rank separation must be a positive integer"))?;
        }
        if let Some(sep) = optional(tokens.get(3)) {
            layout.node_separation = sep
                .parse::<u32>()
                .map_err(|_| ParseError::new("The node separation must be a positive integer"))?;
        }
        self.ws_mut()?.views.views[index].auto_layout = Some(layout);
        Ok(true)
    }

    pub(crate) fn parse_view_title(
        &mut self,
        index: usize,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let title = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: title <title>"))?
            .to_string();
        self.ws_mut()?.views.views[index].title = Some(title);
        Ok(true)
    }

    pub(crate) fn parse_animation_step(
        &mut self,
        index: usize,
        tokens: Tokens,
    ) -> Result<bool, ParseError> {
        if tokens.size() == 0 {
            return Err(ParseError::new(
                "Expected: animationStep <identifier> [identifier...]",
            ));
        }
        let mut elements = Vec::new();
        for token in tokens.iter() {
            let element = self.register.element(token).ok_or_else(|| {
                ParseError::new(format!("The element \"{}\" does not exist", token))
            })?;
            elements.push(element);
        }
        let ws = self.ws_mut()?;
        let view = &mut ws.views.views[index];
        for element in &elements {
            if !view.contains_element(*element) {
                return Err(ParseError::new(
                    "The element does not exist in this view",
                ));
            }
        }
        let order = view.animations.len() as u32 + 1;
        view.animations.push(AnimationStep { order, elements });
        Ok(true)
    }

    pub(crate) fn parse_themes(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        if tokens.size() < 2 {
            return Err(ParseError::new("Expected: theme <url> [url...]"));
        }
        let urls: Vec<String> = tokens.iter().skip(1).map(str::to_owned).collect();
        let ws = self.ws_mut()?;
        for url in urls {
            ws.views.add_theme(&url);
        }
        Ok(true)
    }
}

enum Concrete {
    Element(ElementId),
    Selector(Selector),
}

fn include_in_deployment_view(
    model: &Model,
    view: &mut View,
    element: ElementId,
    environment: &str,
) {
    match model.element(element).kind {
        ElementKind::SoftwareSystem { .. } | ElementKind::Container => {
            for e in model.elements() {
                let of = match &e.kind {
                    ElementKind::SoftwareSystemInstance { of, environment: env, .. }
                    | ElementKind::ContainerInstance { of, environment: env, .. }
                        if env == environment =>
                    {
                        Some(*of)
                    }
                    _ => None,
                };
                if let Some(of) = of {
                    if of == element || model.ancestors(of).contains(&element) {
                        add_with_ancestors(model, view, e.id);
                    }
                }
            }
        }
        ElementKind::DeploymentNode { .. } => {
            add_with_ancestors(model, view, element);
            let mut queue = vec![element];
            while let Some(next) = queue.pop() {
                for child in model.children(next) {
                    add_element_with_relationships(model, view, child.id);
                    queue.push(child.id);
                }
            }
        }
        ElementKind::InfrastructureNode { .. }
        | ElementKind::SoftwareSystemInstance { .. }
        | ElementKind::ContainerInstance { .. } => {
            add_with_ancestors(model, view, element);
        }
        _ => {
            add_element_with_relationships(model, view, element);
        }
    }
}
