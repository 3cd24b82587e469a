//! Context frames: what is currently being described.
//!
//! Each nesting level of the DSL pushes a frame; productions are guarded by
//! the frame on top of the stack. Frames carry arena handles rather than
//! references, so the stack stays independent of the workspace's ownership.

use blueprint_model::{ElementId, RelationshipId};
use std::collections::BTreeMap;

/// The model item a `tags`/`url`/`properties`/`perspectives` line applies
/// to: either an element or a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelItemRef {
    Element(ElementId),
    Relationship(RelationshipId),
}

/// A frame on the context stack. Grouping re-pushes the parent variant with
/// `group` set, so "a group is open here" is part of the frame itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Workspace,
    Model {
        group: Option<String>,
    },
    Enterprise {
        group: Option<String>,
    },
    Person {
        element: ElementId,
    },
    SoftwareSystem {
        element: ElementId,
        group: Option<String>,
    },
    Container {
        element: ElementId,
        group: Option<String>,
    },
    Component {
        element: ElementId,
    },
    CustomElement {
        element: ElementId,
    },
    DeploymentEnvironment {
        environment: String,
    },
    DeploymentNode {
        element: ElementId,
    },
    InfrastructureNode {
        element: ElementId,
    },
    SoftwareSystemInstance {
        element: ElementId,
    },
    ContainerInstance {
        element: ElementId,
    },
    Relationship {
        relationship: RelationshipId,
    },
    ModelItemProperties {
        item: ModelItemRef,
    },
    ModelItemPerspectives {
        item: ModelItemRef,
    },
    Views,
    View {
        index: usize,
    },
    DynamicViewParallelSequence {
        index: usize,
    },
    ViewAnimation {
        index: usize,
    },
    Styles,
    ElementStyle {
        tag: String,
    },
    RelationshipStyle {
        tag: String,
    },
    Branding,
    Terminology,
    Configuration,
    Users,
    Plugin {
        name: String,
        parameters: BTreeMap<String, String>,
    },
    InlineScript {
        language: String,
        lines: Vec<String>,
    },
    Comment,
}

impl Frame {
    /// The element being edited in this frame, if any.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Frame::Person { element }
            | Frame::SoftwareSystem { element, .. }
            | Frame::Container { element, .. }
            | Frame::Component { element }
            | Frame::CustomElement { element }
            | Frame::DeploymentNode { element }
            | Frame::InfrastructureNode { element }
            | Frame::SoftwareSystemInstance { element }
            | Frame::ContainerInstance { element } => Some(*element),
            _ => None,
        }
    }

    /// The element or relationship that `tags`, `url`, `description`,
    /// `properties` and `perspectives` lines mutate in this frame.
    pub fn model_item(&self) -> Option<ModelItemRef> {
        match self {
            Frame::Relationship { relationship } => Some(ModelItemRef::Relationship(*relationship)),
            _ => self.element().map(ModelItemRef::Element),
        }
    }

    /// Whether an implicit relationship (`-> dst ...`) can be sourced from
    /// this frame.
    pub fn is_relationship_source(&self) -> bool {
        matches!(
            self,
            Frame::Person { .. }
                | Frame::SoftwareSystem { .. }
                | Frame::Container { .. }
                | Frame::Component { .. }
                | Frame::CustomElement { .. }
                | Frame::DeploymentNode { .. }
                | Frame::InfrastructureNode { .. }
                | Frame::SoftwareSystemInstance { .. }
                | Frame::ContainerInstance { .. }
        )
    }

    /// Whether explicit relationships (`src -> dst ...`) may appear here.
    pub fn allows_explicit_relationship(&self) -> bool {
        self.is_relationship_source()
            || matches!(
                self,
                Frame::Model { .. } | Frame::Enterprise { .. } | Frame::DeploymentEnvironment { .. }
            )
    }

    /// The group currently open in this frame, if any.
    pub fn group(&self) -> Option<&str> {
        match self {
            Frame::Model { group }
            | Frame::Enterprise { group }
            | Frame::SoftwareSystem { group, .. }
            | Frame::Container { group, .. } => group.as_deref(),
            _ => None,
        }
    }

    /// Short name used in listener callbacks and wrong-context errors.
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Workspace => "workspace",
            Frame::Model { .. } => "model",
            Frame::Enterprise { .. } => "enterprise",
            Frame::Person { .. } => "person",
            Frame::SoftwareSystem { .. } => "softwareSystem",
            Frame::Container { .. } => "container",
            Frame::Component { .. } => "component",
            Frame::CustomElement { .. } => "element",
            Frame::DeploymentEnvironment { .. } => "deploymentEnvironment",
            Frame::DeploymentNode { .. } => "deploymentNode",
            Frame::InfrastructureNode { .. } => "infrastructureNode",
            Frame::SoftwareSystemInstance { .. } => "softwareSystemInstance",
            Frame::ContainerInstance { .. } => "containerInstance",
            Frame::Relationship { .. } => "relationship",
            Frame::ModelItemProperties { .. } => "properties",
            Frame::ModelItemPerspectives { .. } => "perspectives",
            Frame::Views => "views",
            Frame::View { .. } => "view",
            Frame::DynamicViewParallelSequence { .. } => "parallelSequence",
            Frame::ViewAnimation { .. } => "animation",
            Frame::Styles => "styles",
            Frame::ElementStyle { .. } => "elementStyle",
            Frame::RelationshipStyle { .. } => "relationshipStyle",
            Frame::Branding => "branding",
            Frame::Terminology => "terminology",
            Frame::Configuration => "configuration",
            Frame::Users => "users",
            Frame::Plugin { .. } => "plugin",
            Frame::InlineScript { .. } => "script",
            Frame::Comment => "comment",
        }
    }
}
