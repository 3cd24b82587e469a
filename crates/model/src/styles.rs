//! Element and relationship styling, keyed by tag.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Box,
    RoundedBox,
    Circle,
    Ellipse,
    Hexagon,
    Cylinder,
    Pipe,
    Person,
    Robot,
    Folder,
    WebBrowser,
    MobileDevicePortrait,
    MobileDeviceLandscape,
    Component,
}

impl Shape {
    pub fn parse(s: &str) -> Option<Shape> {
        let shape = match s.to_lowercase().as_str() {
            "box" => Shape::Box,
            "roundedbox" => Shape::RoundedBox,
            "circle" => Shape::Circle,
            "ellipse" => Shape::Ellipse,
            "hexagon" => Shape::Hexagon,
            "cylinder" => Shape::Cylinder,
            "pipe" => Shape::Pipe,
            "person" => Shape::Person,
            "robot" => Shape::Robot,
            "folder" => Shape::Folder,
            "webbrowser" => Shape::WebBrowser,
            "mobiledeviceportrait" => Shape::MobileDevicePortrait,
            "mobiledevicelandscape" => Shape::MobileDeviceLandscape,
            "component" => Shape::Component,
            _ => return None,
        };
        Some(shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Border {
    Solid,
    Dashed,
    Dotted,
}

impl Border {
    pub fn parse(s: &str) -> Option<Border> {
        match s.to_lowercase().as_str() {
            "solid" => Some(Border::Solid),
            "dashed" => Some(Border::Dashed),
            "dotted" => Some(Border::Dotted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Routing {
    Direct,
    Orthogonal,
    Curved,
}

impl Routing {
    pub fn parse(s: &str) -> Option<Routing> {
        match s.to_lowercase().as_str() {
            "direct" => Some(Routing::Direct),
            "orthogonal" => Some(Routing::Orthogonal),
            "curved" => Some(Routing::Curved),
            _ => None,
        }
    }
}

/// Presentation rules for elements carrying a given tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Presentation rules for relationships carrying a given tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipStyle {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Position of the label along the line, 0..100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Styles {
    pub elements: Vec<ElementStyle>,
    pub relationships: Vec<RelationshipStyle>,
}

impl Styles {
    /// Fetch or create the style block for an element tag. Re-opening an
    /// existing tag continues editing it.
    pub fn element_style(&mut self, tag: &str) -> &mut ElementStyle {
        let i = match self.elements.iter().position(|s| s.tag == tag) {
            Some(i) => i,
            None => {
                self.elements.push(ElementStyle {
                    tag: tag.to_string(),
                    ..ElementStyle::default()
                });
                self.elements.len() - 1
            }
        };
        &mut self.elements[i]
    }

    pub fn relationship_style(&mut self, tag: &str) -> &mut RelationshipStyle {
        let i = match self.relationships.iter().position(|s| s.tag == tag) {
            Some(i) => i,
            None => {
                self.relationships.push(RelationshipStyle {
                    tag: tag.to_string(),
                    ..RelationshipStyle::default()
                });
                self.relationships.len() - 1
            }
        };
        &mut self.relationships[i]
    }
}
