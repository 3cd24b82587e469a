//! Views: diagram definitions over the model, plus the view-level
//! presentation collections (styles, branding, terminology, themes).

use crate::element::ElementId;
use crate::error::ModelError;
use crate::relationship::RelationshipId;
use crate::styles::Styles;
use crate::workspace::{Branding, Terminology};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME_URL: &str = "https://static.blueprint-dsl.org/themes/default/theme.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDirection {
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

/// Automatic layout hint for a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoLayout {
    pub rank_direction: RankDirection,
    pub rank_separation: u32,
    pub node_separation: u32,
}

impl Default for AutoLayout {
    fn default() -> Self {
        AutoLayout {
            rank_direction: RankDirection::TopBottom,
            rank_separation: 300,
            node_separation: 300,
        }
    }
}

/// What a view is a view *of*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewKind {
    Custom,
    SystemLandscape,
    SystemContext { software_system: ElementId },
    Container { software_system: ElementId },
    Component { container: ElementId },
    Dynamic { scope: Option<ElementId> },
    Deployment { scope: Option<ElementId>, environment: String },
}

/// A relationship placed on a view; dynamic views add an ordering and an
/// overriding description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipView {
    pub relationship: RelationshipId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationStep {
    pub order: u32,
    pub elements: Vec<ElementId>,
}

/// Step counter for dynamic views. Parallel sequences share their starting
/// index: `{` saves the counter, `}` restores it and advances by one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceCounter {
    current: u32,
    saved: Vec<u32>,
}

impl SequenceCounter {
    pub fn next(&mut self) -> String {
        self.current += 1;
        self.current.to_string()
    }

    pub fn start_parallel(&mut self) {
        self.saved.push(self.current);
    }

    pub fn end_parallel(&mut self) {
        if let Some(saved) = self.saved.pop() {
            self.current = saved + 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub key: String,
    pub kind: ViewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub elements: Vec<ElementId>,
    pub relationships: Vec<RelationshipView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_layout: Option<AutoLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub animations: Vec<AnimationStep>,
    #[serde(default)]
    pub sequence: SequenceCounter,
}

impl View {
    fn new(key: &str, kind: ViewKind, description: Option<&str>) -> Self {
        View {
            key: key.to_string(),
            kind,
            title: None,
            description: description.map(str::to_owned),
            elements: Vec::new(),
            relationships: Vec::new(),
            auto_layout: None,
            animations: Vec::new(),
            sequence: SequenceCounter::default(),
        }
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains(&id)
    }

    pub fn add_element(&mut self, id: ElementId) {
        if !self.contains_element(id) {
            self.elements.push(id);
        }
    }

    pub fn remove_element(&mut self, id: ElementId) {
        self.elements.retain(|e| *e != id);
    }

    pub fn add_relationship(&mut self, id: RelationshipId) {
        if !self.relationships.iter().any(|rv| rv.relationship == id) {
            self.relationships.push(RelationshipView {
                relationship: id,
                description: None,
                order: None,
            });
        }
    }

    pub fn remove_relationship(&mut self, id: RelationshipId) {
        self.relationships.retain(|rv| rv.relationship != id);
    }

    /// Add an ordered step to a dynamic view.
    pub fn add_dynamic_step(&mut self, id: RelationshipId, description: Option<&str>) {
        let order = self.sequence.next();
        self.relationships.push(RelationshipView {
            relationship: id,
            description: description.map(str::to_owned),
            order: Some(order),
        });
    }
}

/// Include/exclude filter mode for filtered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    Include,
    Exclude,
}

/// A view defined as a tag filter over a base view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredView {
    pub key: String,
    pub base_key: String,
    pub mode: FilterMode,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The collection of views plus workspace-level presentation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewSet {
    pub views: Vec<View>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub filtered: Vec<FilteredView>,
    #[serde(default)]
    pub styles: Styles,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub terminology: Terminology,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub themes: Vec<String>,
}

impl ViewSet {
    fn assert_key_free(&self, key: &str) -> Result<(), ModelError> {
        if self.views.iter().any(|v| v.key == key)
            || self.filtered.iter().any(|v| v.key == key)
        {
            return Err(ModelError::DuplicateViewKey(key.to_string()));
        }
        Ok(())
    }

    /// Create a view and return its index into [`ViewSet::views`].
    pub fn add_view(
        &mut self,
        key: &str,
        kind: ViewKind,
        description: Option<&str>,
    ) -> Result<usize, ModelError> {
        self.assert_key_free(key)?;
        self.views.push(View::new(key, kind, description));
        Ok(self.views.len() - 1)
    }

    pub fn add_filtered_view(&mut self, view: FilteredView) -> Result<(), ModelError> {
        self.assert_key_free(&view.key)?;
        self.filtered.push(view);
        Ok(())
    }

    pub fn view(&self, key: &str) -> Option<&View> {
        self.views.iter().find(|v| v.key == key)
    }

    pub fn add_theme(&mut self, url: &str) {
        let url = if url.eq_ignore_ascii_case("default") {
            DEFAULT_THEME_URL
        } else {
            url
        };
        if !self.themes.iter().any(|t| t == url) {
            self.themes.push(url.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_view_keys_rejected_across_kinds() {
        let mut views = ViewSet::default();
        views
            .add_view("k", ViewKind::SystemLandscape, None)
            .unwrap();
        let err = views.add_view("k", ViewKind::Custom, None).unwrap_err();
        assert_eq!(err, ModelError::DuplicateViewKey("k".to_string()));
        let err = views
            .add_filtered_view(FilteredView {
                key: "k".to_string(),
                base_key: "other".to_string(),
                mode: FilterMode::Include,
                tags: vec!["Element".to_string()],
                description: None,
            })
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateViewKey("k".to_string()));
    }

    #[test]
    fn dynamic_steps_are_numbered_sequentially() {
        let mut view = View::new("d", ViewKind::Dynamic { scope: None }, None);
        view.add_dynamic_step(RelationshipId(0), Some("First"));
        view.add_dynamic_step(RelationshipId(1), None);
        let orders: Vec<_> = view
            .relationships
            .iter()
            .map(|rv| rv.order.clone().unwrap())
            .collect();
        assert_eq!(orders, vec!["1", "2"]);
    }

    #[test]
    fn parallel_sequences_share_their_starting_index() {
        let mut counter = SequenceCounter::default();
        assert_eq!(counter.next(), "1");
        counter.start_parallel();
        assert_eq!(counter.next(), "2");
        assert_eq!(counter.next(), "3");
        counter.end_parallel();
        // after the parallel block, numbering continues from the saved
        // position plus one
        assert_eq!(counter.next(), "3");
    }

    #[test]
    fn theme_keyword_default_expands_to_url() {
        let mut views = ViewSet::default();
        views.add_theme("default");
        assert_eq!(views.themes, vec![DEFAULT_THEME_URL.to_string()]);
    }
}
