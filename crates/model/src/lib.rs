//! blueprint-model: the architecture workspace data model.
//!
//! A [`Workspace`] owns a [`Model`] (people, software systems, containers,
//! components, deployment topology, relationships) and a [`ViewSet`]
//! (diagram definitions, styles, branding, terminology). Elements and
//! relationships live in arenas and are addressed by [`ElementId`] /
//! [`RelationshipId`] handles, so parents are plain indices rather than
//! back-pointers.
//!
//! The model is mutated through a narrow builder API (`Model::add_*`,
//! `ViewSet::add_view`); structural misuse surfaces as [`ModelError`].

pub mod element;
pub mod error;
pub mod model;
pub mod relationship;
pub mod styles;
pub mod views;
pub mod workspace;

pub use element::{Element, ElementId, ElementKind, HealthCheck, Location};
pub use error::ModelError;
pub use model::{ImpliedRelationships, Model};
pub use relationship::{Relationship, RelationshipId};
pub use styles::{Border, ElementStyle, RelationshipStyle, Routing, Shape, Styles};
pub use views::{
    AnimationStep, AutoLayout, FilterMode, FilteredView, RankDirection, RelationshipView, View,
    ViewKind, ViewSet,
};
pub use workspace::{Branding, Configuration, Font, Role, Terminology, Workspace};
