//! blueprint-core: the Blueprint DSL parser engine.
//!
//! A line-oriented, context-stack-driven recogniser. Each source line is
//! tokenised (respecting quoted strings and escapes), run through constant
//! and environment substitution, and dispatched against the top of the
//! context stack: a keyword either executes a directive, mutates the entity
//! currently being described, or pushes a new nested context. Identifiers
//! are registered as elements and relationships are created, and `!include`
//! recursively feeds additional sources through the same pipeline.
//!
//! # Public API
//!
//! - [`DslParser`] -- `parse_file` / `parse_str`, restricted mode,
//!   identifier scope, workspace access
//! - [`ParserListener`] -- best-effort progress callbacks
//! - [`ParseError`] -- every failure carries file/line/source-line
//!   provenance
//! - [`ScriptEngine`], [`PluginRunner`], [`DocumentationImporter`] --
//!   seams for the external execution engines
//! - [`SourceProvider`] -- file I/O abstraction (filesystem or in-memory)

pub mod context;
pub mod error;
pub mod hooks;
pub mod include;
pub mod listener;
pub mod parser;
mod productions;
pub mod registry;
pub mod source;
pub mod substitution;
pub mod tokens;

pub use context::Frame;
pub use error::ParseError;
pub use hooks::{DocumentationImporter, PluginRunner, ScriptEngine};
pub use listener::{NoopListener, ParserListener};
pub use parser::DslParser;
pub use registry::{IdentifierScope, IdentifiersRegister};
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
