//! Seams for the external execution engines: scripts, plugins, and
//! documentation/ADR importers.
//!
//! The parser recognises the directives, collects parameters and script
//! bodies, and hands them to whatever implementation the embedder
//! installed. Engines report failures as strings; the parser wraps them
//! with provenance.

use blueprint_model::{ElementId, Workspace};
use std::collections::BTreeMap;
use std::path::Path;

/// Runs `!script` blocks and external script files.
pub trait ScriptEngine {
    fn run_inline(
        &mut self,
        language: &str,
        body: &str,
        workspace: &mut Workspace,
    ) -> Result<(), String>;

    fn run_external(&mut self, path: &Path, workspace: &mut Workspace) -> Result<(), String>;
}

/// Runs `!plugin` invocations with their collected `name value` parameters.
pub trait PluginRunner {
    fn run(
        &mut self,
        name: &str,
        parameters: &BTreeMap<String, String>,
        workspace: &mut Workspace,
    ) -> Result<(), String>;
}

/// Imports `!docs` / `!adrs` content into the workspace. `target` is the
/// software system the documentation belongs to, or `None` for the
/// workspace itself.
pub trait DocumentationImporter {
    fn import_docs(
        &mut self,
        path: &Path,
        workspace: &mut Workspace,
        target: Option<ElementId>,
    ) -> Result<(), String>;

    fn import_adrs(
        &mut self,
        path: &Path,
        workspace: &mut Workspace,
        target: Option<ElementId>,
    ) -> Result<(), String>;
}
