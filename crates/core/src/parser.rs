//! The DSL parser: public API and the context-stack dispatcher.
//!
//! Each production is enabled by (keyword, top-of-stack frame) pairs; the
//! handlers themselves live in the `productions` modules. Any line no
//! production claims fails with "Unexpected tokens" and provenance.

use crate::context::{Frame, ModelItemRef};
use crate::error::ParseError;
use crate::hooks::{DocumentationImporter, PluginRunner, ScriptEngine};
use crate::include;
use crate::listener::{NoopListener, ParserListener};
use crate::registry::{IdentifierScope, IdentifiersRegister};
use crate::source::{FileSystemProvider, SourceProvider};
use crate::substitution::substitute;
use crate::tokens::{self, Tokens, CONTEXT_END_TOKEN, RELATIONSHIP_TOKEN};
use blueprint_model::{ElementId, ViewKind, Workspace};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

const MULTI_LINE_COMMENT_START: &str = "/*";
const MULTI_LINE_COMMENT_END: &str = "*/";

/// The Blueprint DSL parser. One instance per parse; not shareable across
/// threads. All state (context stack, constants, identifier register, the
/// echoed-source accumulator) lives here.
pub struct DslParser {
    pub(crate) stack: Vec<Frame>,
    pub(crate) register: IdentifiersRegister,
    pub(crate) constants: HashMap<String, String>,
    pub(crate) dsl_source_lines: Vec<String>,
    pub(crate) workspace: Option<Workspace>,
    pub(crate) extending: bool,
    pub(crate) restricted: bool,
    pub(crate) listener: Box<dyn ParserListener>,
    pub(crate) script_engine: Option<Box<dyn ScriptEngine>>,
    pub(crate) plugin_runner: Option<Box<dyn PluginRunner>>,
    pub(crate) documentation_importer: Option<Box<dyn DocumentationImporter>>,
    pub(crate) provider: Rc<dyn SourceProvider>,
    pub(crate) include_stack: Vec<PathBuf>,
}

impl Default for DslParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DslParser {
    pub fn new() -> Self {
        Self::with_provider(Rc::new(FileSystemProvider))
    }

    /// Create a parser reading sources through the given provider (e.g. an
    /// in-memory provider for tests or sandboxed embedders).
    pub fn with_provider(provider: Rc<dyn SourceProvider>) -> Self {
        DslParser {
            stack: Vec::new(),
            register: IdentifiersRegister::default(),
            constants: HashMap::new(),
            dsl_source_lines: Vec::new(),
            workspace: None,
            extending: false,
            restricted: false,
            listener: Box::new(NoopListener),
            script_engine: None,
            plugin_runner: None,
            documentation_importer: None,
            provider,
            include_stack: Vec::new(),
        }
    }

    /// Restricted mode disables filesystem includes, documentation/ADR
    /// import, plugins, scripts, and environment variable substitution.
    pub fn set_restricted(&mut self, restricted: bool) {
        self.restricted = restricted;
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// True iff the workspace being parsed started from a non-empty model
    /// (the `workspace extends` form).
    pub fn is_extending(&self) -> bool {
        self.extending
    }

    pub fn identifier_scope(&self) -> IdentifierScope {
        self.register.identifier_scope()
    }

    pub fn set_identifier_scope(&mut self, scope: IdentifierScope) {
        self.register.set_identifier_scope(scope);
    }

    pub fn set_listener(&mut self, listener: Box<dyn ParserListener>) {
        self.listener = listener;
    }

    pub fn set_script_engine(&mut self, engine: Box<dyn ScriptEngine>) {
        self.script_engine = Some(engine);
    }

    pub fn set_plugin_runner(&mut self, runner: Box<dyn PluginRunner>) {
        self.plugin_runner = Some(runner);
    }

    pub fn set_documentation_importer(&mut self, importer: Box<dyn DocumentationImporter>) {
        self.documentation_importer = Some(importer);
    }

    pub fn identifiers_register(&self) -> &IdentifiersRegister {
        &self.register
    }

    /// The materialised workspace, with the echoed DSL re-attached. None
    /// until a `workspace` directive has been parsed.
    pub fn workspace(&mut self) -> Option<&Workspace> {
        let dsl = self.echoed_dsl();
        if let Some(ws) = self.workspace.as_mut() {
            ws.dsl = Some(dsl);
        }
        self.workspace.as_ref()
    }

    /// Consume the parser, yielding the workspace with the echoed DSL
    /// attached.
    pub fn into_workspace(mut self) -> Option<Workspace> {
        let dsl = self.echoed_dsl();
        self.workspace.map(|mut ws| {
            ws.dsl = Some(dsl);
            ws
        })
    }

    fn echoed_dsl(&self) -> String {
        let separator = if cfg!(windows) { "\r\n" } else { "\n" };
        let mut buf = String::new();
        for line in &self.dsl_source_lines {
            buf.push_str(line);
            buf.push_str(separator);
        }
        buf
    }

    // ── Parse entry points ───────────────────────────────────────────

    /// Parse a file, or every file under a directory (recursively, in
    /// lexicographic order).
    pub fn parse_file(&mut self, path: &Path) -> Result<(), ParseError> {
        if !self.provider.exists(path) {
            return Err(ParseError::new(format!(
                "The file at {} does not exist",
                path.display()
            )));
        }
        let files = self
            .provider
            .find_files(path)
            .map_err(|e| ParseError::new(format!("Could not read {}: {}", path.display(), e)))?;
        for file in files {
            debug!(file = %file.display(), "parsing");
            let source = self.provider.read_source(&file).map_err(|e| {
                ParseError::new(format!("Could not read {}: {}", file.display(), e))
            })?;
            let canonical = self
                .provider
                .canonicalize(&file)
                .unwrap_or_else(|_| file.clone());
            self.include_stack.push(canonical);
            let result = self.parse_source(&source, &file);
            self.include_stack.pop();
            result?;
        }
        Ok(())
    }

    /// Parse an in-memory DSL fragment.
    pub fn parse_str(&mut self, dsl: &str) -> Result<(), ParseError> {
        if dsl.trim().is_empty() {
            return Err(ParseError::new("A DSL fragment must be specified"));
        }
        self.parse_source(dsl, Path::new("."))
    }

    pub(crate) fn parse_source(&mut self, source: &str, file: &Path) -> Result<(), ParseError> {
        let mut lines: Vec<&str> = source
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        while lines.last() == Some(&"") {
            lines.pop();
        }
        for (index, line) in lines.iter().enumerate() {
            let line_number = index as u32 + 1;
            match self.handle_line(line, file, line_number) {
                Ok(echo) => {
                    if echo {
                        self.dsl_source_lines.push((*line).to_string());
                    }
                }
                Err(e) => return Err(e.at(file, line_number, line)),
            }
        }
        Ok(())
    }

    // ── Context stack ────────────────────────────────────────────────

    pub(crate) fn top(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.stack.push(frame);
    }

    pub(crate) fn ws_mut(&mut self) -> Result<&mut Workspace, ParseError> {
        self.workspace
            .as_mut()
            .ok_or_else(|| ParseError::new("No workspace has been defined"))
    }

    pub(crate) fn register_element_id(
        &mut self,
        identifier: Option<&str>,
        element: ElementId,
    ) -> Result<String, ParseError> {
        match &self.workspace {
            Some(ws) => self.register.register_element(identifier, element, &ws.model),
            None => Err(ParseError::new("No workspace has been defined")),
        }
    }

    /// Pop the top frame and run its `end` hook.
    pub(crate) fn end_context(&mut self) -> Result<(), ParseError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::new("Unexpected end of context"))?;
        match frame {
            Frame::Model { .. } => {
                if let Some(ws) = self.workspace.as_mut() {
                    ws.model.apply_enterprise_boundary();
                }
            }
            Frame::DynamicViewParallelSequence { index } => {
                if let Some(ws) = self.workspace.as_mut() {
                    ws.views.views[index].sequence.end_parallel();
                }
            }
            Frame::Plugin { name, parameters } => self.run_plugin(&name, &parameters)?,
            Frame::InlineScript { language, lines } => {
                self.run_inline_script(&language, &lines.join("\n"))?
            }
            _ => {}
        }
        Ok(())
    }

    fn run_plugin(
        &mut self,
        name: &str,
        parameters: &std::collections::BTreeMap<String, String>,
    ) -> Result<(), ParseError> {
        let ws = match self.workspace.as_mut() {
            Some(ws) => ws,
            None => return Err(ParseError::new("No workspace has been defined")),
        };
        match self.plugin_runner.as_mut() {
            Some(runner) => runner
                .run(name, parameters, ws)
                .map_err(|e| ParseError::new(format!("Error running plugin {}: {}", name, e))),
            None => Err(ParseError::new(format!(
                "Error running plugin {}: no plugin runner is installed",
                name
            ))),
        }
    }

    fn run_inline_script(&mut self, language: &str, body: &str) -> Result<(), ParseError> {
        let ws = match self.workspace.as_mut() {
            Some(ws) => ws,
            None => return Err(ParseError::new("No workspace has been defined")),
        };
        match self.script_engine.as_mut() {
            Some(engine) => engine
                .run_inline(language, body, ws)
                .map_err(|e| ParseError::new(format!("Error running inline script: {}", e))),
            None => Err(ParseError::new(
                "Error running inline script: no script engine is installed",
            )),
        }
    }

    pub(crate) fn run_external_script(&mut self, path: &Path) -> Result<(), ParseError> {
        let ws = match self.workspace.as_mut() {
            Some(ws) => ws,
            None => return Err(ParseError::new("No workspace has been defined")),
        };
        match self.script_engine.as_mut() {
            Some(engine) => engine.run_external(path, ws).map_err(|e| {
                ParseError::new(format!("Error running script {}: {}", path.display(), e))
            }),
            None => Err(ParseError::new(format!(
                "Error running script {}: no script engine is installed",
                path.display()
            ))),
        }
    }

    // ── The dispatcher ───────────────────────────────────────────────

    /// Handle one line. Returns whether the line is echoed into the
    /// preserved DSL source.
    fn handle_line(&mut self, line: &str, file: &Path, line_number: u32) -> Result<bool, ParseError> {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') {
            return Ok(true);
        }

        // inline scripts accumulate verbatim until a } line
        if matches!(self.top(), Some(Frame::InlineScript { .. })) {
            if trimmed == CONTEXT_END_TOKEN {
                self.end_context()?;
            } else if let Some(Frame::InlineScript { lines, .. }) = self.stack.last_mut() {
                lines.push(line.to_string());
            }
            return Ok(true);
        }

        // multi-line comments are discarded without tokenisation
        if matches!(self.top(), Some(Frame::Comment)) {
            if trimmed.ends_with(MULTI_LINE_COMMENT_END) {
                self.end_context()?;
            }
            return Ok(true);
        }
        if trimmed.starts_with(MULTI_LINE_COMMENT_START) {
            if !trimmed.ends_with(MULTI_LINE_COMMENT_END) {
                self.push(Frame::Comment);
            }
            return Ok(true);
        }

        let raw = tokens::tokenize(line)?;
        let substituted: Vec<String> = raw
            .iter()
            .map(|t| substitute(t, &self.constants, self.restricted))
            .collect();
        let mut tokens = Tokens::new(substituted);

        // identifier = ...
        let mut identifier: Option<String> = None;
        if tokens.size() > 3 && tokens.get(1) == Some(tokens::ASSIGNMENT_TOKEN) {
            let name = tokens.get_or_empty(0).to_string();
            IdentifiersRegister::validate_identifier_name(&name)?;
            identifier = Some(name);
            tokens = tokens.skip(2);
        }
        let identifier = identifier.as_deref();

        let first = tokens.get_or_empty(0).to_string();
        let first = first.as_str();

        if first == CONTEXT_END_TOKEN {
            let name = match self.stack.last() {
                Some(frame) => frame.name(),
                None => return Err(ParseError::new("Unexpected end of context")),
            };
            self.listener.on_end_context(file, line_number, name);
            self.end_context()?;
            return Ok(true);
        }

        self.dispatch(first, &tokens, identifier, file, line_number)
    }

    fn keyword(first: &str, keyword: &str) -> bool {
        first.eq_ignore_ascii_case(keyword)
    }

    #[allow(clippy::if_same_then_else)]
    fn dispatch(
        &mut self,
        first: &str,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        use DslParser as P;
        let top = self.top().cloned();

        // explicit relationship: src -> dst ...
        if tokens.size() > 2
            && tokens.get(1) == Some(RELATIONSHIP_TOKEN)
            && top.as_ref().is_some_and(Frame::allows_explicit_relationship)
        {
            return self.parse_explicit_relationship(tokens, identifier, file, line_number);
        }

        // implicit relationship: -> dst ...
        if tokens.size() >= 2
            && first == RELATIONSHIP_TOKEN
            && top.as_ref().is_some_and(Frame::is_relationship_source)
        {
            return self.parse_implicit_relationship(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "!ref") && self.in_model_or_model_item() {
            return self.parse_ref(tokens, identifier);
        }

        if P::keyword(first, "element") && matches!(top, Some(Frame::Model { .. })) {
            return self.parse_custom_element(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "person")
            && matches!(top, Some(Frame::Model { .. } | Frame::Enterprise { .. }))
        {
            return self.parse_person(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "softwareSystem")
            && matches!(top, Some(Frame::Model { .. } | Frame::Enterprise { .. }))
        {
            return self.parse_software_system(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "container")
            && matches!(top, Some(Frame::SoftwareSystem { .. }))
        {
            return self.parse_container(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "component") && matches!(top, Some(Frame::Container { .. })) {
            return self.parse_component(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "group")
            && top.as_ref().is_some_and(|f| {
                matches!(
                    f,
                    Frame::Model { .. }
                        | Frame::Enterprise { .. }
                        | Frame::SoftwareSystem { .. }
                        | Frame::Container { .. }
                ) && f.group().is_none()
            })
        {
            return self.parse_group(tokens, identifier, file, line_number);
        }

        // model item mutators
        if let Some(item) = top.as_ref().and_then(Frame::model_item) {
            if P::keyword(first, "tags") {
                return self.parse_tags(item, tokens);
            }
            if P::keyword(first, "url") {
                return self.parse_url(item, tokens);
            }
            if P::keyword(first, "description") {
                return self.parse_item_description(item, tokens);
            }
            if P::keyword(first, "technology") && self.item_supports_technology(item) {
                return self.parse_item_technology(item, tokens);
            }
            if P::keyword(first, "properties") {
                self.push(Frame::ModelItemProperties { item });
                return Ok(true);
            }
            if P::keyword(first, "perspectives") {
                self.push(Frame::ModelItemPerspectives { item });
                return Ok(true);
            }
        }

        if let Some(Frame::ModelItemProperties { item }) = &top {
            return self.parse_property(*item, tokens);
        }
        if let Some(Frame::ModelItemPerspectives { item }) = &top {
            return self.parse_perspective(*item, tokens);
        }

        if P::keyword(first, "workspace") && self.stack.is_empty() {
            return self.parse_workspace(tokens, file);
        }

        if P::keyword(first, "!impliedRelationships") || P::keyword(first, "impliedRelationships") {
            return self.parse_implied_relationships(tokens);
        }

        if matches!(top, Some(Frame::Workspace)) {
            if P::keyword(first, "name") {
                let ws = self.ws_mut()?;
                ws.name = tokens.get_or_empty(1).to_string();
                return Ok(true);
            }
            if P::keyword(first, "description") {
                let ws = self.ws_mut()?;
                ws.description = tokens.get_or_empty(1).to_string();
                return Ok(true);
            }
            if P::keyword(first, "model") {
                self.push(Frame::Model { group: None });
                return Ok(true);
            }
            if P::keyword(first, "views") {
                self.push(Frame::Views);
                return Ok(true);
            }
            if P::keyword(first, "configuration") {
                self.push(Frame::Configuration);
                return Ok(true);
            }
            if P::keyword(first, "!identifiers") {
                return self.parse_identifier_scope(tokens);
            }
        }

        if matches!(top, Some(Frame::Model { .. })) {
            if P::keyword(first, "enterprise") {
                return self.parse_enterprise(tokens);
            }
            if P::keyword(first, "deploymentEnvironment") {
                return self.parse_deployment_environment(tokens, identifier, file, line_number);
            }
        }

        if P::keyword(first, "deploymentGroup")
            && matches!(top, Some(Frame::DeploymentEnvironment { .. }))
        {
            return self.parse_deployment_group(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "deploymentNode")
            && matches!(
                top,
                Some(Frame::DeploymentEnvironment { .. } | Frame::DeploymentNode { .. })
            )
        {
            return self.parse_deployment_node(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "infrastructureNode")
            && matches!(top, Some(Frame::DeploymentNode { .. }))
        {
            return self.parse_infrastructure_node(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "softwareSystemInstance")
            && matches!(top, Some(Frame::DeploymentNode { .. }))
        {
            return self.parse_software_system_instance(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "containerInstance")
            && matches!(top, Some(Frame::DeploymentNode { .. }))
        {
            return self.parse_container_instance(tokens, identifier, file, line_number);
        }

        if P::keyword(first, "healthCheck")
            && matches!(
                top,
                Some(Frame::SoftwareSystemInstance { .. } | Frame::ContainerInstance { .. })
            )
        {
            return self.parse_health_check(tokens);
        }

        // views
        if matches!(top, Some(Frame::Views)) {
            if P::keyword(first, "customView") {
                return self.parse_custom_view(tokens, file, line_number);
            }
            if P::keyword(first, "systemLandscape") {
                return self.parse_system_landscape_view(tokens, file, line_number);
            }
            if P::keyword(first, "systemContext") {
                return self.parse_system_context_view(tokens, file, line_number);
            }
            if P::keyword(first, "container") {
                return self.parse_container_view(tokens, file, line_number);
            }
            if P::keyword(first, "component") {
                return self.parse_component_view(tokens, file, line_number);
            }
            if P::keyword(first, "dynamic") {
                return self.parse_dynamic_view(tokens, file, line_number);
            }
            if P::keyword(first, "deployment") {
                return self.parse_deployment_view(tokens, file, line_number);
            }
            if P::keyword(first, "filtered") {
                return self.parse_filtered_view(tokens, file, line_number);
            }
            if P::keyword(first, "styles") {
                self.push(Frame::Styles);
                return Ok(true);
            }
            if P::keyword(first, "branding") {
                self.push(Frame::Branding);
                return Ok(true);
            }
            if P::keyword(first, "terminology") {
                self.push(Frame::Terminology);
                return Ok(true);
            }
            if P::keyword(first, "theme") || P::keyword(first, "themes") {
                return self.parse_themes(tokens);
            }
        }

        // view content
        if let Some(Frame::View { index }) = &top {
            let index = *index;
            let dynamic = matches!(
                self.view_kind(index),
                Some(ViewKind::Dynamic { .. })
            );
            if dynamic {
                if tokens.size() > 2 && tokens.get(1) == Some(RELATIONSHIP_TOKEN) {
                    return self.parse_dynamic_view_relationship(index, tokens, identifier, file, line_number);
                }
                if first == tokens::CONTEXT_START_TOKEN {
                    if let Some(ws) = self.workspace.as_mut() {
                        ws.views.views[index].sequence.start_parallel();
                    }
                    self.push(Frame::DynamicViewParallelSequence { index });
                    return Ok(true);
                }
            } else {
                if P::keyword(first, "include") {
                    return self.parse_view_include(index, tokens);
                }
                if P::keyword(first, "exclude") {
                    return self.parse_view_exclude(index, tokens);
                }
                if P::keyword(first, "animation") && tokens.starts_context() {
                    self.push(Frame::ViewAnimation { index });
                    return Ok(true);
                }
                if P::keyword(first, "animationStep") {
                    return self.parse_animation_step(index, tokens.skip(1));
                }
            }
            if P::keyword(first, "autoLayout") {
                return self.parse_auto_layout(index, tokens);
            }
            if P::keyword(first, "title") {
                return self.parse_view_title(index, tokens);
            }
        }

        if let Some(Frame::DynamicViewParallelSequence { index }) = &top {
            if tokens.size() > 2 && tokens.get(1) == Some(RELATIONSHIP_TOKEN) {
                return self
                    .parse_dynamic_view_relationship(*index, tokens, identifier, file, line_number);
            }
        }

        if let Some(Frame::ViewAnimation { index }) = &top {
            return self.parse_animation_step(*index, tokens.clone());
        }

        // styles
        if matches!(top, Some(Frame::Styles)) {
            if P::keyword(first, "element") {
                return self.parse_element_style(tokens);
            }
            if P::keyword(first, "relationship") {
                return self.parse_relationship_style(tokens);
            }
        }
        if let Some(Frame::ElementStyle { tag }) = &top {
            return self.parse_element_style_property(tag.clone(), first, tokens, file, line_number);
        }
        if let Some(Frame::RelationshipStyle { tag }) = &top {
            return self
                .parse_relationship_style_property(tag.clone(), first, tokens, file, line_number);
        }

        if matches!(top, Some(Frame::Branding)) {
            if P::keyword(first, "logo") {
                return self.parse_branding_logo(tokens);
            }
            if P::keyword(first, "font") {
                return self.parse_branding_font(tokens);
            }
        }

        if matches!(top, Some(Frame::Terminology)) {
            return self.parse_terminology(first, tokens);
        }

        if P::keyword(first, "users") && matches!(top, Some(Frame::Configuration)) {
            self.push(Frame::Users);
            return Ok(true);
        }
        if matches!(top, Some(Frame::Users)) {
            return self.parse_user(tokens);
        }

        if P::keyword(first, "!docs")
            && matches!(top, Some(Frame::Workspace | Frame::SoftwareSystem { .. }))
        {
            if !self.restricted {
                return self.parse_docs(tokens, &top, file, false);
            }
            return Ok(true);
        }
        if P::keyword(first, "!adrs")
            && matches!(top, Some(Frame::Workspace | Frame::SoftwareSystem { .. }))
        {
            if !self.restricted {
                return self.parse_docs(tokens, &top, file, true);
            }
            return Ok(true);
        }

        if P::keyword(first, "!include") {
            return self.parse_include(tokens, file, line_number);
        }

        if P::keyword(first, "!constant") {
            return self.parse_constant(tokens);
        }

        if P::keyword(first, "!plugin") {
            if self.restricted {
                return Err(ParseError::new("Plugins are not available"));
            }
            return self.parse_plugin(tokens);
        }
        if let Some(Frame::Plugin { .. }) = &top {
            return self.parse_plugin_parameter(tokens);
        }

        if P::keyword(first, "!script") {
            if self.restricted {
                return Err(ParseError::new("Scripts are not available"));
            }
            return self.parse_script(tokens, file);
        }

        Err(ParseError::new("Unexpected tokens"))
    }

    fn in_model_or_model_item(&self) -> bool {
        match self.top() {
            Some(Frame::Model { .. }) => true,
            Some(frame) => frame.model_item().is_some(),
            None => false,
        }
    }

    fn item_supports_technology(&self, item: ModelItemRef) -> bool {
        use blueprint_model::ElementKind;
        match (&self.workspace, item) {
            (Some(_), ModelItemRef::Relationship(_)) => true,
            (Some(ws), ModelItemRef::Element(id)) => matches!(
                ws.model.element(id).kind,
                ElementKind::Container
                    | ElementKind::Component
                    | ElementKind::DeploymentNode { .. }
                    | ElementKind::InfrastructureNode { .. }
            ),
            (None, _) => false,
        }
    }

    pub(crate) fn view_kind(&self, index: usize) -> Option<ViewKind> {
        self.workspace
            .as_ref()
            .map(|ws| ws.views.views[index].kind.clone())
    }

    // ── !include ─────────────────────────────────────────────────────

    fn parse_include(
        &mut self,
        tokens: &Tokens,
        file: &Path,
        _line_number: u32,
    ) -> Result<bool, ParseError> {
        let target = match tokens.get(1) {
            Some(t) => t.to_string(),
            None => return Err(ParseError::new("Expected: !include <file|directory|url>")),
        };

        // in restricted mode only https includes run; anything else is
        // silently ignored and stays in the echoed source
        if self.restricted && !target.starts_with("https://") {
            return Ok(true);
        }

        if include::is_url(&target) {
            let pseudo = PathBuf::from(&target);
            if self.include_stack.contains(&pseudo) {
                return Err(ParseError::new(format!(
                    "Include cycle detected: {}",
                    target
                )));
            }
            debug!(url = %target, "including");
            let content = include::fetch(&target)?;
            self.listener.on_include(file, &pseudo);
            self.include_stack.push(pseudo.clone());
            let result = self.parse_source(&content, &pseudo);
            self.include_stack.pop();
            result?;
            return Ok(false);
        }

        let base = file.parent().unwrap_or_else(|| Path::new("."));
        let path = base.join(&target);
        if !self.provider.exists(&path) {
            return Err(ParseError::new(format!(
                "{} could not be found",
                path.display()
            )));
        }
        let files = self
            .provider
            .find_files(&path)
            .map_err(|e| ParseError::new(format!("Could not read {}: {}", path.display(), e)))?;
        for f in files {
            let canonical = self.provider.canonicalize(&f).unwrap_or_else(|_| f.clone());
            if self.include_stack.contains(&canonical) {
                return Err(ParseError::new(format!(
                    "Include cycle detected: {}",
                    f.display()
                )));
            }
            debug!(file = %f.display(), "including");
            let content = self
                .provider
                .read_source(&f)
                .map_err(|e| ParseError::new(format!("Could not read {}: {}", f.display(), e)))?;
            self.listener.on_include(file, &f);
            self.include_stack.push(canonical);
            let result = self.parse_source(&content, &f);
            self.include_stack.pop();
            result?;
        }
        Ok(false)
    }
}
