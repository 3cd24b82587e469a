//! Directive productions: `workspace` (including `extends`),
//! `!impliedRelationships`, `!identifiers`, `!constant`, `!docs`/`!adrs`,
//! `!plugin`, `!script`, plus branding, terminology and configuration.

use crate::context::Frame;
use crate::error::ParseError;
use crate::include;
use crate::parser::DslParser;
use crate::registry::IdentifierScope;
use crate::tokens::Tokens;
use blueprint_model::{Font, ImpliedRelationships, Role, Workspace};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

static CONSTANT_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.\-]+$").unwrap());

fn optional(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty())
}

impl DslParser {
    /// `workspace [name [description]] {` or `workspace extends <source> {`
    pub(crate) fn parse_workspace(
        &mut self,
        tokens: &Tokens,
        file: &Path,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let workspace = if t.get(1).is_some_and(|w| w.eq_ignore_ascii_case("extends")) {
            let source = t
                .get(2)
                .ok_or_else(|| ParseError::new("Expected: workspace extends <file|url>"))?;
            self.load_base_workspace(source, file)?
        } else {
            Workspace::new(t.get_or_empty(1), t.get_or_empty(2))
        };

        self.extending = !workspace.model.is_empty();
        self.workspace = Some(workspace);
        self.push(Frame::Workspace);
        Ok(true)
    }

    /// Load the workspace a `workspace extends` declaration starts from:
    /// a JSON snapshot, or a DSL file parsed by a nested parser whose
    /// identifiers are merged back.
    fn load_base_workspace(&mut self, source: &str, file: &Path) -> Result<Workspace, ParseError> {
        debug!(source, "extending workspace");
        if include::is_url(source) {
            let content = include::fetch(source)?;
            if source.ends_with(".json") {
                return Workspace::from_json(&content).map_err(|e| {
                    ParseError::new(format!("Could not parse workspace JSON: {}", e))
                });
            }
            let mut nested = DslParser::with_provider(self.provider.clone());
            nested.set_restricted(self.restricted);
            nested.set_identifier_scope(self.identifier_scope());
            nested.parse_source(&content, &PathBuf::from(source))?;
            let workspace = nested.workspace.take().ok_or_else(|| {
                ParseError::new(format!("{} does not contain a workspace definition", source))
            })?;
            self.register.copy_from(&nested.register);
            return Ok(workspace);
        }

        let base = file.parent().unwrap_or_else(|| Path::new("."));
        let path = base.join(source);
        if !self.provider.exists(&path) {
            return Err(ParseError::new(format!(
                "The file at {} does not exist",
                path.display()
            )));
        }
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let content = self.provider.read_source(&path).map_err(|e| {
                ParseError::new(format!("Could not read {}: {}", path.display(), e))
            })?;
            return Workspace::from_json(&content)
                .map_err(|e| ParseError::new(format!("Could not parse workspace JSON: {}", e)));
        }

        let mut nested = DslParser::with_provider(self.provider.clone());
        nested.set_restricted(self.restricted);
        nested.set_identifier_scope(self.identifier_scope());
        nested.parse_file(&path)?;
        let workspace = nested.workspace.take().ok_or_else(|| {
            ParseError::new(format!(
                "{} does not contain a workspace definition",
                path.display()
            ))
        })?;
        self.register.copy_from(&nested.register);
        Ok(workspace)
    }

    pub(crate) fn parse_implied_relationships(
        &mut self,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let value = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: !impliedRelationships <true|false>"))?;
        let strategy = match value.to_lowercase().as_str() {
            "true" => ImpliedRelationships::CreateUnlessAnyExist,
            "false" => ImpliedRelationships::DoNotCreate,
            _ => return Err(ParseError::new("Expected: !impliedRelationships <true|false>")),
        };
        // last declaration wins
        self.ws_mut()?.model.implied_relationships = strategy;
        Ok(true)
    }

    pub(crate) fn parse_identifier_scope(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let scope = match tokens.get(1).map(str::to_lowercase).as_deref() {
            Some("flat") => IdentifierScope::Flat,
            Some("hierarchical") => IdentifierScope::Hierarchical,
            _ => {
                return Err(ParseError::new(
                    "Expected: !identifiers <flat|hierarchical>",
                ))
            }
        };
        self.set_identifier_scope(scope);
        Ok(true)
    }

    pub(crate) fn parse_constant(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let usage = "Expected: !constant <name> <value>";
        let name = tokens
            .get(1)
            .ok_or_else(|| ParseError::new(usage))?
            .to_string();
        let value = tokens
            .get(2)
            .ok_or_else(|| ParseError::new(usage))?
            .to_string();
        if !CONSTANT_NAME_PATTERN.is_match(&name) {
            return Err(ParseError::new(
                "Constant names can only contain the following characters: a-zA-Z0-9-_.",
            ));
        }
        self.constants.insert(name, value);
        Ok(true)
    }

    pub(crate) fn parse_docs(
        &mut self,
        tokens: &Tokens,
        top: &Option<Frame>,
        file: &Path,
        adrs: bool,
    ) -> Result<bool, ParseError> {
        let usage = if adrs {
            "Expected: !adrs <path>"
        } else {
            "Expected: !docs <path>"
        };
        let path = tokens.get(1).ok_or_else(|| ParseError::new(usage))?;
        let target = match top {
            Some(Frame::SoftwareSystem { element, .. }) => Some(*element),
            _ => None,
        };
        let resolved = file.parent().unwrap_or_else(|| Path::new(".")).join(path);

        let ws = match self.workspace.as_mut() {
            Some(ws) => ws,
            None => return Err(ParseError::new("No workspace has been defined")),
        };
        if let Some(importer) = self.documentation_importer.as_mut() {
            let result = if adrs {
                importer.import_adrs(&resolved, ws, target)
            } else {
                importer.import_docs(&resolved, ws, target)
            };
            result.map_err(|e| {
                ParseError::new(format!("Error importing documentation: {}", e))
            })?;
        }
        Ok(true)
    }

    pub(crate) fn parse_plugin(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let name = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: !plugin <fully qualified class name>"))?
            .to_string();
        self.push(Frame::Plugin {
            name,
            parameters: Default::default(),
        });
        if !tokens.starts_context() {
            // no parameter block: run immediately
            self.end_context()?;
        }
        Ok(true)
    }

    pub(crate) fn parse_plugin_parameter(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        if tokens.size() != 2 {
            return Err(ParseError::new("Expected: <name> <value>"));
        }
        let name = tokens.get_or_empty(0).to_string();
        let value = tokens.get_or_empty(1).to_string();
        if let Some(Frame::Plugin { parameters, .. }) = self.stack.last_mut() {
            parameters.insert(name, value);
        }
        Ok(true)
    }

    pub(crate) fn parse_script(&mut self, tokens: &Tokens, file: &Path) -> Result<bool, ParseError> {
        if tokens.starts_context() {
            let language = tokens
                .without_context_start()
                .get(1)
                .ok_or_else(|| ParseError::new("Expected: !script <language> {"))?
                .to_string();
            self.push(Frame::InlineScript {
                language,
                lines: Vec::new(),
            });
        } else {
            let filename = tokens
                .get(1)
                .ok_or_else(|| ParseError::new("Expected: !script <file>"))?;
            let path = file.parent().unwrap_or_else(|| Path::new(".")).join(filename);
            self.run_external_script(&path)?;
        }
        Ok(true)
    }

    // ── Branding, terminology, configuration ─────────────────────────

    pub(crate) fn parse_branding_logo(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let logo = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: logo <path|url>"))?
            .to_string();
        self.ws_mut()?.views.branding.logo = Some(logo);
        Ok(true)
    }

    pub(crate) fn parse_branding_font(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let name = tokens
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: font <name> [url]"))?
            .to_string();
        let url = optional(tokens.get(2)).map(str::to_owned);
        self.ws_mut()?.views.branding.font = Some(Font { name, url });
        Ok(true)
    }

    pub(crate) fn parse_terminology(
        &mut self,
        key: &str,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let term = tokens
            .get(1)
            .ok_or_else(|| ParseError::new(format!("Expected: {} <term>", key)))?
            .to_string();
        let terminology = &mut self.ws_mut()?.views.terminology;
        match key.to_lowercase().as_str() {
            "enterprise" => terminology.enterprise = Some(term),
            "person" => terminology.person = Some(term),
            "softwaresystem" => terminology.software_system = Some(term),
            "container" => terminology.container = Some(term),
            "component" => terminology.component = Some(term),
            "deploymentnode" => terminology.deployment_node = Some(term),
            "infrastructurenode" => terminology.infrastructure_node = Some(term),
            "relationship" => terminology.relationship = Some(term),
            _ => return Err(ParseError::new("Unexpected tokens")),
        }
        Ok(true)
    }

    pub(crate) fn parse_user(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        if tokens.size() != 2 {
            return Err(ParseError::new("Expected: <username> <read|write>"));
        }
        let username = tokens.get_or_empty(0).to_string();
        let role_token = tokens.get_or_empty(1);
        let role = Role::parse(role_token).ok_or_else(|| {
            ParseError::new(format!(
                "The role \"{}\" is not valid; expected read|write",
                role_token
            ))
        })?;
        self.ws_mut()?.configuration.users.insert(username, role);
        Ok(true)
    }
}
