//! Explicit (`src -> dst`), implicit (`-> dst`) and dynamic-view
//! relationship productions.

use crate::context::Frame;
use crate::error::ParseError;
use crate::parser::DslParser;
use crate::tokens::Tokens;
use blueprint_model::{ElementId, RelationshipId};
use std::path::Path;

fn optional(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty())
}

impl DslParser {
    fn resolve_source(&self, identifier: &str) -> Result<ElementId, ParseError> {
        self.register.element(identifier).ok_or_else(|| {
            ParseError::new(format!(
                "The source element \"{}\" does not exist",
                identifier
            ))
        })
    }

    fn resolve_destination(&self, identifier: &str) -> Result<ElementId, ParseError> {
        self.register.element(identifier).ok_or_else(|| {
            ParseError::new(format!(
                "The destination element \"{}\" does not exist",
                identifier
            ))
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_relationship(
        &mut self,
        source: ElementId,
        destination: ElementId,
        tokens: &Tokens,
        description_index: usize,
        starts_context: bool,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let description = optional(tokens.get(description_index))
            .unwrap_or("")
            .to_string();
        let technology = optional(tokens.get(description_index + 1)).map(str::to_owned);
        let tags = optional(tokens.get(description_index + 2)).map(str::to_owned);

        let relationship = self.ws_mut()?.model.add_relationship(
            source,
            destination,
            &description,
            technology.as_deref(),
            tags.as_deref(),
        )?;

        if starts_context {
            self.push(Frame::Relationship { relationship });
        }
        self.register.register_relationship(identifier, relationship)?;
        self.listener
            .on_parsed_relationship(file, line_number, identifier, relationship);
        Ok(true)
    }

    /// `src -> dst [description [technology [tags]]]`
    pub(crate) fn parse_explicit_relationship(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let source = self.resolve_source(t.get_or_empty(0))?;
        let destination = self.resolve_destination(t.get_or_empty(2))?;
        self.create_relationship(
            source,
            destination,
            &t,
            3,
            tokens.starts_context(),
            identifier,
            file,
            line_number,
        )
    }

    /// `-> dst [description [technology [tags]]]`, sourced from the element
    /// being described.
    pub(crate) fn parse_implicit_relationship(
        &mut self,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let source = match self.top().and_then(Frame::element) {
            Some(element) => element,
            None => return Err(ParseError::new("Unexpected tokens")),
        };
        let destination = self.resolve_destination(t.get_or_empty(1))?;
        self.create_relationship(
            source,
            destination,
            &t,
            2,
            tokens.starts_context(),
            identifier,
            file,
            line_number,
        )
    }

    /// `src -> dst [description]` inside a dynamic view: reference an
    /// existing model relationship and append it as an ordered step.
    pub(crate) fn parse_dynamic_view_relationship(
        &mut self,
        index: usize,
        tokens: &Tokens,
        identifier: Option<&str>,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let source_token = tokens.get_or_empty(0).to_string();
        let destination_token = tokens.get_or_empty(2).to_string();
        let source = self.resolve_source(&source_token)?;
        let destination = self.resolve_destination(&destination_token)?;
        let description = optional(tokens.get(3)).map(str::to_owned);

        let relationship = {
            let ws = self.ws_mut()?;
            let candidates: Vec<&blueprint_model::Relationship> = ws
                .model
                .relationships()
                .filter(|r| r.source == source && r.destination == destination)
                .collect();
            let chosen: Option<RelationshipId> = match &description {
                Some(d) => candidates
                    .iter()
                    .find(|r| r.description == *d)
                    .or_else(|| candidates.first())
                    .map(|r| r.id),
                None => candidates.first().map(|r| r.id),
            };
            chosen.ok_or_else(|| {
                ParseError::new(format!(
                    "A relationship between \"{}\" and \"{}\" does not exist",
                    source_token, destination_token
                ))
            })?
        };

        let ws = self.ws_mut()?;
        let view = &mut ws.views.views[index];
        view.add_element(source);
        view.add_element(destination);
        view.add_dynamic_step(relationship, description.as_deref());

        self.listener
            .on_parsed_relationship(file, line_number, identifier, relationship);
        Ok(true)
    }
}
