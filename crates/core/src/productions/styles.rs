//! Element and relationship style productions.

use crate::context::Frame;
use crate::error::ParseError;
use crate::parser::DslParser;
use crate::tokens::Tokens;
use blueprint_model::{Border, Routing, Shape};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static HEX_COLOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[A-Fa-f0-9]{6}$").unwrap());

fn validate_color(value: &str) -> Result<String, ParseError> {
    if HEX_COLOR_PATTERN.is_match(value) {
        Ok(value.to_lowercase())
    } else {
        Err(ParseError::new(format!(
            "'{}' is not a valid hex colour code",
            value
        )))
    }
}

fn parse_bool(value: &str, usage: &str) -> Result<bool, ParseError> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::new(usage.to_string())),
    }
}

fn parse_u32(value: &str, usage: &str) -> Result<u32, ParseError> {
    value
        .parse::<u32>()
        .map_err(|_| ParseError::new(usage.to_string()))
}

fn parse_percentage(value: &str, usage: &str) -> Result<u32, ParseError> {
    match value.parse::<u32>() {
        Ok(n) if n <= 100 => Ok(n),
        _ => Err(ParseError::new(usage.to_string())),
    }
}

impl DslParser {
    pub(crate) fn parse_element_style(&mut self, tokens: &Tokens) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let tag = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: element <tag> {"))?
            .to_string();
        self.ws_mut()?.views.styles.element_style(&tag);
        self.push(Frame::ElementStyle { tag });
        Ok(true)
    }

    pub(crate) fn parse_relationship_style(
        &mut self,
        tokens: &Tokens,
    ) -> Result<bool, ParseError> {
        let t = tokens.without_context_start();
        let tag = t
            .get(1)
            .ok_or_else(|| ParseError::new("Expected: relationship <tag> {"))?
            .to_string();
        self.ws_mut()?.views.styles.relationship_style(&tag);
        self.push(Frame::RelationshipStyle { tag });
        Ok(true)
    }

    pub(crate) fn parse_element_style_property(
        &mut self,
        tag: String,
        key: &str,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let value = tokens
            .get(1)
            .ok_or_else(|| ParseError::new(format!("Expected: {} <value>", key)))?
            .to_string();
        let key_lower = key.to_lowercase();

        // colour-valued keys notify the listener
        let mut color_parsed = false;
        {
            let ws = self.ws_mut()?;
            let style = ws.views.styles.element_style(&tag);
            match key_lower.as_str() {
                "background" => {
                    style.background = Some(validate_color(&value)?);
                    color_parsed = true;
                }
                "color" | "colour" => {
                    style.color = Some(validate_color(&value)?);
                    color_parsed = true;
                }
                "stroke" => {
                    style.stroke = Some(validate_color(&value)?);
                    color_parsed = true;
                }
                "shape" => {
                    style.shape = Some(Shape::parse(&value).ok_or_else(|| {
                        ParseError::new(format!("The shape \"{}\" is not valid", value))
                    })?);
                }
                "border" => {
                    style.border = Some(Border::parse(&value).ok_or_else(|| {
                        ParseError::new(format!("The border \"{}\" is not valid", value))
                    })?);
                }
                "opacity" => {
                    style.opacity = Some(parse_percentage(
                        &value,
                        "Opacity must be an integer between 0 and 100",
                    )?);
                }
                "width" => {
                    style.width =
                        Some(parse_u32(&value, "Width must be a positive integer")?);
                }
                "height" => {
                    style.height =
                        Some(parse_u32(&value, "Height must be a positive integer")?);
                }
                "fontsize" => {
                    style.font_size =
                        Some(parse_u32(&value, "Font size must be a positive integer")?);
                }
                "metadata" => {
                    style.metadata = Some(parse_bool(&value, "Metadata must be true or false")?);
                }
                "description" => {
                    style.description =
                        Some(parse_bool(&value, "Description must be true or false")?);
                }
                "icon" => {
                    style.icon = Some(value);
                }
                _ => return Err(ParseError::new("Unexpected tokens")),
            }
        }
        if color_parsed {
            self.listener.on_parsed_color(file, line_number);
        }
        Ok(true)
    }

    pub(crate) fn parse_relationship_style_property(
        &mut self,
        tag: String,
        key: &str,
        tokens: &Tokens,
        file: &Path,
        line_number: u32,
    ) -> Result<bool, ParseError> {
        let value = tokens
            .get(1)
            .ok_or_else(|| ParseError::new(format!("Expected: {} <value>", key)))?
            .to_string();
        let key_lower = key.to_lowercase();

        let mut color_parsed = false;
        {
            let ws = self.ws_mut()?;
            let style = ws.views.styles.relationship_style(&tag);
            match key_lower.as_str() {
                "color" | "colour" => {
                    style.color = Some(validate_color(&value)?);
                    color_parsed = true;
                }
                "thickness" => {
                    style.thickness =
                        Some(parse_u32(&value, "Thickness must be a positive integer")?);
                }
                "dashed" => {
                    style.dashed = Some(parse_bool(&value, "Dashed must be true or false")?);
                }
                "routing" => {
                    style.routing = Some(Routing::parse(&value).ok_or_else(|| {
                        ParseError::new(format!("The routing \"{}\" is not valid", value))
                    })?);
                }
                "opacity" => {
                    style.opacity = Some(parse_percentage(
                        &value,
                        "Opacity must be an integer between 0 and 100",
                    )?);
                }
                "width" => {
                    style.width =
                        Some(parse_u32(&value, "Width must be a positive integer")?);
                }
                "fontsize" => {
                    style.font_size =
                        Some(parse_u32(&value, "Font size must be a positive integer")?);
                }
                "position" => {
                    style.position = Some(parse_percentage(
                        &value,
                        "Position must be an integer between 0 and 100",
                    )?);
                }
                _ => return Err(ParseError::new("Unexpected tokens")),
            }
        }
        if color_parsed {
            self.listener.on_parsed_color(file, line_number);
        }
        Ok(true)
    }
}
