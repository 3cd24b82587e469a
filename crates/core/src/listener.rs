//! Progress callbacks for embedders that want to observe a parse.
//!
//! All methods have empty defaults; implementations must not panic, and
//! nothing they do can fail a parse.

use blueprint_model::{ElementId, RelationshipId};
use std::path::Path;

pub trait ParserListener {
    fn on_parsed_view(&mut self, _file: &Path, _line_number: u32, _key: &str) {}

    fn on_parsed_relationship(
        &mut self,
        _file: &Path,
        _line_number: u32,
        _identifier: Option<&str>,
        _relationship: RelationshipId,
    ) {
    }

    fn on_parsed_model_element(
        &mut self,
        _file: &Path,
        _line_number: u32,
        _identifier: Option<&str>,
        _element: ElementId,
    ) {
    }

    /// Called for any colour-valued style key that parsed successfully.
    fn on_parsed_color(&mut self, _file: &Path, _line_number: u32) {}

    fn on_end_context(&mut self, _file: &Path, _line_number: u32, _context: &str) {}

    fn on_include(&mut self, _file: &Path, _target: &Path) {}
}

/// The default listener: ignores everything.
#[derive(Debug, Default)]
pub struct NoopListener;

impl ParserListener for NoopListener {}
