//! Parse errors with file/line/source-line provenance.

use std::fmt;
use std::path::{Path, PathBuf};

/// A DSL parsing error. Handler failures are caught at the dispatcher and
/// re-raised with the provenance of the line being parsed; provenance that
/// was attached deeper (e.g. inside an included file) is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub file: Option<PathBuf>,
    pub line_number: Option<u32>,
    pub source_line: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            file: None,
            line_number: None,
            source_line: None,
        }
    }

    /// Attach provenance, keeping any provenance already present.
    pub fn at(mut self, file: &Path, line_number: u32, source_line: &str) -> Self {
        if self.line_number.is_none() {
            self.file = Some(file.to_path_buf());
            self.line_number = Some(line_number);
            self.source_line = Some(source_line.trim().to_string());
        }
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line_number) = self.line_number {
            write!(f, " at line {}", line_number)?;
            if let Some(file) = &self.file {
                write!(f, " of {}", file.display())?;
            }
            if let Some(source_line) = &self.source_line {
                write!(f, ": {}", source_line)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<blueprint_model::ModelError> for ParseError {
    fn from(e: blueprint_model::ModelError) -> Self {
        ParseError::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_provenance() {
        let err = ParseError::new("Unexpected tokens").at(
            Path::new("workspace.dsl"),
            7,
            "  mdel {  ",
        );
        assert_eq!(
            err.to_string(),
            "Unexpected tokens at line 7 of workspace.dsl: mdel {"
        );
    }

    #[test]
    fn inner_provenance_is_not_overwritten() {
        let err = ParseError::new("Unexpected tokens")
            .at(Path::new("included.dsl"), 3, "bad line")
            .at(Path::new("outer.dsl"), 10, "!include included.dsl");
        assert_eq!(err.file, Some(PathBuf::from("included.dsl")));
        assert_eq!(err.line_number, Some(3));
    }
}
