//! URL fetching for `!include https://...` and `workspace extends`.
//!
//! Fetches are synchronous with a fixed timeout; the parser stays
//! single-threaded throughout.

use crate::error::ParseError;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub fn is_url(target: &str) -> bool {
    target.starts_with("https://") || target.starts_with("http://")
}

/// Fetch the text behind a URL.
pub fn fetch(url: &str) -> Result<String, ParseError> {
    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| ParseError::new(format!("Could not fetch {}: {}", url, e)))?;
    response
        .into_string()
        .map_err(|e| ParseError::new(format!("Could not read {}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/system.dsl"));
        assert!(is_url("http://example.com/system.dsl"));
        assert!(!is_url("shared/system.dsl"));
        assert!(!is_url("../system.dsl"));
    }
}
