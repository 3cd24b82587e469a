//! `${NAME}` substitution inside tokens.
//!
//! Constants win over environment variables; environment lookup is skipped
//! in restricted mode. Substituted values are not rescanned, so a constant
//! containing `${...}` cannot trigger further expansion.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;

static SUBSTITUTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([a-zA-Z0-9_.\-]+?)\}").unwrap());

/// Replace every `${NAME}` occurrence in `token`. Unknown names are left
/// untouched.
pub fn substitute(token: &str, constants: &HashMap<String, String>, restricted: bool) -> String {
    SUBSTITUTION_PATTERN
        .replace_all(token, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if let Some(value) = constants.get(name) {
                return Cow::Owned(value.clone());
            }
            if !restricted {
                if let Ok(value) = std::env::var(name) {
                    return Cow::Owned(value);
                }
            }
            Cow::Owned(caps[0].to_string())
        })
        .into_owned()
}
