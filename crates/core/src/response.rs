//! Cleanup and parsing of raw service replies.
//!
//! Models like to wrap JSON in markdown fences (```` ```json ... ``` ````)
//! and sometimes add a sentence before or after. Every call site unwraps the
//! fence first, then parses, and treats anything else as a failure.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// First fenced block, with an optional language tag on the opening fence.
static CODE_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());

/// How much of a bad reply to keep in error messages.
const SNIPPET_LEN: usize = 120;

/// Return the body of the first fenced code block, or the trimmed text.
///
/// An opening fence without a closing one (truncated reply) is stripped too.
pub fn unwrap_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(caps) = CODE_FENCE_REGEX.captures(trimmed) {
        if let Some(body) = caps.get(1) {
            return body.as_str().trim();
        }
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        return rest.trim();
    }

    trimmed
}

/// Unwrap a code fence and parse the remainder as JSON.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = unwrap_code_fence(text);
    if body.is_empty() {
        return Err(Error::MalformedResponse("empty response".to_string()));
    }

    serde_json::from_str(body).map_err(|e| {
        Error::MalformedResponse(format!("{} (response began: {:?})", e, snippet(body)))
    })
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}
