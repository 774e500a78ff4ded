//! Last-resort textual repair of almost-JSON.
//!
//! The repair is lossy: every single quote becomes a double quote, so an
//! apostrophe inside a string value ("Mom's chili") produces invalid JSON
//! and the strategy gives up. Newlines inside string values are flattened
//! to spaces. Only reached after the exact strategies have failed.

use crate::extractors::bracket_span::bracket_span;
use crate::extractors::fenced_json::fenced_block;
use crate::extractors::{parse_candidate, Extractor};
use crate::providers::ModelResponse;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref TRAILING_COMMA_OBJECT: Regex = Regex::new(r",\s*}").unwrap();
    static ref TRAILING_COMMA_ARRAY: Regex = Regex::new(r",\s*]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

pub(crate) fn repair(candidate: &str) -> String {
    let text = TRAILING_COMMA_OBJECT.replace_all(candidate, "}");
    let text = TRAILING_COMMA_ARRAY.replace_all(&text, "]");
    let text = text.replace('\'', "\"").replace(['\n', '\r'], " ");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// Re-reads the fenced block or brace span after [`repair`].
pub struct RepairedTextExtractor;

impl Extractor for RepairedTextExtractor {
    fn name(&self) -> &'static str {
        "repaired"
    }

    fn parse(&self, response: &ModelResponse) -> Option<Value> {
        let text = response.text.as_deref()?;
        let candidate = fenced_block(text).or_else(|| bracket_span(text))?;
        parse_candidate(self.name(), &repair(candidate))
    }
}
