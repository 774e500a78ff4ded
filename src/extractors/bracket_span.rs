use crate::extractors::{parse_candidate, Extractor};
use crate::providers::ModelResponse;
use serde_json::Value;

/// Text from the first `{` through the last `}`.
pub(crate) fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Reads the outermost brace-delimited span of a text answer.
pub struct BracketSpanExtractor;

impl Extractor for BracketSpanExtractor {
    fn name(&self) -> &'static str {
        "bracket_span"
    }

    fn parse(&self, response: &ModelResponse) -> Option<Value> {
        let span = bracket_span(response.text.as_deref()?)?;
        parse_candidate(self.name(), span)
    }
}
