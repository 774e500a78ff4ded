use crate::extractors::{parse_candidate, Extractor};
use crate::providers::ModelResponse;
use serde_json::Value;

const FENCE: &str = "```";

/// Contents of the first ```` ```json ```` block, without the fence markers.
pub(crate) fn fenced_block(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let open = lower.find("```json")?;
    let body_start = open + "```json".len();
    let body_len = text[body_start..].find(FENCE)?;
    Some(text[body_start..body_start + body_len].trim())
}

/// Reads a JSON code block out of a text answer.
pub struct FencedJsonExtractor;

impl Extractor for FencedJsonExtractor {
    fn name(&self) -> &'static str {
        "fenced_json"
    }

    fn parse(&self, response: &ModelResponse) -> Option<Value> {
        let block = fenced_block(response.text.as_deref()?)?;
        parse_candidate(self.name(), block)
    }
}
