use crate::extractors::{parse_candidate, Extractor};
use crate::providers::ModelResponse;
use serde_json::Value;

/// Reads the arguments of a structured function call.
pub struct ToolCallExtractor;

impl Extractor for ToolCallExtractor {
    fn name(&self) -> &'static str {
        "tool_call"
    }

    fn parse(&self, response: &ModelResponse) -> Option<Value> {
        let call = response.tool_call.as_ref()?;

        let mut args = match &call.arguments {
            Value::String(encoded) => parse_candidate(self.name(), encoded)?,
            Value::Object(_) => call.arguments.clone(),
            _ => return None,
        };

        // some models double-encode the nested list
        if let Some(Value::String(days)) = args.get("days") {
            let days = parse_candidate(self.name(), days)?;
            args["days"] = days;
        }

        Some(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ToolCall;
    use serde_json::json;

    fn response(arguments: Value) -> ModelResponse {
        ModelResponse {
            text: None,
            tool_call: Some(ToolCall {
                name: "createMealPlan".to_string(),
                arguments,
            }),
            model: "m".to_string(),
        }
    }

    #[test]
    fn test_object_arguments() {
        let value = ToolCallExtractor.parse(&response(json!({ "days": [] })));
        assert_eq!(value, Some(json!({ "days": [] })));
    }

    #[test]
    fn test_string_arguments() {
        let value = ToolCallExtractor.parse(&response(json!(r#"{"days": [{"day": "Monday"}]}"#)));
        assert_eq!(value, Some(json!({ "days": [{ "day": "Monday" }] })));
    }

    #[test]
    fn test_days_encoded_as_string() {
        let value = ToolCallExtractor.parse(&response(json!({ "days": "[{\"day\": \"Monday\"}]" })));
        assert_eq!(value, Some(json!({ "days": [{ "day": "Monday" }] })));
    }

    #[test]
    fn test_no_tool_call() {
        assert!(ToolCallExtractor
            .parse(&ModelResponse::from_text("{\"days\": []}", "m"))
            .is_none());
    }

    #[test]
    fn test_unusable_arguments() {
        assert!(ToolCallExtractor.parse(&response(json!("not json"))).is_none());
        assert!(ToolCallExtractor.parse(&response(Value::Null)).is_none());
        assert!(ToolCallExtractor
            .parse(&response(json!({ "days": "[broken" })))
            .is_none());
    }
}
