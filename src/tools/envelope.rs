//! Wire types of the invocation boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One named argument of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl Parameter {
    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: Some("string".to_string()),
            value: Value::String(value.to_string()),
        }
    }
}

/// The request unit passed to every tool handler.
///
/// Platform fields beyond the routing tag, function name and parameters are
/// accepted on input and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub action_group: String,
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Envelope {
    pub fn new(action_group: &str, function: &str, parameters: Vec<Parameter>) -> Self {
        Self {
            action_group: action_group.to_string(),
            function: function.to_string(),
            parameters: Some(parameters),
            session_id: None,
        }
    }

    /// Value of the first parameter called `name`.
    ///
    /// Returns `None` when the envelope carries no parameter list at all.
    /// Later parameters sharing the name are never consulted.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters
            .as_deref()?
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Like [`Envelope::get`], rendering scalar values as text.
    /// A `null` value counts as absent.
    pub fn get_text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Outcome of a tool function before it is wrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Document(Value),
    /// Human-readable error description.
    Error(String),
}

impl ToolResult {
    pub fn unrecognized(function: &str) -> Self {
        Self::Error(format!("Error: function '{}' is not recognized", function))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Serialize as JSON text. An error becomes a JSON string literal, so the
    /// body is valid JSON either way.
    pub fn to_body(&self) -> String {
        match self {
            Self::Document(value) => value.to_string(),
            Self::Error(message) => Value::String(message.clone()).to_string(),
        }
    }

    /// Inverse of [`ToolResult::to_body`]. Text that is not JSON is treated as
    /// an error message.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(message)) => Self::Error(message),
            Ok(value) => Self::Document(value),
            Err(_) => Self::Error(body.to_string()),
        }
    }
}

impl<T: Serialize> From<Result<T, super::ParameterError>> for ToolResult {
    fn from(result: Result<T, super::ParameterError>) -> Self {
        match result {
            Ok(document) => match serde_json::to_value(document) {
                Ok(value) => Self::Document(value),
                Err(e) => Self::Error(format!("Error: result is not serializable: {}", e)),
            },
            Err(e) => Self::from(e),
        }
    }
}

impl From<super::ParameterError> for ToolResult {
    fn from(err: super::ParameterError) -> Self {
        Self::Error(format!("Error: {}", err))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "TEXT")]
    pub text: TextBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponseBody {
    pub response_body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub action_group: String,
    pub function: String,
    pub function_response: FunctionResponseBody,
}

/// `{response: {actionGroup, function, functionResponse: {responseBody: {TEXT: {body}}}}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub response: ResponsePayload,
}

impl FunctionResponse {
    pub fn wrap(envelope: &Envelope, result: &ToolResult) -> Self {
        Self {
            response: ResponsePayload {
                action_group: envelope.action_group.clone(),
                function: envelope.function.clone(),
                function_response: FunctionResponseBody {
                    response_body: ResponseBody {
                        text: TextBody {
                            body: result.to_body(),
                        },
                    },
                },
            },
        }
    }

    pub fn body(&self) -> &str {
        &self.response.function_response.response_body.text.body
    }

    pub fn into_result(self) -> ToolResult {
        ToolResult::from_body(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_without_parameters_is_absent() {
        let env: Envelope =
            serde_json::from_value(json!({ "actionGroup": "a", "function": "f" })).unwrap();

        for name in ["trace_id", "service", "", "parameters"] {
            assert_eq!(env.get(name), None);
            assert_eq!(env.get_text(name), None);
        }
    }

    #[test]
    fn test_get_first_duplicate_wins() {
        let env: Envelope = serde_json::from_value(json!({
            "actionGroup": "a",
            "function": "f",
            "parameters": [
                { "name": "env", "value": "prd-bo" },
                { "name": "service", "value": "x" },
                { "name": "env", "value": "stg" }
            ]
        }))
        .unwrap();

        assert_eq!(env.get_text("env").as_deref(), Some("prd-bo"));
    }

    #[test]
    fn test_get_does_not_mutate() {
        let env = Envelope::new("a", "f", vec![Parameter::string("k", "v")]);
        let before = env.clone();
        let _ = env.get("k");
        let _ = env.get("missing");
        assert_eq!(env, before);
    }

    #[test]
    fn test_get_text_renders_numbers_and_skips_null() {
        let env: Envelope = serde_json::from_value(json!({
            "actionGroup": "a",
            "function": "f",
            "parameters": [
                { "name": "from_ts", "value": 1702441545000u64 },
                { "name": "empty", "value": null }
            ]
        }))
        .unwrap();

        assert_eq!(env.get_text("from_ts").as_deref(), Some("1702441545000"));
        assert_eq!(env.get_text("empty"), None);
    }

    #[test]
    fn test_platform_fields_ignored() {
        let env: Envelope = serde_json::from_value(json!({
            "messageVersion": "1.0",
            "agent": { "name": "log_analysis_agent" },
            "inputText": "look at this",
            "sessionId": "abc",
            "actionGroup": "a",
            "function": "f"
        }))
        .unwrap();

        assert_eq!(env.session_id.as_deref(), Some("abc"));
        assert_eq!(env.parameters, None);
    }

    #[test]
    fn test_wrapper_shape() {
        let env = Envelope::new("logs", "search", vec![]);
        let wrapped = FunctionResponse::wrap(&env, &ToolResult::Document(json!({ "n": 1 })));
        let value = serde_json::to_value(&wrapped).unwrap();

        assert_eq!(
            value,
            json!({
                "response": {
                    "actionGroup": "logs",
                    "function": "search",
                    "functionResponse": {
                        "responseBody": { "TEXT": { "body": "{\"n\":1}" } }
                    }
                }
            })
        );
    }

    #[test]
    fn test_error_body_is_json_string() {
        let env = Envelope::new("logs", "search", vec![]);
        let wrapped = FunctionResponse::wrap(&env, &ToolResult::Error("boom".into()));

        assert_eq!(wrapped.body(), "\"boom\"");
        assert_eq!(wrapped.into_result(), ToolResult::Error("boom".into()));
    }

    #[test]
    fn test_from_body_non_json_is_error() {
        assert_eq!(
            ToolResult::from_body("not json"),
            ToolResult::Error("not json".into())
        );
    }
}
