//! Tool-related type definitions

use super::base::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A tool call from the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build a call from a JSON object of arguments
    pub fn from_json(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self::new(id, name, arguments)
    }

    /// Get a typed argument value
    pub fn get_argument<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.arguments
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_argument::<String>(key)
    }

    /// Get a non-negative integer argument
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get_argument::<u64>(key)
    }

    /// Get a string argument or fail with `InvalidArguments`
    pub fn require_string(&self, key: &str) -> Result<String, ToolError> {
        self.get_string(key)
            .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{}' parameter", key)))
    }

    /// Get a raw JSON argument or fail with `InvalidArguments`
    pub fn require_value(&self, key: &str) -> Result<&Value, ToolError> {
        self.arguments
            .get(key)
            .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{}' parameter", key)))
    }
}

/// Result of a tool execution
///
/// Tools build it with [`ToolResult::success`] or [`ToolResult::error`];
/// `output` is human-readable text and `metadata` carries structured data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool call ID this result corresponds to
    pub call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the tool execution was successful
    pub success: bool,
    /// Output from the tool (if successful)
    pub output: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: true,
            output: Some(output.into()),
            error: None,
            execution_time_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a failed tool result
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error.into()),
            execution_time_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Add execution time
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }

    /// Add metadata
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The output on success, the error on failure
    pub fn text(&self) -> &str {
        if self.success {
            self.output.as_deref().unwrap_or_default()
        } else {
            self.error.as_deref().unwrap_or_default()
        }
    }
}

/// Parameter definition for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    /// JSON type (string, integer, object, ...); empty accepts any value
    pub param_type: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl ToolParameter {
    fn typed(name: impl Into<String>, description: impl Into<String>, param_type: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type: param_type.to_string(),
            required: true,
            default: None,
        }
    }

    /// Create a required string parameter
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::typed(name, description, "string")
    }

    /// Create a required integer parameter
    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::typed(name, description, "integer")
    }

    /// Create a required parameter accepting any JSON value
    pub fn any(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::typed(name, description, "")
    }

    /// Make parameter optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set default value
    pub fn with_default<V: Into<Value>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// JSON function schema for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// Input parameters schema
    pub parameters: Value,
}

impl ToolSchema {
    /// Create a new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ToolParameter>,
    ) -> Self {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in parameters {
            if param.required {
                required.push(param.name.clone());
            }

            let mut param_schema = serde_json::Map::new();
            if !param.param_type.is_empty() {
                param_schema.insert("type".to_string(), param.param_type.into());
            }
            param_schema.insert("description".to_string(), param.description.into());

            if let Some(default) = param.default {
                param_schema.insert("default".to_string(), default);
            }

            properties.insert(param.name, param_schema.into());
        }

        let parameters_schema = serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        });

        Self {
            name: name.into(),
            description: description.into(),
            parameters: parameters_schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_marks_required_and_defaults() {
        let schema = ToolSchema::new(
            "observe_terminal_session",
            "Observe output",
            vec![
                ToolParameter::string("session_id", "Session"),
                ToolParameter::integer("offset_start_time_by_in_seconds", "Look-back")
                    .optional()
                    .with_default(5),
                ToolParameter::any("data", "Anything"),
            ],
        );

        assert_eq!(schema.parameters["required"], json!(["session_id", "data"]));
        let props = &schema.parameters["properties"];
        assert_eq!(props["offset_start_time_by_in_seconds"]["default"], json!(5));
        assert_eq!(props["offset_start_time_by_in_seconds"]["type"], "integer");
        assert!(props["data"].get("type").is_none());
    }

    #[test]
    fn test_call_argument_helpers() {
        let call = ToolCall::from_json(
            "c1",
            "send_terminal_command",
            json!({"session_id": "session_1", "seconds": 3}),
        );
        assert_eq!(call.require_string("session_id").unwrap(), "session_1");
        assert_eq!(call.get_u64("seconds"), Some(3));
        assert!(matches!(
            call.require_string("command"),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_result_text() {
        assert_eq!(ToolResult::success("1", "t", "ok").text(), "ok");
        assert_eq!(ToolResult::error("1", "t", "bad").text(), "bad");
    }
}
