//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Primitive type of a tool parameter, as declared in its JSON schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    /// Whether `value` has this primitive type.
    ///
    /// `Integer` accepts floats with no fractional part, since models
    /// routinely emit `3.0` where `3` was meant.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
            }
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Declared primitive type
    pub param_type: ParamType,
    /// Whether this parameter is required
    pub required: bool,
    /// Value substituted when the caller omits the parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Closed set of accepted string values (JSON schema `enum`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl ToolParameter {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        param_type: ParamType,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type,
            required,
            default: None,
            allowed_values: None,
        }
    }

    pub fn required(
        name: impl Into<String>,
        description: impl Into<String>,
        param_type: ParamType,
    ) -> Self {
        Self::new(name, description, param_type, true)
    }

    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        param_type: ParamType,
    ) -> Self {
        Self::new(name, description, param_type, false)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Static description of a tool: its name, purpose and parameter schema.
///
/// Created once when the tool is constructed and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name of the tool within a registry (e.g., "calculator")
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// Parameter specifications, in declaration order
    pub parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

/// A request to run one tool, as parsed from the model's structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Call id assigned by the model; echoed back on the tool-role message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the tool to run
    pub tool_name: String,
    /// Arguments for the tool
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            id: None,
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: HashMap<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Get a string argument
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_str(&self, key: &str) -> Result<&str, String> {
        self.get_str(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional i64 argument (integral floats are accepted)
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let value = self.arguments.get(key)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })
    }

    /// Get an optional f64 argument
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.arguments.get(key).and_then(|v| v.as_f64())
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }

    /// Arguments as a JSON object, for logging and usage records.
    pub fn arguments_json(&self) -> Value {
        Value::Object(
            self.arguments
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_type_matches() {
        assert!(ParamType::String.matches(&json!("x")));
        assert!(!ParamType::String.matches(&json!(1)));
        assert!(ParamType::Integer.matches(&json!(3)));
        assert!(ParamType::Integer.matches(&json!(3.0)));
        assert!(!ParamType::Integer.matches(&json!(3.5)));
        assert!(ParamType::Number.matches(&json!(3.5)));
        assert!(ParamType::Boolean.matches(&json!(false)));
        assert!(ParamType::Object.matches(&json!({"a": 1})));
        assert!(ParamType::Array.matches(&json!([1, 2])));
    }

    #[test]
    fn test_tool_spec_builder() {
        let spec = ToolSpec::new("weather", "Get the weather")
            .with_parameter(ToolParameter::required(
                "location",
                "City name",
                ParamType::String,
            ))
            .with_parameter(
                ToolParameter::optional("units", "Unit system", ParamType::String)
                    .with_default("metric")
                    .with_allowed_values(["metric", "imperial"]),
            );

        assert_eq!(spec.name, "weather");
        assert_eq!(spec.parameters.len(), 2);
        assert_eq!(spec.required_parameters().count(), 1);
        let units = spec.parameter("units").unwrap();
        assert_eq!(units.default, Some(json!("metric")));
        assert_eq!(units.allowed_values.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_invocation_getters() {
        let call = ToolInvocation::new("weather")
            .with_id("call_1")
            .with_arg("location", "Paris")
            .with_arg("forecast_days", 3.0)
            .with_arg("verbose", true);

        assert_eq!(call.id.as_deref(), Some("call_1"));
        assert_eq!(call.get_str("location"), Some("Paris"));
        assert_eq!(call.get_i64("forecast_days"), Some(3));
        assert_eq!(call.get_bool("verbose"), Some(true));
        assert!(call.require_str("missing").is_err());
    }

    #[test]
    fn test_arguments_json() {
        let call = ToolInvocation::new("calculator").with_arg("expression", "1+1");
        assert_eq!(call.arguments_json(), json!({"expression": "1+1"}));
    }
}
