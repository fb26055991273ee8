//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] producing the OpenAI
//! function-calling shape that the DeepSeek chat API accepts.

use deepseek_application::ports::tool_schema::ToolSchemaPort;
use deepseek_domain::ToolSpec;
use serde_json::{Map, Value, json};

/// Converts [`ToolSpec`]s to `{"type": "function", "function": {...}}`.
///
/// Parameter types map one to one onto JSON Schema types. Declared
/// defaults and allowed values are emitted as `default` and `enum`.
pub struct JsonSchemaToolConverter;

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolSpec) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type.as_str()));
            prop.insert("description".to_string(), json!(param.description));
            if let Some(values) = &param.allowed_values {
                prop.insert("enum".to_string(), json!(values));
            }
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepseek_domain::{ParamType, ToolParameter};

    fn weather_spec() -> ToolSpec {
        ToolSpec::new("weather", "Current weather for a location")
            .with_parameter(ToolParameter::required(
                "location",
                "City name",
                ParamType::String,
            ))
            .with_parameter(
                ToolParameter::optional("units", "Unit system", ParamType::String)
                    .with_allowed_values(["metric", "imperial"])
                    .with_default("metric"),
            )
            .with_parameter(ToolParameter::optional(
                "forecast_days",
                "Days of forecast",
                ParamType::Integer,
            ))
    }

    #[test]
    fn test_tool_to_schema() {
        let schema = JsonSchemaToolConverter.tool_to_schema(&weather_spec());

        assert_eq!(schema["type"], "function");
        let function = &schema["function"];
        assert_eq!(function["name"], "weather");
        assert_eq!(function["description"], "Current weather for a location");
        assert_eq!(function["parameters"]["type"], "object");

        let props = &function["parameters"]["properties"];
        assert_eq!(props["location"]["type"], "string");
        assert_eq!(props["forecast_days"]["type"], "integer");
        assert_eq!(props["units"]["enum"], json!(["metric", "imperial"]));
        assert_eq!(props["units"]["default"], "metric");
        assert!(props["location"].get("enum").is_none());

        assert_eq!(function["parameters"]["required"], json!(["location"]));
    }

    #[test]
    fn test_tools_schema_sorted_by_name() {
        let specs = vec![
            weather_spec(),
            ToolSpec::new("calculator", "Evaluate math"),
        ];
        let tools = JsonSchemaToolConverter.tools_schema(&specs);

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["function"]["name"], "calculator");
        assert_eq!(tools[1]["function"]["name"], "weather");
        assert_eq!(
            tools[0]["function"]["parameters"]["required"],
            json!([])
        );
    }
}
