//! Tool domain traits
//!
//! Contains pure domain logic for argument validation. The async
//! capability trait lives in [`super::provider`].

use super::entities::{ToolInvocation, ToolSpec};
use super::value_objects::ToolError;

/// Validator for tool invocations
///
/// This is a pure domain trait that validates invocations
/// against their spec without any I/O operations.
pub trait ToolValidator {
    /// Validate an invocation against its spec
    fn validate(&self, call: &ToolInvocation, spec: &ToolSpec) -> Result<(), ToolError>;
}

/// Default implementation of ToolValidator
///
/// Rejects missing required parameters, values of the wrong primitive
/// type, and values outside a declared `enum`. Extra parameters the spec
/// does not mention are tolerated.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolInvocation, spec: &ToolSpec) -> Result<(), ToolError> {
        let missing: Vec<&str> = spec
            .required_parameters()
            .filter(|p| call.arguments.get(&p.name).is_none_or(|v| v.is_null()))
            .map(|p| p.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }

        for param in &spec.parameters {
            let Some(value) = call.arguments.get(&param.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if !param.param_type.matches(value) {
                return Err(ToolError::validation(format!(
                    "Parameter '{}' for tool '{}' must be of type {}",
                    param.name, spec.name, param.param_type
                )));
            }
            if let (Some(allowed), Some(s)) = (&param.allowed_values, value.as_str())
                && !allowed.iter().any(|a| a == s)
            {
                return Err(ToolError::validation(format!(
                    "Parameter '{}' must be one of: {}",
                    param.name,
                    allowed.join(", ")
                )));
            }
        }

        Ok(())
    }
}

/// Fill in declared defaults for parameters the caller left out.
pub fn apply_defaults(call: &ToolInvocation, spec: &ToolSpec) -> ToolInvocation {
    let mut filled = call.clone();
    for param in &spec.parameters {
        if let Some(default) = &param.default {
            let absent = filled.arguments.get(&param.name).is_none_or(|v| v.is_null());
            if absent {
                filled.arguments.insert(param.name.clone(), default.clone());
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ParamType, ToolParameter};
    use serde_json::json;

    fn weather_spec() -> ToolSpec {
        ToolSpec::new("weather", "Weather lookup")
            .with_parameter(ToolParameter::required(
                "location",
                "City",
                ParamType::String,
            ))
            .with_parameter(
                ToolParameter::optional("units", "Units", ParamType::String)
                    .with_default("metric")
                    .with_allowed_values(["metric", "imperial"]),
            )
            .with_parameter(
                ToolParameter::optional("forecast_days", "Days", ParamType::Integer)
                    .with_default(0),
            )
    }

    #[test]
    fn test_validator_missing_required() {
        let call = ToolInvocation::new("weather");
        let err = DefaultToolValidator
            .validate(&call, &weather_spec())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.message.contains("Missing required parameters: location"));
    }

    #[test]
    fn test_validator_null_counts_as_missing() {
        let call = ToolInvocation::new("weather").with_arg("location", json!(null));
        assert!(DefaultToolValidator.validate(&call, &weather_spec()).is_err());
    }

    #[test]
    fn test_validator_wrong_type() {
        let call = ToolInvocation::new("weather").with_arg("location", 42);
        let err = DefaultToolValidator
            .validate(&call, &weather_spec())
            .unwrap_err();
        assert!(err.message.contains("must be of type string"));
    }

    #[test]
    fn test_validator_enum_violation() {
        let call = ToolInvocation::new("weather")
            .with_arg("location", "Paris")
            .with_arg("units", "kelvin");
        let err = DefaultToolValidator
            .validate(&call, &weather_spec())
            .unwrap_err();
        assert!(err.message.contains("must be one of"));
    }

    #[test]
    fn test_validator_tolerates_unknown_params() {
        let call = ToolInvocation::new("weather")
            .with_arg("location", "Paris")
            .with_arg("lang", "fr");
        assert!(DefaultToolValidator.validate(&call, &weather_spec()).is_ok());
    }

    #[test]
    fn test_apply_defaults() {
        let call = ToolInvocation::new("weather").with_arg("location", "Paris");
        let filled = apply_defaults(&call, &weather_spec());
        assert_eq!(filled.get_str("units"), Some("metric"));
        assert_eq!(filled.get_i64("forecast_days"), Some(0));

        let explicit = ToolInvocation::new("weather")
            .with_arg("location", "Paris")
            .with_arg("units", "imperial");
        let filled = apply_defaults(&explicit, &weather_spec());
        assert_eq!(filled.get_str("units"), Some("imperial"));
    }
}
