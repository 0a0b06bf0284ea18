use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;
use crate::mcp::client::JsonObject;

/// One operation to invoke, decoded from the completion service's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    #[serde(rename = "tool", default)]
    pub operation: String,
    #[serde(rename = "inputs", default, deserialize_with = "null_as_empty")]
    pub arguments: JsonObject,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<JsonObject, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<JsonObject>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExecutionPlan {
    /// Decodes a normalized payload and rejects plans without an operation.
    pub fn parse(candidate: &str) -> Result<Self, OrchestrationError> {
        let plan: ExecutionPlan = serde_json::from_str(candidate)
            .map_err(|e| OrchestrationError::invalid_plan(e.to_string(), candidate))?;

        if plan.operation.trim().is_empty() {
            return Err(OrchestrationError::invalid_plan(
                "missing tool name",
                candidate,
            ));
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_full_plan() {
        let plan = ExecutionPlan::parse(r#"{"tool":"get_user","inputs":{"user_id":"2"}}"#).unwrap();
        assert_eq!(plan.operation, "get_user");
        assert_eq!(plan.arguments["user_id"], "2");
    }

    #[test]
    fn test_missing_inputs_defaults_to_empty() {
        let plan = ExecutionPlan::parse(r#"{"tool":"list_users"}"#).unwrap();
        assert!(plan.arguments.is_empty());
        let plan = ExecutionPlan::parse(r#"{"tool":"list_users","inputs":null}"#).unwrap();
        assert!(plan.arguments.is_empty());
    }

    #[test]
    fn test_missing_tool_rejected_regardless_of_inputs() {
        for payload in [
            r#"{}"#,
            r#"{"inputs":{}}"#,
            r#"{"inputs":{"a":1}}"#,
            r#"{"tool":"","inputs":{"a":1}}"#,
            r#"{"tool":"   "}"#,
        ] {
            let err = ExecutionPlan::parse(payload).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPlan, "payload {payload}");
        }
    }

    #[test]
    fn test_decode_errors_carry_payload() {
        match ExecutionPlan::parse("I think you want get_user").unwrap_err() {
            OrchestrationError::InvalidPlan { payload, .. } => {
                assert_eq!(payload, "I think you want get_user");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_field_types_rejected() {
        assert!(ExecutionPlan::parse(r#"{"tool":42}"#).is_err());
        assert!(ExecutionPlan::parse(r#"{"tool":"x","inputs":[1,2]}"#).is_err());
    }
}
