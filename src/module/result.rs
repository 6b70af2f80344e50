//! Report returned by every driver.

use serde::Serialize;

use super::state::DesiredState;
use crate::value::Value;

/// ModuleResult is the outcome of one module run, printed as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DesiredState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<Value>,
}

impl ModuleResult {
    pub fn new(changed: bool) -> Self {
        ModuleResult {
            changed,
            ..Default::default()
        }
    }

    pub fn unchanged() -> Self {
        ModuleResult::new(false)
    }

    pub fn changed() -> Self {
        ModuleResult::new(true)
    }

    /// A failed run; `msg` is a string or a structured command result.
    pub fn failed(msg: impl Into<Value>) -> Self {
        ModuleResult {
            failed: true,
            msg: Some(msg.into()),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: DesiredState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_results(mut self, results: impl Into<Value>) -> Self {
        self.results = Some(results.into());
        self
    }

    pub fn with_msg(mut self, msg: impl Into<Value>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_json;

    #[test]
    fn test_serialization_skips_unset_fields() {
        let json = ModuleResult::unchanged().with_state(DesiredState::Absent).to_json().unwrap();
        assert_eq!(json, r#"{"changed":false,"state":"absent"}"#);
    }

    #[test]
    fn test_failed() {
        let result = ModuleResult::failed("Verify that you pass a value for cert");
        let json = from_json(&result.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            from_json(r#"{"changed": false, "failed": true, "msg": "Verify that you pass a value for cert"}"#).unwrap()
        );
    }
}
