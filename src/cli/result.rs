//! Structured outcome of a cluster CLI invocation.

use serde::Serialize;

use crate::value::{Map, Value};

/// ApiResult carries the exit code and captured output of one `oc` call.
///
/// On success `results` holds the parsed JSON (or raw text) output; on
/// failure it is an empty mapping and `stdout`/`stderr` are filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult {
    pub returncode: i32,
    pub results: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Output parse warning on an otherwise successful call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<bool>,
}

impl ApiResult {
    /// A successful result for a step that needed no command.
    pub fn not_updated() -> Self {
        ApiResult {
            returncode: 0,
            results: Value::String(String::new()),
            cmd: None,
            stdout: None,
            stderr: None,
            err: None,
            updated: Some(false),
        }
    }

    pub fn success(&self) -> bool {
        self.returncode == 0
    }

    /// Returns the result list, empty when `results` is not a list.
    pub fn items(&self) -> &[Value] {
        self.results.as_list().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the captured stderr, or the empty string.
    pub fn stderr(&self) -> &str {
        self.stderr.as_deref().unwrap_or("")
    }

    /// Converts the result into a document, dropping unset fields.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.set("returncode", Value::Int(self.returncode.into()));
        map.set("results", self.results.clone());
        let optional = [
            ("cmd", &self.cmd),
            ("stdout", &self.stdout),
            ("stderr", &self.stderr),
            ("err", &self.err),
        ];
        for (key, field) in optional {
            if let Some(text) = field {
                map.set(key, Value::from(text.as_str()));
            }
        }
        if let Some(updated) = self.updated {
            map.set("updated", Value::Bool(updated));
        }
        Value::Map(map)
    }
}

impl From<ApiResult> for Value {
    fn from(result: ApiResult) -> Self {
        result.to_value()
    }
}

/// Finds the object whose `metadata.name` is `name`.
pub fn find_result<'a>(results: &'a [Value], name: &str) -> Option<&'a Value> {
    results.iter().find(|result| {
        result
            .as_map()
            .and_then(|m| m.get("metadata"))
            .and_then(Value::as_map)
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            == Some(name)
    })
}

/// Reports whether an object named `name` is among `results`.
pub fn result_exists(results: &[Value], name: &str) -> bool {
    find_result(results, name).is_some()
}
