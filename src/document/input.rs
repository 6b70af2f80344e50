//! Conversion of raw string inputs into document values.

use serde::Deserialize;

use super::error::{Result, YeditError};
use crate::value::{self, Value};

const TRUE_STRINGS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "true", "True", "TRUE", "on", "On", "ON",
];
const FALSE_STRINGS: &[&str] = &[
    "n", "N", "no", "No", "NO", "false", "False", "FALSE", "off", "Off", "OFF",
];

/// Encoding of a `curr_value` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Yaml,
    Json,
    Str,
}

/// Interprets `raw` according to the `vtype` hint.
///
/// A hint containing `bool` accepts the YAML 1.1 boolean spellings only, one
/// containing `str` keeps the text verbatim, anything else parses the text
/// as YAML.
pub fn parse_value(raw: &str, vtype: &str) -> Result<Value> {
    if vtype.contains("bool") {
        if TRUE_STRINGS.contains(&raw) {
            return Ok(Value::Bool(true));
        }
        if FALSE_STRINGS.contains(&raw) {
            return Ok(Value::Bool(false));
        }
        return Err(YeditError::invalid_value(format!(
            "Not a boolean type. str=[{}] vtype=[{}]",
            raw, vtype
        )));
    }

    if vtype.contains("str") {
        return Ok(Value::String(raw.to_string()));
    }

    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }

    value::from_yaml(raw).map_err(|e| {
        YeditError::invalid_value(format!(
            "Could not determine type of incoming value. value=[{}] vtype=[{}]: {}",
            raw, vtype, e
        ))
    })
}

/// Decodes the value used to locate a list slot during an update.
pub fn decode_value(raw: &str, format: ValueFormat) -> Result<Value> {
    match format {
        ValueFormat::Yaml => parse_value(raw, ""),
        ValueFormat::Json => value::from_json(raw)
            .map_err(|e| YeditError::invalid_value(format!("invalid json value [{}]: {}", raw, e))),
        ValueFormat::Str => Ok(Value::String(raw.to_string())),
    }
}
