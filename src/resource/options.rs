//! Named resource options and their rendering as `oc` flags.

use std::collections::BTreeMap;

use crate::value::Value;

/// One option value and whether it is passed on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOption {
    pub value: Value,
    pub include: bool,
}

/// CliOptions is an ordered set of named options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    options: BTreeMap<String, CliOption>,
}

impl CliOptions {
    pub fn new() -> Self {
        CliOptions::default()
    }

    /// Adds an option, replacing any previous value under `name`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>, include: bool) -> Self {
        self.options.insert(
            name.into(),
            CliOption {
                value: value.into(),
                include,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name).map(|o| &o.value)
    }

    /// Returns the option as a string, or the empty string.
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// Renders included options as `--key-name=value`, sorted by name.
    /// Options whose value is empty are skipped, except integers.
    pub fn stringify(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|(_, o)| o.include && (o.value.is_truthy() || o.value.is_int()))
            .map(|(name, o)| {
                let rendered = match &o.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("--{}={}", name.replace('_', "-"), rendered)
            })
            .collect()
    }
}
