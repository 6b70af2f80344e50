//! Deep comparison of a desired document against an observed one.

use std::collections::BTreeSet;

use tracing::debug;

use crate::value::{Map, Value};

/// Keys populated by the server that never take part in a comparison.
pub const ALWAYS_SKIPPED: [&str; 2] = ["metadata", "status"];

/// Reports whether `observed` already satisfies `desired`.
///
/// Only the keys of `observed` are visited, so keys present solely in
/// `desired` are not checked. `metadata`, `status` and every key in
/// `skip_keys` are ignored at all levels. Sequence values must have the same
/// length on both sides; element pairs that are both mappings are compared
/// recursively, any other pair requires the whole sequences to be equal.
/// Mapping values must expose the same key set (minus ignored keys) and are
/// compared recursively. Anything else must be equal.
///
/// When `verbose` is set the reason for the first mismatch is logged.
pub fn check_def_equal(desired: &Value, observed: &Value, skip_keys: &[&str], verbose: bool) -> bool {
    match (desired, observed) {
        (Value::Map(desired), Value::Map(observed)) => {
            Comparer { skip_keys, verbose }.maps_equal(desired, observed)
        }
        (_, Value::Map(_)) => {
            if verbose {
                debug!(desired = desired.type_name(), "desired document is not a mapping");
            }
            false
        }
        _ => desired == observed,
    }
}

struct Comparer<'a> {
    skip_keys: &'a [&'a str],
    verbose: bool,
}

impl Comparer<'_> {
    fn skipped(&self, key: &str) -> bool {
        ALWAYS_SKIPPED.contains(&key) || self.skip_keys.contains(&key)
    }

    fn mismatch(&self, key: &str, reason: &str) -> bool {
        if self.verbose {
            debug!(key, reason, "definitions differ");
        }
        false
    }

    fn maps_equal(&self, desired: &Map, observed: &Map) -> bool {
        for (key, value) in observed.iter() {
            if self.skipped(key) {
                continue;
            }

            let equal = match value {
                Value::List(observed_list) => self.lists_equal(key, desired.get(key), observed_list),
                Value::Map(observed_map) => self.nested_maps_equal(key, desired.get(key), observed_map),
                scalar => match desired.get(key) {
                    Some(wanted) if wanted == scalar => true,
                    Some(_) => self.mismatch(key, "values are not equal"),
                    None => self.mismatch(key, "desired document does not have key"),
                },
            };
            if !equal {
                return false;
            }
        }
        true
    }

    fn lists_equal(&self, key: &str, desired: Option<&Value>, observed: &[Value]) -> bool {
        let Some(desired) = desired else {
            return self.mismatch(key, "desired document does not have key");
        };
        let Value::List(desired_list) = desired else {
            return self.mismatch(key, "desired value is not a list");
        };
        if desired_list.len() != observed.len() {
            return self.mismatch(key, "list lengths are not equal");
        }

        for (wanted, actual) in desired_list.iter().zip(observed) {
            match (wanted, actual) {
                (Value::Map(wanted), Value::Map(actual)) => {
                    if !self.maps_equal(wanted, actual) {
                        return self.mismatch(key, "list element mappings differ");
                    }
                }
                _ => {
                    if desired_list.as_slice() != observed {
                        return self.mismatch(key, "lists should be identical");
                    }
                }
            }
        }
        true
    }

    fn nested_maps_equal(&self, key: &str, desired: Option<&Value>, observed: &Map) -> bool {
        let Some(desired) = desired else {
            return self.mismatch(key, "desired document does not have key");
        };
        let Value::Map(desired_map) = desired else {
            return self.mismatch(key, "desired value is not a mapping");
        };

        let observed_keys: BTreeSet<&str> = observed
            .keys()
            .map(String::as_str)
            .filter(|k| !self.skipped(k))
            .collect();
        let desired_keys: BTreeSet<&str> = desired_map
            .keys()
            .map(String::as_str)
            .filter(|k| !self.skipped(k))
            .collect();
        if observed_keys != desired_keys {
            return self.mismatch(key, "mapping keys are not equal");
        }

        if !self.maps_equal(desired_map, observed) {
            return self.mismatch(key, "nested mappings differ");
        }
        true
    }
}
