//! Requested and observed states of a managed resource.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

/// State requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
    List,
}

impl DesiredState {
    pub fn as_str(self) -> &'static str {
        match self {
            DesiredState::Present => "present",
            DesiredState::Absent => "absent",
            DesiredState::List => "list",
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known state of a managed resource during one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceState {
    #[default]
    Unknown,
    Absent,
    Present,
    Updating,
}

impl ResourceState {
    /// Moves to `next`, logging the change.
    pub fn transition(&mut self, resource: &str, next: ResourceState) {
        if *self != next {
            info!(resource, from = %self, to = %next, "resource state changed");
        }
        *self = next;
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceState::Unknown => "unknown",
            ResourceState::Absent => "absent",
            ResourceState::Present => "present",
            ResourceState::Updating => "updating",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_state_parses_lowercase() {
        let state: DesiredState = serde_yaml::from_str("absent").unwrap();
        assert_eq!(state, DesiredState::Absent);
        assert!(serde_yaml::from_str::<DesiredState>("Absent").is_err());
        assert_eq!(DesiredState::default(), DesiredState::Present);
    }

    #[test]
    fn test_transition() {
        let mut state = ResourceState::default();
        state.transition("route/web", ResourceState::Absent);
        state.transition("route/web", ResourceState::Present);
        assert_eq!(state, ResourceState::Present);
        assert_eq!(state.to_string(), "present");
    }
}
