//! Security context constraints.

use crate::document::Yedit;
use crate::value::Value;

/// SecurityContextConstraints wraps an SCC document.
#[derive(Debug, Clone)]
pub struct SecurityContextConstraints {
    store: Yedit,
}

impl SecurityContextConstraints {
    pub const KIND: &'static str = "scc";

    const USERS_PATH: &'static str = "users";
    const GROUPS_PATH: &'static str = "groups";

    pub fn new(content: Value) -> Self {
        SecurityContextConstraints {
            store: Yedit::from_document(content),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.store.get("metadata.name").and_then(Value::as_str)
    }

    pub fn users(&self) -> &[Value] {
        self.list(Self::USERS_PATH)
    }

    pub fn groups(&self) -> &[Value] {
        self.list(Self::GROUPS_PATH)
    }

    fn list(&self, path: &str) -> &[Value] {
        self.store
            .get(path)
            .and_then(Value::as_list)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the position of `user` in the users list.
    pub fn find_user(&self, user: &str) -> Option<usize> {
        self.users().iter().position(|u| u.as_str() == Some(user))
    }

    /// Returns the position of `group` in the groups list.
    pub fn find_group(&self, group: &str) -> Option<usize> {
        self.groups().iter().position(|g| g.as_str() == Some(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;

    #[test]
    fn test_find_user() {
        let scc = SecurityContextConstraints::new(
            from_yaml("metadata: {name: privileged}\nusers: [system:admin, alice]\ngroups: [system:masters]\n")
                .unwrap(),
        );
        assert_eq!(scc.name(), Some("privileged"));
        assert_eq!(scc.find_user("alice"), Some(1));
        assert_eq!(scc.find_user("bob"), None);
        assert_eq!(scc.find_group("system:masters"), Some(0));
    }

    #[test]
    fn test_null_users() {
        let scc = SecurityContextConstraints::new(from_yaml("users: null\n").unwrap());
        assert!(scc.users().is_empty());
        assert_eq!(scc.find_user("alice"), None);
    }
}
