use std::collections::HashSet;

/// The chat identity issuing a command: user id plus resolved role names.
///
/// Built per interaction from the platform context; never persisted.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub role_names: Vec<String>,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: u64, role_names: Vec<String>) -> Self {
        Self {
            user_id,
            role_names,
        }
    }
}

/// Decides whether an actor may act on a named managed server.
///
/// Evaluation must be a pure predicate: no side effects, no state. The
/// `server_name` parameter is the extension point for per-server rules;
/// the shipped [`GlobalAllowlist`] ignores it.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, actor: &Actor, server_name: &str) -> bool;
}

/// Allow-list policy scoped to the whole bot: a user is authorized if their
/// id is listed, or if any of their roles is listed.
///
/// Empty allow-lists mean nobody is authorized; removing the last entry
/// must never silently switch to open access.
#[derive(Debug, Clone, Default)]
pub struct GlobalAllowlist {
    allowed_user_ids: HashSet<u64>,
    /// Lowercased at construction; matched case-insensitively.
    allowed_role_names: HashSet<String>,
}

impl GlobalAllowlist {
    #[must_use]
    pub fn new(
        user_ids: impl IntoIterator<Item = u64>,
        role_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            allowed_user_ids: user_ids.into_iter().collect(),
            allowed_role_names: role_names.into_iter().map(|r| r.to_lowercase()).collect(),
        }
    }
}

impl AccessPolicy for GlobalAllowlist {
    fn allows(&self, actor: &Actor, _server_name: &str) -> bool {
        if self.allowed_user_ids.contains(&actor.user_id) {
            return true;
        }
        actor
            .role_names
            .iter()
            .any(|role| self.allowed_role_names.contains(&role.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn policy(user_ids: &[u64], roles: &[&str]) -> GlobalAllowlist {
        GlobalAllowlist::new(
            user_ids.iter().copied(),
            roles.iter().map(|r| (*r).to_string()),
        )
    }

    #[test]
    fn listed_user_id_allows_regardless_of_roles() {
        let p = policy(&[111], &["admins"]);
        assert!(p.allows(&Actor::new(111, Vec::new()), "smp"));
        assert!(p.allows(&Actor::new(111, vec!["randoms".into()]), "smp"));
    }

    #[test]
    fn listed_role_allows() {
        let p = policy(&[], &["Admins"]);
        assert!(p.allows(&Actor::new(999, vec!["Admins".into()]), "smp"));
    }

    #[rstest]
    #[case("admins")]
    #[case("ADMINS")]
    #[case("AdMiNs")]
    fn role_match_is_case_insensitive(#[case] role: &str) {
        let p = policy(&[], &["Admins"]);
        assert!(p.allows(&Actor::new(999, vec![role.into()]), "smp"));
    }

    #[test]
    fn unlisted_actor_is_denied() {
        let p = policy(&[111], &["admins"]);
        assert!(!p.allows(&Actor::new(222, vec!["members".into()]), "smp"));
        assert!(!p.allows(&Actor::new(222, Vec::new()), "smp"));
    }

    /// Security regression: removing the last entry from both allow-lists
    /// must NOT switch to open access. Empty lists deny every actor.
    #[test]
    fn security_empty_allowlists_deny_everyone() {
        let p = policy(&[], &[]);
        assert!(!p.allows(&Actor::new(111, Vec::new()), "smp"));
        assert!(!p.allows(&Actor::new(111, vec!["admins".into()]), "smp"));
        assert!(!p.allows(&Actor::new(0, vec![String::new()]), "smp"));
    }

    #[test]
    fn server_name_does_not_affect_global_policy() {
        let p = policy(&[111], &[]);
        let actor = Actor::new(111, Vec::new());
        assert!(p.allows(&actor, "smp"));
        assert!(p.allows(&actor, "does-not-exist"));
    }
}
