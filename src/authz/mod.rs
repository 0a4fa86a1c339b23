//! Claims-based authorization: permission mapping and the allow/deny decision.

use crate::claims::InboundClaims;
use std::collections::BTreeSet;
use std::fmt;

/// A canonical permission derived from token claims. The namespace prefix
/// keeps scope-derived and group-derived permissions composable as predicates
/// over a single set instead of two separate structures.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission(String);

impl Permission {
    /// Permission derived from a scope or app-role claim (`SCOPE_` prefix).
    pub fn scope(name: &str) -> Self {
        Self(format!("SCOPE_{name}"))
    }

    /// Permission derived from a group membership claim (`GROUP_` prefix).
    pub fn group(id: &str) -> Self {
        Self(format!("GROUP_{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map token claims to the canonical permission set. Pure and total:
/// duplicates collapse and input order is irrelevant.
pub fn to_permissions(claims: &InboundClaims) -> BTreeSet<Permission> {
    claims
        .scopes
        .iter()
        .map(|scope| Permission::scope(scope))
        .chain(claims.groups.iter().map(|group| Permission::group(group)))
        .collect()
}

/// How a request gets authorized, selected by inspecting the token.
///
/// `AppOnlyBypass` admits client-credentials tokens without any group check.
/// App-only callers are vetted when their application registration is granted
/// access, so the group policy does not apply to them. This is a deliberate,
/// security-sensitive rule: a compromised app registration passes every group
/// gate, so anyone auditing access control should start here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationPolicy {
    AppOnlyBypass,
    GroupMembership,
}

impl AuthorizationPolicy {
    /// Select the policy variant for a claim set.
    pub fn for_claims(claims: &InboundClaims) -> Self {
        if claims.is_app_only() {
            Self::AppOnlyBypass
        } else {
            Self::GroupMembership
        }
    }
}

/// Outcome of a policy evaluation. Derived per request, never stored.
#[derive(Debug, Clone)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: String,
}

/// Evaluate the authorization policy for one request. Stateless predicate:
/// app-only tokens pass unconditionally, delegated tokens must hold the
/// required group permission.
///
/// The deny reason enumerates the permissions actually held. They contain
/// group IDs and scope names only, never token material.
pub fn authorize(claims: &InboundClaims, required_group: &str) -> AuthorizationDecision {
    match AuthorizationPolicy::for_claims(claims) {
        AuthorizationPolicy::AppOnlyBypass => AuthorizationDecision {
            allowed: true,
            reason: "app-only bypass".to_string(),
        },
        AuthorizationPolicy::GroupMembership => {
            let held = to_permissions(claims);
            let required = Permission::group(required_group);
            if held.contains(&required) {
                AuthorizationDecision {
                    allowed: true,
                    reason: format!("member of required group {required_group}"),
                }
            } else {
                let held = held
                    .iter()
                    .map(Permission::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                AuthorizationDecision {
                    allowed: false,
                    reason: format!(
                        "not a member of required group {required_group}; held permissions: [{held}]"
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn claims(
        groups: &[&str],
        scopes: &[&str],
        app_id_acr: Option<&str>,
    ) -> InboundClaims {
        InboundClaims {
            subject: "alice".to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            app_id_acr: app_id_acr.map(str::to_string),
            raw_token: "raw-jwt".to_string(),
        }
    }

    #[test]
    fn test_app_only_token_bypasses_group_check() {
        // No groups at all, still allowed
        let decision = authorize(&claims(&[], &[], Some("1")), "g1");
        assert!(decision.allowed);
        assert_eq!(decision.reason, "app-only bypass");

        // Wrong groups, still allowed
        let decision = authorize(&claims(&["g2", "g3"], &[], Some("1")), "g1");
        assert!(decision.allowed);
    }

    #[test]
    fn test_member_of_required_group_is_allowed() {
        let decision = authorize(&claims(&["g1"], &[], None), "g1");
        assert!(decision.allowed);
        assert!(decision.reason.contains("g1"));

        // appidacr present but not "1" does not trigger the bypass
        let decision = authorize(&claims(&["g1"], &[], Some("0")), "g1");
        assert!(decision.allowed);
    }

    #[test]
    fn test_non_member_is_denied() {
        let decision = authorize(&claims(&["g2"], &[], None), "g1");
        assert!(!decision.allowed);
    }

    #[test]
    fn test_deny_reason_names_missing_group_and_held_permissions() {
        let decision = authorize(&claims(&["g2"], &[], None), "g1");
        assert!(!decision.allowed);
        assert!(decision.reason.contains("g1"));
        assert!(decision.reason.contains("GROUP_g2"));
    }

    #[test]
    fn test_permission_mapping_is_order_independent() {
        let forward = to_permissions(&claims(&["g1", "g2"], &["Reports.Read"], None));
        let reversed = to_permissions(&claims(&["g2", "g1"], &["Reports.Read"], None));
        assert_eq!(forward, reversed);

        // Duplicates collapse under set semantics
        let duplicated = to_permissions(&claims(&["g1", "g1", "g2"], &["Reports.Read"], None));
        assert_eq!(duplicated, forward);
    }

    #[test]
    fn test_permission_prefixes() {
        let permissions = to_permissions(&claims(&["g1"], &["Reports.Read"], None));
        let expected: BTreeSet<Permission> =
            [Permission::group("g1"), Permission::scope("Reports.Read")]
                .into_iter()
                .collect();
        assert_eq!(permissions, expected);
    }

    #[test]
    fn test_policy_selection() {
        assert_eq!(
            AuthorizationPolicy::for_claims(&claims(&[], &[], Some("1"))),
            AuthorizationPolicy::AppOnlyBypass
        );
        assert_eq!(
            AuthorizationPolicy::for_claims(&claims(&[], &[], None)),
            AuthorizationPolicy::GroupMembership
        );
    }
}
