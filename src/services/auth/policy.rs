//! Route access policies and the static table the role gate consults.
//!
//! Responsibility:
//! - Declare what a route requires (`AccessPolicy`), fixed at registration time.
//! - Hold the `(method, route template) -> policy` mapping built once at startup.
//! - Decide a request from `(policy, principal)` with no side effects (`authorize`).
//!
//! The table is read-only after startup and shared behind an `Arc`, so lookups
//! need no synchronization.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use axum::http::Method;
use thiserror::Error;

use crate::api::v1::extractors::Principal;

/// Role names known to the plant systems.
pub mod roles {
    pub const SUPER_USUARIO: &str = "SuperUsuario";
    pub const ADMINISTRADOR: &str = "Administrador";
    pub const SUPERVISOR: &str = "Supervisor";
    pub const TECNICO: &str = "Tecnico";
    pub const OPERADOR: &str = "Operador";

    /// Every role the `roles` table is seeded with.
    pub const ALL: [&str; 5] = [SUPER_USUARIO, ADMINISTRADOR, SUPERVISOR, TECNICO, OPERADOR];
}

/// A set of role names. Duplicates collapse and order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn intersects(&self, other: &RoleSet) -> bool {
        // Iterate the smaller side; both are tiny in practice.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().any(|role| large.0.contains(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for role in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(role)?;
            first = false;
        }
        Ok(())
    }
}

/// What a route demands from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No requirement. Equivalent to a route without any annotation.
    Public,
    /// Any authenticated caller, regardless of roles.
    Authenticated,
    /// Authenticated caller holding at least one of these roles. Never empty.
    RolesAllowed(RoleSet),
}

impl AccessPolicy {
    pub fn roles_allowed<I, S>(roles: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = RoleSet::new(roles);
        if roles.is_empty() {
            return Err(PolicyError::EmptyRoleSet);
        }
        Ok(Self::RolesAllowed(roles))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("a roles-allowed policy needs at least one role")]
    EmptyRoleSet,
    #[error("policy already registered for {method} {path}")]
    Duplicate { method: Method, path: String },
}

/// Outcome of the role gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// 401: the route needs a session and the caller has none.
    Unauthenticated,
    /// 403: session present, no overlapping role.
    Forbidden,
}

/// Pure authorization check, evaluated fresh on every request.
///
/// `None` means the route carries no annotation at all.
pub fn authorize(policy: Option<&AccessPolicy>, principal: &Principal) -> Decision {
    match policy {
        None | Some(AccessPolicy::Public) => Decision::Allowed,
        Some(AccessPolicy::Authenticated) => {
            if principal.is_authenticated() {
                Decision::Allowed
            } else {
                Decision::Unauthenticated
            }
        }
        Some(AccessPolicy::RolesAllowed(allowed)) => match principal.roles() {
            None => Decision::Unauthenticated,
            Some(held) if held.intersects(allowed) => Decision::Allowed,
            Some(_) => Decision::Forbidden,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Method,
    path: String,
}

/// Static `(method, route template) -> policy` mapping.
///
/// Route templates are the same strings given to the router (e.g. `/api/v1/auth/me`),
/// which is what `MatchedPath` reports at request time.
#[derive(Debug, Default)]
pub struct PolicyTable {
    entries: HashMap<RouteKey, AccessPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        method: Method,
        path: impl Into<String>,
        policy: AccessPolicy,
    ) -> Result<(), PolicyError> {
        let key = RouteKey {
            method,
            path: path.into(),
        };
        if self.entries.contains_key(&key) {
            return Err(PolicyError::Duplicate {
                method: key.method,
                path: key.path,
            });
        }
        self.entries.insert(key, policy);
        Ok(())
    }

    /// `HEAD` is served by `GET` handlers, so it shares their policy.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&AccessPolicy> {
        let method = if method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };
        self.entries.get(&RouteKey {
            method,
            path: path.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::extractors::AuthCtx;

    fn caller(roles: &[&str]) -> Principal {
        Principal::Authenticated(AuthCtx {
            user_id: 7,
            username: "jperez".to_string(),
            full_name: None,
            roles: RoleSet::new(roles.iter().copied()),
        })
    }

    fn admin_or_supervisor() -> AccessPolicy {
        AccessPolicy::roles_allowed([roles::ADMINISTRADOR, roles::SUPERVISOR]).unwrap()
    }

    #[test]
    fn routes_without_annotation_admit_everyone() {
        assert_eq!(authorize(None, &Principal::Anonymous), Decision::Allowed);
        assert_eq!(authorize(None, &caller(&[])), Decision::Allowed);
        assert_eq!(
            authorize(Some(&AccessPolicy::Public), &Principal::Anonymous),
            Decision::Allowed
        );
    }

    #[test]
    fn anonymous_caller_on_role_route_is_unauthenticated() {
        assert_eq!(
            authorize(Some(&admin_or_supervisor()), &Principal::Anonymous),
            Decision::Unauthenticated
        );
    }

    #[test]
    fn any_shared_role_is_enough() {
        let policy = admin_or_supervisor();

        assert_eq!(
            authorize(Some(&policy), &caller(&["Operador", "Supervisor"])),
            Decision::Allowed
        );
        assert_eq!(
            authorize(Some(&policy), &caller(&["Administrador"])),
            Decision::Allowed
        );
    }

    #[test]
    fn disjoint_roles_are_forbidden() {
        let policy = AccessPolicy::roles_allowed([roles::ADMINISTRADOR]).unwrap();

        assert_eq!(
            authorize(Some(&policy), &caller(&["Técnico"])),
            Decision::Forbidden
        );
        assert_eq!(authorize(Some(&policy), &caller(&[])), Decision::Forbidden);
    }

    #[test]
    fn role_names_are_compared_exactly() {
        let policy = AccessPolicy::roles_allowed([roles::TECNICO]).unwrap();

        assert_eq!(
            authorize(Some(&policy), &caller(&["tecnico", "Técnico"])),
            Decision::Forbidden
        );
    }

    #[test]
    fn authenticated_policy_ignores_roles() {
        let policy = AccessPolicy::Authenticated;

        assert_eq!(authorize(Some(&policy), &caller(&[])), Decision::Allowed);
        assert_eq!(
            authorize(Some(&policy), &Principal::Anonymous),
            Decision::Unauthenticated
        );
    }

    #[test]
    fn empty_role_set_cannot_be_declared() {
        let empty: [&str; 0] = [];
        assert_eq!(
            AccessPolicy::roles_allowed(empty),
            Err(PolicyError::EmptyRoleSet)
        );
    }

    #[test]
    fn role_set_collapses_duplicates() {
        let set = RoleSet::new(["Supervisor", "Operador", "Supervisor"]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "Operador, Supervisor");
    }

    #[test]
    fn table_rejects_duplicate_registration() {
        let mut table = PolicyTable::new();
        table
            .insert(Method::POST, "/api/v1/auth/register", admin_or_supervisor())
            .unwrap();

        let err = table
            .insert(Method::POST, "/api/v1/auth/register", AccessPolicy::Public)
            .unwrap_err();
        assert!(matches!(err, PolicyError::Duplicate { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn head_shares_the_get_policy() {
        let mut table = PolicyTable::new();
        table
            .insert(Method::GET, "/api/v1/auth/me", AccessPolicy::Authenticated)
            .unwrap();

        assert_eq!(
            table.lookup(&Method::HEAD, "/api/v1/auth/me"),
            Some(&AccessPolicy::Authenticated)
        );
        assert_eq!(table.lookup(&Method::POST, "/api/v1/auth/me"), None);
        assert_eq!(table.lookup(&Method::GET, "/api/v1/other"), None);
    }
}
