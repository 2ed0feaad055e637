//! Authentication / authorization gates.
//!
//! Order per request (outermost first):
//! 1. `revocation` - rejects tokens carrying the logout marker (no signature check)
//! 2. `access`     - verifies the bearer token and stores a `Principal` in extensions
//! 3. `roles`      - looks up the matched route's policy and allows or denies
//!
//! All three are applied with `Router::layer`, so they only run for matched
//! routes and `MatchedPath` is available to the role gate.

pub mod access;
pub mod revocation;
pub mod roles;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderMap, header};

use crate::services::auth::TokenService;
use crate::services::auth::policy::PolicyTable;

use self::revocation::ParseFailurePolicy;

/// Apply the three gates in the order above.
pub fn apply<S>(
    router: Router<S>,
    policies: Arc<PolicyTable>,
    tokens: Arc<TokenService>,
    parse_failure: ParseFailurePolicy,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // layer は後から積んだものが外側になる
    let router = roles::apply(router, policies);
    let router = access::apply(router, tokens);
    revocation::apply(router, parse_failure)
}

/// `Authorization: Bearer <token>` → `<token>`. The scheme name is case-insensitive.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
