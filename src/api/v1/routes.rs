/*
 * Responsibility
 * - v1 の URL 構造と、route ごとの access policy を 1 箇所で定義
 * - SecuredRouter 経由で登録するので「policy なしの route」は作れない
 * - /health と /auth 以下を登録
 */
use axum::Router;

use crate::api::secured_router::SecuredRouter;
use crate::services::auth::policy::{AccessPolicy, PolicyError, PolicyTable, roles};
use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{change_password, change_user_password, login, logout, me, refresh_token, register},
    health::{health, health_db},
};

pub const PREFIX: &str = "/api/v1";

pub fn routes() -> Result<(Router<AppState>, PolicyTable), PolicyError> {
    let user_admins = AccessPolicy::roles_allowed([roles::SUPER_USUARIO, roles::ADMINISTRADOR])?;

    let router = SecuredRouter::new(PREFIX)
        .get("/health", health, AccessPolicy::Public)?
        .get("/health/db", health_db, AccessPolicy::Public)?
        .post("/auth/login", login, AccessPolicy::Public)?
        .post("/auth/refresh-token", refresh_token, AccessPolicy::Authenticated)?
        .post("/auth/logout", logout, AccessPolicy::Authenticated)?
        .post("/auth/register", register, user_admins.clone())?
        .post("/auth/change-password", change_password, AccessPolicy::Authenticated)?
        .post("/auth/change-user-password", change_user_password, user_admins)?
        .get("/auth/me", me, AccessPolicy::Authenticated)?;

    Ok(router.into_parts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn every_route_has_a_policy() {
        let (_, table) = routes().unwrap();

        assert_eq!(table.len(), 9);
        assert_eq!(
            table.lookup(&Method::POST, "/api/v1/auth/login"),
            Some(&AccessPolicy::Public)
        );
        assert_eq!(
            table.lookup(&Method::GET, "/api/v1/auth/me"),
            Some(&AccessPolicy::Authenticated)
        );
        assert!(matches!(
            table.lookup(&Method::POST, "/api/v1/auth/register"),
            Some(AccessPolicy::RolesAllowed(r))
                if r.contains(roles::SUPER_USUARIO) && r.contains(roles::ADMINISTRADOR) && r.len() == 2
        ));
        assert_eq!(
            table.lookup(&Method::POST, "/api/v1/auth/change-user-password"),
            table.lookup(&Method::POST, "/api/v1/auth/register"),
        );
    }
}
