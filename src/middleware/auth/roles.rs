//! Role gate: matched route policy × caller principal → allow / 401 / 403.
//!
//! The policy comes from the static `PolicyTable` (keyed by method + route
//! template from `MatchedPath`), the principal from the access middleware.
//! Nothing is mutated; the decision itself lives in `policy::authorize`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Principal;
use crate::error::AppError;
use crate::services::auth::policy::{AccessPolicy, Decision, PolicyTable, authorize};

pub fn apply<S>(router: Router<S>, policies: Arc<PolicyTable>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(policies, role_gate))
}

async fn role_gate(
    State(policies): State<Arc<PolicyTable>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let policy = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| policies.lookup(req.method(), path.as_str()));

    let principal = req.extensions().get::<Principal>();
    let decision = match principal {
        Some(principal) => authorize(policy, principal),
        None => authorize(policy, &Principal::Anonymous),
    };

    match decision {
        Decision::Allowed => {}
        Decision::Unauthenticated => {
            tracing::info!(
                method = %req.method(),
                path = %req.uri().path(),
                "role gate denied: not authenticated"
            );
            return Err(AppError::Unauthenticated);
        }
        Decision::Forbidden => {
            tracing::info!(
                method = %req.method(),
                path = %req.uri().path(),
                user_id = ?principal.and_then(Principal::user_id),
                required = %required_roles(policy),
                "role gate denied: no allowed role"
            );
            return Err(AppError::Forbidden);
        }
    }

    Ok(next.run(req).await)
}

fn required_roles(policy: Option<&AccessPolicy>) -> String {
    match policy {
        Some(AccessPolicy::RolesAllowed(roles)) => roles.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use crate::api::v1::extractors::AuthCtx;
    use crate::services::auth::policy::{RoleSet, roles};

    async fn handler() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        let mut table = PolicyTable::new();
        table
            .insert(
                Method::GET,
                "/vehiculos/{id}",
                AccessPolicy::roles_allowed([roles::ADMINISTRADOR]).unwrap(),
            )
            .unwrap();
        table
            .insert(
                Method::GET,
                "/ordenes",
                AccessPolicy::roles_allowed([roles::ADMINISTRADOR, roles::SUPERVISOR]).unwrap(),
            )
            .unwrap();

        let router = Router::new()
            .route("/vehiculos/{id}", get(handler))
            .route("/ordenes", get(handler))
            .route("/catalogos", get(handler));
        apply(router, Arc::new(table))
    }

    fn request(method: Method, uri: &str, roles: Option<&[&str]>) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        if let Some(roles) = roles {
            req.extensions_mut()
                .insert(Principal::Authenticated(AuthCtx {
                    user_id: 10,
                    username: "test".to_string(),
                    full_name: None,
                    roles: RoleSet::new(roles.iter().copied()),
                }));
        }
        req
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn technician_on_admin_route_gets_403_with_message() {
        let resp = app()
            .oneshot(request(Method::GET, "/vehiculos/3", Some(&["Técnico"])))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = body_json(resp).await;
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "data": null,
                "message": "No tiene permisos para realizar esta acción."
            })
        );
    }

    #[tokio::test]
    async fn unauthenticated_caller_gets_401() {
        let resp = app()
            .oneshot(request(Method::GET, "/ordenes", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "No autenticado. Inicie sesión para continuar.");
    }

    #[tokio::test]
    async fn unannotated_route_admits_anyone() {
        for roles in [None, Some(&["Operador"][..])] {
            let resp = app()
                .oneshot(request(Method::GET, "/catalogos", roles))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn overlapping_role_reaches_the_handler() {
        let resp = app()
            .oneshot(request(
                Method::GET,
                "/ordenes",
                Some(&["Operador", "Supervisor"]),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn policy_is_found_through_the_route_template() {
        let resp = app()
            .oneshot(request(Method::GET, "/vehiculos/99", Some(&["Administrador"])))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app()
            .oneshot(request(Method::GET, "/vehiculos/99", Some(&["Supervisor"])))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn head_is_gated_like_get() {
        let resp = app()
            .oneshot(request(Method::HEAD, "/ordenes", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
