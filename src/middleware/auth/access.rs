//! access token (HS256 JWT) 検証 → Principal を extensions に入れる
//!
//! - 検証できない / 無い場合は拒否せず `Principal::Anonymous` を入れる。
//!   401 にするかどうかは role gate と `CurrentUser` extractor が決める。
//! - 署名検証 + exp (leeway 付き) は TokenService 側で実施

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Principal;
use crate::middleware::auth::bearer_token;
use crate::services::auth::TokenService;

pub fn apply<S>(router: Router<S>, tokens: Arc<TokenService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(tokens, access_middleware))
}

async fn access_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let principal = match bearer_token(req.headers()) {
        None => Principal::Anonymous,
        Some(token) => match tokens.verify(token) {
            Ok(ctx) => Principal::Authenticated(ctx),
            Err(err) => {
                tracing::debug!(error = %err, "access token verification failed");
                Principal::Anonymous
            }
        },
    };

    if let Principal::Authenticated(ctx) = &principal {
        tracing::trace!(user_id = ctx.user_id, roles = %ctx.roles, "caller authenticated");
    }

    // middleware → extractor / role gate への受け渡し
    req.extensions_mut().insert(principal);

    next.run(req).await
}
