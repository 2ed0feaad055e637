use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::{AuthCtx, Principal};

/// Handler で認証済みの AuthCtx を受け取るための extractor
/// access middleware が Principal を request.extensions() に insert 済みである前提
/// Anonymous / 未設定の場合は 401 (envelope 付き) を返す
pub struct CurrentUser(pub AuthCtx);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Authenticated(ctx)) => Ok(CurrentUser(ctx.clone())),
            _ => Err(AppError::Unauthenticated),
        }
    }
}
