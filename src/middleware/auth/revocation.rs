//! Session-revocation gate.
//!
//! Rejects bearer tokens that carry the `logout` marker claim, even when they
//! are otherwise validly signed. Signature verification is left to the access
//! middleware that runs right after this one.
//!
//! Unreadable tokens:
//! - `ParseFailurePolicy::Proceed` (default) lets the request continue; the access
//!   middleware then treats it as anonymous. A truncated token therefore skips the
//!   marker check, which is why every occurrence is logged at `warn`.
//! - `ParseFailurePolicy::Reject` answers 401 immediately.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::bearer_token;
use crate::services::auth::logout_marker::{self, MarkerStatus};

/// What to do when the bearer token cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailurePolicy {
    Proceed,
    Reject,
}

pub fn apply<S>(router: Router<S>, parse_failure: ParseFailurePolicy) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        parse_failure,
        revocation_middleware,
    ))
}

async fn revocation_middleware(
    State(parse_failure): State<ParseFailurePolicy>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(req.headers()) {
        match logout_marker::inspect(token) {
            Ok(MarkerStatus::Clear) => {}
            Ok(MarkerStatus::LoggedOut) => {
                tracing::info!(path = %req.uri().path(), "rejected token carrying logout marker");
                return Err(AppError::SessionClosed);
            }
            Err(err) => match parse_failure {
                ParseFailurePolicy::Proceed => {
                    tracing::warn!(
                        error = %err,
                        path = %req.uri().path(),
                        "unreadable bearer token; logout marker not checked"
                    );
                }
                ParseFailurePolicy::Reject => {
                    tracing::warn!(error = %err, path = %req.uri().path(), "unreadable bearer token rejected");
                    return Err(AppError::Unauthenticated);
                }
            },
        }
    }

    Ok(next.run(req).await)
}
