mod auth_ctx;
mod json;

pub use auth_ctx::{AuthCtx, CurrentUser, Principal};
pub use json::AppJson;
