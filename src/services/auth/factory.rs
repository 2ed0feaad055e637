/// Factory: build `TokenService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::TokenService;

pub fn build_token_service(config: &Config) -> Arc<TokenService> {
    Arc::new(TokenService::new(
        config.jwt_key.as_bytes(),
        config.jwt_expiration_hours,
        config.access_token_leeway_seconds,
    ))
}
