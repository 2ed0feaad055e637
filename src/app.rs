/*
 * Responsibility
 * - tracing / panic hook 初期化
 * - Config 読み込み → 依存生成 (PgPool, TokenService) → 初期管理者の確認 → Router 組み立て
 * - Middleware の適用順: auth gates (route 単位) → security headers → CORS → HTTP (最外)
 * - axum::serve() で起動、SIGINT/SIGTERM で graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::user_repo::PgUserRepo,
    services::{
        auth::{build_token_service, policy::PolicyError},
        bootstrap,
    },
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG=info,mantenimiento_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr が見えない起動方法でも panic を取りこぼさないよう tracing に流す
        tracing::error!(?info, "panic");

        // development: 即落として気付かせる / production: default hook に任せて継続
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    let users = Arc::new(PgUserRepo::new(pool));
    let outcome =
        bootstrap::ensure_initial_admin(users.as_ref(), config.initial_admin.as_ref()).await?;
    tracing::debug!(?outcome, "startup data checked");

    let state = AppState::new(users, build_token_service(&config));
    let app = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Full application router. Fails only when the route policy table is inconsistent.
pub fn build_router(state: AppState, config: &Config) -> Result<Router, PolicyError> {
    let (v1, policies) = api::v1::routes()?;
    tracing::debug!(
        prefix = api::v1::PREFIX,
        routes = policies.len(),
        "route policies registered"
    );

    let router = middleware::auth::apply(
        v1,
        Arc::new(policies),
        state.tokens.clone(),
        config.revocation_parse_failure,
    )
    .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    Ok(middleware::http::apply(router, config))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
