use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::config::Config;
use parley_api::guard::{RateLimitConfig, RateLimiter};
use parley_api::routes::{health_router, probe_router};
use parley_api::routes::probe::ProbeLimiters;
use parley_api::services::TokenVerifier;

/// Build the CORS layer based on configuration.
///
/// Production rejects cross-origin requests unless the deployment
/// terminates them upstream; development uses permissive CORS for
/// convenience.
fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.is_production() {
        tracing::info!("CORS disabled in production mode; configure the reverse proxy instead");
        CorsLayer::new()
    } else {
        tracing::warn!("Using permissive CORS in development mode");
        CorsLayer::permissive()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (development convenience)
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.common.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = %config.common.environment,
        port = config.port,
        "Starting Parley API"
    );

    let verifier = Arc::new(TokenVerifier::new(&config.jwt_secret));

    // Process-wide limiter instances, shared by handle into every chain
    // that needs them
    let limiters = ProbeLimiters {
        write: Arc::new(RateLimiter::new(RateLimitConfig::new(
            "write",
            config.write_limit.limit,
            config.write_limit.period_secs,
        ))),
        reply: Arc::new(RateLimiter::new(RateLimitConfig::new(
            "reply",
            config.reply_limit.limit,
            config.reply_limit.period_secs,
        ))),
        reply_burst: Arc::new(RateLimiter::new(RateLimitConfig::new(
            "reply-burst",
            config.reply_burst_limit.limit,
            config.reply_burst_limit.period_secs,
        ))),
    };

    // Account endpoints (login/register) are mounted by the composing
    // service, which supplies the credential backend; see routes::auth
    let app = Router::new()
        .nest("/api/v1/health", health_router())
        .nest("/api/v1", probe_router(verifier, limiters))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
