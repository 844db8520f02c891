//! Server binary: fail-fast startup, then serve the catalog API.

use ant_support::{api_routes, db, health_routes, run_migrations, AppState, Config};
use axum::Router;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ant_support=info,tower_http=info")),
        )
        .init();

    // Missing configuration or an unreachable database is fatal.
    if let Err(e) = run().await {
        tracing::error!(error = %e, "startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    db::ensure_database_exists(&config.database).await?;
    let pool = db::connect(&config.database).await?;
    let info = db::test_connection(&pool).await?;
    tracing::info!(
        version = %info.version.split(' ').take(2).collect::<Vec<_>>().join(" "),
        server_time = %info.server_time,
        "database connected"
    );

    let applied = run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "migrations applied");
    }

    let state = AppState { pool };

    let cors = if config.cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .merge(health_routes(state.clone()))
        .nest("/api/v1", api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(GlobalConcurrencyLimitLayer::new(config.max_in_flight));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
