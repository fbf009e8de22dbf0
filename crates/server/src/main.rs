//! Pollhub server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use pollhub_api::{middleware::AppState, router as api_router};
use pollhub_common::Config;
use pollhub_core::{
    BookmarkService, ImportService, PollService, StatsService, UserService, VoteService,
};
use pollhub_db::repositories::{
    BookmarkRepository, BulkUploadRepository, PollRepository, UserRepository, VoteRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pollhub=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting pollhub server...");

    let config = Config::load()?;

    let db = pollhub_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    pollhub_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let bookmark_repo = BookmarkRepository::new(Arc::clone(&db));
    let upload_repo = BulkUploadRepository::new(Arc::clone(&db));

    // Services
    let user_service = UserService::new(user_repo.clone());
    let poll_service = PollService::new(poll_repo.clone(), vote_repo.clone());
    let vote_service = VoteService::new(poll_repo.clone(), vote_repo.clone());
    let bookmark_service = BookmarkService::new(bookmark_repo.clone(), poll_repo.clone());
    let import_service = ImportService::new(
        user_repo.clone(),
        poll_repo.clone(),
        vote_repo.clone(),
        upload_repo,
        config.import.clone(),
    );
    let stats_service = StatsService::new(poll_repo, vote_repo, user_repo, bookmark_repo);

    let state = AppState {
        user_service,
        poll_service,
        vote_service,
        bookmark_service,
        import_service,
        stats_service,
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pollhub_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
