//! `AdoptMe` server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use adoptme_api::{
    ApiRateLimiter, AppState, meta,
    middleware::{auth_middleware, expose_error_detail},
    not_found,
    rate_limit::limits,
    router as api_router,
};
use adoptme_common::{Config, LocalStorage, StorageBackend};
use adoptme_core::{
    AccountService, AuditService, FavoriteService, InquiryService, ListingService,
    ModerationService, mailer_from_config,
};
use adoptme_db::repositories::{
    AuditLogRepository, InquiryRepository, ListingRepository, ReportRepository, UserRepository,
};
use axum::{Router, extract::DefaultBodyLimit, middleware};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Request body cap for JSON routes. Image uploads enforce their own limit.
const BODY_LIMIT: usize = 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "adoptme=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;
    init_tracing(config.logging.json);

    info!(environment = %config.server.environment, "Starting AdoptMe server...");

    // Connect to database
    let db = Arc::new(adoptme_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    adoptme_db::migrate(&db).await?;
    info!("Migrations completed");

    // Collaborators
    tokio::fs::create_dir_all(&config.storage.base_path).await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));
    let mailer = mailer_from_config(&config.mail)?;

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let listing_repo = ListingRepository::new(Arc::clone(&db));
    let inquiry_repo = InquiryRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let audit_repo = AuditLogRepository::new(Arc::clone(&db));

    // Initialize services
    let audit_service = AuditService::new(audit_repo, user_repo.clone());
    let state = AppState {
        account_service: AccountService::new(user_repo.clone(), mailer, &config),
        listing_service: ListingService::new(
            listing_repo.clone(),
            user_repo.clone(),
            storage,
            &config.storage,
        ),
        favorite_service: FavoriteService::new(user_repo.clone(), listing_repo.clone()),
        inquiry_service: InquiryService::new(inquiry_repo, listing_repo.clone(), user_repo.clone()),
        moderation_service: ModerationService::new(
            report_repo,
            listing_repo,
            user_repo,
            audit_service.clone(),
        ),
        audit_service,
    };

    // Expired rate limit windows
    let auth_limiter = ApiRateLimiter::new(limits::AUTH).trust_proxy(config.server.trust_proxy);
    let sweeper = auth_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(limits::AUTH.window_secs));
        loop {
            interval.tick().await;
            sweeper.cleanup().await;
        }
    });

    // Build router
    let mut app = Router::new()
        .merge(meta::router::<AppState>())
        .nest("/api", api_router(auth_limiter))
        .nest_service("/uploads", ServeDir::new(&config.storage.base_path))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    if !config.server.is_production() {
        app = app.layer(middleware::from_fn(expose_error_detail));
    }

    let app = app
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
