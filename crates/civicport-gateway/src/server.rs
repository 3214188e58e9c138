//! Portal server — router assembly and lifecycle

use crate::guard;
use crate::handlers::{admin, appointments, auth, documents, issues};
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use civicport_core::PortalConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn start_portal(config: PortalConfig) -> anyhow::Result<()> {
    config.validate()?;

    let bind_addr: SocketAddr = format!("{}:{}", config.gateway.bind.to_addr(), config.gateway.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {e}"))?;

    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state.clone());

    // sweep stale cached sessions in the background
    let sweeper_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweeper_state.sessions.evict_expired();
        }
    });

    info!("Civicport portal v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Backend:      {}", state.backend.base_url());
    info!(
        "  Channels:     {:?} (available: {:?})",
        state.dispatcher.channel_names(),
        state.dispatcher.available_channels()
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/api/services", get(appointments::services))
        .route("/api/issues/categories", get(issues::categories))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/appointments",
            get(appointments::list).post(appointments::book),
        )
        .route("/api/appointments/check-in", post(appointments::check_in))
        .route("/api/appointments/:id", get(appointments::get_one))
        .route("/api/appointments/:id/cancel", post(appointments::cancel))
        .route("/api/appointments/:id/confirm", post(appointments::confirm))
        .route("/api/appointments/:id/complete", post(appointments::complete))
        .route("/api/appointments/:id/no-show", post(appointments::no_show))
        .route("/api/appointments/:id/remind", post(appointments::remind))
        .route("/api/appointments/:id/qr", get(appointments::qr))
        .route("/api/issues", get(issues::list).post(issues::report))
        .route("/api/issues/:id", get(issues::get_one))
        .route("/api/issues/:id/assign", post(issues::assign))
        .route("/api/issues/:id/status", post(issues::update_status))
        .route("/api/documents", get(documents::list).post(documents::submit))
        .route("/api/documents/:id", get(documents::get_one))
        .route("/api/documents/:id/review", post(documents::review))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/role", post(admin::set_role))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "cached_sessions": state.sessions.len(),
        "channels": state.dispatcher.available_channels(),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
