//! Omni food ordering backend.
//!
//! Users register and log in, browse the meal catalog, place orders and list their
//! own orders. A welcome mail and an order confirmation go out best effort.
//!
//!
//!
//! # Endpoints
//!
//! | Route | Auth | Body | Response |
//! |---|---|---|---|
//! | `GET /` | - | - | landing page |
//! | `POST /api/register` | - | `{name, email, password}` | 201 / 400 / 500 |
//! | `POST /api/login` | - | `{email, password}` | 200 `{token}` / 400 / 500 |
//! | `GET /api/meals` | - | - | 200 `[Meal]` / 500 |
//! | `POST /api/orders` | Bearer | `{meals: [{mealId, quantity, price}]}` | 201 `{order}` / 400 / 401 / 500 |
//! | `GET /api/order` | Bearer | - | 200 `[Order]` / 401 / 500 |
//!
//! Static assets are served from `PUBLIC_DIR` under `/public`, by default the
//! `public/` directory shipped next to this crate.
//!
//!
//!
//! # Request Flow
//! - Browser hits the router, CORS and request tracing wrap everything
//! - Order routes pass through [`auth::require_auth`] first
//! - Handlers in [`routes`] stay thin, the rules live in [`accounts`] and [`orders`]
//! - Stores are trait objects on [`state::AppState`], MongoDB or in memory
//! - Notifications are awaited but can never fail the request
//!
//!
//!
//! # Client
//! - Sign up modal posts to `/api/register`, then asks the user to log in
//! - Login form stores the returned token in `localStorage`
//! - Order buttons post one line item with `Authorization: Bearer <token>`
//! - A 401 on ordering drops the stored token
//!
//!
//!
//! # Setup
//!
//! Run against MongoDB.
//! ```sh
//! MONGODB_URI=mongodb://localhost:27017 JWT_SECRET=change-me cargo run -p omnifood
//! ```
//!
//! Run fully in memory, mail only logged.
//! ```sh
//! JWT_SECRET=change-me RUST_LOG=info cargo run -p omnifood
//! ```
//!
//! Drive a running server through the ordering flow.
//! ```sh
//! cargo run -p omnifood-tester -- --base-url http://localhost:4000
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod accounts;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod memory;
pub mod models;
pub mod notifier;
pub mod orders;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

use auth::require_auth;
use config::Config;
use routes::{
    create_order_handler, index_handler, login_handler, meals_handler, orders_handler,
    register_handler,
};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let protected = Router::new()
        .route("/api/orders", post(create_order_handler))
        .route("/api/order", get(orders_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(index_handler))
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .route("/api/meals", get(meals_handler))
        .merge(protected)
        .nest_service("/public", ServeDir::new(&state.config.public_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
