use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

mod cache;
mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use cache::Cache;
use config::Config;
use middleware::rate_limit::RateLimiter;
use services::razorpay::RazorpayClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub cache: Cache,
    pub config: Arc<Config>,
    pub razorpay: Option<RazorpayClient>,
    pub rate_limiter: RateLimiter,
    pub checkout_rate_limiter: RateLimiter,
}

fn build_router(state: AppState) -> Router {
    let cors = if state.config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // --- Auth routes (no auth required) ---
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // --- Webhook routes (raw body, no auth) ---
    let webhook_routes = Router::new().route("/razorpay", post(routes::webhooks::razorpay_webhook));

    // --- Public catalog ---
    let catalog_routes = Router::new()
        .route("/hotels", get(routes::catalog::list_hotels))
        .route("/flights", get(routes::catalog::list_flights))
        .route("/trains", get(routes::catalog::list_trains))
        .route("/buses", get(routes::catalog::list_buses));

    // --- Authenticated routes ---
    let coin_routes = Router::new()
        .route("/wallet", get(routes::coins::get_wallet))
        .route("/transactions", get(routes::coins::get_transactions))
        .route("/earn", post(routes::coins::earn))
        .route("/max-redeemable", get(routes::coins::max_redeemable))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let booking_routes = Router::new()
        .route("/", get(routes::bookings::list_my_bookings))
        .route("/:vertical/:id", get(routes::bookings::get_booking))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let checkout_routes = Router::new()
        .route(
            "/:vertical",
            post(routes::checkout::submit).layer(axum_mw::from_fn_with_state(
                state.clone(),
                middleware::rate_limit::checkout_rate_limit,
            )),
        )
        .route("/verify", post(routes::checkout::verify))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let admin_routes = Router::new()
        .route("/stats", get(routes::admin::stats))
        .route("/bookings", get(routes::admin::recent_bookings))
        .route("/catalog/hotels", post(routes::admin::create_hotel))
        .route("/catalog/flights", post(routes::admin::create_flight))
        .route("/catalog/trains", post(routes::admin::create_train))
        .route("/catalog/buses", post(routes::admin::create_bus))
        .route(
            "/catalog/:vertical/:id/toggle",
            post(routes::admin::toggle_catalog_item),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::admin::require_admin,
        ))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    // --- Compose full API ---
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/catalog", catalog_routes)
        .nest("/coins", coin_routes)
        .nest("/bookings", booking_routes)
        .nest("/checkout", checkout_routes)
        .nest("/webhooks", webhook_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(routes::health::health))
        // Global middleware
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.db.pool_min)
        .max_connections(config.db.pool_max)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&config.database_url())
        .await
        .expect("Failed to connect to PostgreSQL");
    let cache = Cache::new(&config).await;
    let razorpay = RazorpayClient::new(&config.razorpay);
    let rate_limiter =
        RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window_secs);
    let checkout_rate_limiter = RateLimiter::new(
        config.rate_limit.checkout_submit_max,
        config.rate_limit.window_secs,
    );

    let port = config.port;
    let node_env = config.node_env.clone();
    if razorpay.is_none() {
        tracing::warn!("Razorpay keys not set; only demo payments will work");
    }

    let state = AppState {
        db: pool,
        cache,
        config: Arc::new(config),
        razorpay,
        rate_limiter,
        checkout_rate_limiter,
    };

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind port");
    tracing::info!("BnB Travel API ({node_env}) listening on port {port}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
