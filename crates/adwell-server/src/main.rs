mod expiry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use adwell_api::auth::{self, AppState, AppStateInner};
use adwell_api::middleware::{require_admin, require_auth};
use adwell_api::{ads, billing, categories, coupons, users};
use adwell_billing::checkout::CheckoutService;
use adwell_billing::stripe::StripeConfig;
use adwell_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adwell=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("ADWELL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("ADWELL_DB_PATH").unwrap_or_else(|_| "adwell.db".into());
    let host = std::env::var("ADWELL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ADWELL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let site_url =
        std::env::var("ADWELL_SITE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    // Optional admin account from the environment
    if let (Ok(email), Ok(password)) = (
        std::env::var("ADWELL_ADMIN_EMAIL"),
        std::env::var("ADWELL_ADMIN_PASSWORD"),
    ) {
        seed_admin(&db, &email, &password)?;
    }

    // Checkout runs simulated unless provider keys are present
    let checkout = CheckoutService::new(StripeConfig::from_env(), site_url)?;
    if checkout.is_live() {
        info!("Payment provider configured, hosted checkout enabled");
    } else {
        info!("No payment provider keys, checkout runs simulated");
    }

    // Hourly sweep of lapsed VIP placements
    tokio::spawn(expiry::run_expiry_loop(db.clone(), 3600));

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        checkout,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/categories", get(categories::list_categories))
        .route("/ads", get(ads::list_ads))
        .route("/ads/{id}", get(ads::get_ad))
        .route("/api/price", get(billing::price_quote))
        .route("/api/stripe/webhook", post(billing::stripe_webhook))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/ads", post(ads::publish_ad))
        .route("/ads/{id}", put(ads::update_ad))
        .route("/ads/{id}", delete(ads::delete_ad))
        .route("/api/stripe/checkout", post(billing::create_checkout))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state.clone());

    let admin_routes = Router::new()
        .route("/admin/ads", get(ads::list_ads))
        .route("/admin/coupons", post(coupons::create_coupon))
        .route("/admin/coupons", get(coupons::list_coupons))
        .route("/admin/coupons/{code}/active", put(coupons::set_coupon_active))
        .route("/admin/categories", post(categories::create_category))
        .route("/admin/categories/{slug}/color", put(categories::update_category_color))
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/{id}", put(users::update_user))
        .route("/admin/users/{id}", delete(users::delete_user))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("AdWell server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn seed_admin(db: &Database, email: &str, password: &str) -> anyhow::Result<()> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    if db.get_user_by_email(email)?.is_some() {
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("admin password hash failed: {}", e))?
        .to_string();

    db.create_user(
        &uuid::Uuid::new_v4().to_string(),
        email,
        &hash,
        None,
        None,
        "admin",
    )?;

    info!("Seeded admin account {}", email);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
