use runstest::api;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runstest=info,server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting runs test server");

    let pool = connect_database().await;

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);
    if pool.is_some() {
        info!("Database query logging enabled");
    } else {
        info!("Database query logging disabled (set DATABASE_URL to enable)");
    }

    let app = api::app(pool);
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Connect and migrate when DATABASE_URL is set; the server runs without it otherwise
async fn connect_database() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        info!("DATABASE_URL not set, database logging disabled");
        return None;
    };

    info!("Connecting to database...");
    let pool = match PgPoolOptions::new().max_connections(5).connect(&url).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Failed to connect to database: {}", e);
            warn!("Continuing without database logging");
            return None;
        }
    };

    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Database migrations completed"),
        Err(e) => warn!("Failed to run migrations: {}", e),
    }

    Some(pool)
}
