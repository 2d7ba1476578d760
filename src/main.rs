// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dotenvy::dotenv;
use practicum::config::Config;
use practicum::external::{NoopAssistant, TokioScheduler};
use practicum::models::user::User;
use practicum::routes;
use practicum::state::AppState;
use practicum::store::{PgStore, Store, new_id};
use practicum::utils::hash::hash_password;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    // Seed Admin User
    if let Err(e) = seed_admin_user(store.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    // Assemble collaborators and state. The real assistant integration is
    // deployment-specific; the default build ships the logging stand-in.
    let assistant = Arc::new(NoopAssistant);
    let scheduler = Arc::new(TokioScheduler::new(assistant.clone()));
    let state = AppState {
        store,
        assistant,
        scheduler,
        config,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

async fn seed_admin_user(store: &dyn Store, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let mut tx = store.begin().await?;
        if tx.get_user_by_username(username).await?.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let user = User {
                id: new_id(),
                username: username.clone(),
                password: hash_password(password)?,
                role: "admin".to_string(),
                has_accommodation: false,
                created_at: Utc::now(),
            };
            tx.insert_user(&user).await?;
            tx.commit().await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
