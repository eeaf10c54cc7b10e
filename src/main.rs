use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;

use newsdesk::auth::AuthService;
use newsdesk::config::Config;
use newsdesk::env_file::{load_env_file, EnvVars};
use newsdesk::files::build_file_storage;
use newsdesk::generator::ArticleGenerator;
use newsdesk::storage::{Database, DatabaseError};
use newsdesk::web::{build_router, AppState, Templates};
use newsdesk::{logging, migration};

#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    about = "Articles, tasks and frontend logs over REST and GraphQL"
)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Run the SQL migrations and exit
    #[arg(long)]
    migrate: bool,

    /// Migration directory (overrides migration.path)
    #[arg(long, value_name = "DIR", requires = "migrate")]
    migrations: Option<PathBuf>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let env_path = config
        .env_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(".env"));
    let env = EnvVars::new(load_env_file(&env_path)?);
    config.apply_env(&env);

    let log_path = logging::init(&config.log)?;
    if let Some(path) = &log_path {
        tracing::info!(path = %path.display(), "Logging to file");
    }
    tracing::debug!(?config, "Configuration loaded");

    let db_path = config.database.path.clone();

    // Handle --reset-db flag
    if args.reset_db && db_path != ":memory:" && std::path::Path::new(&db_path).exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        tracing::info!(path = %db_path, "Database reset");
    }

    let db = match Database::open(&db_path).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: The database at {db_path} is locked by another process.");
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    // Handle --migrate flag
    if args.migrate {
        let dir = args
            .migrations
            .clone()
            .unwrap_or_else(|| config.migration.path.clone());
        let applied = migration::run_migrations(&db, &dir).await?;
        println!("Applied {} migration(s) from {}", applied.len(), dir.display());
        db.close().await;
        return Ok(());
    }

    let files = build_file_storage(&config.storage).context("Failed to set up file storage")?;

    let secret = config.auth.jwt_secret.clone().unwrap_or_default();
    if secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; login will fail until it is configured");
    }
    let auth = Arc::new(AuthService::new(
        SecretString::from(secret),
        config.auth.bcrypt_cost,
        chrono::Duration::hours(config.auth.token_ttl_hours),
    ));

    let generator = ArticleGenerator::from_config(&config.openai, &config.image)
        .context("Failed to set up article generator")?;

    let templates = Templates::load(&config.templates.path)?;

    let state = AppState::new(
        db.clone(),
        files,
        auth,
        generator,
        templates,
        &config.image.base_url,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    tracing::info!(addr = %config.server.addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
