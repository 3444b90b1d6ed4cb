//! Account service admin CLI
//!
//! Prepares an account database: connects, applies migrations and seeds
//! the default admin role and user.
//!
//! ```sh
//! # Run with default config (~/.config/account-service/config.toml)
//! account-admin
//!
//! # Custom config path
//! account-admin --config /etc/account-service/config.toml
//!
//! # Validate config without touching the database
//! account-admin --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use account_service::bootstrap::{self, AccountServices, AdminSeed};
use account_service::config::AppConfig;
use account_service::RequestContext;

/// Account service admin tool: migrations and default admin seeding.
#[derive(Parser, Debug)]
#[command(
    name = "account-admin",
    version,
    about = "Prepare the account service database",
    long_about = "Connects to the account database, applies pending migrations \
                  and makes sure the default admin role and user exist.\n\n\
                  Default config: ~/.config/account-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ACCOUNT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the database URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Skip database migrations.
    #[arg(long)]
    skip_migrations: bool,

    /// Skip creating the default admin user.
    #[arg(long)]
    no_admin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(account_service::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref url) = cli.database_url {
        config.database.url = url.clone();
    }

    // Init tracing after overrides so --log-level takes effect
    bootstrap::init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Database    : {}", config.database.redacted_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Log format  : {}", config.logging.format);
        println!("   Admin seed  : {}", config.admin.enabled && !cli.no_admin);
        return Ok(());
    }

    // ── Database ───────────────────────────────────────────────
    let db = match bootstrap::init_database(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    if !cli.skip_migrations {
        if let Err(e) = bootstrap::run_migrations(&db).await {
            error!("Failed to run migrations: {}", e);
            return Err(e.into());
        }
    }

    // ── Default admin ──────────────────────────────────────────
    if cli.no_admin {
        config.admin.enabled = false;
    }

    let services = AccountServices::new(db, &config);
    let ctx = RequestContext::background();
    match bootstrap::ensure_default_admin(&ctx, &services, &config.admin).await? {
        AdminSeed::Disabled => info!("Default admin seeding disabled"),
        AdminSeed::Ensured {
            user_id,
            user_created,
            role_created,
            ..
        } => info!(%user_id, user_created, role_created, "Default admin ensured"),
    }

    info!("Account database ready");
    Ok(())
}
